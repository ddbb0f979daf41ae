//! # Linear drift control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use mech_if::eqpt::linear::NUM_LINEAR_CHANNELS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Clone, Deserialize, Default)]
pub struct Params {
    /// Resting (minimum) commandable position of a linear channel.
    ///
    /// Units: metres
    pub linear_min_m: f64,

    /// Maximum commandable position of a linear channel.
    ///
    /// Units: metres
    pub linear_max_m: f64,

    /// First channel carrying the drift value (0-indexed).
    pub drift_chan_first: usize,

    /// Last channel carrying the drift value (0-indexed, inclusive).
    pub drift_chan_last: usize,

    /// Speed factor applied to every dispatch, must be in (0, 1].
    pub speed_factor: f64,

    /// Settle time after a drift dispatch.
    ///
    /// Units: milliseconds
    pub settle_ms: u64,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("The drift position range [{0} m, {1} m] is empty")]
    EmptyPositionRange(f64, f64),

    #[error("Drift channels {0}..={1} are not a valid span of the linear bank")]
    InvalidChannelSpan(usize, usize),

    #[error("Speed factor {0} is outside (0, 1]")]
    InvalidSpeedFactor(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.linear_max_m <= self.linear_min_m {
            return Err(ParamsError::EmptyPositionRange(
                self.linear_min_m,
                self.linear_max_m,
            ));
        }

        if self.drift_chan_first > self.drift_chan_last
            || self.drift_chan_last >= NUM_LINEAR_CHANNELS
        {
            return Err(ParamsError::InvalidChannelSpan(
                self.drift_chan_first,
                self.drift_chan_last,
            ));
        }

        if !(self.speed_factor > 0.0 && self.speed_factor <= 1.0) {
            return Err(ParamsError::InvalidSpeedFactor(self.speed_factor));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn valid() -> Params {
        Params {
            linear_min_m: 0.01,
            linear_max_m: 0.0375,
            drift_chan_first: 3,
            drift_chan_last: 6,
            speed_factor: 1.0,
            settle_ms: 10,
        }
    }

    #[test]
    fn valid_params_pass() {
        assert!(valid().are_valid().is_ok());
    }

    #[test]
    fn empty_range_is_rejected() {
        let mut p = valid();
        p.linear_max_m = p.linear_min_m;
        assert!(matches!(
            p.are_valid(),
            Err(ParamsError::EmptyPositionRange(_, _))
        ));

        p.linear_max_m = 0.005;
        assert!(p.are_valid().is_err());
    }

    #[test]
    fn bad_channel_span_is_rejected() {
        let mut p = valid();
        p.drift_chan_first = 7;
        assert!(matches!(
            p.are_valid(),
            Err(ParamsError::InvalidChannelSpan(7, 6))
        ));

        let mut p = valid();
        p.drift_chan_last = NUM_LINEAR_CHANNELS;
        assert!(p.are_valid().is_err());
    }

    #[test]
    fn bad_speed_factor_is_rejected() {
        let mut p = valid();
        p.speed_factor = 0.0;
        assert!(matches!(
            p.are_valid(),
            Err(ParamsError::InvalidSpeedFactor(_))
        ));

        p.speed_factor = 1.01;
        assert!(p.are_valid().is_err());
    }
}
