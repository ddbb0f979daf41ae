//! Implementations for the DriftCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::Serialize;
use std::thread;
use std::time::Duration;

// Internal
use super::{DriftCtrlError, Params};
use mech_if::eqpt::linear::{LinearBank, NUM_LINEAR_CHANNELS};
use util::{archive::Archiver, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Linear drift control module state
pub struct DriftCtrl<L: LinearBank> {
    pub(crate) params: Params,

    /// The linear actuator bank facade
    pub(crate) linear: L,

    /// Last commanded drift position.
    ///
    /// Units: metres
    state_m: f64,

    arch_drifts: Archiver,
}

/// Report of one completed drift dispatch.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct DriftReport {
    /// The commanded drift position.
    ///
    /// Units: metres
    pub pos_m: f64,

    /// Number of channels carrying the drift value
    pub num_drift_chans: usize,

    /// The speed factor of the dispatch
    pub speed_factor: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<L: LinearBank> DriftCtrl<L> {
    /// Create a new uninitialised drift controller.
    ///
    /// `init` must be called before the controller is used.
    pub fn new(linear: L) -> Self {
        Self {
            params: Params::default(),
            linear,
            state_m: 0.0,
            arch_drifts: Archiver::default(),
        }
    }

    /// Create a drift controller directly from parameters, with disarmed
    /// archives.
    pub fn from_params(params: Params, linear: L) -> Result<Self, DriftCtrlError> {
        params.are_valid()?;

        let state_m = params.linear_min_m;

        Ok(Self {
            params,
            linear,
            state_m,
            arch_drifts: Archiver::default(),
        })
    }

    /// Initialise the drift controller from the given parameter file.
    pub fn init(&mut self, params_file: &str, session: &Session) -> Result<(), DriftCtrlError> {
        self.params = params::load(params_file)?;
        self.params.are_valid()?;

        self.state_m = self.params.linear_min_m;

        self.arch_drifts = Archiver::from_path(session, "drift_ctrl/drifts.csv")
            .map_err(|e| DriftCtrlError::ArchInitError(e.to_string()))?;

        Ok(())
    }

    /// Set the drift position of the linear actuator bank.
    ///
    /// The drift value is carried on the configured channel span, all other
    /// channels rest at the minimum. Positions outside
    /// `[linear_min_m, linear_max_m]` are rejected, not clamped, with no
    /// motion dispatched.
    pub fn set_drift(&mut self, pos_m: f64) -> Result<DriftReport, DriftCtrlError> {
        if !(pos_m >= self.params.linear_min_m && pos_m <= self.params.linear_max_m) {
            return Err(DriftCtrlError::PositionOutOfRange {
                pos_m,
                min_m: self.params.linear_min_m,
                max_m: self.params.linear_max_m,
            });
        }

        let mut targets_m = [self.params.linear_min_m; NUM_LINEAR_CHANNELS];
        for chan in self.params.drift_chan_first..=self.params.drift_chan_last {
            targets_m[chan] = pos_m;
        }

        debug!("Dispatching drift position {} m", pos_m);

        self.linear
            .set_joint_vector(&targets_m, self.params.speed_factor)?;
        self.state_m = pos_m;

        let report = DriftReport {
            pos_m,
            num_drift_chans: self.params.drift_chan_last - self.params.drift_chan_first + 1,
            speed_factor: self.params.speed_factor,
        };

        if let Err(e) = self.arch_drifts.serialise(report) {
            warn!("Could not archive the drift dispatch: {}", e);
        }

        thread::sleep(Duration::from_millis(self.params.settle_ms));

        Ok(report)
    }

    /// Get the last commanded drift position.
    ///
    /// Units: metres
    pub fn state_m(&self) -> f64 {
        self.state_m
    }

    /// Return all channels to the resting minimum.
    pub fn reset(&mut self) -> Result<(), DriftCtrlError> {
        debug!("Resetting the linear actuator bank to the minimum");

        let targets_m = [self.params.linear_min_m; NUM_LINEAR_CHANNELS];
        self.linear
            .set_joint_vector(&targets_m, self.params.speed_factor)?;
        self.state_m = self.params.linear_min_m;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
