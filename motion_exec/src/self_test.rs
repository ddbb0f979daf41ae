//! # Motion self test
//!
//! Exercises the full motion envelope: for each of a series of drift levels
//! spanning the commandable drift range, a burst of randomly chosen delta
//! primitives is flown and the mechanism recentred, with a full reset at the
//! end. The random id stream comes from a caller supplied generator so a
//! run can be reproduced from its seed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use rand::Rng;
use serde::Serialize;
use std::time::Instant;

// Internal
use crate::motion_ctrl::{MotionCtrl, MotionCtrlError, MoveReport, PRIMITIVE_COUNT};
use mech_if::cmd::PrimitiveMode;
use mech_if::eqpt::linear::LinearBank;
use mech_if::eqpt::servo::ServoBank;
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of drift levels flown, spanning the drift range end to end.
pub const NUM_DRIFT_LEVELS: usize = 5;

/// Number of random primitives flown at each drift level.
pub const PRIMS_PER_LEVEL: usize = 30;

/// Magnitude of the delta primitives flown by the test.
///
/// Units: radians
pub const PRIMITIVE_MAG_RAD: f64 = 0.5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of a completed self test run.
#[derive(Clone, Serialize, Debug)]
pub struct SelfTestReport {
    /// The drift levels flown, in order.
    ///
    /// Units: metres
    pub drift_levels_m: Vec<f64>,

    /// Total number of blocking moves flown
    pub num_moves: u64,

    /// Number of moves whose raw target was modified by the bounds
    pub num_limited_moves: u64,

    /// Total poll cycles across all moves
    pub total_poll_cycles: u64,

    /// Wall time of the whole run.
    ///
    /// Units: seconds
    pub elapsed_s: f64,
}

/// Running move counters accumulated over the test.
#[derive(Default)]
struct Tally {
    num_moves: u64,
    num_limited_moves: u64,
    total_poll_cycles: u64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Run the self test on the given controller.
///
/// The controller must be open. The run ends with a full reset, leaving the
/// mechanism at its home pose and the drift at its minimum.
pub fn run<S: ServoBank, L: LinearBank, R: Rng>(
    ctrl: &mut MotionCtrl<S, L>,
    rng: &mut R,
) -> Result<SelfTestReport, MotionCtrlError> {
    let start = Instant::now();

    let (min_m, max_m) = ctrl.drift_range_m();

    // Endpoints are pinned so float error cannot push a level outside the
    // commandable range
    let last = NUM_DRIFT_LEVELS - 1;
    let drift_levels_m: Vec<f64> = (0..NUM_DRIFT_LEVELS)
        .map(|i| match i {
            0 => min_m,
            i if i == last => max_m,
            i => lin_map((0.0, last as f64), (min_m, max_m), i as f64),
        })
        .collect();

    info!(
        "Self test: {} drift levels over [{} m, {} m], {} primitives per level",
        NUM_DRIFT_LEVELS, min_m, max_m, PRIMS_PER_LEVEL
    );

    let mut tally = Tally::default();

    for (level, drift_m) in drift_levels_m.iter().enumerate() {
        info!("Level {}: drift {:.4} m", level, drift_m);

        ctrl.drift(*drift_m)?;

        for _ in 0..PRIMS_PER_LEVEL {
            let id = rng.gen_range(0..PRIMITIVE_COUNT);
            let report = ctrl.primitive_with(id, PRIMITIVE_MAG_RAD, PrimitiveMode::Delta)?;
            tally.add(&report);
        }

        // Recentre before the next level
        let mid_rad = ctrl.bounds().mid_rad();
        let report = ctrl.move_abs(mid_rad[0], mid_rad[1])?;
        tally.add(&report);
    }

    let report = ctrl.reset()?;
    tally.add(&report);

    let report = SelfTestReport {
        drift_levels_m,
        num_moves: tally.num_moves,
        num_limited_moves: tally.num_limited_moves,
        total_poll_cycles: tally.total_poll_cycles,
        elapsed_s: start.elapsed().as_secs_f64(),
    };

    info!(
        "Self test complete: {} moves, {} limited, {} poll cycles in {:.3} s",
        report.num_moves, report.num_limited_moves, report.total_poll_cycles, report.elapsed_s
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tally {
    fn add(&mut self, report: &MoveReport) {
        self.num_moves += 1;
        self.total_poll_cycles += report.poll_cycles;
        if report.bound_report.any_limited() {
            self.num_limited_moves += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::drift_ctrl::Params as DriftParams;
    use crate::motion_ctrl::Params;
    use mech_if::eqpt::sim::{SimLinearBank, SimServoBank};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::PI;

    fn params() -> Params {
        Params {
            servo_ids: [1, 2],
            theta_mid_rad: [2.0 * PI * 0.56, 2.0 * PI * 0.44],
            theta_range_rad: PI,
            theta_diff_max_rad: PI / 8.0,
            err_thresh_rad: 0.1,
            poll_interval_ms: 0,
            move_timeout_s: None,
            primitive_mag_rad: 0.15,
            primitive_mode: PrimitiveMode::Delta,
            primitive_scale: 0.3,
            primitive_settle_ms: 0,
            reset_settle_ms: 0,
            drift_params_path: String::new(),
        }
    }

    fn drift_params() -> DriftParams {
        DriftParams {
            linear_min_m: 0.01,
            linear_max_m: 0.0375,
            drift_chan_first: 3,
            drift_chan_last: 6,
            speed_factor: 1.0,
            settle_ms: 0,
        }
    }

    fn run_once(seed: u64) -> SelfTestReport {
        let mut servo = SimServoBank::new([1, 2], [PI, PI]);
        servo.set_response(0.5);

        let mut ctrl =
            MotionCtrl::from_params(params(), drift_params(), servo, SimLinearBank::new())
                .unwrap();
        ctrl.servo.open().unwrap();

        let mut rng = StdRng::seed_from_u64(seed);
        run(&mut ctrl, &mut rng).unwrap()
    }

    #[test]
    fn the_same_seed_reproduces_the_run() {
        let a = run_once(7);
        let b = run_once(7);

        assert_eq!(a.drift_levels_m, b.drift_levels_m);
        assert_eq!(a.num_moves, b.num_moves);
        assert_eq!(a.num_limited_moves, b.num_limited_moves);
        assert_eq!(a.total_poll_cycles, b.total_poll_cycles);
    }

    #[test]
    fn the_run_counts_every_move() {
        let report = run_once(3);

        // One move per primitive, one recentre per level and the final reset
        let expected = (NUM_DRIFT_LEVELS * PRIMS_PER_LEVEL + NUM_DRIFT_LEVELS + 1) as u64;
        assert_eq!(report.num_moves, expected);
    }

    #[test]
    fn drift_levels_span_the_range_end_to_end() {
        let report = run_once(3);

        assert_eq!(report.drift_levels_m.len(), NUM_DRIFT_LEVELS);
        assert_eq!(report.drift_levels_m[0], 0.01);
        assert_eq!(*report.drift_levels_m.last().unwrap(), 0.0375);

        for pair in report.drift_levels_m.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn the_run_ends_reset() {
        let mut servo = SimServoBank::new([1, 2], [PI, PI]);
        servo.set_response(1.0);

        let mut ctrl =
            MotionCtrl::from_params(params(), drift_params(), servo, SimLinearBank::new())
                .unwrap();
        ctrl.servo.open().unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        run(&mut ctrl, &mut rng).unwrap();

        assert_eq!(ctrl.drift_state_m(), 0.01);

        let (home, _) = ctrl.bounds().bound(ctrl.bounds().mid_rad());
        let pos = ctrl.get_pos().unwrap();
        for i in 0..pos.len() {
            assert!((pos[i] - home[i]).abs() <= 0.1);
        }
    }
}
