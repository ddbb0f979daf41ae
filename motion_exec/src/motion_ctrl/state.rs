//! Implementations for the MotionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use super::{primitives, MotionCtrlError, Params, NUM_JOINTS};
use crate::drift_ctrl::{DriftCtrl, DriftReport, Params as DriftParams};
use crate::kin_bounds::{AngleBounds, BoundReport};
use mech_if::cmd::{MotionCmd, PrimitiveMode};
use mech_if::eqpt::linear::LinearBank;
use mech_if::eqpt::servo::ServoBank;
use util::maths::rescale_about;
use util::{archive::Archiver, module::Module, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion control module state
pub struct MotionCtrl<S: ServoBank, L: LinearBank> {
    pub(crate) params: Params,

    /// Admissible joint angle region derived from the params
    bounds: AngleBounds,

    /// The servo bank facade
    pub(crate) servo: S,

    /// The linear drift controller
    pub(crate) drift_ctrl: DriftCtrl<L>,

    /// Whether the servo bus is currently open
    bus_open: bool,

    arch_moves: Archiver,
}

/// Report of one completed blocking move.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct MoveReport {
    /// The raw demanded target, before bounding.
    ///
    /// Units: radians
    pub raw_target_rad: [f64; NUM_JOINTS],

    /// The bounded target dispatched to the servos.
    ///
    /// Units: radians
    pub target_rad: [f64; NUM_JOINTS],

    /// Which clamps modified the raw target
    pub bound_report: BoundReport,

    /// Joint positions at convergence.
    ///
    /// Units: radians
    pub final_pos_rad: [f64; NUM_JOINTS],

    /// Number of poll cycles until convergence
    pub poll_cycles: u64,

    /// Wall time of the move.
    ///
    /// Units: seconds
    pub elapsed_s: f64,
}

/// Report returned from executing one motion command.
#[derive(Clone, Serialize, Debug)]
pub enum CmdReport {
    Move(MoveReport),
    Trajectory(Vec<MoveReport>),
    Drift(DriftReport),
    Reset(MoveReport),
}

/// Flattened move report written to the move archive.
#[derive(Serialize)]
struct MoveRecord {
    raw1_rad: f64,
    raw2_rad: f64,
    target1_rad: f64,
    target2_rad: f64,
    abs1_limited: bool,
    abs2_limited: bool,
    diff1_limited: bool,
    diff2_limited: bool,
    final1_rad: f64,
    final2_rad: f64,
    poll_cycles: u64,
    elapsed_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S: ServoBank, L: LinearBank> MotionCtrl<S, L> {
    /// Create a new uninitialised motion controller.
    ///
    /// `init` must be called before the controller is used.
    pub fn new(servo: S, linear: L) -> Self {
        Self {
            params: Params::default(),
            bounds: AngleBounds::new([0.0; NUM_JOINTS], 0.0, 0.0),
            servo,
            drift_ctrl: DriftCtrl::new(linear),
            bus_open: false,
            arch_moves: Archiver::default(),
        }
    }

    /// Create a motion controller directly from parameters, with disarmed
    /// archives.
    ///
    /// The servo bus is not opened, call `open` before commanding moves.
    pub fn from_params(
        params: Params,
        drift_params: DriftParams,
        servo: S,
        linear: L,
    ) -> Result<Self, MotionCtrlError> {
        params.are_valid()?;

        let bounds = AngleBounds::new(
            params.theta_mid_rad,
            params.theta_range_rad,
            params.theta_diff_max_rad,
        );

        let drift_ctrl = DriftCtrl::from_params(drift_params, linear)?;

        Ok(Self {
            params,
            bounds,
            servo,
            drift_ctrl,
            bus_open: false,
            arch_moves: Archiver::default(),
        })
    }

    /// Open the servo bus and drive the mechanism to its home pose.
    ///
    /// Opening an already open controller is a no-op.
    pub fn open(&mut self) -> Result<(), MotionCtrlError> {
        if self.bus_open {
            return Ok(());
        }

        self.servo.open()?;
        self.bus_open = true;

        info!("Servo bus open, performing the startup reset");
        self.reset()?;

        Ok(())
    }

    /// Shut the controller down, performing the teardown reset then closing
    /// the servo bus.
    ///
    /// Shutting down an already closed controller is a no-op, so the
    /// teardown reset runs at most once per open.
    pub fn shutdown(&mut self) -> Result<(), MotionCtrlError> {
        if !self.bus_open {
            return Ok(());
        }

        info!("Motion control shutting down");
        self.reset()?;

        self.servo.close()?;
        self.bus_open = false;

        Ok(())
    }

    /// Move both joints to the given absolute target and block until the
    /// mechanism has converged on it.
    ///
    /// The raw target is bounded before dispatch, so the converged position
    /// may differ from what was demanded.
    pub fn move_abs(
        &mut self,
        pos1_rad: f64,
        pos2_rad: f64,
    ) -> Result<MoveReport, MotionCtrlError> {
        self.move_abs_with_deadline(pos1_rad, pos2_rad, self.default_deadline())
    }

    /// As `move_abs` with an explicit deadline overriding the configured
    /// timeout.
    ///
    /// A deadline of `None` blocks until convergence however long it takes.
    /// The deadline is checked before each poll cycle, so at least one
    /// position read happens for any deadline longer than the dispatch
    /// itself.
    pub fn move_abs_with_deadline(
        &mut self,
        pos1_rad: f64,
        pos2_rad: f64,
        deadline: Option<Duration>,
    ) -> Result<MoveReport, MotionCtrlError> {
        let start = Instant::now();

        let raw_target_rad = [pos1_rad, pos2_rad];
        let (target_rad, bound_report) = self.bounds.bound(raw_target_rad);

        debug!(
            "Raw target [{:.4}, {:.4}] rad bounded to [{:.4}, {:.4}] rad",
            raw_target_rad[0], raw_target_rad[1], target_rad[0], target_rad[1]
        );

        self.servo.set_target(&self.params.servo_ids, &target_rad)?;

        // Poll until both joint errors are within the threshold. Either
        // joint still diverging keeps the loop alive.
        let mut err_rad = [f64::INFINITY; NUM_JOINTS];
        let mut final_pos_rad = [0.0; NUM_JOINTS];
        let mut poll_cycles = 0u64;

        while err_rad[0] > self.params.err_thresh_rad
            || err_rad[1] > self.params.err_thresh_rad
        {
            if let Some(deadline) = deadline {
                if start.elapsed() > deadline {
                    return Err(MotionCtrlError::ConvergenceTimeout {
                        elapsed_s: start.elapsed().as_secs_f64(),
                        err_rad,
                    });
                }
            }

            let curr_rad = self.servo.read_position(&self.params.servo_ids)?;

            for i in 0..NUM_JOINTS {
                final_pos_rad[i] = curr_rad[i];
                err_rad[i] = (curr_rad[i] - target_rad[i]).abs();
            }

            poll_cycles += 1;

            trace!(
                "Poll {}: pos [{:.4}, {:.4}] rad, err [{:.4}, {:.4}] rad",
                poll_cycles,
                curr_rad[0],
                curr_rad[1],
                err_rad[0],
                err_rad[1]
            );

            thread::sleep(Duration::from_millis(self.params.poll_interval_ms));
        }

        let report = MoveReport {
            raw_target_rad,
            target_rad,
            bound_report,
            final_pos_rad,
            poll_cycles,
            elapsed_s: start.elapsed().as_secs_f64(),
        };

        if let Err(e) = self.arch_moves.serialise(MoveRecord::from(&report)) {
            warn!("Could not archive the move record: {}", e);
        }

        Ok(report)
    }

    /// Move both joints by a delta from the current position.
    ///
    /// The position read and the following dispatch are not atomic, motion
    /// in between is not detected.
    pub fn move_delta(
        &mut self,
        delta1_rad: f64,
        delta2_rad: f64,
    ) -> Result<MoveReport, MotionCtrlError> {
        let curr_rad = self.get_pos()?;
        self.move_abs(curr_rad[0] + delta1_rad, curr_rad[1] + delta2_rad)
    }

    /// Read the current joint positions from the servo bank.
    pub fn get_pos(&mut self) -> Result<[f64; NUM_JOINTS], MotionCtrlError> {
        let curr_rad = self.servo.read_position(&self.params.servo_ids)?;
        Ok([curr_rad[0], curr_rad[1]])
    }

    /// Execute one primitive with the configured magnitude and mode.
    pub fn primitive(&mut self, id: usize) -> Result<MoveReport, MotionCtrlError> {
        self.primitive_with(
            id,
            self.params.primitive_mag_rad,
            self.params.primitive_mode,
        )
    }

    /// Execute one primitive with an explicit magnitude and mode.
    ///
    /// The magnitude only applies in delta mode, scaled mode targets come
    /// from the angle box. The id is validated before any motion.
    pub fn primitive_with(
        &mut self,
        id: usize,
        mag_rad: f64,
        mode: PrimitiveMode,
    ) -> Result<MoveReport, MotionCtrlError> {
        let report = match mode {
            PrimitiveMode::Delta => {
                let delta_rad = primitives::delta(id, mag_rad)
                    .ok_or(MotionCtrlError::PrimitiveIdOutOfRange(id))?;
                self.move_delta(delta_rad[0], delta_rad[1])?
            }
            PrimitiveMode::Scaled => {
                let raw_rad = primitives::scaled_target(id, &self.bounds)
                    .ok_or(MotionCtrlError::PrimitiveIdOutOfRange(id))?;
                let mid_rad = self.bounds.mid_rad();
                self.move_abs(
                    rescale_about(raw_rad[0], self.params.primitive_scale, mid_rad[0]),
                    rescale_about(raw_rad[1], self.params.primitive_scale, mid_rad[1]),
                )?
            }
        };

        thread::sleep(Duration::from_millis(self.params.primitive_settle_ms));

        Ok(report)
    }

    /// Execute a sequence of primitives in order with the configured
    /// magnitude and mode.
    ///
    /// All ids are validated before any motion, so a bad id cannot leave
    /// the trajectory half flown. A fault partway through stops the
    /// trajectory with the failing step attached.
    pub fn trajectory(&mut self, ids: &[usize]) -> Result<Vec<MoveReport>, MotionCtrlError> {
        for id in ids {
            if *id >= primitives::PRIMITIVE_COUNT {
                return Err(MotionCtrlError::PrimitiveIdOutOfRange(*id));
            }
        }

        let mut reports = Vec::with_capacity(ids.len());

        for (step, id) in ids.iter().enumerate() {
            match self.primitive(*id) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    return Err(MotionCtrlError::TrajectoryStepFailed {
                        step,
                        source: Box::new(e),
                    })
                }
            }
        }

        Ok(reports)
    }

    /// Set the drift position of the linear actuator bank.
    pub fn drift(&mut self, pos_m: f64) -> Result<DriftReport, MotionCtrlError> {
        Ok(self.drift_ctrl.set_drift(pos_m)?)
    }

    /// Get the last commanded drift position.
    ///
    /// Units: metres
    pub fn drift_state_m(&self) -> f64 {
        self.drift_ctrl.state_m()
    }

    /// Get the commandable drift position range.
    ///
    /// Units: metres
    pub fn drift_range_m(&self) -> (f64, f64) {
        (
            self.drift_ctrl.params.linear_min_m,
            self.drift_ctrl.params.linear_max_m,
        )
    }

    /// Drive the drift to its minimum and the joints to the home pose.
    pub fn reset(&mut self) -> Result<MoveReport, MotionCtrlError> {
        debug!("Resetting the mechanism");

        self.drift_ctrl.reset()?;

        let report =
            self.move_abs(self.params.theta_mid_rad[0], self.params.theta_mid_rad[1])?;

        thread::sleep(Duration::from_millis(self.params.reset_settle_ms));

        Ok(report)
    }

    /// Get the admissible joint angle region.
    pub fn bounds(&self) -> &AngleBounds {
        &self.bounds
    }

    fn default_deadline(&self) -> Option<Duration> {
        self.params.move_timeout_s.map(Duration::from_secs_f64)
    }
}

impl<S: ServoBank, L: LinearBank> Module for MotionCtrl<S, L> {
    type InitData = &'static str;
    type InitError = MotionCtrlError;
    type Command = MotionCmd;
    type Report = CmdReport;
    type ExecError = MotionCtrlError;

    /// Initialise the motion control module.
    ///
    /// Expected init data is the path to the module's parameter file.
    /// Initialisation loads and validates the parameters, arms the
    /// archives, opens the servo bus and performs the startup reset.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: &Session,
    ) -> Result<(), MotionCtrlError> {
        self.params = params::load(init_data)?;
        self.params.are_valid()?;

        self.bounds = AngleBounds::new(
            self.params.theta_mid_rad,
            self.params.theta_range_rad,
            self.params.theta_diff_max_rad,
        );

        self.drift_ctrl.init(&self.params.drift_params_path, session)?;

        self.arch_moves = Archiver::from_path(session, "motion_ctrl/moves.csv")
            .map_err(|e| MotionCtrlError::ArchInitError(e.to_string()))?;

        self.open()
    }

    /// Execute one motion command to completion.
    fn exec(&mut self, cmd: &Self::Command) -> Result<CmdReport, MotionCtrlError> {
        match cmd {
            MotionCmd::MoveAbs { pos1_rad, pos2_rad } => {
                Ok(CmdReport::Move(self.move_abs(*pos1_rad, *pos2_rad)?))
            }
            MotionCmd::MoveDelta {
                delta1_rad,
                delta2_rad,
            } => Ok(CmdReport::Move(self.move_delta(*delta1_rad, *delta2_rad)?)),
            MotionCmd::Primitive { id, mag_rad, mode } => {
                let mag_rad = mag_rad.unwrap_or(self.params.primitive_mag_rad);
                let mode = mode.unwrap_or(self.params.primitive_mode);
                Ok(CmdReport::Move(self.primitive_with(*id, mag_rad, mode)?))
            }
            MotionCmd::Trajectory { ids } => {
                Ok(CmdReport::Trajectory(self.trajectory(ids)?))
            }
            MotionCmd::Drift { pos_m } => Ok(CmdReport::Drift(self.drift(*pos_m)?)),
            MotionCmd::Reset => Ok(CmdReport::Reset(self.reset()?)),
        }
    }
}

impl From<&MoveReport> for MoveRecord {
    fn from(report: &MoveReport) -> Self {
        Self {
            raw1_rad: report.raw_target_rad[0],
            raw2_rad: report.raw_target_rad[1],
            target1_rad: report.target_rad[0],
            target2_rad: report.target_rad[1],
            abs1_limited: report.bound_report.abs_limited[0],
            abs2_limited: report.bound_report.abs_limited[1],
            diff1_limited: report.bound_report.diff_limited[0],
            diff2_limited: report.bound_report.diff_limited[1],
            final1_rad: report.final_pos_rad[0],
            final2_rad: report.final_pos_rad[1],
            poll_cycles: report.poll_cycles,
            elapsed_s: report.elapsed_s,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use mech_if::eqpt::sim::{SimLinearBank, SimServoBank};
    use std::f64::consts::PI;

    fn mids() -> [f64; NUM_JOINTS] {
        [2.0 * PI * 0.56, 2.0 * PI * 0.44]
    }

    fn params() -> Params {
        Params {
            servo_ids: [1, 2],
            theta_mid_rad: mids(),
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

    /// A controller over a sim mechanism at the given pose, with the servo
    /// bus opened directly so no startup reset moves it.
    fn ctrl_at(
        pos_rad: [f64; NUM_JOINTS],
        response: f64,
    ) -> MotionCtrl<SimServoBank, SimLinearBank> {
        let mut servo = SimServoBank::new([1, 2], pos_rad);
        servo.set_response(response);

        let mut ctrl =
            MotionCtrl::from_params(params(), drift_params(), servo, SimLinearBank::new())
                .unwrap();
        ctrl.servo.open().unwrap();

        ctrl
    }

    #[test]
    fn move_abs_converges_to_the_bounded_target() {
        let mut ctrl = ctrl_at([PI, PI], 0.5);

        let raw = [mids()[0] + 10.0, mids()[1]];
        let (expected, _) = ctrl.bounds().bound(raw);

        let report = ctrl.move_abs(raw[0], raw[1]).unwrap();

        assert_eq!(ctrl.servo.last_target_rad(), expected);
        assert_eq!(report.target_rad, expected);
        assert_eq!(report.raw_target_rad, raw);

        // The corridor pins this target about the 1.25 pi mean
        assert!((expected[0] - 4.123340357836604).abs() < 1e-9);
        assert!((expected[1] - 3.730641276137879).abs() < 1e-9);

        assert!(report.bound_report.abs_limited[0]);
        assert!(!report.bound_report.abs_limited[1]);

        for i in 0..NUM_JOINTS {
            assert!((report.final_pos_rad[i] - expected[i]).abs() <= 0.1);
        }
    }

    #[test]
    fn convergence_needs_both_joints_within_threshold() {
        // Joint 1 starts on target, joint 2 starts 1.5 rad away. With a
        // response of 0.5 the error halves per read: 0.75, 0.375, 0.1875,
        // 0.09375, so joint 2 alone holds the loop open for 4 cycles.
        let mut ctrl = ctrl_at([PI, PI - 1.5], 0.5);

        let report = ctrl.move_abs(PI, PI).unwrap();

        assert_eq!(report.poll_cycles, 4);
        for i in 0..NUM_JOINTS {
            assert!((report.final_pos_rad[i] - PI).abs() <= 0.1);
        }
    }

    #[test]
    fn an_error_exactly_at_the_threshold_converges() {
        // Dyadic start, target and threshold so no read rounds: joint 2's
        // error halves per read through 0.5, 0.25, 0.125. The third read
        // lands exactly on the threshold, and only an error strictly above
        // the threshold keeps the loop polling.
        let mut p = params();
        p.err_thresh_rad = 0.125;

        let mut servo = SimServoBank::new([1, 2], [PI, 2.0]);
        servo.set_response(0.5);

        let mut ctrl =
            MotionCtrl::from_params(p, drift_params(), servo, SimLinearBank::new()).unwrap();
        ctrl.servo.open().unwrap();

        let report = ctrl.move_abs(PI, 3.0).unwrap();

        assert_eq!(report.poll_cycles, 3);
        assert_eq!(report.final_pos_rad, [PI, 2.875]);
    }

    #[test]
    fn a_converged_mechanism_still_polls_once() {
        let mut ctrl = ctrl_at([PI, PI], 0.5);

        let report = ctrl.move_abs(PI, PI).unwrap();

        assert_eq!(report.poll_cycles, 1);
        assert_eq!(report.final_pos_rad, [PI, PI]);
    }

    #[test]
    fn move_delta_offsets_from_the_current_position() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        let report = ctrl.move_delta(0.15, -0.15).unwrap();

        assert_eq!(ctrl.servo.last_target_rad(), [PI + 0.15, PI - 0.15]);
        assert_eq!(report.final_pos_rad, [PI + 0.15, PI - 0.15]);
        assert!(!report.bound_report.any_limited());
    }

    #[test]
    fn delta_primitives_move_relative_to_the_pose() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        ctrl.primitive_with(0, 0.2, PrimitiveMode::Delta).unwrap();
        assert_eq!(ctrl.servo.last_target_rad(), [PI - 0.2, PI - 0.2]);

        ctrl.primitive_with(8, 0.2, PrimitiveMode::Delta).unwrap();
        assert_eq!(ctrl.servo.last_target_rad(), [PI, PI]);

        let report = ctrl
            .primitive_with(primitives::STATIONARY_ID, 0.2, PrimitiveMode::Delta)
            .unwrap();
        assert_eq!(report.final_pos_rad, [PI, PI]);
    }

    #[test]
    fn scaled_primitives_rescale_towards_the_mids() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        // The stationary primitive in scaled mode targets the mid pair,
        // which the corridor pins to the home pose
        ctrl.primitive_with(primitives::STATIONARY_ID, 0.0, PrimitiveMode::Scaled)
            .unwrap();

        let (home, _) = ctrl.bounds().bound(mids());
        assert_eq!(ctrl.servo.last_target_rad(), home);
        assert!((home[0] - (PI + PI / 16.0)).abs() < 1e-9);
        assert!((home[1] - (PI - PI / 16.0)).abs() < 1e-9);

        // Corner primitive 0 targets the box minima pulled towards the mids
        ctrl.primitive_with(0, 0.0, PrimitiveMode::Scaled).unwrap();

        let raw = primitives::scaled_target(0, ctrl.bounds()).unwrap();
        let mid = ctrl.bounds().mid_rad();
        let (expected, _) = ctrl.bounds().bound([
            rescale_about(raw[0], 0.3, mid[0]),
            rescale_about(raw[1], 0.3, mid[1]),
        ]);
        assert_eq!(ctrl.servo.last_target_rad(), expected);
    }

    #[test]
    fn out_of_range_primitive_ids_are_rejected_before_motion() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);
        let dispatches = ctrl.servo.num_dispatches();

        assert!(matches!(
            ctrl.primitive(9),
            Err(MotionCtrlError::PrimitiveIdOutOfRange(9))
        ));
        assert!(matches!(
            ctrl.primitive_with(100, 0.1, PrimitiveMode::Scaled),
            Err(MotionCtrlError::PrimitiveIdOutOfRange(100))
        ));

        assert_eq!(ctrl.servo.num_dispatches(), dispatches);
    }

    #[test]
    fn trajectory_validates_all_ids_up_front() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        let reports = ctrl.trajectory(&[4, 0, 8]).unwrap();
        assert_eq!(reports.len(), 3);

        let dispatches = ctrl.servo.num_dispatches();

        assert!(matches!(
            ctrl.trajectory(&[0, 9]),
            Err(MotionCtrlError::PrimitiveIdOutOfRange(9))
        ));
        assert_eq!(ctrl.servo.num_dispatches(), dispatches);

        assert!(ctrl.trajectory(&[]).unwrap().is_empty());
        assert_eq!(ctrl.servo.num_dispatches(), dispatches);
    }

    #[test]
    fn trajectory_fault_names_the_failing_step() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        // Fault the second dispatch of the trajectory, which is step 1
        ctrl.servo
            .fault_on_dispatch(ctrl.servo.num_dispatches() + 2, "bus brownout");

        match ctrl.trajectory(&[4, 4, 4]) {
            Err(MotionCtrlError::TrajectoryStepFailed { step, source }) => {
                assert_eq!(step, 1);
                assert!(matches!(*source, MotionCtrlError::ServoError(_)));
            }
            other => panic!("expected a trajectory step failure, got {:?}", other),
        }
    }

    #[test]
    fn reset_homes_the_mechanism_and_the_drift() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        ctrl.primitive_with(8, 0.3, PrimitiveMode::Delta).unwrap();
        ctrl.drift(0.02).unwrap();

        let report = ctrl.reset().unwrap();

        assert_eq!(ctrl.drift_state_m(), 0.01);
        assert_eq!(
            ctrl.drift_ctrl.linear.last_targets_m(),
            Some([0.01; mech_if::eqpt::linear::NUM_LINEAR_CHANNELS])
        );

        let (home, _) = ctrl.bounds().bound(mids());
        assert_eq!(report.final_pos_rad, home);
        assert!((home[0] - home[1] - PI / 8.0).abs() < 1e-9);
    }

    #[test]
    fn open_and_shutdown_are_idempotent() {
        let servo = SimServoBank::new([1, 2], [PI, PI]);
        let mut ctrl =
            MotionCtrl::from_params(params(), drift_params(), servo, SimLinearBank::new())
                .unwrap();
        ctrl.servo.set_response(1.0);

        assert_eq!(ctrl.servo.num_dispatches(), 0);

        // Open performs the startup reset, one servo and one linear dispatch
        ctrl.open().unwrap();
        assert_eq!(ctrl.servo.num_dispatches(), 1);
        assert_eq!(ctrl.drift_ctrl.linear.num_dispatches(), 1);

        ctrl.open().unwrap();
        assert_eq!(ctrl.servo.num_dispatches(), 1);

        // Shutdown performs the teardown reset exactly once
        ctrl.shutdown().unwrap();
        assert_eq!(ctrl.servo.num_dispatches(), 2);
        assert_eq!(ctrl.drift_ctrl.linear.num_dispatches(), 2);

        ctrl.shutdown().unwrap();
        assert_eq!(ctrl.servo.num_dispatches(), 2);

        // The bus is closed once shut down
        assert!(matches!(
            ctrl.move_abs(PI, PI),
            Err(MotionCtrlError::ServoError(_))
        ));
    }

    #[test]
    fn a_stalled_mechanism_times_out() {
        let mut ctrl = ctrl_at([0.0, 0.0], 0.5);
        ctrl.servo.set_stuck(true);

        match ctrl.move_abs_with_deadline(PI, PI, Some(Duration::from_millis(20))) {
            Err(MotionCtrlError::ConvergenceTimeout { elapsed_s, err_rad }) => {
                assert!(elapsed_s >= 0.02);
                assert!(err_rad[0] > 0.1);
            }
            other => panic!("expected a convergence timeout, got {:?}", other),
        }
    }

    #[test]
    fn the_configured_timeout_applies_to_every_move() {
        let mut p = params();
        p.move_timeout_s = Some(0.02);

        let mut servo = SimServoBank::new([1, 2], [0.0, 0.0]);
        servo.set_stuck(true);

        let mut ctrl =
            MotionCtrl::from_params(p, drift_params(), servo, SimLinearBank::new()).unwrap();
        ctrl.servo.open().unwrap();

        assert!(matches!(
            ctrl.move_abs(PI, PI),
            Err(MotionCtrlError::ConvergenceTimeout { .. })
        ));

        // A responsive mechanism converges well inside the same timeout
        ctrl.servo.set_stuck(false);
        ctrl.servo.set_response(1.0);
        assert!(ctrl.move_abs(PI, PI).is_ok());
    }

    #[test]
    fn drift_commands_delegate_to_the_drift_controller() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        let report = ctrl.drift(0.0375).unwrap();
        assert_eq!(report.pos_m, 0.0375);
        assert_eq!(ctrl.drift_state_m(), 0.0375);

        assert!(matches!(
            ctrl.drift(0.05),
            Err(MotionCtrlError::DriftError(_))
        ));
        assert_eq!(ctrl.drift_state_m(), 0.0375);
    }

    #[test]
    fn exec_dispatches_each_command_kind() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        let report = ctrl
            .exec(&MotionCmd::MoveAbs {
                pos1_rad: PI + 0.1,
                pos2_rad: PI - 0.1,
            })
            .unwrap();
        assert!(matches!(report, CmdReport::Move(_)));

        let report = ctrl
            .exec(&MotionCmd::MoveDelta {
                delta1_rad: -0.1,
                delta2_rad: 0.1,
            })
            .unwrap();
        assert!(matches!(report, CmdReport::Move(_)));

        // Absent fields fall back to the configured defaults
        let report = ctrl
            .exec(&MotionCmd::Primitive {
                id: primitives::STATIONARY_ID,
                mag_rad: None,
                mode: None,
            })
            .unwrap();
        assert!(matches!(report, CmdReport::Move(_)));

        let report = ctrl
            .exec(&MotionCmd::Primitive {
                id: 0,
                mag_rad: Some(0.2),
                mode: Some(PrimitiveMode::Scaled),
            })
            .unwrap();
        assert!(matches!(report, CmdReport::Move(_)));

        let report = ctrl
            .exec(&MotionCmd::Trajectory { ids: vec![4, 4] })
            .unwrap();
        match report {
            CmdReport::Trajectory(reports) => assert_eq!(reports.len(), 2),
            other => panic!("expected a trajectory report, got {:?}", other),
        }

        let report = ctrl.exec(&MotionCmd::Drift { pos_m: 0.02 }).unwrap();
        match report {
            CmdReport::Drift(drift) => assert_eq!(drift.pos_m, 0.02),
            other => panic!("expected a drift report, got {:?}", other),
        }

        let report = ctrl.exec(&MotionCmd::Reset).unwrap();
        assert!(matches!(report, CmdReport::Reset(_)));
        assert_eq!(ctrl.drift_state_m(), 0.01);
    }

    #[test]
    fn cmd_reports_serialise_for_the_session() {
        let mut ctrl = ctrl_at([PI, PI], 1.0);

        let report = ctrl
            .exec(&MotionCmd::MoveAbs {
                pos1_rad: PI,
                pos2_rad: PI,
            })
            .unwrap();

        // The script run saves these as session JSON, so the whole report
        // tree must serialise
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"Move\""));
        assert!(json.contains("\"poll_cycles\":1"));
    }
}
