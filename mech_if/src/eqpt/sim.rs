//! # Loopback simulation equipment
//!
//! Software stand-ins for the servo and linear actuator drivers, used by unit tests and by the
//! executable's default backend when no hardware is attached.
//!
//! `SimServoBank` models each servo as a first-order response towards its last demanded target,
//! advancing one step per `read_position` call. The response factor sets the fraction of the
//! remaining error closed per step, so a factor of `1.0` converges in a single read and a
//! factor of `0.0` (or the stuck flag) never converges at all.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::debug;

// Internal
use crate::eqpt::linear::{LinearBank, LinearBankError, NUM_LINEAR_CHANNELS};
use crate::eqpt::servo::{ServoBank, ServoBankError, NUM_JOINTS};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default fraction of the remaining position error closed per read
const DEFAULT_RESPONSE: f64 = 0.5;

/// Default servo ids on the simulated bus
const DEFAULT_IDS: [usize; NUM_JOINTS] = [1, 2];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated bank of position-controlled servos.
pub struct SimServoBank {
    /// Servo ids present on the simulated bus
    ids: [usize; NUM_JOINTS],

    /// Current position of each servo.
    ///
    /// Units: radians
    pos_rad: [f64; NUM_JOINTS],

    /// Last demanded target of each servo.
    ///
    /// Units: radians
    target_rad: [f64; NUM_JOINTS],

    /// Fraction of the remaining error closed per `read_position` call
    response: f64,

    /// When true positions no longer advance towards their targets
    stuck: bool,

    /// Whether the bus is open
    bus_open: bool,

    /// Number of `set_target` calls accepted or faulted so far
    num_dispatches: usize,

    /// When set, the nth dispatch (1-based) fails with a driver fault
    fault_on_dispatch: Option<(usize, String)>,
}

/// A simulated bank of linear actuators which records the last dispatched joint vector.
#[derive(Default)]
pub struct SimLinearBank {
    /// The last dispatched joint vector.
    ///
    /// Units: metres
    last_targets_m: Option<[f64; NUM_LINEAR_CHANNELS]>,

    /// The speed factor of the last dispatch
    last_speed_factor: Option<f64>,

    /// Number of dispatches so far
    num_dispatches: usize,

    /// When set, the nth dispatch (1-based) fails with a driver fault
    fault_on_dispatch: Option<(usize, String)>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServoBank {
    /// Create a new simulated servo bank with the given ids and initial positions.
    pub fn new(ids: [usize; NUM_JOINTS], initial_pos_rad: [f64; NUM_JOINTS]) -> Self {
        Self {
            ids,
            pos_rad: initial_pos_rad,
            target_rad: initial_pos_rad,
            response: DEFAULT_RESPONSE,
            stuck: false,
            bus_open: false,
            num_dispatches: 0,
            fault_on_dispatch: None,
        }
    }

    /// Set the fraction of the remaining error closed per read.
    pub fn set_response(&mut self, response: f64) {
        self.response = response;
    }

    /// Freeze or unfreeze the simulated servos.
    ///
    /// A stuck bank accepts demands but its positions never advance, which models a jammed
    /// mechanism.
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// Make the nth dispatch (1-based) fail with a driver fault.
    pub fn fault_on_dispatch(&mut self, n: usize, msg: &str) {
        self.fault_on_dispatch = Some((n, String::from(msg)));
    }

    /// Get the number of dispatches so far.
    pub fn num_dispatches(&self) -> usize {
        self.num_dispatches
    }

    /// Get the last demanded target of each servo on the bus.
    pub fn last_target_rad(&self) -> [f64; NUM_JOINTS] {
        self.target_rad
    }

    fn chan_of(&self, id: usize) -> Result<usize, ServoBankError> {
        self.ids
            .iter()
            .position(|&i| i == id)
            .ok_or(ServoBankError::UnknownServo(id))
    }
}

impl Default for SimServoBank {
    fn default() -> Self {
        Self::new(DEFAULT_IDS, [0.0; NUM_JOINTS])
    }
}

impl ServoBank for SimServoBank {
    fn open(&mut self) -> Result<(), ServoBankError> {
        debug!("Simulated servo bus open");
        self.bus_open = true;
        Ok(())
    }

    fn set_target(&mut self, ids: &[usize], dems_rad: &[f64]) -> Result<(), ServoBankError> {
        if !self.bus_open {
            return Err(ServoBankError::BusNotOpen);
        }

        if ids.len() != dems_rad.len() {
            return Err(ServoBankError::MismatchedDemand {
                num_ids: ids.len(),
                num_dems: dems_rad.len(),
            });
        }

        self.num_dispatches += 1;

        // Fire the injected fault before any demand reaches the servos
        match self.fault_on_dispatch.take() {
            Some((n, msg)) if n == self.num_dispatches => {
                return Err(ServoBankError::DriverFault(msg));
            }
            other => self.fault_on_dispatch = other,
        }

        for (id, dem) in ids.iter().zip(dems_rad.iter()) {
            let chan = self.chan_of(*id)?;
            self.target_rad[chan] = *dem;
        }

        Ok(())
    }

    fn read_position(&mut self, ids: &[usize]) -> Result<Vec<f64>, ServoBankError> {
        if !self.bus_open {
            return Err(ServoBankError::BusNotOpen);
        }

        // Advance the first-order model one step
        if !self.stuck {
            for chan in 0..NUM_JOINTS {
                self.pos_rad[chan] += (self.target_rad[chan] - self.pos_rad[chan]) * self.response;
            }
        }

        let mut pos = Vec::with_capacity(ids.len());
        for id in ids {
            pos.push(self.pos_rad[self.chan_of(*id)?]);
        }

        Ok(pos)
    }

    fn close(&mut self) -> Result<(), ServoBankError> {
        debug!("Simulated servo bus closed");
        self.bus_open = false;
        Ok(())
    }
}

impl SimLinearBank {
    /// Create a new simulated linear actuator bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the nth dispatch (1-based) fail with a driver fault.
    pub fn fault_on_dispatch(&mut self, n: usize, msg: &str) {
        self.fault_on_dispatch = Some((n, String::from(msg)));
    }

    /// Get the last dispatched joint vector.
    pub fn last_targets_m(&self) -> Option<[f64; NUM_LINEAR_CHANNELS]> {
        self.last_targets_m
    }

    /// Get the speed factor of the last dispatch.
    pub fn last_speed_factor(&self) -> Option<f64> {
        self.last_speed_factor
    }

    /// Get the number of dispatches so far.
    pub fn num_dispatches(&self) -> usize {
        self.num_dispatches
    }
}

impl LinearBank for SimLinearBank {
    fn set_joint_vector(
        &mut self,
        targets_m: &[f64; NUM_LINEAR_CHANNELS],
        speed_factor: f64,
    ) -> Result<(), LinearBankError> {
        if !(speed_factor > 0.0 && speed_factor <= 1.0) {
            return Err(LinearBankError::InvalidSpeedFactor(speed_factor));
        }

        self.num_dispatches += 1;

        // Fire the injected fault before any demand reaches the bank
        match self.fault_on_dispatch.take() {
            Some((n, msg)) if n == self.num_dispatches => {
                return Err(LinearBankError::DriverFault(msg));
            }
            other => self.fault_on_dispatch = other,
        }

        self.last_targets_m = Some(*targets_m);
        self.last_speed_factor = Some(speed_factor);

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
