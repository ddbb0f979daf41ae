//! Module interfaces
//!
//! Each control module in `motion_exec` shall implement all the items in
//! this module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE TRAIT
// ---------------------------------------------------------------------------

/// A blocking control module.
///
/// Unlike a cyclically-processed module, a blocking module fully completes
/// each command, including any convergence polling it involves, before
/// `exec` returns.
pub trait Module {
    /// Data required during initialisation
    type InitData;
    /// An error which can occur during initialisation.
    type InitError;

    /// A command the module can execute.
    type Command;
    /// A report on the execution of a command.
    type Report;
    /// An error which can occur while executing a command.
    type ExecError;

    /// Initialise the module.
    ///
    /// # Inputs
    /// - `init_data`: The input data required by the module.
    ///
    /// # Outputs
    /// - On success `Ok(())`.
    /// - On error an `InitError` instance.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Execute a command to completion.
    ///
    /// # Inputs
    /// - `cmd`: The command for the module to execute.
    ///
    /// # Outputs
    /// - On success a report on the executed command.
    /// - On error an `ExecError` instance.
    fn exec(&mut self, cmd: &Self::Command) -> Result<Self::Report, Self::ExecError>;
}
