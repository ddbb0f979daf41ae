//! # Motion Control Executable
//!
//! Drives the two actuated joints of the five bar mechanism and the linear actuator bank
//! beneath it. Commands come from a timestamped motion script if one is given on the command
//! line, otherwise the built in randomised self test is flown.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use structopt::StructOpt;

// Internal
use mech_if::eqpt::sim::{SimLinearBank, SimServoBank};
use motion_lib::{
    motion_ctrl::{CmdReport, MotionCtrl},
    self_test,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::Module,
    script_interpreter::{PendingCmds, ScriptInterpreter},
    session::{self, Session},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period between script polls.
///
/// Units: milliseconds
const SCRIPT_POLL_PERIOD_MS: u64 = 10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command line options
#[derive(Debug, StructOpt)]
#[structopt(name = "motion_exec")]
struct Opt {
    /// Path to a motion script to run. With no script the built in self test is flown instead.
    #[structopt(name = "SCRIPT", parse(from_os_str))]
    script_path: Option<PathBuf>,

    /// Seed for the self test's random primitive stream.
    #[structopt(short, long, default_value = "0")]
    seed: u64,
}

/// Summary of a completed script run, saved to the session.
#[derive(Serialize)]
struct ScriptReport {
    /// Number of commands which executed cleanly
    num_cmds_ok: u64,

    /// Number of commands which failed and were skipped
    num_cmds_failed: u64,

    /// Reports of the executed commands, in execution order
    reports: Vec<CmdReport>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("motion_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Five Bar Motion Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    debug!("CLI options: {:?}", opt);

    // ---- EQUIPMENT INITIALISATION ----

    // Simulated equipment stands in for the mechanism, real drivers slot in behind the same
    // traits
    let servo = SimServoBank::default();
    let linear = SimLinearBank::new();

    // ---- MODULE INITIALISATION ----

    info!("Initialising modules...");

    let mut motion_ctrl = MotionCtrl::new(servo, linear);
    motion_ctrl
        .init("motion_ctrl.toml", &session)
        .wrap_err("Failed to initialise MotionCtrl")?;

    info!("MotionCtrl init complete, mechanism at the home pose\n");

    // ---- COMMAND EXECUTION ----

    match opt.script_path {
        Some(ref script_path) => {
            run_script(&mut motion_ctrl, script_path, &session).wrap_err("Script run failed")?
        }
        None => {
            info!(
                "No script provided, flying the self test with seed {}",
                opt.seed
            );

            let mut rng = StdRng::seed_from_u64(opt.seed);

            let report =
                self_test::run(&mut motion_ctrl, &mut rng).wrap_err("Self test failed")?;

            session.save("self_test_report.json", report);
        }
    }

    // ---- SHUTDOWN ----

    motion_ctrl
        .shutdown()
        .wrap_err("Failed to shut MotionCtrl down")?;

    info!("Execution complete");

    session.exit();

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run a timestamped motion script to its end.
///
/// Command failures are logged and the script carries on, only a failure to load the script
/// itself aborts the run. The reports of every executed command are saved to the session once
/// the script ends.
fn run_script(
    motion_ctrl: &mut MotionCtrl<SimServoBank, SimLinearBank>,
    script_path: &Path,
    session: &Session,
) -> Result<()> {
    let mut si = ScriptInterpreter::new(script_path).wrap_err("Failed to load the script")?;

    info!(
        "Loaded script lasts {:.2} s and contains {} commands\n",
        si.get_duration(),
        si.get_num_cmds()
    );

    let mut script_report = ScriptReport {
        num_cmds_ok: 0,
        num_cmds_failed: 0,
        reports: vec![],
    };

    loop {
        match si.get_pending(session::get_elapsed_seconds()) {
            PendingCmds::None => (),
            PendingCmds::Some(cmds) => {
                for cmd in cmds.iter() {
                    match motion_ctrl.exec(cmd) {
                        Ok(report) => {
                            debug!("Executed {:?}: {:?}", cmd, report);
                            script_report.num_cmds_ok += 1;
                            script_report.reports.push(report);
                        }
                        Err(e) => {
                            warn!("Command {:?} failed: {}", cmd, e);
                            script_report.num_cmds_failed += 1;
                        }
                    }
                }
            }
            PendingCmds::EndOfScript => {
                info!("End of script reached, stopping");
                break;
            }
        }

        thread::sleep(Duration::from_millis(SCRIPT_POLL_PERIOD_MS));
    }

    info!(
        "Script run complete: {} commands executed, {} failed",
        script_report.num_cmds_ok, script_report.num_cmds_failed
    );

    session.save("script_report.json", script_report);

    Ok(())
}
