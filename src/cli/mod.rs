// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. `clap` handles the two
// global options; everything after them is handed verbatim to
// the run-mode dispatcher in `commands.rs`, which owns the
// positional grammar and its diagnostics.
//
// Global options must come before the mode tokens:
//
//   graingrowth --config run.json --nonstop 2 poly.0000.dat 1000 100 4
//
// All business logic is delegated to Layer 2 (application).

pub mod commands;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::application::run_loop::RunLoop;
use crate::application::settings::RunSettings;
use crate::domain::error::DriverError;
use crate::domain::invocation::Invocation;
use crate::kernel::PottsKernel;

/// Exit status of every failed run (-1 as seen by the shell)
pub const FAILURE_CODE: u8 = 255;

/// `--help` is a run mode, not a clap flag, so clap's own help is off.
#[derive(Parser, Debug)]
#[command(
    name = "graingrowth",
    version,
    about = "Grain growth driver: Voronoi start, Potts Monte-Carlo, numbered checkpoints.",
    disable_help_flag = true
)]
pub struct Cli {
    /// JSON file with run and kernel settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not log tessellation and checkpoint timings
    #[arg(long)]
    pub quiet: bool,

    /// Run mode and its arguments (see `graingrowth --help`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Run to completion and translate the outcome into an exit status.
    pub fn run(self) -> ExitCode {
        match self.execute() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                // printed even when logging is filtered off
                eprintln!("{}", commands::diagnostic(&e));
                if !e.is_usage() {
                    tracing::error!("{e}");
                }
                ExitCode::from(FAILURE_CODE)
            }
        }
    }

    fn execute(&self) -> Result<(), DriverError> {
        let mut settings = match &self.config {
            Some(path) => RunSettings::load(path)?,
            None       => RunSettings::default(),
        };
        if self.quiet {
            settings.report_timing = false;
        }

        let invocation = commands::dispatch(&self.args, &settings)?;
        tracing::debug!(
            "Dispatching {:?} run: {} step(s) on {} worker(s)",
            invocation.mode(),
            invocation.total_steps(),
            invocation.workers(),
        );

        if invocation == Invocation::Help {
            println!("{}", commands::usage());
            return Ok(());
        }

        Self::run_invocation(&invocation, &settings)
    }

    #[cfg(not(feature = "mpi"))]
    fn run_invocation(invocation: &Invocation, settings: &RunSettings) -> Result<(), DriverError> {
        use crate::infra::metrics::SingleWorker;

        let kernel = PottsKernel::new(settings.kernel.clone());
        RunLoop::new(&kernel, &SingleWorker, settings.report_timing).execute(invocation)?;
        Ok(())
    }

    /// Every rank runs the same deterministic kernel; only rank 0
    /// writes checkpoints, the others take part in the reductions.
    #[cfg(feature = "mpi")]
    fn run_invocation(invocation: &Invocation, settings: &RunSettings) -> Result<(), DriverError> {
        use crate::infra::metrics::{MpiReducer, Reducer};
        use mpi::traits::Communicator;

        // finalised when `universe` drops at the end of the run
        let universe = mpi::initialize()
            .ok_or_else(|| DriverError::Kernel(anyhow::anyhow!("MPI is already initialised")))?;
        let world   = universe.world();
        let reducer = MpiReducer::new(universe.world());

        let mut kernel = PottsKernel::new(settings.kernel.clone());
        if !reducer.is_root() {
            kernel = kernel.idle_writer();
        }
        tracing::debug!("Rank {} of {} joining the run", reducer.rank(), world.size());

        match RunLoop::new(&kernel, &reducer, settings.report_timing).execute(invocation) {
            Ok(_) => Ok(()),
            // peers may be blocked in a reduction this rank will never join
            Err(e) if world.size() > 1 => {
                eprintln!("{}", commands::diagnostic(&e));
                world.abort(i32::from(FAILURE_CODE))
            }
            Err(e) => Err(e),
        }
    }
}
