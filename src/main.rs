mod application;
mod cli;
mod domain;
mod infra;
mod kernel;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graingrowth=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --version lands here too
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(cli::FAILURE_CODE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    cli.run()
}
