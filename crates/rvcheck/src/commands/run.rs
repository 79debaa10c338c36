//! Run command.

use rvcheck::build::{build_program, needs_build};
use rvcheck::{CheckConfig, DriverError, Error, Scenario, run_check};
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_RUNNER_MISSING};
use crate::commands::report_verdict;
use crate::terminal::{self, Spinner};

/// Handle the `run` command.
pub fn cmd_run(config: &CheckConfig, force_build: bool) -> i32 {
    let scenario = Scenario::skiptrap();

    if force_build || needs_build(&config.required_artifacts()) {
        let spinner = Spinner::new(format!("Building {}...", scenario.name));
        if let Err(e) = build_program(&config.program_dir) {
            spinner.finish_with_failure(&e.to_string());
            return EXIT_FAILURE;
        }
        spinner.finish_with_success(&format!("Built {}", scenario.name));
    }

    match run_check(config, &scenario) {
        Ok(report) => report_verdict(&report.verdict, report.log_path.as_deref()),
        Err(Error::Driver(DriverError::SimulatorLaunchFailure(path))) => {
            terminal::error("runner not found:");
            terminal::path_output(&path);
            eprintln!("hint: run ./build.sh at project root");
            EXIT_RUNNER_MISSING
        }
        Err(Error::Driver(DriverError::SimulatorRuntimeFailure { code, log })) => {
            terminal::error(&format!("Runner exited with non-zero: {code}"));
            if let Some(log) = log {
                eprintln!("Log saved at: {}", log.display());
            }
            code
        }
        Err(Error::CommitLog { path, source }) => {
            error!(error = %source, "commit log unreadable");
            terminal::error(&format!("cannot read commit log: {source}"));
            eprintln!("Log saved at: {}", path.display());
            EXIT_FAILURE
        }
        Err(e) => {
            error!(error = %e, "check failed");
            terminal::error(&e.to_string());
            EXIT_FAILURE
        }
    }
}
