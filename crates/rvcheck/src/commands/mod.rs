//! Command implementations.
//!
//! Each submodule handles a specific CLI command.

mod run;
mod verify;

use std::path::Path;

use rvcheck::Verdict;

use crate::cli::{Cli, Commands, EXIT_FAILURE, EXIT_SUCCESS};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Run {
            artifacts,
            runner,
            max_cycles,
            log,
            log_file,
            keep_log,
            build,
        } => {
            let mut config = artifacts
                .config()
                .with_max_cycles(*max_cycles)
                .with_log_flags(*log)
                .with_keep_log(*keep_log)
                .with_echo(!cli.silent);
            if let Some(runner) = runner {
                config = config.with_runner(runner);
            }
            if let Some(log_file) = log_file {
                config = config.with_log_file(log_file);
            }
            run::cmd_run(&config, *build)
        }
        Commands::Verify { artifacts, log } => verify::cmd_verify(&artifacts.config(), log),
    }
}

// ============================================================================
// Verdict reporting
// ============================================================================

const PASS_MESSAGE: &str = "PASS: strict REG+MEMW checks passed; misaligned store suppressed.";

/// Print the verdict and map it to an exit code.
///
/// Discrepancies go to stdout; the log location goes to stderr.
pub fn report_verdict(verdict: &Verdict, log_path: Option<&Path>) -> i32 {
    match verdict {
        Verdict::Pass => {
            println!("{PASS_MESSAGE}");
            if let Some(path) = log_path {
                eprintln!("Log saved at: {}", path.display());
            }
            EXIT_SUCCESS
        }
        Verdict::Fail(errors) => {
            println!("FAIL:");
            for err in errors {
                println!(" - {err}");
            }
            if let Some(path) = log_path {
                eprintln!();
                eprintln!("Log saved at: {}", path.display());
            }
            EXIT_FAILURE
        }
    }
}
