//! Offline verify command.

use std::path::Path;

use rvcheck::{CheckConfig, Scenario, verify_log};
use tracing::error;

use crate::cli::EXIT_FAILURE;
use crate::commands::report_verdict;
use crate::terminal;

/// Handle the `verify` command.
pub fn cmd_verify(config: &CheckConfig, log: &Path) -> i32 {
    if !config.objdump.exists() {
        terminal::warning("disassembly not found; register checks will fail");
        terminal::path_output(&config.objdump);
    }
    terminal::info(&format!("Verifying {}", log.display()));

    match verify_log(log, &config.nm, &config.objdump, &Scenario::skiptrap(), &config.tolerance) {
        Ok(verdict) => report_verdict(&verdict, Some(log)),
        Err(e) => {
            error!(error = %e, "verification failed");
            terminal::error(&e.to_string());
            EXIT_FAILURE
        }
    }
}
