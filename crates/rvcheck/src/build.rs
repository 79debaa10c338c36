//! Test program build trigger.
//!
//! The program is built by its own Makefile; this module only decides when
//! to invoke it and reports failures.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, error, info_span};

use crate::{Error, Result};

/// True if any of `artifacts` is missing.
#[must_use]
pub fn needs_build(artifacts: &[&Path]) -> bool {
    artifacts.iter().any(|path| !path.exists())
}

/// Run `make -C <program_dir> -j`.
///
/// # Errors
///
/// Returns [`Error::BuildFailed`] with the first line of make's output if
/// make cannot be launched or exits unsuccessfully.
pub fn build_program(program_dir: &Path) -> Result<()> {
    let _span = info_span!("build").entered();
    debug!(dir = %program_dir.display(), "running make");

    let output = Command::new("make")
        .arg("-C")
        .arg(program_dir)
        .arg("-j")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            error!(error = %e, "failed to run make");
            Error::BuildFailed(format!("failed to run make: {e}"))
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        error!(exit_code = code, dir = %program_dir.display(), stderr = %stderr, "make failed");
        let first_error = stderr
            .lines()
            .next()
            .or_else(|| stdout.lines().next())
            .unwrap_or("unknown error");
        return Err(Error::BuildFailed(format!("make failed: {first_error}")));
    }

    for line in stdout.lines() {
        debug!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_build() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("skiptrap.elf");
        std::fs::write(&present, b"").unwrap();
        let absent = dir.path().join("skiptrap.nm");

        assert!(!needs_build(&[&present]));
        assert!(needs_build(&[&present, &absent]));
        assert!(!needs_build(&[]));
    }

    #[test]
    fn test_build_failure_reports_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let Err(Error::BuildFailed(msg)) = build_program(&dir.path().join("missing")) else {
            panic!("expected build failure");
        };
        assert!(msg.starts_with("make failed: ") || msg.starts_with("failed to run make"));
    }
}
