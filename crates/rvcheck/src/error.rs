use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverError;

/// Setup and orchestration errors.
///
/// Verification discrepancies are not errors in this sense; they are
/// collected into a [`crate::Verdict`].
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Artifact(#[from] rvcheck_elf::ElfError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read commit log {}: {source}", path.display())]
    CommitLog {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("required symbol '{0}' not found")]
    MissingSymbol(String),
    #[error("build failed: {0}")]
    BuildFailed(String),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

pub type Result<T> = std::result::Result<T, Error>;
