//! rvcheck - commit-log conformance checker
//!
//! Runs a RISC-V simulator against a known test program, parses its commit
//! log, and verifies the logged register and memory writes against the
//! side effects the program is expected to produce.
//!
//! # Example
//!
//! ```ignore
//! use rvcheck::{CheckConfig, Scenario, run_check};
//!
//! let config = CheckConfig::from_root(".".as_ref());
//! let report = run_check(&config, &Scenario::skiptrap())?;
//! assert!(report.verdict.is_pass());
//! ```

// Re-export from sub-crates
pub use rvcheck_elf::{Disassembly, ElfError, SymbolTable};
pub use rvcheck_isa::{OpKind, parse_reg, reg_name};

pub mod build;
pub mod check;
pub mod driver;
mod error;
pub mod expect;
pub mod trace;
pub mod verify;

pub use check::{CheckConfig, CheckReport, run_check, verify_log};
pub use driver::{DriverError, LogFlags, SimConfig, SimOutcome};
pub use error::{Error, Result};
pub use expect::{ExpectedWrite, Expectations, RegCheck, Resolved, Scenario, WriteOnce};
pub use trace::{MemWrite, RegWrite, Trace, TrapEvent};
pub use verify::{RegWriteLocator, SkewTolerance, Verdict, Verifier, VerifyError};
