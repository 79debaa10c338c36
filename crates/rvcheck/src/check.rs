//! End-to-end check orchestration.
//!
//! A check loads the program's symbol table and listing, runs the simulator
//! with a commit log, parses that log, and verifies it. The commit log lives
//! in a temporary file that is deleted on a clean pass and kept otherwise.

use std::path::{Path, PathBuf};

use rvcheck_elf::{Disassembly, SymbolTable};
use tempfile::TempPath;
use tracing::{debug, info, info_span, warn};

use crate::driver::{self, DriverError, LogFlags, SimConfig, SimOutcome};
use crate::expect::{Resolved, Scenario};
use crate::trace::Trace;
use crate::verify::{SkewTolerance, Verdict, Verifier};
use crate::{Error, Result};

/// Where a check finds its tools and artifacts, and how it runs.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Simulator executable.
    pub runner: PathBuf,
    /// Directory holding the test program's Makefile.
    pub program_dir: PathBuf,
    pub elf: PathBuf,
    /// `nm` output for the ELF.
    pub nm: PathBuf,
    /// `objdump -d` output for the ELF.
    pub objdump: PathBuf,
    pub max_cycles: u64,
    pub log_flags: LogFlags,
    /// Fixed commit log path. When unset, a temporary file is used.
    pub log_file: Option<PathBuf>,
    /// Keep the temporary commit log even on a pass.
    pub keep_log: bool,
    pub tolerance: SkewTolerance,
    /// Echo the simulator command line and output.
    pub echo: bool,
}

impl CheckConfig {
    /// Default layout relative to a project root.
    #[must_use]
    pub fn from_root(root: &Path) -> Self {
        Self {
            runner: root.join("build_result").join("kronos_rv32"),
            program_dir: PathBuf::new(),
            elf: PathBuf::new(),
            nm: PathBuf::new(),
            objdump: PathBuf::new(),
            max_cycles: 5000,
            log_flags: LogFlags::ALL,
            log_file: None,
            keep_log: false,
            tolerance: SkewTolerance::default(),
            echo: true,
        }
        .with_program_dir(root.join("software").join("skiptrap"))
    }

    /// Use another program directory; the artifact paths follow it.
    #[must_use]
    pub fn with_program_dir(mut self, program_dir: impl Into<PathBuf>) -> Self {
        self.program_dir = program_dir.into();
        let build = self.program_dir.join("build");
        self.elf = build.join("skiptrap.elf");
        self.nm = build.join("skiptrap.nm");
        self.objdump = build.join("skiptrap.objdump");
        self
    }

    #[must_use]
    pub fn with_runner(mut self, runner: impl Into<PathBuf>) -> Self {
        self.runner = runner.into();
        self
    }

    #[must_use]
    pub fn with_elf(mut self, elf: impl Into<PathBuf>) -> Self {
        self.elf = elf.into();
        self
    }

    #[must_use]
    pub fn with_nm(mut self, nm: impl Into<PathBuf>) -> Self {
        self.nm = nm.into();
        self
    }

    #[must_use]
    pub fn with_objdump(mut self, objdump: impl Into<PathBuf>) -> Self {
        self.objdump = objdump.into();
        self
    }

    #[must_use]
    pub const fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    #[must_use]
    pub const fn with_log_flags(mut self, log_flags: LogFlags) -> Self {
        self.log_flags = log_flags;
        self
    }

    #[must_use]
    pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = Some(log_file.into());
        self
    }

    #[must_use]
    pub const fn with_keep_log(mut self, keep_log: bool) -> Self {
        self.keep_log = keep_log;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: SkewTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Artifacts whose absence calls for a build.
    #[must_use]
    pub fn required_artifacts(&self) -> [&Path; 2] {
        [&self.elf, &self.nm]
    }
}

/// Outcome of a completed check.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub verdict: Verdict,
    /// Commit log left on disk, if any.
    pub log_path: Option<PathBuf>,
    pub sim: SimOutcome,
}

/// Commit log destination for one run.
struct CommitLog {
    path: PathBuf,
    /// Set when the file is ours to delete.
    temp: Option<TempPath>,
}

impl CommitLog {
    fn create(config: &CheckConfig, scenario: &Scenario) -> Result<Self> {
        if let Some(path) = &config.log_file {
            return Ok(Self {
                path: path.clone(),
                temp: None,
            });
        }
        let temp = tempfile::Builder::new()
            .prefix(&format!("{}_log_", scenario.name))
            .suffix(".txt")
            .tempfile()?
            .into_temp_path();
        Ok(Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
        })
    }

    /// Leave the log on disk and return its path.
    fn retain(self) -> Result<PathBuf> {
        if let Some(temp) = self.temp {
            temp.keep().map_err(std::io::Error::from)?;
        }
        Ok(self.path)
    }

    /// Parse the log. An unreadable log is kept and its path reported.
    fn read(self) -> Result<(Self, Trace)> {
        match Trace::load(&self.path) {
            Ok(trace) => Ok((self, trace)),
            Err(source) => {
                let path = self.retain()?;
                Err(Error::CommitLog { path, source })
            }
        }
    }

    /// Delete a temporary log; a user-chosen path is left alone.
    fn discard(self) -> Option<PathBuf> {
        match self.temp {
            Some(temp) => {
                if let Err(e) = temp.close() {
                    warn!(error = %e, "failed to delete commit log");
                }
                None
            }
            None => Some(self.path),
        }
    }
}

/// Run the simulator on the scenario's program and verify its commit log.
///
/// # Errors
///
/// Returns an error if an artifact cannot be read, a required symbol is
/// missing, or the simulator cannot be launched or exits non-zero. In the
/// last case the commit log is kept and its path is carried in
/// [`DriverError::SimulatorRuntimeFailure`]. A log that cannot be read back
/// is kept too and reported as [`Error::CommitLog`].
pub fn run_check(config: &CheckConfig, scenario: &Scenario) -> Result<CheckReport> {
    let _span = info_span!("check", scenario = scenario.name).entered();
    driver::ensure_runner(&config.runner)?;

    let symbols = SymbolTable::load(&config.nm)?;
    let tohost = scenario.halt_address(&symbols)?;
    let resolved = scenario.resolve(&symbols)?;
    let listing = load_listing(&config.objdump);

    let log = CommitLog::create(config, scenario)?;
    let sim_config = SimConfig::new(&config.runner, &config.elf, &log.path)
        .with_tohost(tohost)
        .with_max_cycles(config.max_cycles)
        .with_log_flags(config.log_flags)
        .with_echo(config.echo);

    let sim = driver::run(&sim_config)?;
    if !sim.success() {
        let log = log.retain()?;
        return Err(DriverError::SimulatorRuntimeFailure {
            code: sim.exit_code,
            log: Some(log),
        }
        .into());
    }

    let (log, trace) = log.read()?;
    let verdict = evaluate(&resolved, &trace, listing.as_ref(), &config.tolerance);

    let log_path = if verdict.is_pass() && !config.keep_log {
        log.discard()
    } else {
        Some(log.retain()?)
    };

    Ok(CheckReport {
        verdict,
        log_path,
        sim,
    })
}

/// Verify an existing commit log without running the simulator.
///
/// # Errors
///
/// Returns an error if the log or symbol table cannot be read, or a
/// required symbol is missing.
pub fn verify_log(
    log: &Path,
    nm: &Path,
    objdump: &Path,
    scenario: &Scenario,
    tolerance: &SkewTolerance,
) -> Result<Verdict> {
    let _span = info_span!("check", scenario = scenario.name).entered();

    let symbols = SymbolTable::load(nm)?;
    let resolved = scenario.resolve(&symbols)?;
    let listing = load_listing(objdump);
    let trace = Trace::load(log).map_err(|source| Error::CommitLog {
        path: log.to_path_buf(),
        source,
    })?;

    Ok(evaluate(&resolved, &trace, listing.as_ref(), tolerance))
}

fn evaluate(
    resolved: &Resolved,
    trace: &Trace,
    listing: Option<&Disassembly>,
    tolerance: &SkewTolerance,
) -> Verdict {
    info!(
        mem_writes = trace.mem_writes.len(),
        reg_writes = trace.reg_writes.len(),
        traps = trace.traps.len(),
        "commit log parsed"
    );
    if let Some(pc) = resolved.expectations.misaligned_store_pc {
        match trace.traps_at(pc).next() {
            Some(trap) => info!(
                pc = format!("{pc:#x}"),
                cause = trap.cause,
                "misaligned store trapped"
            ),
            None => debug!(pc = format!("{pc:#x}"), "no trap logged at misaligned store"),
        }
    }

    Verifier::new(tolerance.clone()).verify(resolved, trace, &listing)
}

/// Load the listing; a missing or unreadable one fails every register check.
fn load_listing(path: &Path) -> Option<Disassembly> {
    match Disassembly::load(path) {
        Ok(listing) => Some(listing),
        Err(e) => {
            warn!(error = %e, "disassembly unavailable");
            None
        }
    }
}
