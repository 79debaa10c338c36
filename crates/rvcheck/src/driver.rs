//! Simulator invocation.
//!
//! The simulator is an opaque executable driven by a fixed command line:
//!
//! ```text
//! <runner> <image> --tohost 0x<addr> --max-cycles <n> --log <flags> --log-file <path>
//! ```
//!
//! It stops on its own when the program writes `tohost` or the cycle budget
//! runs out, so no timeout is enforced here.

use std::ffi::OsString;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, info_span};

/// Simulator errors.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("runner not found: {}", .0.display())]
    SimulatorLaunchFailure(PathBuf),

    #[error("failed to launch {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("runner exited with non-zero: {code}")]
    SimulatorRuntimeFailure {
        code: i32,
        /// Retained commit log, if one was written.
        log: Option<PathBuf>,
    },

    #[error("failed to capture runner output: {0}")]
    Capture(#[from] std::io::Error),
}

/// Which event kinds the simulator should log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFlags {
    pub reg: bool,
    pub mem: bool,
    pub trap: bool,
}

impl LogFlags {
    /// Every event kind.
    pub const ALL: Self = Self {
        reg: true,
        mem: true,
        trap: true,
    };
}

impl Default for LogFlags {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromStr for LogFlags {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self {
            reg: false,
            mem: false,
            trap: false,
        };
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            match item {
                "all" => flags = Self::ALL,
                "reg" => flags.reg = true,
                "mem" => flags.mem = true,
                "trap" => flags.trap = true,
                other => return Err(format!("unknown log flag '{other}' (expected reg, mem, trap or all)")),
            }
        }
        Ok(flags)
    }
}

impl fmt::Display for LogFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [(self.reg, "reg"), (self.mem, "mem"), (self.trap, "trap")]
            .into_iter()
            .filter_map(|(on, name)| on.then_some(name))
            .collect();
        write!(f, "{}", names.join(","))
    }
}

/// Simulator invocation parameters.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Simulator executable.
    pub runner: PathBuf,
    /// Program image passed positionally.
    pub image: PathBuf,
    /// Address whose write ends the run.
    pub tohost: u64,
    /// Cycle budget.
    pub max_cycles: u64,
    pub log_flags: LogFlags,
    /// Commit log destination.
    pub log_file: PathBuf,
    /// Print the command line and the simulator's console output.
    pub echo: bool,
}

impl SimConfig {
    /// Create a config with the default budget (5000 cycles) and all log flags.
    pub fn new(runner: impl Into<PathBuf>, image: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            runner: runner.into(),
            image: image.into(),
            tohost: 0,
            max_cycles: 5000,
            log_flags: LogFlags::ALL,
            log_file: log_file.into(),
            echo: true,
        }
    }

    #[must_use]
    pub const fn with_tohost(mut self, tohost: u64) -> Self {
        self.tohost = tohost;
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
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Arguments after the executable.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        vec![
            self.image.clone().into_os_string(),
            "--tohost".into(),
            format!("0x{:x}", self.tohost).into(),
            "--max-cycles".into(),
            self.max_cycles.to_string().into(),
            "--log".into(),
            self.log_flags.to_string().into(),
            "--log-file".into(),
            self.log_file.clone().into_os_string(),
        ]
    }

    /// Render the full command line for display.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.runner.as_os_str())
            .chain(self.args().iter().map(OsString::as_os_str))
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of one simulator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimOutcome {
    /// Process exit code; `-1` when terminated by a signal.
    pub exit_code: i32,
    /// Interleaved stdout and stderr.
    pub output: String,
}

impl SimOutcome {
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Check that the runner executable exists.
///
/// # Errors
///
/// Returns [`DriverError::SimulatorLaunchFailure`] if it does not.
pub fn ensure_runner(runner: &Path) -> Result<(), DriverError> {
    if runner.exists() {
        Ok(())
    } else {
        Err(DriverError::SimulatorLaunchFailure(runner.to_path_buf()))
    }
}

/// Run the simulator to completion.
///
/// Stdout and stderr share one capture file so their interleaving is kept.
/// The exit code is returned unchanged; deciding what a non-zero code means
/// is left to the caller.
///
/// # Errors
///
/// Returns an error if the runner is missing, cannot be spawned, or its
/// output cannot be read back.
pub fn run(config: &SimConfig) -> Result<SimOutcome, DriverError> {
    let _span = info_span!("simulate").entered();
    ensure_runner(&config.runner)?;

    let command_line = config.command_line();
    info!(command = %command_line, "launching simulator");
    if config.echo {
        println!("RUN: {command_line}");
    }

    let mut capture = tempfile::tempfile()?;
    let status = Command::new(&config.runner)
        .args(config.args())
        .stdin(Stdio::null())
        .stdout(Stdio::from(capture.try_clone()?))
        .stderr(Stdio::from(capture.try_clone()?))
        .status()
        .map_err(|source| DriverError::Spawn {
            path: config.runner.clone(),
            source,
        })?;

    capture.seek(SeekFrom::Start(0))?;
    let mut raw = Vec::new();
    capture.read_to_end(&mut raw)?;
    let output = String::from_utf8_lossy(&raw).into_owned();

    for line in output.lines() {
        debug!("{}", line);
    }
    if config.echo {
        println!("{output}");
    }

    let exit_code = status.code().unwrap_or(-1);
    debug!(exit_code, "simulator finished");
    Ok(SimOutcome { exit_code, output })
}
