//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rvcheck::{CheckConfig, LogFlags, SkewTolerance};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when the simulator executable is missing.
pub const EXIT_RUNNER_MISSING: i32 = 2;

#[derive(Parser)]
#[command(name = "rvcheck")]
#[command(about = "Commit-log conformance checker for RISC-V test programs")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors and the verdict)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the simulator on the skiptrap program and verify its commit log
    Run {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Simulator executable (default: <root>/build_result/kronos_rv32)
        #[arg(long)]
        runner: Option<PathBuf>,

        /// Cycle budget for the simulator
        #[arg(long, default_value = "5000")]
        max_cycles: u64,

        /// Event kinds to log (reg, mem, trap, all)
        #[arg(long, default_value = "reg,mem,trap")]
        log: LogFlags,

        /// Write the commit log here instead of a temporary file (never deleted)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Keep the temporary commit log even when the check passes
        #[arg(long)]
        keep_log: bool,

        /// Rebuild the test program before running
        #[arg(long)]
        build: bool,
    },

    /// Verify an existing commit log without running the simulator
    Verify {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Commit log to verify
        #[arg(long, value_name = "PATH")]
        log: PathBuf,
    },
}

/// Where to find the test program and its artifacts.
#[derive(Args)]
pub struct ArtifactArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Test program directory (default: <root>/software/skiptrap)
    #[arg(long)]
    pub program_dir: Option<PathBuf>,

    /// Program image (default: <program-dir>/build/skiptrap.elf)
    #[arg(long)]
    pub elf: Option<PathBuf>,

    /// Symbol table from nm (default: <program-dir>/build/skiptrap.nm)
    #[arg(long)]
    pub nm: Option<PathBuf>,

    /// Disassembly listing (default: <program-dir>/build/skiptrap.objdump)
    #[arg(long)]
    pub objdump: Option<PathBuf>,

    /// PC offsets tolerated between a store and its logged write
    #[arg(long, default_value = "0,2,4,6,8")]
    pub skew: SkewTolerance,
}

impl ArtifactArgs {
    /// Build a check configuration, applying any overrides.
    pub fn config(&self) -> CheckConfig {
        let mut config = CheckConfig::from_root(&self.root).with_tolerance(self.skew.clone());
        if let Some(dir) = &self.program_dir {
            config = config.with_program_dir(dir);
        }
        if let Some(elf) = &self.elf {
            config = config.with_elf(elf);
        }
        if let Some(nm) = &self.nm {
            config = config.with_nm(nm);
        }
        if let Some(objdump) = &self.objdump {
            config = config.with_objdump(objdump);
        }
        config
    }
}
