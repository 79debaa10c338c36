//! Commit-log parsing.
//!
//! The simulator writes one tagged line per committed side effect:
//!
//! - `[MEMW] pc=0x<PC> addr=0x<ADDR> data=0x<DATA> mask=0x<MASK>`
//! - `[REG] pc=0x<PC> x<RD> <= 0x<VALUE>`
//! - `[TRAP] pc=0x<PC> exception=<E> trap_jump=<J> irq=<I> cause=0x<CAUSE>`
//!
//! Tags are interleaved with each other and with free-form simulator output.
//! Each parser keeps only its own tag; everything else is skipped. Returned
//! events are in log order, which is retirement order.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// A committed memory write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemWrite {
    /// Program counter the simulator attributed the store to.
    pub pc: u64,
    /// Word address of the write.
    pub addr: u64,
    /// Write data, already shifted into its byte lanes.
    pub data: u64,
    /// Byte-lane enable mask (bit N = byte N of the word).
    pub mask: u32,
}

impl MemWrite {
    /// Parse a `[MEMW]` line.
    pub fn parse(line: &str) -> Option<Self> {
        let pattern = MEMW_PATTERN.get_or_init(|| {
            Regex::new(
                r"^\[MEMW\]\s+pc=0x([0-9a-fA-F]+)\s+addr=0x([0-9a-fA-F]+)\s+data=0x([0-9a-fA-F]+)\s+mask=0x([0-9a-fA-F]+)",
            )
            .unwrap()
        });
        let caps = pattern.captures(line.trim())?;

        Some(Self {
            pc: u64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?,
            addr: u64::from_str_radix(caps.get(2)?.as_str(), 16).ok()?,
            data: u64::from_str_radix(caps.get(3)?.as_str(), 16).ok()?,
            mask: u32::from_str_radix(caps.get(4)?.as_str(), 16).ok()?,
        })
    }
}

impl fmt::Display for MemWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pc=0x{:x} addr=0x{:x} data=0x{:x} mask=0x{:x}",
            self.pc, self.addr, self.data, self.mask
        )
    }
}

/// A committed register write-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegWrite {
    pub pc: u64,
    pub rd: u8,
    pub val: u64,
}

impl RegWrite {
    /// Parse a `[REG]` line.
    pub fn parse(line: &str) -> Option<Self> {
        let pattern = REG_PATTERN.get_or_init(|| {
            Regex::new(r"^\[REG\]\s+pc=0x([0-9a-fA-F]+)\s+x([0-9]+)\s+<=\s+0x([0-9a-fA-F]+)")
                .unwrap()
        });
        let caps = pattern.captures(line.trim())?;

        Some(Self {
            pc: u64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?,
            rd: caps.get(2)?.as_str().parse::<u8>().ok()?,
            val: u64::from_str_radix(caps.get(3)?.as_str(), 16).ok()?,
        })
    }
}

impl fmt::Display for RegWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pc=0x{:x} x{} <= 0x{:x}", self.pc, self.rd, self.val)
    }
}

/// A trap or interrupt observed in the execute stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapEvent {
    pub pc: u64,
    pub exception: bool,
    pub trap_jump: bool,
    pub irq: bool,
    pub cause: u64,
}

impl TrapEvent {
    /// Parse a `[TRAP]` line.
    pub fn parse(line: &str) -> Option<Self> {
        let pattern = TRAP_PATTERN.get_or_init(|| {
            Regex::new(
                r"^\[TRAP\]\s+pc=0x([0-9a-fA-F]+)\s+exception=(\d+)\s+trap_jump=(\d+)\s+irq=(\d+)\s+cause=0x([0-9a-fA-F]+)",
            )
            .unwrap()
        });
        let caps = pattern.captures(line.trim())?;
        let flag = |idx: usize| -> Option<bool> {
            caps.get(idx)?.as_str().parse::<u8>().ok().map(|v| v != 0)
        };

        Some(Self {
            pc: u64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?,
            exception: flag(2)?,
            trap_jump: flag(3)?,
            irq: flag(4)?,
            cause: u64::from_str_radix(caps.get(5)?.as_str(), 16).ok()?,
        })
    }
}

/// Parse every `[MEMW]` line in `text`, in log order.
#[must_use]
pub fn parse_memory_writes(text: &str) -> Vec<MemWrite> {
    text.lines().filter_map(MemWrite::parse).collect()
}

/// Parse every `[REG]` line in `text`, in log order.
#[must_use]
pub fn parse_register_writes(text: &str) -> Vec<RegWrite> {
    text.lines().filter_map(RegWrite::parse).collect()
}

/// Parse every `[TRAP]` line in `text`, in log order.
#[must_use]
pub fn parse_traps(text: &str) -> Vec<TrapEvent> {
    text.lines().filter_map(TrapEvent::parse).collect()
}

/// All event streams of one commit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    pub mem_writes: Vec<MemWrite>,
    pub reg_writes: Vec<RegWrite>,
    pub traps: Vec<TrapEvent>,
}

impl Trace {
    /// Parse a commit log held in memory.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            mem_writes: parse_memory_writes(text),
            reg_writes: parse_register_writes(text),
            traps: parse_traps(text),
        }
    }

    /// Read and parse a commit log file.
    ///
    /// Non-UTF-8 bytes are replaced rather than rejected; only tagged lines
    /// matter and those are ASCII.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let trace = Self::parse(&String::from_utf8_lossy(&bytes));
        debug!(
            path = %path.display(),
            mem_writes = trace.mem_writes.len(),
            reg_writes = trace.reg_writes.len(),
            traps = trace.traps.len(),
            "parsed commit log"
        );
        Ok(trace)
    }

    /// Memory writes targeting `addr`.
    pub fn writes_to(&self, addr: u64) -> impl Iterator<Item = &MemWrite> {
        self.mem_writes.iter().filter(move |w| w.addr == addr)
    }

    /// Traps taken at `pc`.
    pub fn traps_at(&self, pc: u64) -> impl Iterator<Item = &TrapEvent> {
        self.traps.iter().filter(move |t| t.pc == pc)
    }
}

static MEMW_PATTERN: OnceLock<Regex> = OnceLock::new();
static REG_PATTERN: OnceLock<Regex> = OnceLock::new();
static TRAP_PATTERN: OnceLock<Regex> = OnceLock::new();
