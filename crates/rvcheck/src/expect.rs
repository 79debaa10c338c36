//! Expected side effects of a test program.
//!
//! A [`Scenario`] is declarative: it names symbols, not addresses. Resolving
//! it against a [`SymbolTable`] yields concrete [`Expectations`] plus the
//! symbol errors found along the way.

use rvcheck_elf::SymbolTable;
use tracing::debug;

use crate::verify::VerifyError;
use crate::{Error, Result};

/// An expected memory write, in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedWrite {
    /// Address of the store instruction; `None` if its label did not resolve.
    pub pc: Option<u64>,
    pub addr: u64,
    pub data: u64,
    pub mask: u32,
}

/// An address that must be written exactly once, with this data and mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOnce {
    pub addr: u64,
    pub data: u64,
    pub mask: u32,
}

/// An exact register check. The PC comes from the disassembly of `label`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegCheck {
    pub label: String,
    pub rd: u8,
    pub val: u64,
}

/// Concrete expectations for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectations {
    /// Memory writes that must appear, in this order.
    pub writes: Vec<ExpectedWrite>,
    pub write_once: Vec<WriteOnce>,
    /// PC of a store that must trap instead of committing.
    pub misaligned_store_pc: Option<u64>,
    pub reg_checks: Vec<RegCheck>,
}

/// Expectations together with the symbol errors hit while building them.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub expectations: Expectations,
    pub errors: Vec<VerifyError>,
}

impl From<Expectations> for Resolved {
    fn from(expectations: Expectations) -> Self {
        Self {
            expectations,
            errors: Vec::new(),
        }
    }
}

/// A store performed at `label`, writing `data`/`mask` to the word at `target + offset`.
#[derive(Debug, Clone, Copy)]
pub struct StoreEvent {
    pub label: &'static str,
    pub target: &'static str,
    pub offset: u64,
    pub data: u64,
    pub mask: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOnceTarget {
    pub target: &'static str,
    pub data: u64,
    pub mask: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RegCheckEntry {
    pub label: &'static str,
    pub rd: u8,
    pub val: u64,
}

/// Declarative description of a test program's side effects.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    /// Symbol whose address is passed as `--tohost`.
    pub halt_symbol: &'static str,
    pub writes: &'static [StoreEvent],
    pub write_once: &'static [WriteOnceTarget],
    /// Label of the store that must trap.
    pub misaligned_store: Option<&'static str>,
    pub reg_checks: &'static [RegCheckEntry],
}

const fn mem(label: &'static str, target: &'static str, data: u64, mask: u32) -> StoreEvent {
    StoreEvent {
        label,
        target,
        offset: 0,
        data,
        mask,
    }
}

const fn reg(label: &'static str, rd: u8, val: u64) -> RegCheckEntry {
    RegCheckEntry { label, rd, val }
}

// The `sh` to g_buf+2 and `sb` to g_buf+1 land on the g_buf word with the
// data replicated across lanes and only the target lanes enabled.
const SKIPTRAP_WRITES: &[StoreEvent] = &[
    mem("L_SW_GDATA0", "g_data0", 0x1234_5678, 0xf),
    mem("L_SW_GDATA1", "g_data1", 0xabcd_ef01, 0xf),
    mem("L_SW_GBUF", "g_buf", 0x1122_3344, 0xf),
    mem("L_SH_GBUF_P2", "g_buf", 0x3344_1122, 0xc),
    mem("L_SB_GBUF_P1", "g_buf", 0x2233_4411, 0x2),
    mem("L_SW_TOHOST", "tohost", 0x1, 0xf),
];

// `sw g_data0+2` is misaligned; the core must trap, leaving only the
// aligned store to g_data0.
const SKIPTRAP_WRITE_ONCE: &[WriteOnceTarget] = &[WriteOnceTarget {
    target: "g_data0",
    data: 0x1234_5678,
    mask: 0xf,
}];

const SKIPTRAP_REGS: &[RegCheckEntry] = &[
    reg("L_LI_T0", rvcheck_isa::REG_T0, 0x1234_5678),
    reg("L_LI_T1", rvcheck_isa::REG_T1, 0xabcd_ef01),
    reg("L_LI_T2", rvcheck_isa::REG_T2, 0x1122_3344),
    reg("L_LI_T3", rvcheck_isa::REG_T3, 0x0),
    reg("L_LI_T0_1", rvcheck_isa::REG_T0, 0x1),
];

impl Scenario {
    /// The misaligned-store skip-trap program.
    #[must_use]
    pub const fn skiptrap() -> Self {
        Self {
            name: "skiptrap",
            halt_symbol: "tohost",
            writes: SKIPTRAP_WRITES,
            write_once: SKIPTRAP_WRITE_ONCE,
            misaligned_store: Some("L_MISALIGNED_SW"),
            reg_checks: SKIPTRAP_REGS,
        }
    }

    /// Address of the halt symbol.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSymbol`] if the symbol is absent.
    pub fn halt_address(&self, symbols: &SymbolTable) -> Result<u64> {
        require(symbols, self.halt_symbol)
    }

    /// Resolve symbol names into concrete expectations.
    ///
    /// A store label that does not resolve is recorded as
    /// [`VerifyError::SymbolNotFound`] and leaves that event's `pc` empty;
    /// every such label is reported, not just the first. Data symbols have
    /// no such fallback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSymbol`] if a store target is absent.
    pub fn resolve(&self, symbols: &SymbolTable) -> Result<Resolved> {
        let mut errors = Vec::new();
        let mut writes = Vec::with_capacity(self.writes.len());

        for (index, entry) in self.writes.iter().enumerate() {
            let addr = require(symbols, entry.target)? + entry.offset;
            let pc = symbols.lookup(entry.label);
            if pc.is_none() {
                errors.push(VerifyError::SymbolNotFound {
                    index,
                    symbol: entry.label.to_string(),
                });
            }
            writes.push(ExpectedWrite {
                pc,
                addr,
                data: entry.data,
                mask: entry.mask,
            });
        }

        let write_once = self
            .write_once
            .iter()
            .map(|entry| {
                Ok(WriteOnce {
                    addr: require(symbols, entry.target)?,
                    data: entry.data,
                    mask: entry.mask,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // An unresolved misaligned-store label only disables the negative check.
        let misaligned_store_pc = self.misaligned_store.and_then(|label| symbols.lookup(label));

        let reg_checks = self
            .reg_checks
            .iter()
            .map(|entry| RegCheck {
                label: entry.label.to_string(),
                rd: entry.rd,
                val: entry.val,
            })
            .collect();

        debug!(
            scenario = self.name,
            writes = writes.len(),
            unresolved = errors.len(),
            "resolved expectations"
        );

        Ok(Resolved {
            expectations: Expectations {
                writes,
                write_once,
                misaligned_store_pc,
                reg_checks,
            },
            errors,
        })
    }
}

fn require(symbols: &SymbolTable, name: &str) -> Result<u64> {
    symbols
        .lookup(name)
        .ok_or_else(|| Error::MissingSymbol(name.to_string()))
}
