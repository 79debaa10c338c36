//! Verification of a parsed commit log against resolved expectations.
//!
//! The engine runs as a fixed pipeline. Each stage is a pure function that
//! returns the discrepancies it found; the engine concatenates them.
//!
//! 1. Symbol resolution errors (computed by [`crate::Scenario::resolve`]).
//! 2. Skew-tolerant matching of expected memory writes.
//! 3. Order check, only if nothing has failed so far.
//! 4. Write-once check.
//! 5. Misaligned-store check.
//! 6. Exact register checks, only if nothing has failed so far.

use std::fmt;
use std::str::FromStr;

use rvcheck_elf::Disassembly;
use thiserror::Error;
use tracing::{debug, info_span, warn};

use crate::expect::{ExpectedWrite, Expectations, RegCheck, Resolved, WriteOnce};
use crate::trace::{MemWrite, RegWrite, Trace};

/// A single discrepancy between expected and observed behavior.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("symbol not found for event #{index} ({symbol})")]
    SymbolNotFound { index: usize, symbol: String },

    #[error("objdump PC not found for label {label}")]
    LabelNotFound { label: String },

    #[error("missing write pc=0x{pc:x} addr=0x{addr:x} data=0x{data:x} mask=0x{mask:x}")]
    MissingWrite {
        pc: u64,
        addr: u64,
        data: u64,
        mask: u32,
    },

    #[error("order mismatch between event {first} and {second}")]
    OrderMismatch { first: usize, second: usize },

    #[error("unexpected extra write(s) to 0x{addr:x} (found {count})")]
    SpuriousWrite { addr: u64, count: usize },

    #[error("unexpected memory write at misaligned store pc=0x{pc:x}")]
    UnexpectedTrapWrite { pc: u64 },

    #[error("missing register write at exact pc=0x{pc:x} x{rd} <= 0x{val:x} (label {label})")]
    MissingRegisterWrite {
        label: String,
        pc: u64,
        rd: u8,
        val: u64,
    },
}

/// Overall outcome of verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Every discrepancy found, in stage order.
    Fail(Vec<VerifyError>),
}

impl Verdict {
    /// Pass iff `errors` is empty.
    #[must_use]
    pub fn from_errors(errors: Vec<VerifyError>) -> Self {
        if errors.is_empty() {
            Self::Pass
        } else {
            Self::Fail(errors)
        }
    }

    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// The discrepancies (empty on pass).
    #[must_use]
    pub fn errors(&self) -> &[VerifyError] {
        match self {
            Self::Pass => &[],
            Self::Fail(errors) => errors,
        }
    }
}

/// PC offsets tolerated between a store's address and its commit-log PC.
///
/// The default `{0, 2, 4, 6, 8}` covers the skew observed between the
/// disassembled store address and the PC the pipeline reports at commit.
/// Offsets are kept sorted and unique; matching tries them in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkewTolerance {
    offsets: Vec<u64>,
}

impl SkewTolerance {
    pub const DEFAULT_OFFSETS: [u64; 5] = [0, 2, 4, 6, 8];

    /// Build a tolerance set from arbitrary offsets.
    pub fn new(offsets: impl IntoIterator<Item = u64>) -> Self {
        let mut offsets: Vec<u64> = offsets.into_iter().collect();
        offsets.sort_unstable();
        offsets.dedup();
        Self { offsets }
    }

    /// No skew: the logged PC must equal the store's address.
    #[must_use]
    pub fn exact() -> Self {
        Self::new([0])
    }

    #[must_use]
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }
}

impl Default for SkewTolerance {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OFFSETS)
    }
}

impl FromStr for SkewTolerance {
    type Err = String;

    /// Parse a comma-separated list of decimal or `0x` hex offsets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let offsets = s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let parsed = match item.strip_prefix("0x") {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => item.parse::<u64>(),
                };
                parsed.map_err(|e| format!("invalid skew offset '{item}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if offsets.is_empty() {
            return Err("skew tolerance needs at least one offset".to_string());
        }
        Ok(Self::new(offsets))
    }
}

impl fmt::Display for SkewTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.offsets.iter().map(u64::to_string).collect();
        write!(f, "{}", items.join(","))
    }
}

/// Source of exact register-write PCs, keyed by label and register.
pub trait RegWriteLocator {
    /// PC of the last write to `rd` in the block introduced by `label`.
    fn last_write_pc(&self, label: &str, rd: u8) -> Option<u64>;
}

impl RegWriteLocator for Disassembly {
    fn last_write_pc(&self, label: &str, rd: u8) -> Option<u64> {
        self.find_last_write_pc(label, rd)
    }
}

impl<T: RegWriteLocator + ?Sized> RegWriteLocator for &T {
    fn last_write_pc(&self, label: &str, rd: u8) -> Option<u64> {
        (**self).last_write_pc(label, rd)
    }
}

/// A missing listing locates nothing.
impl<T: RegWriteLocator> RegWriteLocator for Option<T> {
    fn last_write_pc(&self, label: &str, rd: u8) -> Option<u64> {
        self.as_ref()?.last_write_pc(label, rd)
    }
}

/// Commit-log verifier.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    tolerance: SkewTolerance,
}

impl Verifier {
    #[must_use]
    pub const fn new(tolerance: SkewTolerance) -> Self {
        Self { tolerance }
    }

    /// Run every stage and fold the results into a verdict.
    pub fn verify(
        &self,
        resolved: &Resolved,
        trace: &Trace,
        locator: &impl RegWriteLocator,
    ) -> Verdict {
        let _span = info_span!("verify", skew = %self.tolerance).entered();
        let exp = &resolved.expectations;
        let mut errors = resolved.errors.clone();

        let (positions, missing) = self.match_writes(&exp.writes, &trace.mem_writes);
        errors.extend(missing);

        if errors.is_empty() {
            // Every event has a position once stages 1 and 2 are clean.
            let positions: Vec<usize> = positions.into_iter().flatten().collect();
            errors.extend(check_order(&positions));
        }

        errors.extend(check_write_once(&exp.write_once, trace));
        errors.extend(check_misaligned_store(exp.misaligned_store_pc, trace));

        if errors.is_empty() {
            errors.extend(check_registers(&exp.reg_checks, &trace.reg_writes, locator));
        }

        debug!(errors = errors.len(), "verification finished");
        Verdict::from_errors(errors)
    }

    /// Convenience for expectations without symbol errors.
    pub fn verify_expectations(
        &self,
        expectations: Expectations,
        trace: &Trace,
        locator: &impl RegWriteLocator,
    ) -> Verdict {
        self.verify(&Resolved::from(expectations), trace, locator)
    }

    /// Find each expected write in `observed`.
    ///
    /// Offsets are tried in ascending order; the first offset with any
    /// structural match wins, and within it the earliest observed event.
    /// Events without a PC are skipped (already reported as unresolved).
    /// Returns one position per expected event alongside the misses.
    #[must_use]
    pub fn match_writes(
        &self,
        expected: &[ExpectedWrite],
        observed: &[MemWrite],
    ) -> (Vec<Option<usize>>, Vec<VerifyError>) {
        let mut positions = Vec::with_capacity(expected.len());
        let mut errors = Vec::new();

        for (index, exp) in expected.iter().enumerate() {
            let Some(pc) = exp.pc else {
                positions.push(None);
                continue;
            };
            let found = self.tolerance.offsets().iter().find_map(|&offset| {
                let want = pc.checked_add(offset)?;
                observed
                    .iter()
                    .position(|w| {
                        w.pc == want && w.addr == exp.addr && w.data == exp.data && w.mask == exp.mask
                    })
                    .map(|pos| (offset, pos))
            });
            match found {
                Some((offset, position)) => {
                    debug!(index, offset, position, "matched expected write");
                    positions.push(Some(position));
                }
                None => {
                    warn!(index, pc = format!("{pc:#x}"), "expected write not found");
                    positions.push(None);
                    errors.push(VerifyError::MissingWrite {
                        pc,
                        addr: exp.addr,
                        data: exp.data,
                        mask: exp.mask,
                    });
                }
            }
        }

        (positions, errors)
    }
}

/// Require matched positions to increase strictly in program order.
#[must_use]
pub fn check_order(positions: &[usize]) -> Vec<VerifyError> {
    positions
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] >= pair[1])
        .map(|(first, _)| VerifyError::OrderMismatch {
            first,
            second: first + 1,
        })
        .collect()
}

/// Require exactly one write, with the expected data and mask, to each target.
#[must_use]
pub fn check_write_once(targets: &[WriteOnce], trace: &Trace) -> Vec<VerifyError> {
    targets
        .iter()
        .filter_map(|target| {
            let writes: Vec<&MemWrite> = trace.writes_to(target.addr).collect();
            let ok = matches!(
                writes.as_slice(),
                [only] if only.data == target.data && only.mask == target.mask
            );
            (!ok).then(|| VerifyError::SpuriousWrite {
                addr: target.addr,
                count: writes.len(),
            })
        })
        .collect()
}

/// Reject any memory write committed at the misaligned store's PC.
#[must_use]
pub fn check_misaligned_store(pc: Option<u64>, trace: &Trace) -> Vec<VerifyError> {
    let Some(pc) = pc else {
        return Vec::new();
    };
    if trace.traps_at(pc).next().is_some() {
        debug!(pc = format!("{pc:#x}"), "misaligned store trapped");
    }
    if trace.mem_writes.iter().any(|w| w.pc == pc) {
        vec![VerifyError::UnexpectedTrapWrite { pc }]
    } else {
        Vec::new()
    }
}

/// Require each register check at its exact, disassembly-derived PC.
pub fn check_registers(
    checks: &[RegCheck],
    observed: &[RegWrite],
    locator: &impl RegWriteLocator,
) -> Vec<VerifyError> {
    // Resolve every label first so lookup failures are reported together.
    let resolved: Vec<(&RegCheck, Option<u64>)> = checks
        .iter()
        .map(|check| (check, locator.last_write_pc(&check.label, check.rd)))
        .collect();

    let not_found = resolved.iter().filter(|(_, pc)| pc.is_none()).map(|(check, _)| {
        VerifyError::LabelNotFound {
            label: check.label.clone(),
        }
    });

    let missing = resolved.iter().filter_map(|&(check, pc)| {
        let pc = pc?;
        let present = observed
            .iter()
            .any(|w| w.pc == pc && w.rd == check.rd && w.val == check.val);
        (!present).then(|| VerifyError::MissingRegisterWrite {
            label: check.label.clone(),
            pc,
            rd: check.rd,
            val: check.val,
        })
    });

    not_found.chain(missing).collect()
}
