//! `objdump -d` listing reader.
//!
//! The listing is split into label blocks: a header line `<addr> <label>:`
//! followed by instruction lines `<addr>: <raw bytes> <mnemonic> <operands>`
//! up to the next header. Lines that are neither are ignored.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use rvcheck_isa::writes_reg;
use tracing::{debug, trace};

use crate::{ElfError, Result};

/// A single disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub pc: u64,
    pub mnemonic: String,
    pub operands: Vec<String>,
}

impl Instruction {
    /// Parse an instruction line.
    pub fn parse(line: &str) -> Option<Self> {
        let pattern = INSN_PATTERN.get_or_init(|| {
            Regex::new(
                r"^\s*([0-9a-fA-F]+):\s+[0-9a-fA-F]+(?: [0-9a-fA-F]{2})*\s+([A-Za-z][A-Za-z0-9.]*)(?:\s+(.*))?$",
            )
            .unwrap()
        });
        let caps = pattern.captures(line.trim_end())?;
        let pc = u64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?;
        let mnemonic = caps.get(2)?.as_str().to_string();
        let operands = caps
            .get(3)
            .map(|ops| {
                ops.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|op| !op.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            pc,
            mnemonic,
            operands,
        })
    }

    /// Whether this instruction writes integer register `reg`.
    #[must_use]
    pub fn writes(&self, reg: u8) -> bool {
        let operands: Vec<&str> = self.operands.iter().map(String::as_str).collect();
        writes_reg(&self.mnemonic, &operands, reg)
    }
}

/// Instructions following one label, up to the next label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub label: String,
    pub addr: u64,
    pub instructions: Vec<Instruction>,
}

impl Block {
    /// PC of the last instruction in the block that writes `reg`.
    #[must_use]
    pub fn last_write_pc(&self, reg: u8) -> Option<u64> {
        self.instructions
            .iter()
            .rev()
            .find(|insn| insn.writes(reg))
            .map(|insn| insn.pc)
    }
}

/// A parsed disassembly listing.
#[derive(Debug, Default, Clone)]
pub struct Disassembly {
    blocks: Vec<Block>,
    // First block per label.
    by_label: FxHashMap<String, usize>,
}

impl Disassembly {
    /// Parse a listing.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut listing = Self::default();
        for line in text.lines() {
            if let Some((addr, label)) = parse_label(line) {
                let idx = listing.blocks.len();
                listing.by_label.entry(label.clone()).or_insert(idx);
                listing.blocks.push(Block {
                    label,
                    addr,
                    instructions: Vec::new(),
                });
                continue;
            }
            // Instructions before the first label belong to no block.
            let Some(block) = listing.blocks.last_mut() else {
                continue;
            };
            if let Some(insn) = Instruction::parse(line) {
                block.instructions.push(insn);
            }
        }
        listing
    }

    /// Load and parse a listing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ElfError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let listing = Self::parse(&text);
        debug!(path = %path.display(), blocks = listing.blocks.len(), "loaded disassembly");
        Ok(listing)
    }

    /// Get the block introduced by `label`.
    #[must_use]
    pub fn block(&self, label: &str) -> Option<&Block> {
        self.by_label.get(label).map(|&idx| &self.blocks[idx])
    }

    /// All blocks in listing order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Find the PC of the last instruction in `label`'s block that writes `reg`.
    ///
    /// Returns `None` if the label is absent or nothing in its block writes
    /// the register.
    #[must_use]
    pub fn find_last_write_pc(&self, label: &str, reg: u8) -> Option<u64> {
        let block = self.block(label)?;
        let pc = block.last_write_pc(reg);
        trace!(label, reg, pc = ?pc, "scanned label block");
        pc
    }
}

fn parse_label(line: &str) -> Option<(u64, String)> {
    let pattern = LABEL_PATTERN
        .get_or_init(|| Regex::new(r"^\s*([0-9a-fA-F]+)\s+<([^>]+)>:").unwrap());
    let caps = pattern.captures(line)?;
    let addr = u64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?;
    Some((addr, caps.get(2)?.as_str().to_string()))
}

static LABEL_PATTERN: OnceLock<Regex> = OnceLock::new();
static INSN_PATTERN: OnceLock<Regex> = OnceLock::new();

#[cfg(test)]
mod tests;
