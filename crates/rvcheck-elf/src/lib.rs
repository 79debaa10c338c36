//! Readers for the artifacts produced alongside a RISC-V test ELF.
//!
//! - [`SymbolTable`]: `nm` output, name to address.
//! - [`Disassembly`]: `objdump -d` listing, split into label blocks.

pub mod disasm;
pub mod symbols;

pub use disasm::{Block, Disassembly, Instruction};
pub use symbols::SymbolTable;

use std::path::PathBuf;

use thiserror::Error;

/// Artifact loading errors.
#[derive(Error, Debug)]
pub enum ElfError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ElfError>;
