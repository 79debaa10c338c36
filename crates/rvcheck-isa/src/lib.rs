//! RISC-V register naming and mnemonic classification.
//!
//! Used when reading textual disassembly: operands are resolved to register
//! indices through [`parse_reg`], and mnemonics are bucketed into [`OpKind`]
//! so that "does this instruction produce a value in its first operand" is a
//! single auditable table rather than string checks spread across callers.

mod mnemonic;
mod types;

pub use mnemonic::*;
pub use types::*;
