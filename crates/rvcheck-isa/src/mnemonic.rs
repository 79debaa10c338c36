//! Mnemonic classification for disassembly listings.
//!
//! Every mnemonic the listing scanner cares about is placed in exactly one
//! [`OpKind`]. Only the register-producing kinds count as a write to the
//! first operand. Stores and branches name source registers there, and loads
//! are not in the write set.
//!
//! Compressed mnemonics (`c.*`) are classified by their base operation, with a
//! handful of compressed-only forms listed explicitly.

/// Operation category of a disassembled instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Integer add/sub/mul/div and their word forms.
    Arithmetic,
    /// Bitwise and/or/xor.
    Logical,
    /// Shifts.
    Shift,
    /// Set-less-than and the `seqz`/`snez` family.
    Compare,
    /// `lui` and `auipc`.
    UpperImmediate,
    /// Assembler expansions that materialize a value: `li`, `mv`, `not`, `neg`.
    LoadImmediate,
    /// `jal`/`jalr` with an explicit link register.
    JumpAndLink,
    /// CSR read-modify-write forms and `csrr`.
    CsrReadModifyWrite,
    /// Memory loads.
    Load,
    /// Memory stores.
    Store,
    /// Conditional branches.
    Branch,
    /// Unconditional jumps that do not link (`j`, `jr`, `ret`).
    Jump,
    /// Fences, environment calls, `nop`, CSR writes without a destination.
    System,
    /// Anything not in the tables.
    Unknown,
}

impl OpKind {
    /// Classify a listing mnemonic.
    #[must_use]
    pub fn classify(mnemonic: &str) -> Self {
        let mnemonic = mnemonic.trim().to_ascii_lowercase();
        if let Some(base) = mnemonic.strip_prefix("c.") {
            return Self::classify_compressed(base);
        }
        Self::classify_base(&mnemonic)
    }

    fn classify_compressed(base: &str) -> Self {
        match base {
            "beqz" | "bnez" => Self::Branch,
            "swsp" | "sdsp" | "fswsp" | "fsdsp" => Self::Store,
            "lwsp" | "ldsp" | "flwsp" | "fldsp" => Self::Load,
            "addi4spn" | "addi16sp" => Self::Arithmetic,
            // c.jr/c.jalr name rs1, the link register is implicit.
            "j" | "jr" | "jalr" => Self::Jump,
            "jal" => Self::JumpAndLink,
            "nop" | "ebreak" => Self::System,
            other => Self::classify_base(other),
        }
    }

    fn classify_base(mnemonic: &str) -> Self {
        match mnemonic {
            "add" | "addi" | "sub" | "addw" | "addiw" | "subw" | "mul" | "mulh" | "mulhsu"
            | "mulhu" | "mulw" | "div" | "divu" | "rem" | "remu" | "divw" | "divuw" | "remw"
            | "remuw" => Self::Arithmetic,
            "and" | "andi" | "or" | "ori" | "xor" | "xori" => Self::Logical,
            "sll" | "slli" | "srl" | "srli" | "sra" | "srai" | "sllw" | "slliw" | "srlw"
            | "srliw" | "sraw" | "sraiw" => Self::Shift,
            "slt" | "slti" | "sltu" | "sltiu" | "seqz" | "snez" | "sltz" | "sgtz" => {
                Self::Compare
            }
            "lui" | "auipc" => Self::UpperImmediate,
            "li" | "mv" | "not" | "neg" | "negw" | "sext.w" => Self::LoadImmediate,
            "jal" | "jalr" => Self::JumpAndLink,
            "csrrw" | "csrrs" | "csrrc" | "csrrwi" | "csrrsi" | "csrrci" | "csrr" => {
                Self::CsrReadModifyWrite
            }
            "lb" | "lh" | "lw" | "ld" | "lbu" | "lhu" | "lwu" | "lr.w" | "lr.d" => Self::Load,
            "sb" | "sh" | "sw" | "sd" | "sc.w" | "sc.d" => Self::Store,
            "beq" | "bne" | "blt" | "bge" | "bltu" | "bgeu" | "beqz" | "bnez" | "blez" | "bgez"
            | "bltz" | "bgtz" | "bgt" | "ble" | "bgtu" | "bleu" => Self::Branch,
            "j" | "jr" | "ret" => Self::Jump,
            "fence" | "fence.i" | "ecall" | "ebreak" | "mret" | "sret" | "wfi" | "nop" | "csrw"
            | "csrs" | "csrc" | "csrwi" | "csrsi" | "csrci" | "unimp" => Self::System,
            _ => Self::Unknown,
        }
    }

    /// Whether instructions of this kind write their first operand.
    #[must_use]
    pub const fn writes_first_operand(self) -> bool {
        matches!(
            self,
            Self::Arithmetic
                | Self::Logical
                | Self::Shift
                | Self::Compare
                | Self::UpperImmediate
                | Self::LoadImmediate
                | Self::JumpAndLink
                | Self::CsrReadModifyWrite
        )
    }
}

/// Check whether an instruction with `mnemonic` and `operands` writes `reg`.
///
/// The first operand must name the register. `jal`/`jalr` printed with a
/// single operand (the target) link through `ra` implicitly and are only
/// counted when asking about `ra`.
#[must_use]
pub fn writes_reg(mnemonic: &str, operands: &[&str], reg: u8) -> bool {
    let kind = OpKind::classify(mnemonic);
    if !kind.writes_first_operand() {
        return false;
    }
    match operands {
        [] => false,
        [_target] if kind == OpKind::JumpAndLink => reg == crate::REG_RA,
        [first, ..] => crate::operand_is_reg(first, reg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{REG_RA, REG_T0, REG_T1};

    #[test]
    fn test_classify_register_producers() {
        for m in ["addi", "add", "sub", "mulhu", "addiw"] {
            assert_eq!(OpKind::classify(m), OpKind::Arithmetic, "{m}");
        }
        assert_eq!(OpKind::classify("ori"), OpKind::Logical);
        assert_eq!(OpKind::classify("srai"), OpKind::Shift);
        assert_eq!(OpKind::classify("sltiu"), OpKind::Compare);
        assert_eq!(OpKind::classify("lui"), OpKind::UpperImmediate);
        assert_eq!(OpKind::classify("li"), OpKind::LoadImmediate);
        assert_eq!(OpKind::classify("jalr"), OpKind::JumpAndLink);
        assert_eq!(OpKind::classify("csrrsi"), OpKind::CsrReadModifyWrite);
    }

    #[test]
    fn test_classify_exclusions() {
        for m in ["sb", "sh", "sw"] {
            assert_eq!(OpKind::classify(m), OpKind::Store, "{m}");
            assert!(!OpKind::classify(m).writes_first_operand());
        }
        for m in ["beq", "bne", "blt", "bge", "bltu", "bgeu", "bnez"] {
            assert_eq!(OpKind::classify(m), OpKind::Branch, "{m}");
            assert!(!OpKind::classify(m).writes_first_operand());
        }
        assert!(!OpKind::classify("lw").writes_first_operand());
        assert!(!OpKind::classify("csrw").writes_first_operand());
        assert_eq!(OpKind::classify("frobnicate"), OpKind::Unknown);
    }

    #[test]
    fn test_classify_compressed() {
        assert_eq!(OpKind::classify("c.li"), OpKind::LoadImmediate);
        assert_eq!(OpKind::classify("c.addi"), OpKind::Arithmetic);
        assert_eq!(OpKind::classify("c.lui"), OpKind::UpperImmediate);
        assert_eq!(OpKind::classify("c.mv"), OpKind::LoadImmediate);
        assert_eq!(OpKind::classify("c.sw"), OpKind::Store);
        assert_eq!(OpKind::classify("c.swsp"), OpKind::Store);
        assert_eq!(OpKind::classify("c.beqz"), OpKind::Branch);
        assert_eq!(OpKind::classify("c.jr"), OpKind::Jump);
        assert_eq!(OpKind::classify("C.ADDI"), OpKind::Arithmetic);
    }

    #[test]
    fn test_writes_reg() {
        assert!(writes_reg("lui", &["t0", "0x12345"], REG_T0));
        assert!(writes_reg("addi", &["x5", "x5", "1656"], REG_T0));
        assert!(!writes_reg("addi", &["t1", "t0", "1"], REG_T0));
        assert!(!writes_reg("sw", &["t0", "0(t1)"], REG_T0));
        assert!(!writes_reg("c.sw", &["t0", "0(a0)"], REG_T0));
        assert!(!writes_reg("bne", &["t0", "t1", "80000010"], REG_T0));
        assert!(!writes_reg("nop", &[], REG_T0));
    }

    #[test]
    fn test_writes_reg_implicit_link() {
        assert!(writes_reg("jal", &["80000100 <func>"], REG_RA));
        assert!(!writes_reg("jal", &["80000100 <func>"], REG_T1));
        assert!(writes_reg("jal", &["t1", "80000100 <func>"], REG_T1));
    }
}
