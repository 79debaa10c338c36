//! Register indices and ABI names.

/// Number of integer registers in RV32I/RV64I.
pub const NUM_REGS_I: usize = 32;

// Register ABI names
pub const REG_ZERO: u8 = 0;
pub const REG_RA: u8 = 1;
pub const REG_SP: u8 = 2;
pub const REG_GP: u8 = 3;
pub const REG_TP: u8 = 4;
pub const REG_T0: u8 = 5;
pub const REG_T1: u8 = 6;
pub const REG_T2: u8 = 7;
pub const REG_S0: u8 = 8;
pub const REG_FP: u8 = 8; // Frame pointer alias for s0
pub const REG_S1: u8 = 9;
pub const REG_A0: u8 = 10;
pub const REG_A1: u8 = 11;
pub const REG_A2: u8 = 12;
pub const REG_A3: u8 = 13;
pub const REG_A4: u8 = 14;
pub const REG_A5: u8 = 15;
pub const REG_A6: u8 = 16;
pub const REG_A7: u8 = 17;
pub const REG_S2: u8 = 18;
pub const REG_S3: u8 = 19;
pub const REG_S4: u8 = 20;
pub const REG_S5: u8 = 21;
pub const REG_S6: u8 = 22;
pub const REG_S7: u8 = 23;
pub const REG_S8: u8 = 24;
pub const REG_S9: u8 = 25;
pub const REG_S10: u8 = 26;
pub const REG_S11: u8 = 27;
pub const REG_T3: u8 = 28;
pub const REG_T4: u8 = 29;
pub const REG_T5: u8 = 30;
pub const REG_T6: u8 = 31;

/// ABI names indexed by register number.
const ABI_NAMES: [&str; NUM_REGS_I] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Get register ABI name.
#[must_use]
pub fn reg_name(reg: u8) -> &'static str {
    ABI_NAMES.get(usize::from(reg)).copied().unwrap_or("??")
}

/// Resolve a register operand to its index.
///
/// Accepts architectural names (`x0`..`x31`), the ABI names from
/// [`reg_name`], and `fp` as an alias for `s0`.
#[must_use]
pub fn parse_reg(name: &str) -> Option<u8> {
    let name = name.trim();
    if let Some(num) = name.strip_prefix('x') {
        // Reject "x05" and friends; objdump never pads.
        if num.len() > 1 && num.starts_with('0') {
            return None;
        }
        return num.parse::<u8>().ok().filter(|&r| usize::from(r) < NUM_REGS_I);
    }
    if name == "fp" {
        return Some(REG_FP);
    }
    ABI_NAMES
        .iter()
        .position(|&abi| abi == name)
        .and_then(|idx| u8::try_from(idx).ok())
}

/// Check whether an operand denotes register `reg`.
#[must_use]
pub fn operand_is_reg(operand: &str, reg: u8) -> bool {
    parse_reg(operand) == Some(reg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_name() {
        assert_eq!(reg_name(REG_ZERO), "zero");
        assert_eq!(reg_name(REG_T0), "t0");
        assert_eq!(reg_name(REG_T3), "t3");
        assert_eq!(reg_name(REG_T6), "t6");
        assert_eq!(reg_name(32), "??");
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_reg("x0"), Some(0));
        assert_eq!(parse_reg("x5"), Some(REG_T0));
        assert_eq!(parse_reg("x31"), Some(31));
        assert_eq!(parse_reg("x32"), None);
        assert_eq!(parse_reg("x05"), None);
        assert_eq!(parse_reg("x"), None);
    }

    #[test]
    fn test_parse_abi_names_round_trip() {
        for reg in 0..32u8 {
            assert_eq!(parse_reg(reg_name(reg)), Some(reg), "{}", reg_name(reg));
        }
        assert_eq!(parse_reg("fp"), Some(REG_S0));
    }

    #[test]
    fn test_parse_rejects_non_registers() {
        assert_eq!(parse_reg("0x1000"), None);
        assert_eq!(parse_reg("4(sp)"), None);
        assert_eq!(parse_reg("mstatus"), None);
        assert_eq!(parse_reg(""), None);
    }

    #[test]
    fn test_operand_is_reg_trims() {
        assert!(operand_is_reg(" t1 ", REG_T1));
        assert!(!operand_is_reg("t1", REG_T2));
    }
}
