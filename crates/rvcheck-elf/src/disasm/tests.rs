use std::io::Write;

use rvcheck_isa::{REG_RA, REG_T0, REG_T1, REG_T2, REG_T3};

use super::*;

const LISTING: &str = "
skiptrap.elf:     file format elf32-littleriscv


Disassembly of section .text:

80000000 <_start>:
80000000:\t00000297          \tauipc\tt0,0x0
80000004:\t01028293          \taddi\tt0,t0,16

80000010 <L_LI_T0>:
80000010:\t123452b7          \tlui\tt0,0x12345
80000014:\t67828293          \taddi\tt0,t0,1656 # 12345678 <tohost+0x12344678>

80000018 <L_LI_T1>:
80000018:\tabcdf337          \tlui\tt1,0xabcdf
8000001c:\tf0130313          \taddi\tt1,t1,-255

80000020 <L_LI_T2>:
80000020:\t112233b7          \tlui\tt2,0x11223
80000024:\t34438393          \taddi\tt2,t2,836
80000028:\t00732023          \tsw\tt2,0(t1)

8000002c <L_LI_T3>:
8000002c:\t4e01                \tli\tt3,0
8000002e:\t01c02023          \tsw\tt3,0(zero) # 0 <zero_sym>
80000032:\t00028663          \tbeqz\tt0,8000003e <L_DONE>

80000036 <L_LI_T0_1>:
80000036:\t4285                \tli\tt0,1
80000038:\t00502023          \tsw\tt0,0(zero)
8000003c:\t0001                \tnop

8000003e <L_DONE>:
8000003e:\t0000006f          \tj\t8000003e <L_DONE>
";

#[test]
fn test_parse_instruction_line() {
    let insn = Instruction::parse("80000014:\t67828293          \taddi\tt0,t0,1656").unwrap();
    assert_eq!(insn.pc, 0x8000_0014);
    assert_eq!(insn.mnemonic, "addi");
    assert_eq!(insn.operands, vec!["t0", "t0", "1656"]);
}

#[test]
fn test_parse_instruction_space_separated() {
    let insn = Instruction::parse("  44: 00112623 sw ra, 12(sp)").unwrap();
    assert_eq!(insn.pc, 0x44);
    assert_eq!(insn.mnemonic, "sw");
    assert_eq!(insn.operands, vec!["ra", "12(sp)"]);
}

#[test]
fn test_parse_instruction_byte_groups() {
    let insn = Instruction::parse("  10:\t93 02 10 00 \taddi\tt0,zero,1").unwrap();
    assert_eq!(insn.pc, 0x10);
    assert_eq!(insn.mnemonic, "addi");
}

#[test]
fn test_parse_instruction_without_operands() {
    let insn = Instruction::parse("8000003c:\t0001                \tnop").unwrap();
    assert_eq!(insn.mnemonic, "nop");
    assert!(insn.operands.is_empty());
}

#[test]
fn test_parse_non_instruction_lines() {
    assert!(Instruction::parse("80000010 <L_LI_T0>:").is_none());
    assert!(Instruction::parse("Disassembly of section .text:").is_none());
    assert!(Instruction::parse("").is_none());
}

#[test]
fn test_blocks_split_on_labels() {
    let listing = Disassembly::parse(LISTING);
    let labels: Vec<&str> = listing.blocks().iter().map(|b| b.label.as_str()).collect();
    assert_eq!(
        labels,
        ["_start", "L_LI_T0", "L_LI_T1", "L_LI_T2", "L_LI_T3", "L_LI_T0_1", "L_DONE"]
    );
    let block = listing.block("L_LI_T2").unwrap();
    assert_eq!(block.addr, 0x8000_0020);
    assert_eq!(block.instructions.len(), 3);
}

#[test]
fn test_last_write_is_second_of_pair() {
    let listing = Disassembly::parse(LISTING);
    assert_eq!(listing.find_last_write_pc("L_LI_T0", REG_T0), Some(0x8000_0014));
    assert_eq!(listing.find_last_write_pc("L_LI_T1", REG_T1), Some(0x8000_001c));
}

#[test]
fn test_store_does_not_count_as_write() {
    let listing = Disassembly::parse(LISTING);
    // sw t2,0(t1) follows the addi; the addi is still the last write.
    assert_eq!(listing.find_last_write_pc("L_LI_T2", REG_T2), Some(0x8000_0024));
}

#[test]
fn test_compressed_and_branch() {
    let listing = Disassembly::parse(LISTING);
    assert_eq!(listing.find_last_write_pc("L_LI_T3", REG_T3), Some(0x8000_002c));
    // beqz t0 names t0 but does not write it.
    assert_eq!(listing.find_last_write_pc("L_LI_T3", REG_T0), None);
    assert_eq!(listing.find_last_write_pc("L_LI_T0_1", REG_T0), Some(0x8000_0036));
}

#[test]
fn test_block_ends_at_next_label() {
    let listing = Disassembly::parse(LISTING);
    // The t1 write lives in L_LI_T1, not in L_LI_T0.
    assert_eq!(listing.find_last_write_pc("L_LI_T0", REG_T1), None);
}

#[test]
fn test_missing_label() {
    let listing = Disassembly::parse(LISTING);
    assert_eq!(listing.find_last_write_pc("L_NOPE", REG_T0), None);
    assert_eq!(listing.find_last_write_pc("L_DONE", REG_RA), None);
}

#[test]
fn test_numeric_register_names() {
    let text = "\
00000040 <blk>:
  40:\t00100293          \taddi\tx5,x0,1
  44:\t00200293          \taddi\tx5,x0,2
  48:\t00502023          \tsw\tx5,0(x0)
";
    let listing = Disassembly::parse(text);
    assert_eq!(listing.find_last_write_pc("blk", REG_T0), Some(0x44));
}

#[test]
fn test_duplicate_label_uses_first_block() {
    let text = "\
00000010 <dup>:
  10:\t00100293          \tli\tt0,1
00000020 <dup>:
  20:\t00200293          \tli\tt0,2
";
    let listing = Disassembly::parse(text);
    assert_eq!(listing.find_last_write_pc("dup", REG_T0), Some(0x10));
}

#[test]
fn test_load_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(LISTING.as_bytes()).unwrap();
    let listing = Disassembly::load(file.path()).unwrap();
    assert!(listing.block("_start").is_some());
    assert!(Disassembly::load(Path::new("/nonexistent/skiptrap.objdump")).is_err());
}
