//! Integration tests for the isakit assembler
//!
//! Tests the complete assembly workflow including:
//! - Instruction parsing and mnemonic expansion
//! - Label resolution
//! - Data sections

use isakit_assembler::{assemble, AssemblerError, InstructionParser};
use isakit_spec::{isa3220, ByteOrder, InstructionSet, MemoryStore};

fn isa() -> InstructionSet {
    isa3220().unwrap()
}

fn words(source: &str) -> Vec<u64> {
    assemble(&isa(), source).unwrap().program.words().unwrap()
}

// ============================================================================
// Basic Assembly Tests
// ============================================================================

#[test]
fn test_assemble_empty_program() {
    let assembly = assemble(&isa(), "").unwrap();
    assert!(assembly.program.is_empty());
    assert!(assembly.data.is_empty());
}

#[test]
fn test_assemble_comments_only() {
    let source = r#"
        # This is a comment
        # Another comment
    "#;
    assert!(assemble(&isa(), source).unwrap().program.is_empty());
}

#[test]
fn test_assemble_multiple_instructions() {
    let source = r#"
        add R1, R2
        sub $3, $4
        xori r5, 3
    "#;
    assert_eq!(words(source), vec![0x0120, 0x0341, 0x153C]);
}

#[test]
fn test_program_starts_at_instruction_start() {
    let assembly = assemble(&isa(), "add R1, R2\nadd R1, R2\n").unwrap();
    let program = &assembly.program;
    assert_eq!(program.start(), 0x40000);
    assert_eq!(program.instructions()[1].pc(), Some(0x40002));
    assert_eq!(program.end(), 0x40004);
}

#[test]
fn test_register_aliases() {
    assert_eq!(words("mov jump, zero\nmov R1, stack"), vec![0x0E0B, 0x01FB]);
}

// ============================================================================
// Mnemonic Tests
// ============================================================================

#[test]
fn test_mimm_expands_in_place() {
    let source = r#"
        mimm R1, 0xCAFEBABE
        beqz -2
    "#;
    assert_eq!(words(source), vec![0xC1BE, 0xD1BA, 0xE1FE, 0xF1CA, 0x4FFE]);
}

#[test]
fn test_instruction_parser_matches_assembler() {
    let isa = isa();
    let mut parser = InstructionParser::new(&isa);
    let mut pc = isa.config().instruction_start;
    for line in ["bnez 6", "add R1, R2", "beqz -2"] {
        pc = parser.add(line, pc).unwrap();
    }
    let direct = parser.into_program().words().unwrap();
    assert_eq!(direct, words("bnez 6\nadd R1, R2\nbeqz -2"));
}

// ============================================================================
// Label Tests
// ============================================================================

#[test]
fn test_backward_label() {
    let source = r#"
        loop:
        subi R1, 1
        mov jump, R1
        bnez loop
    "#;
    let assembly = assemble(&isa(), source).unwrap();
    assert_eq!(assembly.labels["loop"], 0x40000);
    let instrs = assembly.program.instructions();
    // bnez at 0x40004 expands to cmpz (0x40004) and beqz (0x40006)
    assert_eq!(instrs[3].name(), "beqz");
    assert_eq!(instrs[3].operand("imm"), Some(-8));
}

#[test]
fn test_label_example() {
    // bnez at 0x40000 targeting 0x40008
    let source = r#"
        bnez target
        add R1, R2
        add R1, R2
        target:
        beqz -2
    "#;
    let assembly = assemble(&isa(), source).unwrap();
    assert_eq!(assembly.labels["target"], 0x40008);
    let instrs = assembly.program.instructions();
    assert_eq!(instrs[0].name(), "cmpz");
    assert_eq!(instrs[1].operand("imm"), Some(4));
}

#[test]
fn test_labels_after_mnemonics_account_for_expansion() {
    let source = r#"
        mimm R1, 0
        here:
        beqz -2
    "#;
    let assembly = assemble(&isa(), source).unwrap();
    assert_eq!(assembly.labels["here"], 0x40008);
}

#[test]
fn test_call_label() {
    let source = r#"
        call func
        beqz -2
        func:
        return jump
    "#;
    let assembly = assemble(&isa(), source).unwrap();
    assert_eq!(assembly.labels["func"], 0x4000C);
    let imms: Vec<_> = assembly.program.instructions()[..4]
        .iter()
        .map(|i| i.operand("imm").unwrap())
        .collect();
    assert_eq!(imms, vec![0x0C, 0x00, 0x04, 0x00]);
}

// ============================================================================
// Data Section Tests
// ============================================================================

#[test]
fn test_data_section() {
    let source = r#"
        .data 2000
        11223344 0xAABBCCDD
        .text
        add R1, R2
    "#;
    let assembly = assemble(&isa(), source).unwrap();
    assert_eq!(assembly.program.len(), 1);

    let mut mem = MemoryStore::new();
    assembly
        .data
        .load_into(&mut mem, ByteOrder::LittleEndian)
        .unwrap();
    assert_eq!(mem.read_byte(0x2000), 0x44);
    assert_eq!(mem.read_byte(0x2007), 0xAA);
}

#[test]
fn test_data_section_does_not_shift_code() {
    let source = ".data 0\n1\n2\n3\n.text\nbeqz -2\n";
    let assembly = assemble(&isa(), source).unwrap();
    assert_eq!(assembly.program.instructions()[0].pc(), Some(0x40000));
}

#[test]
fn test_errors_carry_line_numbers() {
    let err = assemble(&isa(), "add R1, R2\n\nbogus R1\n").unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert!(matches!(err, AssemblerError::Instruction { line: 3, .. }));
}
