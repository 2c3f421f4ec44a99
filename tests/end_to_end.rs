//! End-to-end tests for the isakit toolchain
//!
//! Each test assembles a source program for isa3220, simulates it and checks
//! the final machine state, then disassembles the program where useful.

use isakit_assembler::assemble;
use isakit_disassembler::disassemble;
use isakit_runtime::{ExecutionResult, HaltReason, VMConfig, VM};
use isakit_spec::isa3220;

fn run_source(source: &str) -> ExecutionResult {
    let isa = isa3220().unwrap();
    let assembly = assemble(&isa, source).expect("Assembly failed");
    let mut vm = VM::new(&isa, assembly.program, VMConfig::default());
    vm.load_data(&assembly.data).unwrap();
    vm.run().expect("Execution failed")
}

// ============================================================================
// Assemble -> Execute Tests
// ============================================================================

#[test]
fn test_array_sum() {
    let source = r#"
    .data 0x100
        1 2 3 4
    .text
        mimm R2, 0x100      # pointer
        mimm R3, 4          # remaining words
    loop:
        ld.d R4, R2
        add R1, R4
        addi R2, 4
        subi R3, 1
        mov jump, R3
        bnez loop
        beqz -2
    "#;

    let result = run_source(source);
    assert_eq!(result.halt_reason, HaltReason::TerminatingInstruction);
    assert_eq!(result.registers[1], 10);
    assert_eq!(result.registers[2], 0x110);
    assert_eq!(result.registers[3], 0);
    assert_eq!(result.steps, 8 + 4 * 7 + 1);
    assert_eq!(result.final_pc, 0x40020);
}

#[test]
fn test_shifts_and_sign_extension() {
    let source = r#"
        mimm R1, 0xF0
        sxb0 R2, R1
        mov R3, R2
        shrai R3, 2
        mov R4, R2
        shrli R4, 15
        neg R5, R2
        beqz -2
    "#;

    let result = run_source(source);
    assert_eq!(result.steps, 11);
    assert_eq!(result.registers[1], 0xF0);
    assert_eq!(result.registers[2], -16);
    assert_eq!(result.registers[3], -4);
    assert_eq!(result.registers[4], 0x1FFFF);
    assert_eq!(result.registers[5], 16);
}

#[test]
fn test_arithmetic_wraps_to_data_width() {
    let source = r#"
        mimm R1, 0x7FFFFFFF
        addi R1, 1
        mimm R2, 0x10000
        mul R2, R2
        beqz -2
    "#;

    let result = run_source(source);
    assert_eq!(result.registers[1], i32::MIN as i64);
    assert_eq!(result.registers[2], 0);
}

#[test]
fn test_writes_to_zero_register_are_dropped() {
    let source = r#"
        mimm zero, 0x1234
        addi R0, 5
        mov R1, zero
        beqz -2
    "#;

    let result = run_source(source);
    assert_eq!(result.registers[0], 0);
    assert_eq!(result.registers[1], 0);
}

#[test]
fn test_stack_spill_and_reload() {
    let source = r#"
        mimm stack, 0x1000
        mimm R1, 0x12345678
        sts.d R1, 4
        sts.w R1, -2
        lds.d R2, 4
        lds.w R3, -2
        lds.b R4, 6
        beqz -2
    "#;

    let result = run_source(source);
    assert_eq!(result.registers[2], 0x12345678);
    assert_eq!(result.registers[3], 0x5678);
    assert_eq!(result.registers[4], 0x34);
}

#[test]
fn test_program_without_terminating_word() {
    let result = run_source("addi R1, 3\naddi R1, 3");
    assert_eq!(result.halt_reason, HaltReason::ProgramExhausted);
    assert_eq!(result.registers[1], 6);
    assert_eq!(result.final_pc, 0x40004);
}

// ============================================================================
// Assemble -> Disassemble Tests
// ============================================================================

#[test]
fn test_listing_shows_expanded_mnemonics() {
    let isa = isa3220().unwrap();
    let source = r#"
        mimm R1, 0xCAFEBABE
        br end
    end:
        beqz -2
    "#;
    let assembly = assemble(&isa, source).unwrap();
    let words = assembly.program.words().unwrap();
    assert_eq!(
        words,
        vec![0xC1BE, 0xD1BA, 0xE1FE, 0xF1CA, 0x0E0B, 0x4000, 0x4FFE]
    );

    let listing = disassemble(&isa, &words, assembly.program.start()).unwrap();
    assert!(listing.contains("; Code size: 14 bytes (7 instructions)"));
    assert!(listing.contains("0x00040000:  0xC1BE  mib0 R1, 190"));
    assert!(listing.contains("0x00040008:  0x0E0B  mov R14, R0"));
    assert!(listing.contains("0x0004000A:  0x4000  beqz 0"));
}
