//! Cross-module interaction tests
//!
//! Tests the integration between assembler, disassembler, and runtime.

use isakit_assembler::assemble;
use isakit_disassembler::{decode_program, disassemble};
use isakit_runtime::{HaltReason, StepRecord, VMConfig, VM};
use isakit_spec::{isa3220, InstructionSet, Program, ProgramImage};
use std::sync::Arc;

const COUNTDOWN: &str = r#"
    mimm R3, 5
loop:
    add R1, R3
    subi R3, 1
    mov jump, R3
    bnez loop
    beqz -2
"#;

fn steps(isa: &InstructionSet, program: Program) -> Vec<StepRecord> {
    let config = VMConfig {
        trace: true,
        ..VMConfig::default()
    };
    VM::new(isa, program, config).run().unwrap().trace
}

/// Instruction text of every line of a disassembly listing
fn listing_texts(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter(|line| line.starts_with("0x"))
        .filter_map(|line| line.splitn(3, "  ").nth(2))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Assembler -> Disassembler -> Runtime Tests
// ============================================================================

#[test]
fn test_decoded_program_runs_like_assembled_program() {
    let isa = isa3220().unwrap();
    let assembly = assemble(&isa, COUNTDOWN).unwrap();
    let words = assembly.program.words().unwrap();
    let decoded = decode_program(&isa, &words, assembly.program.start()).unwrap();

    let direct = steps(&isa, assembly.program);
    let from_words = steps(&isa, decoded);
    assert_eq!(direct, from_words);
    assert_eq!(direct.last().unwrap().after[1], 15);
}

#[test]
fn test_listing_reassembles_to_same_words() {
    let isa = isa3220().unwrap();
    let assembly = assemble(&isa, COUNTDOWN).unwrap();
    let words = assembly.program.words().unwrap();
    let listing = disassemble(&isa, &words, assembly.program.start()).unwrap();

    let source = listing_texts(&listing).join("\n");
    let reassembled = assemble(&isa, &source).unwrap();
    assert_eq!(reassembled.program.words().unwrap(), words);
}

#[test]
fn test_image_round_trip() {
    let isa = isa3220().unwrap();
    let source = r#"
    .data 0x300
        0x0000002A
    .text
        mimm R2, 0x300
        ld.d R1, R2
        beqz -2
    "#;
    let assembly = assemble(&isa, source).unwrap();
    let image = assembly
        .program
        .to_image(isa.config().instruction_width, assembly.data.clone())
        .unwrap();
    let restored = ProgramImage::from_bytes(&image.to_bytes().unwrap()).unwrap();
    assert_eq!(restored, image);

    let result = VM::from_image(&isa, &restored, VMConfig::default())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(result.halt_reason, HaltReason::TerminatingInstruction);
    assert_eq!(result.registers[1], 42);
}

#[test]
fn test_corrupt_image_rejected() {
    let isa = isa3220().unwrap();
    let assembly = assemble(&isa, "beqz -2").unwrap();
    let mut image = assembly
        .program
        .to_image(isa.config().instruction_width, assembly.data)
        .unwrap();
    image.magic ^= 1;

    let bytes = image.to_bytes().unwrap();
    assert!(ProgramImage::from_bytes(&bytes).is_err());
    assert!(ProgramImage::from_bytes(&bytes[..3]).is_err());
}

// ============================================================================
// Shared instruction set
// ============================================================================

#[test]
fn test_instruction_set_shared_across_threads() {
    let isa = Arc::new(isa3220().unwrap());

    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let isa = Arc::clone(&isa);
            std::thread::spawn(move || {
                let source = format!("mimm R1, {n}\nmul R1, R1\nbeqz -2");
                let assembly = assemble(&isa, &source).unwrap();
                VM::new(&isa, assembly.program, VMConfig::default())
                    .run()
                    .unwrap()
                    .registers[1]
            })
        })
        .collect();

    let squares: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(squares, vec![1, 4, 9, 16]);
}
