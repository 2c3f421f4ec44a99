//! Disassembler tests against assembled programs

use isakit_assembler::assemble;
use isakit_disassembler::{decode, decode_program, disassemble, format};
use isakit_spec::isa3220;
use proptest::prelude::*;

#[test]
fn test_listing_of_assembled_program() {
    let isa = isa3220().unwrap();
    let source = r#"
        mov jump, zero
        bnez end
        ld.d R1, R2
        end:
        beqz -2
    "#;
    let assembly = assemble(&isa, source).unwrap();
    let words = assembly.program.words().unwrap();
    let listing = disassemble(&isa, &words, assembly.program.start()).unwrap();

    let body: Vec<&str> = listing
        .lines()
        .filter(|line| line.starts_with("0x"))
        .collect();
    assert_eq!(body.len(), 5);
    assert!(body[0].ends_with("mov R14, R0"));
    assert!(body[1].ends_with("cmpz R14, R14"));
    assert!(body[2].ends_with("beqz 2"));
    assert!(body[3].ends_with("ld.d R1, R2"));
}

#[test]
fn test_decode_program_matches_assembly() {
    let isa = isa3220().unwrap();
    let assembly = assemble(&isa, "call 0x40\nst.w R3, R4\nlds.w R2, 5").unwrap();
    let words = assembly.program.words().unwrap();
    let decoded = decode_program(&isa, &words, assembly.program.start()).unwrap();

    for (a, b) in assembly.program.instructions().iter().zip(decoded.instructions()) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.pc(), b.pc());
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    }
}

proptest! {
    #[test]
    fn prop_decoded_words_reassemble(word in 0u64..=0xFFFF) {
        let isa = isa3220().unwrap();
        if let Ok(instr) = decode(&isa, word) {
            let text = format(&instr).unwrap();
            let assembly = assemble(&isa, &text).unwrap();
            prop_assert_eq!(assembly.program.words().unwrap(), vec![word]);
        }
    }
}
