//! # isakit Disassembler
//!
//! Turn instruction words back into assembly text using the layouts of an
//! instruction set. Mnemonics never appear in the output: only primitives
//! have encodings.
//!
//! ## Example
//!
//! ```rust
//! use isakit_disassembler::{decode, format};
//! use isakit_spec::isa3220;
//!
//! let isa = isa3220().unwrap();
//! let instr = decode(&isa, 0x0120).unwrap();
//! assert_eq!(format(&instr).unwrap(), "add R1, R2");
//! ```

pub mod error;
pub mod decoder;
pub mod formatter;
pub mod disassembler;

pub use error::{DisassemblerError, Result};
pub use disassembler::{decode_program, disassemble};
pub use decoder::{decode, decode_at};
pub use formatter::{format, format_binary, format_hex};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassembler_error_variants() {
        let errors: Vec<DisassemblerError> = vec![
            DisassemblerError::NoMatchingSpec(0xDEAD),
            DisassemblerError::AmbiguousEncoding {
                word: 0x10,
                candidates: vec!["a".to_string(), "b".to_string()],
            },
        ];
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(messages[0], "No operation matches word 0xDEAD");
        assert_eq!(messages[1], "Word 0x10 matches several operations: a, b");
    }

    #[test]
    fn test_isa_error_is_transparent() {
        let err: DisassemblerError = isakit_spec::IsaError::NotEncodable("mimm".to_string()).into();
        assert!(matches!(err, DisassemblerError::Isa(_)));
        assert_eq!(err.to_string(), "mimm is a mnemonic and has no binary encoding");
    }

    #[test]
    fn test_result_type() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(DisassemblerError::NoMatchingSpec(0));
        assert!(err.is_err());
    }
}
