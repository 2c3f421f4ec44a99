//! Runtime error types

use crate::state::HaltReason;
use isakit_disassembler::DisassemblerError;
use isakit_spec::IsaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("ISA error: {0}")]
    Isa(#[from] IsaError),

    #[error("Decode error: {0}")]
    Decode(#[from] DisassemblerError),

    #[error("Image holds {image}-bit instructions, instruction set uses {expected}-bit")]
    WidthMismatch { image: u32, expected: u32 },

    #[error("Halted: {reason}")]
    Halted { reason: HaltReason },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halted_display() {
        let err = RuntimeError::Halted {
            reason: HaltReason::TerminatingInstruction,
        };
        assert_eq!(err.to_string(), "Halted: terminating instruction");

        let err = RuntimeError::Halted {
            reason: HaltReason::StepLimit,
        };
        assert_eq!(err.to_string(), "Halted: step limit reached");
    }

    #[test]
    fn test_width_mismatch_display() {
        let err = RuntimeError::WidthMismatch {
            image: 32,
            expected: 16,
        };
        assert_eq!(
            err.to_string(),
            "Image holds 32-bit instructions, instruction set uses 16-bit"
        );
    }

    #[test]
    fn test_isa_error_conversion() {
        let err: RuntimeError = IsaError::NotExecutable("mimm".to_string()).into();
        assert!(matches!(err, RuntimeError::Isa(_)));
        assert_eq!(
            err.to_string(),
            "ISA error: mimm is a mnemonic and cannot be executed"
        );
    }

    #[test]
    fn test_decode_error_conversion() {
        let err: RuntimeError = DisassemblerError::NoMatchingSpec(0x7301).into();
        assert_eq!(
            err.to_string(),
            "Decode error: No operation matches word 0x7301"
        );
    }
}
