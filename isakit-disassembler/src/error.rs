//! Disassembler errors

use isakit_spec::IsaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisassemblerError {
    #[error("No operation matches word 0x{0:X}")]
    NoMatchingSpec(u64),

    #[error("Word 0x{word:X} matches several operations: {}", .candidates.join(", "))]
    AmbiguousEncoding { word: u64, candidates: Vec<String> },

    #[error(transparent)]
    Isa(#[from] IsaError),
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;
