//! Assembler errors

use isakit_spec::IsaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Undefined label at line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("Duplicate label at line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("Label at line {line} spells a register: {label}")]
    RegisterLabel { line: usize, label: String },

    #[error("Invalid directive at line {line}: {directive}")]
    InvalidDirective { line: usize, directive: String },

    #[error("Invalid data word at line {line}: {text}")]
    InvalidData { line: usize, text: String },

    #[error("Line {line} expanded to {first} instructions, then to {second} once labels were resolved")]
    LayoutChanged {
        line: usize,
        first: usize,
        second: usize,
    },

    #[error("Line {line}: '{text}': {source}")]
    Instruction {
        line: usize,
        text: String,
        #[source]
        source: IsaError,
    },

    #[error(transparent)]
    Isa(#[from] IsaError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AssemblerError {
    /// Source line the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            AssemblerError::SyntaxError { line, .. }
            | AssemblerError::UndefinedLabel { line, .. }
            | AssemblerError::DuplicateLabel { line, .. }
            | AssemblerError::RegisterLabel { line, .. }
            | AssemblerError::InvalidDirective { line, .. }
            | AssemblerError::InvalidData { line, .. }
            | AssemblerError::LayoutChanged { line, .. }
            | AssemblerError::Instruction { line, .. } => Some(*line),
            AssemblerError::Isa(_) | AssemblerError::IoError(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
