//! # Error Types for ISA descriptions

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IsaError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    // Text matching errors
    #[error("Ambiguous instruction '{text}': matches {}", .candidates.join(", "))]
    AmbiguousInstruction {
        text: String,
        candidates: Vec<String>,
    },

    #[error("Unknown instruction: '{0}'")]
    UnknownInstruction(String),

    #[error("Unbound variable '{variable}' in {spec}")]
    UnboundVariable { spec: String, variable: String },

    #[error("Register index {index} out of range (register count: {count})")]
    RegisterOutOfRange { index: i64, count: usize },

    #[error("Unknown register: '{0}'")]
    UnknownRegister(String),

    #[error("Invalid numeric literal: '{0}'")]
    InvalidLiteral(String),

    // Spec lookup and expansion errors
    #[error("Unknown operation: {0}")]
    UnknownSpec(String),

    #[error("Cyclic mnemonic expansion: {}", .chain.join(" -> "))]
    CyclicExpansion { chain: Vec<String> },

    #[error("Mnemonic expansion of {spec} exceeded depth {limit}")]
    ExpansionTooDeep { spec: String, limit: usize },

    #[error("{0} is a mnemonic and has no binary encoding")]
    NotEncodable(String),

    #[error("{0} is a mnemonic and cannot be executed")]
    NotExecutable(String),

    // Memory errors
    #[error("Memory range {from:#x}..{to:#x} spans more than 8 bytes")]
    RangeTooWide { from: u64, to: u64 },

    // Image errors
    #[error("Invalid image magic: expected {expected:#010x}, found {found:#010x}")]
    InvalidMagic { expected: u32, found: u32 },

    #[error("Program image error: {0}")]
    Image(String),
}

impl IsaError {
    pub(crate) fn unbound(spec: &str, variable: &str) -> Self {
        IsaError::UnboundVariable {
            spec: spec.to_string(),
            variable: variable.to_string(),
        }
    }

    /// Errors raised while building an instruction set
    pub fn is_config(&self) -> bool {
        matches!(self, IsaError::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, IsaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IsaError::AmbiguousInstruction {
            text: "jump 4".into(),
            candidates: vec!["jump".into(), "call".into()],
        };
        assert_eq!(err.to_string(), "Ambiguous instruction 'jump 4': matches jump, call");

        let err = IsaError::CyclicExpansion {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Cyclic mnemonic expansion: a -> b -> a");

        let err = IsaError::RegisterOutOfRange { index: 16, count: 16 };
        assert_eq!(
            err.to_string(),
            "Register index 16 out of range (register count: 16)"
        );
    }

    #[test]
    fn test_config_conversion() {
        let err: IsaError = ConfigError::MissingWidth("reg".into()).into();
        assert!(err.is_config());
        assert!(!IsaError::UnknownInstruction("x".into()).is_config());
    }
}
