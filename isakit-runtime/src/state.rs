//! VM state

use isakit_spec::{Address, InstructionSetConfig, MemoryStore, RegisterFile};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// The executed word matched the terminating pattern
    TerminatingInstruction,
    /// `pc` left the program or is not on an instruction boundary
    ProgramExhausted,
    /// The configured step cap was reached
    StepLimit,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::TerminatingInstruction => write!(f, "terminating instruction"),
            HaltReason::ProgramExhausted => write!(f, "program exhausted"),
            HaltReason::StepLimit => write!(f, "step limit reached"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ready,
    Running,
    Halted(HaltReason),
}

/// Registers, memory and `pc` of one simulation
#[derive(Debug, Clone)]
pub struct VMState {
    pub regs: RegisterFile,
    pub mem: MemoryStore,
    pub pc: Address,
    /// Instructions executed so far
    pub steps: u64,
    pub status: Status,
}

impl VMState {
    pub fn new(config: &InstructionSetConfig) -> Self {
        Self {
            regs: RegisterFile::new(config),
            mem: MemoryStore::new(),
            pc: config.instruction_start,
            steps: 0,
            status: Status::Ready,
        }
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        matches!(self.status, Status::Halted(_))
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        match self.status {
            Status::Halted(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn halt(&mut self, reason: HaltReason) {
        self.status = Status::Halted(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let config = InstructionSetConfig {
            instruction_start: 0x40000,
            field_widths: [("reg".to_string(), 4)].into_iter().collect(),
            ..Default::default()
        };
        let state = VMState::new(&config);

        assert_eq!(state.pc, 0x40000);
        assert_eq!(state.steps, 0);
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.regs.len(), 16);
        assert!(state.mem.is_empty());
        assert!(!state.is_halted());
        assert_eq!(state.halt_reason(), None);
    }

    #[test]
    fn test_halt() {
        let mut state = VMState::new(&InstructionSetConfig::default());
        state.halt(HaltReason::ProgramExhausted);
        assert!(state.is_halted());
        assert_eq!(state.halt_reason(), Some(HaltReason::ProgramExhausted));
    }

    #[test]
    fn test_halt_reason_display() {
        assert_eq!(HaltReason::ProgramExhausted.to_string(), "program exhausted");
        assert_eq!(
            HaltReason::TerminatingInstruction.to_string(),
            "terminating instruction"
        );
    }
}
