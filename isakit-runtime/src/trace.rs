//! Per-step execution records

use isakit_spec::bits::to_hex_string;
use isakit_spec::{Address, Value, Word};
use serde::{Deserialize, Serialize};

/// One register whose value differs after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterChange {
    pub register: usize,
    pub old: Value,
    pub new: Value,
}

impl RegisterChange {
    /// `R<index>: <old> => <new>` with `width`-bit hex values
    pub fn describe(&self, width: u32) -> String {
        format!(
            "R{}: {} => {}",
            self.register,
            to_hex_string(self.old, width, false),
            to_hex_string(self.new, width, false)
        )
    }
}

/// Observable outcome of executing one instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub pc: Address,
    pub next_pc: Address,
    /// Canonical assembly text of the executed instruction
    pub text: String,
    pub word: Word,
    /// `word` as an instruction-width binary string
    pub binary: String,
    pub before: Vec<Value>,
    pub after: Vec<Value>,
    pub changes: Vec<RegisterChange>,
    /// The step halted the simulation
    pub halted: bool,
}

impl StepRecord {
    /// Registers whose values differ between two snapshots, in index order
    pub fn diff(before: &[Value], after: &[Value]) -> Vec<RegisterChange> {
        before
            .iter()
            .zip(after)
            .enumerate()
            .filter(|(_, (old, new))| old != new)
            .map(|(register, (&old, &new))| RegisterChange { register, old, new })
            .collect()
    }

    /// Changed registers joined with `; `
    pub fn change_summary(&self, width: u32) -> String {
        self.changes
            .iter()
            .map(|change| change.describe(width))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
