//! # isakit Runtime
//!
//! Fetch-execute simulation of programs built from an instruction set
//! description. Each step executes one primitive instruction against a
//! register file and a sparse memory store and reports which registers it
//! changed.
//!
//! ## Example
//!
//! ```rust
//! use isakit_runtime::{HaltReason, VMConfig, VM};
//! use isakit_spec::isa3220;
//!
//! let isa = isa3220().unwrap();
//! // mib0 R1, 5 ; beqz -2
//! let vm = VM::from_words(&isa, &[0xC105, 0x4FFE], 0x40000, VMConfig::default()).unwrap();
//! let result = vm.run().unwrap();
//! assert_eq!(result.halt_reason, HaltReason::TerminatingInstruction);
//! assert_eq!(result.registers[1], 5);
//! ```

pub mod error;
pub mod state;
pub mod trace;
pub mod vm;

pub use error::{Result, RuntimeError};
pub use state::{HaltReason, Status, VMState};
pub use trace::{RegisterChange, StepRecord};
pub use vm::{ExecutionResult, VMConfig, VM};

use isakit_spec::{InstructionSet, Program};

/// Simple execution helper
///
/// Runs a program with the default configuration.
pub fn run(isa: &InstructionSet, program: Program) -> Result<ExecutionResult> {
    VM::new(isa, program, VMConfig::default()).run()
}
