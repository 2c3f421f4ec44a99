//! # isakit ISA descriptions
//!
//! Declarative instruction sets: a machine configuration plus a list of
//! operation specs, each pairing an assembly format with either a binary
//! layout and semantic actions (a primitive) or an expansion into other
//! instructions (a mnemonic).
//!
//! ## Key Features
//! - Bit layouts with literal bits, pinned discriminants and width inference
//! - Assembly formats with alternative register spellings and aliases
//! - Ground and reserved registers
//! - Byte-addressed sparse memory with ranged, byte-order aware access
//! - Depth-first mnemonic flattening with cycle detection
//! - The `isa3220` reference machine

pub mod bits;
pub mod config;
pub mod error;
pub mod bindings;
pub mod layout;
pub mod syntax;
pub mod register;
pub mod memory;
pub mod op;
pub mod context;
pub mod expand;
pub mod instruction;
pub mod isa;
pub mod builder;
pub mod program;
pub mod isa3220;

pub use bindings::{Bindings, PC};
pub use builder::{GroupDef, IsaBuilder, OpDef};
pub use config::{ByteOrder, ConfigError, InstructionSetConfig, RegisterClass, RegisterDecl, RegisterFormat};
pub use context::ExecContext;
pub use error::{IsaError, Result};
pub use expand::{ExpansionContext, MAX_EXPANSION_DEPTH};
pub use instruction::{Execution, Instruction, Writeback};
pub use isa::InstructionSet;
pub use isa3220::isa3220;
pub use layout::{BinaryLayout, Field};
pub use memory::MemoryStore;
pub use op::{Action, Expansion, OperationSpec, SpecKind};
pub use program::{DataImage, DataSegment, Program, ProgramImage, IMAGE_MAGIC};
pub use register::{RegisterFile, WriteOutcome};
pub use syntax::AssemblyFormat;

/// Register and operand values (two's complement, restricted to a width)
pub type Value = i64;

/// Byte address
pub type Address = u64;

/// Encoded instruction word
pub type Word = u64;
