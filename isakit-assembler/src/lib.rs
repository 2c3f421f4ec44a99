//! isakit Assembler
//!
//! Assemble source text into primitive instructions for any instruction set
//! built with `isakit-spec`.
//!
//! ## Example
//!
//! ```rust
//! use isakit_assembler::assemble;
//! use isakit_spec::isa3220;
//!
//! let isa = isa3220().unwrap();
//! let source = r#"
//!     bnez done
//!     add R1, R2
//! done:
//!     beqz -2
//! "#;
//!
//! let assembly = assemble(&isa, source).unwrap();
//! assert_eq!(assembly.program.len(), 4);
//! ```

pub mod error;
pub mod lexer;
pub mod source;
pub mod parser;
pub mod assembler;

pub use error::{AssemblerError, Result};
pub use assembler::{assemble, assemble_file, Assembly};
pub use parser::InstructionParser;
pub use source::{preprocess, SourceFile, SourceLine};
