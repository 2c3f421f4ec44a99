//! # Instruction Set Configuration
//!
//! One immutable value describing the machine: word widths, byte order,
//! named field widths, register roles and register declarations. It is
//! assembled by [`crate::IsaBuilder`], validated once, and shared through
//! `Arc` by every layout, format and runtime component afterwards.

use crate::bits::{byte_width, mask};
use crate::{Address, Word};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the field whose width sets the register index width
pub const REGISTER_FIELD: &str = "reg";

/// Byte order used for multi-byte memory accesses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::LittleEndian => write!(f, "little-endian"),
            ByteOrder::BigEndian => write!(f, "big-endian"),
        }
    }
}

/// Mutability class of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegisterClass {
    #[default]
    Normal,
    /// Hard-wired to zero; writes are dropped
    Ground,
    /// Writable, but writes are reported separately
    Reserved,
}

/// A register with a symbolic alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDecl {
    pub index: usize,
    pub alias: String,
    pub class: RegisterClass,
}

/// One accepted textual register form, e.g. `R:val` or `$:val`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFormat {
    pub prefix: String,
    pub suffix: String,
}

impl RegisterFormat {
    /// Parse a `prefix:valsuffix` form.
    pub fn parse(form: &str) -> Result<Self, ConfigError> {
        let (prefix, suffix) = form
            .split_once(":val")
            .ok_or_else(|| ConfigError::MalformedRegisterFormat(form.to_string()))?;
        if suffix.contains(":val") || prefix.chars().any(|c| c.is_ascii_digit()) {
            return Err(ConfigError::MalformedRegisterFormat(form.to_string()));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub fn render(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, index, self.suffix)
    }
}

/// Complete, validated description of an instruction set's machine model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionSetConfig {
    /// Instruction width in bits (1-64)
    pub instruction_width: u32,
    /// Data word width in bits (1-64)
    pub data_width: u32,
    pub byte_order: ByteOrder,
    /// Address of the first instruction
    pub instruction_start: Address,
    /// Executing this word halts the simulation
    pub terminating_instruction: Option<Word>,
    /// Widths of named fields such as `opcode`, `reg`, `ext`
    pub field_widths: BTreeMap<String, u32>,
    /// Operand names that hold register indexes
    pub register_args: Vec<String>,
    /// Role receiving the result of an operation
    pub destination: Option<String>,
    /// Accepted register spellings; the first one is used for output
    pub register_formats: Vec<RegisterFormat>,
    pub registers: Vec<RegisterDecl>,
}

impl Default for InstructionSetConfig {
    fn default() -> Self {
        Self {
            instruction_width: 16,
            data_width: 32,
            byte_order: ByteOrder::LittleEndian,
            instruction_start: 0,
            terminating_instruction: None,
            field_widths: BTreeMap::new(),
            register_args: Vec::new(),
            destination: None,
            register_formats: vec![RegisterFormat {
                prefix: "R".to_string(),
                suffix: String::new(),
            }],
            registers: Vec::new(),
        }
    }
}

impl InstructionSetConfig {
    /// Instruction size in bytes; the step between instruction addresses
    #[inline]
    pub fn instruction_bytes(&self) -> u64 {
        byte_width(self.instruction_width) as u64
    }

    #[inline]
    pub fn data_bytes(&self) -> u32 {
        byte_width(self.data_width)
    }

    /// Width of register index fields
    pub fn register_width(&self) -> u32 {
        self.field_width(REGISTER_FIELD).unwrap_or(0)
    }

    /// Number of registers (`2^reg`)
    pub fn register_count(&self) -> usize {
        1usize
            .checked_shl(self.register_width())
            .unwrap_or(usize::MAX)
    }

    pub fn field_width(&self, name: &str) -> Option<u32> {
        self.field_widths.get(name).copied()
    }

    pub fn is_register_arg(&self, name: &str) -> bool {
        self.register_args.iter().any(|arg| arg == name)
    }

    pub fn register(&self, index: usize) -> Option<&RegisterDecl> {
        self.registers.iter().find(|r| r.index == index)
    }

    pub fn register_class(&self, index: usize) -> RegisterClass {
        self.register(index).map(|r| r.class).unwrap_or_default()
    }

    /// Index of the register declared with `alias`
    pub fn register_named(&self, alias: &str) -> Option<usize> {
        self.registers
            .iter()
            .find(|r| r.alias.eq_ignore_ascii_case(alias))
            .map(|r| r.index)
    }

    /// Canonical text for a register index
    pub fn render_register(&self, index: usize) -> String {
        match self.register_formats.first() {
            Some(form) => form.render(index),
            None => format!("R{index}"),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruction_width == 0 || self.instruction_width > 64 {
            return Err(ConfigError::UnsupportedWidth {
                what: "instruction",
                width: self.instruction_width,
            });
        }
        if self.data_width == 0 || self.data_width > 64 {
            return Err(ConfigError::UnsupportedWidth {
                what: "data",
                width: self.data_width,
            });
        }

        for (name, &width) in &self.field_widths {
            if width == 0 || width > self.instruction_width {
                return Err(ConfigError::FieldWidth {
                    field: name.clone(),
                    width,
                });
            }
        }

        if !self.register_args.is_empty() && self.field_width(REGISTER_FIELD).is_none() {
            return Err(ConfigError::MissingWidth(REGISTER_FIELD.to_string()));
        }
        if self.register_width() > 16 {
            return Err(ConfigError::UnsupportedWidth {
                what: "register",
                width: self.register_width(),
            });
        }

        if let Some(dest) = &self.destination {
            if !self.is_register_arg(dest) {
                return Err(ConfigError::UnknownDestination(dest.clone()));
            }
        }

        if self.register_formats.is_empty() {
            return Err(ConfigError::MalformedRegisterFormat(String::new()));
        }

        let count = self.register_count();
        for reg in &self.registers {
            if reg.index >= count {
                return Err(ConfigError::RegisterIndex {
                    index: reg.index,
                    count,
                });
            }
        }

        if let Some(word) = self.terminating_instruction {
            if word & !mask(self.instruction_width) != 0 {
                return Err(ConfigError::TerminatingInstructionWidth {
                    word,
                    width: self.instruction_width,
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for InstructionSetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InstructionSetConfig {{ instruction: {} bits, data: {} bits, {}, start: {:#010x}, registers: {} }}",
            self.instruction_width,
            self.data_width,
            self.byte_order,
            self.instruction_start,
            self.register_count(),
        )
    }
}

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A width is zero or larger than the machine supports
    UnsupportedWidth { what: &'static str, width: u32 },
    /// A field width is out of range
    FieldWidth { field: String, width: u32 },
    /// A required field width was never declared
    MissingWidth(String),
    /// More than one field in a layout has no known width
    MultipleUnknownWidths { format: String, fields: Vec<String> },
    /// Layout widths do not add up to the instruction width
    LayoutWidth { format: String, total: u32, expected: u32 },
    MalformedLayout { format: String, reason: String },
    MalformedSyntax { format: String, reason: String },
    MalformedRegisterFormat(String),
    /// Destination role is not one of the register roles
    UnknownDestination(String),
    RegisterIndex { index: usize, count: usize },
    /// A fixed value names a field absent from the layout
    UnknownField { spec: String, field: String },
    /// A fixed value does not fit its field
    FixedValueWidth { spec: String, field: String, value: i64 },
    /// A layout field is neither fixed nor present in the assembly format
    UndeclaredOperand { spec: String, operand: String },
    /// Two operations accept the same bit pattern
    AmbiguousEncoding { first: String, second: String },
    TerminatingInstructionWidth { word: Word, width: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedWidth { what, width } => {
                write!(f, "{what} width must be in range [1, 64], got {width}")
            }
            ConfigError::FieldWidth { field, width } => {
                write!(f, "field '{field}' has unsupported width {width}")
            }
            ConfigError::MissingWidth(field) => {
                write!(f, "no width declared for field '{field}'")
            }
            ConfigError::MultipleUnknownWidths { format, fields } => {
                write!(
                    f,
                    "layout '{format}' has more than one field of unknown width: {}",
                    fields.join(", ")
                )
            }
            ConfigError::LayoutWidth {
                format,
                total,
                expected,
            } => {
                write!(
                    f,
                    "layout '{format}' is {total} bits wide, instruction width is {expected}"
                )
            }
            ConfigError::MalformedLayout { format, reason } => {
                write!(f, "malformed binary layout '{format}': {reason}")
            }
            ConfigError::MalformedSyntax { format, reason } => {
                write!(f, "malformed assembly format '{format}': {reason}")
            }
            ConfigError::MalformedRegisterFormat(form) => {
                write!(f, "malformed register format '{form}' (expected prefix:valsuffix)")
            }
            ConfigError::UnknownDestination(role) => {
                write!(f, "destination '{role}' is not a register argument")
            }
            ConfigError::RegisterIndex { index, count } => {
                write!(f, "register {index} out of range (register count: {count})")
            }
            ConfigError::UnknownField { spec, field } => {
                write!(f, "{spec}: fixed field '{field}' is not part of its layout")
            }
            ConfigError::FixedValueWidth { spec, field, value } => {
                write!(f, "{spec}: fixed value {value} does not fit field '{field}'")
            }
            ConfigError::UndeclaredOperand { spec, operand } => {
                write!(f, "{spec}: layout field '{operand}' is neither fixed nor an operand")
            }
            ConfigError::AmbiguousEncoding { first, second } => {
                write!(f, "encodings of '{first}' and '{second}' overlap")
            }
            ConfigError::TerminatingInstructionWidth { word, width } => {
                write!(f, "terminating instruction {word:#x} does not fit in {width} bits")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
