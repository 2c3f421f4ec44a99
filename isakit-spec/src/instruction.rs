//! # Instructions
//!
//! An [`Instruction`] binds operand values to one spec. It is produced by
//! parsing text, by decoding a word, or by mnemonic expansion.

use crate::bindings::{Bindings, PC};
use crate::bits::{restrict_to_width, to_binary_string, to_hex_string};
use crate::config::InstructionSetConfig;
use crate::context::ExecContext;
use crate::error::{IsaError, Result};
use crate::memory::MemoryStore;
use crate::op::{OperationSpec, SpecKind};
use crate::register::{RegisterFile, WriteOutcome};
use crate::{Address, Value, Word};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Instruction {
    spec: Arc<OperationSpec>,
    /// Name the instruction was written or decoded with
    name: String,
    bindings: Bindings,
}

/// Register write performed after an instruction's actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Writeback {
    pub register: Value,
    pub value: Value,
    pub outcome: WriteOutcome,
}

/// Result of executing one instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    pub next_pc: Address,
    /// An action set `pc` explicitly
    pub branched: bool,
    pub writeback: Option<Writeback>,
}

impl Instruction {
    pub fn new(spec: Arc<OperationSpec>, name: String, bindings: Bindings) -> Self {
        Self {
            spec,
            name,
            bindings,
        }
    }

    pub fn spec(&self) -> &Arc<OperationSpec> {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn operand(&self, name: &str) -> Option<Value> {
        self.bindings.get(name)
    }

    pub fn pc(&self) -> Option<Address> {
        self.bindings.get(PC).map(|pc| pc as Address)
    }

    pub fn is_mnemonic(&self) -> bool {
        self.spec.is_mnemonic()
    }

    // ========================================================================
    // Binary and text forms
    // ========================================================================

    pub fn encode(&self) -> Result<Word> {
        self.spec.encode(&self.bindings)
    }

    /// Fixed-width binary digit string
    pub fn to_binary(&self) -> Result<String> {
        let width = self.width()?;
        Ok(to_binary_string(self.encode()?, width))
    }

    /// Fixed-width `0x` hex string
    pub fn to_hex(&self) -> Result<String> {
        let width = self.width()?;
        Ok(to_hex_string(self.encode()? as Value, width, false))
    }

    fn width(&self) -> Result<u32> {
        self.spec
            .layout()
            .map(|layout| layout.width())
            .ok_or_else(|| IsaError::NotEncodable(self.name.clone()))
    }

    /// Canonical assembly text
    pub fn render(&self) -> Result<String> {
        self.spec.render(&self.name, &self.bindings)
    }

    pub fn is_terminating(&self, config: &InstructionSetConfig) -> bool {
        match (config.terminating_instruction, self.encode()) {
            (Some(pattern), Ok(word)) => pattern == word,
            _ => false,
        }
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run the spec's actions in order, then write the last action's result
    /// to the destination register if this instruction binds one.
    pub fn execute(
        &self,
        config: &InstructionSetConfig,
        regs: &mut RegisterFile,
        mem: &mut MemoryStore,
    ) -> Result<Execution> {
        let actions = match self.spec.kind() {
            SpecKind::Primitive { actions, .. } => actions,
            SpecKind::Mnemonic { .. } => return Err(IsaError::NotExecutable(self.name.clone())),
        };
        let pc = self.pc().ok_or_else(|| IsaError::unbound(&self.name, PC))?;

        let mut ctx = ExecContext::new(config, &self.spec, &self.bindings, regs, mem, pc);
        let mut result = None;
        for action in actions {
            result = action(&mut ctx)?;
        }
        let branch = ctx.finish();

        let destination = config
            .destination
            .as_deref()
            .and_then(|role| self.bindings.get(role));
        let writeback = match (result, destination) {
            (Some(value), Some(register)) => {
                let outcome = regs.write(register, value)?;
                Some(Writeback {
                    register,
                    value: restrict_to_width(value, config.data_width),
                    outcome,
                })
            }
            _ => None,
        };

        Ok(Execution {
            next_pc: branch.unwrap_or_else(|| pc.wrapping_add(config.instruction_bytes())),
            branched: branch.is_some(),
            writeback,
        })
    }
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.spec, &other.spec)
            && self.name == other.name
            && self.bindings == other.bindings
    }
}

impl Eq for Instruction {}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruction")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => write!(f, "{text}"),
            Err(_) => write!(f, "{} {}", self.name, self.bindings.operands()),
        }
    }
}
