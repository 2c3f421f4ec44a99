//! # Instruction Set
//!
//! The validated configuration plus every spec, in declaration order.
//! Immutable once built and safe to share between threads.

use crate::bindings::{Bindings, PC};
use crate::config::InstructionSetConfig;
use crate::error::{IsaError, Result};
use crate::expand::flatten;
use crate::instruction::Instruction;
use crate::op::OperationSpec;
use crate::{Address, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct InstructionSet {
    config: Arc<InstructionSetConfig>,
    specs: Vec<Arc<OperationSpec>>,
}

impl InstructionSet {
    pub(crate) fn new(config: Arc<InstructionSetConfig>, specs: Vec<Arc<OperationSpec>>) -> Self {
        Self { config, specs }
    }

    pub fn config(&self) -> &InstructionSetConfig {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<InstructionSetConfig> {
        Arc::clone(&self.config)
    }

    pub fn specs(&self) -> &[Arc<OperationSpec>] {
        &self.specs
    }

    pub fn primitives(&self) -> impl Iterator<Item = &Arc<OperationSpec>> {
        self.specs.iter().filter(|spec| !spec.is_mnemonic())
    }

    /// First spec, in declaration order, answering to `name`
    pub fn spec_named(&self, name: &str) -> Option<&Arc<OperationSpec>> {
        self.specs.iter().find(|spec| spec.answers_to(name))
    }

    /// Find the single spec whose syntax matches `text`.
    pub fn select(&self, text: &str) -> Result<(Arc<OperationSpec>, String, Bindings)> {
        let mut matches: Vec<(&Arc<OperationSpec>, String, Bindings)> = self
            .specs
            .iter()
            .filter_map(|spec| {
                spec.parse_text(text)
                    .map(|(name, bindings)| (spec, name, bindings))
            })
            .collect();

        match matches.len() {
            0 => Err(IsaError::UnknownInstruction(text.trim().to_string())),
            1 => {
                let (spec, name, bindings) = matches.remove(0);
                Ok((Arc::clone(spec), name, bindings))
            }
            _ => Err(IsaError::AmbiguousInstruction {
                text: text.trim().to_string(),
                candidates: matches.into_iter().map(|(_, name, _)| name).collect(),
            }),
        }
    }

    /// Every register-role operand must name an existing register.
    pub(crate) fn check_registers(&self, bindings: &Bindings) -> Result<()> {
        let count = self.config.register_count();
        for role in &self.config.register_args {
            if let Some(index) = bindings.get(role) {
                if index < 0 || index as u64 >= count as u64 {
                    return Err(IsaError::RegisterOutOfRange { index, count });
                }
            }
        }
        Ok(())
    }

    /// Parse one line into a single, possibly mnemonic, instruction at `pc`.
    pub fn parse_one(&self, text: &str, pc: Address) -> Result<Instruction> {
        let (spec, name, mut bindings) = self.select(text)?;
        self.check_registers(&bindings)?;
        bindings.set(PC, pc as Value);
        Ok(Instruction::new(spec, name, bindings))
    }

    /// Parse one line and flatten it into primitives starting at `pc`.
    pub fn parse(&self, text: &str, pc: Address) -> Result<Vec<Instruction>> {
        let instruction = self.parse_one(text, pc)?;
        self.expand(instruction)
    }

    /// Flatten an instruction into the primitives it stands for.
    pub fn expand(&self, instruction: Instruction) -> Result<Vec<Instruction>> {
        let mut out = Vec::new();
        flatten(self, instruction, &mut out)?;
        Ok(out)
    }
}

impl fmt::Debug for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionSet")
            .field("config", &self.config)
            .field(
                "specs",
                &self.specs.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
