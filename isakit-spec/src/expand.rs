//! # Mnemonic Expansion
//!
//! Mnemonics are flattened depth-first: every inserted instruction that is
//! itself a mnemonic is expanded in place before the next insert runs, so
//! each emitted primitive is bound to the address it will actually occupy.
//! Re-entering a mnemonic already being expanded is an error, as is nesting
//! deeper than [`MAX_EXPANSION_DEPTH`].

use crate::bindings::{Bindings, PC};
use crate::error::{IsaError, Result};
use crate::instruction::Instruction;
use crate::isa::InstructionSet;
use crate::op::{OperationSpec, SpecKind};
use crate::{Address, Value};
use std::sync::Arc;

pub const MAX_EXPANSION_DEPTH: usize = 32;

/// Flatten `instruction` into primitives appended to `out`.
pub(crate) fn flatten(isa: &InstructionSet, instruction: Instruction, out: &mut Vec<Instruction>) -> Result<()> {
    let mut cursor = instruction
        .pc()
        .ok_or_else(|| IsaError::unbound(instruction.name(), PC))?;
    let mut chain = Vec::new();
    flatten_into(isa, instruction, out, &mut chain, &mut cursor)
}

fn flatten_into(
    isa: &InstructionSet,
    instruction: Instruction,
    out: &mut Vec<Instruction>,
    chain: &mut Vec<Arc<OperationSpec>>,
    cursor: &mut Address,
) -> Result<()> {
    let spec = Arc::clone(instruction.spec());
    let expansion = match spec.kind() {
        SpecKind::Primitive { .. } => {
            out.push(instruction);
            *cursor = cursor.wrapping_add(isa.config().instruction_bytes());
            return Ok(());
        }
        SpecKind::Mnemonic { expansion } => Arc::clone(expansion),
    };

    if chain.iter().any(|active| Arc::ptr_eq(active, &spec)) {
        let mut names: Vec<String> = chain.iter().map(|s| s.name().to_string()).collect();
        names.push(spec.name().to_string());
        return Err(IsaError::CyclicExpansion { chain: names });
    }
    if chain.len() >= MAX_EXPANSION_DEPTH {
        return Err(IsaError::ExpansionTooDeep {
            spec: spec.name().to_string(),
            limit: MAX_EXPANSION_DEPTH,
        });
    }

    tracing::trace!(mnemonic = spec.name(), pc = *cursor, "expanding");
    chain.push(Arc::clone(&spec));
    let mut ctx = ExpansionContext {
        isa,
        mnemonic: &instruction,
        out: &mut *out,
        chain: &mut *chain,
        cursor: &mut *cursor,
    };
    expansion(&mut ctx)?;
    chain.pop();
    Ok(())
}

/// What a mnemonic's expansion function sees: its own operands and a way
/// to insert further instructions.
pub struct ExpansionContext<'a> {
    isa: &'a InstructionSet,
    mnemonic: &'a Instruction,
    out: &'a mut Vec<Instruction>,
    chain: &'a mut Vec<Arc<OperationSpec>>,
    cursor: &'a mut Address,
}

impl<'a> ExpansionContext<'a> {
    /// Operand of the mnemonic being expanded
    pub fn var(&self, name: &str) -> Result<Value> {
        self.mnemonic
            .bindings()
            .get(name)
            .ok_or_else(|| IsaError::unbound(self.mnemonic.name(), name))
    }

    /// Address of the mnemonic itself
    pub fn pc(&self) -> Address {
        self.mnemonic.pc().unwrap_or(*self.cursor)
    }

    /// Address the next inserted instruction will occupy
    pub fn next_pc(&self) -> Address {
        *self.cursor
    }

    pub fn instruction_bytes(&self) -> u64 {
        self.isa.config().instruction_bytes()
    }

    /// Index of the register declared with `alias`
    pub fn register(&self, alias: &str) -> Result<Value> {
        self.isa
            .config()
            .register_named(alias)
            .map(|index| index as Value)
            .ok_or_else(|| IsaError::UnknownRegister(alias.to_string()))
    }

    /// Insert the spec called `name`. Operands it needs but that are not
    /// given here are taken from the mnemonic's own operands.
    pub fn insert(&mut self, name: &str, operands: &[(&str, Value)]) -> Result<()> {
        let spec = Arc::clone(
            self.isa
                .spec_named(name)
                .ok_or_else(|| IsaError::UnknownSpec(name.to_string()))?,
        );

        let mut bindings = Bindings::from_pairs(operands);
        for operand in spec.operands() {
            if !bindings.contains(operand) {
                if let Some(value) = self.mnemonic.bindings().get(operand) {
                    bindings.set(operand, value);
                }
            }
        }
        self.isa.check_registers(&bindings)?;
        bindings.set(PC, *self.cursor as Value);

        let instruction = Instruction::new(spec, name.to_string(), bindings);
        flatten_into(self.isa, instruction, self.out, self.chain, self.cursor)
    }
}
