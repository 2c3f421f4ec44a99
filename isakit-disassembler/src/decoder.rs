//! Instruction decoder
//!
//! A word decodes to the unique primitive whose literal and discriminant
//! bits it carries.

use crate::error::{DisassemblerError, Result};
use isakit_spec::{Address, Instruction, InstructionSet, Value, Word, PC};
use std::sync::Arc;

/// Decode one instruction word with no address attached.
pub fn decode(isa: &InstructionSet, word: Word) -> Result<Instruction> {
    let mut matches = isa
        .primitives()
        .filter_map(|spec| spec.decode(word).map(|bindings| (spec, bindings)));

    let (spec, bindings) = matches
        .next()
        .ok_or(DisassemblerError::NoMatchingSpec(word))?;

    let rest: Vec<String> = matches.map(|(spec, _)| spec.name().to_string()).collect();
    if !rest.is_empty() {
        let mut candidates = vec![spec.name().to_string()];
        candidates.extend(rest);
        return Err(DisassemblerError::AmbiguousEncoding { word, candidates });
    }

    Ok(Instruction::new(Arc::clone(spec), spec.name().to_string(), bindings))
}

/// Decode a word located at `address`, binding `pc` for execution.
pub fn decode_at(isa: &InstructionSet, word: Word, address: Address) -> Result<Instruction> {
    let instr = decode(isa, word)?;
    let mut bindings = instr.bindings().clone();
    bindings.set(PC, address as Value);
    Ok(Instruction::new(
        Arc::clone(instr.spec()),
        instr.name().to_string(),
        bindings,
    ))
}
