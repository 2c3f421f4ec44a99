//! Main assembler logic
//!
//! Pass 1 lays out every line, using the real expansion count of each
//! instruction with labels replaced by a placeholder. Pass 2 rewrites each
//! label reference as the offset from the address after the line's first
//! instruction and feeds the line to the instruction parser.

use crate::error::{AssemblerError, Result};
use crate::lexer::{tokenize, Token};
use crate::parser::InstructionParser;
use crate::source::{preprocess, SourceLine};
use isakit_spec::bits::to_hex_string;
use isakit_spec::{Address, DataImage, InstructionSet, IsaError, Program, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// An assembled program and its initial data
#[derive(Debug, Clone)]
pub struct Assembly {
    pub program: Program,
    pub data: DataImage,
    pub labels: BTreeMap<String, Address>,
}

struct Line<'s> {
    line: usize,
    text: &'s str,
    address: Address,
    count: usize,
}

/// Replace every label reference in `text` (other than the operation name)
/// with `value(label)`.
fn substitute(text: &str, labels: &BTreeMap<String, Address>, mut value: impl FnMut(&str, Address) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (token, span) in tokenize(text).into_iter().skip(1) {
        if let Token::Identifier(name) = token {
            if let Some(&target) = labels.get(&name) {
                out.push_str(&text[last..span.start]);
                out.push_str(&value(&name, target));
                last = span.end;
            }
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Whether `word` spells a register of `isa`
fn is_register(isa: &InstructionSet, word: &str) -> bool {
    let config = isa.config();
    config.register_named(word).is_some()
        || config.register_formats.iter().any(|form| {
            word.len() > form.prefix.len()
                && word.is_char_boundary(form.prefix.len())
                && word[..form.prefix.len()].eq_ignore_ascii_case(&form.prefix)
                && word[form.prefix.len()..]
                    .strip_suffix(form.suffix.as_str())
                    .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        })
}

/// Explain a line the instruction set rejected.
fn line_error(isa: &InstructionSet, line: usize, text: &str, source: IsaError) -> AssemblerError {
    if matches!(source, IsaError::UnknownInstruction(_)) {
        let unknown = tokenize(text).into_iter().skip(1).find_map(|(token, _)| match token {
            Token::Identifier(name) if !is_register(isa, &name) => Some(name),
            _ => None,
        });
        if let Some(label) = unknown {
            return AssemblerError::UndefinedLabel { line, label };
        }
    }
    AssemblerError::Instruction {
        line,
        text: text.to_string(),
        source,
    }
}

/// Assemble `source` for `isa`.
pub fn assemble(isa: &InstructionSet, source: &str) -> Result<Assembly> {
    let file = preprocess(source)?;
    let config = isa.config();
    let step = config.instruction_bytes();

    let mut labels = BTreeMap::new();
    for entry in &file.lines {
        if let SourceLine::Label { line, name } = entry {
            if is_register(isa, name) {
                return Err(AssemblerError::RegisterLabel {
                    line: *line,
                    label: name.clone(),
                });
            }
            if labels.insert(name.clone(), 0).is_some() {
                return Err(AssemblerError::DuplicateLabel {
                    line: *line,
                    label: name.clone(),
                });
            }
        }
    }

    // Pass 1: addresses
    let mut lines = Vec::new();
    let mut pc = config.instruction_start;
    for entry in &file.lines {
        match entry {
            SourceLine::Label { name, .. } => {
                labels.insert(name.clone(), pc);
            }
            SourceLine::Instruction { line, text } => {
                let placeholder = substitute(text, &labels, |_, _| "0".to_string());
                let count = isa
                    .parse(&placeholder, pc)
                    .map_err(|e| line_error(isa, *line, text, e))?
                    .len();
                lines.push(Line {
                    line: *line,
                    text,
                    address: pc,
                    count,
                });
                pc = pc.wrapping_add(count as u64 * step);
            }
        }
    }

    // Pass 2: resolve labels and parse
    let mut parser = InstructionParser::new(isa);
    for Line {
        line,
        text,
        address,
        count,
    } in lines
    {
        let resolved = substitute(text, &labels, |name, target| {
            let offset = target.wrapping_sub(address.wrapping_add(step)) as Value;
            tracing::debug!(label = name, target, from = address, offset, "label resolved");
            to_hex_string(offset, config.data_width, true)
        });
        let before = parser.len();
        parser
            .add(&resolved, address)
            .map_err(|e| match e {
                AssemblerError::Isa(source) => line_error(isa, line, &resolved, source),
                other => other,
            })?;
        let emitted = parser.len() - before;
        if emitted != count {
            return Err(AssemblerError::LayoutChanged {
                line,
                first: count,
                second: emitted,
            });
        }
        if emitted > 1 {
            tracing::debug!(line, text = resolved.as_str(), count = emitted, "mnemonic expanded");
        }
    }

    Ok(Assembly {
        program: parser.into_program(),
        data: file.data,
        labels,
    })
}

/// Read and assemble a source file.
pub fn assemble_file(isa: &InstructionSet, path: impl AsRef<Path>) -> Result<Assembly> {
    let source = std::fs::read_to_string(path)?;
    assemble(isa, &source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isakit_spec::isa3220;

    #[test]
    fn test_assemble_simple() {
        let isa = isa3220().unwrap();
        let source = r#"
            # Simple test
            add R1, R2
            beqz -2
        "#;

        let assembly = assemble(&isa, source).unwrap();
        assert_eq!(assembly.program.len(), 2);
        assert_eq!(assembly.program.words().unwrap(), vec![0x0120, 0x4FFE]);
    }

    #[test]
    fn test_substitute_skips_operation_name() {
        let mut labels = BTreeMap::new();
        labels.insert("loop".to_string(), 0x40000);
        let text = substitute("loop loop", &labels, |_, _| "X".to_string());
        assert_eq!(text, "loop X");
    }

    #[test]
    fn test_is_register() {
        let isa = isa3220().unwrap();
        assert!(is_register(&isa, "R12"));
        assert!(is_register(&isa, "r3"));
        assert!(is_register(&isa, "jump"));
        assert!(!is_register(&isa, "R"));
        assert!(!is_register(&isa, "loop"));
    }

    #[test]
    fn test_forward_label() {
        let isa = isa3220().unwrap();
        let source = "bnez done\nadd R1, R2\ndone:\nbeqz -2\n";
        let assembly = assemble(&isa, source).unwrap();
        assert_eq!(assembly.labels["done"], 0x40006);
        // cmpz, beqz 2, add, terminator
        assert_eq!(assembly.program.len(), 4);
        assert_eq!(assembly.program.instructions()[1].operand("imm"), Some(2));
    }
}
