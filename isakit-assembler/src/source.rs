//! # Source preprocessing
//!
//! Splits an assembly file into its data image and the ordered list of
//! label definitions and instruction lines. A file starts in the text
//! section; `.data <hex address>` switches to data words and `.text`
//! switches back.

use crate::error::{AssemblerError, Result};
use crate::lexer::{label_definition, tokenize, Token};
use isakit_spec::{Address, DataImage};

/// One meaningful line of the text section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLine {
    Label { line: usize, name: String },
    Instruction { line: usize, text: String },
}

impl SourceLine {
    pub fn line(&self) -> usize {
        match self {
            SourceLine::Label { line, .. } | SourceLine::Instruction { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub data: DataImage,
    pub lines: Vec<SourceLine>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Text,
    Data,
}

/// Strip a trailing `#` comment and surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    match line.split_once('#') {
        Some((code, _)) => code.trim(),
        None => line.trim(),
    }
}

/// Parse a hexadecimal word, with or without `0x`.
fn parse_hex(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Directive name and argument tokens, if the line starts with one
fn directive(text: &str) -> Option<(String, Vec<&str>)> {
    let tokens = tokenize(text);
    match tokens.first() {
        Some((Token::Directive(name), span)) => {
            let args = text[span.end..].split_whitespace().collect();
            Some((name.clone(), args))
        }
        _ => None,
    }
}

pub fn preprocess(source: &str) -> Result<SourceFile> {
    let mut file = SourceFile::default();
    let mut section = Section::Text;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = strip_comment(raw);
        if text.is_empty() {
            continue;
        }

        if let Some((name, args)) = directive(text) {
            section = match (name.as_str(), args.as_slice()) {
                ("text", []) => Section::Text,
                ("data", [addr]) => {
                    let start: Address = parse_hex(addr).ok_or_else(|| AssemblerError::InvalidDirective {
                        line,
                        directive: text.to_string(),
                    })?;
                    file.data.begin(start);
                    Section::Data
                }
                _ => {
                    return Err(AssemblerError::InvalidDirective {
                        line,
                        directive: text.to_string(),
                    })
                }
            };
            continue;
        }

        match section {
            Section::Data => {
                for word in text.split(|c: char| c.is_whitespace() || c == ',') {
                    if word.is_empty() {
                        continue;
                    }
                    let value = parse_hex(word).ok_or_else(|| AssemblerError::InvalidData {
                        line,
                        text: word.to_string(),
                    })?;
                    file.data.push(value);
                }
            }
            Section::Text => {
                let entry = match label_definition(text) {
                    Some(name) => SourceLine::Label { line, name },
                    None if text.ends_with(':') => {
                        return Err(AssemblerError::SyntaxError {
                            line,
                            column: 1,
                            message: format!("malformed label '{text}'"),
                        })
                    }
                    None => SourceLine::Instruction {
                        line,
                        text: text.to_string(),
                    },
                };
                file.lines.push(entry);
            }
        }
    }

    Ok(file)
}
