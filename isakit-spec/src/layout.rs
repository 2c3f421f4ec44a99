//! # Binary Field Layout
//!
//! A layout string such as `:opcode:dest:src00:zz` lists fields from the most
//! significant bit down. `:name` is a named field, a run of `0`/`1` is a
//! literal, and `:name[N]` pins a field to an explicit width. Whitespace is
//! ignored.
//!
//! Named field widths come from, in order: the explicit `[N]`, the register
//! width when the name is a register role, the configuration's field table.
//! At most one field may remain unknown; it takes whatever is left of the
//! instruction width.

use crate::bindings::Bindings;
use crate::bits::{extract_bits, from_binary_string, mask};
use crate::config::{ConfigError, InstructionSetConfig};
use crate::error::{IsaError, Result};
use crate::{Value, Word};
use nom::{
    branch::alt,
    bytes::complete::{is_a, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

/// One slot of a binary layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Literal { bits: u64, width: u32 },
    Named {
        name: String,
        width: u32,
        /// Discriminant value pinned at spec construction
        fixed: Option<u64>,
    },
}

impl Field {
    pub fn width(&self) -> u32 {
        match self {
            Field::Literal { width, .. } | Field::Named { width, .. } => *width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryLayout {
    format: String,
    fields: Vec<Field>,
    width: u32,
}

// ============================================================================
// Format parsing
// ============================================================================

enum RawField<'a> {
    Named(&'a str, Option<u32>),
    Literal(&'a str),
}

fn field_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphabetic() || c == '_')(input)
}

fn explicit_width(input: &str) -> IResult<&str, u32> {
    delimited(
        char('['),
        map_res(digit1, |digits: &str| digits.parse::<u32>()),
        char(']'),
    )(input)
}

fn raw_field(input: &str) -> IResult<&str, RawField<'_>> {
    alt((
        map(
            preceded(char(':'), pair(field_name, opt(explicit_width))),
            |(name, width)| RawField::Named(name, width),
        ),
        map(is_a("01"), RawField::Literal),
    ))(input)
}

fn raw_layout(input: &str) -> IResult<&str, Vec<RawField<'_>>> {
    all_consuming(preceded(multispace0, many0(terminated(raw_field, multispace0))))(input)
}

pub(crate) fn describe_nom_error(err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            format!("unexpected input at '{}'", e.input)
        }
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
    }
}

impl BinaryLayout {
    /// Parse `format` and resolve every field width against `config`.
    pub fn new(format: &str, config: &InstructionSetConfig) -> std::result::Result<Self, ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedLayout {
            format: format.to_string(),
            reason,
        };

        let raw = match raw_layout(format) {
            Ok((_, raw)) => raw,
            Err(err) => return Err(malformed(describe_nom_error(err))),
        };
        if raw.is_empty() {
            return Err(malformed("layout has no fields".to_string()));
        }

        let mut fields = Vec::with_capacity(raw.len());
        let mut unknown = Vec::new();
        let mut known = 0u32;
        let expected = config.instruction_width;
        let too_wide = |total: u32| ConfigError::LayoutWidth {
            format: format.to_string(),
            total,
            expected,
        };

        for item in raw {
            match item {
                RawField::Literal(digits) => {
                    let bits = from_binary_string(digits)
                        .ok_or_else(|| malformed(format!("literal '{digits}' is too long")))?;
                    known = known
                        .checked_add(digits.len() as u32)
                        .filter(|&total| total <= expected)
                        .ok_or_else(|| too_wide(known.saturating_add(digits.len() as u32)))?;
                    fields.push(Field::Literal {
                        bits,
                        width: digits.len() as u32,
                    });
                }
                RawField::Named(name, explicit) => {
                    let width = explicit.or_else(|| {
                        if config.is_register_arg(name) {
                            Some(config.register_width())
                        } else {
                            config.field_width(name)
                        }
                    });
                    match width {
                        Some(0) => return Err(malformed(format!("field '{name}' has zero width"))),
                        Some(w) if w > expected => return Err(too_wide(w)),
                        Some(w) => {
                            known = known
                                .checked_add(w)
                                .filter(|&total| total <= expected)
                                .ok_or_else(|| too_wide(known.saturating_add(w)))?;
                        }
                        None => unknown.push(fields.len()),
                    }
                    fields.push(Field::Named {
                        name: name.to_string(),
                        width: width.unwrap_or(0),
                        fixed: None,
                    });
                }
            }
        }

        match unknown.as_slice() {
            [] => {}
            [index] => {
                let remaining = expected.checked_sub(known).filter(|&w| w > 0).ok_or(
                    ConfigError::LayoutWidth {
                        format: format.to_string(),
                        total: known,
                        expected,
                    },
                )?;
                if let Field::Named { width, .. } = &mut fields[*index] {
                    *width = remaining;
                }
                known += remaining;
            }
            many => {
                let names = many
                    .iter()
                    .filter_map(|&i| match &fields[i] {
                        Field::Named { name, .. } => Some(name.clone()),
                        Field::Literal { .. } => None,
                    })
                    .collect();
                return Err(ConfigError::MultipleUnknownWidths {
                    format: format.to_string(),
                    fields: names,
                });
            }
        }

        if known != expected {
            return Err(ConfigError::LayoutWidth {
                format: format.to_string(),
                total: known,
                expected,
            });
        }

        Ok(Self {
            format: format.to_string(),
            fields,
            width: expected,
        })
    }

    /// Pin every field called `field` to `value`.
    pub fn pin(&mut self, spec: &str, field: &str, value: Value) -> std::result::Result<(), ConfigError> {
        let mut found = false;
        for slot in &mut self.fields {
            if let Field::Named { name, width, fixed } = slot {
                if name != field {
                    continue;
                }
                if value < 0 || value as u64 > mask(*width) {
                    return Err(ConfigError::FixedValueWidth {
                        spec: spec.to_string(),
                        field: field.to_string(),
                        value,
                    });
                }
                *fixed = Some(value as u64);
                found = true;
            }
        }
        if !found {
            return Err(ConfigError::UnknownField {
                spec: spec.to_string(),
                field: field.to_string(),
            });
        }
        Ok(())
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total width in bits
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn field_width(&self, name: &str) -> Option<u32> {
        self.fields.iter().find_map(|f| match f {
            Field::Named { name: n, width, .. } if n == name => Some(*width),
            _ => None,
        })
    }

    /// Names of unpinned fields, in layout order, without repeats
    pub fn operands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for field in &self.fields {
            if let Field::Named {
                name, fixed: None, ..
            } = field
            {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Pack `bindings` into a word. Values are truncated to their field
    /// width, so negative immediates land as two's complement.
    pub fn encode(&self, spec: &str, bindings: &Bindings) -> Result<Word> {
        let mut word = 0u64;
        for field in &self.fields {
            let (value, width) = match field {
                Field::Literal { bits, width } => (*bits, *width),
                Field::Named { name, width, fixed } => {
                    let value = match fixed {
                        Some(fixed) => *fixed,
                        None => bindings
                            .get(name)
                            .ok_or_else(|| IsaError::unbound(spec, name))?
                            as u64,
                    };
                    (value & mask(*width), *width)
                }
            };
            word = if width >= 64 { value } else { (word << width) | value };
        }
        Ok(word)
    }

    /// Split `word` into fields. Returns `None` when a literal or pinned
    /// field disagrees with the word.
    pub fn decode(&self, word: Word) -> Option<Bindings> {
        if word & !mask(self.width) != 0 {
            return None;
        }

        let mut bindings = Bindings::new();
        let mut offset = self.width;
        for field in &self.fields {
            let width = field.width();
            offset -= width;
            let value = extract_bits(word, offset + width - 1, offset);
            match field {
                Field::Literal { bits, .. } => {
                    if value != *bits {
                        return None;
                    }
                }
                Field::Named {
                    fixed: Some(fixed), ..
                } => {
                    if value != *fixed {
                        return None;
                    }
                }
                Field::Named {
                    name, fixed: None, ..
                } => match bindings.get(name) {
                    Some(previous) if previous != value as Value => return None,
                    _ => bindings.set(name.as_str(), value as Value),
                },
            }
        }
        Some(bindings)
    }

    /// `(mask, value)` of every literal and pinned bit
    pub fn fixed_bits(&self) -> (u64, u64) {
        let mut offset = self.width;
        let (mut fixed_mask, mut fixed_value) = (0u64, 0u64);
        for field in &self.fields {
            let width = field.width();
            offset -= width;
            let bits = match field {
                Field::Literal { bits, .. } => Some(*bits),
                Field::Named { fixed, .. } => *fixed,
            };
            if let Some(bits) = bits {
                fixed_mask |= mask(width) << offset;
                fixed_value |= (bits & mask(width)) << offset;
            }
        }
        (fixed_mask, fixed_value)
    }

    /// True when some word satisfies the fixed bits of both layouts
    pub fn overlaps(&self, other: &BinaryLayout) -> bool {
        if self.width != other.width {
            return false;
        }
        let (mask_a, value_a) = self.fixed_bits();
        let (mask_b, value_b) = other.fixed_bits();
        (value_a ^ value_b) & mask_a & mask_b == 0
    }
}
