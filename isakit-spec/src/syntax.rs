//! # Assembly Format Layout
//!
//! An assembly format such as `:op :dest, :src` mixes literal text with
//! `:name` placeholders. `:op` stands for the operation name (or one of its
//! aliases), register-role placeholders accept any configured register
//! spelling, and every other placeholder is a numeric literal.
//!
//! Literal text matches case-insensitively. Whitespace inside a literal is
//! optional unless the literal is nothing but whitespace, in which case at
//! least one blank is required.

use crate::bindings::Bindings;
use crate::bits::parse_literal;
use crate::config::{ConfigError, InstructionSetConfig, RegisterFormat};
use crate::error::{IsaError, Result};
use crate::layout::describe_nom_error;
use crate::Value;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag_no_case, take_till1, take_while1},
    character::complete::{char, digit1, hex_digit1, space0, space1},
    combinator::{all_consuming, map, opt, recognize},
    multi::many0,
    sequence::{pair, preceded},
    IResult,
};

/// Placeholder standing for the operation name
pub const OP_PLACEHOLDER: &str = "op";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Literal(String),
    OpName,
    Register(String),
    Value {
        name: String,
        /// Character that ends the value when it is not last
        terminator: Option<char>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyFormat {
    format: String,
    parts: Vec<Part>,
    register_formats: Vec<RegisterFormat>,
    register_aliases: Vec<(String, usize)>,
}

enum RawPart<'a> {
    Placeholder(&'a str),
    Literal(&'a str),
}

fn raw_part(input: &str) -> IResult<&str, RawPart<'_>> {
    alt((
        map(
            preceded(
                char(':'),
                take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
            ),
            RawPart::Placeholder,
        ),
        map(is_not(":"), RawPart::Literal),
    ))(input)
}

fn numeric_token(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(char('-')),
        alt((preceded(tag_no_case("0x"), hex_digit1), digit1)),
    ))(input)
}

fn match_literal<'a>(literal: &str, input: &'a str) -> Option<&'a str> {
    if literal.chars().all(char::is_whitespace) {
        let (rest, _) = space1::<_, nom::error::Error<&str>>(input).ok()?;
        return Some(rest);
    }

    let mut rest = input;
    for expected in literal.chars().filter(|c| !c.is_whitespace()) {
        let (after_space, _) = space0::<_, nom::error::Error<&str>>(rest).ok()?;
        let actual = after_space.chars().next()?;
        if !actual.eq_ignore_ascii_case(&expected) {
            return None;
        }
        rest = &after_space[actual.len_utf8()..];
    }
    let (rest, _) = space0::<_, nom::error::Error<&str>>(rest).ok()?;
    Some(rest)
}

impl AssemblyFormat {
    pub fn new(format: &str, config: &InstructionSetConfig) -> std::result::Result<Self, ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedSyntax {
            format: format.to_string(),
            reason,
        };

        let raw = match all_consuming(many0(raw_part))(format) {
            Ok((_, raw)) => raw,
            Err(err) => return Err(malformed(describe_nom_error(err))),
        };
        if raw.is_empty() {
            return Err(malformed("format is empty".to_string()));
        }

        let mut parts: Vec<Part> = raw
            .into_iter()
            .map(|part| match part {
                RawPart::Literal(text) => Part::Literal(text.to_string()),
                RawPart::Placeholder(OP_PLACEHOLDER) => Part::OpName,
                RawPart::Placeholder(name) if config.is_register_arg(name) => {
                    Part::Register(name.to_string())
                }
                RawPart::Placeholder(name) => Part::Value {
                    name: name.to_string(),
                    terminator: None,
                },
            })
            .collect();

        for i in 1..parts.len() {
            let adjacent = !matches!(parts[i - 1], Part::Literal(_))
                && !matches!(parts[i], Part::Literal(_));
            if adjacent {
                return Err(malformed(format!(
                    "part {} follows a placeholder without separating text",
                    i + 1
                )));
            }
        }

        for i in 0..parts.len().saturating_sub(1) {
            let next = match &parts[i + 1] {
                Part::Literal(text) => text.chars().find(|c| !c.is_whitespace()).unwrap_or(' '),
                _ => continue,
            };
            if let Part::Value { terminator, .. } = &mut parts[i] {
                *terminator = Some(next);
            }
        }

        Ok(Self {
            format: format.to_string(),
            parts,
            register_formats: config.register_formats.clone(),
            register_aliases: config
                .registers
                .iter()
                .map(|r| (r.alias.clone(), r.index))
                .collect(),
        })
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Operand names referenced by the format, excluding `:op`
    pub fn placeholders(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Register(name) | Part::Value { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn matches(&self, text: &str, names: &[String]) -> bool {
        self.parse(text, names).is_some()
    }

    /// Match `text` trying each candidate operation name in turn. Returns the
    /// name that matched together with the extracted operands.
    pub fn parse(&self, text: &str, names: &[String]) -> Option<(String, Bindings)> {
        names
            .iter()
            .find_map(|name| self.parse_as(text, name).map(|b| (name.clone(), b)))
    }

    fn parse_as(&self, text: &str, op: &str) -> Option<Bindings> {
        let mut rest = text.trim();
        let mut bindings = Bindings::new();

        for part in &self.parts {
            rest = match part {
                Part::Literal(literal) => match_literal(literal, rest)?,
                Part::OpName => {
                    let (rest, _) = tag_no_case::<_, _, nom::error::Error<&str>>(op)(rest).ok()?;
                    rest
                }
                Part::Register(role) => {
                    let (rest, index) = self.match_register(rest)?;
                    bindings.set(role.as_str(), index);
                    rest
                }
                Part::Value {
                    name,
                    terminator: None,
                } => {
                    let (rest, token) = numeric_token(rest).ok()?;
                    bindings.set(name.as_str(), parse_literal(token)?);
                    rest
                }
                Part::Value {
                    name,
                    terminator: Some(end),
                } => {
                    let end = *end;
                    let (rest, token) = take_till1::<_, _, nom::error::Error<&str>>(|c: char| {
                        c == end || (end.is_whitespace() && c.is_whitespace())
                    })(rest)
                    .ok()?;
                    bindings.set(name.as_str(), parse_literal(token.trim())?);
                    rest
                }
            };
        }

        rest.trim().is_empty().then_some(bindings)
    }

    fn match_register<'a>(&self, input: &'a str) -> Option<(&'a str, Value)> {
        for form in &self.register_formats {
            let parsed: IResult<&str, &str> = preceded(
                tag_no_case(form.prefix.as_str()),
                nom::sequence::terminated(digit1, tag_no_case(form.suffix.as_str())),
            )(input);
            if let Ok((rest, digits)) = parsed {
                if let Ok(index) = digits.parse::<Value>() {
                    return Some((rest, index));
                }
            }
        }

        self.register_aliases.iter().find_map(|(alias, index)| {
            let (rest, _) = tag_no_case::<_, _, nom::error::Error<&str>>(alias.as_str())(input).ok()?;
            let boundary = rest
                .chars()
                .next()
                .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
            boundary.then_some((rest, *index as Value))
        })
    }

    fn register_text(&self, index: Value) -> String {
        match self.register_formats.first() {
            Some(form) => format!("{}{}{}", form.prefix, index, form.suffix),
            None => format!("R{index}"),
        }
    }

    /// Canonical text for `bindings`, using `name` for `:op`.
    pub fn render(&self, name: &str, bindings: &Bindings) -> Result<String> {
        let lookup = |var: &str| {
            bindings
                .get(var)
                .ok_or_else(|| IsaError::unbound(name, var))
        };

        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::OpName => out.push_str(name),
                Part::Register(role) => out.push_str(&self.register_text(lookup(role.as_str())?)),
                Part::Value { name: var, .. } => out.push_str(&lookup(var.as_str())?.to_string()),
            }
        }
        Ok(out)
    }
}
