//! # Lexer for assembly source lines

use logos::Logos;

/// Tokens of one source line. Operand syntax is owned by the instruction
/// set, so the assembler only uses these to find directives, labels and
/// label references.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    /// Operation names, labels, register aliases
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_.]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// Decimal number
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse().ok())]
    Number(i64),

    /// Hexadecimal number
    #[regex(r"-?0[xX][0-9a-fA-F]+", |lex| {
        let text = lex.slice();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, &rest[2..]),
            None => (false, &text[2..]),
        };
        i64::from_str_radix(digits, 16).ok().map(|v| if negative { -v } else { v })
    })]
    Hex(i64),

    /// Directive (.data, .text)
    #[regex(r"\.[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Directive(String),

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"\n")]
    Newline,
}

/// Tokens of `text` with their byte spans; unrecognised characters are
/// dropped.
pub fn tokenize(text: &str) -> Vec<(Token, std::ops::Range<usize>)> {
    Token::lexer(text)
        .spanned()
        .filter_map(|(token, span)| token.ok().map(|t| (t, span)))
        .collect()
}

/// Label name if `text` is exactly `name:`
pub fn label_definition(text: &str) -> Option<String> {
    match tokenize(text).as_slice() {
        [(Token::Identifier(name), _), (Token::Colon, _)] => Some(name.clone()),
        _ => None,
    }
}
