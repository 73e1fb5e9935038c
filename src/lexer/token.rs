//! Token & Token Kinds.
//!
//! `TokenKind` is the closed set of lexical categories; `Token` pairs a
//! kind with an optional payload (numeric value or interned text) and a
//! span.

use std::fmt;

use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Newline,
    Int,
    Float,
    String,
    Identifier,
    Keyword,

    Plus,
    Minus,
    Mul,
    Div,
    Pow,
    Perc,
    FloorDiv,

    To,
    ToAndOverwrite,

    Eq,
    PlusEq,
    MinusEq,
    MultEq,
    DivEq,
    PowEq,
    PercEq,
    FloorDivEq,
    OrEq,
    AndEq,
    XorEq,
    BitwiseOrEq,
    BitwiseAndEq,
    BitwiseXorEq,
    EeEq,
    LtEq2,
    GtEq2,
    LtLtEq,
    GtGtEq,

    BitwiseOr,
    BitwiseAnd,
    BitwiseXor,
    BitwiseNot,

    Ee,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,

    RParen,
    LParen,
    RSquare,
    LSquare,

    Comma,
    Arrow,
    Interrogative,

    /// Exponent marker from scientific-notation number literals (`1e10`);
    /// always immediately follows an `Int`/`Float` token with no
    /// intervening whitespace.
    ExpMarker,

    /// `$name` print shorthand; see DESIGN.md for why this token exists
    /// alongside the rest of the operator table.
    Dollar,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Newline => "new line",
            Int => "int",
            Float => "float",
            String => "str",
            Identifier => "identifier",
            Keyword => "keyword",
            Plus => "+",
            Minus => "-",
            Mul => "*",
            Div => "/",
            Pow => "^",
            Perc => "%",
            FloorDiv => "//",
            To => ">>",
            ToAndOverwrite => "!>>",
            Eq => "=",
            PlusEq => "+=",
            MinusEq => "-=",
            MultEq => "*=",
            DivEq => "/=",
            PowEq => "^=",
            PercEq => "%=",
            FloorDivEq => "//=",
            OrEq => "||=",
            AndEq => "&&=",
            XorEq => "^^^=",
            BitwiseOrEq => "|=",
            BitwiseAndEq => "&=",
            BitwiseXorEq => "^^=",
            EeEq => "===",
            LtEq2 => "<==",
            GtEq2 => ">==",
            LtLtEq => "<<=",
            GtGtEq => ">>=",
            BitwiseOr => "|",
            BitwiseAnd => "&",
            BitwiseXor => "^^",
            BitwiseNot => "~",
            Ee => "==",
            Ne => "!=",
            Lt => "<",
            Gt => ">",
            Lte => "<=",
            Gte => ">=",
            RParen => ")",
            LParen => "(",
            RSquare => "]",
            LSquare => "[",
            Comma => ",",
            Arrow => "->",
            Interrogative => "?",
            ExpMarker => "e",
            Dollar => "$",
            Eof => "end of file",
        };
        f.write_str(s)
    }
}

/// Payload carried by tokens that need one (numbers, identifiers, strings,
/// keywords).
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Int(i64),
    Float(f64),
    Text(String),
    None,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub payload: Payload,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, payload: Payload, span: Span) -> Token {
        Token { kind, payload, span }
    }

    pub fn text(&self) -> &str {
        match &self.payload {
            Payload::Text(s) => s.as_str(),
            _ => "",
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text() == word
    }
}

/// Tokens compare by kind plus payload, ignoring position.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.payload == other.payload
    }
}

pub const KEYWORDS: &[&str] = &[
    "var", "del", "end", "and", "or", "not", "xor", "if", "then", "elif", "else", "in", "for",
    "to", "step", "while", "do", "loop", "break", "continue", "def", "return", "import", "write",
    "read", "assert", "class", "export", "as", "from", "last", "all",
];
