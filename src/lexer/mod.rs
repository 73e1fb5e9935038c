//! Lexer.
//!
//! A single-pass, deterministic state machine turning source text into a
//! `Vec<Token>` terminated by `Eof`: a `Peekable<Chars>` plus line/col
//! bookkeeping, returning `Result` rather than panicking on a bad
//! character.

mod token;

pub use token::*;

use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use once_cell::sync::Lazy;

use crate::error::{ErrorKind, NougaroError};
use crate::source::{Position, Source, Span};

/// Multi-character operators, ordered so longer candidates (`>>=`) are
/// tried before their shorter prefixes (`>>`). Built once via
/// `once_cell::sync::Lazy`.
static OPERATORS: Lazy<Vec<(&'static str, TokenKind)>> = Lazy::new(|| {
    use TokenKind::*;
    let mut ops = vec![
        ("!>>", ToAndOverwrite),
        ("//=", FloorDivEq),
        ("||=", OrEq),
        ("&&=", AndEq),
        ("^^^=", XorEq),
        ("^^=", BitwiseXorEq),
        ("===", EeEq),
        ("<==", LtEq2),
        (">==", GtEq2),
        ("<<=", LtLtEq),
        (">>=", GtGtEq),
        ("+=", PlusEq),
        ("-=", MinusEq),
        ("*=", MultEq),
        ("/=", DivEq),
        ("^=", PowEq),
        ("%=", PercEq),
        ("|=", BitwiseOrEq),
        ("&=", BitwiseAndEq),
        ("==", Ee),
        ("!=", Ne),
        ("<=", Lte),
        (">=", Gte),
        ("//", FloorDiv),
        (">>", To),
        ("->", Arrow),
        ("^^", BitwiseXor),
        ("+", Plus),
        ("-", Minus),
        ("*", Mul),
        ("/", Div),
        ("^", Pow),
        ("%", Perc),
        ("=", Eq),
        ("|", BitwiseOr),
        ("&", BitwiseAnd),
        ("~", BitwiseNot),
        ("<", Lt),
        (">", Gt),
        ("$", Dollar),
        ("(", LParen),
        (")", RParen),
        ("[", LSquare),
        ("]", RSquare),
        (",", Comma),
        ("?", Interrogative),
    ];
    // sort longest-first so the lexer always takes the maximal munch
    ops.sort_by_key(|(lexeme, _)| std::cmp::Reverse(lexeme.len()));
    ops
});

pub type LexResult<T> = Result<T, NougaroError>;

pub struct Lexer<'a> {
    source: Rc<Source>,
    chars: Peekable<Chars<'a>>,
    pos: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(source: Rc<Source>, text: &'a str) -> Lexer<'a> {
        Lexer {
            pos: Position::start(source.clone()),
            source,
            chars: text.chars().peekable(),
        }
    }

    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments(&mut tokens)?;
            let Some(&ch) = self.chars.peek() else {
                let p = self.pos.clone();
                tokens.push(Token::new(TokenKind::Eof, Payload::None, Span::new(p.clone(), p)));
                break;
            };

            if ch.is_ascii_digit() {
                tokens.extend(self.lex_number()?);
            } else if ch == '_' || ch.is_alphabetic() {
                tokens.push(self.lex_identifier());
            } else if ch == '\'' || ch == '"' {
                tokens.push(self.lex_string(ch)?);
            } else {
                tokens.push(self.lex_operator()?);
            }
        }
        Ok(tokens)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.pos = self.pos.advance(ch);
        Some(ch)
    }

    /// Skip spaces/tabs and `#`-comments; coalesce runs of `\n`/`;` into a
    /// single `Newline` token.
    fn skip_whitespace_and_comments(&mut self, tokens: &mut Vec<Token>) -> LexResult<()> {
        let mut pending_newline: Option<Span> = None;
        loop {
            match self.chars.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('#') => {
                    while !matches!(self.chars.peek(), Some('\n') | None) {
                        self.advance();
                    }
                }
                Some('\n') | Some(';') => {
                    let start = self.pos.clone();
                    self.advance();
                    let end = self.pos.clone();
                    pending_newline = Some(Span::new(start, end));
                }
                _ => break,
            }
        }
        if let Some(span) = pending_newline {
            tokens.push(Token::new(TokenKind::Newline, Payload::None, span));
        }
        Ok(())
    }

    /// Digits, optional `.digits`, optional scientific-notation suffix
    /// (`e`/`E` then an `ExpMarker` token consumed by the parser to build
    /// `NumE`).
    fn lex_number(&mut self) -> LexResult<Vec<Token>> {
        let start = self.pos.clone();
        let mut text = String::new();
        let mut is_float = false;

        while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
            text.push(self.advance().unwrap());
        }
        if self.chars.peek() == Some(&'.') {
            is_float = true;
            text.push(self.advance().unwrap());
            while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(self.advance().unwrap());
            }
        }

        let mantissa_end = self.pos.clone();
        let mantissa_span = Span::new(start, mantissa_end);
        let mantissa = if is_float {
            let value: f64 = text.parse().map_err(|_| {
                NougaroError::new(
                    ErrorKind::InvalidSyntax,
                    mantissa_span.clone(),
                    format!("invalid float literal '{text}'"),
                )
            })?;
            Token::new(TokenKind::Float, Payload::Float(value), mantissa_span)
        } else {
            let value: i64 = text.parse().map_err(|_| {
                NougaroError::new(
                    ErrorKind::InvalidSyntax,
                    mantissa_span.clone(),
                    format!("invalid int literal '{text}'"),
                )
            })?;
            Token::new(TokenKind::Int, Payload::Int(value), mantissa_span)
        };

        // scientific notation: 'e'/'E' must directly follow, with no
        // intervening whitespace.
        if matches!(self.chars.peek(), Some('e') | Some('E')) {
            let exp_start = self.pos.clone();
            self.advance();
            let mut sign = 1i64;
            if matches!(self.chars.peek(), Some('+') | Some('-')) {
                if self.chars.peek() == Some(&'-') {
                    sign = -1;
                }
                self.advance();
            }
            let mut digits = String::new();
            while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit()) {
                digits.push(self.advance().unwrap());
            }
            let exp_span = Span::new(exp_start.clone(), self.pos.clone());
            if digits.is_empty() {
                return Err(NougaroError::new(
                    ErrorKind::InvalidSyntax,
                    exp_span,
                    "expected digits after exponent marker",
                ));
            }
            let exponent: i64 = digits.parse().map_err(|_| {
                NougaroError::new(ErrorKind::InvalidSyntax, exp_span.clone(), "invalid exponent")
            })?;
            let exp_token = Token::new(TokenKind::ExpMarker, Payload::Int(sign * exponent), exp_span);
            return Ok(vec![mantissa, exp_token]);
        }

        Ok(vec![mantissa])
    }

    fn lex_identifier(&mut self) -> Token {
        let start = self.pos.clone();
        let mut text = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_') {
            text.push(self.advance().unwrap());
        }
        let span = Span::new(start, self.pos.clone());
        if KEYWORDS.contains(&text.as_str()) {
            Token::new(TokenKind::Keyword, Payload::Text(text), span)
        } else {
            Token::new(TokenKind::Identifier, Payload::Text(text), span)
        }
    }

    fn lex_string(&mut self, quote: char) -> LexResult<Token> {
        let start = self.pos.clone();
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(NougaroError::new(
                        ErrorKind::ExpectedChar,
                        Span::new(start, self.pos.clone()),
                        format!("expected '{quote}'"),
                    ))
                }
                Some(c) if c == quote => break,
                Some('\\') => {
                    let escaped = self.advance().ok_or_else(|| {
                        NougaroError::new(
                            ErrorKind::ExpectedChar,
                            Span::new(start.clone(), self.pos.clone()),
                            "expected escape sequence",
                        )
                    })?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        '\'' => value.push('\''),
                        'x' => {
                            let mut hex = String::new();
                            for _ in 0..2 {
                                hex.push(self.advance().ok_or_else(|| {
                                    NougaroError::new(
                                        ErrorKind::ExpectedChar,
                                        Span::new(start.clone(), self.pos.clone()),
                                        "expected two hex digits after \\x",
                                    )
                                })?);
                            }
                            let byte = u8::from_str_radix(&hex, 16).map_err(|_| {
                                NougaroError::new(
                                    ErrorKind::InvalidSyntax,
                                    Span::new(start.clone(), self.pos.clone()),
                                    format!("invalid hex escape '\\x{hex}'"),
                                )
                            })?;
                            value.push(byte as char);
                        }
                        other => {
                            return Err(NougaroError::new(
                                ErrorKind::InvalidSyntax,
                                Span::new(start.clone(), self.pos.clone()),
                                format!("unknown escape sequence '\\{other}'"),
                            ))
                        }
                    }
                }
                Some(c) => value.push(c),
            }
        }
        let span = Span::new(start, self.pos.clone());
        Ok(Token::new(TokenKind::String, Payload::Text(value), span))
    }

    fn lex_operator(&mut self) -> LexResult<Token> {
        let start = self.pos.clone();
        let rest: String = self.chars.clone().take(4).collect();
        for (lexeme, kind) in OPERATORS.iter() {
            if rest.starts_with(lexeme) {
                for _ in 0..lexeme.chars().count() {
                    self.advance();
                }
                let span = Span::new(start, self.pos.clone());
                return Ok(Token::new(*kind, Payload::None, span));
            }
        }
        let bad = self.advance().unwrap_or('\0');
        Err(NougaroError::new(
            ErrorKind::InvalidSyntax,
            Span::new(start.clone(), self.pos.clone()),
            format!("illegal character '{bad}'"),
        ))
    }
}

pub fn tokenize(source: Rc<Source>) -> LexResult<Vec<Token>> {
    let text = source.text.clone();
    Lexer::new(source, &text).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<TokenKind> {
        let source = Source::new("<test>", src);
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_arithmetic() {
        assert_eq!(
            toks("1 + 2 * 3"),
            vec![TokenKind::Int, TokenKind::Plus, TokenKind::Int, TokenKind::Mul, TokenKind::Int, TokenKind::Eof]
        );
    }

    #[test]
    fn coalesces_newlines() {
        assert_eq!(
            toks("1\n\n\n2"),
            vec![TokenKind::Int, TokenKind::Newline, TokenKind::Int, TokenKind::Eof]
        );
    }

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(toks("!>>"), vec![TokenKind::ToAndOverwrite, TokenKind::Eof]);
        assert_eq!(toks(">>="), vec![TokenKind::GtGtEq, TokenKind::Eof]);
        assert_eq!(toks(">>"), vec![TokenKind::To, TokenKind::Eof]);
    }

    #[test]
    fn keyword_vs_identifier() {
        assert_eq!(toks("var"), vec![TokenKind::Keyword, TokenKind::Eof]);
        assert_eq!(toks("variable"), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn string_escapes() {
        let source = Source::new("<test>", r#""a\nb\x41""#);
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].text(), "a\nbA");
    }

    #[test]
    fn unterminated_string_errors() {
        let source = Source::new("<test>", "\"abc");
        assert!(tokenize(source).is_err());
    }

    #[test]
    fn comment_to_end_of_line() {
        assert_eq!(toks("1 # comment\n2"), vec![TokenKind::Int, TokenKind::Newline, TokenKind::Int, TokenKind::Eof]);
    }
}
