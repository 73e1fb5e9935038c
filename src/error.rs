//! Error model.
//!
//! `NougaroError` is a structured error: kind, span, message and a
//! context-chain snapshot of the call stack at the point of failure. Its
//! `Display` impl reproduces a source excerpt with a caret line, rendered by
//! hand rather than through a derive-macro error crate.

use std::fmt;

use crate::source::Span;

/// Closed error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSyntax,
    ExpectedChar,
    RtName,
    RtAttribute,
    RtType,
    RtArithmetic,
    RtIndex,
    RtAssertion,
    RunTime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidSyntax => "InvalidSyntaxError",
            ErrorKind::ExpectedChar => "ExpectedCharError",
            ErrorKind::RtName => "RTNameError",
            ErrorKind::RtAttribute => "RTAttributeError",
            ErrorKind::RtType => "RTTypeError",
            ErrorKind::RtArithmetic => "RTArithmeticError",
            ErrorKind::RtIndex => "RTIndexError",
            ErrorKind::RtAssertion => "RTAssertionError",
            ErrorKind::RunTime => "RunTimeError",
        };
        f.write_str(s)
    }
}

/// One frame of the lexical call stack, captured for display when an error
/// crosses a function/module boundary ("In `<name>`, file X, line Y").
#[derive(Debug, Clone)]
pub struct ContextFrame {
    pub display_name: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct NougaroError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub context_chain: Vec<ContextFrame>,
}

impl NougaroError {
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> NougaroError {
        NougaroError {
            kind,
            span,
            message: message.into(),
            context_chain: Vec::new(),
        }
    }

    pub fn with_context(mut self, context_chain: Vec<ContextFrame>) -> NougaroError {
        self.context_chain = context_chain;
        self
    }

    /// Appends one frame as an error unwinds through a call boundary.
    /// Called innermost-first, so the chain reads top frame first, same
    /// order a traceback is printed in.
    pub fn push_frame(mut self, frame: ContextFrame) -> NougaroError {
        self.context_chain.push(frame);
        self
    }
}

impl fmt::Display for NougaroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.context_chain {
            writeln!(f, "In {}, file {}, line {}", frame.display_name, frame.file, frame.line)?;
        }

        let start = &self.span.start;
        let end = &self.span.end;
        let line_str = start.source.line(start.line);

        let caret_len = if end.line == start.line && end.col > start.col {
            end.col - start.col
        } else {
            1
        };

        writeln!(f, "File {}, line {}", start.source.name, start.line)?;
        writeln!(f, "    {line_str}")?;
        writeln!(
            f,
            "    {pad}{carets}",
            pad = " ".repeat(start.col.saturating_sub(1)),
            carets = "^".repeat(caret_len.max(1))
        )?;
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for NougaroError {}

pub type NougaroResult<T> = Result<T, NougaroError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Position, Source};

    fn dummy_span() -> Span {
        let source = Source::new("<test>", "x");
        let pos = Position::start(source);
        Span::new(pos.clone(), pos)
    }

    #[test]
    fn context_chain_renders_innermost_frame_first() {
        let err = NougaroError::new(ErrorKind::RtArithmetic, dummy_span(), "division by zero")
            .push_frame(ContextFrame { display_name: "function inner".into(), file: "<test>".into(), line: 2 })
            .push_frame(ContextFrame { display_name: "function outer".into(), file: "<test>".into(), line: 5 });
        let rendered = err.to_string();
        let inner_pos = rendered.find("In function inner").unwrap();
        let outer_pos = rendered.find("In function outer").unwrap();
        assert!(inner_pos < outer_pos);
    }
}
