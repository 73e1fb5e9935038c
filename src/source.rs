//! Source text ownership and position tracking.
//!
//! A [`Source`] owns the full text of one file (or REPL line) and is shared
//! read-only by every [`Position`] that points into it. Line, column and
//! absolute offset are all tracked so error rendering can draw a caret
//! under the exact span.

use std::fmt;
use std::rc::Rc;

/// The full text of a single compilation unit, plus a display name
/// (file path, or `"<stdin>"` for REPL input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Rc<Source> {
        Rc::new(Source {
            name: name.into(),
            text: text.into(),
        })
    }

    /// 1-based source line, or `""` if out of range.
    pub fn line(&self, line_no: usize) -> &str {
        self.text.lines().nth(line_no.saturating_sub(1)).unwrap_or("")
    }
}

/// An immutable point in a [`Source`]: absolute byte offset plus the derived
/// line/column, shared by reference so cloning a position never copies the
/// source text itself.
#[derive(Debug, Clone)]
pub struct Position {
    pub source: Rc<Source>,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn start(source: Rc<Source>) -> Position {
        Position {
            source,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    /// Advance past `ch`, returning the new position. Used by the lexer as
    /// it consumes characters one at a time.
    pub fn advance(&self, ch: char) -> Position {
        if ch == '\n' {
            Position {
                source: self.source.clone(),
                offset: self.offset + ch.len_utf8(),
                line: self.line + 1,
                col: 1,
            }
        } else {
            Position {
                source: self.source.clone(),
                offset: self.offset + ch.len_utf8(),
                line: self.line,
                col: self.col + 1,
            }
        }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source) && self.offset == other.offset
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source.name, self.line, self.col)
    }
}

/// A half-open `[start, end)` span over one [`Source`], carried by every
/// token and AST node.
#[derive(Debug, Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Span {
        Span { start, end }
    }

    /// Merge two spans that belong to the same source into the span that
    /// covers both, e.g. combining a node's first and last child.
    pub fn merge(&self, other: &Span) -> Span {
        Span::new(self.start.clone(), other.end.clone())
    }
}
