//! AST nodes.
//!
//! A closed variant set, each carrying a [`Span`]. Kept as one enum in a
//! single module rather than one type per file: the grammar is small
//! enough that splitting it up would scatter it without adding clarity.

use std::rc::Rc;

use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Plus,
    Neg,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Or,
    And,
    Xor,
    BitOr,
    BitAnd,
    BitXor,
}

/// One call argument, tagged with whether it is spread (`*expr`).
#[derive(Debug, Clone)]
pub struct Arg {
    pub value: Node,
    pub spread: bool,
}

/// Parameter declared in a `def`/`class`. `optional` marks params declared
/// with a trailing `?`.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct IfCase {
    pub condition: Node,
    pub body: Node,
}

#[derive(Debug, Clone)]
pub struct CompareLink {
    pub op: CompareOp,
    pub rhs: Node,
}

/// `Node` is the closed AST variant set, each variant carrying its own
/// [`Span`] via the shared `span` field below.
#[derive(Debug, Clone)]
pub enum NodeKind {
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    ListLit(Vec<Arg>),
    /// `mantissa * 10^exponent`.
    NumE { mantissa: Box<Node>, exponent: i64 },

    /// `chain[0]` is looked up by scope lookup; `chain[1..]` are attribute
    /// accesses on the previous value (the `?` operator).
    VarAccess { chain: Vec<String> },
    VarAssign { targets: Vec<Node>, op: AssignOp, values: Vec<Node> },
    VarDelete { name: String },

    BinOp { op: BinOpKind, left: Box<Node>, right: Box<Node> },
    CompareChain { first: Box<Node>, rest: Vec<CompareLink> },
    UnaryOp { op: UnaryOpKind, operand: Box<Node> },

    If { cases: Vec<IfCase>, else_body: Option<Box<Node>> },
    Assert { condition: Box<Node>, message: Option<Box<Node>> },
    For {
        name: String,
        start: Box<Node>,
        end: Box<Node>,
        step: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForIn { name: String, iterable: Box<Node>, body: Box<Node> },
    While { condition: Box<Node>, body: Box<Node> },
    DoWhile { body: Box<Node>, condition: Box<Node> },
    Break,
    Continue,
    Return(Option<Box<Node>>),

    FuncDef {
        name: Option<String>,
        params: Vec<Param>,
        body: Box<Node>,
        auto_return: bool,
    },
    ClassDef {
        name: Option<String>,
        parent: Option<String>,
        body: Box<Node>,
        auto_return: bool,
    },
    Call { target: Box<Node>, args: Vec<Arg> },

    Import { path: Vec<String>, alias: Option<String> },
    Export { expr: Box<Node>, is_ident: bool, alias: Option<String> },

    Write {
        expr: Box<Node>,
        file: Box<Node>,
        overwrite: bool,
        line: Option<LineSelector>,
    },
    Read {
        file: Box<Node>,
        target: Option<String>,
        line: LineSelector,
    },
    DollarPrint(String),

    /// A sequence of statements; also used for `def`/`if`/loop bodies.
    Block(Vec<Node>),

    Empty,
}

#[derive(Debug, Clone)]
pub enum LineSelector {
    All,
    Line(Box<Node>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Rc<NodeKind>,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Node {
        Node { kind: Rc::new(kind), span }
    }
}
