//! Parser.
//!
//! Recursive descent with explicit precedence climbing for the arithmetic
//! and comparison layers. Error rendering goes through the shared
//! [`NougaroError`] so the parser and the evaluator report failures
//! identically.

pub mod ast;

use crate::error::{ErrorKind, NougaroError};
use crate::lexer::{Payload, Token, TokenKind};
use crate::source::{Position, Span};

use ast::*;

pub type ParseResult<T> = Result<T, NougaroError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, pos: 0 }
    }

    /// `program := NEWLINE* (statement (NEWLINE+ statement)*)? NEWLINE* EOF`
    pub fn parse_program(mut self) -> ParseResult<Node> {
        let start = self.current().span.start.clone();
        self.skip_newlines();

        if self.check(TokenKind::Eof) {
            let end = self.current().span.end.clone();
            return Ok(Node::new(NodeKind::Empty, Span::new(start, end)));
        }

        let mut statements = vec![self.statement()?];
        loop {
            self.skip_newlines();
            if self.check(TokenKind::Eof) {
                break;
            }
            statements.push(self.statement()?);
        }
        let end = self.current().span.end.clone();
        Ok(Node::new(NodeKind::Block(statements), Span::new(start, end)))
    }

    // ---- token stream helpers ----

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn check_keyword(&self, word: &str) -> bool {
        self.current().is_keyword(word)
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected '{kind}', found '{}'", self.current().kind)))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> ParseResult<Token> {
        if self.check_keyword(word) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected '{word}'")))
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.check_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> NougaroError {
        NougaroError::new(ErrorKind::InvalidSyntax, self.current().span.clone(), message.into())
    }

    fn expect_identifier(&mut self) -> ParseResult<(String, Span)> {
        if self.check(TokenKind::Identifier) {
            let tok = self.advance();
            Ok((tok.text().to_string(), tok.span))
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn prev_end(&self) -> Position {
        self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)].span.end.clone()
    }

    // ---- statement ----

    /// `statement := 'return' expr? | 'break' | 'continue' | 'import' ... | 'export' ... | expr`
    fn statement(&mut self) -> ParseResult<Node> {
        let start = self.current().span.start.clone();

        if self.eat_keyword("return") {
            if self.at_statement_end() {
                let end = self.prev_end();
                return Ok(Node::new(NodeKind::Return(None), Span::new(start, end)));
            }
            let expr = self.expr()?;
            let span = Span::new(start, expr.span.end.clone());
            return Ok(Node::new(NodeKind::Return(Some(Box::new(expr))), span));
        }
        if self.eat_keyword("break") {
            let end = self.prev_end();
            return Ok(Node::new(NodeKind::Break, Span::new(start, end)));
        }
        if self.eat_keyword("continue") {
            let end = self.prev_end();
            return Ok(Node::new(NodeKind::Continue, Span::new(start, end)));
        }
        if self.check_keyword("import") {
            return self.import_stmt();
        }
        if self.check_keyword("export") {
            return self.export_stmt();
        }
        self.expr()
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Newline | TokenKind::Eof)
            || self.check_keyword("end")
            || self.check_keyword("else")
            || self.check_keyword("elif")
    }

    fn import_stmt(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'import'
        let (first, _) = self.expect_identifier()?;
        let mut path = vec![first];
        while self.eat(TokenKind::Interrogative) {
            let (part, _) = self.expect_identifier()?;
            path.push(part);
        }
        let mut end = self.prev_end();
        let mut alias = None;
        if self.eat_keyword("as") {
            let (name, span) = self.expect_identifier()?;
            alias = Some(name);
            end = span.end;
        }
        Ok(Node::new(NodeKind::Import { path, alias }, Span::new(start, end)))
    }

    fn export_stmt(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'export'
        let is_ident = self.check(TokenKind::Identifier);
        let expr = self.expr()?;
        let mut alias = None;
        let mut end = expr.span.end.clone();
        if self.eat_keyword("as") {
            let (name, span) = self.expect_identifier()?;
            alias = Some(name);
            end = span.end;
        }
        Ok(Node::new(
            NodeKind::Export { expr: Box::new(expr), is_ident, alias },
            Span::new(start, end),
        ))
    }

    // ---- expr ----

    /// `expr := 'var' ... | 'del' ident | 'write' ... | 'read' ... | 'assert' ... | logic-expr`
    fn expr(&mut self) -> ParseResult<Node> {
        if self.check_keyword("var") {
            return self.var_assign();
        }
        if self.check_keyword("del") {
            return self.var_delete();
        }
        if self.check_keyword("write") {
            return self.write_stmt();
        }
        if self.check_keyword("read") {
            return self.read_stmt();
        }
        if self.check_keyword("assert") {
            return self.assert_stmt();
        }
        self.logic_expr()
    }

    fn var_assign(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'var'
        let mut targets = vec![self.assign_target()?];
        while self.eat(TokenKind::Comma) {
            targets.push(self.assign_target()?);
        }

        let op = self.assign_op()?;

        let mut values = vec![self.expr()?];
        while self.eat(TokenKind::Comma) {
            values.push(self.expr()?);
        }
        let end = values.last().unwrap().span.end.clone();
        Ok(Node::new(NodeKind::VarAssign { targets, op, values }, Span::new(start, end)))
    }

    /// A target may be a bare name or an attribute chain (`self?x`), so an
    /// `__init__` body can set fields on the instance it was handed.
    fn assign_target(&mut self) -> ParseResult<Node> {
        let (first, span0) = self.expect_identifier()?;
        let mut chain = vec![first];
        let mut end = span0.end.clone();
        while self.eat(TokenKind::Interrogative) {
            let (part, span) = self.expect_identifier()?;
            chain.push(part);
            end = span.end;
        }
        Ok(Node::new(NodeKind::VarAccess { chain }, Span::new(span0.start, end)))
    }

    fn assign_op(&mut self) -> ParseResult<AssignOp> {
        use TokenKind::*;
        let kind = self.current().kind;
        let op = match kind {
            Eq => AssignOp::Assign,
            PlusEq => AssignOp::Add,
            MinusEq => AssignOp::Sub,
            MultEq => AssignOp::Mul,
            DivEq => AssignOp::Div,
            FloorDivEq => AssignOp::FloorDiv,
            PercEq => AssignOp::Mod,
            PowEq => AssignOp::Pow,
            OrEq => AssignOp::Or,
            AndEq => AssignOp::And,
            XorEq => AssignOp::Xor,
            BitwiseOrEq => AssignOp::BitOr,
            BitwiseAndEq => AssignOp::BitAnd,
            BitwiseXorEq => AssignOp::BitXor,
            _ => return Err(self.error("expected assignment operator")),
        };
        self.advance();
        Ok(op)
    }

    fn var_delete(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'del'
        let (name, span) = self.expect_identifier()?;
        Ok(Node::new(NodeKind::VarDelete { name }, Span::new(start, span.end)))
    }

    fn write_stmt(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'write'
        let expr = self.logic_expr()?;
        let overwrite = if self.eat(TokenKind::ToAndOverwrite) {
            true
        } else {
            self.expect(TokenKind::To)?;
            false
        };
        let file = self.logic_expr()?;
        let mut end = file.span.end.clone();
        let line = if self.eat_keyword("last") {
            end = self.prev_end();
            None
        } else if self.check(TokenKind::Int) {
            let tok = self.advance();
            end = tok.span.end.clone();
            let Payload::Int(n) = tok.payload else { unreachable!() };
            Some(LineSelector::Line(Box::new(Node::new(NodeKind::IntLit(n), tok.span))))
        } else {
            None
        };
        Ok(Node::new(
            NodeKind::Write { expr: Box::new(expr), file: Box::new(file), overwrite, line },
            Span::new(start, end),
        ))
    }

    fn read_stmt(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'read'
        let file = self.logic_expr()?;
        let mut end = file.span.end.clone();
        let mut target = None;
        if self.eat(TokenKind::To) {
            let (name, span) = self.expect_identifier()?;
            target = Some(name);
            end = span.end;
        }
        let line = if self.eat_keyword("all") {
            end = self.prev_end();
            LineSelector::All
        } else if self.check(TokenKind::Int) {
            let tok = self.advance();
            end = tok.span.end.clone();
            let Payload::Int(n) = tok.payload else { unreachable!() };
            LineSelector::Line(Box::new(Node::new(NodeKind::IntLit(n), tok.span)))
        } else {
            LineSelector::All
        };
        Ok(Node::new(NodeKind::Read { file: Box::new(file), target, line }, Span::new(start, end)))
    }

    fn assert_stmt(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'assert'
        let condition = self.logic_expr()?;
        let mut end = condition.span.end.clone();
        let message = if self.eat(TokenKind::Comma) {
            let m = self.logic_expr()?;
            end = m.span.end.clone();
            Some(Box::new(m))
        } else {
            None
        };
        Ok(Node::new(
            NodeKind::Assert { condition: Box::new(condition), message },
            Span::new(start, end),
        ))
    }

    /// `comp-expr (('and'|'or'|'xor') comp-expr)*`
    fn logic_expr(&mut self) -> ParseResult<Node> {
        let mut left = self.comp_expr()?;
        loop {
            let op = if self.check_keyword("and") {
                BinOpKind::And
            } else if self.check_keyword("or") {
                BinOpKind::Or
            } else if self.check_keyword("xor") {
                BinOpKind::Xor
            } else {
                break;
            };
            self.advance();
            let right = self.comp_expr()?;
            let span = left.span.merge(&right.span);
            left = Node::new(NodeKind::BinOp { op, left: Box::new(left), right: Box::new(right) }, span);
        }
        Ok(left)
    }

    /// `'not' comp-expr | arith-expr (CMP arith-expr)*`
    fn comp_expr(&mut self) -> ParseResult<Node> {
        if self.check_keyword("not") {
            let start = self.advance().span.start.clone();
            let operand = self.comp_expr()?;
            let span = Span::new(start, operand.span.end.clone());
            return Ok(Node::new(NodeKind::UnaryOp { op: UnaryOpKind::Not, operand: Box::new(operand) }, span));
        }

        let first = self.arith_expr()?;
        let mut rest = Vec::new();
        while let Some(op) = self.peek_compare_op() {
            self.advance();
            let rhs = self.arith_expr()?;
            rest.push(CompareLink { op, rhs });
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            let span = Span::new(first.span.start.clone(), rest.last().unwrap().rhs.span.end.clone());
            Ok(Node::new(NodeKind::CompareChain { first: Box::new(first), rest }, span))
        }
    }

    fn peek_compare_op(&self) -> Option<CompareOp> {
        use TokenKind::*;
        Some(match self.current().kind {
            Ee => CompareOp::Eq,
            Ne => CompareOp::Ne,
            Lt => CompareOp::Lt,
            Gt => CompareOp::Gt,
            Lte => CompareOp::Lte,
            Gte => CompareOp::Gte,
            _ => return None,
        })
    }

    /// `term (('+'|'-'|'|'|'&'|'^^') term)*`
    fn arith_expr(&mut self) -> ParseResult<Node> {
        let mut left = self.term()?;
        loop {
            use TokenKind::*;
            let op = match self.current().kind {
                Plus => BinOpKind::Add,
                Minus => BinOpKind::Sub,
                BitwiseOr => BinOpKind::BitOr,
                BitwiseAnd => BinOpKind::BitAnd,
                BitwiseXor => BinOpKind::BitXor,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            let span = left.span.merge(&right.span);
            left = Node::new(NodeKind::BinOp { op, left: Box::new(left), right: Box::new(right) }, span);
        }
        Ok(left)
    }

    /// `factor (('*'|'/'|'//'|'%') factor)*`
    fn term(&mut self) -> ParseResult<Node> {
        let mut left = self.factor()?;
        loop {
            use TokenKind::*;
            let op = match self.current().kind {
                Mul => BinOpKind::Mul,
                Div => BinOpKind::Div,
                FloorDiv => BinOpKind::FloorDiv,
                Perc => BinOpKind::Mod,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            let span = left.span.merge(&right.span);
            left = Node::new(NodeKind::BinOp { op, left: Box::new(left), right: Box::new(right) }, span);
        }
        Ok(left)
    }

    /// `('+'|'-'|'~') factor | power`
    fn factor(&mut self) -> ParseResult<Node> {
        use TokenKind::*;
        let op = match self.current().kind {
            Plus => Some(UnaryOpKind::Plus),
            Minus => Some(UnaryOpKind::Neg),
            BitwiseNot => Some(UnaryOpKind::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span.start.clone();
            let operand = self.factor()?;
            let span = Span::new(start, operand.span.end.clone());
            return Ok(Node::new(NodeKind::UnaryOp { op, operand: Box::new(operand) }, span));
        }
        self.power()
    }

    /// `atom ('^' factor)?`
    fn power(&mut self) -> ParseResult<Node> {
        let base = self.call()?;
        if self.eat(TokenKind::Pow) {
            let exponent = self.factor()?;
            let span = base.span.merge(&exponent.span);
            Ok(Node::new(
                NodeKind::BinOp { op: BinOpKind::Pow, left: Box::new(base), right: Box::new(exponent) },
                span,
            ))
        } else {
            Ok(base)
        }
    }

    /// `access ('(' arg-list? ')')*`
    fn call(&mut self) -> ParseResult<Node> {
        let mut node = self.access_or_atom()?;
        while self.check(TokenKind::LParen) {
            self.advance();
            let mut args = Vec::new();
            if !self.check(TokenKind::RParen) {
                args.push(self.call_arg()?);
                while self.eat(TokenKind::Comma) {
                    args.push(self.call_arg()?);
                }
            }
            let end_tok = self.expect(TokenKind::RParen)?;
            let span = Span::new(node.span.start.clone(), end_tok.span.end.clone());
            node = Node::new(NodeKind::Call { target: Box::new(node), args }, span);
        }
        Ok(node)
    }

    fn call_arg(&mut self) -> ParseResult<Arg> {
        let spread = self.eat(TokenKind::Mul);
        let value = self.logic_expr()?;
        Ok(Arg { value, spread })
    }

    /// `ident ('?' ident)*`, falling through to `atom` for everything else.
    fn access_or_atom(&mut self) -> ParseResult<Node> {
        if self.check(TokenKind::Identifier) {
            let (first, span0) = self.expect_identifier()?;
            let mut chain = vec![first];
            let mut end = span0.end;
            while self.eat(TokenKind::Interrogative) {
                let (part, span) = self.expect_identifier()?;
                chain.push(part);
                end = span.end;
            }
            return Ok(Node::new(NodeKind::VarAccess { chain }, Span::new(span0.start, end)));
        }
        self.atom()
    }

    /// `INT | FLOAT | STRING | '(' expr ')' | list | if | for | while | do
    ///  | 'def' fn-def | 'class' class-def | '$' IDENTIFIER`
    fn atom(&mut self) -> ParseResult<Node> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Int => {
                self.advance();
                let Payload::Int(n) = tok.payload else { unreachable!() };
                self.maybe_num_e(NodeKind::IntLit(n), tok.span)
            }
            TokenKind::Float => {
                self.advance();
                let Payload::Float(n) = tok.payload else { unreachable!() };
                self.maybe_num_e(NodeKind::FloatLit(n), tok.span)
            }
            TokenKind::String => {
                self.advance();
                Ok(Node::new(NodeKind::StringLit(tok.text().to_string()), tok.span))
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.expr()?;
                self.skip_newlines();
                let end_tok = self.expect(TokenKind::RParen)?;
                Ok(Node { kind: inner.kind, span: Span::new(tok.span.start, end_tok.span.end) })
            }
            TokenKind::LSquare => self.list_lit(),
            TokenKind::Dollar => {
                self.advance();
                let (name, span) = self.expect_identifier()?;
                Ok(Node::new(NodeKind::DollarPrint(name), Span::new(tok.span.start, span.end)))
            }
            TokenKind::Keyword if tok.text() == "if" => self.if_expr(),
            TokenKind::Keyword if tok.text() == "for" => self.for_expr(),
            TokenKind::Keyword if tok.text() == "while" => self.while_expr(),
            TokenKind::Keyword if tok.text() == "do" => self.do_while_expr(),
            TokenKind::Keyword if tok.text() == "def" => self.func_def(),
            TokenKind::Keyword if tok.text() == "class" => self.class_def(),
            _ => Err(self.error(format!("unexpected token '{}' while parsing expression", tok.kind))),
        }
    }

    /// If an `ExpMarker` token immediately follows (the lexer only ever
    /// emits it right after a mantissa with no intervening whitespace),
    /// fold into `NumE`; otherwise return the bare literal.
    fn maybe_num_e(&mut self, mantissa_kind: NodeKind, span: Span) -> ParseResult<Node> {
        if self.check(TokenKind::ExpMarker) {
            let tok = self.advance();
            let Payload::Int(exponent) = tok.payload else { unreachable!() };
            let mantissa = Node::new(mantissa_kind, span.clone());
            let full_span = Span::new(span.start, tok.span.end);
            Ok(Node::new(NodeKind::NumE { mantissa: Box::new(mantissa), exponent }, full_span))
        } else {
            Ok(Node::new(mantissa_kind, span))
        }
    }

    fn list_lit(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // '['
        self.skip_newlines();
        let mut elements = Vec::new();
        if !self.check(TokenKind::RSquare) {
            elements.push(self.call_arg()?);
            self.skip_newlines();
            while self.eat(TokenKind::Comma) {
                self.skip_newlines();
                elements.push(self.call_arg()?);
                self.skip_newlines();
            }
        }
        let end_tok = self.expect(TokenKind::RSquare)?;
        Ok(Node::new(NodeKind::ListLit(elements), Span::new(start, end_tok.span.end)))
    }

    /// `'if' expr 'then' body ('elif' expr 'then' body)* ('else' body)? 'end'?`
    /// The trailing `end` is only required for the multi-statement form;
    /// a single inline `then`/`else` expression needs none.
    fn if_expr(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'if'
        let mut cases = Vec::new();
        let mut condition = self.expr()?;
        loop {
            self.expect_keyword("then")?;
            let body = self.clause_body()?;
            cases.push(IfCase { condition, body });
            if self.eat_keyword("elif") {
                condition = self.expr()?;
                continue;
            }
            break;
        }
        let mut end = cases.last().unwrap().body.span.end.clone();
        let else_body = if self.eat_keyword("else") {
            let body = self.clause_body()?;
            end = body.span.end.clone();
            Some(Box::new(body))
        } else {
            None
        };
        if self.eat_keyword("end") {
            end = self.prev_end();
        }
        Ok(Node::new(NodeKind::If { cases, else_body }, Span::new(start, end)))
    }

    /// Parses either a single inline expression, or a `NEWLINE`-delimited
    /// run of statements up to (but not consuming) the next
    /// `elif`/`else`/`end` keyword.
    fn clause_body(&mut self) -> ParseResult<Node> {
        if self.check(TokenKind::Newline) {
            let start = self.current().span.start.clone();
            self.skip_newlines();
            let mut statements = Vec::new();
            while !self.check_keyword("elif")
                && !self.check_keyword("else")
                && !self.check_keyword("end")
                && !self.check_keyword("loop")
                && !self.check(TokenKind::Eof)
            {
                statements.push(self.statement()?);
                self.skip_newlines();
            }
            let end = statements
                .last()
                .map(|n| n.span.end.clone())
                .unwrap_or_else(|| self.current().span.start.clone());
            Ok(Node::new(NodeKind::Block(statements), Span::new(start, end)))
        } else {
            self.statement()
        }
    }

    fn for_expr(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'for'
        let (name, _) = self.expect_identifier()?;

        if self.eat_keyword("in") {
            let iterable = self.expr()?;
            self.expect_keyword("then")?;
            let body = self.clause_body()?;
            let mut end = body.span.end.clone();
            if self.eat_keyword("end") {
                end = self.prev_end();
            }
            return Ok(Node::new(
                NodeKind::ForIn { name, iterable: Box::new(iterable), body: Box::new(body) },
                Span::new(start, end),
            ));
        }

        self.expect(TokenKind::Eq)?;
        let from = self.expr()?;
        self.expect_keyword("to")?;
        let to = self.expr()?;
        let step = if self.eat_keyword("step") { Some(Box::new(self.expr()?)) } else { None };
        self.expect_keyword("then")?;
        let body = self.clause_body()?;
        let mut end = body.span.end.clone();
        if self.eat_keyword("end") {
            end = self.prev_end();
        }
        Ok(Node::new(
            NodeKind::For { name, start: Box::new(from), end: Box::new(to), step, body: Box::new(body) },
            Span::new(start, end),
        ))
    }

    fn while_expr(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'while'
        let condition = self.expr()?;
        self.expect_keyword("then")?;
        let body = self.clause_body()?;
        let mut end = body.span.end.clone();
        if self.eat_keyword("end") {
            end = self.prev_end();
        }
        Ok(Node::new(
            NodeKind::While { condition: Box::new(condition), body: Box::new(body) },
            Span::new(start, end),
        ))
    }

    fn do_while_expr(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'do'
        let body = self.clause_body()?;
        self.expect_keyword("loop")?;
        self.expect_keyword("while")?;
        let condition = self.expr()?;
        let end = condition.span.end.clone();
        Ok(Node::new(
            NodeKind::DoWhile { body: Box::new(body), condition: Box::new(condition) },
            Span::new(start, end),
        ))
    }

    /// `'def' IDENTIFIER? '(' params? ')' ('->' expr | NEWLINE statements 'end')`
    fn func_def(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'def'
        let name = if self.check(TokenKind::Identifier) {
            Some(self.expect_identifier()?.0)
        } else {
            None
        };
        self.expect(TokenKind::LParen)?;
        let params = self.param_list()?;
        self.expect(TokenKind::RParen)?;

        let (body, auto_return, end) = self.callable_body()?;
        Ok(Node::new(
            NodeKind::FuncDef { name, params, body: Box::new(body), auto_return },
            Span::new(start, end),
        ))
    }

    fn param_list(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(params);
        }
        params.push(self.param()?);
        while self.eat(TokenKind::Comma) {
            params.push(self.param()?);
        }
        Ok(params)
    }

    fn param(&mut self) -> ParseResult<Param> {
        let (name, _) = self.expect_identifier()?;
        let optional = self.eat(TokenKind::Interrogative);
        Ok(Param { name, optional })
    }

    /// `'->' expr` (auto-return) or `NEWLINE statements 'end'`.
    fn callable_body(&mut self) -> ParseResult<(Node, bool, Position)> {
        if self.eat(TokenKind::Arrow) {
            let expr = self.expr()?;
            let end = expr.span.end.clone();
            Ok((expr, true, end))
        } else {
            self.skip_newlines();
            let start = self.current().span.start.clone();
            let mut statements = Vec::new();
            while !self.check_keyword("end") && !self.check(TokenKind::Eof) {
                statements.push(self.statement()?);
                self.skip_newlines();
            }
            self.expect_keyword("end")?;
            let end = self.prev_end();
            Ok((Node::new(NodeKind::Block(statements), Span::new(start, end.clone())), false, end))
        }
    }

    /// `'class' IDENTIFIER? ('from' IDENTIFIER)? (NEWLINE statements 'end' | '->' expr)`
    fn class_def(&mut self) -> ParseResult<Node> {
        let start = self.advance().span.start.clone(); // 'class'
        let name = if self.check(TokenKind::Identifier) {
            Some(self.expect_identifier()?.0)
        } else {
            None
        };
        let parent = if self.eat_keyword("from") { Some(self.expect_identifier()?.0) } else { None };
        let (body, auto_return, end) = self.callable_body()?;
        Ok(Node::new(
            NodeKind::ClassDef { name, parent, body: Box::new(body), auto_return },
            Span::new(start, end),
        ))
    }
}

pub fn parse(tokens: Vec<Token>) -> ParseResult<Node> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::source::Source;

    fn parse_src(src: &str) -> Node {
        let source = Source::new("<test>", src);
        let tokens = tokenize(source).unwrap();
        parse(tokens).unwrap()
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let node = parse_src("2 + 3 * 4");
        let NodeKind::Block(stmts) = &*node.kind else { panic!() };
        let NodeKind::BinOp { op: BinOpKind::Add, right, .. } = &*stmts[0].kind else { panic!() };
        assert!(matches!(&*right.kind, NodeKind::BinOp { op: BinOpKind::Mul, .. }));
    }

    #[test]
    fn parses_compare_chain() {
        let node = parse_src("1 < 2 < 3");
        let NodeKind::Block(stmts) = &*node.kind else { panic!() };
        assert!(matches!(&*stmts[0].kind, NodeKind::CompareChain { rest, .. } if rest.len() == 1));
    }

    #[test]
    fn parses_var_multi_assign() {
        let node = parse_src("var a, b = 1, 2");
        let NodeKind::Block(stmts) = &*node.kind else { panic!() };
        let NodeKind::VarAssign { targets, values, .. } = &*stmts[0].kind else { panic!() };
        assert_eq!(targets.len(), 2);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn parses_function_def_auto_return() {
        let node = parse_src("def square(n) -> n * n");
        let NodeKind::Block(stmts) = &*node.kind else { panic!() };
        assert!(matches!(&*stmts[0].kind, NodeKind::FuncDef { auto_return: true, .. }));
    }

    #[test]
    fn parses_spread_call_arg() {
        let node = parse_src("f(*xs)");
        let NodeKind::Block(stmts) = &*node.kind else { panic!() };
        let NodeKind::Call { args, .. } = &*stmts[0].kind else { panic!() };
        assert!(args[0].spread);
    }

    #[test]
    fn parses_if_elif_else_block() {
        let node = parse_src("if a then\n  1\nelif b then\n  2\nelse\n  3\nend");
        let NodeKind::Block(stmts) = &*node.kind else { panic!() };
        let NodeKind::If { cases, else_body } = &*stmts[0].kind else { panic!() };
        assert_eq!(cases.len(), 2);
        assert!(else_body.is_some());
    }

    #[test]
    fn parses_for_range_with_step() {
        let node = parse_src("for i = 0 to 10 step 2 then i");
        let NodeKind::Block(stmts) = &*node.kind else { panic!() };
        assert!(matches!(&*stmts[0].kind, NodeKind::For { step: Some(_), .. }));
    }

    #[test]
    fn parses_dollar_print() {
        let node = parse_src("$x");
        let NodeKind::Block(stmts) = &*node.kind else { panic!() };
        assert!(matches!(&*stmts[0].kind, NodeKind::DollarPrint(name) if name == "x"));
    }

    #[test]
    fn totality_root_span_covers_source() {
        let source = Source::new("<test>", "1 + 1");
        let tokens = tokenize(source.clone()).unwrap();
        let node = parse(tokens).unwrap();
        assert_eq!(node.span.start.offset, 0);
        assert_eq!(node.span.end.offset, source.text.len());
    }
}
