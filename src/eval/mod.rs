//! Evaluator.
//!
//! Visits AST nodes under a [`ScopeRef`], returning an [`Rtr`]. Split by
//! concern across this module (expressions, variables, operators) and
//! sibling modules (`control` for loops/if/assert, `funcs` for
//! def/class/call, `io` for write/read/`$print`, `modules` for
//! import/export) rather than one large match.

pub mod arith;
mod control;
mod funcs;
mod io;
mod modules;

use std::rc::Rc;

use crate::context::{Scope, ScopeRef};
use crate::error::{ErrorKind, NougaroError};
use crate::loader::Loader;
use crate::parser::ast::{
    AssignOp, BinOpKind, CompareOp, Node, NodeKind, UnaryOpKind,
};
use crate::rtr::Rtr;
use crate::source::Span;
use crate::value::Value;
use crate::builtins::BUILTINS;

pub struct Evaluator {
    pub loader: Loader,
}

impl Evaluator {
    pub fn new(loader: Loader) -> Evaluator {
        Evaluator { loader }
    }

    /// Pre-binds constants, built-ins and module names into `scope` and
    /// marks them all `VARS_CANNOT_MODIFY`.
    pub fn prebind_constants(&self, scope: &ScopeRef) {
        let mut bind = |name: &str, value: Value| {
            scope.declare(name, value);
            scope.mark_protected(name);
        };

        bind("null", Value::None);
        bind("True", Value::Int(1));
        bind("False", Value::Int(0));
        bind("None", Value::None);
        bind("noug_version", Value::string(env!("CARGO_PKG_VERSION")));
        bind("os_name", Value::string(std::env::consts::OS));
        bind("os_release", Value::string(""));
        bind("os_version", Value::string(""));
        bind("answerToTheLifeTheUniverseAndEverything", Value::Int(42));

        for name in BUILTINS.keys() {
            scope.declare(*name, Value::Builtin(unsafe_clone_descriptor(name)));
            scope.mark_protected(*name);
        }

        scope.mark_protected("math");
    }

    pub fn visit(&self, node: &Node, scope: &ScopeRef) -> Rtr {
        match &*node.kind {
            NodeKind::Empty => Rtr::none(),
            NodeKind::Block(statements) => self.visit_block(statements, scope),

            NodeKind::IntLit(n) => Rtr::ok(Value::Int(*n)),
            NodeKind::FloatLit(n) => Rtr::ok(Value::Float(*n)),
            NodeKind::StringLit(s) => Rtr::ok(Value::string(s.clone())),
            NodeKind::NumE { mantissa, exponent } => self.visit_num_e(mantissa, *exponent, scope),
            NodeKind::ListLit(elements) => self.visit_list_lit(elements, scope, &node.span),

            NodeKind::VarAccess { chain } => self.visit_var_access(chain, scope, &node.span),
            NodeKind::VarAssign { targets, op, values } => {
                self.visit_var_assign(targets, *op, values, scope, &node.span)
            }
            NodeKind::VarDelete { name } => self.visit_var_delete(name, scope, &node.span),

            NodeKind::BinOp { op, left, right } => self.visit_bin_op(*op, left, right, scope),
            NodeKind::CompareChain { first, rest } => self.visit_compare_chain(first, rest, scope),
            NodeKind::UnaryOp { op, operand } => self.visit_unary_op(*op, operand, scope),

            NodeKind::If { cases, else_body } => self.visit_if(cases, else_body, scope),
            NodeKind::Assert { condition, message } => self.visit_assert(condition, message, scope, &node.span),
            NodeKind::For { name, start, end, step, body } => {
                self.visit_for(name, start, end, step.as_deref(), body, scope)
            }
            NodeKind::ForIn { name, iterable, body } => self.visit_for_in(name, iterable, body, scope),
            NodeKind::While { condition, body } => self.visit_while(condition, body, scope),
            NodeKind::DoWhile { body, condition } => self.visit_do_while(body, condition, scope),
            NodeKind::Break => Rtr::brk(),
            NodeKind::Continue => Rtr::cont(),
            NodeKind::Return(expr) => self.visit_return(expr.as_deref(), scope),

            NodeKind::FuncDef { name, params, body, auto_return } => {
                Rtr::ok(self.make_function(name.clone(), params, body, scope, *auto_return))
            }
            NodeKind::ClassDef { name, parent, body, auto_return } => {
                self.visit_class_def(name.as_deref(), parent.as_deref(), body, scope, *auto_return, &node.span)
            }
            NodeKind::Call { target, args } => self.visit_call(target, args, scope, &node.span),

            NodeKind::Import { path, alias } => self.visit_import(path, alias.as_deref(), scope, &node.span),
            NodeKind::Export { expr, is_ident, alias } => {
                self.visit_export(expr, *is_ident, alias.as_deref(), scope, &node.span)
            }

            NodeKind::Write { expr, file, overwrite, line } => {
                self.visit_write(expr, file, *overwrite, line.as_ref(), scope, &node.span)
            }
            NodeKind::Read { file, target, line } => {
                self.visit_read(file, target.as_deref(), line, scope, &node.span)
            }
            NodeKind::DollarPrint(name) => self.visit_dollar_print(name, scope, &node.span),
        }
    }

    fn visit_block(&self, statements: &[Node], scope: &ScopeRef) -> Rtr {
        let mut result = Rtr::none();
        for stmt in statements {
            let value = match result.register(self.visit(stmt, scope)) {
                Some(v) => v,
                None => return result,
            };
            result.value = Some(value);
        }
        result
    }

    fn visit_num_e(&self, mantissa: &Node, exponent: i64, scope: &ScopeRef) -> Rtr {
        let mut rtr = Rtr::none();
        let base = match rtr.register(self.visit(mantissa, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        let as_int = match &base {
            Value::Int(n) if exponent >= 0 => 10i64.checked_pow(exponent as u32).and_then(|p| n.checked_mul(p)),
            _ => None,
        };
        if let Some(n) = as_int {
            return Rtr::ok(Value::Int(n));
        }
        let base_f = match base {
            Value::Int(n) => n as f64,
            Value::Float(n) => n,
            _ => unreachable!("NumE mantissa is always Int or Float"),
        };
        Rtr::ok(Value::Float(base_f * 10f64.powi(exponent as i32)))
    }

    fn visit_list_lit(&self, elements: &[crate::parser::ast::Arg], scope: &ScopeRef, span: &Span) -> Rtr {
        let mut rtr = Rtr::none();
        let mut out = Vec::with_capacity(elements.len());
        for element in elements {
            let value = match rtr.register(self.visit(&element.value, scope)) {
                Some(v) => v,
                None => return rtr,
            };
            if element.spread {
                match value {
                    Value::List(l) => out.extend(l.borrow().iter().cloned()),
                    other => {
                        return Rtr::err(NougaroError::new(
                            ErrorKind::RtType,
                            span.clone(),
                            format!("cannot spread a {}", other.type_tag()),
                        ))
                    }
                }
            } else {
                out.push(value);
            }
        }
        Rtr::ok(Value::list(out))
    }

    fn visit_var_access(&self, chain: &[String], scope: &ScopeRef, span: &Span) -> Rtr {
        let Some(first) = chain.first() else { unreachable!("VarAccess always has at least one segment") };
        let Some(mut value) = scope.get(first) else {
            return Rtr::err(NougaroError::new(ErrorKind::RtName, span.clone(), format!("'{first}' is not defined")));
        };
        for segment in &chain[1..] {
            value = match &value {
                Value::Module(m) => match m.exports.borrow().get(segment) {
                    Some(v) => v.clone(),
                    None => {
                        return Rtr::err(NougaroError::new(
                            ErrorKind::RtAttribute,
                            span.clone(),
                            format!("module '{}' has no export '{segment}'", m.name),
                        ))
                    }
                },
                Value::Instance(i) => match i.lookup(segment) {
                    Some(v) => v,
                    None => {
                        return Rtr::err(NougaroError::new(
                            ErrorKind::RtAttribute,
                            span.clone(),
                            format!("object has no attribute '{segment}'"),
                        ))
                    }
                },
                Value::Class(c) => match c.lookup(segment) {
                    Some(v) => v,
                    None => {
                        return Rtr::err(NougaroError::new(
                            ErrorKind::RtAttribute,
                            span.clone(),
                            format!("class has no member '{segment}'"),
                        ))
                    }
                },
                other => {
                    return Rtr::err(NougaroError::new(
                        ErrorKind::RtAttribute,
                        span.clone(),
                        format!("'{}' has no attributes", other.type_tag()),
                    ))
                }
            };
        }
        Rtr::ok(value)
    }

    fn visit_var_delete(&self, name: &str, scope: &ScopeRef, span: &Span) -> Rtr {
        if scope.is_protected(name) {
            return Rtr::err(NougaroError::new(
                ErrorKind::RunTime,
                span.clone(),
                format!("cannot modify constant '{name}'"),
            ));
        }
        if scope.delete(name) {
            Rtr::none()
        } else {
            Rtr::err(NougaroError::new(ErrorKind::RtName, span.clone(), format!("'{name}' is not defined")))
        }
    }

    fn visit_var_assign(
        &self,
        targets: &[Node],
        op: AssignOp,
        values: &[Node],
        scope: &ScopeRef,
        span: &Span,
    ) -> Rtr {
        let mut rtr = Rtr::none();
        let mut new_values = Vec::with_capacity(values.len());
        for value_node in values {
            let v = match rtr.register(self.visit(value_node, scope)) {
                Some(v) => v,
                None => return rtr,
            };
            new_values.push(v);
        }

        if targets.len() != new_values.len() && new_values.len() != 1 {
            return Rtr::err(NougaroError::new(
                ErrorKind::RunTime,
                span.clone(),
                format!("cannot assign {} values to {} targets", new_values.len(), targets.len()),
            ));
        }

        let mut last = Value::None;
        for (i, target) in targets.iter().enumerate() {
            let NodeKind::VarAccess { chain } = &*target.kind else {
                unreachable!("assignment targets are always VarAccess")
            };
            let incoming = if new_values.len() == 1 { new_values[0].clone() } else { new_values[i].clone() };

            if chain.len() > 1 {
                last = match self.assign_attribute(chain, op, incoming, scope, span) {
                    Ok(v) => v,
                    Err(e) => return Rtr::err(e),
                };
                continue;
            }

            let name = &chain[0];
            if scope.is_protected(name) {
                return Rtr::err(NougaroError::new(
                    ErrorKind::RunTime,
                    span.clone(),
                    format!("cannot modify constant '{name}'"),
                ));
            }

            if op == AssignOp::Assign {
                // A fresh `var x = …` always declares in the current scope,
                // shadowing any same-named binding further up the chain,
                // rather than rebinding whatever scope already owns it.
                scope.declare(name.clone(), incoming.clone());
                last = incoming;
                continue;
            }

            let current = match scope.get(name) {
                Some(v) => v,
                None => {
                    return Rtr::err(NougaroError::new(
                        ErrorKind::RtName,
                        span.clone(),
                        format!("'{name}' is not defined"),
                    ))
                }
            };
            let final_value = match apply_compound(op, current, incoming, span) {
                Ok(v) => v,
                Err(e) => return Rtr::err(e),
            };
            // Compound assignment modifies the binding in whichever scope
            // already owns it.
            scope.assign_existing(name, final_value.clone());
            last = final_value;
        }
        Rtr::ok(last)
    }

    /// Walks `chain[..len-1]` to the container value and sets
    /// `chain[len-1]` on it. Only instances carry a mutable attribute
    /// table; modules and classes are read-only from the assignment side.
    fn assign_attribute(
        &self,
        chain: &[String],
        op: AssignOp,
        incoming: Value,
        scope: &ScopeRef,
        span: &Span,
    ) -> Result<Value, NougaroError> {
        let mut value = scope
            .get(&chain[0])
            .ok_or_else(|| NougaroError::new(ErrorKind::RtName, span.clone(), format!("'{}' is not defined", chain[0])))?;
        for segment in &chain[1..chain.len() - 1] {
            value = match &value {
                Value::Instance(i) => i.lookup(segment).ok_or_else(|| {
                    NougaroError::new(ErrorKind::RtAttribute, span.clone(), format!("object has no attribute '{segment}'"))
                })?,
                Value::Class(c) => c.lookup(segment).ok_or_else(|| {
                    NougaroError::new(ErrorKind::RtAttribute, span.clone(), format!("class has no member '{segment}'"))
                })?,
                other => {
                    return Err(NougaroError::new(
                        ErrorKind::RtAttribute,
                        span.clone(),
                        format!("'{}' has no attributes", other.type_tag()),
                    ))
                }
            };
        }

        let attr_name = chain.last().expect("chain has at least 2 segments here");
        let instance = match &value {
            Value::Instance(i) => i.clone(),
            other => {
                return Err(NougaroError::new(
                    ErrorKind::RtAttribute,
                    span.clone(),
                    format!("cannot set an attribute on a {}", other.type_tag()),
                ))
            }
        };

        let final_value = if op == AssignOp::Assign {
            incoming
        } else {
            let current = instance.lookup(attr_name).ok_or_else(|| {
                NougaroError::new(ErrorKind::RtAttribute, span.clone(), format!("object has no attribute '{attr_name}'"))
            })?;
            apply_compound(op, current, incoming, span)?
        };
        instance.attributes.borrow_mut().insert(attr_name.clone(), final_value.clone());
        Ok(final_value)
    }

    fn visit_bin_op(&self, op: BinOpKind, left: &Node, right: &Node, scope: &ScopeRef) -> Rtr {
        let mut rtr = Rtr::none();
        let l = match rtr.register(self.visit(left, scope)) {
            Some(v) => v,
            None => return rtr,
        };

        if matches!(op, BinOpKind::And | BinOpKind::Or) {
            let short_circuit = match op {
                BinOpKind::And => !l.is_truthy(),
                BinOpKind::Or => l.is_truthy(),
                _ => unreachable!(),
            };
            if short_circuit {
                return Rtr::ok(Value::Int(if l.is_truthy() { 1 } else { 0 }));
            }
        }

        let r = match rtr.register(self.visit(right, scope)) {
            Some(v) => v,
            None => return rtr,
        };

        let span = left.span.merge(&right.span);
        match crate::eval::arith::apply_binop(op, l, r, &span) {
            Ok(v) => Rtr::ok(v),
            Err(e) => Rtr::err(e),
        }
    }

    fn visit_compare_chain(
        &self,
        first: &Node,
        rest: &[crate::parser::ast::CompareLink],
        scope: &ScopeRef,
    ) -> Rtr {
        let mut rtr = Rtr::none();
        let mut prev = match rtr.register(self.visit(first, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        let mut all_true = true;
        for link in rest {
            let cur = match rtr.register(self.visit(&link.rhs, scope)) {
                Some(v) => v,
                None => return rtr,
            };
            let span = first.span.merge(&link.rhs.span);
            let ok = match crate::eval::arith::apply_compare(link.op, &prev, &cur, &span) {
                Ok(v) => v,
                Err(e) => return Rtr::err(e),
            };
            all_true = all_true && ok;
            prev = cur;
        }
        Rtr::ok(Value::Int(if all_true { 1 } else { 0 }))
    }

    fn visit_unary_op(&self, op: UnaryOpKind, operand: &Node, scope: &ScopeRef) -> Rtr {
        let mut rtr = Rtr::none();
        let v = match rtr.register(self.visit(operand, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        match crate::eval::arith::apply_unary(op, v, &operand.span) {
            Ok(v) => Rtr::ok(v),
            Err(e) => Rtr::err(e),
        }
    }
}

fn apply_compound(op: AssignOp, current: Value, incoming: Value, span: &Span) -> Result<Value, NougaroError> {
    let bin_op = match op {
        AssignOp::Add => BinOpKind::Add,
        AssignOp::Sub => BinOpKind::Sub,
        AssignOp::Mul => BinOpKind::Mul,
        AssignOp::Div => BinOpKind::Div,
        AssignOp::FloorDiv => BinOpKind::FloorDiv,
        AssignOp::Mod => BinOpKind::Mod,
        AssignOp::Pow => BinOpKind::Pow,
        AssignOp::Or => BinOpKind::Or,
        AssignOp::And => BinOpKind::And,
        AssignOp::Xor => BinOpKind::Xor,
        AssignOp::BitOr => BinOpKind::BitOr,
        AssignOp::BitAnd => BinOpKind::BitAnd,
        AssignOp::BitXor => BinOpKind::BitXor,
        AssignOp::Assign => unreachable!("Assign never reaches apply_compound"),
    };
    crate::eval::arith::apply_binop(bin_op, current, incoming, span)
}

/// Built-in descriptors have no interior mutability; cloning just copies
/// the small metadata table and the `fn` pointer (not the Lazy map).
fn unsafe_clone_descriptor(name: &str) -> Rc<crate::value::BuiltinDescriptor> {
    let d = &BUILTINS[name];
    Rc::new(crate::value::BuiltinDescriptor {
        name: d.name,
        param_names: d.param_names.clone(),
        optional_params: d.optional_params.clone(),
        strict_arity: d.strict_arity,
        needs_work_dir: d.needs_work_dir,
        needs_module_dir: d.needs_module_dir,
        func: d.func,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse as parse_tokens;
    use crate::source::Source;

    fn eval(src: &str) -> Rtr {
        let source = Source::new("<test>", src);
        let tokens = tokenize(source).unwrap();
        let ast = parse_tokens(tokens).unwrap();
        let evaluator = Evaluator::new(Loader::new(std::path::PathBuf::from(".")));
        let scope = Scope::new("<root>", None);
        evaluator.prebind_constants(&scope);
        evaluator.visit(&ast, &scope)
    }

    #[test]
    fn evaluates_arithmetic() {
        let rtr = eval("2 + 3 * 4");
        assert!(matches!(rtr.value, Some(Value::Int(14))));
    }

    #[test]
    fn compound_assign_reads_then_rebinds() {
        let rtr = eval("var a = 5\nvar a += 3\na");
        assert!(matches!(rtr.value, Some(Value::Int(8))));
    }

    #[test]
    fn comparison_chain_short_circuits_on_shared_operand() {
        let rtr = eval("1 < 2 < 3");
        assert!(matches!(rtr.value, Some(Value::Int(1))));
        let rtr = eval("1 < 2 < 0");
        assert!(matches!(rtr.value, Some(Value::Int(0))));
    }

    #[test]
    fn constants_cannot_be_modified() {
        let rtr = eval("var True = 0");
        assert!(rtr.is_err());
        assert!(rtr.error.unwrap().message.contains("cannot modify"));
    }

    #[test]
    fn num_e_folds_into_int_when_exact() {
        let rtr = eval("1e3");
        assert!(matches!(rtr.value, Some(Value::Int(1000))));
    }
}
