//! Control flow: `if`, loops, `break`/`continue`/`return`, `assert`. Every
//! loop form accumulates its body's per-iteration values into a list that
//! becomes the loop's own value, unless `break` fires (in which case the
//! loop yields `None`).

use super::Evaluator;
use crate::context::ScopeRef;
use crate::error::{ErrorKind, NougaroError};
use crate::parser::ast::{IfCase, Node};
use crate::rtr::Rtr;
use crate::value::Value;

/// Restores the iterator variable's binding in `scope` to what it was
/// before the loop started.
fn restore_binding(scope: &ScopeRef, name: &str, had_prior: Option<Value>) {
    match had_prior {
        Some(v) => scope.declare(name.to_string(), v),
        None => {
            scope.delete(name);
        }
    }
}

impl Evaluator {
    pub(super) fn visit_if(&self, cases: &[IfCase], else_body: &Option<Box<Node>>, scope: &ScopeRef) -> Rtr {
        for case in cases {
            let mut rtr = Rtr::none();
            let cond = match rtr.register(self.visit(&case.condition, scope)) {
                Some(v) => v,
                None => return rtr,
            };
            if cond.is_truthy() {
                return self.visit(&case.body, scope);
            }
        }
        match else_body {
            Some(body) => self.visit(body, scope),
            None => Rtr::none(),
        }
    }

    pub(super) fn visit_assert(
        &self,
        condition: &Node,
        message: &Option<Box<Node>>,
        scope: &ScopeRef,
        span: &crate::source::Span,
    ) -> Rtr {
        let mut rtr = Rtr::none();
        let cond = match rtr.register(self.visit(condition, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        if cond.is_truthy() {
            return Rtr::none();
        }
        let text = match message {
            Some(m) => match rtr.register(self.visit(m, scope)) {
                Some(v) => v.to_string(),
                None => return rtr,
            },
            None => String::new(),
        };
        Rtr::err(NougaroError::new(ErrorKind::RtAssertion, span.clone(), text))
    }

    pub(super) fn visit_return(&self, expr: Option<&Node>, scope: &ScopeRef) -> Rtr {
        match expr {
            Some(e) => {
                let mut rtr = Rtr::none();
                let v = match rtr.register(self.visit(e, scope)) {
                    Some(v) => v,
                    None => return rtr,
                };
                Rtr::ret(Some(v))
            }
            None => Rtr::ret(None),
        }
    }

    pub(super) fn visit_for(
        &self,
        name: &str,
        start_node: &Node,
        end_node: &Node,
        step_node: Option<&Node>,
        body: &Node,
        scope: &ScopeRef,
    ) -> Rtr {
        let mut rtr = Rtr::none();
        let start_v = match rtr.register(self.visit(start_node, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        let end_v = match rtr.register(self.visit(end_node, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        let step_v = match step_node {
            Some(n) => match rtr.register(self.visit(n, scope)) {
                Some(v) => Some(v),
                None => return rtr,
            },
            None => None,
        };

        fn as_f64(v: &Value) -> Option<f64> {
            match v {
                Value::Int(n) => Some(*n as f64),
                Value::Float(n) => Some(*n),
                _ => None,
            }
        }

        let (Some(start), Some(end)) = (as_f64(&start_v), as_f64(&end_v)) else {
            return Rtr::err(NougaroError::new(
                ErrorKind::RtType,
                start_node.span.merge(&end_node.span),
                "for-loop bounds must be numbers",
            ));
        };
        let all_int = matches!(start_v, Value::Int(_))
            && matches!(end_v, Value::Int(_))
            && step_v.as_ref().map_or(true, |v| matches!(v, Value::Int(_)));

        let step = match step_v.as_ref().map(as_f64) {
            Some(Some(s)) => s,
            Some(None) => {
                return Rtr::err(NougaroError::new(ErrorKind::RtType, body.span.clone(), "step must be a number"))
            }
            None => 1.0,
        };
        if step == 0.0 {
            return Rtr::err(NougaroError::new(ErrorKind::RtArithmetic, body.span.clone(), "step cannot be zero"));
        }

        // No explicit step and a descending range runs zero times rather
        // than guessing a direction (see DESIGN.md).
        let had_prior = scope.get(name);
        let mut results = Vec::new();
        let mut broke = false;
        let mut i = start;
        loop {
            let keep_going = if step_node.is_none() && start > end {
                false
            } else if step > 0.0 {
                i < end
            } else {
                i > end
            };
            if !keep_going {
                break;
            }

            scope.declare(name.to_string(), if all_int { Value::Int(i as i64) } else { Value::Float(i) });
            let body_rtr = self.visit(body, scope);
            if body_rtr.is_err() || body_rtr.should_return || body_rtr.should_exit.is_some() {
                restore_binding(scope, name, had_prior);
                return body_rtr;
            }
            if body_rtr.should_break {
                broke = true;
                break;
            }
            if !body_rtr.should_continue {
                if let Some(v) = body_rtr.value {
                    results.push(v);
                }
            }
            i += step;
        }

        restore_binding(scope, name, had_prior);
        if broke { Rtr::none() } else { Rtr::ok(Value::list(results)) }
    }

    pub(super) fn visit_for_in(&self, name: &str, iterable_node: &Node, body: &Node, scope: &ScopeRef) -> Rtr {
        let mut rtr = Rtr::none();
        let iterable = match rtr.register(self.visit(iterable_node, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        let items: Vec<Value> = match &iterable {
            Value::List(l) => l.borrow().clone(),
            Value::String(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
            other => {
                return Rtr::err(NougaroError::new(
                    ErrorKind::RtType,
                    iterable_node.span.clone(),
                    format!("cannot iterate over a {}", other.type_tag()),
                ))
            }
        };

        let had_prior = scope.get(name);
        let mut results = Vec::new();
        let mut broke = false;
        for item in items {
            scope.declare(name.to_string(), item);
            let body_rtr = self.visit(body, scope);
            if body_rtr.is_err() || body_rtr.should_return || body_rtr.should_exit.is_some() {
                restore_binding(scope, name, had_prior);
                return body_rtr;
            }
            if body_rtr.should_break {
                broke = true;
                break;
            }
            if !body_rtr.should_continue {
                if let Some(v) = body_rtr.value {
                    results.push(v);
                }
            }
        }
        restore_binding(scope, name, had_prior);
        if broke { Rtr::none() } else { Rtr::ok(Value::list(results)) }
    }

    pub(super) fn visit_while(&self, condition: &Node, body: &Node, scope: &ScopeRef) -> Rtr {
        let mut results = Vec::new();
        loop {
            let mut rtr = Rtr::none();
            let cond = match rtr.register(self.visit(condition, scope)) {
                Some(v) => v,
                None => return rtr,
            };
            if !cond.is_truthy() {
                break;
            }
            let body_rtr = self.visit(body, scope);
            if body_rtr.is_err() || body_rtr.should_return || body_rtr.should_exit.is_some() {
                return body_rtr;
            }
            if body_rtr.should_break {
                return Rtr::none();
            }
            if !body_rtr.should_continue {
                if let Some(v) = body_rtr.value {
                    results.push(v);
                }
            }
        }
        Rtr::ok(Value::list(results))
    }

    pub(super) fn visit_do_while(&self, body: &Node, condition: &Node, scope: &ScopeRef) -> Rtr {
        let mut results = Vec::new();
        loop {
            let body_rtr = self.visit(body, scope);
            if body_rtr.is_err() || body_rtr.should_return || body_rtr.should_exit.is_some() {
                return body_rtr;
            }
            if body_rtr.should_break {
                return Rtr::none();
            }
            if !body_rtr.should_continue {
                if let Some(v) = body_rtr.value {
                    results.push(v);
                }
            }

            let mut rtr = Rtr::none();
            let cond = match rtr.register(self.visit(condition, scope)) {
                Some(v) => v,
                None => return rtr,
            };
            if !cond.is_truthy() {
                break;
            }
        }
        Rtr::ok(Value::list(results))
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Scope;
    use crate::eval::Evaluator;
    use crate::lexer::tokenize;
    use crate::loader::Loader;
    use crate::parser::parse;
    use crate::source::Source;
    use crate::value::Value;

    fn eval(src: &str) -> crate::rtr::Rtr {
        let source = Source::new("<test>", src);
        let tokens = tokenize(source).unwrap();
        let ast = parse(tokens).unwrap();
        let evaluator = Evaluator::new(Loader::new(std::path::PathBuf::from(".")));
        let scope = Scope::new("<root>", None);
        evaluator.prebind_constants(&scope);
        evaluator.visit(&ast, &scope)
    }

    #[test]
    fn for_loop_end_is_exclusive() {
        let rtr = eval("for i = 1 to 5 then i*i");
        let Some(Value::List(l)) = rtr.value else { panic!() };
        let values: Vec<i64> = l.borrow().iter().map(|v| match v { Value::Int(n) => *n, _ => panic!() }).collect();
        assert_eq!(values, vec![1, 4, 9, 16]);
    }

    #[test]
    fn for_loop_with_descending_bounds_and_no_step_runs_zero_times() {
        let rtr = eval("for i = 5 to 1 then i");
        let Some(Value::List(l)) = rtr.value else { panic!() };
        assert!(l.borrow().is_empty());
    }

    #[test]
    fn break_yields_none_and_stops_accumulation() {
        let rtr = eval("for i = 0 to 10 then\n  if i == 3 then break\n  i\nend");
        assert!(matches!(rtr.value, Some(Value::None)));
    }

    #[test]
    fn do_while_runs_body_before_checking_condition() {
        let rtr = eval("var i = 0\ndo\n  var i += 1\n  i\nloop while i < 3");
        let Some(Value::List(l)) = rtr.value else { panic!() };
        assert_eq!(l.borrow().len(), 3);
    }

    #[test]
    fn assert_failure_carries_message() {
        let rtr = eval("assert 1 == 2, \"boom\"");
        let err = rtr.error.unwrap();
        assert_eq!(err.kind, crate::error::ErrorKind::RtAssertion);
        assert_eq!(err.message, "boom");
    }
}
