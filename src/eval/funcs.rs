//! Functions, classes and calls.
//!
//! `check_args`/populate-then-run is the call protocol shared by user
//! functions, built-ins and class constructors: arity is checked once
//! against `(required, optional)`, then a fresh execution scope is filled
//! positionally. User functions root their execution scope at the
//! function's captured defining scope, never the caller's scope (invariant
//! 4); built-ins get an isolated scope since their descriptor never reads
//! anything outside the declared param names.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::Evaluator;
use crate::context::{Scope, ScopeRef};
use crate::error::{ErrorKind, NougaroError};
use crate::parser::ast::{Arg, Node, Param};
use crate::rtr::Rtr;
use crate::source::Span;
use crate::value::{BuiltinDescriptor, ClassValue, FunctionValue, InstanceValue, Value};

fn check_args(required: usize, optional: usize, given: usize, span: &Span) -> Result<(), NougaroError> {
    if given > required + optional {
        return Err(NougaroError::new(
            ErrorKind::RunTime,
            span.clone(),
            format!("{} too many args", given - (required + optional)),
        ));
    }
    if given < required {
        return Err(NougaroError::new(
            ErrorKind::RunTime,
            span.clone(),
            format!("{} too few args", required - given),
        ));
    }
    Ok(())
}

impl Evaluator {
    pub(super) fn make_function(
        &self,
        name: Option<String>,
        params: &[Param],
        body: &Node,
        scope: &ScopeRef,
        auto_return: bool,
    ) -> Value {
        Value::Function(Rc::new(FunctionValue {
            name,
            params: params.to_vec(),
            body: body.clone(),
            defining_scope: scope.clone(),
            auto_return,
        }))
    }

    pub(super) fn visit_class_def(
        &self,
        name: Option<&str>,
        parent: Option<&str>,
        body: &Node,
        scope: &ScopeRef,
        _auto_return: bool,
        span: &Span,
    ) -> Rtr {
        let parent_class = match parent {
            Some(pname) => match scope.get(pname) {
                Some(Value::Class(c)) => Some(c),
                Some(other) => {
                    return Rtr::err(NougaroError::new(
                        ErrorKind::RtType,
                        span.clone(),
                        format!("'{pname}' is not a class, got {}", other.type_tag()),
                    ))
                }
                None => {
                    return Rtr::err(NougaroError::new(
                        ErrorKind::RtName,
                        span.clone(),
                        format!("'{pname}' is not defined"),
                    ))
                }
            },
            None => None,
        };

        let class_scope = Scope::new(format!("class {}", name.unwrap_or("<anonymous>")), Some(scope.clone()));
        let body_rtr = self.visit(body, &class_scope);
        if body_rtr.is_err() {
            return body_rtr;
        }

        let mut members = HashMap::new();
        for key in class_scope.local_names() {
            if let Some(v) = class_scope.get(&key) {
                members.insert(key, v);
            }
        }

        Rtr::ok(Value::Class(Rc::new(ClassValue {
            name: name.map(str::to_string),
            parent: parent_class,
            members: RefCell::new(members),
        })))
    }

    pub(super) fn visit_call(&self, target: &Node, args: &[Arg], scope: &ScopeRef, span: &Span) -> Rtr {
        let mut rtr = Rtr::none();
        let callee = match rtr.register(self.visit(target, scope)) {
            Some(v) => v,
            None => return rtr,
        };

        let mut arg_values = Vec::with_capacity(args.len());
        for a in args {
            let v = match rtr.register(self.visit(&a.value, scope)) {
                Some(v) => v,
                None => return rtr,
            };
            if a.spread {
                match v {
                    Value::List(l) => arg_values.extend(l.borrow().iter().cloned()),
                    other => {
                        return Rtr::err(NougaroError::new(
                            ErrorKind::RtType,
                            a.value.span.clone(),
                            format!("cannot spread a {}", other.type_tag()),
                        ))
                    }
                }
            } else {
                arg_values.push(v);
            }
        }

        match callee {
            Value::Function(f) => self.call_function(&f, arg_values, span),
            Value::Builtin(d) => self.call_builtin(&d, arg_values, scope, span),
            Value::Class(c) => self.call_class(&c, arg_values, span),
            other => Rtr::err(NougaroError::new(
                ErrorKind::RtType,
                span.clone(),
                format!("'{}' is not callable", other.type_tag()),
            )),
        }
    }

    fn call_function(&self, f: &Rc<FunctionValue>, args: Vec<Value>, span: &Span) -> Rtr {
        let required: Vec<&str> = f.params.iter().filter(|p| !p.optional).map(|p| p.name.as_str()).collect();
        let optional: Vec<&str> = f.params.iter().filter(|p| p.optional).map(|p| p.name.as_str()).collect();
        if let Err(e) = check_args(required.len(), optional.len(), args.len(), span) {
            return Rtr::err(e);
        }

        let display_name = f.name.clone().unwrap_or_else(|| "<anonymous>".to_string());
        let call_scope =
            Scope::with_call_site(format!("function {display_name}"), f.defining_scope.clone(), span.start.clone());

        let mut args = args.into_iter();
        for name in &required {
            call_scope.declare(name.to_string(), args.next().expect("checked by check_args"));
        }
        // Missing optional args bind to None rather than staying unbound
        // (see DESIGN.md).
        for name in &optional {
            call_scope.declare(name.to_string(), args.next().unwrap_or(Value::None));
        }

        let mut result = self.visit(&f.body, &call_scope);
        if let Some(e) = result.error.take() {
            let e = match call_scope.context_frame() {
                Some(frame) => e.push_frame(frame),
                None => e,
            };
            return Rtr::err(e);
        }
        if result.should_exit.is_some() {
            return result;
        }
        if result.should_return {
            return Rtr::ok(result.value.unwrap_or(Value::None));
        }
        if f.auto_return {
            Rtr::ok(result.value.unwrap_or(Value::None))
        } else {
            Rtr::none()
        }
    }

    fn call_builtin(&self, d: &Rc<BuiltinDescriptor>, args: Vec<Value>, scope: &ScopeRef, span: &Span) -> Rtr {
        if let Err(e) = check_args(d.param_names.len(), d.optional_params.len(), args.len(), span) {
            return Rtr::err(e);
        }

        let call_scope =
            Scope::with_call_site(format!("built-in function {}", d.name), scope.clone(), span.start.clone());
        let mut args = args.into_iter();
        for name in &d.param_names {
            call_scope.declare(*name, args.next().expect("checked by check_args"));
        }
        for name in &d.optional_params {
            call_scope.declare(*name, args.next().unwrap_or(Value::None));
        }
        let mut result = (d.func)(&call_scope);
        if let Some(e) = result.error.take() {
            let e = match call_scope.context_frame() {
                Some(frame) => e.push_frame(frame),
                None => e,
            };
            return Rtr::err(e);
        }
        result
    }

    fn call_class(&self, c: &Rc<ClassValue>, args: Vec<Value>, span: &Span) -> Rtr {
        let instance = Rc::new(InstanceValue { class: c.clone(), attributes: RefCell::new(HashMap::new()) });
        if let Some(Value::Function(init)) = c.lookup("__init__") {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(Value::Instance(instance.clone()));
            call_args.extend(args);
            // `call_function` already attaches its own frame; class
            // instantiation itself adds no further frame, the constructor
            // call already names itself as `function __init__`.
            let result = self.call_function(&init, call_args, span);
            if result.is_err() || result.should_exit.is_some() {
                return result;
            }
        }
        Rtr::ok(Value::Instance(instance))
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
    fn recursive_factorial() {
        let rtr = eval(
            "def fact(n)\n  if n <= 1 then return 1\n  return n * fact(n - 1)\nend\nfact(6)",
        );
        assert!(matches!(rtr.value, Some(Value::Int(720))));
    }

    #[test]
    fn auto_return_function_yields_body_expression() {
        let rtr = eval("def square(n) -> n * n\nsquare(5)");
        assert!(matches!(rtr.value, Some(Value::Int(25))));
    }

    #[test]
    fn missing_optional_param_binds_none() {
        let rtr = eval("def greet(name?)\n  return name\nend\ngreet()");
        assert!(matches!(rtr.value, Some(Value::None)));
    }

    #[test]
    fn too_many_args_is_an_error() {
        let rtr = eval("def f(a) -> a\nf(1, 2)");
        assert!(rtr.is_err());
    }

    #[test]
    fn class_instantiation_runs_init_with_instance_as_self() {
        let rtr = eval(
            "class Point\n  def __init__(self, x)\n    var self?x = x\n  end\nend\nvar p = Point(3)\np?x",
        );
        assert!(matches!(rtr.value, Some(Value::Int(3))));
    }

    #[test]
    fn function_captures_defining_scope_not_caller_scope() {
        let rtr = eval(
            "var x = 1\ndef f() -> x\ndef g()\n  var x = 2\n  return f()\nend\ng()",
        );
        assert!(matches!(rtr.value, Some(Value::Int(1))));
    }

    #[test]
    fn error_unwinding_through_a_call_carries_a_context_frame() {
        let rtr = eval("def f(n) -> n + \"x\"\nf(1)");
        let err = rtr.error.expect("expected a type error");
        assert_eq!(err.context_chain.len(), 1);
        assert_eq!(err.context_chain[0].display_name, "function f");
    }
}
