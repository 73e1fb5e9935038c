//! `math` module, exposed only via `import math` rather than sitting
//! ambiently in every root scope (see DESIGN.md).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::context::ScopeRef;
use crate::error::{ErrorKind, NougaroError};
use crate::rtr::Rtr;
use crate::value::{BuiltinDescriptor, ModuleValue, Value};

fn arg_f64(scope: &ScopeRef, name: &str) -> Result<f64, Rtr> {
    match scope.get(name) {
        Some(Value::Int(n)) => Ok(n as f64),
        Some(Value::Float(n)) => Ok(n),
        Some(other) => Err(Rtr::err(NougaroError::new(
            ErrorKind::RtType,
            scope.call_span(),
            format!("'{name}' must be a number, got {}", other.type_tag()),
        ))),
        None => Err(Rtr::err(NougaroError::new(
            ErrorKind::RtType,
            scope.call_span(),
            format!("missing argument '{name}'"),
        ))),
    }
}

fn domain_error(scope: &ScopeRef, message: impl Into<String>) -> Rtr {
    Rtr::err(NougaroError::new(ErrorKind::RtArithmetic, scope.call_span(), message.into()))
}

fn math_sqrt(scope: &ScopeRef) -> Rtr {
    let x = match arg_f64(scope, "x") {
        Ok(x) => x,
        Err(e) => return e,
    };
    if x < 0.0 {
        return domain_error(scope, "sqrt of a negative number");
    }
    Rtr::ok(Value::Float(x.sqrt()))
}

fn math_isqrt(scope: &ScopeRef) -> Rtr {
    let n = match scope.get("x") {
        Some(Value::Int(n)) => n,
        Some(other) => return domain_error(scope, format!("isqrt requires an int, got {}", other.type_tag())),
        None => return domain_error(scope, "missing argument 'x'"),
    };
    if n < 0 {
        return domain_error(scope, "isqrt of a negative number");
    }
    Rtr::ok(Value::Float((n as f64).sqrt().floor()))
}

fn root_n(scope: &ScopeRef) -> Result<f64, Rtr> {
    match scope.get("n") {
        Some(Value::Int(n)) => Ok(n as f64),
        Some(Value::Float(n)) => Ok(n),
        Some(other) => Err(domain_error(scope, format!("'n' must be a number, got {}", other.type_tag()))),
        None => Ok(2.0),
    }
}

fn math_root(scope: &ScopeRef) -> Rtr {
    let x = match arg_f64(scope, "x") {
        Ok(x) => x,
        Err(e) => return e,
    };
    let n = match root_n(scope) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if x < 0.0 && n as i64 % 2 == 0 {
        return domain_error(scope, "even root of a negative number");
    }
    Rtr::ok(Value::Float(x.abs().powf(1.0 / n) * x.signum()))
}

fn math_iroot(scope: &ScopeRef) -> Rtr {
    let x = match arg_f64(scope, "x") {
        Ok(x) => x,
        Err(e) => return e,
    };
    let n = match root_n(scope) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if x < 0.0 && n as i64 % 2 == 0 {
        return domain_error(scope, "even root of a negative number");
    }
    Rtr::ok(Value::Float((x.abs().powf(1.0 / n) * x.signum()).floor()))
}

fn math_radians(scope: &ScopeRef) -> Rtr {
    arg_f64(scope, "x").map(|x| Rtr::ok(Value::Float(x.to_radians()))).unwrap_or_else(|e| e)
}

fn math_degrees(scope: &ScopeRef) -> Rtr {
    arg_f64(scope, "x").map(|x| Rtr::ok(Value::Float(x.to_degrees()))).unwrap_or_else(|e| e)
}

macro_rules! unary_math_fn {
    ($fn_name:ident, $method:ident) => {
        fn $fn_name(scope: &ScopeRef) -> Rtr {
            match arg_f64(scope, "x") {
                Ok(x) => Rtr::ok(Value::Float(x.$method())),
                Err(e) => e,
            }
        }
    };
}

unary_math_fn!(math_sin, sin);
unary_math_fn!(math_cos, cos);
unary_math_fn!(math_tan, tan);
unary_math_fn!(math_abs, abs);

fn math_asin(scope: &ScopeRef) -> Rtr {
    match arg_f64(scope, "x") {
        Ok(x) if (-1.0..=1.0).contains(&x) => Rtr::ok(Value::Float(x.asin())),
        Ok(_) => domain_error(scope, "asin domain is [-1, 1]"),
        Err(e) => e,
    }
}

fn math_acos(scope: &ScopeRef) -> Rtr {
    match arg_f64(scope, "x") {
        Ok(x) if (-1.0..=1.0).contains(&x) => Rtr::ok(Value::Float(x.acos())),
        Ok(_) => domain_error(scope, "acos domain is [-1, 1]"),
        Err(e) => e,
    }
}

fn math_atan(scope: &ScopeRef) -> Rtr {
    match arg_f64(scope, "x") {
        Ok(x) => Rtr::ok(Value::Float(x.atan())),
        Err(e) => e,
    }
}

fn math_log(scope: &ScopeRef) -> Rtr {
    let x = match arg_f64(scope, "x") {
        Ok(x) => x,
        Err(e) => return e,
    };
    if x <= 0.0 {
        return domain_error(scope, "log of a non-positive number");
    }
    let base = match scope.get("base") {
        Some(Value::Int(n)) => n as f64,
        Some(Value::Float(n)) => n,
        Some(other) => return domain_error(scope, format!("'base' must be a number, got {}", other.type_tag())),
        None => std::f64::consts::E,
    };
    Rtr::ok(Value::Float(x.log(base)))
}

fn math_log2(scope: &ScopeRef) -> Rtr {
    match arg_f64(scope, "x") {
        Ok(x) if x > 0.0 => Rtr::ok(Value::Float(x.log2())),
        Ok(_) => domain_error(scope, "log2 of a non-positive number"),
        Err(e) => e,
    }
}

macro_rules! descriptor {
    ($name:literal, [$($req:literal),*], [$($opt:literal),*], $f:ident) => {
        BuiltinDescriptor {
            name: $name,
            param_names: vec![$($req),*],
            optional_params: vec![$($opt),*],
            strict_arity: false,
            needs_work_dir: false,
            needs_module_dir: false,
            func: $f,
        }
    };
}

/// Builds a fresh `Value::Module("math", ...)` export table. Called once
/// per `import math` (cheap: a handful of `Rc` clones into a `HashMap`).
pub fn build_module() -> Value {
    let mut exports: HashMap<String, Value> = HashMap::new();
    exports.insert("pi".into(), Value::Float(std::f64::consts::PI));
    exports.insert("sqrt_pi".into(), Value::Float(std::f64::consts::PI.sqrt()));
    exports.insert("e".into(), Value::Float(std::f64::consts::E));

    let mut add = |d: BuiltinDescriptor| {
        exports.insert(d.name.to_string(), Value::Builtin(Rc::new(d)));
    };
    add(descriptor!("sqrt", ["x"], [], math_sqrt));
    add(descriptor!("isqrt", ["x"], [], math_isqrt));
    add(descriptor!("root", ["x"], ["n"], math_root));
    add(descriptor!("iroot", ["x"], ["n"], math_iroot));
    add(descriptor!("radians", ["x"], [], math_radians));
    add(descriptor!("degrees", ["x"], [], math_degrees));
    add(descriptor!("sin", ["x"], [], math_sin));
    add(descriptor!("cos", ["x"], [], math_cos));
    add(descriptor!("tan", ["x"], [], math_tan));
    add(descriptor!("asin", ["x"], [], math_asin));
    add(descriptor!("acos", ["x"], [], math_acos));
    add(descriptor!("atan", ["x"], [], math_atan));
    add(descriptor!("abs", ["x"], [], math_abs));
    add(descriptor!("log", ["x"], ["base"], math_log));
    add(descriptor!("log2", ["x"], [], math_log2));

    Value::Module(Rc::new(ModuleValue { name: "math".to_string(), exports: RefCell::new(exports) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_pi_with_enough_precision() {
        let Value::Module(m) = build_module() else { panic!() };
        let Some(Value::Float(pi)) = m.exports.borrow().get("pi").cloned() else { panic!() };
        assert!((pi - std::f64::consts::PI).abs() < 1e-15);
    }

    #[test]
    fn exposes_expected_function_roster() {
        let Value::Module(m) = build_module() else { panic!() };
        let exports = m.exports.borrow();
        for name in ["sqrt", "isqrt", "root", "iroot", "sin", "cos", "tan", "log", "log2"] {
            assert!(exports.contains_key(name), "missing export {name}");
        }
    }
}
