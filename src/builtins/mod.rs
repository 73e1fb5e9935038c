//! Built-in function dispatch table.
//!
//! Each entry is a [`BuiltinDescriptor`] looked up by name from a static
//! table, not by reflective method resolution. Every function reads its
//! arguments out of the execution scope the evaluator populated for it,
//! exactly as a user `def` body would, so the call protocol is uniform
//! across user and built-in callables.

pub mod math;

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::context::ScopeRef;
use crate::error::{ErrorKind, NougaroError};
use crate::rtr::Rtr;
use crate::value::{BuiltinDescriptor, Value};

fn arg(scope: &ScopeRef, name: &str) -> Value {
    scope.get(name).unwrap_or(Value::None)
}

fn type_error(scope: &ScopeRef, message: impl Into<String>) -> Rtr {
    Rtr::err(NougaroError::new(ErrorKind::RtType, scope.call_span(), message.into()))
}

fn expect_list(scope: &ScopeRef, name: &str) -> Result<std::rc::Rc<std::cell::RefCell<Vec<Value>>>, Rtr> {
    match arg(scope, name) {
        Value::List(l) => Ok(l),
        other => Err(type_error(scope, format!("'{name}' must be a list, got {}", other.type_tag()))),
    }
}

fn builtin_void(_scope: &ScopeRef) -> Rtr {
    Rtr::none()
}

fn builtin_print(scope: &ScopeRef) -> Rtr {
    println!("{}", arg(scope, "value"));
    Rtr::none()
}

fn builtin_print_ret(scope: &ScopeRef) -> Rtr {
    let value = arg(scope, "value");
    println!("{value}");
    Rtr::ok(value)
}

fn bool_value(b: bool) -> Value {
    Value::Int(if b { 1 } else { 0 })
}

fn builtin_is_int(scope: &ScopeRef) -> Rtr {
    Rtr::ok(bool_value(matches!(arg(scope, "value"), Value::Int(_))))
}

fn builtin_is_float(scope: &ScopeRef) -> Rtr {
    Rtr::ok(bool_value(matches!(arg(scope, "value"), Value::Float(_))))
}

fn builtin_is_num(scope: &ScopeRef) -> Rtr {
    Rtr::ok(bool_value(matches!(arg(scope, "value"), Value::Int(_) | Value::Float(_))))
}

fn builtin_is_str(scope: &ScopeRef) -> Rtr {
    Rtr::ok(bool_value(matches!(arg(scope, "value"), Value::String(_))))
}

fn builtin_is_list(scope: &ScopeRef) -> Rtr {
    Rtr::ok(bool_value(matches!(arg(scope, "value"), Value::List(_))))
}

fn builtin_is_func(scope: &ScopeRef) -> Rtr {
    Rtr::ok(bool_value(arg(scope, "value").is_callable()))
}

fn builtin_is_none(scope: &ScopeRef) -> Rtr {
    Rtr::ok(bool_value(matches!(arg(scope, "value"), Value::None)))
}

fn builtin_append(scope: &ScopeRef) -> Rtr {
    let list = match expect_list(scope, "list") {
        Ok(l) => l,
        Err(e) => return e,
    };
    list.borrow_mut().push(arg(scope, "value"));
    Rtr::none()
}

fn builtin_pop(scope: &ScopeRef) -> Rtr {
    let list = match expect_list(scope, "list") {
        Ok(l) => l,
        Err(e) => return e,
    };
    let index = match arg(scope, "index") {
        Value::Int(n) => n,
        Value::None => -1,
        other => return type_error(scope, format!("'index' must be an int, got {}", other.type_tag())),
    };
    let mut list = list.borrow_mut();
    let len = list.len() as i64;
    let real_index = if index < 0 { len + index } else { index };
    if real_index < 0 || real_index >= len {
        return Rtr::err(NougaroError::new(
            ErrorKind::RtIndex,
            scope.call_span(),
            format!("pop index {index} out of range"),
        ));
    }
    Rtr::ok(list.remove(real_index as usize))
}

fn builtin_insert(scope: &ScopeRef) -> Rtr {
    let list = match expect_list(scope, "list") {
        Ok(l) => l,
        Err(e) => return e,
    };
    let index = match arg(scope, "index") {
        Value::Int(n) => n,
        other => return type_error(scope, format!("'index' must be an int, got {}", other.type_tag())),
    };
    let mut list = list.borrow_mut();
    let len = list.len() as i64;
    let real_index = index.clamp(0, len) as usize;
    list.insert(real_index, arg(scope, "value"));
    Rtr::none()
}

fn builtin_extend(scope: &ScopeRef) -> Rtr {
    let list = match expect_list(scope, "list") {
        Ok(l) => l,
        Err(e) => return e,
    };
    let other = match expect_list(scope, "other") {
        Ok(l) => l,
        Err(e) => return e,
    };
    list.borrow_mut().extend(other.borrow().iter().cloned());
    Rtr::none()
}

fn builtin_len(scope: &ScopeRef) -> Rtr {
    let n = match arg(scope, "value") {
        Value::List(l) => l.borrow().len(),
        Value::String(s) => s.chars().count(),
        other => return type_error(scope, format!("'{}' has no len()", other.type_tag())),
    };
    Rtr::ok(Value::Int(n as i64))
}

fn builtin_type(scope: &ScopeRef) -> Rtr {
    Rtr::ok(Value::string(arg(scope, "value").type_tag()))
}

fn builtin_str(scope: &ScopeRef) -> Rtr {
    Rtr::ok(Value::string(arg(scope, "value").to_string()))
}

fn builtin_int(scope: &ScopeRef) -> Rtr {
    let value = match arg(scope, "value") {
        Value::Int(n) => n,
        Value::Float(n) => n as i64,
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => {
                return Rtr::err(NougaroError::new(
                    ErrorKind::RtType,
                    scope.call_span(),
                    format!("cannot convert '{s}' to int"),
                ))
            }
        },
        other => return type_error(scope, format!("cannot convert {} to int", other.type_tag())),
    };
    Rtr::ok(Value::Int(value))
}

fn builtin_float(scope: &ScopeRef) -> Rtr {
    let value = match arg(scope, "value") {
        Value::Int(n) => n as f64,
        Value::Float(n) => n,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => n,
            Err(_) => {
                return Rtr::err(NougaroError::new(
                    ErrorKind::RtType,
                    scope.call_span(),
                    format!("cannot convert '{s}' to float"),
                ))
            }
        },
        other => return type_error(scope, format!("cannot convert {} to float", other.type_tag())),
    };
    Rtr::ok(Value::Float(value))
}

fn builtin_list(scope: &ScopeRef) -> Rtr {
    let elements = match arg(scope, "value") {
        Value::List(l) => l.borrow().clone(),
        Value::String(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
        other => return type_error(scope, format!("cannot convert {} to list", other.type_tag())),
    };
    Rtr::ok(Value::list(elements))
}

fn numeric_cmp(values: &[Value], pick_max: bool) -> Option<Value> {
    values.iter().cloned().reduce(|a, b| {
        let a_f = match &a {
            Value::Int(n) => *n as f64,
            Value::Float(n) => *n,
            _ => return a,
        };
        let b_f = match &b {
            Value::Int(n) => *n as f64,
            Value::Float(n) => *n,
            _ => return a,
        };
        let take_b = if pick_max { b_f > a_f } else { b_f < a_f };
        if take_b {
            b
        } else {
            a
        }
    })
}

fn builtin_max(scope: &ScopeRef) -> Rtr {
    let list = match expect_list(scope, "values") {
        Ok(l) => l,
        Err(e) => return e,
    };
    let result = match numeric_cmp(&list.borrow(), true) {
        Some(v) => Rtr::ok(v),
        None => type_error(scope, "max() requires at least one value"),
    };
    result
}

fn builtin_min(scope: &ScopeRef) -> Rtr {
    let list = match expect_list(scope, "values") {
        Ok(l) => l,
        Err(e) => return e,
    };
    let result = match numeric_cmp(&list.borrow(), false) {
        Some(v) => Rtr::ok(v),
        None => type_error(scope, "min() requires at least one value"),
    };
    result
}

fn builtin_lower(scope: &ScopeRef) -> Rtr {
    match arg(scope, "value") {
        Value::String(s) => Rtr::ok(Value::string(s.to_lowercase())),
        other => type_error(scope, format!("'value' must be a str, got {}", other.type_tag())),
    }
}

fn builtin_upper(scope: &ScopeRef) -> Rtr {
    match arg(scope, "value") {
        Value::String(s) => Rtr::ok(Value::string(s.to_uppercase())),
        other => type_error(scope, format!("'value' must be a str, got {}", other.type_tag())),
    }
}

fn builtin_exit(scope: &ScopeRef) -> Rtr {
    let code = match arg(scope, "code") {
        Value::Int(n) => n as i32,
        Value::None => 0,
        other => return type_error(scope, format!("'code' must be an int, got {}", other.type_tag())),
    };
    Rtr::exit(code)
}

macro_rules! descriptor {
    ($name:literal, [$($req:literal),*], [$($opt:literal),*], $strict:literal, $f:ident) => {
        BuiltinDescriptor {
            name: $name,
            param_names: vec![$($req),*],
            optional_params: vec![$($opt),*],
            strict_arity: $strict,
            needs_work_dir: false,
            needs_module_dir: false,
            func: $f,
        }
    };
}

/// The dispatch table: name -> descriptor. Built once, looked up by the
/// evaluator whenever a `VarAccess` resolves to a name the root scope
/// pre-bound as a built-in.
pub static BUILTINS: Lazy<HashMap<&'static str, BuiltinDescriptor>> = Lazy::new(|| {
    let mut m = HashMap::new();
    let mut add = |d: BuiltinDescriptor| {
        m.insert(d.name, d);
    };
    add(descriptor!("void", [], [], false, builtin_void));
    add(descriptor!("print", ["value"], [], true, builtin_print));
    add(descriptor!("print_ret", ["value"], [], true, builtin_print_ret));
    add(descriptor!("is_int", ["value"], [], true, builtin_is_int));
    add(descriptor!("is_float", ["value"], [], true, builtin_is_float));
    add(descriptor!("is_num", ["value"], [], true, builtin_is_num));
    add(descriptor!("is_str", ["value"], [], true, builtin_is_str));
    add(descriptor!("is_list", ["value"], [], true, builtin_is_list));
    add(descriptor!("is_func", ["value"], [], true, builtin_is_func));
    add(descriptor!("is_none", ["value"], [], true, builtin_is_none));
    add(descriptor!("append", ["list", "value"], [], true, builtin_append));
    add(descriptor!("pop", ["list"], ["index"], false, builtin_pop));
    add(descriptor!("insert", ["list", "index", "value"], [], true, builtin_insert));
    add(descriptor!("extend", ["list", "other"], [], true, builtin_extend));
    add(descriptor!("len", ["value"], [], true, builtin_len));
    add(descriptor!("type", ["value"], [], true, builtin_type));
    add(descriptor!("str", ["value"], [], true, builtin_str));
    add(descriptor!("int", ["value"], [], true, builtin_int));
    add(descriptor!("float", ["value"], [], true, builtin_float));
    add(descriptor!("list", ["value"], [], true, builtin_list));
    add(descriptor!("max", ["values"], [], true, builtin_max));
    add(descriptor!("min", ["values"], [], true, builtin_min));
    add(descriptor!("lower", ["value"], [], true, builtin_lower));
    add(descriptor!("upper", ["value"], [], true, builtin_upper));
    add(descriptor!("exit", [], ["code"], false, builtin_exit));
    m
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_contains_scenario_builtins() {
        assert!(BUILTINS.contains_key("print"));
        assert!(BUILTINS.contains_key("append"));
    }

    #[test]
    fn numeric_cmp_picks_max_and_min() {
        let values = vec![Value::Int(3), Value::Float(7.5), Value::Int(-2)];
        assert!(matches!(numeric_cmp(&values, true), Some(Value::Float(n)) if n == 7.5));
        assert!(matches!(numeric_cmp(&values, false), Some(Value::Int(-2))));
    }
}
