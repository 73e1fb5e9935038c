//! Operator semantics: arithmetic promotion, string/list `+`/`*`,
//! bitwise, comparisons and unary operators. Kept as free functions over
//! `(Value, Value) -> Value` rather than methods on `Value`, so the
//! evaluator can call them the same way for every binary node.

use crate::error::{ErrorKind, NougaroError};
use crate::parser::ast::{BinOpKind, CompareOp, UnaryOpKind};
use crate::source::Span;
use crate::value::Value;

type OpResult = Result<Value, NougaroError>;

fn type_error(span: &Span, message: impl Into<String>) -> NougaroError {
    NougaroError::new(ErrorKind::RtType, span.clone(), message.into())
}

fn arith_error(span: &Span, message: impl Into<String>) -> NougaroError {
    NougaroError::new(ErrorKind::RtArithmetic, span.clone(), message.into())
}

pub fn apply_binop(op: BinOpKind, left: Value, right: Value, span: &Span) -> OpResult {
    use BinOpKind::*;
    match op {
        Add | Sub | Mul | Div | FloorDiv | Mod | Pow => numeric_or_collection_op(op, left, right, span),
        BitAnd | BitOr | BitXor => bitwise_op(op, left, right, span),
        And => Ok(Value::Int(if left.is_truthy() && right.is_truthy() { 1 } else { 0 })),
        Or => Ok(Value::Int(if left.is_truthy() || right.is_truthy() { 1 } else { 0 })),
        Xor => Ok(Value::Int(if left.is_truthy() ^ right.is_truthy() { 1 } else { 0 })),
    }
}

fn numeric_or_collection_op(op: BinOpKind, left: Value, right: Value, span: &Span) -> OpResult {
    use BinOpKind::*;
    match (op, &left, &right) {
        (Add, Value::String(a), Value::String(b)) => Ok(Value::string(format!("{a}{b}"))),
        (Mul, Value::String(a), Value::Int(n)) | (Mul, Value::Int(n), Value::String(a)) => {
            if *n < 0 {
                return Err(arith_error(span, "cannot repeat a string a negative number of times"));
            }
            Ok(Value::string(a.repeat(*n as usize)))
        }
        (Add, Value::List(a), Value::List(b)) => {
            let mut out = a.borrow().clone();
            out.extend(b.borrow().iter().cloned());
            Ok(Value::list(out))
        }
        (Mul, Value::List(a), Value::Int(n)) | (Mul, Value::Int(n), Value::List(a)) => {
            if *n < 0 {
                return Err(arith_error(span, "cannot repeat a list a negative number of times"));
            }
            let mut out = Vec::with_capacity(a.borrow().len() * (*n as usize));
            for _ in 0..*n {
                out.extend(a.borrow().iter().cloned());
            }
            Ok(Value::list(out))
        }
        _ => numeric_op(op, left, right, span),
    }
}

fn numeric_op(op: BinOpKind, left: Value, right: Value, span: &Span) -> OpResult {
    use BinOpKind::*;
    let (a, b) = match (&left, &right) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => (left, right),
        _ => {
            return Err(type_error(
                span,
                format!("unsupported operand types for {:?}: '{}' and '{}'", op, left.type_tag(), right.type_tag()),
            ))
        }
    };

    let both_int = matches!((&a, &b), (Value::Int(_), Value::Int(_)));
    if both_int {
        let (Value::Int(x), Value::Int(y)) = (a, b) else { unreachable!() };
        return int_op(op, x, y, span);
    }

    let x = as_f64(&a);
    let y = as_f64(&b);
    float_op(op, x, y, span)
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => unreachable!("as_f64 called on a non-numeric value"),
    }
}

fn int_op(op: BinOpKind, x: i64, y: i64, span: &Span) -> OpResult {
    use BinOpKind::*;
    match op {
        Add => Ok(Value::Int(x.wrapping_add(y))),
        Sub => Ok(Value::Int(x.wrapping_sub(y))),
        Mul => Ok(Value::Int(x.wrapping_mul(y))),
        Div => {
            if y == 0 {
                return Err(arith_error(span, "division by zero"));
            }
            if x % y == 0 {
                Ok(Value::Int(x / y))
            } else {
                Ok(Value::Float(x as f64 / y as f64))
            }
        }
        FloorDiv => {
            if y == 0 {
                return Err(arith_error(span, "division by zero"));
            }
            Ok(Value::Int(x.div_euclid(y)))
        }
        Mod => {
            if y == 0 {
                return Err(arith_error(span, "division by zero"));
            }
            Ok(Value::Int(x.rem_euclid(y)))
        }
        Pow => {
            if y >= 0 {
                match x.checked_pow(y as u32) {
                    Some(v) => Ok(Value::Int(v)),
                    None => Ok(Value::Float((x as f64).powf(y as f64))),
                }
            } else {
                Ok(Value::Float((x as f64).powf(y as f64)))
            }
        }
        _ => unreachable!("int_op only handles arithmetic operators"),
    }
}

fn float_op(op: BinOpKind, x: f64, y: f64, span: &Span) -> OpResult {
    use BinOpKind::*;
    match op {
        Add => Ok(Value::Float(x + y)),
        Sub => Ok(Value::Float(x - y)),
        Mul => Ok(Value::Float(x * y)),
        Div => {
            if y == 0.0 {
                return Err(arith_error(span, "division by zero"));
            }
            Ok(Value::Float(x / y))
        }
        FloorDiv => {
            if y == 0.0 {
                return Err(arith_error(span, "division by zero"));
            }
            Ok(Value::Float((x / y).floor()))
        }
        Mod => {
            if y == 0.0 {
                return Err(arith_error(span, "division by zero"));
            }
            Ok(Value::Float(x.rem_euclid(y)))
        }
        Pow => Ok(Value::Float(x.powf(y))),
        _ => unreachable!("float_op only handles arithmetic operators"),
    }
}

fn bitwise_op(op: BinOpKind, left: Value, right: Value, span: &Span) -> OpResult {
    let (Value::Int(a), Value::Int(b)) = (&left, &right) else {
        return Err(type_error(
            span,
            format!("bitwise operators require int operands, got '{}' and '{}'", left.type_tag(), right.type_tag()),
        ));
    };
    Ok(Value::Int(match op {
        BinOpKind::BitAnd => a & b,
        BinOpKind::BitOr => a | b,
        BinOpKind::BitXor => a ^ b,
        _ => unreachable!("bitwise_op only handles bitwise operators"),
    }))
}

pub fn apply_unary(op: UnaryOpKind, value: Value, span: &Span) -> OpResult {
    match op {
        UnaryOpKind::Not => Ok(Value::Int(if value.is_truthy() { 0 } else { 1 })),
        UnaryOpKind::Plus => match value {
            Value::Int(_) | Value::Float(_) => Ok(value),
            other => Err(type_error(span, format!("unary '+' requires a number, got '{}'", other.type_tag()))),
        },
        UnaryOpKind::Neg => match value {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(type_error(span, format!("unary '-' requires a number, got '{}'", other.type_tag()))),
        },
        UnaryOpKind::BitNot => match value {
            Value::Int(n) => Ok(Value::Int(!n)),
            other => Err(type_error(span, format!("'~' requires an int, got '{}'", other.type_tag()))),
        },
    }
}

/// Returns the truth value of `left OP right`; used both for a plain
/// comparison expression and for each link of a `CompareChain`.
pub fn apply_compare(op: CompareOp, left: &Value, right: &Value, span: &Span) -> Result<bool, NougaroError> {
    use CompareOp::*;
    match op {
        Eq => Ok(values_equal(left, right)),
        Ne => Ok(!values_equal(left, right)),
        Lt | Gt | Lte | Gte => {
            let ordering = numeric_ordering(left, right, span)?;
            Ok(match op {
                Lt => ordering.is_lt(),
                Gt => ordering.is_gt(),
                Lte => ordering.is_le(),
                Gte => ordering.is_ge(),
                _ => unreachable!(),
            })
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::None, Value::None) => true,
        (Value::List(a), Value::List(b)) => {
            let (a, b) = (a.borrow(), b.borrow());
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        _ => false,
    }
}

fn numeric_ordering(left: &Value, right: &Value, span: &Span) -> Result<std::cmp::Ordering, NougaroError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (a, b) if matches!(a, Value::Int(_) | Value::Float(_)) && matches!(b, Value::Int(_) | Value::Float(_)) => {
            as_f64(a).partial_cmp(&as_f64(b)).ok_or_else(|| arith_error(span, "NaN comparison"))
        }
        _ => Err(type_error(
            span,
            format!("cannot order '{}' and '{}'", left.type_tag(), right.type_tag()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Position, Source};

    fn dummy_span() -> Span {
        let source = Source::new("<test>", "");
        let pos = Position::start(source);
        Span::new(pos.clone(), pos)
    }

    #[test]
    fn int_division_promotes_to_float_on_remainder() {
        let span = dummy_span();
        assert!(matches!(apply_binop(BinOpKind::Div, Value::Int(7), Value::Int(2), &span), Ok(Value::Float(_))));
        assert!(matches!(apply_binop(BinOpKind::Div, Value::Int(6), Value::Int(2), &span), Ok(Value::Int(3))));
    }

    #[test]
    fn division_by_zero_is_arithmetic_error() {
        let span = dummy_span();
        let err = apply_binop(BinOpKind::Div, Value::Int(1), Value::Int(0), &span).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RtArithmetic);
    }

    #[test]
    fn string_repeat_and_concat() {
        let span = dummy_span();
        let r = apply_binop(BinOpKind::Mul, Value::string("ab"), Value::Int(3), &span).unwrap();
        assert_eq!(r.to_string(), "ababab");
    }

    #[test]
    fn bitwise_requires_ints() {
        let span = dummy_span();
        let err = apply_binop(BinOpKind::BitAnd, Value::Int(1), Value::string("x"), &span).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RtType);
    }
}
