//! End-to-end scenarios run through the public `nou::run_source` entry
//! point, one process per test, no interpreter internals touched.

use std::path::PathBuf;

use nou::error::ErrorKind;
use nou::value::Value;

fn lib_root() -> PathBuf {
    PathBuf::from(".")
}

fn run(src: &str) -> Result<nou::RunOutcome, nou::error::NougaroError> {
    nou::run_source("<test>", src, &lib_root())
}

#[test]
fn arithmetic_precedence_gives_mul_before_add() {
    let outcome = run("2 + 3 * 4").unwrap();
    assert!(matches!(outcome.value, Value::Int(14)));
}

#[test]
fn compound_assignment_accumulates() {
    let outcome = run("var a = 5\nvar a += 3\na").unwrap();
    assert!(matches!(outcome.value, Value::Int(8)));
}

#[test]
fn recursive_factorial() {
    let src = "def fact(n)\n  if n <= 1 then return 1\n  return n * fact(n - 1)\nend\nfact(6)";
    let outcome = run(src).unwrap();
    assert!(matches!(outcome.value, Value::Int(720)));
}

#[test]
fn for_loop_accumulates_squares_with_exclusive_end() {
    let outcome = run("for i = 1 to 5 then i * i").unwrap();
    let Value::List(l) = outcome.value else { panic!("expected a list, got {:?}", outcome.value) };
    let values: Vec<i64> = l.borrow().iter().map(|v| match v {
        Value::Int(n) => *n,
        other => panic!("expected ints, got {other:?}"),
    }).collect();
    assert_eq!(values, vec![1, 4, 9, 16]);
}

#[test]
fn importing_math_exposes_pi() {
    let outcome = run("import math\nmath?pi").unwrap();
    match outcome.value {
        Value::Float(pi) => assert!((pi - std::f64::consts::PI).abs() < 1e-9),
        other => panic!("expected a float, got {other:?}"),
    }
}

#[test]
fn failed_assertion_carries_its_message_and_reports_as_assertion_error() {
    let err = run("assert 1 == 2, \"boom\"").unwrap_err();
    assert_eq!(err.kind, ErrorKind::RtAssertion);
    assert_eq!(err.message, "boom");
}

#[test]
fn append_mutates_the_list_in_place() {
    let outcome = run("var x = [1, 2, 3]\nappend(x, 4)\nx").unwrap();
    let Value::List(l) = outcome.value else { panic!("expected a list, got {:?}", outcome.value) };
    let values: Vec<i64> = l.borrow().iter().map(|v| match v {
        Value::Int(n) => *n,
        other => panic!("expected ints, got {other:?}"),
    }).collect();
    assert_eq!(values, vec![1, 2, 3, 4]);
}

#[test]
fn protected_constants_cannot_be_reassigned() {
    let err = run("var True = 0").unwrap_err();
    assert_eq!(err.kind, ErrorKind::RunTime);
}

#[test]
fn comparison_chains_are_equivalent_to_conjoined_pairwise_comparisons() {
    let chained = run("1 < 2 < 3").unwrap();
    let pairwise = run("(1 < 2) and (2 < 3)").unwrap();
    assert_eq!(chained.value.to_string(), pairwise.value.to_string());
}

#[test]
fn function_captures_its_defining_scope_not_the_caller_scope() {
    let src = "var x = 1\ndef f()\n  return x\nend\ndef g()\n  var x = 2\n  return f()\nend\ng()";
    let outcome = run(src).unwrap();
    assert!(matches!(outcome.value, Value::Int(1)));
}

#[test]
fn running_the_same_source_twice_yields_the_same_result() {
    let src = "def square(n) -> n * n\nsquare(9)";
    let first = run(src).unwrap();
    let second = run(src).unwrap();
    assert_eq!(first.value.to_string(), second.value.to_string());
}

#[test]
fn a_syntax_error_is_reported_with_a_source_excerpt() {
    let err = run("var = 1").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidSyntax);
    assert!(err.to_string().contains("var = 1"));
}

#[test]
fn exit_builtin_unwinds_every_enclosing_scope() {
    let src = "def f()\n  exit(3)\n  return 1\nend\ndef g()\n  f()\n  return 2\nend\ng()";
    let outcome = run(src).unwrap();
    assert_eq!(outcome.exit_code, Some(3));
}

#[test]
fn return_outside_any_function_is_a_runtime_error() {
    let err = run("return 5").unwrap_err();
    assert_eq!(err.kind, ErrorKind::RunTime);
}

#[test]
fn an_error_raised_inside_a_call_reports_the_call_chain() {
    let src = "def inner()\n  1 / 0\nend\ndef outer()\n  inner()\nend\nouter()";
    let err = run(src).unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("In function inner"), "{rendered}");
    assert!(rendered.contains("In function outer"), "{rendered}");
}
