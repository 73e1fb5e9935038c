//! Lexer, parser and tree-walking evaluator for the nougaro scripting
//! language, plus the ambient CLI/config/logging stack built around it.

pub mod builtins;
pub mod config;
pub mod context;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod rtr;
pub mod source;
pub mod value;

use std::path::Path;

use context::Scope;
use error::{ErrorKind, NougaroError};
use loader::Loader;
use value::Value;

/// Result of running a program to completion: its final value, plus the
/// `exit` built-in's status code if it fired. An `exit` sentinel unwinds
/// every enclosing scope rather than just returning a value.
#[derive(Debug)]
pub struct RunOutcome {
    pub value: Value,
    pub exit_code: Option<i32>,
}

/// Runs one complete program from source text under a fresh root scope
/// pre-bound with constants and built-ins. This is the entry point both the
/// `nou` binary and the integration tests drive.
pub fn run_source(
    name: impl Into<String>,
    text: impl Into<String>,
    lib_root: &Path,
) -> Result<RunOutcome, NougaroError> {
    let source = source::Source::new(name, text);
    let tokens = lexer::tokenize(source)?;
    let ast = parser::parse(tokens)?;

    let evaluator = eval::Evaluator::new(Loader::new(lib_root.to_path_buf()));
    let scope = Scope::new("<module>", None);
    evaluator.prebind_constants(&scope);

    let result = evaluator.visit(&ast, &scope);
    match result.error {
        Some(e) => Err(e),
        None if result.should_return => Err(NougaroError::new(
            ErrorKind::RunTime,
            ast.span.clone(),
            "'return' outside of a function",
        )),
        None => Ok(RunOutcome { value: result.value.unwrap_or(Value::None), exit_code: result.should_exit }),
    }
}
