//! File I/O statements: `write`, `read`, `$print`. Kept as direct
//! `std::fs` calls rather than going through a trait object, since
//! nougaro has exactly these two file operations and no injectable
//! filesystem abstraction.

use std::fs::{self, OpenOptions};
use std::io::Write as _;

use super::Evaluator;
use crate::context::ScopeRef;
use crate::error::{ErrorKind, NougaroError};
use crate::parser::ast::{LineSelector, Node};
use crate::rtr::Rtr;
use crate::source::Span;
use crate::value::Value;

fn type_error(span: &Span, message: impl Into<String>) -> NougaroError {
    NougaroError::new(ErrorKind::RtType, span.clone(), message.into())
}

fn expect_path(value: &Value, span: &Span) -> Result<String, NougaroError> {
    match value {
        Value::String(s) => Ok(s.to_string()),
        other => Err(type_error(span, format!("file path must be a str, got {}", other.type_tag()))),
    }
}

fn overwrite_line(path: &str, line_no: i64, content: &str) -> std::io::Result<()> {
    let existing = fs::read_to_string(path).unwrap_or_default();
    let mut lines: Vec<String> = existing.lines().map(str::to_string).collect();
    let index = (line_no - 1) as usize;
    while lines.len() <= index {
        lines.push(String::new());
    }
    lines[index] = content.to_string();
    fs::write(path, lines.join("\n") + "\n")
}

fn append_line(path: &str, content: &str) -> std::io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{content}")
}

impl Evaluator {
    pub(super) fn visit_write(
        &self,
        expr: &Node,
        file: &Node,
        overwrite: bool,
        line: Option<&LineSelector>,
        scope: &ScopeRef,
        span: &Span,
    ) -> Rtr {
        let mut rtr = Rtr::none();
        let value = match rtr.register(self.visit(expr, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        let file_value = match rtr.register(self.visit(file, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        let path = match expect_path(&file_value, span) {
            Ok(p) => p,
            Err(e) => return Rtr::err(e),
        };
        let content = value.to_string();

        let result = match line {
            Some(LineSelector::Line(n)) => {
                let idx = match rtr.register(self.visit(n, scope)) {
                    Some(v) => v,
                    None => return rtr,
                };
                let Value::Int(line_no) = idx else {
                    return Rtr::err(type_error(span, "write line number must be an int"));
                };
                if line_no < 1 {
                    return Rtr::err(NougaroError::new(ErrorKind::RtIndex, span.clone(), "line numbers are 1-based"));
                }
                overwrite_line(&path, line_no, &content)
            }
            Some(LineSelector::All) => unreachable!("write never produces LineSelector::All"),
            None if overwrite => fs::write(&path, content.clone()),
            None => append_line(&path, &content),
        };

        match result {
            Ok(()) => Rtr::ok(Value::string(content)),
            Err(e) => Rtr::err(NougaroError::new(ErrorKind::RunTime, span.clone(), format!("cannot write '{path}': {e}"))),
        }
    }

    pub(super) fn visit_read(
        &self,
        file: &Node,
        target: Option<&str>,
        line: &LineSelector,
        scope: &ScopeRef,
        span: &Span,
    ) -> Rtr {
        let mut rtr = Rtr::none();
        let file_value = match rtr.register(self.visit(file, scope)) {
            Some(v) => v,
            None => return rtr,
        };
        let path = match expect_path(&file_value, span) {
            Ok(p) => p,
            Err(e) => return Rtr::err(e),
        };
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                return Rtr::err(NougaroError::new(ErrorKind::RunTime, span.clone(), format!("cannot read '{path}': {e}")))
            }
        };

        let result_value = match line {
            LineSelector::All => Value::string(text),
            LineSelector::Line(n) => {
                let idx = match rtr.register(self.visit(n, scope)) {
                    Some(v) => v,
                    None => return rtr,
                };
                let Value::Int(line_no) = idx else {
                    return Rtr::err(type_error(span, "read line number must be an int"));
                };
                if line_no < 1 {
                    return Rtr::err(NougaroError::new(ErrorKind::RtIndex, span.clone(), "line numbers are 1-based"));
                }
                match text.lines().nth((line_no - 1) as usize) {
                    Some(l) => Value::string(l.to_string()),
                    None => {
                        return Rtr::err(NougaroError::new(
                            ErrorKind::RtIndex,
                            span.clone(),
                            format!("line {line_no} out of range"),
                        ))
                    }
                }
            }
        };

        match target {
            Some(name) => {
                scope.declare(name.to_string(), result_value);
                Rtr::none()
            }
            None => Rtr::ok(result_value),
        }
    }

    pub(super) fn visit_dollar_print(&self, name: &str, scope: &ScopeRef, span: &Span) -> Rtr {
        match scope.get(name) {
            Some(v) => {
                println!("{v}");
                Rtr::none()
            }
            None => Rtr::err(NougaroError::new(ErrorKind::RtName, span.clone(), format!("'{name}' is not defined"))),
        }
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
    fn write_then_read_round_trips_through_a_temp_file() {
        let path = std::env::temp_dir().join("nou_io_test_round_trip.nou.tmp");
        let path_str = path.to_str().unwrap().replace('\\', "\\\\");
        let _ = std::fs::remove_file(&path);

        let rtr = eval(&format!("write \"hello\" !>> \"{path_str}\""));
        assert!(!rtr.is_err(), "{:?}", rtr.error);

        let rtr = eval(&format!("read \"{path_str}\""));
        assert!(matches!(rtr.value, Some(Value::String(s)) if s.as_str() == "hello"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn dollar_print_requires_a_bound_name() {
        let rtr = eval("$missing");
        assert!(rtr.is_err());
    }
}
