//! Module loading for `import`: resolve a dotted path against a built-in
//! registry first, then against on-disk source files relative to a
//! configured library root, logging each resolution attempt.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::builtins::math;
use crate::context::Scope;
use crate::error::{ContextFrame, ErrorKind, NougaroError};
use crate::rtr::Rtr;
use crate::source::{Source, Span};
use crate::value::{ModuleValue, Value};
use crate::{lexer, parser};

pub struct Loader {
    pub lib_root: PathBuf,
}

impl Loader {
    pub fn new(lib_root: PathBuf) -> Loader {
        Loader { lib_root }
    }

    /// Resolves `path` (e.g. `["collections", "stack"]`) to a `Value::Module`.
    /// Built-ins are checked first; this is a closed, small registry so a
    /// linear match is clearer than a dynamic table.
    pub fn resolve(&self, path: &[String], span: &Span) -> Result<Value, NougaroError> {
        if path.len() == 1 {
            if let Some(module) = self.builtin_module(&path[0]) {
                log::debug!("import: resolved '{}' from built-in registry", path[0]);
                return Ok(module);
            }
        }

        let file_path = self.source_path(path);
        log::debug!("import: looking for {} at {}", path.join("?"), file_path.display());
        self.load_source_module(path, &file_path, span)
    }

    fn builtin_module(&self, name: &str) -> Option<Value> {
        match name {
            "math" => Some(math::build_module()),
            _ => None,
        }
    }

    fn source_path(&self, path: &[String]) -> PathBuf {
        let mut p = self.lib_root.clone();
        for segment in path {
            p.push(segment);
        }
        p.set_extension("nou");
        p
    }

    fn load_source_module(
        &self,
        path: &[String],
        file_path: &Path,
        span: &Span,
    ) -> Result<Value, NougaroError> {
        let text = fs::read_to_string(file_path).map_err(|e| {
            NougaroError::new(
                ErrorKind::RunTime,
                span.clone(),
                format!("cannot import '{}': {e}", path.join("?")),
            )
        })?;

        let name = path.join("?");
        let source = Source::new(file_path.display().to_string(), text);
        let tokens = lexer::tokenize(source)?;
        let ast = parser::parse(tokens)?;

        let module_scope = Scope::new(format!("<module {name}>"), None);
        let evaluator = crate::eval::Evaluator::new(Loader::new(self.lib_root.clone()));
        evaluator.prebind_constants(&module_scope);

        let result = evaluator.visit(&ast, &module_scope);
        if let Some(error) = result.error {
            let frame = ContextFrame {
                display_name: format!("module {name}"),
                file: span.start.source.name.clone(),
                line: span.start.line,
            };
            return Err(error.push_frame(frame));
        }

        let exports = module_scope.exported();
        Ok(Value::Module(Rc::new(ModuleValue { name, exports: exports.into() })))
    }
}

/// Converts a module-load failure into a runtime-result error for callers
/// that are already inside an `Rtr`-returning visit method.
pub fn as_rtr(result: Result<Value, NougaroError>) -> Rtr {
    match result {
        Ok(v) => Rtr::ok(v),
        Err(e) => Rtr::err(e),
    }
}
