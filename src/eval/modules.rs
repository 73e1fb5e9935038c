//! Imports and exports. Resolution itself lives in [`crate::loader`]; this
//! module only handles binding the resolved value
//! into the importing scope and recording exports on the current scope's
//! export table (which the loader reads back once the module body has
//! finished running).

use super::Evaluator;
use crate::context::ScopeRef;
use crate::error::{ErrorKind, NougaroError};
use crate::loader;
use crate::parser::ast::{Node, NodeKind};
use crate::rtr::Rtr;
use crate::source::Span;

impl Evaluator {
    pub(super) fn visit_import(&self, path: &[String], alias: Option<&str>, scope: &ScopeRef, span: &Span) -> Rtr {
        let rtr = loader::as_rtr(self.loader.resolve(path, span));
        let module = match rtr.value {
            Some(v) => v,
            None => return rtr,
        };
        let bound_name = alias
            .map(str::to_string)
            .unwrap_or_else(|| path.last().cloned().expect("import path always has a first segment"));

        // Module names are VARS_CANNOT_MODIFY.
        scope.declare(bound_name.clone(), module);
        scope.mark_protected(bound_name);
        Rtr::none()
    }

    pub(super) fn visit_export(
        &self,
        expr: &Node,
        is_ident: bool,
        alias: Option<&str>,
        scope: &ScopeRef,
        span: &Span,
    ) -> Rtr {
        let mut rtr = Rtr::none();
        let value = match rtr.register(self.visit(expr, scope)) {
            Some(v) => v,
            None => return rtr,
        };

        let export_name = if is_ident {
            let NodeKind::VarAccess { chain } = &*expr.kind else {
                unreachable!("is_ident implies a bare VarAccess")
            };
            alias.map(str::to_string).unwrap_or_else(|| chain[0].clone())
        } else {
            match alias {
                Some(a) => a.to_string(),
                None => {
                    return Rtr::err(NougaroError::new(
                        ErrorKind::RunTime,
                        span.clone(),
                        "export of a non-identifier expression requires an alias",
                    ))
                }
            }
        };

        scope.export(export_name, value.clone());
        Rtr::ok(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Scope;
    use crate::eval::Evaluator;
    use crate::lexer::tokenize;
    use crate::loader::Loader;
    use crate::parser::parse;
    use crate::source::{Position, Source, Span};
    use crate::value::Value;

    fn dummy_span() -> Span {
        let source = Source::new("<test>", "");
        let pos = Position::start(source);
        Span::new(pos.clone(), pos)
    }

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
    fn import_resolves_math_builtin_and_marks_it_protected() {
        let rtr = eval("import math\nmath?pi");
        assert!(matches!(rtr.value, Some(Value::Float(_))));

        let rtr = eval("import math\nvar math = 1");
        assert!(rtr.is_err());
    }

    #[test]
    fn import_alias_binds_under_the_alias_name() {
        let rtr = eval("import math as m\nm?e");
        assert!(matches!(rtr.value, Some(Value::Float(_))));
    }

    #[test]
    fn export_of_identifier_reuses_its_own_name_without_alias() {
        let dir = std::env::temp_dir().join("nou_modules_test_ident");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("greet.nou"), "var message = \"hi\"\nexport message").unwrap();

        let evaluator = Evaluator::new(Loader::new(dir.clone()));
        let value = evaluator.loader.resolve(&["greet".to_string()], &dummy_span()).unwrap();
        let Value::Module(m) = value else { panic!() };
        assert_eq!(m.exports.borrow().get("message").unwrap().to_string(), "hi");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn export_of_expression_requires_an_alias() {
        let dir = std::env::temp_dir().join("nou_modules_test_expr");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bad.nou"), "export 1 + 1").unwrap();

        let evaluator = Evaluator::new(Loader::new(dir.clone()));
        let err = evaluator.loader.resolve(&["bad".to_string()], &dummy_span()).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::RunTime);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn export_of_expression_with_alias_binds_under_the_alias() {
        let dir = std::env::temp_dir().join("nou_modules_test_alias");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("values.nou"), "export 1 + 1 as two").unwrap();

        let evaluator = Evaluator::new(Loader::new(dir.clone()));
        let value = evaluator.loader.resolve(&["values".to_string()], &dummy_span()).unwrap();
        let Value::Module(m) = value else { panic!() };
        assert_eq!(m.exports.borrow().get("two").unwrap().to_string(), "2");

        std::fs::remove_dir_all(&dir).ok();
    }
}
