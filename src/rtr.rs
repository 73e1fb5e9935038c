//! RuntimeResult.
//!
//! The sole return medium of the evaluator: exactly one of `value`/`error`
//! is populated when an operation completes, and `should_return`/
//! `should_break`/`should_continue` thread non-local control flow without
//! Rust-level panics or early-return sentinels other than this struct
//! itself. `register` folds a child result into the parent, handing back
//! its value only if nothing short-circuits.

use crate::error::NougaroError;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct Rtr {
    pub value: Option<Value>,
    pub error: Option<NougaroError>,
    pub should_return: bool,
    pub should_break: bool,
    pub should_continue: bool,
    /// Set by the `exit` built-in; unlike `should_return` this is never
    /// caught by a function call boundary, only by the top-level driver. A
    /// program ends the moment this fires, unwinding every enclosing
    /// scope.
    pub should_exit: Option<i32>,
}

impl Rtr {
    pub fn ok(value: Value) -> Rtr {
        Rtr { value: Some(value), ..Rtr::default() }
    }

    pub fn none() -> Rtr {
        Rtr::ok(Value::None)
    }

    pub fn err(error: NougaroError) -> Rtr {
        Rtr { error: Some(error), ..Rtr::default() }
    }

    pub fn ret(value: Option<Value>) -> Rtr {
        Rtr { value, should_return: true, ..Rtr::default() }
    }

    pub fn brk() -> Rtr {
        Rtr { should_break: true, ..Rtr::default() }
    }

    pub fn cont() -> Rtr {
        Rtr { should_continue: true, ..Rtr::default() }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// True once this result must unwind through callers without running
    /// any further sibling statement (an error, or any control-flow flag).
    pub fn exit(code: i32) -> Rtr {
        Rtr { should_exit: Some(code), ..Rtr::default() }
    }

    pub fn should_unwind(&self) -> bool {
        self.error.is_some()
            || self.should_return
            || self.should_break
            || self.should_continue
            || self.should_exit.is_some()
    }

    /// Folds `child` into `self`. Returns `Some(value)` if `child` carried a
    /// plain value with no unwind condition; otherwise copies `child`'s
    /// error/flags onto `self` and returns `None`, signalling the caller to
    /// propagate `self` immediately.
    pub fn register(&mut self, child: Rtr) -> Option<Value> {
        if child.should_unwind() {
            self.error = child.error;
            self.should_return = child.should_return;
            self.should_break = child.should_break;
            self.should_continue = child.should_continue;
            self.should_exit = child.should_exit;
            self.value = child.value;
            None
        } else {
            child.value
        }
    }
}
