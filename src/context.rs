//! Context & Symbol Table.
//!
//! Lexically nested scopes with parent links, modeled as shared
//! reference-counted handles: no cycles arise because function values
//! capture their scope by strong reference and scopes never capture
//! function values back. A closure must keep its own defining scope alive
//! independently of the call stack, which rules out a single flat
//! `Vec`-based scope stack.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::ContextFrame;
use crate::source::{Position, Span};
use crate::value::Value;

pub type ScopeRef = Rc<Scope>;

#[derive(Debug)]
pub struct Scope {
    pub display_name: String,
    pub parent: Option<ScopeRef>,
    pub call_position: Option<Position>,
    bindings: RefCell<HashMap<String, Value>>,
    /// Names that may never be rebound (`VARS_CANNOT_MODIFY`). Only ever
    /// populated on the root scope.
    protected: RefCell<HashSet<String>>,
    /// Populated by `Export` statements at module top level; only
    /// meaningful on a module's root scope, which is what the loader reads
    /// back to build a `Value::Module`'s export table.
    exports: RefCell<HashMap<String, Value>>,
}

impl Scope {
    pub fn new(display_name: impl Into<String>, parent: Option<ScopeRef>) -> ScopeRef {
        Rc::new(Scope {
            display_name: display_name.into(),
            parent,
            call_position: None,
            bindings: RefCell::new(HashMap::new()),
            protected: RefCell::new(HashSet::new()),
            exports: RefCell::new(HashMap::new()),
        })
    }

    pub fn with_call_site(
        display_name: impl Into<String>,
        parent: ScopeRef,
        call_position: Position,
    ) -> ScopeRef {
        Rc::new(Scope {
            display_name: display_name.into(),
            parent: Some(parent),
            call_position: Some(call_position),
            bindings: RefCell::new(HashMap::new()),
            protected: RefCell::new(HashSet::new()),
            exports: RefCell::new(HashMap::new()),
        })
    }

    /// Walks the parent chain read-only.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.bindings.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Binds `name` in *this* scope, regardless of whether an outer scope
    /// already owns it (a fresh declaration, not a rebind).
    pub fn declare(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    pub fn mark_protected(&self, name: impl Into<String>) {
        self.protected.borrow_mut().insert(name.into());
    }

    pub fn is_protected(&self, name: &str) -> bool {
        if self.protected.borrow().contains(name) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.is_protected(name))
    }

    /// Rebinds `name` in whichever scope currently owns it, walking up the
    /// chain; returns `false` if no scope owns the name yet.
    pub fn assign_existing(&self, name: &str, value: Value) -> bool {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(p) => p.assign_existing(name, value),
            None => false,
        }
    }

    pub fn delete(&self, name: &str) -> bool {
        if self.bindings.borrow_mut().remove(name).is_some() {
            return true;
        }
        match &self.parent {
            Some(p) => p.delete(name),
            None => false,
        }
    }

    /// A zero-width span at this scope's call site, for errors raised by
    /// built-ins that only have the execution scope to work with. Falls
    /// back to the nearest ancestor call site (the root scope has none).
    pub fn call_span(&self) -> Span {
        match &self.call_position {
            Some(pos) => Span::new(pos.clone(), pos.clone()),
            None => match &self.parent {
                Some(p) => p.call_span(),
                None => unreachable!("call_span requested outside any call frame"),
            },
        }
    }

    /// A traceback frame naming this scope and where it was entered from,
    /// for an error that unwinds through this call boundary. `None` for a
    /// scope with no call site of its own (the root module scope).
    pub fn context_frame(&self) -> Option<ContextFrame> {
        let pos = self.call_position.as_ref()?;
        Some(ContextFrame {
            display_name: self.display_name.clone(),
            file: pos.source.name.clone(),
            line: pos.line,
        })
    }

    /// Snapshot of names bound directly in this scope, used to collect a
    /// class body's members once it has finished evaluating.
    pub fn local_names(&self) -> Vec<String> {
        self.bindings.borrow().keys().cloned().collect()
    }

    pub fn export(&self, name: impl Into<String>, value: Value) {
        self.exports.borrow_mut().insert(name.into(), value);
    }

    pub fn exported(&self) -> HashMap<String, Value> {
        self.exports.borrow().clone()
    }
}
