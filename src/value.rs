//! Value model.
//!
//! A tagged variant, not virtual dispatch. Scalars and strings are cloned
//! by value; lists, instances and modules share a reference-counted,
//! interior-mutable handle so multiple bindings can see the same mutation
//! (`append(x, 4)` mutates every binding that shares the list). Nougaro
//! programs never build a literal that contains itself, so `Rc` without a
//! cycle collector is sufficient.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::context::ScopeRef;
use crate::parser::ast::{Node, Param};

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(Rc<String>),
    List(Rc<RefCell<Vec<Value>>>),
    None,
    Function(Rc<FunctionValue>),
    Builtin(Rc<BuiltinDescriptor>),
    Class(Rc<ClassValue>),
    Instance(Rc<InstanceValue>),
    Module(Rc<ModuleValue>),
}

#[derive(Debug)]
pub struct FunctionValue {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Node,
    pub defining_scope: ScopeRef,
    pub auto_return: bool,
}

/// The built-in invocation protocol: a name plus required and optional
/// parameter lists, an arity-strictness flag, directory-injection flags,
/// and the function pointer itself. Built-ins never close over interpreter
/// state beyond what the execution scope gives them, so a bare `fn`
/// pointer (not a boxed closure) is enough.
pub struct BuiltinDescriptor {
    pub name: &'static str,
    pub param_names: Vec<&'static str>,
    pub optional_params: Vec<&'static str>,
    pub strict_arity: bool,
    pub needs_work_dir: bool,
    pub needs_module_dir: bool,
    pub func: BuiltinFn,
}

pub type BuiltinFn = fn(&ScopeRef) -> crate::rtr::Rtr;

impl fmt::Debug for BuiltinDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinDescriptor").field("name", &self.name).finish()
    }
}

#[derive(Debug)]
pub struct ClassValue {
    pub name: Option<String>,
    pub parent: Option<Rc<ClassValue>>,
    pub members: RefCell<HashMap<String, Value>>,
}

impl ClassValue {
    /// Attribute lookup falls back through the single-inheritance chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.members.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }
}

#[derive(Debug)]
pub struct InstanceValue {
    pub class: Rc<ClassValue>,
    pub attributes: RefCell<HashMap<String, Value>>,
}

impl InstanceValue {
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.attributes.borrow().get(name) {
            return Some(v.clone());
        }
        self.class.lookup(name)
    }
}

#[derive(Debug)]
pub struct ModuleValue {
    pub name: String,
    pub exports: RefCell<HashMap<String, Value>>,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(Rc::new(s.into()))
    }

    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    /// The `type_` tag string carried by every value.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
            Value::List(_) => "list",
            Value::None => "NoneValue",
            Value::Function(_) => "func",
            Value::Builtin(_) => "built-in func",
            Value::Class(_) => "constructor",
            Value::Instance(_) => "object",
            Value::Module(_) => "module",
        }
    }

    /// Nonzero numbers and non-empty strings/lists are true; `None` is
    /// false; every callable, class, instance and module is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::None => false,
            Value::Function(_) | Value::Builtin(_) | Value::Class(_) | Value::Instance(_) | Value::Module(_) => {
                true
            }
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_) | Value::Class(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, item) in l.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::String(s) => write!(f, "'{s}'")?,
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "]")
            }
            Value::None => write!(f, "None"),
            Value::Function(func) => {
                write!(f, "<function {}>", func.name.as_deref().unwrap_or("<anonymous>"))
            }
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name),
            Value::Class(c) => write!(f, "<class {}>", c.name.as_deref().unwrap_or("<anonymous>")),
            Value::Instance(i) => {
                write!(f, "<{} instance>", i.class.name.as_deref().unwrap_or("<anonymous>"))
            }
            Value::Module(m) => write!(f, "<module {}>", m.name),
        }
    }
}
