//! The global environment of one script evaluation.
//!
//! Scripts run at top level only, so there is a single scope. It plays two
//! roles: the declarative record (`let`/`const`) and the global object
//! (`var`, implicit globals, builtins). Only the latter is reachable through
//! `this` and `globalThis`.

use indexmap::IndexMap;

use crate::object::ObjectMap;
use crate::value::{Builtin, Value};

/// How a binding came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    /// Created by assigning to an undeclared name.
    Implicit,
    /// Present in every fresh context.
    Builtin,
}

impl BindingKind {
    /// Whether the binding is a property of the global object.
    pub fn is_global_property(self) -> bool {
        matches!(self, Self::Var | Self::Implicit | Self::Builtin)
    }

    /// A global property the script itself created.
    pub fn is_script_property(self) -> bool {
        matches!(self, Self::Var | Self::Implicit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub kind: BindingKind,
    /// `None` while a `let`/`const` binding is uninitialized.
    pub value: Option<Value>,
}

/// Why a name could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    Undefined,
    Uninitialized,
}

/// Why a name could not be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    Constant,
    Uninitialized,
}

/// Bindings of one isolated context, in creation order.
#[derive(Debug, Clone)]
pub struct Environment {
    bindings: IndexMap<String, Binding>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// A fresh context holding only the builtin globals.
    pub fn new() -> Self {
        let mut env = Self {
            bindings: IndexMap::new(),
        };
        env.builtin("undefined", Value::Undefined);
        env.builtin("NaN", Value::Number(f64::NAN));
        env.builtin("Infinity", Value::Number(f64::INFINITY));
        env.builtin("Date", Value::Builtin(Builtin::DateConstructor));
        // Resolved specially by the evaluator; listed so it is never implicit.
        env.builtin("globalThis", Value::Undefined);
        env
    }

    fn builtin(&mut self, name: &str, value: Value) {
        self.bindings.insert(
            name.to_string(),
            Binding {
                kind: BindingKind::Builtin,
                value: Some(value),
            },
        );
    }

    /// Create a binding ahead of execution. `var` bindings start as
    /// `undefined` and keep any existing value; `let`/`const` start
    /// uninitialized. Declaring a builtin name changes nothing.
    pub fn declare(&mut self, name: &str, kind: BindingKind) {
        if let Some(existing) = self.bindings.get(name) {
            if existing.kind == BindingKind::Builtin || kind == BindingKind::Var {
                return;
            }
        }
        let value = match kind {
            BindingKind::Let | BindingKind::Const => None,
            _ => Some(Value::Undefined),
        };
        self.bindings.insert(name.to_string(), Binding { kind, value });
    }

    /// Give a declared binding its value, as its declaration executes.
    pub fn initialize(&mut self, name: &str, value: Value) {
        match self.bindings.get_mut(name) {
            Some(binding) if binding.kind == BindingKind::Builtin => {}
            Some(binding) => binding.value = Some(value),
            None => {
                self.bindings.insert(
                    name.to_string(),
                    Binding {
                        kind: BindingKind::Var,
                        value: Some(value),
                    },
                );
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&Value, LookupError> {
        let binding = self.bindings.get(name).ok_or(LookupError::Undefined)?;
        binding.value.as_ref().ok_or(LookupError::Uninitialized)
    }

    /// Sloppy-mode assignment: an undeclared name becomes an implicit global
    /// and writes to builtins are silently ignored.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), AssignError> {
        match self.bindings.get_mut(name) {
            Some(binding) => match binding.kind {
                BindingKind::Builtin => Ok(()),
                BindingKind::Const if binding.value.is_some() => Err(AssignError::Constant),
                _ if binding.value.is_none() => Err(AssignError::Uninitialized),
                _ => {
                    binding.value = Some(value);
                    Ok(())
                }
            },
            None => {
                self.bindings.insert(
                    name.to_string(),
                    Binding {
                        kind: BindingKind::Implicit,
                        value: Some(value),
                    },
                );
                Ok(())
            }
        }
    }

    /// Read `name` as a property of the global object.
    pub fn global_property(&self, name: &str) -> Option<&Value> {
        self.bindings
            .get(name)
            .filter(|b| b.kind.is_global_property())
            .and_then(|b| b.value.as_ref())
    }

    /// Snapshot of the script-created properties of the global object.
    pub fn global_object(&self) -> ObjectMap {
        self.bindings
            .iter()
            .filter(|(_, b)| b.kind.is_script_property())
            .filter_map(|(name, b)| Some((name.clone(), b.value.clone()?)))
            .collect()
    }

    /// The value a script left in the global property `name`.
    ///
    /// Only `var` and implicit globals qualify: top-level `let`/`const`
    /// bindings live in the declarative record, not on the global object.
    pub fn extract(&self, name: &str) -> Option<&Value> {
        self.bindings
            .get(name)
            .filter(|b| b.kind.is_script_property())
            .and_then(|b| b.value.as_ref())
    }

    /// Consume the environment, keeping only what [`extract`](Self::extract)
    /// would return for `name`.
    pub fn into_value(mut self, name: &str) -> Option<Value> {
        let binding = self.bindings.swap_remove(name)?;
        if !binding.kind.is_script_property() {
            return None;
        }
        binding.value
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Names the script created, in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.bindings
            .iter()
            .filter(|(_, b)| b.kind != BindingKind::Builtin)
            .map(|(name, _)| name.as_str())
    }
}
