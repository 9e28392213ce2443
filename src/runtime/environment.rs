//! Lexical scope chain with per-slot binding kind and mutability.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{messages, Error, Result};
use crate::runtime::value::Value;

/// The binding kind recorded for a declared name, matching `var`/`let`/`const`
/// hoisting and mutability rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
}

struct Slot {
    value: Value,
    kind: BindingKind,
}

struct ScopeFrame {
    slots: FxHashMap<String, Slot>,
    parent: Option<Environment>,
    /// Function frames are the target of `var` hoisting; block frames are not.
    is_function_frame: bool,
}

/// A scope, shared by reference so that closures can outlive the frame that
/// declared them: every live function captures the environment in effect at
/// the moment of its evaluation.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<ScopeFrame>>);

impl Environment {
    pub fn new_top_level() -> Self {
        Environment(Rc::new(RefCell::new(ScopeFrame {
            slots: FxHashMap::default(),
            parent: None,
            is_function_frame: true,
        })))
    }

    /// A child block scope (used for `{}`, loop bodies, `if`/`for` per-iteration
    /// bindings, `catch` blocks).
    pub fn child(&self) -> Self {
        Environment(Rc::new(RefCell::new(ScopeFrame {
            slots: FxHashMap::default(),
            parent: Some(self.clone()),
            is_function_frame: false,
        })))
    }

    /// A child scope that is the target of `var` hoisting (function call frames).
    pub fn child_function_frame(&self) -> Self {
        Environment(Rc::new(RefCell::new(ScopeFrame {
            slots: FxHashMap::default(),
            parent: Some(self.clone()),
            is_function_frame: true,
        })))
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// `define(name, kind, value)`. `let`/`const` define into the current
    /// frame; `var` is routed to the nearest enclosing function frame (or the
    /// top level). Re-declaring a `let`/`const` name already bound in the
    /// *same* frame is a declaration-time error.
    pub fn define(&self, name: &str, kind: BindingKind, value: Value) -> Result<()> {
        match kind {
            BindingKind::Var => {
                let target = self.nearest_function_frame();
                let mut frame = target.0.borrow_mut();
                // `var` re-declaration is legal and simply overwrites the slot,
                // without demoting an existing `let`/`const` binding's kind.
                frame.slots.entry(name.to_string()).or_insert(Slot { value: Value::Undefined, kind: BindingKind::Var });
                frame.slots.get_mut(name).unwrap().value = value;
                Ok(())
            }
            BindingKind::Let | BindingKind::Const => {
                let mut frame = self.0.borrow_mut();
                if frame.slots.contains_key(name) {
                    return Err(Error::syntax_error(format!(
                        "Identifier '{}' has already been declared",
                        name
                    )));
                }
                frame.slots.insert(name.to_string(), Slot { value, kind });
                Ok(())
            }
        }
    }

    fn nearest_function_frame(&self) -> Environment {
        let frame = self.0.borrow();
        if frame.is_function_frame {
            self.clone()
        } else {
            match &frame.parent {
                Some(parent) => parent.nearest_function_frame(),
                None => self.clone(),
            }
        }
    }

    /// `lookup(name) -> value`; walks parents. Fails with "Undefined variable
    /// 'X'" if nothing binds the name anywhere in the chain.
    pub fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(v) = self.try_lookup(name) {
            Ok(v)
        } else {
            Err(Error::reference_error(messages::undefined_variable(name)))
        }
    }

    pub fn try_lookup(&self, name: &str) -> Option<Value> {
        let frame = self.0.borrow();
        if let Some(slot) = frame.slots.get(name) {
            Some(slot.value.clone())
        } else {
            frame.parent.as_ref().and_then(|p| p.try_lookup(name))
        }
    }

    pub fn has(&self, name: &str) -> bool {
        let frame = self.0.borrow();
        frame.slots.contains_key(name) || frame.parent.as_ref().map(|p| p.has(name)).unwrap_or(false)
    }

    /// `assign(name, value)`: writes to the innermost scope that already
    /// binds the name. No implicit globals — an assignment to an undeclared
    /// name fails. `const` rejects re-assignment.
    pub fn assign(&self, name: &str, value: Value) -> Result<()> {
        let mut frame = self.0.borrow_mut();
        if let Some(slot) = frame.slots.get_mut(name) {
            if slot.kind == BindingKind::Const {
                return Err(Error::type_error(messages::cannot_assign_const(name)));
            }
            slot.value = value;
            return Ok(());
        }
        let parent = frame.parent.clone();
        drop(frame);
        match parent {
            Some(p) => p.assign(name, value),
            None => Err(Error::reference_error(messages::undefined_variable(name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_hoists_to_function_frame() {
        let top = Environment::new_top_level();
        let func = top.child_function_frame();
        let block = func.child();
        block.define("x", BindingKind::Var, Value::Number(1.0)).unwrap();
        // Defined on the function frame, visible from a sibling block too.
        assert!(func.has("x"));
        assert_eq!(func.lookup("x").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn const_rejects_reassignment() {
        let env = Environment::new_top_level();
        env.define("x", BindingKind::Const, Value::Number(1.0)).unwrap();
        assert!(env.assign("x", Value::Number(2.0)).is_err());
    }

    #[test]
    fn assign_to_undeclared_fails() {
        let env = Environment::new_top_level();
        assert!(env.assign("missing", Value::Number(1.0)).is_err());
    }

    #[test]
    fn redeclaring_let_in_same_scope_fails() {
        let env = Environment::new_top_level();
        env.define("x", BindingKind::Let, Value::Undefined).unwrap();
        assert!(env.define("x", BindingKind::Let, Value::Undefined).is_err());
    }

    #[test]
    fn child_scopes_shadow_independently() {
        let top = Environment::new_top_level();
        top.define("x", BindingKind::Let, Value::Number(1.0)).unwrap();
        let child = top.child();
        child.define("x", BindingKind::Let, Value::Number(2.0)).unwrap();
        assert_eq!(child.lookup("x").unwrap(), Value::Number(2.0));
        assert_eq!(top.lookup("x").unwrap(), Value::Number(1.0));
    }
}
