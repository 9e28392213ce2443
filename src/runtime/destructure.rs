//! Destructuring: binds a pattern against a source value, recursively.
//! Shared by parameter binding, variable declarators, and
//! assignment expressions — the only difference between those call sites is
//! whether a new binding is created (`define`) or an existing one is
//! overwritten (`assign`), captured here by the [`Binder`] trait.

use std::rc::Rc;

use crate::ast::{self, Pattern};
use crate::error::{messages, Error, Result};
use crate::runtime::environment::{BindingKind, Environment};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::security;
use crate::runtime::value::Value;

/// How a bound name is written back once its value is resolved.
pub trait Binder {
    fn bind(&mut self, env: &Environment, name: &str, value: Value) -> Result<()>;
}

/// Binds into fresh slots of `kind` (used for `var`/`let`/`const` declarators
/// and parameter lists).
pub struct DeclareBinder(pub BindingKind);

impl Binder for DeclareBinder {
    fn bind(&mut self, env: &Environment, name: &str, value: Value) -> Result<()> {
        env.define(name, self.0, value)
    }
}

/// Writes into an already-declared binding (used by assignment expressions).
pub struct AssignBinder;

impl Binder for AssignBinder {
    fn bind(&mut self, env: &Environment, name: &str, value: Value) -> Result<()> {
        env.assign(name, value)
    }
}

/// Binds `pattern` against `value` in `env`, using `binder` to decide how
/// leaf identifiers are written. `interp` is needed because object/array
/// pattern defaults are arbitrary expressions that may call sandbox code.
pub fn bind_pattern(
    interp: &mut Interpreter,
    env: &Environment,
    pattern: &Pattern,
    value: Value,
    binder: &mut dyn Binder,
) -> Result<()> {
    match pattern {
        Pattern::Identifier(id) => binder.bind(env, &id.name, value),

        Pattern::Assignment(assign) => {
            let value = if matches!(value, Value::Undefined) {
                interp.eval_expression(env, &assign.right)?
            } else {
                value
            };
            bind_pattern(interp, env, &assign.left, value, binder)
        }

        Pattern::Rest(rest) => bind_pattern(interp, env, &rest.argument, value, binder),

        Pattern::Array(arr) => {
            // Only pull as many items as the pattern can consume: a fixed
            // number of slots needs just that many, so an array pattern with
            // no rest element never has to drain an infinite generator.
            let max = if arr.rest.is_some() { usize::MAX } else { arr.elements.len() };
            let source = iterate_to_vec(interp, env, value, max)?;
            let mut iter = source.into_iter();
            for elem in &arr.elements {
                let item = iter.next().unwrap_or(Value::Undefined);
                if let Some(p) = elem {
                    bind_pattern(interp, env, p, item, binder)?;
                }
            }
            if let Some(rest_pattern) = &arr.rest {
                let remaining: Vec<Value> = iter.collect();
                bind_pattern(interp, env, rest_pattern, Value::array(remaining), binder)?;
            }
            Ok(())
        }

        Pattern::Object(obj) => {
            let mut consumed: Vec<String> = Vec::new();
            for prop in &obj.properties {
                match prop {
                    ast::ObjectPatternProperty::Property { key, value: target, computed, .. } => {
                        let key_name = resolve_property_key(interp, env, key, *computed)?;
                        security::check_property_name(&key_name)?;
                        let prop_value = read_property(&value, &key_name)?;
                        consumed.push(key_name);
                        bind_pattern(interp, env, target, prop_value, binder)?;
                    }
                    ast::ObjectPatternProperty::Rest { argument, .. } => {
                        let rest_obj = collect_rest_object(&value, &consumed)?;
                        bind_pattern(interp, env, argument, rest_obj, binder)?;
                    }
                }
            }
            Ok(())
        }

        Pattern::Member(member) => {
            let target = interp.eval_member_assignment_target(env, member)?;
            interp.assign_member(env, &target, value)
        }
    }
}

fn resolve_property_key(
    interp: &mut Interpreter,
    env: &Environment,
    key: &ast::PropertyKey,
    computed: bool,
) -> Result<String> {
    if computed {
        if let ast::PropertyKey::Computed(expr) = key {
            return Ok(interp.eval_expression(env, expr)?.to_display_string());
        }
    }
    match key {
        ast::PropertyKey::Identifier(id) => Ok(id.name.clone()),
        ast::PropertyKey::String(s) => Ok(s.clone()),
        ast::PropertyKey::Number(n) => Ok(crate::runtime::value::format_number(*n)),
        ast::PropertyKey::Computed(expr) => Ok(interp.eval_expression(env, expr)?.to_display_string()),
    }
}

fn read_property(value: &Value, key: &str) -> Result<Value> {
    security::check_host_function_read(value)?;
    match value {
        Value::Object(obj) => Ok(obj.borrow().get(key).unwrap_or(Value::Undefined)),
        Value::Array(arr) => {
            if key == "length" {
                Ok(Value::Number(arr.borrow().len() as f64))
            } else if let Ok(idx) = key.parse::<usize>() {
                Ok(arr.borrow().get(idx))
            } else {
                Ok(Value::Undefined)
            }
        }
        Value::Undefined | Value::Null => Err(Error::type_error(format!(
            "Cannot destructure '{}' property of {}",
            key,
            value.type_of()
        ))),
        _ => Ok(Value::Undefined),
    }
}

fn collect_rest_object(value: &Value, consumed: &[String]) -> Result<Value> {
    match value {
        Value::Object(obj) => {
            let obj = obj.borrow();
            let mut rest = crate::runtime::value::ObjectData::new();
            for key in obj.keys() {
                if !consumed.iter().any(|c| c.as_str() == key.as_ref()) {
                    rest.insert(key.clone(), obj.get(&key).unwrap_or(Value::Undefined));
                }
            }
            Ok(Value::Object(Rc::new(std::cell::RefCell::new(rest))))
        }
        _ => Ok(Value::empty_object()),
    }
}

/// Materializes up to `max` items of an iterable source (array, string, or
/// object exposing the iterator protocol) into a `Vec<Value>` for
/// array-pattern binding.
fn iterate_to_vec(interp: &mut Interpreter, env: &Environment, value: Value, max: usize) -> Result<Vec<Value>> {
    interp.drain_iterable(env, &value, max)
}
