//! Call machinery: the checks that precede invoking a callable, argument
//! binding, `this`/`arguments` setup, and depth-guarded frame execution.
//! Shared by plain calls, `new` expressions, and host-supplied trampolines
//! re-entering the interpreter.

use std::rc::Rc;

use crate::ast::FunctionBody;
use crate::error::{messages, Error, Result};
use crate::runtime::destructure::{bind_pattern, DeclareBinder};
use crate::runtime::environment::BindingKind;
use crate::runtime::interpreter::{Completion, Interpreter};
use crate::runtime::value::{HostFunction, SandboxFunction, Value};

/// Whether the surrounding executor is synchronous or asynchronous — governs
/// whether an async callee may be invoked at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Sync,
    Async,
}

impl Interpreter {
    /// `callee(args)` with `this` bound per the call-site shape.
    /// `this` is `Value::Undefined` for a free-function call. Reads the
    /// interpreter's current sync/async mode rather than taking it as a
    /// parameter, since every call site already runs under one or the other.
    pub fn call(&mut self, callee: Value, this: Value, args: Vec<Value>) -> Result<Value> {
        match &callee {
            Value::SandboxFn(func) => self.call_sandbox_function(func.clone(), this, args),
            Value::HostFn(host) => self.call_host_function(host.clone(), this, args),
            _ => Err(Error::type_error(messages::is_not_a_function("value"))),
        }
    }

    fn call_sandbox_function(&mut self, func: Rc<SandboxFunction>, this: Value, args: Vec<Value>) -> Result<Value> {
        if func.is_async && func.is_generator && self.mode() == ExecMode::Sync {
            return Err(Error::type_error(messages::cannot_call_async_generator_in_sync()));
        }
        if func.is_generator {
            return Ok(self.spawn_generator(func, this, args));
        }
        if func.is_async && self.mode() == ExecMode::Sync {
            return Err(Error::type_error(messages::cannot_call_async_in_sync()));
        }

        tracing::trace!(target: "call", name = func.name.as_deref().unwrap_or("<anonymous>"), "calling sandbox function");
        let _depth_guard = self.meter_mut().enter_call()?;
        let frame = func.closure.child_function_frame();

        let effective_this = if func.is_arrow {
            func.captured_this.clone().unwrap_or(Value::Undefined)
        } else {
            this
        };
        if !func.is_arrow {
            frame.define("this", BindingKind::Var, effective_this)?;
            frame.define("arguments", BindingKind::Var, Value::array(args.clone()))?;
        }

        self.bind_parameters(&frame, &func.params, args)?;

        let completion = match &func.body {
            FunctionBody::Block(block) => self.exec_block_statements(&frame, &block.body)?,
            FunctionBody::Expression(expr) => Completion::Return(self.eval_expression(&frame, expr)?),
        };

        match completion {
            Completion::Return(v) => Ok(v),
            Completion::Normal(_) => Ok(Value::Undefined),
            Completion::Break(_) => Err(Error::syntax_error(messages::illegal_break())),
            Completion::Continue(_) => Err(Error::syntax_error(messages::illegal_continue())),
        }
    }

    fn call_host_function(&mut self, host: Rc<HostFunction>, this: Value, args: Vec<Value>) -> Result<Value> {
        if host.is_async && self.mode() == ExecMode::Sync {
            return Err(Error::type_error(messages::cannot_call_async_host_in_sync(&host.name)));
        }
        tracing::trace!(target: "call", name = %host.name, "calling host function");
        let _depth_guard = self.meter_mut().enter_call()?;
        match (host.func)(self, this, args) {
            Ok(v) => Ok(v),
            Err(e) => {
                if self.hide_host_error_messages() {
                    Err(e)
                } else {
                    Err(Error::type_error(messages::host_function_threw(&host.name, &e.to_string())))
                }
            }
        }
    }

    /// `new Callee(args)`. There is no prototype chain, so construction is:
    /// create a fresh plain object, bind it as `this`, run the body, and
    /// return that object unless the body explicitly returned an
    /// object/array itself.
    ///
    /// Host functions are constructible the same way as sandbox functions
    /// so preset globals (`Map`, `URL`, `ArrayBuffer`, ...) can use `new`
    /// like their real-world counterparts, even though they're plain
    /// `HostFn` closures rather than a distinct constructor kind.
    pub fn construct(&mut self, callee: Value, args: Vec<Value>) -> Result<Value> {
        let instance = Value::empty_object();
        let result = match &callee {
            Value::SandboxFn(f) if !f.is_arrow && !f.is_generator && !f.is_async => {
                self.call_sandbox_function(f.clone(), instance.clone(), args)?
            }
            Value::SandboxFn(_) => return Err(Error::type_error(messages::not_a_constructor("value"))),
            Value::HostFn(host) => self.call_host_function(host.clone(), instance.clone(), args)?,
            _ => return Err(Error::type_error(messages::not_a_constructor("value"))),
        };
        match result {
            Value::Object(_) | Value::Array(_) => Ok(result),
            _ => Ok(instance),
        }
    }

    fn bind_parameters(&mut self, frame: &crate::runtime::environment::Environment, params: &crate::ast::FunctionParams, args: Vec<Value>) -> Result<()> {
        let mut iter = args.into_iter();
        for pattern in &params.params {
            let value = iter.next().unwrap_or(Value::Undefined);
            bind_pattern(self, frame, pattern, value, &mut DeclareBinder(BindingKind::Let))?;
        }
        if let Some(rest) = &params.rest {
            let remaining: Vec<Value> = iter.collect();
            bind_pattern(self, frame, rest, Value::array(remaining), &mut DeclareBinder(BindingKind::Let))?;
        }
        Ok(())
    }
}
