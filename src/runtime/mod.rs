//! Runtime environment for the sandboxed interpreter.
//!
//! This module provides the tree-walking evaluator: the environment/scope
//! chain, the value model, the AST walker, call machinery, destructuring,
//! the generator suspension engine, the async executor, the resource meter,
//! and the security guard.

pub mod call;
pub mod destructure;
pub mod environment;
pub mod generator;
pub mod interpreter;
pub mod presets;
pub mod resource_meter;
pub mod security;
pub mod value;

pub use environment::{BindingKind, Environment};
pub use generator::GeneratorHandle;
pub use interpreter::{Completion, Interpreter};
pub use presets::{drain_timer_queue, Preset, TimerQueue};
pub use resource_meter::{ResourceLimits, ResourceMeter};
pub use value::{ArrayData, HostFunction, ObjectData, SandboxFunction, Value};

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{messages, Error, Result};

/// Security posture toggles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityOptions {
    /// When set, a host function's error message is elided from the wrapped
    /// `"Host function 'X' threw error: <msg>"` message.
    pub hide_host_error_messages: bool,
}

/// Construction-time configuration for `Interpreter::new`.
#[derive(Default)]
pub struct InterpreterConfig {
    /// Globals installed into the persistent top-level environment.
    pub globals: Vec<(String, Value)>,
    pub security: SecurityOptions,
    /// Per-instance mode serializing sync/async calls.
    pub strict_evaluation_isolation: bool,
    pub resource_limits: ResourceLimits,
}

/// Per-call overrides layered over construction-time config.
#[derive(Default)]
pub struct EvalOptions {
    /// Overlay globals visible only to this call, invisible afterward
    ///.
    pub globals: Vec<(String, Value)>,
    pub max_call_stack_depth: Option<usize>,
    pub max_loop_iterations: Option<u64>,
    pub max_memory: Option<usize>,
    /// Checked only by the async executor.
    pub signal: Option<AbortSignal>,
}

/// Cooperative cancellation signal. Cheap to clone; every clone observes the
/// same underlying abort flag.
#[derive(Clone, Default)]
pub struct AbortSignal(Rc<Cell<bool>>);

impl AbortSignal {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(false)))
    }

    pub fn abort(&self) {
        self.0.set(true);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.get()
    }
}

/// Releases the strict-isolation latch on drop, so it is cleared even if the
/// call errors out partway through.
struct IsolationGuard<'a> {
    latch: &'a Cell<bool>,
}

impl Drop for IsolationGuard<'_> {
    fn drop(&mut self) {
        self.latch.set(false);
    }
}

/// The sandboxed interpreter. Holds a persistent top-level environment that
/// survives across `evaluate`/`evaluate_async` calls on the same instance.
pub struct Interpreter {
    pub(crate) global_env: Environment,
    pub(crate) security: SecurityOptions,
    pub(crate) strict_evaluation_isolation: bool,
    pub(crate) in_flight: Rc<Cell<bool>>,
    pub(crate) meter: ResourceMeter,
    pub(crate) mode: Cell<call::ExecMode>,
    pub(crate) default_limits: ResourceLimits,
    /// Set only while executing on a generator's dedicated thread; `yield`
    /// suspends through this port. `None` everywhere else.
    pub(crate) yield_port: Option<generator::YieldPort>,
    /// Checked at each `await` and each loop iteration by the async
    /// executor only; ignored by the sync executor.
    pub(crate) abort_signal: Option<AbortSignal>,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        let global_env = Environment::new_top_level();
        for (name, value) in config.globals {
            let _ = global_env.define(&name, BindingKind::Var, value);
        }
        Interpreter {
            global_env,
            security: config.security,
            strict_evaluation_isolation: config.strict_evaluation_isolation,
            in_flight: Rc::new(Cell::new(false)),
            meter: ResourceMeter::new(config.resource_limits),
            mode: Cell::new(call::ExecMode::Sync),
            default_limits: config.resource_limits,
            yield_port: None,
            abort_signal: None,
        }
    }

    /// `evaluate_async(source, options?) -> value`: parses and runs
    /// `source` with `await` enabled at the top level.
    pub fn evaluate_async(&mut self, source: &str, options: EvalOptions) -> Result<Value> {
        let program = crate::parser::parse(source)?;
        self.evaluate_ast_async(&program, options)
    }

    pub fn evaluate_ast_async(&mut self, program: &crate::ast::Program, options: EvalOptions) -> Result<Value> {
        self.enter_sync_call(&options)?;
        self.in_flight.set(true);
        let _guard = IsolationGuard { latch: &self.in_flight };
        self.mode.set(call::ExecMode::Async);
        self.meter = ResourceMeter::new(self.limits_for(&options));
        self.abort_signal = options.signal.clone();
        self.check_abort()?;

        let overlay = self.global_env.child();
        for (name, value) in &options.globals {
            overlay.define(name, BindingKind::Var, value.clone())?;
        }

        let completion = self.exec_block_statements(&overlay, &program.body)?;
        match completion {
            Completion::Normal(v) | Completion::Return(v) => Ok(v),
            Completion::Break(_) => Err(Error::syntax_error(messages::illegal_break())),
            Completion::Continue(_) => Err(Error::syntax_error(messages::illegal_continue())),
        }
    }

    pub(crate) fn mode(&self) -> call::ExecMode {
        self.mode.get()
    }

    /// Checked at each `await` and each loop iteration by the async executor;
    /// a no-op when no signal was supplied or when running synchronously.
    pub(crate) fn check_abort(&self) -> Result<()> {
        if let Some(signal) = &self.abort_signal {
            if signal.is_aborted() {
                return Err(Error::execution_aborted());
            }
        }
        Ok(())
    }

    pub(crate) fn meter_mut(&mut self) -> &mut ResourceMeter {
        &mut self.meter
    }

    pub(crate) fn hide_host_error_messages(&self) -> bool {
        self.security.hide_host_error_messages
    }

    fn enter_sync_call(&self, options: &EvalOptions) -> Result<()> {
        let _ = options;
        if self.strict_evaluation_isolation && self.in_flight.get() {
            return Err(Error::type_error(messages::strict_isolation_enabled()));
        }
        Ok(())
    }

    fn limits_for(&self, options: &EvalOptions) -> ResourceLimits {
        ResourceLimits {
            max_call_stack_depth: options.max_call_stack_depth.unwrap_or(self.default_limits.max_call_stack_depth),
            max_loop_iterations: options.max_loop_iterations.unwrap_or(self.default_limits.max_loop_iterations),
            max_memory: options.max_memory.unwrap_or(self.default_limits.max_memory),
        }
    }

    /// `evaluate(source, options?) -> value`: parses and runs `source`
    /// synchronously, returning the value of the last top-level expression
    /// statement (or `Undefined`).
    pub fn evaluate(&mut self, source: &str, options: EvalOptions) -> Result<Value> {
        let program = crate::parser::parse(source)?;
        self.evaluate_ast(&program, options)
    }

    /// Runs an already-parsed program; any conforming external parser
    /// producing the same node shapes may be substituted ahead of this call.
    pub fn evaluate_ast(&mut self, program: &crate::ast::Program, options: EvalOptions) -> Result<Value> {
        self.enter_sync_call(&options)?;
        self.mode.set(call::ExecMode::Sync);
        self.meter = ResourceMeter::new(self.limits_for(&options));

        let overlay = self.global_env.child();
        for (name, value) in &options.globals {
            overlay.define(name, BindingKind::Var, value.clone())?;
        }

        let completion = self.exec_block_statements(&overlay, &program.body)?;
        match completion {
            Completion::Normal(v) | Completion::Return(v) => Ok(v),
            Completion::Break(_) => Err(Error::syntax_error(messages::illegal_break())),
            Completion::Continue(_) => Err(Error::syntax_error(messages::illegal_continue())),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_arithmetic() {
        let mut interp = Interpreter::default();
        let result = interp.evaluate("1 + 2 * 3", EvalOptions::default()).unwrap();
        assert_eq!(result, Value::Number(7.0));
    }

    #[test]
    fn persists_globals_across_calls() {
        let mut interp = Interpreter::default();
        interp.evaluate("let counter = 0;", EvalOptions::default()).unwrap();
        interp.evaluate("counter = counter + 1;", EvalOptions::default()).unwrap();
        let result = interp.evaluate("counter", EvalOptions::default()).unwrap();
        assert_eq!(result, Value::Number(1.0));
    }

    #[test]
    fn per_call_globals_are_not_visible_later() {
        let mut interp = Interpreter::default();
        let mut opts = EvalOptions::default();
        opts.globals.push(("injected".to_string(), Value::Number(5.0)));
        interp.evaluate("injected", opts).unwrap();
        let result = interp.evaluate("typeof injected", EvalOptions::default()).unwrap();
        assert_eq!(result, Value::string("undefined"));
    }

    #[test]
    fn closure_counter_scenario() {
        let mut interp = Interpreter::default();
        let result = interp
            .evaluate(
                "function makeCounter(){let c=0;return function(){c=c+1;return c}} let f=makeCounter(); f(); f(); f()",
                EvalOptions::default(),
            )
            .unwrap();
        assert_eq!(result, Value::Number(3.0));
    }
}
