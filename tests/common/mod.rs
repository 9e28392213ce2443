//! Shared test helpers for integration tests.

use quicksilver::runtime::presets::{self, Preset};
use quicksilver::runtime::{EvalOptions, Interpreter, InterpreterConfig};
use quicksilver::Value;

/// Run JavaScript code on a fresh interpreter and return the result.
pub fn run_js(code: &str) -> quicksilver::Result<Value> {
    let mut interp = Interpreter::default();
    interp.evaluate(code, EvalOptions::default())
}

/// Run JavaScript and get its display-string representation.
#[allow(dead_code)]
pub fn run_js_string(code: &str) -> String {
    run_js(code)
        .map(|v| v.to_display_string())
        .unwrap_or_else(|e| format!("Error: {}", e))
}

/// Run JavaScript with `await` enabled at the top level.
#[allow(dead_code)]
pub fn run_js_async(code: &str) -> quicksilver::Result<Value> {
    let mut interp = Interpreter::default();
    interp.evaluate_async(code, EvalOptions::default())
}

/// Build an interpreter with a preset's globals installed.
#[allow(dead_code)]
pub fn interpreter_with_preset(preset: Preset) -> Interpreter {
    let (globals, _timers) = presets::globals_for(preset);
    Interpreter::new(InterpreterConfig { globals, ..Default::default() })
}

/// Run JavaScript on a fresh interpreter carrying a preset's globals.
#[allow(dead_code)]
pub fn run_js_with_preset(preset: Preset, code: &str) -> quicksilver::Result<Value> {
    interpreter_with_preset(preset).evaluate(code, EvalOptions::default())
}
