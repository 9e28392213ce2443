//! Prelude module for convenient imports.
//!
//! ```no_run
//! use quicksilver::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut interp = Interpreter::default();
//!     let result = interp.evaluate("1 + 2", EvalOptions::default())?;
//!     println!("{:?}", result);
//!     Ok(())
//! }
//! ```

pub use crate::runtime::{
    AbortSignal, EvalOptions, Interpreter, InterpreterConfig, Preset, SecurityOptions, TimerQueue,
    Value,
};
pub use crate::runtime::presets::{drain_timer_queue, globals_for};

pub use crate::error::{Error, ErrorKind, Result, SourceLocation, StackFrame, StackTrace};

pub use crate::VERSION;
