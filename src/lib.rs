//! Quicksilver: a sandboxed tree-walking interpreter for a large subset of a
//! modern curly-brace scripting language.
//!
//! Quicksilver parses source text into an abstract syntax tree and walks it
//! under a strict resource-, capability-, and isolation-regime. It is built
//! for embedding in hosts that run untrusted scripts against a curated set
//! of pre-registered host functions: no full prototype chain, no getter/
//! setter semantics, no module loader, no `eval`.
//!
//! # Example
//!
//! ```no_run
//! use quicksilver::{EvalOptions, Interpreter};
//!
//! fn main() -> quicksilver::Result<()> {
//!     let mut interp = Interpreter::default();
//!     let result = interp.evaluate("1 + 2 * 3", EvalOptions::default())?;
//!     println!("Result: {:?}", result);
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod prelude;
pub mod repl;
pub mod runtime;

mod error;

pub use error::{Error, ErrorKind, Result};
pub use runtime::{AbortSignal, EvalOptions, Interpreter, InterpreterConfig, SecurityOptions, Value};

/// Quicksilver version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
