//! Quicksilver CLI
//!
//! A command-line interface for the Quicksilver sandboxed JavaScript
//! interpreter.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quicksilver::runtime::presets::{self, Preset};
use quicksilver::runtime::{EvalOptions, Interpreter, InterpreterConfig, ResourceLimits};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "quicksilver")]
#[command(author, version, about = "A sandboxed JavaScript interpreter written in Rust", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JavaScript file to execute
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Evaluate a string of JavaScript
    #[arg(short, long, value_name = "CODE")]
    eval: Option<String>,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(clap::Args)]
struct LimitArgs {
    /// Global bundle of host functions to install
    #[arg(long, value_name = "PRESET", global = true, default_value = "minimal")]
    preset: String,

    /// Maximum synchronous call stack depth
    #[arg(long, value_name = "N", global = true)]
    max_call_stack_depth: Option<usize>,

    /// Maximum loop iterations per top-level evaluation
    #[arg(long, value_name = "N", global = true)]
    max_loop_iterations: Option<u64>,

    /// Maximum tracked memory in bytes
    #[arg(long, value_name = "BYTES", global = true)]
    max_memory: Option<usize>,
}

impl LimitArgs {
    fn resource_limits(&self) -> ResourceLimits {
        let default = ResourceLimits::default();
        ResourceLimits {
            max_call_stack_depth: self.max_call_stack_depth.unwrap_or(default.max_call_stack_depth),
            max_loop_iterations: self.max_loop_iterations.unwrap_or(default.max_loop_iterations),
            max_memory: self.max_memory.unwrap_or(default.max_memory),
        }
    }

    fn preset(&self) -> Result<Preset> {
        Preset::from_str(&self.preset).map_err(|e| anyhow::anyhow!(e))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive REPL
    Repl,

    /// Run a JavaScript file
    Run {
        /// The file to run
        file: PathBuf,
    },

    /// Evaluate JavaScript code
    Eval {
        /// The code to evaluate
        code: String,
    },

    /// Parse and display the AST for a file or inline snippet
    Ast {
        /// The file or code to parse
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Some(command) = cli.command {
        return match command {
            Commands::Repl => run_repl(&cli.limits),
            Commands::Run { file } => run_file(&file, &cli.limits),
            Commands::Eval { code } => eval_code(&code, &cli.limits),
            Commands::Ast { input } => show_ast(&input),
        };
    }

    if let Some(code) = cli.eval {
        return eval_code(&code, &cli.limits);
    }

    if let Some(file) = cli.file {
        return run_file(&file, &cli.limits);
    }

    run_repl(&cli.limits)
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

fn build_interpreter(limits: &LimitArgs) -> Result<(Interpreter, Option<Rc<RefCell<presets::TimerQueue>>>)> {
    let preset = limits.preset()?;
    let (globals, timers) = presets::globals_for(preset);
    let interp = Interpreter::new(InterpreterConfig {
        globals,
        resource_limits: limits.resource_limits(),
        ..Default::default()
    });
    Ok((interp, timers))
}

fn run_repl(limits: &LimitArgs) -> Result<()> {
    use quicksilver::repl::{Repl, ReplConfig};

    let mut config = ReplConfig::default();
    config.preset = limits.preset()?;

    let mut repl = Repl::with_config(config).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    repl.run().map_err(|e| anyhow::anyhow!(e.to_string()))
}

fn run_file(path: &PathBuf, limits: &LimitArgs) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let (mut interp, timers) = build_interpreter(limits)?;
    let result = interp.evaluate(&source, EvalOptions::default()).and_then(|v| {
        drain_timers(&mut interp, &timers)?;
        Ok(v)
    });
    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn eval_code(code: &str, limits: &LimitArgs) -> Result<()> {
    let (mut interp, timers) = build_interpreter(limits)?;
    let result = interp.evaluate(code, EvalOptions::default()).and_then(|v| {
        drain_timers(&mut interp, &timers)?;
        Ok(v)
    });
    match result {
        Ok(value) => {
            if !matches!(value, quicksilver::Value::Undefined) {
                println!("{}", value.to_display_string());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn drain_timers(
    interp: &mut Interpreter,
    timers: &Option<Rc<RefCell<presets::TimerQueue>>>,
) -> quicksilver::Result<()> {
    if let Some(queue) = timers {
        presets::drain_timer_queue(interp, queue)?;
    }
    Ok(())
}

fn show_ast(input: &str) -> Result<()> {
    let source = if std::path::Path::new(input).exists() {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))?
    } else {
        input.to_string()
    };

    let program = quicksilver::parser::parse(&source).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!("{:#?}", program);
    Ok(())
}
