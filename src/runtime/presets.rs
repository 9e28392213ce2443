//! Host global presets.
//!
//! A preset is data, not logic: a bundle of plain `Value`s — `HostFn`
//! closures, `Value::Object`s, `Value::Array`s — meant to be installed via
//! `InterpreterConfig::globals`. None of this module introduces a new
//! `Value` variant; every export is buildable from the primitives the
//! interpreter core already exposes: there is no prototype chain and no
//! getters/setters to hang a richer export on.
//!
//! `Minimal` is the base every other preset extends: `Math`, `JSON`,
//! `console`, and `Map`/`Set` shims. `WinterCG` layers encoding/crypto/fetch
//! stubs on top. `Browser` adds timers (via a cooperative queue the
//! embedder drains explicitly, see [`drain_timer_queue`]), `URL`/
//! `URLSearchParams`, and `performance.now()`. `NodeJS` adds `Buffer`-shaped
//! byte helpers and a minimal `ArrayBuffer`/`DataView` pair.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Instant;

use crate::error::Error;
use crate::runtime::interpreter::value_to_number;
use crate::runtime::value::HostFunction;
use crate::runtime::{Interpreter, Value};
use crate::Result;

/// Which bundle of host globals to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Minimal,
    WinterCG,
    Browser,
    NodeJS,
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(Preset::Minimal),
            "wintercg" => Ok(Preset::WinterCG),
            "browser" => Ok(Preset::Browser),
            "nodejs" => Ok(Preset::NodeJS),
            other => Err(format!("unknown preset '{other}' (expected minimal, wintercg, browser, or nodejs)")),
        }
    }
}

/// A `setTimeout`/`setInterval` entry: the callback to invoke, the interval
/// for repeating timers, and whether it has been cancelled.
struct Timer {
    id: u64,
    callback: Value,
    args: Vec<Value>,
    repeat: bool,
    cancelled: bool,
}

/// The Browser preset's cooperative timer queue.
///
/// There is no event loop in an embedded sandbox, so this does not run on
/// wall-clock time: every queued timer is considered "due" the next time
/// [`drain_timer_queue`] is called, regardless of its requested delay. This
/// is a deliberate simplification, documented in DESIGN.md, of running
/// timers polled between top-level statements — a literal per-statement
/// hook would require threading the queue through `exec_block_statements`,
/// which is shared by nested blocks and function bodies, not just top-level
/// programs.
#[derive(Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    fn schedule(&mut self, callback: Value, args: Vec<Value>, repeat: bool) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.timers.push(Timer { id, callback, args, repeat, cancelled: false });
        id
    }

    fn cancel(&mut self, id: u64) {
        if let Some(t) = self.timers.iter_mut().find(|t| t.id == id) {
            t.cancelled = true;
        }
    }
}

/// Runs every timer currently queued on `preset`'s `Browser`/`NodeJS`
/// globals, removing one-shot timers and re-queuing repeating ones. The
/// embedder (CLI, REPL, or host application) is expected to call this after
/// each top-level `evaluate`/`evaluate_async` call.
pub fn drain_timer_queue(interp: &mut Interpreter, queue: &Rc<RefCell<TimerQueue>>) -> Result<()> {
    loop {
        let due: Vec<Timer> = {
            let mut q = queue.borrow_mut();
            if q.timers.is_empty() {
                break;
            }
            std::mem::take(&mut q.timers)
        };
        if due.is_empty() {
            break;
        }
        for timer in due {
            if timer.cancelled {
                continue;
            }
            interp.call(timer.callback.clone(), Value::Undefined, timer.args.clone())?;
            if timer.repeat && !timer.cancelled {
                queue.borrow_mut().timers.push(Timer { cancelled: false, ..timer });
            }
        }
    }
    Ok(())
}

/// Builds the global bindings for `preset`. Returns the bundle plus, for
/// presets that install timers, a handle the embedder drains via
/// [`drain_timer_queue`].
pub fn globals_for(preset: Preset) -> (Vec<(String, Value)>, Option<Rc<RefCell<TimerQueue>>>) {
    let mut globals = minimal_globals();
    let mut timers = None;
    match preset {
        Preset::Minimal => {}
        Preset::WinterCG => globals.extend(wintercg_globals()),
        Preset::Browser => {
            globals.extend(wintercg_globals());
            let (browser, queue) = browser_globals();
            globals.extend(browser);
            timers = Some(queue);
        }
        Preset::NodeJS => globals.extend(nodejs_globals()),
    }
    (globals, timers)
}

fn value_to_usize(v: Option<&Value>) -> usize {
    v.map(value_to_number).filter(|n| n.is_finite() && *n >= 0.0).map(|n| n as usize).unwrap_or(0)
}

// ---- Minimal: Math, JSON, console, Map, Set --------------------------------

fn minimal_globals() -> Vec<(String, Value)> {
    vec![
        ("Math".to_string(), make_math()),
        ("JSON".to_string(), make_json()),
        ("console".to_string(), make_console()),
        ("Map".to_string(), Value::HostFn(make_map_ctor())),
        ("Set".to_string(), Value::HostFn(make_set_ctor())),
    ]
}

fn make_math() -> Value {
    macro_rules! unary {
        ($name:literal, $f:expr) => {
            Value::HostFn(HostFunction::new($name, move |_i, _t, args: Vec<Value>| {
                let n = args.first().map(value_to_number).unwrap_or(f64::NAN);
                let f: fn(f64) -> f64 = $f;
                Ok(Value::Number(f(n)))
            }))
        };
    }

    Value::object(vec![
        ("PI".to_string(), Value::Number(std::f64::consts::PI)),
        ("E".to_string(), Value::Number(std::f64::consts::E)),
        ("LN2".to_string(), Value::Number(std::f64::consts::LN_2)),
        ("LN10".to_string(), Value::Number(std::f64::consts::LN_10)),
        ("LOG2E".to_string(), Value::Number(std::f64::consts::LOG2_E)),
        ("LOG10E".to_string(), Value::Number(std::f64::consts::LOG10_E)),
        ("SQRT2".to_string(), Value::Number(std::f64::consts::SQRT_2)),
        ("abs".to_string(), unary!("abs", f64::abs)),
        ("floor".to_string(), unary!("floor", f64::floor)),
        ("ceil".to_string(), unary!("ceil", f64::ceil)),
        ("round".to_string(), unary!("round", |n: f64| (n + 0.5).floor())),
        ("trunc".to_string(), unary!("trunc", f64::trunc)),
        ("sign".to_string(), unary!("sign", f64::signum)),
        ("sqrt".to_string(), unary!("sqrt", f64::sqrt)),
        ("cbrt".to_string(), unary!("cbrt", f64::cbrt)),
        ("sin".to_string(), unary!("sin", f64::sin)),
        ("cos".to_string(), unary!("cos", f64::cos)),
        ("tan".to_string(), unary!("tan", f64::tan)),
        ("log".to_string(), unary!("log", f64::ln)),
        ("log2".to_string(), unary!("log2", f64::log2)),
        ("log10".to_string(), unary!("log10", f64::log10)),
        ("exp".to_string(), unary!("exp", f64::exp)),
        (
            "pow".to_string(),
            Value::HostFn(HostFunction::new("pow", |_i, _t, args| {
                let base = args.first().map(value_to_number).unwrap_or(f64::NAN);
                let exp = args.get(1).map(value_to_number).unwrap_or(f64::NAN);
                Ok(Value::Number(base.powf(exp)))
            })),
        ),
        (
            "hypot".to_string(),
            Value::HostFn(HostFunction::new("hypot", |_i, _t, args| {
                let sum: f64 = args.iter().map(|v| value_to_number(v).powi(2)).sum();
                Ok(Value::Number(sum.sqrt()))
            })),
        ),
        (
            "min".to_string(),
            Value::HostFn(HostFunction::new("min", |_i, _t, args| {
                Ok(Value::Number(args.iter().map(value_to_number).fold(f64::INFINITY, f64::min)))
            })),
        ),
        (
            "max".to_string(),
            Value::HostFn(HostFunction::new("max", |_i, _t, args| {
                Ok(Value::Number(args.iter().map(value_to_number).fold(f64::NEG_INFINITY, f64::max)))
            })),
        ),
        (
            "random".to_string(),
            Value::HostFn(HostFunction::new("random", |_i, _t, _args| Ok(Value::Number(rand::random::<f64>())))),
        ),
    ])
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Undefined => serde_json::Value::Null,
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Array(arr) => serde_json::Value::Array(arr.borrow().values().iter().map(value_to_json).collect()),
        Value::Object(obj) => {
            let o = obj.borrow();
            let mut map = serde_json::Map::new();
            for k in o.keys() {
                if let Some(val) = o.get(&k) {
                    if val.is_callable() {
                        continue;
                    }
                    map.insert(k.to_string(), value_to_json(&val));
                }
            }
            serde_json::Value::Object(map)
        }
        Value::SandboxFn(_) | Value::HostFn(_) | Value::Generator(_) => serde_json::Value::Null,
    }
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s.clone()),
        serde_json::Value::Array(a) => Value::array(a.iter().map(json_to_value).collect()),
        serde_json::Value::Object(o) => Value::object(o.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect()),
    }
}

fn make_json() -> Value {
    Value::object(vec![
        (
            "stringify".to_string(),
            Value::HostFn(HostFunction::new("stringify", |_i, _t, args| {
                let value = args.first().cloned().unwrap_or(Value::Undefined);
                let json = value_to_json(&value);
                let pretty = args.get(2).map(|v| v.is_truthy()).unwrap_or(false);
                let text = if pretty {
                    serde_json::to_string_pretty(&json)
                } else {
                    serde_json::to_string(&json)
                }
                .map_err(|e| Error::type_error(format!("JSON.stringify failed: {e}")))?;
                Ok(Value::string(text))
            })),
        ),
        (
            "parse".to_string(),
            Value::HostFn(HostFunction::new("parse", |_i, _t, args| {
                let text = args.first().map(|v| v.to_display_string()).unwrap_or_default();
                let json: serde_json::Value =
                    serde_json::from_str(&text).map_err(|e| Error::syntax_error(format!("JSON.parse: {e}")))?;
                Ok(json_to_value(&json))
            })),
        ),
    ])
}

fn make_console() -> Value {
    fn joined(args: &[Value]) -> String {
        args.iter().map(|v| v.to_display_string()).collect::<Vec<_>>().join(" ")
    }

    macro_rules! printer {
        ($name:literal, $tracer:ident) => {
            Value::HostFn(HostFunction::new($name, |_i, _t, args| {
                let line = joined(&args);
                tracing::$tracer!(target: "console", "{}", line);
                println!("{}", line);
                Ok(Value::Undefined)
            }))
        };
    }

    Value::object(vec![
        ("log".to_string(), printer!("log", info)),
        ("info".to_string(), printer!("info", info)),
        ("debug".to_string(), printer!("debug", debug)),
        (
            "warn".to_string(),
            Value::HostFn(HostFunction::new("warn", |_i, _t, args| {
                let line = joined(&args);
                tracing::warn!(target: "console", "{}", line);
                eprintln!("{}", line);
                Ok(Value::Undefined)
            })),
        ),
        (
            "error".to_string(),
            Value::HostFn(HostFunction::new("error", |_i, _t, args| {
                let line = joined(&args);
                tracing::error!(target: "console", "{}", line);
                eprintln!("{}", line);
                Ok(Value::Undefined)
            })),
        ),
    ])
}

// ---- Map / Set ---------------------------------------------------------

fn make_map_ctor() -> Rc<HostFunction> {
    HostFunction::new("Map", |interp, this, args| {
        let storage: Rc<RefCell<Vec<(Value, Value)>>> = Rc::new(RefCell::new(Vec::new()));
        if let Some(init) = args.first() {
            if !init.is_nullish() {
                let env = interp.global_env.clone();
                for entry in interp.drain_iterable(&env, init, usize::MAX)? {
                    if let Value::Array(pair) = &entry {
                        let pair = pair.borrow();
                        storage.borrow_mut().push((pair.get(0), pair.get(1)));
                    }
                }
            }
        }
        install_map_methods(&this, storage);
        Ok(this)
    })
}

fn install_map_methods(this: &Value, storage: Rc<RefCell<Vec<(Value, Value)>>>) {
    let Value::Object(obj) = this else { return };
    let mut o = obj.borrow_mut();
    o.insert("size", Value::Number(storage.borrow().len() as f64));

    let s = storage.clone();
    o.insert(
        "get",
        Value::HostFn(HostFunction::new("get", move |_i, _t, args| {
            let key = args.first().cloned().unwrap_or(Value::Undefined);
            Ok(s.borrow().iter().find(|(k, _)| k.strict_eq(&key)).map(|(_, v)| v.clone()).unwrap_or(Value::Undefined))
        })),
    );

    let s = storage.clone();
    o.insert(
        "has",
        Value::HostFn(HostFunction::new("has", move |_i, _t, args| {
            let key = args.first().cloned().unwrap_or(Value::Undefined);
            Ok(Value::Boolean(s.borrow().iter().any(|(k, _)| k.strict_eq(&key))))
        })),
    );

    let s = storage.clone();
    let this_for_set = this.clone();
    o.insert(
        "set",
        Value::HostFn(HostFunction::new("set", move |_i, t, args| {
            let key = args.first().cloned().unwrap_or(Value::Undefined);
            let value = args.get(1).cloned().unwrap_or(Value::Undefined);
            {
                let mut storage = s.borrow_mut();
                match storage.iter_mut().find(|(k, _)| k.strict_eq(&key)) {
                    Some(slot) => slot.1 = value,
                    None => storage.push((key, value)),
                }
            }
            update_map_size(&this_for_set, &s);
            Ok(t)
        })),
    );

    let s = storage.clone();
    let this_for_delete = this.clone();
    o.insert(
        "delete",
        Value::HostFn(HostFunction::new("delete", move |_i, _t, args| {
            let key = args.first().cloned().unwrap_or(Value::Undefined);
            let mut storage = s.borrow_mut();
            let before = storage.len();
            storage.retain(|(k, _)| !k.strict_eq(&key));
            let removed = storage.len() != before;
            drop(storage);
            update_map_size(&this_for_delete, &s);
            Ok(Value::Boolean(removed))
        })),
    );

    let s = storage.clone();
    let this_for_clear = this.clone();
    o.insert(
        "clear",
        Value::HostFn(HostFunction::new("clear", move |_i, _t, _args| {
            s.borrow_mut().clear();
            update_map_size(&this_for_clear, &s);
            Ok(Value::Undefined)
        })),
    );

    let s = storage.clone();
    o.insert(
        "forEach",
        Value::HostFn(HostFunction::new("forEach", move |interp, _t, args| {
            let callback = args.first().cloned().unwrap_or(Value::Undefined);
            let entries = s.borrow().clone();
            for (k, v) in entries {
                interp.call(callback.clone(), Value::Undefined, vec![v, k])?;
            }
            Ok(Value::Undefined)
        })),
    );

    let s = storage.clone();
    o.insert(
        "keys",
        Value::HostFn(HostFunction::new("keys", move |_i, _t, _args| {
            Ok(Value::array(s.borrow().iter().map(|(k, _)| k.clone()).collect()))
        })),
    );

    let s = storage;
    o.insert(
        "values",
        Value::HostFn(HostFunction::new("values", move |_i, _t, _args| {
            Ok(Value::array(s.borrow().iter().map(|(_, v)| v.clone()).collect()))
        })),
    );
}

fn update_map_size(this: &Value, storage: &Rc<RefCell<Vec<(Value, Value)>>>) {
    if let Value::Object(obj) = this {
        obj.borrow_mut().insert("size", Value::Number(storage.borrow().len() as f64));
    }
}

fn make_set_ctor() -> Rc<HostFunction> {
    HostFunction::new("Set", |interp, this, args| {
        let storage: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
        if let Some(init) = args.first() {
            if !init.is_nullish() {
                let env = interp.global_env.clone();
                for entry in interp.drain_iterable(&env, init, usize::MAX)? {
                    if !storage.borrow().iter().any(|v| v.strict_eq(&entry)) {
                        storage.borrow_mut().push(entry);
                    }
                }
            }
        }
        install_set_methods(&this, storage);
        Ok(this)
    })
}

fn install_set_methods(this: &Value, storage: Rc<RefCell<Vec<Value>>>) {
    let Value::Object(obj) = this else { return };
    let mut o = obj.borrow_mut();
    o.insert("size", Value::Number(storage.borrow().len() as f64));

    let s = storage.clone();
    o.insert(
        "has",
        Value::HostFn(HostFunction::new("has", move |_i, _t, args| {
            let v = args.first().cloned().unwrap_or(Value::Undefined);
            Ok(Value::Boolean(s.borrow().iter().any(|x| x.strict_eq(&v))))
        })),
    );

    let s = storage.clone();
    let this_for_add = this.clone();
    o.insert(
        "add",
        Value::HostFn(HostFunction::new("add", move |_i, t, args| {
            let v = args.first().cloned().unwrap_or(Value::Undefined);
            if !s.borrow().iter().any(|x| x.strict_eq(&v)) {
                s.borrow_mut().push(v);
            }
            update_set_size(&this_for_add, &s);
            Ok(t)
        })),
    );

    let s = storage.clone();
    let this_for_delete = this.clone();
    o.insert(
        "delete",
        Value::HostFn(HostFunction::new("delete", move |_i, _t, args| {
            let v = args.first().cloned().unwrap_or(Value::Undefined);
            let mut storage = s.borrow_mut();
            let before = storage.len();
            storage.retain(|x| !x.strict_eq(&v));
            let removed = storage.len() != before;
            drop(storage);
            update_set_size(&this_for_delete, &s);
            Ok(Value::Boolean(removed))
        })),
    );

    let s = storage.clone();
    let this_for_clear = this.clone();
    o.insert(
        "clear",
        Value::HostFn(HostFunction::new("clear", move |_i, _t, _args| {
            s.borrow_mut().clear();
            update_set_size(&this_for_clear, &s);
            Ok(Value::Undefined)
        })),
    );

    let s = storage;
    o.insert(
        "forEach",
        Value::HostFn(HostFunction::new("forEach", move |interp, _t, args| {
            let callback = args.first().cloned().unwrap_or(Value::Undefined);
            let entries = s.borrow().clone();
            for v in entries {
                interp.call(callback.clone(), Value::Undefined, vec![v.clone(), v])?;
            }
            Ok(Value::Undefined)
        })),
    );
}

fn update_set_size(this: &Value, storage: &Rc<RefCell<Vec<Value>>>) {
    if let Value::Object(obj) = this {
        obj.borrow_mut().insert("size", Value::Number(storage.borrow().len() as f64));
    }
}

// ---- WinterCG: TextEncoder/TextDecoder, crypto stub, fetch stub -----------

fn wintercg_globals() -> Vec<(String, Value)> {
    vec![
        ("TextEncoder".to_string(), Value::HostFn(make_text_encoder_ctor())),
        ("TextDecoder".to_string(), Value::HostFn(make_text_decoder_ctor())),
        ("crypto".to_string(), make_crypto()),
        ("fetch".to_string(), Value::HostFn(make_fetch_stub())),
    ]
}

fn make_text_encoder_ctor() -> Rc<HostFunction> {
    HostFunction::new("TextEncoder", |_interp, this, _args| {
        if let Value::Object(obj) = &this {
            obj.borrow_mut().insert(
                "encode",
                Value::HostFn(HostFunction::new("encode", |_i, _t, args| {
                    let text = args.first().map(|v| v.to_display_string()).unwrap_or_default();
                    Ok(Value::array(text.bytes().map(|b| Value::Number(b as f64)).collect()))
                })),
            );
        }
        Ok(this)
    })
}

fn make_text_decoder_ctor() -> Rc<HostFunction> {
    HostFunction::new("TextDecoder", |_interp, this, _args| {
        if let Value::Object(obj) = &this {
            obj.borrow_mut().insert(
                "decode",
                Value::HostFn(HostFunction::new("decode", |interp, _t, args| {
                    let arr = args.first().cloned().unwrap_or(Value::Undefined);
                    let env = interp.global_env.clone();
                    let bytes: Vec<u8> = interp
                        .drain_iterable(&env, &arr, usize::MAX)?
                        .iter()
                        .map(|v| value_to_number(v) as i64 as u8)
                        .collect();
                    Ok(Value::string(String::from_utf8_lossy(&bytes).into_owned()))
                })),
            );
        }
        Ok(this)
    })
}

fn make_crypto() -> Value {
    Value::object(vec![
        (
            "randomUUID".to_string(),
            Value::HostFn(HostFunction::new("randomUUID", |_i, _t, _args| {
                let bytes: [u8; 16] = rand::random();
                Ok(Value::string(format_uuid_v4(bytes)))
            })),
        ),
        (
            "getRandomValues".to_string(),
            Value::HostFn(HostFunction::new("getRandomValues", |_i, _t, args| {
                if let Some(Value::Array(arr)) = args.first() {
                    let mut a = arr.borrow_mut();
                    let len = a.len();
                    for i in 0..len {
                        a.set(i, Value::Number(rand::random::<u8>() as f64));
                    }
                }
                Ok(args.into_iter().next().unwrap_or(Value::Undefined))
            })),
        ),
    ])
}

fn format_uuid_v4(mut bytes: [u8; 16]) -> String {
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

/// Every host must supply its own network access; the default `fetch`
/// always rejects so that a sandboxed script never silently succeeds at
/// reaching the network.
fn make_fetch_stub() -> Rc<HostFunction> {
    HostFunction::new_async("fetch", |_i, _t, _args| {
        Err(Error::type_error(
            "fetch is not implemented by the default WinterCG preset; supply a host fetch implementation via EvalOptions/InterpreterConfig globals",
        ))
    })
}

// ---- Browser: timers, URL/URLSearchParams, performance --------------------

fn browser_globals() -> (Vec<(String, Value)>, Rc<RefCell<TimerQueue>>) {
    let queue = Rc::new(RefCell::new(TimerQueue::default()));
    let start = Instant::now();

    let q = queue.clone();
    let set_timeout = Value::HostFn(HostFunction::new("setTimeout", move |_i, _t, mut args| {
        if args.is_empty() {
            return Ok(Value::Number(0.0));
        }
        let callback = args.remove(0);
        let _delay_ms = args.first().map(value_to_number).unwrap_or(0.0);
        let extra = if args.len() > 1 { args[1..].to_vec() } else { Vec::new() };
        let id = q.borrow_mut().schedule(callback, extra, false);
        Ok(Value::Number(id as f64))
    }));

    let q = queue.clone();
    let set_interval = Value::HostFn(HostFunction::new("setInterval", move |_i, _t, mut args| {
        if args.is_empty() {
            return Ok(Value::Number(0.0));
        }
        let callback = args.remove(0);
        let _delay_ms = args.first().map(value_to_number).unwrap_or(0.0);
        let extra = if args.len() > 1 { args[1..].to_vec() } else { Vec::new() };
        let id = q.borrow_mut().schedule(callback, extra, true);
        Ok(Value::Number(id as f64))
    }));

    let q = queue.clone();
    let clear_timeout = Value::HostFn(HostFunction::new("clearTimeout", move |_i, _t, args| {
        let id = args.first().map(value_to_number).unwrap_or(0.0) as u64;
        q.borrow_mut().cancel(id);
        Ok(Value::Undefined)
    }));

    let q = queue.clone();
    let clear_interval = Value::HostFn(HostFunction::new("clearInterval", move |_i, _t, args| {
        let id = args.first().map(value_to_number).unwrap_or(0.0) as u64;
        q.borrow_mut().cancel(id);
        Ok(Value::Undefined)
    }));

    let performance = Value::object(vec![(
        "now".to_string(),
        Value::HostFn(HostFunction::new("now", move |_i, _t, _args| {
            Ok(Value::Number(start.elapsed().as_secs_f64() * 1000.0))
        })),
    )]);

    let globals = vec![
        ("setTimeout".to_string(), set_timeout),
        ("setInterval".to_string(), set_interval),
        ("clearTimeout".to_string(), clear_timeout),
        ("clearInterval".to_string(), clear_interval),
        ("performance".to_string(), performance),
        ("URL".to_string(), Value::HostFn(make_url_ctor())),
        ("URLSearchParams".to_string(), Value::HostFn(make_url_search_params_ctor())),
    ];
    (globals, queue)
}

fn make_url_ctor() -> Rc<HostFunction> {
    HostFunction::new("URL", |_interp, this, args| {
        let href = args.first().map(|v| v.to_display_string()).unwrap_or_default();
        let (protocol, rest) = href.split_once("://").unwrap_or(("", href.as_str()));
        let (authority, path_and_query) = rest.split_once('/').map(|(a, b)| (a, format!("/{b}"))).unwrap_or((rest, String::new()));
        let (path_and_query, hash) = path_and_query.split_once('#').map(|(a, b)| (a.to_string(), b.to_string())).unwrap_or((path_and_query, String::new()));
        let (pathname, search) = path_and_query.split_once('?').map(|(a, b)| (a.to_string(), format!("?{b}"))).unwrap_or((path_and_query, String::new()));

        if let Value::Object(obj) = &this {
            let mut o = obj.borrow_mut();
            o.insert("href", Value::string(href.clone()));
            o.insert("protocol", Value::string(format!("{protocol}:")));
            o.insert("host", Value::string(authority.to_string()));
            o.insert("pathname", Value::string(if pathname.is_empty() { "/".to_string() } else { pathname }));
            o.insert("search", Value::string(search));
            o.insert("hash", Value::string(if hash.is_empty() { String::new() } else { format!("#{hash}") }));
            o.insert(
                "toString",
                Value::HostFn(HostFunction::new("toString", move |_i, t, _args| {
                    if let Value::Object(o) = &t {
                        Ok(o.borrow().get("href").unwrap_or(Value::Undefined))
                    } else {
                        Ok(Value::Undefined)
                    }
                })),
            );
        }
        Ok(this)
    })
}

fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn make_url_search_params_ctor() -> Rc<HostFunction> {
    HostFunction::new("URLSearchParams", |_interp, this, args| {
        let init = args.first().map(|v| v.to_display_string()).unwrap_or_default();
        let storage = Rc::new(RefCell::new(parse_query_pairs(&init)));

        if let Value::Object(obj) = &this {
            let mut o = obj.borrow_mut();

            let s = storage.clone();
            o.insert(
                "get",
                Value::HostFn(HostFunction::new("get", move |_i, _t, args| {
                    let key = args.first().map(|v| v.to_display_string()).unwrap_or_default();
                    Ok(s.borrow().iter().find(|(k, _)| *k == key).map(|(_, v)| Value::string(v.clone())).unwrap_or(Value::Null))
                })),
            );

            let s = storage.clone();
            o.insert(
                "has",
                Value::HostFn(HostFunction::new("has", move |_i, _t, args| {
                    let key = args.first().map(|v| v.to_display_string()).unwrap_or_default();
                    Ok(Value::Boolean(s.borrow().iter().any(|(k, _)| *k == key)))
                })),
            );

            let s = storage.clone();
            o.insert(
                "set",
                Value::HostFn(HostFunction::new("set", move |_i, _t, args| {
                    let key = args.first().map(|v| v.to_display_string()).unwrap_or_default();
                    let value = args.get(1).map(|v| v.to_display_string()).unwrap_or_default();
                    let mut storage = s.borrow_mut();
                    match storage.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = value,
                        None => storage.push((key, value)),
                    }
                    Ok(Value::Undefined)
                })),
            );

            let s = storage.clone();
            o.insert(
                "append",
                Value::HostFn(HostFunction::new("append", move |_i, _t, args| {
                    let key = args.first().map(|v| v.to_display_string()).unwrap_or_default();
                    let value = args.get(1).map(|v| v.to_display_string()).unwrap_or_default();
                    s.borrow_mut().push((key, value));
                    Ok(Value::Undefined)
                })),
            );

            let s = storage;
            o.insert(
                "toString",
                Value::HostFn(HostFunction::new("toString", move |_i, _t, _args| {
                    let text = s.borrow().iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
                    Ok(Value::string(text))
                })),
            );
        }
        Ok(this)
    })
}

// ---- NodeJS: Buffer helpers, ArrayBuffer/DataView --------------------------

fn nodejs_globals() -> Vec<(String, Value)> {
    vec![
        ("Buffer".to_string(), make_buffer()),
        ("ArrayBuffer".to_string(), Value::HostFn(make_array_buffer_ctor())),
        ("DataView".to_string(), Value::HostFn(make_data_view_ctor())),
    ]
}

fn make_buffer() -> Value {
    Value::object(vec![
        (
            "from".to_string(),
            Value::HostFn(HostFunction::new("from", |_i, _t, args| {
                let text = args.first().map(|v| v.to_display_string()).unwrap_or_default();
                Ok(Value::array(text.bytes().map(|b| Value::Number(b as f64)).collect()))
            })),
        ),
        (
            "alloc".to_string(),
            Value::HostFn(HostFunction::new("alloc", |_i, _t, args| {
                let len = value_to_usize(args.first());
                Ok(Value::array(vec![Value::Number(0.0); len]))
            })),
        ),
        (
            "isBuffer".to_string(),
            Value::HostFn(HostFunction::new("isBuffer", |_i, _t, args| {
                Ok(Value::Boolean(matches!(args.first(), Some(Value::Array(_)))))
            })),
        ),
    ])
}

fn make_array_buffer_ctor() -> Rc<HostFunction> {
    HostFunction::new("ArrayBuffer", |_interp, this, args| {
        let len = value_to_usize(args.first());
        let bytes = Rc::new(RefCell::new(vec![0u8; len]));

        if let Value::Object(obj) = &this {
            let mut o = obj.borrow_mut();
            o.insert("byteLength", Value::Number(len as f64));

            let b = bytes.clone();
            o.insert(
                "_read",
                Value::HostFn(HostFunction::new("_read", move |_i, _t, args| {
                    let idx = value_to_usize(args.first());
                    Ok(Value::Number(*b.borrow().get(idx).unwrap_or(&0) as f64))
                })),
            );

            let b = bytes;
            o.insert(
                "_write",
                Value::HostFn(HostFunction::new("_write", move |_i, _t, args| {
                    let idx = value_to_usize(args.first());
                    let v = args.get(1).map(value_to_number).unwrap_or(0.0) as i64 as u8;
                    if let Some(slot) = b.borrow_mut().get_mut(idx) {
                        *slot = v;
                    }
                    Ok(Value::Undefined)
                })),
            );
        }
        Ok(this)
    })
}

fn read_byte(interp: &mut Interpreter, read_fn: &Value, buffer: &Value, index: usize) -> Result<u8> {
    let v = interp.call(read_fn.clone(), buffer.clone(), vec![Value::Number(index as f64)])?;
    Ok(value_to_number(&v) as i64 as u8)
}

fn write_byte(interp: &mut Interpreter, write_fn: &Value, buffer: &Value, index: usize, byte: u8) -> Result<()> {
    interp.call(write_fn.clone(), buffer.clone(), vec![Value::Number(index as f64), Value::Number(byte as f64)])?;
    Ok(())
}

/// `DataView` over an `ArrayBuffer`: a compact subset of the real API
/// (8/16/32-bit ints, float64) composed from the buffer's `_read`/`_write`
/// host methods rather than a shared Rust-level byte slice, since a
/// `Value::Object` has no storage besides its property map.
fn make_data_view_ctor() -> Rc<HostFunction> {
    HostFunction::new("DataView", |_interp, this, args| {
        let buffer = args.first().cloned().unwrap_or(Value::Undefined);
        let byte_offset = value_to_usize(args.get(1));
        let (read_fn, write_fn) = match &buffer {
            Value::Object(obj) => {
                let o = obj.borrow();
                (o.get("_read"), o.get("_write"))
            }
            _ => (None, None),
        };
        let (read_fn, write_fn) = match (read_fn, write_fn) {
            (Some(r), Some(w)) => (r, w),
            _ => return Err(Error::type_error("DataView requires an ArrayBuffer")),
        };

        if let Value::Object(obj) = &this {
            let mut o = obj.borrow_mut();
            o.insert("buffer", buffer.clone());
            o.insert("byteOffset", Value::Number(byte_offset as f64));

            macro_rules! getter {
                ($name:literal, $nbytes:literal, $signed:expr, $big_endian_default:expr) => {{
                    let (read_fn, buffer) = (read_fn.clone(), buffer.clone());
                    Value::HostFn(HostFunction::new($name, move |interp, _t, args| {
                        let offset = byte_offset + value_to_usize(args.first());
                        let little_endian = args.get(1).map(|v| v.is_truthy()).unwrap_or(!$big_endian_default);
                        let mut bytes = [0u8; 8];
                        for i in 0..$nbytes {
                            bytes[i] = read_byte(interp, &read_fn, &buffer, offset + i)?;
                        }
                        if !little_endian {
                            bytes[..$nbytes].reverse();
                        }
                        let raw = u64::from_le_bytes(bytes);
                        let value = if $signed {
                            let shift = 64 - $nbytes * 8;
                            (((raw << shift) as i64) >> shift) as f64
                        } else {
                            raw as f64
                        };
                        Ok(Value::Number(value))
                    }))
                }};
            }

            macro_rules! setter {
                ($name:literal, $nbytes:literal, $big_endian_default:expr) => {{
                    let (write_fn, buffer) = (write_fn.clone(), buffer.clone());
                    Value::HostFn(HostFunction::new($name, move |interp, _t, args| {
                        let offset = byte_offset + value_to_usize(args.first());
                        let raw = args.get(1).map(value_to_number).unwrap_or(0.0) as i64 as u64;
                        let little_endian = args.get(2).map(|v| v.is_truthy()).unwrap_or(!$big_endian_default);
                        let mut bytes = raw.to_le_bytes();
                        if !little_endian {
                            bytes[..$nbytes].reverse();
                        }
                        for i in 0..$nbytes {
                            write_byte(interp, &write_fn, &buffer, offset + i, bytes[i])?;
                        }
                        Ok(Value::Undefined)
                    }))
                }};
            }

            o.insert("getUint8", getter!("getUint8", 1, false, true));
            o.insert("getInt8", getter!("getInt8", 1, true, true));
            o.insert("setUint8", setter!("setUint8", 1, true));
            o.insert("setInt8", setter!("setInt8", 1, true));
            o.insert("getUint16", getter!("getUint16", 2, false, true));
            o.insert("getInt16", getter!("getInt16", 2, true, true));
            o.insert("setUint16", setter!("setUint16", 2, true));
            o.insert("setInt16", setter!("setInt16", 2, true));
            o.insert("getUint32", getter!("getUint32", 4, false, true));
            o.insert("getInt32", getter!("getInt32", 4, true, true));
            o.insert("setUint32", setter!("setUint32", 4, true));
            o.insert("setInt32", setter!("setInt32", 4, true));

            let (read_fn_f64, write_fn_f64, buffer_f64) = (read_fn.clone(), write_fn.clone(), buffer.clone());
            o.insert(
                "getFloat64",
                Value::HostFn(HostFunction::new("getFloat64", move |interp, _t, args| {
                    let offset = byte_offset + value_to_usize(args.first());
                    let little_endian = args.get(1).map(|v| v.is_truthy()).unwrap_or(false);
                    let mut bytes = [0u8; 8];
                    for (i, b) in bytes.iter_mut().enumerate() {
                        *b = read_byte(interp, &read_fn_f64, &buffer_f64, offset + i)?;
                    }
                    if !little_endian {
                        bytes.reverse();
                    }
                    Ok(Value::Number(f64::from_le_bytes(bytes)))
                })),
            );
            o.insert(
                "setFloat64",
                Value::HostFn(HostFunction::new("setFloat64", move |interp, _t, args| {
                    let offset = byte_offset + value_to_usize(args.first());
                    let n = args.get(1).map(value_to_number).unwrap_or(0.0);
                    let little_endian = args.get(2).map(|v| v.is_truthy()).unwrap_or(false);
                    let mut bytes = n.to_le_bytes();
                    if !little_endian {
                        bytes.reverse();
                    }
                    for (i, b) in bytes.iter().enumerate() {
                        write_byte(interp, &write_fn_f64, &buffer_f64, offset + i, *b)?;
                    }
                    Ok(Value::Undefined)
                })),
            );
        }
        Ok(this)
    })
}
