//! Integration tests for the host global presets.
//!
//! Each preset is additive: `Minimal` is always present, and the others
//! layer more globals on top of it. These tests exercise every export
//! `src/runtime/presets.rs` installs, using `common::run_js_with_preset`.

mod common;
use common::run_js_with_preset;
use quicksilver::runtime::presets::Preset;
use quicksilver::Value;

mod minimal {
    use super::*;

    #[test]
    fn math_constants_and_functions() {
        let v = run_js_with_preset(Preset::Minimal, "Math.floor(Math.PI)").unwrap();
        assert_eq!(v, Value::Number(3.0));

        let v = run_js_with_preset(Preset::Minimal, "Math.max(1, 5, 3)").unwrap();
        assert_eq!(v, Value::Number(5.0));

        let v = run_js_with_preset(Preset::Minimal, "Math.pow(2, 10)").unwrap();
        assert_eq!(v, Value::Number(1024.0));
    }

    #[test]
    fn json_round_trips_through_values() {
        let v = run_js_with_preset(Preset::Minimal, "JSON.parse('{\"a\":1,\"b\":[2,3]}').b[1]").unwrap();
        assert_eq!(v, Value::Number(3.0));

        let v = run_js_with_preset(Preset::Minimal, "JSON.stringify({a: 1, b: [2, 3]})").unwrap();
        assert_eq!(v, Value::string("{\"a\":1,\"b\":[2,3]}".to_string()));
    }

    #[test]
    fn console_log_does_not_throw_and_returns_undefined() {
        let v = run_js_with_preset(Preset::Minimal, "console.log('hi', 1, true)").unwrap();
        assert_eq!(v, Value::Undefined);
    }

    #[test]
    fn map_basic_operations() {
        let v = run_js_with_preset(
            Preset::Minimal,
            "let m = new Map(); m.set('a', 1); m.set('b', 2); m.get('a') + m.size",
        )
        .unwrap();
        assert_eq!(v, Value::Number(3.0));

        let v = run_js_with_preset(Preset::Minimal, "let m = new Map(); m.set('a', 1); m.has('a')").unwrap();
        assert_eq!(v, Value::Boolean(true));

        let v = run_js_with_preset(
            Preset::Minimal,
            "let m = new Map([['x', 10]]); m.delete('x'); m.size",
        )
        .unwrap();
        assert_eq!(v, Value::Number(0.0));
    }

    #[test]
    fn set_basic_operations() {
        let v = run_js_with_preset(
            Preset::Minimal,
            "let s = new Set([1, 2, 2, 3]); s.size",
        )
        .unwrap();
        assert_eq!(v, Value::Number(3.0));

        let v = run_js_with_preset(Preset::Minimal, "let s = new Set(); s.add(1); s.add(1); s.has(1)").unwrap();
        assert_eq!(v, Value::Boolean(true));
    }
}

mod wintercg {
    use super::*;

    #[test]
    fn text_encoder_produces_utf8_bytes() {
        let v = run_js_with_preset(Preset::WinterCG, "new TextEncoder().encode('AB')").unwrap();
        match v {
            Value::Array(arr) => {
                let values = arr.borrow().values();
                assert_eq!(values, vec![Value::Number(65.0), Value::Number(66.0)]);
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn text_decoder_round_trips_with_encoder() {
        let v = run_js_with_preset(
            Preset::WinterCG,
            "new TextDecoder().decode(new TextEncoder().encode('hello'))",
        )
        .unwrap();
        assert_eq!(v, Value::string("hello".to_string()));
    }

    #[test]
    fn crypto_random_uuid_has_v4_shape() {
        let v = run_js_with_preset(Preset::WinterCG, "crypto.randomUUID()").unwrap();
        let Value::String(s) = v else { panic!("expected string") };
        let parts: Vec<&str> = s.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[2].chars().next().unwrap(), '4');
    }

    #[test]
    fn crypto_get_random_values_fills_in_place() {
        let v = run_js_with_preset(
            Preset::WinterCG,
            "let a = [0, 0, 0, 0]; crypto.getRandomValues(a); a.length",
        )
        .unwrap();
        assert_eq!(v, Value::Number(4.0));
    }

    #[test]
    fn fetch_stub_rejects() {
        // fetch is async; calling it outside an async evaluation errors
        // before the stub itself ever runs, which is enough to confirm it
        // never silently succeeds at reaching the network.
        let err = run_js_with_preset(Preset::WinterCG, "fetch('https://example.com')");
        assert!(err.is_err());
    }
}

mod browser {
    use super::*;
    use quicksilver::runtime::{EvalOptions, InterpreterConfig};
    use quicksilver::runtime::presets::{self, drain_timer_queue};
    use quicksilver::Interpreter;

    #[test]
    fn set_timeout_runs_after_drain() {
        let (globals, timers) = presets::globals_for(Preset::Browser);
        let mut interp = Interpreter::new(InterpreterConfig { globals, ..Default::default() });
        let timers = timers.expect("browser preset installs a timer queue");

        interp
            .evaluate("let ran = false; setTimeout(() => { ran = true; }, 0); ran", EvalOptions::default())
            .unwrap();
        drain_timer_queue(&mut interp, &timers).unwrap();

        let v = interp.evaluate("ran", EvalOptions::default()).unwrap();
        assert_eq!(v, Value::Boolean(true));
    }

    #[test]
    fn clear_timeout_cancels_before_drain() {
        let (globals, timers) = presets::globals_for(Preset::Browser);
        let mut interp = Interpreter::new(InterpreterConfig { globals, ..Default::default() });
        let timers = timers.expect("browser preset installs a timer queue");

        interp
            .evaluate(
                "let ran = false; let id = setTimeout(() => { ran = true; }, 0); clearTimeout(id);",
                EvalOptions::default(),
            )
            .unwrap();
        drain_timer_queue(&mut interp, &timers).unwrap();

        let v = interp.evaluate("ran", EvalOptions::default()).unwrap();
        assert_eq!(v, Value::Boolean(false));
    }

    #[test]
    fn set_interval_requeues_until_cleared() {
        let (globals, timers) = presets::globals_for(Preset::Browser);
        let mut interp = Interpreter::new(InterpreterConfig { globals, ..Default::default() });
        let timers = timers.expect("browser preset installs a timer queue");

        interp
            .evaluate(
                "let count = 0; let id = setInterval(() => { count++; if (count >= 3) clearInterval(id); }, 0);",
                EvalOptions::default(),
            )
            .unwrap();
        drain_timer_queue(&mut interp, &timers).unwrap();

        let v = interp.evaluate("count", EvalOptions::default()).unwrap();
        assert_eq!(v, Value::Number(3.0));
    }

    #[test]
    fn url_parses_components() {
        let v = run_js_with_preset(
            Preset::Browser,
            "new URL('https://example.com/path?x=1#frag').pathname",
        )
        .unwrap();
        assert_eq!(v, Value::string("/path".to_string()));

        let v = run_js_with_preset(Preset::Browser, "new URL('https://example.com/path?x=1#frag').hash").unwrap();
        assert_eq!(v, Value::string("#frag".to_string()));
    }

    #[test]
    fn url_search_params_get_set_append() {
        let v = run_js_with_preset(
            Preset::Browser,
            "let p = new URLSearchParams('a=1&b=2'); p.get('b')",
        )
        .unwrap();
        assert_eq!(v, Value::string("2".to_string()));

        let v = run_js_with_preset(
            Preset::Browser,
            "let p = new URLSearchParams(''); p.set('k', 'v'); p.toString()",
        )
        .unwrap();
        assert_eq!(v, Value::string("k=v".to_string()));
    }

    #[test]
    fn performance_now_is_nonnegative_and_monotonic() {
        let v = run_js_with_preset(
            Preset::Browser,
            "let a = performance.now(); let b = performance.now(); b >= a",
        )
        .unwrap();
        assert_eq!(v, Value::Boolean(true));
    }
}

mod nodejs {
    use super::*;

    #[test]
    fn buffer_from_and_is_buffer() {
        let v = run_js_with_preset(Preset::NodeJS, "Buffer.from('AB')[0]").unwrap();
        assert_eq!(v, Value::Number(65.0));

        let v = run_js_with_preset(Preset::NodeJS, "Buffer.isBuffer(Buffer.alloc(3))").unwrap();
        assert_eq!(v, Value::Boolean(true));
    }

    #[test]
    fn buffer_alloc_zero_fills() {
        let v = run_js_with_preset(Preset::NodeJS, "Buffer.alloc(4).length").unwrap();
        assert_eq!(v, Value::Number(4.0));

        let v = run_js_with_preset(Preset::NodeJS, "Buffer.alloc(4)[2]").unwrap();
        assert_eq!(v, Value::Number(0.0));
    }

    #[test]
    fn data_view_round_trips_integers() {
        let v = run_js_with_preset(
            Preset::NodeJS,
            "let buf = new ArrayBuffer(4); let dv = new DataView(buf); \
             dv.setUint32(0, 305419896); dv.getUint32(0)",
        )
        .unwrap();
        assert_eq!(v, Value::Number(305419896.0));
    }

    #[test]
    fn data_view_respects_endianness() {
        let v = run_js_with_preset(
            Preset::NodeJS,
            "let buf = new ArrayBuffer(2); let dv = new DataView(buf); \
             dv.setUint16(0, 0x1234, true); dv.getUint16(0, false)",
        )
        .unwrap();
        assert_eq!(v, Value::Number(0x3412 as f64));
    }

    #[test]
    fn data_view_float64_round_trip() {
        let v = run_js_with_preset(
            Preset::NodeJS,
            "let buf = new ArrayBuffer(8); let dv = new DataView(buf); \
             dv.setFloat64(0, 3.5); dv.getFloat64(0)",
        )
        .unwrap();
        assert_eq!(v, Value::Number(3.5));
    }

    #[test]
    fn data_view_signed_int8_wraps() {
        let v = run_js_with_preset(
            Preset::NodeJS,
            "let buf = new ArrayBuffer(1); let dv = new DataView(buf); \
             dv.setInt8(0, -1); dv.getInt8(0)",
        )
        .unwrap();
        assert_eq!(v, Value::Number(-1.0));
    }
}

#[test]
fn presets_are_additive() {
    // Minimal globals remain available under every extended preset.
    let v = run_js_with_preset(Preset::NodeJS, "Math.abs(-5)").unwrap();
    assert_eq!(v, Value::Number(5.0));

    let v = run_js_with_preset(Preset::Browser, "new Map().size").unwrap();
    assert_eq!(v, Value::Number(0.0));

    let v = run_js_with_preset(Preset::WinterCG, "JSON.stringify([1, 2])").unwrap();
    assert_eq!(v, Value::string("[1,2]".to_string()));
}
