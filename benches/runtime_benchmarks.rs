//! Performance benchmarks for the Quicksilver sandboxed interpreter.
//!
//! Run with: cargo bench
//!
//! These benchmarks target tree-walking evaluation hot paths: interpreter
//! cold start, call overhead, loop iteration, generator resumption, and
//! preset builtin throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quicksilver::runtime::presets::{self, Preset};
use quicksilver::{EvalOptions, Interpreter, InterpreterConfig};

fn minimal_interpreter() -> Interpreter {
    let (globals, _timers) = presets::globals_for(Preset::Minimal);
    Interpreter::new(InterpreterConfig { globals, ..Default::default() })
}

fn eval(interp: &mut Interpreter, code: &str) -> quicksilver::Value {
    interp.evaluate(code, EvalOptions::default()).unwrap()
}

/// Benchmark: Cold start time (interpreter initialization)
fn bench_cold_start(c: &mut Criterion) {
    c.bench_function("cold_start", |b| {
        b.iter(|| {
            let interp = Interpreter::default();
            black_box(interp)
        })
    });

    c.bench_function("cold_start_with_presets", |b| {
        b.iter(|| {
            let interp = minimal_interpreter();
            black_box(interp)
        })
    });
}

/// Benchmark: Simple expression evaluation
fn bench_simple_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");

    group.bench_function("arithmetic", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("1 + 2 * 3 - 4 / 2")))
    });

    group.bench_function("string_concat", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("'hello' + ' ' + 'world'")))
    });

    group.bench_function("boolean_logic", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("true && false || !false")))
    });

    group.finish();
}

/// Benchmark: Function calls
fn bench_function_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("function_calls");

    group.bench_function("simple_call", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "function add(a, b) { return a + b; }");
        b.iter(|| eval(&mut interp, black_box("add(1, 2)")))
    });

    group.bench_function("recursive_fib_10", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "function fib(n) { return n <= 1 ? n : fib(n-1) + fib(n-2); }");
        b.iter(|| eval(&mut interp, black_box("fib(10)")))
    });

    group.bench_function("higher_order", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "function apply(f, x) { return f(x); }");
        eval(&mut interp, "function double(x) { return x * 2; }");
        b.iter(|| eval(&mut interp, black_box("apply(double, 21)")))
    });

    group.finish();
}

/// Benchmark: Loop performance
fn bench_loops(c: &mut Criterion) {
    let mut group = c.benchmark_group("loops");

    group.bench_function("while_1000", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("let i = 0; let sum = 0; while (i < 1000) { sum += i; i++; } sum")))
    });

    group.bench_function("for_1000", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("let sum = 0; for (let i = 0; i < 1000; i++) { sum += i; } sum")))
    });

    group.finish();
}

/// Benchmark: Object operations
fn bench_objects(c: &mut Criterion) {
    let mut group = c.benchmark_group("objects");

    group.bench_function("create_object", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("({ a: 1, b: 2, c: 3 })")))
    });

    group.bench_function("property_access", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "const obj = { a: 1, b: 2, c: 3 };");
        b.iter(|| eval(&mut interp, black_box("obj.a + obj.b + obj.c")))
    });

    group.bench_function("nested_access", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "const obj = { a: { b: { c: 42 } } };");
        b.iter(|| eval(&mut interp, black_box("obj.a.b.c")))
    });

    group.finish();
}

/// Benchmark: Array operations
fn bench_arrays(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrays");

    group.bench_function("create_array_100", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("let arr = []; for (let i = 0; i < 100; i++) arr.push(i); arr")))
    });

    group.bench_function("array_access", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "const arr = [1, 2, 3, 4, 5];");
        b.iter(|| eval(&mut interp, black_box("arr[0] + arr[2] + arr[4]")))
    });

    group.bench_function("array_sum_100", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "const arr = []; for (let i = 0; i < 100; i++) arr.push(i);");
        b.iter(|| eval(&mut interp, black_box("let sum = 0; for (let x of arr) sum += x; sum")))
    });

    group.finish();
}

/// Benchmark: Preset builtin functions
fn bench_builtins(c: &mut Criterion) {
    let mut group = c.benchmark_group("builtins");

    group.bench_function("math_sqrt", |b| {
        let mut interp = minimal_interpreter();
        b.iter(|| eval(&mut interp, black_box("Math.sqrt(42)")))
    });

    group.bench_function("math_random", |b| {
        let mut interp = minimal_interpreter();
        b.iter(|| eval(&mut interp, black_box("Math.random()")))
    });

    group.bench_function("json_stringify", |b| {
        let mut interp = minimal_interpreter();
        eval(&mut interp, "const obj = { a: 1, b: 'hello', c: [1, 2, 3] };");
        b.iter(|| eval(&mut interp, black_box("JSON.stringify(obj)")))
    });

    group.bench_function("json_parse", |b| {
        let mut interp = minimal_interpreter();
        b.iter(|| eval(&mut interp, black_box("JSON.parse('{\"a\":1,\"b\":2}')")))
    });

    group.finish();
}

/// Benchmark: String operations
fn bench_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("strings");

    group.bench_function("template_literal", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "const name = 'World';");
        b.iter(|| eval(&mut interp, black_box("`Hello, ${name}!`")))
    });

    group.bench_function("string_methods", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "const s = 'hello world';");
        b.iter(|| eval(&mut interp, black_box("s.toUpperCase()")))
    });

    group.finish();
}

/// Benchmark: try/catch/finally
fn bench_error_handling(c: &mut Criterion) {
    let mut group = c.benchmark_group("error_handling");

    group.bench_function("try_no_error", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("try { 1 + 2 } catch (e) { 0 }")))
    });

    group.bench_function("try_with_error", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("try { throw new Error('test'); } catch (e) { 42 }")))
    });

    group.finish();
}

/// Benchmark: Program size vs. parse+eval throughput
fn bench_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compilation");

    let small_program = "function add(a, b) { return a + b; } add(1, 2);";
    group.throughput(Throughput::Bytes(small_program.len() as u64));
    group.bench_function("small_program", |b| {
        b.iter(|| {
            let mut interp = Interpreter::default();
            eval(&mut interp, black_box(small_program))
        })
    });

    let medium_program = r#"
        function makeAccumulator() {
            let total = 0;
            return {
                add: function(n) { total += n; return total; },
                sub: function(n) { total -= n; return total; },
                get: function() { return total; }
            };
        }
        const acc = makeAccumulator();
        acc.add(10); acc.add(2); acc.sub(5); acc.get();
    "#;
    group.throughput(Throughput::Bytes(medium_program.len() as u64));
    group.bench_function("medium_program", |b| {
        b.iter(|| {
            let mut interp = Interpreter::default();
            eval(&mut interp, black_box(medium_program))
        })
    });

    group.finish();
}

/// Benchmark: Loop iteration scalability
fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");
    group.sample_size(50);

    for size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("loop_iterations", size), size, |b, &size| {
            let mut interp = Interpreter::default();
            let code = format!("let sum = 0; for (let i = 0; i < {}; i++) sum += i; sum", size);
            b.iter(|| eval(&mut interp, black_box(&code)))
        });
    }

    group.finish();
}

/// Benchmark: Destructuring patterns
fn bench_destructuring(c: &mut Criterion) {
    let mut group = c.benchmark_group("destructuring");

    group.bench_function("array_destructuring", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("let [a, b, c] = [1, 2, 3]; a + b + c")))
    });

    group.bench_function("object_destructuring", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("let {x, y, z} = {x: 1, y: 2, z: 3}; x + y + z")))
    });

    group.bench_function("nested_destructuring", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("let {a: {b}} = {a: {b: 42}}; b")))
    });

    group.finish();
}

/// Benchmark: Closure creation and execution
fn bench_closures(c: &mut Criterion) {
    let mut group = c.benchmark_group("closures");

    group.bench_function("closure_creation", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| eval(&mut interp, black_box("let x = 10; let f = function() { return x; }; f")))
    });

    group.bench_function("closure_execution", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "let x = 10; let f = function() { return x + 1; };");
        b.iter(|| eval(&mut interp, black_box("f()")))
    });

    group.bench_function("closure_chain", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "function a(x) { return function() { return x * 2; }; }");
        eval(&mut interp, "let b = a(5);");
        b.iter(|| eval(&mut interp, black_box("b()")))
    });

    group.finish();
}

/// Benchmark: Generator creation and resumption
fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");

    group.bench_function("create", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "function* gen() { yield 1; yield 2; yield 3; }");
        b.iter(|| eval(&mut interp, black_box("gen()")))
    });

    group.bench_function("resume_10", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "function* range(n) { for (let i = 0; i < n; i++) yield i; }");
        b.iter(|| {
            eval(
                &mut interp,
                black_box("let sum = 0; for (const x of range(10)) sum += x; sum"),
            )
        })
    });

    group.finish();
}

/// Benchmark: Map and Set operations
fn bench_map_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_set");

    group.bench_function("map_set_get", |b| {
        let mut interp = minimal_interpreter();
        b.iter(|| {
            eval(
                &mut interp,
                black_box("let m = new Map(); m.set('a', 1); m.set('b', 2); m.get('a') + m.get('b')"),
            )
        })
    });

    group.bench_function("set_add_has", |b| {
        let mut interp = minimal_interpreter();
        b.iter(|| {
            eval(&mut interp, black_box("let s = new Set(); s.add(1); s.add(2); s.add(3); s.has(2)"))
        })
    });

    group.finish();
}

/// Benchmark: Template literal interpolation
fn bench_template_literals(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_literals");

    group.bench_function("simple_interpolation", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "let name = 'World';");
        b.iter(|| eval(&mut interp, black_box("`Hello, ${name}!`")))
    });

    group.bench_function("complex_interpolation", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "let a = 1; let b = 2; let c = 'test';");
        b.iter(|| eval(&mut interp, black_box("`a=${a}, b=${b}, sum=${a + b}, str=${c}`")))
    });

    group.finish();
}

/// Benchmark: Spread and rest operators
fn bench_spread_rest(c: &mut Criterion) {
    let mut group = c.benchmark_group("spread_rest");

    group.bench_function("array_spread", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "let arr1 = [1, 2, 3]; let arr2 = [4, 5, 6];");
        b.iter(|| eval(&mut interp, black_box("[...arr1, ...arr2]")))
    });

    group.bench_function("function_rest", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "function sum(...args) { let s = 0; for (let x of args) s += x; return s; }");
        b.iter(|| eval(&mut interp, black_box("sum(1, 2, 3, 4, 5)")))
    });

    group.finish();
}

/// Benchmark: Fibonacci comparison workload (standard cross-runtime benchmark)
fn bench_fibonacci_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("fibonacci_comparison");
    group.sample_size(50);

    for n in [5, 10, 15, 20] {
        group.bench_with_input(BenchmarkId::new("fib", n), &n, |b, &n| {
            let mut interp = Interpreter::default();
            eval(&mut interp, "function fib(n) { return n <= 1 ? n : fib(n-1) + fib(n-2); }");
            let code = format!("fib({})", n);
            b.iter(|| eval(&mut interp, black_box(&code)))
        });
    }

    group.finish();
}

/// Benchmark: Property-heavy workload (simulates real-world object manipulation)
fn bench_property_intensive(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_intensive");

    group.bench_function("object_create_access_100", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| {
            eval(
                &mut interp,
                black_box(
                    r#"
                let result = 0;
                for (let i = 0; i < 100; i++) {
                    let obj = { x: i, y: i * 2, z: i * 3 };
                    result += obj.x + obj.y + obj.z;
                }
                result
            "#,
                ),
            )
        })
    });

    group.bench_function("array_map_filter_reduce", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "let data = []; for (let i = 0; i < 50; i++) data.push(i);");
        b.iter(|| {
            eval(
                &mut interp,
                black_box(
                    "data.map(function(x) { return x * 2; }).filter(function(x) { return x > 10; }).reduce(function(a, b) { return a + b; }, 0)",
                ),
            )
        })
    });

    group.finish();
}

/// Benchmark: String-heavy workload
fn bench_string_intensive(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_intensive");

    group.bench_function("string_build_100", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| {
            eval(
                &mut interp,
                black_box(
                    r#"
                let s = '';
                for (let i = 0; i < 100; i++) {
                    s += 'item' + i + ',';
                }
                s.length
            "#,
                ),
            )
        })
    });

    group.bench_function("string_split_join", |b| {
        let mut interp = Interpreter::default();
        eval(&mut interp, "let csv = 'a,b,c,d,e,f,g,h,i,j';");
        b.iter(|| eval(&mut interp, black_box("csv.split(',').join('-')")))
    });

    group.finish();
}

/// Benchmark: End-to-end real-world workloads
fn bench_real_world(c: &mut Criterion) {
    let mut group = c.benchmark_group("real_world");
    group.sample_size(50);

    group.bench_function("todo_app_simulation", |b| {
        let mut interp = minimal_interpreter();
        b.iter(|| {
            eval(
                &mut interp,
                black_box(
                    r#"
                let todos = [];
                for (let i = 0; i < 20; i++) {
                    todos.push({ id: i, text: 'Task ' + i, done: i % 3 === 0 });
                }
                let active = todos.filter(function(t) { return !t.done; });
                let completed = todos.filter(function(t) { return t.done; });
                let summary = {
                    total: todos.length,
                    active: active.length,
                    completed: completed.length
                };
                JSON.stringify(summary)
            "#,
                ),
            )
        })
    });

    group.bench_function("closure_based_state_machine", |b| {
        let mut interp = Interpreter::default();
        b.iter(|| {
            eval(
                &mut interp,
                black_box(
                    r#"
                function makeShape(kind, a, b) {
                    if (kind === 'circle') return { kind, area: function() { return 3.14159 * a * a; } };
                    return { kind, area: function() { return a * b; } };
                }
                let shapes = [makeShape('circle', 5), makeShape('rect', 3, 4), makeShape('circle', 10), makeShape('rect', 7, 2)];
                let total = 0;
                for (let s of shapes) { total += s.area(); }
                total
            "#,
                ),
            )
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cold_start,
    bench_simple_eval,
    bench_function_calls,
    bench_loops,
    bench_objects,
    bench_arrays,
    bench_builtins,
    bench_strings,
    bench_error_handling,
    bench_compilation,
    bench_scalability,
    bench_destructuring,
    bench_closures,
    bench_generators,
    bench_map_set,
    bench_template_literals,
    bench_spread_rest,
    bench_fibonacci_comparison,
    bench_property_intensive,
    bench_string_intensive,
    bench_real_world,
);

criterion_main!(benches);
