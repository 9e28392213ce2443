//! Core-syntax features that don't depend on any host preset: optional
//! chaining, nullish coalescing, template literals, spread, and `typeof`.

mod common;
use common::run_js;
use quicksilver::Value;

mod advanced_features {
    use super::*;

    #[test]
    fn test_optional_chaining_nested() {
        let result = run_js(
            "
            let obj = { a: { b: { c: 42 } } };
            let val = obj?.a?.b?.c;
            val
        ",
        )
        .unwrap();
        assert_eq!(result, Value::Number(42.0));
    }

    #[test]
    fn test_optional_chaining_short_circuits_on_missing_link() {
        let result = run_js(
            "
            let obj = { a: { b: { c: 42 } } };
            typeof obj?.x?.y?.z
        ",
        )
        .unwrap();
        assert_eq!(result, Value::string("undefined"));
    }

    #[test]
    fn test_nullish_coalescing_chain() {
        let result = run_js(
            "
            let a = null;
            let b = undefined;
            let c = 'found';
            a ?? b ?? c
        ",
        )
        .unwrap();
        assert_eq!(result, Value::string("found"));
    }

    #[test]
    fn test_nullish_coalescing_keeps_falsy_non_nullish() {
        let result = run_js("0 ?? 99").unwrap();
        assert_eq!(result, Value::Number(0.0));
    }

    #[test]
    fn test_template_literal_expression() {
        let result = run_js(
            "
            let x = 10;
            let y = 20;
            `${x} + ${y} = ${x + y}`
        ",
        )
        .unwrap();
        assert_eq!(result, Value::string("10 + 20 = 30"));
    }

    #[test]
    fn test_spread_in_function_call() {
        let result = run_js(
            "
            function sum3(a, b, c) { return a + b + c; }
            let args = [1, 2, 3];
            sum3(...args)
        ",
        )
        .unwrap();
        assert_eq!(result, Value::Number(6.0));
    }

    #[test]
    fn test_spread_in_array_literal() {
        let result = run_js(
            "
            let a = [1, 2];
            let b = [...a, 3, 4];
            b.length
        ",
        )
        .unwrap();
        assert_eq!(result, Value::Number(4.0));
    }

    #[test]
    fn test_typeof_operator() {
        let result = run_js(
            "
            typeof undefined === 'undefined' &&
            typeof null === 'object' &&
            typeof true === 'boolean' &&
            typeof 42 === 'number' &&
            typeof 'hello' === 'string' &&
            typeof {} === 'object' &&
            typeof [] === 'object' &&
            typeof function(){} === 'function'
        ",
        )
        .unwrap();
        assert_eq!(result, Value::Boolean(true));
    }

    #[test]
    fn test_string_length_and_indexing() {
        let result = run_js(
            "
            let greeting = 'Hello';
            greeting.length + greeting[0].length
        ",
        )
        .unwrap();
        assert_eq!(result, Value::Number(6.0));
    }
}
