//! Collection patterns built from arrays and plain objects. The interpreter
//! core has no `Map`/`Set`/`WeakMap`/`WeakSet`/`Proxy` builtins of its own —
//! those are host-preset additions — so this file covers the array methods
//! and object idioms scripts actually use to build map- and set-like
//! structures.

mod common;
use common::run_js;
use quicksilver::Value;

mod object_as_map {
    use super::*;

    #[test]
    fn test_object_used_as_string_keyed_map() {
        let result = run_js(
            "
            let ages = {};
            ages['alice'] = 30;
            ages['bob'] = 25;
            ages['alice'] + ages['bob']
        ",
        );
        assert_eq!(result.unwrap(), Value::Number(55.0));
    }

    #[test]
    fn test_object_has_via_in_operator() {
        let result = run_js(
            "
            let seen = { a: true };
            ('a' in seen) && !('b' in seen)
        ",
        );
        assert_eq!(result.unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_object_delete_removes_entry() {
        let result = run_js(
            "
            let store = { x: 1, y: 2 };
            delete store.x;
            ('x' in store) || store.y
        ",
        );
        assert_eq!(result.unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_for_in_iterates_own_keys() {
        let result = run_js(
            "
            let obj = { a: 1, b: 2, c: 3 };
            let total = 0;
            for (let key in obj) { total = total + obj[key]; }
            total
        ",
        );
        assert_eq!(result.unwrap(), Value::Number(6.0));
    }
}

mod array_as_set {
    use super::*;

    #[test]
    fn test_includes_checks_membership() {
        let result = run_js(
            "
            let tags = ['a', 'b', 'c'];
            tags.includes('b') && !tags.includes('z')
        ",
        );
        assert_eq!(result.unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_dedupe_with_filter_and_index_of() {
        let result = run_js(
            "
            let nums = [1, 2, 2, 3, 1, 4];
            let unique = nums.filter(function(v, i) { return nums.indexOf(v) === i; });
            unique.length
        ",
        );
        assert_eq!(result.unwrap(), Value::Number(4.0));
    }

    #[test]
    fn test_union_via_concat_and_dedupe() {
        let result = run_js(
            "
            let a = [1, 2, 3];
            let b = [3, 4, 5];
            let merged = a.concat(b);
            let union = merged.filter(function(v, i) { return merged.indexOf(v) === i; });
            union.length
        ",
        );
        assert_eq!(result.unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_in_operator_respects_deleted_array_slots() {
        // `delete a[1]` leaves `length` unchanged, so `in` must check the
        // slot itself rather than just comparing the index against length.
        let result = run_js(
            "
            let a = [1, 2, 3];
            delete a[1];
            (1 in a) || (0 in a && 2 in a)
        ",
        );
        assert_eq!(result.unwrap(), Value::Boolean(true));

        let deleted_only = run_js(
            "
            let a = [1, 2, 3];
            delete a[1];
            1 in a
        ",
        );
        assert_eq!(deleted_only.unwrap(), Value::Boolean(false));
    }
}

mod array_transformations {
    use super::*;

    #[test]
    fn test_map_filter_reduce_pipeline() {
        let result = run_js(
            "
            let nums = [1, 2, 3, 4, 5, 6];
            let result = nums
                .filter(function(n) { return n % 2 === 0; })
                .map(function(n) { return n * n; })
                .reduce(function(acc, n) { return acc + n; }, 0);
            result
        ",
        );
        // evens: 2,4,6 -> squares: 4,16,36 -> sum 56
        assert_eq!(result.unwrap(), Value::Number(56.0));
    }

    #[test]
    fn test_find_returns_first_match() {
        let result = run_js(
            "
            let nums = [1, 3, 5, 8, 9];
            nums.find(function(n) { return n % 2 === 0; })
        ",
        );
        assert_eq!(result.unwrap(), Value::Number(8.0));
    }

    #[test]
    fn test_every_and_some() {
        let result = run_js(
            "
            let nums = [2, 4, 6];
            let allEven = nums.every(function(n) { return n % 2 === 0; });
            let hasBig = nums.some(function(n) { return n > 5; });
            allEven && hasBig
        ",
        );
        assert_eq!(result.unwrap(), Value::Boolean(true));
    }
}
