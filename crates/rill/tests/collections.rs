//! The builtin collection classes and their capability methods.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use rill::ExcKind;
use rill::Value;

#[test]
fn map_iteration_follows_insertion_order() {
    // Insert "a", "b", "c"; iterate via __get 0..2 and observe the keys
    // in insertion order.
    let program = vec![
        let_("m", call_name("Map", vec![])),
        expr_stmt(method(ident("m"), "put", vec![str_("a"), int(1)])),
        expr_stmt(method(ident("m"), "put", vec![str_("b"), int(2)])),
        expr_stmt(method(ident("m"), "put", vec![str_("c"), int(3)])),
        expr_stmt(array_lit(vec![
            method(method(ident("m"), "__get", vec![int(0)]), "first", vec![]),
            method(method(ident("m"), "__get", vec![int(1)]), "first", vec![]),
            method(method(ident("m"), "__get", vec![int(2)]), "first", vec![]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let keys: Vec<String> = items.read().iter().map(as_str).collect();
            assert_eq!(keys, vec!["a", "b", "c"]);
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn map_operations() {
    let program = vec![
        let_("m", map_lit(vec![(str_("x"), int(10))])),
        expr_stmt(method(ident("m"), "put", vec![str_("y"), int(20)])),
        expr_stmt(array_lit(vec![
            method(ident("m"), "get", vec![str_("x")]),
            method(ident("m"), "get", vec![str_("missing")]),
            method(ident("m"), "getOrDefault", vec![str_("missing"), int(-1)]),
            method(ident("m"), "size", vec![]),
            method(ident("m"), "containsKey", vec![str_("y")]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 10);
            assert!(items[1].is_nil());
            assert_eq!(as_int(&items[2]), -1);
            assert_eq!(as_int(&items[3]), 2);
            assert!(as_bool(&items[4]));
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn map_remove_preserves_remaining_order() {
    let program = vec![
        let_(
            "m",
            map_lit(vec![
                (str_("a"), int(1)),
                (str_("b"), int(2)),
                (str_("c"), int(3)),
            ]),
        ),
        expr_stmt(method(ident("m"), "remove", vec![str_("b")])),
        expr_stmt(method(
            method(ident("m"), "__get", vec![int(1)]),
            "first",
            vec![],
        )),
    ];
    assert_eq!(as_str(&run_ok(program)), "c");
}

#[test]
fn index_syntax_on_maps_and_arrays() {
    let program = vec![
        let_("m", map_lit(vec![(str_("k"), int(5))])),
        let_("a", array_lit(vec![int(1), int(2)])),
        assign_index(ident("a"), int(0), int(9)),
        assign_index(ident("m"), str_("k2"), int(6)),
        expr_stmt(array_lit(vec![
            index(ident("m"), str_("k")),
            index(ident("m"), str_("k2")),
            index(ident("a"), int(0)),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 5);
            assert_eq!(as_int(&items[1]), 6);
            assert_eq!(as_int(&items[2]), 9);
        }
        other => panic!("expected Array, got {other:?}"),
    }

    // Missing keys and out-of-range indices raise IndexError.
    let program = vec![
        let_("m", call_name("Map", vec![])),
        expr_stmt(index(ident("m"), str_("nope"))),
    ];
    assert_eq!(run_err(program).kind, ExcKind::IndexError);

    let program = vec![
        let_("a", array_lit(vec![int(1)])),
        expr_stmt(index(ident("a"), int(5))),
    ];
    assert_eq!(run_err(program).kind, ExcKind::IndexError);
}

#[test]
fn unhashable_map_keys_are_type_errors() {
    let program = vec![
        let_("m", call_name("Map", vec![])),
        expr_stmt(method(
            ident("m"),
            "put",
            vec![array_lit(vec![]), int(1)],
        )),
    ];
    assert_eq!(run_err(program).kind, ExcKind::TypeError);
}

#[test]
fn array_surface() {
    let program = vec![
        let_("a", call_name("Array", vec![int(3), int(1), int(2)])),
        expr_stmt(method(ident("a"), "push", vec![int(4)])),
        expr_stmt(array_lit(vec![
            method(ident("a"), "length", vec![]),
            method(ident("a"), "contains", vec![int(4)]),
            method(ident("a"), "indexOf", vec![int(1)]),
            method(ident("a"), "join", vec![str_("-")]),
            method(ident("a"), "pop", vec![]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 4);
            assert!(as_bool(&items[1]));
            assert_eq!(as_int(&items[2]), 1);
            assert_eq!(as_str(&items[3]), "3-1-2-4");
            assert_eq!(as_int(&items[4]), 4);
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn array_map_and_filter_take_closures() {
    let program = vec![
        let_("a", array_lit(vec![int(1), int(2), int(3), int(4)])),
        let_(
            "doubled",
            method(
                ident("a"),
                "map",
                vec![lambda_expr(vec!["x"], add(ident("x"), ident("x")))],
            ),
        ),
        expr_stmt(method(ident("doubled"), "join", vec![str_(",")])),
    ];
    assert_eq!(as_str(&run_ok(program)), "2,4,6,8");

    let program = vec![
        let_("a", array_lit(vec![int(1), int(2), int(3), int(4)])),
        let_(
            "kept",
            method(
                ident("a"),
                "filter",
                vec![lambda_expr(
                    vec!["x"],
                    binop(rill::ast::BinOp::Gt, ident("x"), int(2)),
                )],
            ),
        ),
        expr_stmt(method(ident("kept"), "join", vec![str_(",")])),
    ];
    assert_eq!(as_str(&run_ok(program)), "3,4");
}

#[test]
fn slicing_clamps_and_preserves_kind() {
    let program = vec![
        let_("a", array_lit(vec![int(0), int(1), int(2), int(3)])),
        expr_stmt(method(
            slice(ident("a"), int(1), int(3)),
            "join",
            vec![str_(",")],
        )),
    ];
    assert_eq!(as_str(&run_ok(program)), "1,2");

    // Bounds clamp, start past end yields empty.
    let program = vec![
        let_("a", array_lit(vec![int(0), int(1)])),
        expr_stmt(method(slice(ident("a"), int(1), int(99)), "length", vec![])),
    ];
    assert_eq!(as_int(&run_ok(program)), 1);

    let program = vec![
        let_("s", str_("hello")),
        expr_stmt(slice(ident("s"), int(1), int(4))),
    ];
    assert_eq!(as_str(&run_ok(program)), "ell");
}

#[test]
fn list_surface() {
    let program = vec![
        let_("l", call_name("List", vec![int(1), int(3)])),
        expr_stmt(method(ident("l"), "insert", vec![int(1), int(2)])),
        expr_stmt(method(ident("l"), "add", vec![int(4)])),
        expr_stmt(method(ident("l"), "removeAt", vec![int(3)])),
        expr_stmt(array_lit(vec![
            method(ident("l"), "length", vec![]),
            method(ident("l"), "get", vec![int(1)]),
            method(ident("l"), "remove", vec![int(1)]),
            method(ident("l"), "length", vec![]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 3);
            assert_eq!(as_int(&items[1]), 2);
            assert!(as_bool(&items[2]));
            assert_eq!(as_int(&items[3]), 2);
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn set_deduplicates_and_keeps_insertion_order() {
    let program = vec![
        let_("s", call_name("Set", vec![int(2), int(1), int(2), int(3)])),
        expr_stmt(array_lit(vec![
            method(ident("s"), "size", vec![]),
            method(ident("s"), "add", vec![int(1)]),
            method(ident("s"), "add", vec![int(4)]),
            method(ident("s"), "contains", vec![int(3)]),
            method(ident("s"), "__get", vec![int(0)]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 3);
            assert!(!as_bool(&items[1]), "re-adding an element reports false");
            assert!(as_bool(&items[2]));
            assert!(as_bool(&items[3]));
            assert_eq!(as_int(&items[4]), 2);
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn deque_pushes_and_pops_at_both_ends() {
    let program = vec![
        let_("d", call_name("Deque", vec![int(2)])),
        expr_stmt(method(ident("d"), "pushFront", vec![int(1)])),
        expr_stmt(method(ident("d"), "pushBack", vec![int(3)])),
        expr_stmt(array_lit(vec![
            method(ident("d"), "popFront", vec![]),
            method(ident("d"), "popBack", vec![]),
            method(ident("d"), "length", vec![]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 1);
            assert_eq!(as_int(&items[1]), 3);
            assert_eq!(as_int(&items[2]), 1);
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn ranges_are_lazy_and_support_step() {
    // A huge range costs nothing to build or measure.
    let program = vec![expr_stmt(method(
        range_lit(int(0), int(1_000_000_000)),
        "length",
        vec![],
    ))];
    assert_eq!(as_int(&run_ok(program)), 1_000_000_000);

    let program = vec![
        let_("r", call_name("Range", vec![int(0), int(10), int(3)])),
        expr_stmt(array_lit(vec![
            method(ident("r"), "length", vec![]),
            index(ident("r"), int(2)),
            method(ident("r"), "contains", vec![int(9)]),
            method(ident("r"), "contains", vec![int(7)]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 4);
            assert_eq!(as_int(&items[1]), 6);
            assert!(as_bool(&items[2]));
            assert!(!as_bool(&items[3]));
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn bytes_decode_and_slice() {
    let program = vec![
        let_("b", method(str_("hello"), "toBytes", vec![])),
        expr_stmt(array_lit(vec![
            method(ident("b"), "length", vec![]),
            index(ident("b"), int(0)),
            method(slice(ident("b"), int(1), int(3)), "decode", vec![]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 5);
            assert_eq!(as_int(&items[1]), 104); // 'h'
            assert_eq!(as_str(&items[2]), "el");
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn string_surface() {
    let program = vec![
        let_("s", str_("  Hello, World  ")),
        expr_stmt(array_lit(vec![
            method(method(ident("s"), "trim", vec![]), "length", vec![]),
            method(ident("s"), "contains", vec![str_("World")]),
            method(str_("a,b,c"), "split", vec![str_(",")]),
            method(str_("abc"), "toUpperCase", vec![]),
            method(str_("abc"), "indexOf", vec![str_("c")]),
            index(str_("abc"), int(1)),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 12);
            assert!(as_bool(&items[1]));
            match &items[2] {
                Value::Array(parts) => assert_eq!(parts.read().len(), 3),
                other => panic!("expected Array, got {other:?}"),
            }
            assert_eq!(as_str(&items[3]), "ABC");
            assert_eq!(as_int(&items[4]), 2);
            assert_eq!(as_str(&items[5]), "b");
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn wrapper_classes_expose_value_and_conversions() {
    // The `_value` sentinel unboxes to the primitive itself.
    let program = vec![expr_stmt(field(int(42), "_value"))];
    assert_eq!(as_int(&run_ok(program)), 42);

    let program = vec![expr_stmt(array_lit(vec![
        method(int(-5), "abs", vec![]),
        method(ident("Int"), "parse", vec![str_(" 42 ")]),
        call_name("Integer", vec![str_("7")]),
        method(float(2.7), "floor", vec![]),
        method(int(3), "toString", vec![]),
    ]))];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 5);
            assert_eq!(as_int(&items[1]), 42);
            assert_eq!(as_int(&items[2]), 7);
            match &items[3] {
                Value::Float(f) => assert_eq!(*f, 2.0),
                other => panic!("expected Float, got {other:?}"),
            }
            assert_eq!(as_str(&items[4]), "3");
        }
        other => panic!("expected Array, got {other:?}"),
    }

    let program = vec![expr_stmt(method(ident("Int"), "parse", vec![str_("xyz")]))];
    assert_eq!(run_err(program).kind, ExcKind::ValueError);
}

#[test]
fn len_builtin_delegates_to_length() {
    let program = vec![expr_stmt(array_lit(vec![
        call_name("len", vec![array_lit(vec![int(1), int(2)])]),
        call_name("len", vec![str_("abcd")]),
        call_name("len", vec![map_lit(vec![(str_("a"), int(1))])]),
        call_name("len", vec![range_lit(int(0), int(3))]),
    ]))];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 2);
            assert_eq!(as_int(&items[1]), 4);
            assert_eq!(as_int(&items[2]), 1);
            assert_eq!(as_int(&items[3]), 3);
        }
        other => panic!("expected Array, got {other:?}"),
    }

    let program = vec![expr_stmt(call_name("len", vec![int(3)]))];
    assert_eq!(run_err(program).kind, ExcKind::TypeError);
}

#[test]
fn user_classes_participate_in_indexing_via_capabilities() {
    use rill::ast::Stmt;

    // class Grid { let cells; init() { this.cells = Map() }
    //   def __get(k) = this.cells.get(k)
    //   def __set(k, v) { this.cells.put(k, v) } }
    let mut grid = class_decl("Grid");
    grid.fields.push(field_decl("cells", rill::Modifiers::default()));
    grid.constructors.push(ctor(
        vec![],
        vec![assign_field(this(), "cells", call_name("Map", vec![]))],
    ));
    grid.methods.push(method_expr(
        "__get",
        vec![p("k")],
        method(field(this(), "cells"), "get", vec![ident("k")]),
    ));
    grid.methods.push(method_decl(
        "__set",
        vec![p("k"), p("v")],
        vec![expr_stmt(method(
            field(this(), "cells"),
            "put",
            vec![ident("k"), ident("v")],
        ))],
    ));

    let program = vec![
        stmt(Stmt::ClassDecl(grid)),
        let_("g", call_name("Grid", vec![])),
        assign_index(ident("g"), str_("a"), int(7)),
        expr_stmt(index(ident("g"), str_("a"))),
    ];
    assert_eq!(as_int(&run_ok(program)), 7);
}
