//! Control flow: scoping, constness, loops, destructuring, defer and
//! try/catch/finally ordering.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use rill::ast::{BinOp, Stmt};
use rill::ExcKind;

#[test]
fn try_catch_finally_with_defers_prints_in_order() {
    // def run() {
    //   defer println("d1")
    //   try {
    //     defer println("d2")
    //     throw RuntimeError("x")
    //   } catch (e: RuntimeError) {
    //     println("caught " + e.getMessage())
    //   } finally {
    //     println("fin")
    //   }
    // }
    // run()
    let body = vec![
        stmt(Stmt::Defer(vec![println_of(str_("d1"))])),
        stmt(Stmt::Try {
            body: vec![
                stmt(Stmt::Defer(vec![println_of(str_("d2"))])),
                throw_new("RuntimeError", "x"),
            ],
            catches: vec![catch_clause(
                Some("RuntimeError"),
                "e",
                vec![println_of(add(
                    str_("caught "),
                    method(ident("e"), "getMessage", vec![]),
                ))],
            )],
            finally: Some(vec![println_of(str_("fin"))]),
        }),
    ];
    let program = vec![
        func_decl("run", vec![], body),
        expr_stmt(call_name("run", vec![])),
    ];
    let (result, output) = run_capture(program);
    result.unwrap();
    assert_eq!(output, "d2\ncaught x\nfin\nd1\n");
}

#[test]
fn defers_run_lifo_on_scope_exit() {
    let body = vec![
        stmt(Stmt::Defer(vec![println_of(str_("d1"))])),
        stmt(Stmt::Defer(vec![println_of(str_("d2"))])),
        stmt(Stmt::Defer(vec![println_of(str_("d3"))])),
    ];
    let program = vec![
        func_decl("run", vec![], body),
        expr_stmt(call_name("run", vec![])),
    ];
    let (result, output) = run_capture(program);
    result.unwrap();
    assert_eq!(output, "d3\nd2\nd1\n");
}

#[test]
fn defers_run_on_error_paths_too() {
    let body = vec![
        stmt(Stmt::Defer(vec![println_of(str_("cleanup"))])),
        throw_new("ValueError", "boom"),
    ];
    let program = vec![
        func_decl("run", vec![], body),
        expr_stmt(call_name("run", vec![])),
    ];
    let (result, output) = run_capture(program);
    assert_eq!(result.unwrap_err().kind, ExcKind::ValueError);
    assert_eq!(output, "cleanup\n");
}

#[test]
fn finally_return_overrides_try_return() {
    let body = vec![stmt(Stmt::Try {
        body: vec![ret(Some(int(1)))],
        catches: vec![],
        finally: Some(vec![ret(Some(int(2)))]),
    })];
    let program = vec![
        func_decl("f", vec![], body),
        expr_stmt(call_name("f", vec![])),
    ];
    assert_eq!(as_int(&run_ok(program)), 2);
}

#[test]
fn finally_throw_overrides_pending_exception() {
    let program = vec![stmt(Stmt::Try {
        body: vec![throw_new("RuntimeError", "first")],
        catches: vec![],
        finally: Some(vec![throw_new("ValueError", "second")]),
    })];
    let err = run_err(program);
    assert_eq!(err.kind, ExcKind::ValueError);
    assert_eq!(err.message, "second");
}

#[test]
fn unmatched_exceptions_rethrow_after_finally() {
    let program = vec![stmt(Stmt::Try {
        body: vec![throw_new("ValueError", "v")],
        catches: vec![catch_clause(Some("TypeError"), "e", vec![])],
        finally: Some(vec![println_of(str_("fin"))]),
    })];
    let (result, output) = run_capture(program);
    let err = result.unwrap_err();
    assert_eq!(err.kind, ExcKind::ValueError);
    assert_eq!(output, "fin\n");
}

#[test]
fn catch_all_clause_matches_anything() {
    let program = vec![
        stmt(Stmt::Try {
            body: vec![throw_new("IndexError", "oops")],
            catches: vec![catch_clause(None, "e", vec![expr_stmt(method(
                ident("e"),
                "getKind",
                vec![],
            ))])],
            finally: None,
        }),
    ];
    assert_eq!(as_str(&run_ok(program)), "IndexError");
}

#[test]
fn scope_bindings_are_lexical() {
    // A block-local name is invisible to the enclosing scope.
    let program = vec![
        stmt(Stmt::Block(vec![let_("inner", int(1))])),
        expr_stmt(ident("inner")),
    ];
    assert_eq!(run_err(program).kind, ExcKind::NameError);

    // Descendant scopes read outer bindings.
    let program = vec![
        let_("outer", int(7)),
        stmt(Stmt::Block(vec![stmt(Stmt::Block(vec![expr_stmt(ident(
            "outer",
        ))]))])),
    ];
    assert_eq!(as_int(&run_ok(program)), 7);
}

#[test]
fn const_rejects_redeclaration_and_reassignment() {
    let program = vec![const_("k", int(1)), assign("k", int(2))];
    assert_eq!(run_err(program).kind, ExcKind::StateError);

    let program = vec![const_("k", int(1)), let_("k", int(2))];
    assert_eq!(run_err(program).kind, ExcKind::StateError);
}

#[test]
fn assignment_walks_to_the_declaring_scope() {
    let program = vec![
        var_("total", int(0)),
        stmt(Stmt::Block(vec![assign("total", int(10))])),
        expr_stmt(ident("total")),
    ];
    assert_eq!(as_int(&run_ok(program)), 10);
}

#[test]
fn while_loop_with_break_and_continue() {
    // Sum odd numbers below 10, stopping at 7.
    let program = vec![
        var_("i", int(0)),
        var_("sum", int(0)),
        stmt(Stmt::While {
            cond: binop(BinOp::Lt, ident("i"), int(10)),
            body: vec![
                assign("i", add(ident("i"), int(1))),
                stmt(Stmt::If {
                    cond: binop(
                        BinOp::Eq,
                        binop(BinOp::Rem, ident("i"), int(2)),
                        int(0),
                    ),
                    then_block: vec![stmt(Stmt::Continue)],
                    else_block: None,
                }),
                stmt(Stmt::If {
                    cond: binop(BinOp::Gt, ident("i"), int(6)),
                    then_block: vec![stmt(Stmt::Break)],
                    else_block: None,
                }),
                assign("sum", add(ident("sum"), ident("i"))),
            ],
        }),
        expr_stmt(ident("sum")),
    ];
    // 1 + 3 + 5 = 9; the loop breaks at 7 before adding it.
    assert_eq!(as_int(&run_ok(program)), 9);
}

#[test]
fn loop_statement_exits_via_break() {
    let program = vec![
        var_("n", int(0)),
        stmt(Stmt::Loop {
            body: vec![
                assign("n", add(ident("n"), int(1))),
                stmt(Stmt::If {
                    cond: binop(BinOp::Ge, ident("n"), int(3)),
                    then_block: vec![stmt(Stmt::Break)],
                    else_block: None,
                }),
            ],
        }),
        expr_stmt(ident("n")),
    ];
    assert_eq!(as_int(&run_ok(program)), 3);
}

#[test]
fn for_in_iterates_arrays_and_ranges() {
    let program = vec![
        var_("sum", int(0)),
        stmt(Stmt::ForIn {
            names: vec!["x".to_owned()],
            iterable: array_lit(vec![int(1), int(2), int(3)]),
            body: vec![assign("sum", add(ident("sum"), ident("x")))],
        }),
        stmt(Stmt::ForIn {
            names: vec!["x".to_owned()],
            iterable: range_lit(int(0), int(4)),
            body: vec![assign("sum", add(ident("sum"), ident("x")))],
        }),
        expr_stmt(ident("sum")),
    ];
    // 6 from the array, 0+1+2+3 from the range.
    assert_eq!(as_int(&run_ok(program)), 12);
}

#[test]
fn multi_variable_for_in_over_a_map() {
    let program = vec![
        let_(
            "m",
            map_lit(vec![(str_("a"), int(1)), (str_("b"), int(2))]),
        ),
        var_("keys", str_("")),
        var_("total", int(0)),
        stmt(Stmt::ForIn {
            names: vec!["k".to_owned(), "v".to_owned()],
            iterable: ident("m"),
            body: vec![
                assign("keys", add(ident("keys"), ident("k"))),
                assign("total", add(ident("total"), ident("v"))),
            ],
        }),
        expr_stmt(add(ident("keys"), ident("total"))),
    ];
    assert_eq!(as_str(&run_ok(program)), "ab3");
}

#[test]
fn destructuring_requires_matching_piece_counts() {
    // Three names, three pieces: ok.
    let program = vec![
        stmt(Stmt::Destructure {
            names: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            value: array_lit(vec![int(1), int(2), int(3)]),
        }),
        expr_stmt(add(ident("a"), add(ident("b"), ident("c")))),
    ];
    assert_eq!(as_int(&run_ok(program)), 6);

    // Three names, two pieces: ValueError.
    let program = vec![stmt(Stmt::Destructure {
        names: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
        value: call_name("Pair", vec![int(1), int(2)]),
    })];
    assert_eq!(run_err(program).kind, ExcKind::ValueError);
}

#[test]
fn pair_destructuring_binds_both_pieces() {
    let program = vec![
        stmt(Stmt::Destructure {
            names: vec!["x".to_owned(), "y".to_owned()],
            value: call_name("Pair", vec![str_("k"), int(9)]),
        }),
        expr_stmt(add(ident("x"), ident("y"))),
    ];
    assert_eq!(as_str(&run_ok(program)), "k9");
}

#[test]
fn conditions_must_be_booleans() {
    let program = vec![stmt(Stmt::If {
        cond: int(1),
        then_block: vec![],
        else_block: None,
    })];
    assert_eq!(run_err(program).kind, ExcKind::TypeError);
}

#[test]
fn function_bodies_yield_their_last_expression() {
    let program = vec![
        func_decl("f", vec!["x"], vec![expr_stmt(add(ident("x"), int(1)))]),
        expr_stmt(call_name("f", vec![int(41)])),
    ];
    assert_eq!(as_int(&run_ok(program)), 42);
}

#[test]
fn closures_capture_their_environment() {
    // def make(n) { return (x) => x + n }
    let program = vec![
        func_decl(
            "make",
            vec!["n"],
            vec![ret(Some(lambda_expr(vec!["x"], add(ident("x"), ident("n")))))],
        ),
        let_("add5", call_name("make", vec![int(5)])),
        expr_stmt(call(ident("add5"), vec![int(10)])),
    ];
    assert_eq!(as_int(&run_ok(program)), 15);
}

#[test]
fn wrong_arity_raises_arity_error() {
    let program = vec![
        func_decl("f", vec!["x"], vec![expr_stmt(ident("x"))]),
        expr_stmt(call_name("f", vec![int(1), int(2)])),
    ];
    assert_eq!(run_err(program).kind, ExcKind::ArityError);
}

#[test]
fn variadic_parameters_collect_excess_arguments() {
    use rill::ast::{FuncLit, ParamSpec};
    // def count(first, rest...) = rest.length()
    let program = vec![
        stmt(Stmt::FuncDecl(FuncLit::new(
            Some("count".to_owned()),
            vec![ParamSpec::untyped("first"), ParamSpec::variadic("rest", None)],
            vec![expr_stmt(method(ident("rest"), "length", vec![]))],
        ))),
        expr_stmt(call_name("count", vec![int(1), int(2), int(3), int(4)])),
    ];
    assert_eq!(as_int(&run_ok(program)), 3);
}
