//! Promises, completable futures, channels, select and go.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use rill::ast::{BinOp, Stmt};
use rill::{ExcKind, Value};

#[test]
fn promise_chain_transforms_values() {
    // async(() => 10).then(v => v * 2).then(v => v + 1).await() == 21
    let chain = method(
        method(
            method(
                call_name("async", vec![lambda_expr(vec![], int(10))]),
                "then",
                vec![lambda_expr(
                    vec!["v"],
                    binop(BinOp::Mul, ident("v"), int(2)),
                )],
            ),
            "then",
            vec![lambda_expr(vec!["v"], add(ident("v"), int(1)))],
        ),
        "await",
        vec![],
    );
    let program = vec![expr_stmt(chain)];
    assert_eq!(as_int(&run_ok(program)), 21);
}

#[test]
fn promise_rejection_routes_through_catch() {
    // async(() => throw RuntimeError("e")).catch(e => "handled").await()
    let chain = method(
        method(
            call_name(
                "async",
                vec![lambda(vec![], vec![throw_new("RuntimeError", "e")])],
            ),
            "catch",
            vec![lambda_expr(vec!["e"], str_("handled"))],
        ),
        "await",
        vec![],
    );
    let program = vec![expr_stmt(chain)];
    assert_eq!(as_str(&run_ok(program)), "handled");
}

#[test]
fn rejection_without_catch_raises_from_await() {
    let chain = method(
        call_name(
            "async",
            vec![lambda(vec![], vec![throw_new("ValueError", "bad")])],
        ),
        "await",
        vec![],
    );
    let program = vec![expr_stmt(chain)];
    let err = run_err(program);
    assert_eq!(err.kind, ExcKind::ValueError);
    assert_eq!(err.message, "bad");
}

#[test]
fn promise_terminal_states_are_sticky() {
    let program = vec![
        let_("p", call_name("Promise", vec![])),
        expr_stmt(method(ident("p"), "resolve", vec![int(1)])),
        expr_stmt(method(ident("p"), "resolve", vec![int(2)])),
        expr_stmt(method(ident("p"), "reject", vec![call_name("RuntimeError", vec![str_("late")])])),
        expr_stmt(array_lit(vec![
            method(ident("p"), "await", vec![]),
            method(ident("p"), "state", vec![]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert_eq!(as_int(&items[0]), 1);
            assert_eq!(as_str(&items[1]), "fulfilled");
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn promise_finally_preserves_the_outcome() {
    let chain = method(
        method(
            call_name("async", vec![lambda_expr(vec![], int(5))]),
            "finally",
            vec![lambda_expr(vec![], str_("ignored"))],
        ),
        "await",
        vec![],
    );
    let program = vec![expr_stmt(chain)];
    assert_eq!(as_int(&run_ok(program)), 5);
}

#[test]
fn channel_select_receives_from_spawned_task() {
    // ch = Channel(1); go { ch.send(7) }
    // select { case v = ch.recv(): v }
    let program = vec![
        let_("ch", call_name("Channel", vec![int(1)])),
        stmt(Stmt::Go(method(ident("ch"), "send", vec![int(7)]))),
        stmt(Stmt::Select {
            cases: vec![select_case(ident("ch"), Some("v"), vec![expr_stmt(ident("v"))])],
            closed: None,
        }),
    ];
    assert_eq!(as_int(&run_ok(program)), 7);
}

#[test]
fn select_routes_closed_channels_to_the_closed_case() {
    let program = vec![
        let_("ch", call_name("Channel", vec![int(1)])),
        expr_stmt(method(ident("ch"), "close", vec![])),
        stmt(Stmt::Select {
            cases: vec![select_case(ident("ch"), Some("v"), vec![expr_stmt(str_("value"))])],
            closed: Some(vec![expr_stmt(str_("closed"))]),
        }),
    ];
    assert_eq!(as_str(&run_ok(program)), "closed");
}

#[test]
fn select_drains_buffered_values_before_reporting_closed() {
    let program = vec![
        let_("ch", call_name("Channel", vec![int(1)])),
        expr_stmt(method(ident("ch"), "send", vec![int(9)])),
        expr_stmt(method(ident("ch"), "close", vec![])),
        // First select still sees the buffered value.
        stmt(Stmt::Select {
            cases: vec![select_case(ident("ch"), Some("v"), vec![expr_stmt(ident("v"))])],
            closed: Some(vec![expr_stmt(str_("closed"))]),
        }),
    ];
    assert_eq!(as_int(&run_ok(program)), 9);
}

#[test]
fn break_in_a_select_body_exits_the_enclosing_loop() {
    let program = vec![
        let_("ch", call_name("Channel", vec![int(2)])),
        expr_stmt(method(ident("ch"), "send", vec![int(1)])),
        expr_stmt(method(ident("ch"), "send", vec![int(2)])),
        var_("seen", int(0)),
        stmt(Stmt::Loop {
            body: vec![stmt(Stmt::Select {
                cases: vec![select_case(
                    ident("ch"),
                    Some("v"),
                    vec![
                        assign("seen", add(ident("seen"), ident("v"))),
                        stmt(Stmt::If {
                            cond: binop(BinOp::Ge, ident("seen"), int(3)),
                            then_block: vec![stmt(Stmt::Break)],
                            else_block: None,
                        }),
                    ],
                )],
                closed: None,
            })],
        }),
        expr_stmt(ident("seen")),
    ];
    assert_eq!(as_int(&run_ok(program)), 3);
}

#[test]
fn channel_recv_reports_closure_after_draining() {
    let program = vec![
        let_("ch", call_name("Channel", vec![int(2)])),
        expr_stmt(method(ident("ch"), "send", vec![int(1)])),
        expr_stmt(method(ident("ch"), "close", vec![])),
        expr_stmt(array_lit(vec![
            method(method(ident("ch"), "recv", vec![]), "second", vec![]),
            method(method(ident("ch"), "recv", vec![]), "second", vec![]),
            method(ident("ch"), "isClosed", vec![]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert!(as_bool(&items[0]), "first recv delivers the queued value");
            assert!(!as_bool(&items[1]), "second recv observes closure");
            assert!(as_bool(&items[2]));
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn send_on_closed_channel_is_a_state_error() {
    let program = vec![
        let_("ch", call_name("Channel", vec![int(1)])),
        expr_stmt(method(ident("ch"), "close", vec![])),
        expr_stmt(method(ident("ch"), "send", vec![int(1)])),
    ];
    assert_eq!(run_err(program).kind, ExcKind::StateError);
}

#[test]
fn go_runs_functions_against_shared_channels() {
    // def worker(ch, n) { ch.send(n * 2) }
    // go worker(ch, 21); select -> 42
    let program = vec![
        func_decl(
            "worker",
            vec!["ch", "n"],
            vec![expr_stmt(method(
                ident("ch"),
                "send",
                vec![binop(BinOp::Mul, ident("n"), int(2))],
            ))],
        ),
        let_("ch", call_name("Channel", vec![int(1)])),
        stmt(Stmt::Go(call_name("worker", vec![ident("ch"), int(21)]))),
        stmt(Stmt::Select {
            cases: vec![select_case(ident("ch"), Some("v"), vec![expr_stmt(ident("v"))])],
            closed: None,
        }),
    ];
    assert_eq!(as_int(&run_ok(program)), 42);
}

#[test]
fn completable_future_end_to_end() {
    // A spawned task completes the future after a short sleep.
    let program = vec![
        let_("f", call_name("CompletableFuture", vec![])),
        stmt(Stmt::Go(lambda(
            vec![],
            vec![
                expr_stmt(call_name("sleep", vec![int(10)])),
                expr_stmt(method(ident("f"), "complete", vec![int(5)])),
            ],
        ))),
        expr_stmt(method(ident("f"), "get", vec![])),
    ];
    assert_eq!(as_int(&run_ok(program)), 5);
}

#[test]
fn completable_future_completion_is_one_shot() {
    let program = vec![
        let_("f", call_name("CompletableFuture", vec![])),
        expr_stmt(array_lit(vec![
            method(ident("f"), "complete", vec![int(1)]),
            method(ident("f"), "complete", vec![int(2)]),
            method(ident("f"), "cancel", vec![]),
            method(ident("f"), "get", vec![]),
            method(ident("f"), "isDone", vec![]),
        ])),
    ];
    match run_ok(program) {
        Value::Array(items) => {
            let items = items.read();
            assert!(as_bool(&items[0]));
            assert!(!as_bool(&items[1]));
            assert!(!as_bool(&items[2]));
            assert_eq!(as_int(&items[3]), 1);
            assert!(as_bool(&items[4]));
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn get_timeout_raises_runtime_error_when_pending() {
    let program = vec![
        let_("f", call_name("CompletableFuture", vec![])),
        expr_stmt(method(ident("f"), "getTimeout", vec![int(20)])),
    ];
    let err = run_err(program);
    assert_eq!(err.kind, ExcKind::RuntimeError);
    assert!(err.message.contains("did not complete"));
}

#[test]
fn cancelled_future_raises_state_error_from_get() {
    let program = vec![
        let_("f", call_name("CompletableFuture", vec![])),
        expr_stmt(method(ident("f"), "cancel", vec![])),
        expr_stmt(method(ident("f"), "get", vec![])),
    ];
    assert_eq!(run_err(program).kind, ExcKind::StateError);
}

#[test]
fn completing_exceptionally_raises_from_get() {
    let program = vec![
        let_("f", call_name("CompletableFuture", vec![])),
        expr_stmt(method(
            ident("f"),
            "completeExceptionally",
            vec![call_name("ValueError", vec![str_("nope")])],
        )),
        expr_stmt(method(ident("f"), "get", vec![])),
    ];
    let err = run_err(program);
    assert_eq!(err.kind, ExcKind::ValueError);
    assert_eq!(err.message, "nope");
}

#[test]
fn channel_expressions_build_channels() {
    use rill::ast::Expr;
    // let ch = chan(1); ch.send(3); select -> 3
    let chan_expr = e(Expr::Channel {
        capacity: Some(Box::new(int(1))),
    });
    let program = vec![
        let_("ch", chan_expr),
        expr_stmt(method(ident("ch"), "send", vec![int(3)])),
        stmt(Stmt::Select {
            cases: vec![select_case(ident("ch"), Some("v"), vec![expr_stmt(ident("v"))])],
            closed: None,
        }),
    ];
    assert_eq!(as_int(&run_ok(program)), 3);
}
