//! Builtin classes for the concurrency primitives: Channel, Promise and
//! CompletableFuture.
//!
//! The values themselves live in `crate::concurrent`; these classes give
//! them their method surface.

use std::sync::Arc;

use super::{bfn, p, pt};
use crate::concurrent::{Channel, CompletableFuture, Promise};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::ClassBuilder;
use crate::value::Value;

fn channel_of(args: &crate::args::Args, method: &str) -> RunResult<Arc<Channel>> {
    match args.expect_this(method)? {
        Value::Channel(c) => Ok(c.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires a Channel receiver, got {}",
            other.type_name()
        ))),
    }
}

fn promise_of(args: &crate::args::Args, method: &str) -> RunResult<Arc<Promise>> {
    match args.expect_this(method)? {
        Value::Promise(p) => Ok(p.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires a Promise receiver, got {}",
            other.type_name()
        ))),
    }
}

fn future_of(args: &crate::args::Args, method: &str) -> RunResult<Arc<CompletableFuture>> {
    match args.expect_this(method)? {
        Value::Future(f) => Ok(f.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires a CompletableFuture receiver, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn install(interp: &Interp, scope: &Scope) -> RunResult<()> {
    let registry = interp.registry();

    ClassBuilder::new("Channel")
        .builtin()
        .add_builtin_constructor(
            vec![],
            bfn(|_i, _s, _args| Ok(Value::Channel(Arc::new(Channel::unbounded())))),
        )
        .add_builtin_constructor(
            vec![pt("capacity", "Int")],
            bfn(|_i, _s, args| {
                let cap = args.get_one("Channel")?.as_int()?;
                if cap < 0 {
                    return Err(Exception::value_error("channel capacity cannot be negative"));
                }
                Ok(Value::Channel(Arc::new(Channel::bounded(cap as usize))))
            }),
        )
        .add_builtin_method(
            "send",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let ch = channel_of(&args, "send")?;
                ch.send(args.get_one("send")?)?;
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "recv",
            vec![],
            bfn(|_i, _s, args| {
                let ch = channel_of(&args, "recv")?;
                let (value, ok) = ch.recv();
                Ok(Value::pair(value, Value::Bool(ok)))
            }),
        )
        .add_builtin_method(
            "close",
            vec![],
            bfn(|_i, _s, args| {
                channel_of(&args, "close")?.close();
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "isClosed",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(channel_of(&args, "isClosed")?.is_closed()))),
        )
        .build(registry, scope)?;

    ClassBuilder::new("Promise")
        .builtin()
        .add_builtin_constructor(
            vec![],
            bfn(|_i, _s, _args| Ok(Value::Promise(Arc::new(Promise::new())))),
        )
        .add_builtin_method(
            "then",
            vec![p("handler")],
            bfn(|interp, _s, args| {
                let promise = promise_of(&args, "then")?;
                let func = args.get_one("then")?.as_func()?;
                Ok(Value::Promise(promise.then(interp, func)))
            }),
        )
        .add_builtin_method(
            "catch",
            vec![p("handler")],
            bfn(|interp, _s, args| {
                let promise = promise_of(&args, "catch")?;
                let func = args.get_one("catch")?.as_func()?;
                Ok(Value::Promise(promise.catch(interp, func)))
            }),
        )
        .add_builtin_method(
            "finally",
            vec![p("handler")],
            bfn(|interp, _s, args| {
                let promise = promise_of(&args, "finally")?;
                let func = args.get_one("finally")?.as_func()?;
                Ok(Value::Promise(promise.finally(interp, func)))
            }),
        )
        .add_builtin_method(
            "await",
            vec![],
            bfn(|_i, _s, args| promise_of(&args, "await")?.await_value()),
        )
        .add_builtin_method(
            "state",
            vec![],
            bfn(|_i, _s, args| Ok(Value::str(promise_of(&args, "state")?.state_name()))),
        )
        .add_builtin_method(
            "resolve",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let promise = promise_of(&args, "resolve")?;
                promise.fulfill(args.get_one("resolve")?);
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "reject",
            vec![p("error")],
            bfn(|interp, scope, args| {
                let promise = promise_of(&args, "reject")?;
                let err = args.get_one("reject")?;
                promise.reject(interp.exception_from_value(err, &scope.pos()));
                Ok(Value::Nil)
            }),
        )
        .build(registry, scope)?;

    ClassBuilder::new("CompletableFuture")
        .builtin()
        .add_builtin_constructor(
            vec![],
            bfn(|_i, _s, _args| Ok(Value::Future(Arc::new(CompletableFuture::new())))),
        )
        .add_builtin_method(
            "complete",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let fut = future_of(&args, "complete")?;
                Ok(Value::Bool(fut.complete(args.get_one("complete")?)))
            }),
        )
        .add_builtin_method(
            "completeExceptionally",
            vec![p("error")],
            bfn(|interp, scope, args| {
                let fut = future_of(&args, "completeExceptionally")?;
                let err = args.get_one("completeExceptionally")?;
                Ok(Value::Bool(
                    fut.complete_exceptionally(interp.exception_from_value(err, &scope.pos())),
                ))
            }),
        )
        .add_builtin_method(
            "get",
            vec![],
            bfn(|_i, _s, args| future_of(&args, "get")?.get()),
        )
        .add_builtin_method(
            "getTimeout",
            vec![pt("millis", "Int")],
            bfn(|_i, _s, args| {
                let fut = future_of(&args, "getTimeout")?;
                let ms = args.get_one("getTimeout")?.as_int()?;
                if ms < 0 {
                    return Err(Exception::value_error("timeout cannot be negative"));
                }
                fut.get_timeout(ms as u64)
            }),
        )
        .add_builtin_method(
            "cancel",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(future_of(&args, "cancel")?.cancel()))),
        )
        .add_builtin_method(
            "isDone",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(future_of(&args, "isDone")?.is_done()))),
        )
        .add_builtin_method(
            "isCancelled",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(future_of(&args, "isCancelled")?.is_cancelled()))),
        )
        .build(registry, scope)?;

    Ok(())
}
