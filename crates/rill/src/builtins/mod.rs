//! The builtin class library and global functions.
//!
//! Everything here is constructed through the class and interface
//! builders against the interpreter's global scope, in a fixed order:
//! capability interfaces first, then the wrapper classes, the
//! collections, the exception hierarchy, the concurrency classes, and
//! finally the global functions. External modules (Math, IO, ...) use
//! the same builder contract on the same scope.

mod array;
mod bytes;
mod concurrent;
mod deque;
mod list;
mod map;
mod numbers;
mod pair;
mod range;
mod set;
mod string;
mod throwables;

use std::sync::Arc;

use crate::args::Args;
use crate::ast::{DeclKind, ParamSpec};
use crate::concurrent::Promise;
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{InterfaceBuilder, InterfaceDef, TypeDesc};
use crate::value::{BuiltinFn, RangeValue, Value, display_value};

/// Wraps a closure as a builtin function body.
pub(crate) fn bfn<F>(f: F) -> BuiltinFn
where
    F: Fn(&Interp, &Scope, Args) -> RunResult<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An untyped parameter.
pub(crate) fn p(name: &str) -> ParamSpec {
    ParamSpec::untyped(name)
}

/// A parameter typed with a builtin class.
pub(crate) fn pt(name: &str, ty: &str) -> ParamSpec {
    ParamSpec::typed(name, TypeDesc::builtin(ty))
}

/// A variadic tail parameter.
pub(crate) fn rest(name: &str) -> ParamSpec {
    ParamSpec::variadic(name, None)
}

/// The capability interfaces the collection classes claim.
pub(crate) struct Capabilities {
    pub iterable: Arc<InterfaceDef>,
    pub indexable: Arc<InterfaceDef>,
    pub sliceable: Arc<InterfaceDef>,
    pub unstructured: Arc<InterfaceDef>,
}

/// Installs every builtin into the interpreter's registry and global
/// scope. Called once from `Interp::new`.
pub(crate) fn install(interp: &Interp) -> RunResult<()> {
    let scope = interp.globals().clone();
    let caps = install_capabilities(interp, &scope)?;

    numbers::install(interp, &scope)?;
    string::install(interp, &scope, &caps)?;
    bytes::install(interp, &scope, &caps)?;
    array::install(interp, &scope, &caps)?;
    list::install(interp, &scope, &caps)?;
    set::install(interp, &scope, &caps)?;
    map::install(interp, &scope, &caps)?;
    deque::install(interp, &scope, &caps)?;
    range::install(interp, &scope, &caps)?;
    pair::install(interp, &scope, &caps)?;
    throwables::install(interp, &scope)?;
    concurrent::install(interp, &scope)?;
    install_globals(interp, &scope)?;
    log::debug!("builtin installation complete");
    Ok(())
}

fn install_capabilities(interp: &Interp, scope: &Scope) -> RunResult<Capabilities> {
    let registry = interp.registry();
    let iterable = InterfaceBuilder::new("Iterable")
        .add_abstract_method("__length", vec![])
        .add_abstract_method("__get", vec![p("index")])
        .build(registry, scope)?;
    let indexable = InterfaceBuilder::new("Indexable")
        .add_abstract_method("__get", vec![p("key")])
        .add_abstract_method("__set", vec![p("key"), p("value")])
        .add_abstract_method("__contains", vec![p("key")])
        .build(registry, scope)?;
    let sliceable = InterfaceBuilder::new("Sliceable")
        .add_abstract_method("__slice", vec![p("start"), p("end")])
        .build(registry, scope)?;
    let unstructured = InterfaceBuilder::new("Unstructured")
        .add_abstract_method("__pieces", vec![])
        .add_abstract_method("__get_piece", vec![p("index")])
        .build(registry, scope)?;
    // Comparable is claimed by user classes, never by the builtins; it
    // only needs to exist in the registry.
    InterfaceBuilder::new("Comparable")
        .add_abstract_method("__compare", vec![p("other")])
        .build(registry, scope)?;
    Ok(Capabilities {
        iterable,
        indexable,
        sliceable,
        unstructured,
    })
}

fn install_globals(interp: &Interp, scope: &Scope) -> RunResult<()> {
    let define = |name: &str, params: Vec<ParamSpec>, f: BuiltinFn| -> RunResult<()> {
        scope.define(name, Value::builtin_fn(name, params, f), DeclKind::Let)
    };

    define(
        "println",
        vec![rest("values")],
        bfn(|interp, _scope, args| print_values(interp, &args, true)),
    )?;
    define(
        "print",
        vec![rest("values")],
        bfn(|interp, _scope, args| print_values(interp, &args, false)),
    )?;

    define(
        "async",
        vec![p("task")],
        bfn(|interp, _scope, args| {
            let func = args.get_one("async")?.as_func()?;
            let promise = Arc::new(Promise::new());
            let settled = promise.clone();
            let interp = interp.clone();
            std::thread::Builder::new()
                .name("rill-async".to_owned())
                .spawn(move || match interp.invoke(&func, Args::empty()) {
                    Ok(v) => settled.fulfill(v),
                    Err(e) => settled.reject(e),
                })
                .map_err(|e| Exception::runtime_error(format!("failed to spawn task: {e}")))?;
            Ok(Value::Promise(promise))
        }),
    )?;

    define(
        "len",
        vec![p("value")],
        bfn(|interp, scope, args| {
            let v = args.get_one("len")?;
            match interp.length_of(scope, &v, &scope.pos())? {
                Some(n) => Ok(Value::Int(n as i64)),
                None => Err(Exception::type_error(format!(
                    "{} has no length",
                    v.type_name()
                ))),
            }
        }),
    )?;

    define(
        "typeof",
        vec![p("value")],
        bfn(|_interp, _scope, args| Ok(Value::str(args.get_one("typeof")?.type_name()))),
    )?;

    define(
        "assert",
        vec![p("condition"), rest("message")],
        bfn(|_interp, _scope, args| {
            if args.is_empty() {
                return Err(Exception::arity_error("assert", 1, 0));
            }
            let ok = args.get(0).expect("non-empty").as_bool()?;
            if ok {
                return Ok(Value::Nil);
            }
            let message = match args.get(1) {
                Some(m) => display_value(m),
                None => "assertion failed".to_owned(),
            };
            Err(Exception::state_error(message))
        }),
    )?;

    define(
        "sleep",
        vec![pt("millis", "Int")],
        bfn(|_interp, _scope, args| {
            let ms = args.get_one("sleep")?.as_int()?;
            if ms < 0 {
                return Err(Exception::value_error("sleep duration cannot be negative"));
            }
            std::thread::sleep(std::time::Duration::from_millis(ms as u64));
            Ok(Value::Nil)
        }),
    )?;

    define(
        "range",
        vec![pt("start", "Int"), pt("end", "Int"), rest("step")],
        bfn(|_interp, _scope, args| {
            let (start, end, step) = match args.len() {
                2 => (args.get(0), args.get(1), None),
                3 => (args.get(0), args.get(1), args.get(2)),
                n => return Err(Exception::arity_error("range", 2, n)),
            };
            let start = start.expect("checked").as_int()?;
            let end = end.expect("checked").as_int()?;
            let step = match step {
                Some(s) => s.as_int()?,
                None => 1,
            };
            Ok(Value::Range(RangeValue::new(start, end, step)?))
        }),
    )?;

    define(
        "channel",
        vec![rest("capacity")],
        bfn(|_interp, _scope, args| {
            let channel = match args.get_zero_one("channel")? {
                Some(cap) => {
                    let cap = cap.as_int()?;
                    if cap < 0 {
                        return Err(Exception::value_error("channel capacity cannot be negative"));
                    }
                    crate::concurrent::Channel::bounded(cap as usize)
                }
                None => crate::concurrent::Channel::unbounded(),
            };
            Ok(Value::Channel(Arc::new(channel)))
        }),
    )?;

    Ok(())
}

fn print_values(interp: &Interp, args: &Args, newline: bool) -> RunResult<Value> {
    for (i, v) in args.values().iter().enumerate() {
        if i > 0 {
            interp.push_stdout(' ')?;
        }
        interp.write_stdout(&display_value(v))?;
    }
    if newline {
        interp.push_stdout('\n')?;
    }
    Ok(Value::Nil)
}
