//! The Deque builtin class: double-ended FIFO storage.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Capabilities, bfn, p, pt, rest};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassBuilder, t_bound};
use crate::value::Value;

fn storage(args: &crate::args::Args, method: &str) -> RunResult<crate::value::Shared<VecDeque<Value>>> {
    match args.expect_this(method)? {
        Value::Deque(items) => Ok(items.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires a Deque receiver, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("Deque")
        .builtin()
        .add_type_parameters(vec![t_bound()])
        .add_interface(caps.iterable.clone())
        .add_builtin_constructor(
            vec![rest("elements")],
            bfn(|_i, _s, args| {
                let items: VecDeque<Value> = args.into_values().into_iter().collect();
                Ok(Value::Deque(Arc::new(RwLock::new(items))))
            }),
        )
        .add_builtin_method(
            "pushFront",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let items = storage(&args, "pushFront")?;
                items.write().push_front(args.get_one("pushFront")?);
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "pushBack",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let items = storage(&args, "pushBack")?;
                items.write().push_back(args.get_one("pushBack")?);
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "popFront",
            vec![],
            bfn(|_i, _s, args| {
                storage(&args, "popFront")?
                    .write()
                    .pop_front()
                    .ok_or_else(|| Exception::state_error("popFront from empty Deque"))
            }),
        )
        .add_builtin_method(
            "popBack",
            vec![],
            bfn(|_i, _s, args| {
                storage(&args, "popBack")?
                    .write()
                    .pop_back()
                    .ok_or_else(|| Exception::state_error("popBack from empty Deque"))
            }),
        )
        .add_builtin_method(
            "peekFront",
            vec![],
            bfn(|_i, _s, args| {
                Ok(storage(&args, "peekFront")?.read().front().cloned().unwrap_or(Value::Nil))
            }),
        )
        .add_builtin_method(
            "peekBack",
            vec![],
            bfn(|_i, _s, args| {
                Ok(storage(&args, "peekBack")?.read().back().cloned().unwrap_or(Value::Nil))
            }),
        )
        .add_builtin_method(
            "length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(storage(&args, "length")?.read().len() as i64))),
        )
        .add_builtin_method(
            "isEmpty",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(storage(&args, "isEmpty")?.read().is_empty()))),
        )
        .add_builtin_method(
            "__length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(storage(&args, "__length")?.read().len() as i64))),
        )
        .add_builtin_method(
            "__get",
            vec![pt("index", "Int")],
            bfn(|interp, scope, args| {
                let this = args.this().cloned().ok_or_else(|| {
                    Exception::runtime_error("__get() called without a receiver")
                })?;
                let index = args.get_one("__get")?;
                interp.index_get(scope, &this, index, &scope.pos())
            }),
        )
        .build(interp.registry(), scope)?;
    Ok(())
}
