//! The Array builtin class.

use super::{Capabilities, bfn, p, pt, rest};
use crate::args::Args;
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassBuilder, t_bound};
use crate::value::{Value, value_eq};

/// The receiver's element vector, shared between Array and List methods.
pub(super) fn elements(args: &Args, method: &str) -> RunResult<crate::value::Shared<Vec<Value>>> {
    match args.expect_this(method)? {
        Value::Array(items) | Value::List(items) => Ok(items.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires an Array or List receiver, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("Array")
        .builtin()
        .add_alias("array")
        .add_type_parameters(vec![t_bound()])
        .add_interface(caps.iterable.clone())
        .add_interface(caps.indexable.clone())
        .add_interface(caps.sliceable.clone())
        .add_interface(caps.unstructured.clone())
        .add_builtin_constructor(
            vec![rest("elements")],
            bfn(|_i, _s, args| Ok(Value::array(args.into_values().into_vec()))),
        )
        .add_builtin_method(
            "push",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "push")?;
                let value = args.get_one("push")?;
                items.write().push(value);
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "pop",
            vec![],
            bfn(|_i, _s, args| {
                let items = elements(&args, "pop")?;
                items
                    .write()
                    .pop()
                    .ok_or_else(|| Exception::state_error("pop from empty Array"))
            }),
        )
        .add_builtin_method(
            "length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(elements(&args, "length")?.read().len() as i64))),
        )
        .add_builtin_method(
            "isEmpty",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(elements(&args, "isEmpty")?.read().is_empty()))),
        )
        .add_builtin_method(
            "contains",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "contains")?;
                let needle = args.get_one("contains")?;
                let found = items.read().iter().any(|v| value_eq(v, &needle));
                Ok(Value::Bool(found))
            }),
        )
        .add_builtin_method(
            "indexOf",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "indexOf")?;
                let needle = args.get_one("indexOf")?;
                let idx = items.read().iter().position(|v| value_eq(v, &needle));
                Ok(Value::Int(idx.map_or(-1, |i| i as i64)))
            }),
        )
        .add_builtin_method(
            "first",
            vec![],
            bfn(|_i, _s, args| {
                Ok(elements(&args, "first")?.read().first().cloned().unwrap_or(Value::Nil))
            }),
        )
        .add_builtin_method(
            "last",
            vec![],
            bfn(|_i, _s, args| {
                Ok(elements(&args, "last")?.read().last().cloned().unwrap_or(Value::Nil))
            }),
        )
        .add_builtin_method(
            "reverse",
            vec![],
            bfn(|_i, _s, args| {
                let items = elements(&args, "reverse")?;
                let mut out: Vec<Value> = items.read().clone();
                out.reverse();
                Ok(Value::array(out))
            }),
        )
        .add_builtin_method(
            "join",
            vec![pt("separator", "String")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "join")?;
                let sep = args.get_one("join")?.as_str()?;
                let parts: Vec<String> = items
                    .read()
                    .iter()
                    .map(crate::value::display_value)
                    .collect();
                Ok(Value::str(parts.join(&sep)))
            }),
        )
        .add_builtin_method(
            "map",
            vec![p("transform")],
            bfn(|interp, _s, args| {
                let items = elements(&args, "map")?;
                let func = args.get_one("map")?.as_func()?;
                let snapshot: Vec<Value> = items.read().clone();
                let mut out = Vec::with_capacity(snapshot.len());
                for v in snapshot {
                    out.push(interp.invoke(&func, Args::new([v]))?);
                }
                Ok(Value::array(out))
            }),
        )
        .add_builtin_method(
            "filter",
            vec![p("predicate")],
            bfn(|interp, _s, args| {
                let items = elements(&args, "filter")?;
                let func = args.get_one("filter")?.as_func()?;
                let snapshot: Vec<Value> = items.read().clone();
                let mut out = Vec::new();
                for v in snapshot {
                    if interp.invoke(&func, Args::new([v.clone()]))?.as_bool()? {
                        out.push(v);
                    }
                }
                Ok(Value::array(out))
            }),
        )
        .add_builtin_method(
            "toList",
            vec![],
            bfn(|_i, _s, args| Ok(Value::list(elements(&args, "toList")?.read().clone()))),
        )
        .add_builtin_method("__length", vec![], bfn(|_i, _s, args| {
            Ok(Value::Int(elements(&args, "__length")?.read().len() as i64))
        }))
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
        .add_builtin_method(
            "__set",
            vec![pt("index", "Int"), p("value")],
            bfn(|interp, scope, args| {
                let this = args.this().cloned().ok_or_else(|| {
                    Exception::runtime_error("__set() called without a receiver")
                })?;
                let (index, value) = args.get_two("__set")?;
                interp.index_set(scope, &this, index, value, &scope.pos())?;
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "__slice",
            vec![pt("start", "Int"), pt("end", "Int")],
            bfn(|interp, scope, args| {
                let this = args.this().cloned().ok_or_else(|| {
                    Exception::runtime_error("__slice() called without a receiver")
                })?;
                let (start, end) = args.get_two("__slice")?;
                interp.slice_get(scope, &this, start, end, &scope.pos())
            }),
        )
        .add_builtin_method(
            "__contains",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "__contains")?;
                let needle = args.get_one("__contains")?;
                let found = items.read().iter().any(|v| value_eq(v, &needle));
                Ok(Value::Bool(found))
            }),
        )
        .add_builtin_method("__pieces", vec![], bfn(|_i, _s, args| {
            Ok(Value::Int(elements(&args, "__pieces")?.read().len() as i64))
        }))
        .add_builtin_method(
            "__get_piece",
            vec![pt("index", "Int")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "__get_piece")?;
                let idx = args.get_one("__get_piece")?.as_int()?;
                let items = items.read();
                items
                    .get(idx as usize)
                    .cloned()
                    .ok_or_else(|| Exception::index_error(format!("piece {idx} out of range")))
            }),
        )
        .build(interp.registry(), scope)?;
    Ok(())
}
