//! The List builtin class.
//!
//! Shares the element-vector representation with Array; the surface is
//! the growable-collection API.

use super::array::elements;
use super::{Capabilities, bfn, p, pt, rest};
use crate::args::Args;
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassBuilder, t_bound};
use crate::value::{Value, value_eq};

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("List")
        .builtin()
        .add_type_parameters(vec![t_bound()])
        .add_interface(caps.iterable.clone())
        .add_interface(caps.indexable.clone())
        .add_interface(caps.sliceable.clone())
        .add_interface(caps.unstructured.clone())
        .add_builtin_constructor(
            vec![rest("elements")],
            bfn(|_i, _s, args| Ok(Value::list(args.into_values().into_vec()))),
        )
        .add_builtin_method(
            "add",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "add")?;
                items.write().push(args.get_one("add")?);
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "insert",
            vec![pt("index", "Int"), p("value")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "insert")?;
                let (index, value) = args.get_two("insert")?;
                let index = index.as_int()?;
                let mut items = items.write();
                if index < 0 || index as usize > items.len() {
                    return Err(Exception::index_error(format!(
                        "insert index {index} out of range for length {}",
                        items.len()
                    )));
                }
                items.insert(index as usize, value);
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "removeAt",
            vec![pt("index", "Int")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "removeAt")?;
                let index = args.get_one("removeAt")?.as_int()?;
                let mut items = items.write();
                if index < 0 || index as usize >= items.len() {
                    return Err(Exception::index_error(format!(
                        "index {index} out of range for length {}",
                        items.len()
                    )));
                }
                Ok(items.remove(index as usize))
            }),
        )
        .add_builtin_method(
            "remove",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let items = elements(&args, "remove")?;
                let needle = args.get_one("remove")?;
                let mut items = items.write();
                match items.iter().position(|v| value_eq(v, &needle)) {
                    Some(i) => {
                        items.remove(i);
                        Ok(Value::Bool(true))
                    }
                    None => Ok(Value::Bool(false)),
                }
            }),
        )
        .add_builtin_method(
            "get",
            vec![pt("index", "Int")],
            bfn(|interp, scope, args| {
                let this = args.this().cloned().ok_or_else(|| {
                    Exception::runtime_error("get() called without a receiver")
                })?;
                let index = args.get_one("get")?;
                interp.index_get(scope, &this, index, &scope.pos())
            }),
        )
        .add_builtin_method(
            "set",
            vec![pt("index", "Int"), p("value")],
            bfn(|interp, scope, args| {
                let this = args.this().cloned().ok_or_else(|| {
                    Exception::runtime_error("set() called without a receiver")
                })?;
                let (index, value) = args.get_two("set")?;
                interp.index_set(scope, &this, index, value, &scope.pos())?;
                Ok(Value::Nil)
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
            "clear",
            vec![],
            bfn(|_i, _s, args| {
                elements(&args, "clear")?.write().clear();
                Ok(Value::Nil)
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
                Ok(Value::list(out))
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
                Ok(Value::list(out))
            }),
        )
        .add_builtin_method(
            "toArray",
            vec![],
            bfn(|_i, _s, args| Ok(Value::array(elements(&args, "toArray")?.read().clone()))),
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
