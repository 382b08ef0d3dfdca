//! The Set builtin class: insertion-ordered unique elements.

use std::sync::Arc;

use parking_lot::RwLock;

use super::{Capabilities, bfn, p, rest};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassBuilder, t_bound};
use crate::value::{MapKey, SetStorage, Value};

fn storage(args: &crate::args::Args, method: &str) -> RunResult<crate::value::Shared<SetStorage>> {
    match args.expect_this(method)? {
        Value::Set(entries) => Ok(entries.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires a Set receiver, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("Set")
        .builtin()
        .add_type_parameters(vec![t_bound()])
        .add_interface(caps.iterable.clone())
        .add_builtin_constructor(
            vec![rest("elements")],
            bfn(|_i, _s, args| {
                let mut entries = SetStorage::new();
                for v in args.into_values() {
                    entries.insert(MapKey::from_value(&v)?, v);
                }
                Ok(Value::Set(Arc::new(RwLock::new(entries))))
            }),
        )
        .add_builtin_method(
            "add",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "add")?;
                let v = args.get_one("add")?;
                let key = MapKey::from_value(&v)?;
                Ok(Value::Bool(entries.write().insert(key, v).is_none()))
            }),
        )
        .add_builtin_method(
            "remove",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "remove")?;
                let key = MapKey::from_value(&args.get_one("remove")?)?;
                Ok(Value::Bool(entries.write().shift_remove(&key).is_some()))
            }),
        )
        .add_builtin_method(
            "contains",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "contains")?;
                let key = MapKey::from_value(&args.get_one("contains")?)?;
                Ok(Value::Bool(entries.read().contains_key(&key)))
            }),
        )
        .add_builtin_method(
            "size",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(storage(&args, "size")?.read().len() as i64))),
        )
        .add_builtin_method(
            "isEmpty",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(storage(&args, "isEmpty")?.read().is_empty()))),
        )
        .add_builtin_method(
            "clear",
            vec![],
            bfn(|_i, _s, args| {
                storage(&args, "clear")?.write().clear();
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "union",
            vec![p("other")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "union")?;
                let other = match args.get_one("union")? {
                    Value::Set(o) => o,
                    other => {
                        return Err(Exception::type_error(format!(
                            "union() requires a Set, got {}",
                            other.type_name()
                        )));
                    }
                };
                let mut out = entries.read().clone();
                for (k, v) in other.read().iter() {
                    out.entry(k.clone()).or_insert_with(|| v.clone());
                }
                Ok(Value::Set(Arc::new(RwLock::new(out))))
            }),
        )
        .add_builtin_method(
            "intersect",
            vec![p("other")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "intersect")?;
                let other = match args.get_one("intersect")? {
                    Value::Set(o) => o,
                    other => {
                        return Err(Exception::type_error(format!(
                            "intersect() requires a Set, got {}",
                            other.type_name()
                        )));
                    }
                };
                let other = other.read();
                let out: SetStorage = entries
                    .read()
                    .iter()
                    .filter(|(k, _)| other.contains_key(*k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Ok(Value::Set(Arc::new(RwLock::new(out))))
            }),
        )
        .add_builtin_method(
            "toArray",
            vec![],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "toArray")?;
                Ok(Value::array(entries.read().values().cloned().collect()))
            }),
        )
        .add_builtin_method(
            "__length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(storage(&args, "__length")?.read().len() as i64))),
        )
        .add_builtin_method(
            "__get",
            vec![p("index")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "__get")?;
                let index = args.get_one("__get")?.as_int()?;
                entries
                    .read()
                    .get_index(index.max(0) as usize)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| Exception::index_error(format!("index {index} out of range")))
            }),
        )
        .add_builtin_method(
            "__contains",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "__contains")?;
                let key = MapKey::from_value(&args.get_one("__contains")?)?;
                Ok(Value::Bool(entries.read().contains_key(&key)))
            }),
        )
        .build(interp.registry(), scope)?;
    Ok(())
}
