//! The Map builtin class: insertion-ordered key/value storage.
//!
//! Iteration (`__get` by index) yields entries as Pairs in insertion
//! order; key lookup goes through `get`/`put` or index syntax.

use std::sync::Arc;

use parking_lot::RwLock;

use super::{Capabilities, bfn, p, pt};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassBuilder, k_bound, v_bound};
use crate::value::{MapKey, MapStorage, Value, value_eq};

fn storage(args: &crate::args::Args, method: &str) -> RunResult<crate::value::Shared<MapStorage>> {
    match args.expect_this(method)? {
        Value::Map(entries) => Ok(entries.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires a Map receiver, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("Map")
        .builtin()
        .add_type_parameters(vec![k_bound(), v_bound()])
        .add_interface(caps.iterable.clone())
        .add_interface(caps.indexable.clone())
        .add_builtin_constructor(
            vec![],
            bfn(|_i, _s, _args| Ok(Value::Map(Arc::new(RwLock::new(MapStorage::new()))))),
        )
        .add_builtin_method(
            "put",
            vec![p("key"), p("value")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "put")?;
                let (key, value) = args.get_two("put")?;
                let map_key = MapKey::from_value(&key)?;
                let old = entries.write().insert(map_key, (key, value));
                Ok(old.map_or(Value::Nil, |(_, v)| v))
            }),
        )
        .add_builtin_method(
            "get",
            vec![p("key")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "get")?;
                let key = MapKey::from_value(&args.get_one("get")?)?;
                Ok(entries.read().get(&key).map_or(Value::Nil, |(_, v)| v.clone()))
            }),
        )
        .add_builtin_method(
            "getOrDefault",
            vec![p("key"), p("default")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "getOrDefault")?;
                let (key, default) = args.get_two("getOrDefault")?;
                let key = MapKey::from_value(&key)?;
                Ok(entries.read().get(&key).map_or(default, |(_, v)| v.clone()))
            }),
        )
        .add_builtin_method(
            "remove",
            vec![p("key")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "remove")?;
                let key = MapKey::from_value(&args.get_one("remove")?)?;
                // shift_remove keeps the insertion order of the rest.
                Ok(entries
                    .write()
                    .shift_remove(&key)
                    .map_or(Value::Nil, |(_, v)| v))
            }),
        )
        .add_builtin_method(
            "containsKey",
            vec![p("key")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "containsKey")?;
                let key = MapKey::from_value(&args.get_one("containsKey")?)?;
                Ok(Value::Bool(entries.read().contains_key(&key)))
            }),
        )
        .add_builtin_method(
            "containsValue",
            vec![p("value")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "containsValue")?;
                let needle = args.get_one("containsValue")?;
                let found = entries.read().values().any(|(_, v)| value_eq(v, &needle));
                Ok(Value::Bool(found))
            }),
        )
        .add_builtin_method(
            "keys",
            vec![],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "keys")?;
                let keys = entries.read().values().map(|(k, _)| k.clone()).collect();
                Ok(Value::array(keys))
            }),
        )
        .add_builtin_method(
            "values",
            vec![],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "values")?;
                let values = entries.read().values().map(|(_, v)| v.clone()).collect();
                Ok(Value::array(values))
            }),
        )
        .add_builtin_method(
            "entries",
            vec![],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "entries")?;
                let pairs = entries
                    .read()
                    .values()
                    .map(|(k, v)| Value::pair(k.clone(), v.clone()))
                    .collect();
                Ok(Value::array(pairs))
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
            "__length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(storage(&args, "__length")?.read().len() as i64))),
        )
        .add_builtin_method(
            "__get",
            vec![pt("index", "Int")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "__get")?;
                let index = args.get_one("__get")?.as_int()?;
                entries
                    .read()
                    .get_index(index.max(0) as usize)
                    .map(|(_, (k, v))| Value::pair(k.clone(), v.clone()))
                    .ok_or_else(|| {
                        Exception::index_error(format!("index {index} out of range"))
                    })
            }),
        )
        .add_builtin_method(
            "__set",
            vec![p("key"), p("value")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "__set")?;
                let (key, value) = args.get_two("__set")?;
                let map_key = MapKey::from_value(&key)?;
                entries.write().insert(map_key, (key, value));
                Ok(Value::Nil)
            }),
        )
        .add_builtin_method(
            "__contains",
            vec![p("key")],
            bfn(|_i, _s, args| {
                let entries = storage(&args, "__contains")?;
                let key = MapKey::from_value(&args.get_one("__contains")?)?;
                Ok(Value::Bool(entries.read().contains_key(&key)))
            }),
        )
        .build(interp.registry(), scope)?;
    Ok(())
}
