//! The String wrapper class.
//!
//! Indexing and slicing are character-based, matching the evaluator's
//! native paths; the capability methods mirror them so `__get`/`__slice`
//! also work when called explicitly.

use super::{Capabilities, bfn, p, pt};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::ClassBuilder;
use crate::value::{Value, display_value, value_eq};

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("String")
        .builtin()
        .add_interface(caps.iterable.clone())
        .add_interface(caps.sliceable.clone())
        .add_builtin_constructor(
            vec![p("value")],
            bfn(|_i, _s, args| Ok(Value::str(display_value(&args.get_one("String")?)))),
        )
        .add_builtin_method(
            "length",
            vec![],
            bfn(|_i, _s, args| {
                Ok(Value::Int(args.expect_this("length")?.as_str()?.chars().count() as i64))
            }),
        )
        .add_builtin_method(
            "isEmpty",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(args.expect_this("isEmpty")?.as_str()?.is_empty()))),
        )
        .add_builtin_method(
            "contains",
            vec![pt("needle", "String")],
            bfn(|_i, _s, args| {
                let this = args.expect_this("contains")?.as_str()?;
                let needle = args.get_one("contains")?.as_str()?;
                Ok(Value::Bool(this.contains(&*needle)))
            }),
        )
        .add_builtin_method(
            "startsWith",
            vec![pt("prefix", "String")],
            bfn(|_i, _s, args| {
                let this = args.expect_this("startsWith")?.as_str()?;
                let prefix = args.get_one("startsWith")?.as_str()?;
                Ok(Value::Bool(this.starts_with(&*prefix)))
            }),
        )
        .add_builtin_method(
            "endsWith",
            vec![pt("suffix", "String")],
            bfn(|_i, _s, args| {
                let this = args.expect_this("endsWith")?.as_str()?;
                let suffix = args.get_one("endsWith")?.as_str()?;
                Ok(Value::Bool(this.ends_with(&*suffix)))
            }),
        )
        .add_builtin_method(
            "indexOf",
            vec![pt("needle", "String")],
            bfn(|_i, _s, args| {
                let this = args.expect_this("indexOf")?.as_str()?;
                let needle = args.get_one("indexOf")?.as_str()?;
                // Report a character index, consistent with __get.
                match this.find(&*needle) {
                    Some(byte_idx) => Ok(Value::Int(this[..byte_idx].chars().count() as i64)),
                    None => Ok(Value::Int(-1)),
                }
            }),
        )
        .add_builtin_method(
            "substring",
            vec![pt("start", "Int"), pt("end", "Int")],
            bfn(|interp, scope, args| {
                let this = args.this().cloned().ok_or_else(|| {
                    Exception::runtime_error("substring() called without a receiver")
                })?;
                let (start, end) = args.get_two("substring")?;
                interp.slice_get(scope, &this, start, end, &scope.pos())
            }),
        )
        .add_builtin_method(
            "toUpperCase",
            vec![],
            bfn(|_i, _s, args| {
                Ok(Value::str(args.expect_this("toUpperCase")?.as_str()?.to_uppercase()))
            }),
        )
        .add_builtin_method(
            "toLowerCase",
            vec![],
            bfn(|_i, _s, args| {
                Ok(Value::str(args.expect_this("toLowerCase")?.as_str()?.to_lowercase()))
            }),
        )
        .add_builtin_method(
            "trim",
            vec![],
            bfn(|_i, _s, args| Ok(Value::str(args.expect_this("trim")?.as_str()?.trim().to_owned()))),
        )
        .add_builtin_method(
            "split",
            vec![pt("separator", "String")],
            bfn(|_i, _s, args| {
                let this = args.expect_this("split")?.as_str()?;
                let sep = args.get_one("split")?.as_str()?;
                let parts = this
                    .split(&*sep)
                    .map(|part| Value::str(part.to_owned()))
                    .collect();
                Ok(Value::array(parts))
            }),
        )
        .add_builtin_method(
            "replace",
            vec![pt("from", "String"), pt("to", "String")],
            bfn(|_i, _s, args| {
                let this = args.expect_this("replace")?.as_str()?;
                let (from, to) = args.get_two("replace")?;
                Ok(Value::str(this.replace(&*from.as_str()?, &to.as_str()?)))
            }),
        )
        .add_builtin_method(
            "toBytes",
            vec![],
            bfn(|_i, _s, args| {
                let this = args.expect_this("toBytes")?.as_str()?;
                Ok(Value::Bytes(std::sync::Arc::new(this.as_bytes().to_vec())))
            }),
        )
        .add_builtin_method(
            "toString",
            vec![],
            bfn(|_i, _s, args| Ok(args.expect_this("toString")?.clone())),
        )
        .add_builtin_method(
            "__length",
            vec![],
            bfn(|_i, _s, args| {
                Ok(Value::Int(args.expect_this("__length")?.as_str()?.chars().count() as i64))
            }),
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
                let this = args.expect_this("__contains")?.clone();
                let needle = args.get_one("__contains")?;
                match (&this, &needle) {
                    (Value::Str(s), Value::Str(n)) => Ok(Value::Bool(s.contains(&**n))),
                    _ => Ok(Value::Bool(value_eq(&this, &needle))),
                }
            }),
        )
        .build(interp.registry(), scope)?;
    Ok(())
}
