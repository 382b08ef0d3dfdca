//! The Bytes builtin class.

use std::sync::Arc;

use super::{Capabilities, bfn, p, pt};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::ClassBuilder;
use crate::value::Value;

fn bytes_of(args: &crate::args::Args, method: &str) -> RunResult<Arc<Vec<u8>>> {
    match args.expect_this(method)? {
        Value::Bytes(b) => Ok(b.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires a Bytes receiver, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("Bytes")
        .builtin()
        .add_interface(caps.iterable.clone())
        .add_interface(caps.sliceable.clone())
        .add_builtin_constructor(
            vec![p("source")],
            bfn(|_i, _s, args| match args.get_one("Bytes")? {
                v @ Value::Bytes(_) => Ok(v),
                Value::Str(s) => Ok(Value::Bytes(Arc::new(s.as_bytes().to_vec()))),
                Value::Array(items) => {
                    let items = items.read();
                    let mut out = Vec::with_capacity(items.len());
                    for v in items.iter() {
                        let byte = v.as_int()?;
                        if !(0..=255).contains(&byte) {
                            return Err(Exception::value_error(format!(
                                "byte value {byte} out of range"
                            )));
                        }
                        out.push(byte as u8);
                    }
                    Ok(Value::Bytes(Arc::new(out)))
                }
                other => Err(Exception::conversion_error(format!(
                    "cannot convert {} to Bytes",
                    other.type_name()
                ))),
            }),
        )
        .add_builtin_method(
            "length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(bytes_of(&args, "length")?.len() as i64))),
        )
        .add_builtin_method(
            "isEmpty",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(bytes_of(&args, "isEmpty")?.is_empty()))),
        )
        .add_builtin_method(
            "decode",
            vec![],
            bfn(|_i, _s, args| {
                let bytes = bytes_of(&args, "decode")?;
                String::from_utf8(bytes.as_ref().clone())
                    .map(Value::str)
                    .map_err(|_| Exception::conversion_error("Bytes are not valid UTF-8"))
            }),
        )
        .add_builtin_method(
            "toArray",
            vec![],
            bfn(|_i, _s, args| {
                let bytes = bytes_of(&args, "toArray")?;
                Ok(Value::array(bytes.iter().map(|b| Value::Int(i64::from(*b))).collect()))
            }),
        )
        .add_builtin_method(
            "__length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(bytes_of(&args, "__length")?.len() as i64))),
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
        .build(interp.registry(), scope)?;
    Ok(())
}
