//! The Range builtin class: lazy integer sequences.

use super::{Capabilities, bfn, pt};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::ClassBuilder;
use crate::value::{RangeValue, Value};

fn range_of(args: &crate::args::Args, method: &str) -> RunResult<RangeValue> {
    match args.expect_this(method)? {
        Value::Range(r) => Ok(*r),
        other => Err(Exception::type_error(format!(
            "{method}() requires a Range receiver, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("Range")
        .builtin()
        .add_interface(caps.iterable.clone())
        .add_builtin_constructor(
            vec![pt("start", "Int"), pt("end", "Int")],
            bfn(|_i, _s, args| {
                let (start, end) = args.get_two("Range")?;
                Ok(Value::Range(RangeValue::new(start.as_int()?, end.as_int()?, 1)?))
            }),
        )
        .add_builtin_constructor(
            vec![pt("start", "Int"), pt("end", "Int"), pt("step", "Int")],
            bfn(|_i, _s, args| {
                let values = args.into_values();
                let [start, end, step] = values.as_slice() else {
                    return Err(Exception::arity_error("Range", 3, values.len()));
                };
                Ok(Value::Range(RangeValue::new(
                    start.as_int()?,
                    end.as_int()?,
                    step.as_int()?,
                )?))
            }),
        )
        .add_builtin_method(
            "start",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(range_of(&args, "start")?.start))),
        )
        .add_builtin_method(
            "end",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(range_of(&args, "end")?.end))),
        )
        .add_builtin_method(
            "step",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(range_of(&args, "step")?.step))),
        )
        .add_builtin_method(
            "length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(range_of(&args, "length")?.len() as i64))),
        )
        .add_builtin_method(
            "contains",
            vec![pt("value", "Int")],
            bfn(|_i, _s, args| {
                let r = range_of(&args, "contains")?;
                Ok(Value::Bool(r.contains(args.get_one("contains")?.as_int()?)))
            }),
        )
        .add_builtin_method(
            "toArray",
            vec![],
            bfn(|_i, _s, args| {
                let r = range_of(&args, "toArray")?;
                let items = (0..r.len())
                    .map(|i| Value::Int(r.get(i).expect("index in range")))
                    .collect();
                Ok(Value::array(items))
            }),
        )
        .add_builtin_method(
            "__length",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Int(range_of(&args, "__length")?.len() as i64))),
        )
        .add_builtin_method(
            "__get",
            vec![pt("index", "Int")],
            bfn(|_i, _s, args| {
                let r = range_of(&args, "__get")?;
                let index = args.get_one("__get")?.as_int()?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| r.get(i))
                    .map(Value::Int)
                    .ok_or_else(|| Exception::index_error(format!("index {index} out of range")))
            }),
        )
        .add_builtin_method(
            "__contains",
            vec![pt("value", "Int")],
            bfn(|_i, _s, args| {
                let r = range_of(&args, "__contains")?;
                Ok(Value::Bool(r.contains(args.get_one("__contains")?.as_int()?)))
            }),
        )
        .build(interp.registry(), scope)?;
    Ok(())
}
