//! Wrapper classes for the numeric and boolean primitives.
//!
//! Arithmetic never reaches these methods (the evaluator unboxes
//! immediates first); they provide the conversion and utility surface.

use super::{bfn, p, pt};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::ClassBuilder;
use crate::value::{Value, display_value};

pub(super) fn install(interp: &Interp, scope: &Scope) -> RunResult<()> {
    let registry = interp.registry();

    ClassBuilder::new("Int")
        .builtin()
        .add_alias("Integer")
        .add_static_field("MAX", Value::Int(i64::MAX))
        .add_static_field("MIN", Value::Int(i64::MIN))
        .add_builtin_constructor(
            vec![p("value")],
            bfn(|_i, _s, args| match args.get_one("Int")? {
                v @ Value::Int(_) => Ok(v),
                Value::Float(f) => Ok(Value::Int(f as i64)),
                Value::Bool(b) => Ok(Value::Int(i64::from(b))),
                Value::Str(s) => parse_int(&s),
                other => Err(Exception::conversion_error(format!(
                    "cannot convert {} to Int",
                    other.type_name()
                ))),
            }),
        )
        .add_builtin_method(
            "abs",
            vec![],
            bfn(|_i, _s, args| {
                let v = args.expect_this("abs")?.as_int()?;
                v.checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| Exception::runtime_error("integer overflow"))
            }),
        )
        .add_builtin_method(
            "toFloat",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Float(args.expect_this("toFloat")?.as_int()? as f64))),
        )
        .add_builtin_method(
            "toString",
            vec![],
            bfn(|_i, _s, args| Ok(Value::str(args.expect_this("toString")?.as_int()?.to_string()))),
        )
        .add_static_method(
            "parse",
            vec![pt("text", "String")],
            bfn(|_i, _s, args| parse_int(&args.get_one("parse")?.as_str()?)),
        )
        .build(registry, scope)?;

    ClassBuilder::new("Float")
        .builtin()
        .add_static_field("NAN", Value::Float(f64::NAN))
        .add_static_field("INFINITY", Value::Float(f64::INFINITY))
        .add_builtin_constructor(
            vec![p("value")],
            bfn(|_i, _s, args| match args.get_one("Float")? {
                v @ Value::Float(_) => Ok(v),
                Value::Int(i) => Ok(Value::Float(i as f64)),
                Value::Str(s) => parse_float(&s),
                other => Err(Exception::conversion_error(format!(
                    "cannot convert {} to Float",
                    other.type_name()
                ))),
            }),
        )
        .add_builtin_method(
            "abs",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Float(args.expect_this("abs")?.as_float()?.abs()))),
        )
        .add_builtin_method(
            "floor",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Float(args.expect_this("floor")?.as_float()?.floor()))),
        )
        .add_builtin_method(
            "ceil",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Float(args.expect_this("ceil")?.as_float()?.ceil()))),
        )
        .add_builtin_method(
            "round",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Float(args.expect_this("round")?.as_float()?.round()))),
        )
        .add_builtin_method(
            "toInt",
            vec![],
            bfn(|_i, _s, args| {
                let f = args.expect_this("toInt")?.as_float()?;
                if f.is_finite() {
                    Ok(Value::Int(f as i64))
                } else {
                    Err(Exception::conversion_error("cannot convert non-finite Float to Int"))
                }
            }),
        )
        .add_builtin_method(
            "isNan",
            vec![],
            bfn(|_i, _s, args| Ok(Value::Bool(args.expect_this("isNan")?.as_float()?.is_nan()))),
        )
        .add_builtin_method(
            "toString",
            vec![],
            bfn(|_i, _s, args| Ok(Value::str(display_value(args.expect_this("toString")?)))),
        )
        .add_static_method(
            "parse",
            vec![pt("text", "String")],
            bfn(|_i, _s, args| parse_float(&args.get_one("parse")?.as_str()?)),
        )
        .build(registry, scope)?;

    ClassBuilder::new("Bool")
        .builtin()
        .add_builtin_constructor(
            vec![p("value")],
            bfn(|_i, _s, args| match args.get_one("Bool")? {
                v @ Value::Bool(_) => Ok(v),
                Value::Str(s) => match &*s {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    other => Err(Exception::conversion_error(format!(
                        "cannot convert '{other}' to Bool"
                    ))),
                },
                other => Err(Exception::conversion_error(format!(
                    "cannot convert {} to Bool",
                    other.type_name()
                ))),
            }),
        )
        .add_builtin_method(
            "toString",
            vec![],
            bfn(|_i, _s, args| Ok(Value::str(args.expect_this("toString")?.as_bool()?.to_string()))),
        )
        .build(registry, scope)?;

    Ok(())
}

fn parse_int(text: &str) -> RunResult<Value> {
    text.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| Exception::value_error(format!("invalid integer literal: '{text}'")))
}

fn parse_float(text: &str) -> RunResult<Value> {
    text.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| Exception::value_error(format!("invalid float literal: '{text}'")))
}
