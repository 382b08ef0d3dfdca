//! The Pair builtin class: an immutable two-element aggregate, the
//! uniform element type for Map iteration and destructuring.

use super::{Capabilities, bfn, p, pt};
use crate::eval::Interp;
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassBuilder, k_bound, v_bound};
use crate::value::{Value, repr_value};

fn pair_of(args: &crate::args::Args, method: &str) -> RunResult<std::sync::Arc<(Value, Value)>> {
    match args.expect_this(method)? {
        Value::Pair(p) => Ok(p.clone()),
        other => Err(Exception::type_error(format!(
            "{method}() requires a Pair receiver, got {}",
            other.type_name()
        ))),
    }
}

pub(super) fn install(interp: &Interp, scope: &Scope, caps: &Capabilities) -> RunResult<()> {
    ClassBuilder::new("Pair")
        .builtin()
        .add_type_parameters(vec![k_bound(), v_bound()])
        .add_interface(caps.unstructured.clone())
        .add_builtin_constructor(
            vec![p("first"), p("second")],
            bfn(|_i, _s, args| {
                let (first, second) = args.get_two("Pair")?;
                Ok(Value::pair(first, second))
            }),
        )
        .add_builtin_method(
            "first",
            vec![],
            bfn(|_i, _s, args| Ok(pair_of(&args, "first")?.0.clone())),
        )
        .add_builtin_method(
            "second",
            vec![],
            bfn(|_i, _s, args| Ok(pair_of(&args, "second")?.1.clone())),
        )
        .add_builtin_method(
            "swap",
            vec![],
            bfn(|_i, _s, args| {
                let p = pair_of(&args, "swap")?;
                Ok(Value::pair(p.1.clone(), p.0.clone()))
            }),
        )
        .add_builtin_method(
            "toString",
            vec![],
            bfn(|_i, _s, args| Ok(Value::str(repr_value(args.expect_this("toString")?)))),
        )
        .add_builtin_method(
            "__pieces",
            vec![],
            bfn(|_i, _s, args| {
                args.expect_this("__pieces")?;
                Ok(Value::Int(2))
            }),
        )
        .add_builtin_method(
            "__get_piece",
            vec![pt("index", "Int")],
            bfn(|_i, _s, args| {
                let p = pair_of(&args, "__get_piece")?;
                match args.get_one("__get_piece")?.as_int()? {
                    0 => Ok(p.0.clone()),
                    1 => Ok(p.1.clone()),
                    i => Err(Exception::index_error(format!("pair piece {i} out of range"))),
                }
            }),
        )
        .build(interp.registry(), scope)?;
    Ok(())
}
