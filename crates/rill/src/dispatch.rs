//! Method dispatch and overload resolution.
//!
//! Candidates are filtered by arity (the last parameter may be variadic,
//! absorbing excess arguments), then ranked by argument-to-parameter type
//! compatibility: exact class match scores 3, subclass or interface match
//! 2, generic-parameter or untyped slot 1, incompatible disqualifies.
//! Ties break by declaration order, so resolution is deterministic.

use std::sync::Arc;

use ahash::AHashMap;

use crate::args::Args;
use crate::exceptions::{Exception, RunResult};
use crate::registry::Registry;
use crate::types::{AccessLevel, ClassDef, Modifiers, TypeDesc};
use crate::value::{FuncValue, Value};

/// The wrapper class backing a value, for dispatch and scoring purposes.
pub fn class_of(value: &Value, registry: &Registry) -> Option<Arc<ClassDef>> {
    match value {
        Value::Instance(i) => Some(i.class.clone()),
        Value::Nil | Value::Record(_) | Value::EnumValue(_) => None,
        other => registry.builtin_class(other.builtin_class_name()),
    }
}

/// Score for one argument against one declared parameter type.
///
/// `None` disqualifies the candidate.
fn arg_score(
    param_ty: Option<&TypeDesc>,
    arg: &Value,
    package: &str,
    registry: &Registry,
) -> Option<u32> {
    let Some(ty) = param_ty else {
        // Untyped slot accepts anything.
        return Some(1);
    };
    if ty.is_generic_param {
        return Some(1);
    }
    if arg.is_nil() {
        // nil flows into any declared slot.
        return Some(1);
    }

    if ty.is_enum || matches!(arg, Value::EnumValue(_)) {
        return match arg {
            Value::EnumValue(e) => (*e.enum_name == *ty.name).then_some(3),
            _ => None,
        };
    }
    if ty.is_record || matches!(arg, Value::Record(_)) {
        return match arg {
            Value::Record(r) => (r.def.name() == ty.name).then_some(3),
            _ => None,
        };
    }
    if ty.is_interface {
        let iface = registry.lookup_interface(package, &ty.name)?;
        let class = class_of(arg, registry)?;
        return class.implements_interface(&iface).then_some(2);
    }

    let class = class_of(arg, registry)?;
    let canonical = registry.canonical_class_name(package, &ty.name)?;
    if class.name() == canonical {
        return Some(3);
    }
    let target = registry.lookup_class(package, &canonical)?;
    if class.is_subclass_of(&target) {
        return Some(2);
    }
    // A class-typed parameter may also be satisfied through an interface
    // with the same name resolution failing above; nothing more to try.
    None
}

/// Total score of one candidate against the argument list, or `None` when
/// the candidate is incompatible.
fn candidate_score(
    func: &FuncValue,
    args: &Args,
    bindings: Option<&AHashMap<String, TypeDesc>>,
    package: &str,
    registry: &Registry,
) -> Option<u32> {
    let params = &func.params;
    let variadic = func.is_variadic();
    let fixed = if variadic { params.len() - 1 } else { params.len() };

    if variadic {
        if args.len() < fixed {
            return None;
        }
    } else if args.len() != params.len() {
        return None;
    }

    let substituted = |ty: Option<&TypeDesc>| -> Option<TypeDesc> {
        match (ty, bindings) {
            (Some(t), Some(b)) => Some(t.substitute(b)),
            (Some(t), None) => Some(t.clone()),
            (None, _) => None,
        }
    };

    let mut total = 0u32;
    for (i, param) in params.iter().take(fixed).enumerate() {
        let ty = substituted(param.ty.as_ref());
        total += arg_score(ty.as_ref(), args.get(i)?, package, registry)?;
    }
    if variadic {
        let var_param = params.last()?;
        let ty = substituted(var_param.ty.as_ref());
        for arg in &args.values()[fixed..] {
            total += arg_score(ty.as_ref(), arg, package, registry)?;
        }
    }
    Some(total)
}

/// Selects the best overload for the argument list; `None` when no
/// candidate is compatible. Ties break by declaration order (the first
/// registered candidate wins).
pub fn select_overload(
    candidates: &[Arc<FuncValue>],
    args: &Args,
    bindings: Option<&AHashMap<String, TypeDesc>>,
    package: &str,
    registry: &Registry,
) -> Option<Arc<FuncValue>> {
    let mut best: Option<(u32, &Arc<FuncValue>)> = None;
    for cand in candidates {
        let Some(score) = candidate_score(cand, args, bindings, package, registry) else {
            continue;
        };
        match &best {
            Some((best_score, _)) if *best_score >= score => {}
            _ => best = Some((score, cand)),
        }
    }
    best.map(|(_, cand)| cand.clone())
}

/// Splits the arguments of a variadic call: fixed bindings plus the
/// excess collected into an Array value.
pub fn collect_variadic(func: &FuncValue, args: Args) -> Vec<Value> {
    let mut vals: Vec<Value> = args.into_values().into_vec();
    if func.is_variadic() {
        let fixed = func.params.len() - 1;
        let rest: Vec<Value> = vals.split_off(fixed.min(vals.len()));
        vals.push(Value::array(rest));
    }
    vals
}

/// Enforces member access: private members require the calling `this` to
/// be of the declaring class itself, protected members a subclass.
pub fn check_member_access(
    modifiers: Modifiers,
    declaring: &Arc<ClassDef>,
    caller_class: Option<&Arc<ClassDef>>,
    member: &str,
) -> RunResult<()> {
    match modifiers.access {
        AccessLevel::Public => Ok(()),
        AccessLevel::Private => match caller_class {
            Some(cc) if Arc::ptr_eq(cc, declaring) => Ok(()),
            _ => Err(Exception::access_error(format!(
                "'{member}' is private to {}",
                declaring.name()
            ))),
        },
        AccessLevel::Protected => match caller_class {
            Some(cc) if cc.is_subclass_of(declaring) => Ok(()),
            _ => Err(Exception::access_error(format!(
                "'{member}' is protected in {}",
                declaring.name()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ParamSpec;
    use crate::registry::BUILTIN_PACKAGE;
    use crate::scope::Scope;
    use crate::types::ClassBuilder;

    fn test_registry() -> Registry {
        let registry = Registry::new();
        let core = Scope::new_root(BUILTIN_PACKAGE, "core.rl");
        for name in ["Int", "Float", "Bool", "String"] {
            ClassBuilder::new(name).builtin().build(&registry, &core).unwrap();
        }
        registry
    }

    fn overload(name: &str, params: Vec<ParamSpec>) -> Arc<FuncValue> {
        Arc::new(FuncValue::new_builtin(
            name,
            params,
            Arc::new(|_, _, _| Ok(Value::Nil)),
        ))
    }

    #[test]
    fn exact_type_beats_untyped() {
        let registry = test_registry();
        let typed = overload("f", vec![ParamSpec::typed("x", TypeDesc::builtin("Int"))]);
        let untyped = overload("f", vec![ParamSpec::untyped("x")]);
        let cands = vec![untyped.clone(), typed.clone()];

        let picked = select_overload(&cands, &Args::new([Value::Int(3)]), None, "main", &registry).unwrap();
        assert!(Arc::ptr_eq(&picked, &typed));

        // A String argument only fits the untyped slot.
        let picked =
            select_overload(&cands, &Args::new([Value::str("s")]), None, "main", &registry).unwrap();
        assert!(Arc::ptr_eq(&picked, &untyped));
    }

    #[test]
    fn arity_filters_candidates() {
        let registry = test_registry();
        let one = overload("f", vec![ParamSpec::untyped("x")]);
        let two = overload("f", vec![ParamSpec::untyped("x"), ParamSpec::untyped("y")]);
        let cands = vec![one, two.clone()];

        let picked = select_overload(
            &cands,
            &Args::new([Value::Int(1), Value::Int(2)]),
            None,
            "main",
            &registry,
        )
        .unwrap();
        assert!(Arc::ptr_eq(&picked, &two));

        assert!(select_overload(&cands, &Args::empty(), None, "main", &registry).is_none());
    }

    #[test]
    fn ties_break_by_declaration_order() {
        let registry = test_registry();
        let first = overload("f", vec![ParamSpec::untyped("x")]);
        let second = overload("f", vec![ParamSpec::untyped("x")]);
        let cands = vec![first.clone(), second];

        for _ in 0..16 {
            let picked =
                select_overload(&cands, &Args::new([Value::Int(1)]), None, "main", &registry).unwrap();
            assert!(Arc::ptr_eq(&picked, &first));
        }
    }

    #[test]
    fn variadic_absorbs_excess_arguments() {
        let registry = test_registry();
        let var = overload(
            "f",
            vec![ParamSpec::untyped("x"), ParamSpec::variadic("rest", None)],
        );
        let cands = vec![var.clone()];

        let args = Args::new([Value::Int(1), Value::Int(2), Value::Int(3)]);
        let picked = select_overload(&cands, &args, None, "main", &registry).unwrap();
        assert!(Arc::ptr_eq(&picked, &var));

        let bound = collect_variadic(&picked, args);
        assert_eq!(bound.len(), 2);
        match &bound[1] {
            Value::Array(items) => assert_eq!(items.read().len(), 2),
            other => panic!("expected Array, got {other:?}"),
        }
    }

    #[test]
    fn generic_substitution_tightens_matching() {
        let registry = test_registry();
        let generic = overload("f", vec![ParamSpec::typed("x", TypeDesc::generic("T"))]);
        let cands = vec![generic.clone()];

        // Unbound: the generic slot takes anything.
        assert!(select_overload(&cands, &Args::new([Value::str("s")]), None, "main", &registry).is_some());

        // Bound to Int: a String argument no longer fits.
        let mut bindings = AHashMap::new();
        bindings.insert("T".to_owned(), TypeDesc::builtin("Int"));
        assert!(
            select_overload(&cands, &Args::new([Value::str("s")]), Some(&bindings), "main", &registry)
                .is_none()
        );
        assert!(
            select_overload(&cands, &Args::new([Value::Int(1)]), Some(&bindings), "main", &registry)
                .is_some()
        );
    }

    #[test]
    fn nil_fits_any_declared_slot() {
        let registry = test_registry();
        let typed = overload("f", vec![ParamSpec::typed("x", TypeDesc::builtin("Int"))]);
        let cands = vec![typed];
        assert!(select_overload(&cands, &Args::new([Value::Nil]), None, "main", &registry).is_some());
    }
}
