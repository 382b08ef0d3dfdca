//! The builtin exception class hierarchy.
//!
//! Each kind registers as a class whose parent mirrors the kind tree, so
//! catch clauses and user subclasses (`class ParseError : ValueError`)
//! work through ordinary inheritance. Constructors double as factories
//! and as super-constructors: invoked with a receiver they initialize it,
//! invoked without one they allocate the instance themselves.

use std::sync::Arc;

use super::{bfn, p};
use crate::eval::Interp;
use crate::exceptions::{ExcKind, Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassBuilder, Modifiers};
use crate::value::{BuiltinFn, Instance, Value, display_value};

pub(super) fn install(interp: &Interp, scope: &Scope) -> RunResult<()> {
    let registry = interp.registry();
    for kind in ExcKind::all() {
        let name: &'static str = (*kind).into();
        let mut builder = ClassBuilder::new(name).builtin();
        if let Some(parent) = kind.parent() {
            let parent_name: &'static str = parent.into();
            let parent_def = registry
                .builtin_class(parent_name)
                .ok_or_else(|| Exception::runtime_error("exception parents install first"))?;
            builder = builder.set_parent(parent_def);
        } else {
            builder = add_throwable_members(builder);
        }
        builder = builder
            .add_builtin_constructor(vec![], ctor(name))
            .add_builtin_constructor(vec![p("message")], ctor(name));
        builder.build(registry, scope)?;
    }
    Ok(())
}

/// Fields and accessors declared once on Throwable, inherited everywhere.
fn add_throwable_members(mut builder: ClassBuilder) -> ClassBuilder {
    for field in ["message", "kind", "file", "line", "column", "hint", "cause", "stackTrace"] {
        builder = builder.add_field(field, None, Modifiers::default());
    }
    builder
        .add_builtin_method("getMessage", vec![], getter("message"))
        .add_builtin_method("getKind", vec![], getter("kind"))
        .add_builtin_method("getFile", vec![], getter("file"))
        .add_builtin_method("getLine", vec![], getter("line"))
        .add_builtin_method("getColumn", vec![], getter("column"))
        .add_builtin_method("getHint", vec![], getter("hint"))
        .add_builtin_method("getCause", vec![], getter("cause"))
        .add_builtin_method("getStackTrace", vec![], getter("stackTrace"))
        .add_builtin_method(
            "toString",
            vec![],
            bfn(|_interp, _scope, args| {
                let this = instance_of(args.expect_this("toString")?)?;
                let fields = this.fields.read();
                let kind = fields.get("kind").map(display_value).unwrap_or_default();
                let message = fields.get("message").map(display_value).unwrap_or_default();
                Ok(Value::str(format!("{kind}: {message}")))
            }),
        )
}

fn getter(field: &'static str) -> BuiltinFn {
    bfn(move |_interp, _scope, args| {
        let this = instance_of(args.expect_this(field)?)?;
        Ok(this.fields.read().get(field).cloned().unwrap_or(Value::Nil))
    })
}

fn instance_of(v: &Value) -> RunResult<&Arc<Instance>> {
    match v {
        Value::Instance(inst) => Ok(inst),
        other => Err(Exception::type_error(format!(
            "expected an exception instance, got {}",
            other.type_name()
        ))),
    }
}

/// Constructor body shared by every exception kind.
fn ctor(kind_name: &'static str) -> BuiltinFn {
    bfn(move |interp, scope, args| {
        let this = args.this().cloned();
        let message = match args.get_zero_one("init")? {
            Some(Value::Str(s)) => Value::Str(s),
            Some(other) => Value::str(display_value(&other)),
            None => Value::str(""),
        };
        match this {
            // Super-constructor path: initialize the receiver in place.
            Some(Value::Instance(inst)) => {
                let mut fields = inst.fields.write();
                fields.insert("message".to_owned(), message);
                fields.insert("kind".to_owned(), Value::str(inst.class.name().to_owned()));
                drop(fields);
                Ok(Value::Instance(inst))
            }
            _ => {
                let class = interp
                    .registry()
                    .builtin_class(kind_name)
                    .ok_or_else(|| Exception::runtime_error("exception classes install at startup"))?;
                let mut fields = class.field_defaults();
                fields.insert("message".to_owned(), message);
                fields.insert("kind".to_owned(), Value::str(kind_name));
                let pos = scope.pos();
                if pos.line > 0 {
                    fields.insert("file".to_owned(), Value::Str(pos.file));
                    fields.insert("line".to_owned(), Value::Int(i64::from(pos.line)));
                    fields.insert("column".to_owned(), Value::Int(i64::from(pos.col)));
                }
                Ok(Value::Instance(Arc::new(Instance {
                    class,
                    fields: parking_lot::RwLock::new(fields),
                    type_args: None,
                })))
            }
        }
    })
}
