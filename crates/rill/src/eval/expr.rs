//! Expression evaluation and member access.

use std::sync::Arc;

use crate::args::Args;
use crate::ast::{AssignTarget, Expr, ExprNode, Literal, Pos};
use crate::dispatch;
use crate::eval::{Flow, Interp};
use crate::exceptions::{Exception, RunResult};
use crate::hints;
use crate::scope::Scope;
use crate::value::{FuncValue, MapKey, MapStorage, RangeValue, Value};

impl Interp {
    /// Evaluates one expression, stamping its position on any escaping
    /// error.
    pub(crate) fn eval_expr(&self, scope: &Scope, node: &ExprNode) -> RunResult<Value> {
        self.eval_expr_inner(scope, node)
            .map_err(|e| e.at(node.pos.clone()))
    }

    fn eval_expr_inner(&self, scope: &Scope, node: &ExprNode) -> RunResult<Value> {
        match &node.expr {
            Expr::Literal(lit) => Ok(eval_literal(lit)),
            Expr::Ident(name) => self.eval_ident(scope, name),
            Expr::Binary { op, lhs, rhs } => self.eval_binary(scope, *op, lhs, rhs),
            Expr::Unary { op, operand } => self.eval_unary(scope, *op, operand),
            Expr::Call { callee, args } => {
                let callee_value = self.eval_expr(scope, callee)?;
                let args = self.eval_args(scope, args)?;
                self.call_value(callee_value, args, scope, &node.pos)
            }
            Expr::MethodCall { object, method, args } => {
                let recv = self.eval_expr(scope, object)?;
                let args = self.eval_args(scope, args)?;
                self.call_method(&recv, method, args, scope, &node.pos)
            }
            Expr::FieldAccess { object, field } => {
                let recv = self.eval_expr(scope, object)?;
                self.get_member(scope, &recv, field)
            }
            Expr::Index { object, index } => {
                let recv = self.eval_expr(scope, object)?;
                let key = self.eval_expr(scope, index)?;
                self.index_get(scope, &recv, key, &node.pos)
            }
            Expr::Slice { object, start, end } => {
                let recv = self.eval_expr(scope, object)?;
                let start = self.eval_expr(scope, start)?;
                let end = self.eval_expr(scope, end)?;
                self.slice_get(scope, &recv, start, end, &node.pos)
            }
            Expr::ArrayLit(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expr(scope, item))
                    .collect::<RunResult<Vec<_>>>()?;
                Ok(Value::array(values))
            }
            Expr::MapLit(pairs) => {
                let mut storage = MapStorage::new();
                for (key_expr, value_expr) in pairs {
                    let key = self.eval_expr(scope, key_expr)?;
                    let value = self.eval_expr(scope, value_expr)?;
                    storage.insert(MapKey::from_value(&key)?, (key, value));
                }
                Ok(Value::Map(Arc::new(parking_lot::RwLock::new(storage))))
            }
            Expr::RangeLit { start, end, step } => {
                let start = self.eval_expr(scope, start)?.as_int()?;
                let end = self.eval_expr(scope, end)?.as_int()?;
                let step = match step {
                    Some(expr) => self.eval_expr(scope, expr)?.as_int()?,
                    None => 1,
                };
                Ok(Value::Range(RangeValue::new(start, end, step)?))
            }
            Expr::Lambda(lit) => {
                let name = lit.name.clone().unwrap_or_else(|| "<lambda>".to_owned());
                let mut func =
                    FuncValue::new_ast(name, lit.params.clone(), lit.body.clone(), Some(scope.clone()));
                func.return_type = lit.return_type.clone();
                Ok(Value::Func(Arc::new(func)))
            }
            Expr::This => scope
                .get("this")
                .ok_or_else(|| Exception::runtime_error("'this' used outside an instance method")),
            Expr::Super { args } => self.eval_super(scope, args, &node.pos),
            Expr::New { class, type_args, args } => {
                let class_value = self.eval_expr(scope, class)?;
                let args = self.eval_args(scope, args)?;
                let targs = if type_args.is_empty() {
                    None
                } else {
                    Some(type_args.clone())
                };
                match class_value {
                    Value::Constructor(def) | Value::Class(def) => {
                        self.create_instance(&def, targs, args, scope, &node.pos)
                    }
                    other => Err(Exception::type_error(format!(
                        "'new' requires a class, got {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Channel { capacity } => {
                let channel = match capacity {
                    Some(expr) => {
                        let cap = self.eval_expr(scope, expr)?.as_int()?;
                        if cap < 0 {
                            return Err(Exception::value_error("channel capacity cannot be negative"));
                        }
                        crate::concurrent::Channel::bounded(cap as usize)
                    }
                    None => crate::concurrent::Channel::unbounded(),
                };
                Ok(Value::Channel(Arc::new(channel)))
            }
        }
    }

    fn eval_args(&self, scope: &Scope, args: &[ExprNode]) -> RunResult<Args> {
        args.iter()
            .map(|a| self.eval_expr(scope, a))
            .collect::<RunResult<Args>>()
    }

    /// Identifier resolution: the scope chain, then the registries of the
    /// current package, then the builtin registries.
    fn eval_ident(&self, scope: &Scope, name: &str) -> RunResult<Value> {
        if let Some(v) = scope.get(name) {
            return Ok(v);
        }
        let package = scope.package();
        if let Some(class) = self.registry().lookup_class(package, name) {
            return Ok(if class.is_abstract() {
                Value::Class(class)
            } else {
                Value::Constructor(class)
            });
        }
        if let Some(iface) = self.registry().lookup_interface(package, name) {
            return Ok(Value::Interface(iface));
        }
        if let Some(def) = self.registry().lookup_enum(package, name) {
            return Ok(Value::Enum(def));
        }
        if let Some(def) = self.registry().lookup_record(package, name) {
            return Ok(Value::RecordDef(def));
        }
        let mut err = Exception::name_error(name);
        if let Some(hint) = hints::name_error_hint(name, scope) {
            err = err.with_hint(hint);
        }
        Err(err)
    }

    /// Explicit super-constructor invocation; valid only inside a
    /// constructor or method body of a class with a parent.
    fn eval_super(&self, scope: &Scope, args: &[ExprNode], pos: &Pos) -> RunResult<Value> {
        let Some(Value::Class(class)) = scope.get("__class__") else {
            return Err(Exception::runtime_error("'super' used outside a class body"));
        };
        let Some(parent) = class.parent() else {
            return Err(Exception::runtime_error(format!(
                "{} has no parent class",
                class.name()
            )));
        };
        let this = scope
            .get("this")
            .ok_or_else(|| Exception::runtime_error("'super' used without an instance"))?;
        let args = self.eval_args(scope, args)?;
        let ctors = parent.constructors();
        if ctors.is_empty() {
            return if args.is_empty() {
                Ok(Value::Nil)
            } else {
                Err(super::no_overload(&format!("{}()", parent.name()), &args))
            };
        }
        let package = scope.package().to_owned();
        let ctor = dispatch::select_overload(&ctors, &args, None, &package, self.registry())
            .ok_or_else(|| super::no_overload(&format!("{}()", parent.name()), &args))?;
        self.invoke_at(&ctor, args.with_this(this), pos)?;
        Ok(Value::Nil)
    }

    // ---- member access ---------------------------------------------------

    /// Reads a member off a receiver: field, bound method, static member,
    /// enum variant, or the `_value` sentinel of a primitive.
    pub(crate) fn get_member(&self, scope: &Scope, recv: &Value, name: &str) -> RunResult<Value> {
        match recv {
            Value::Nil => Err(Exception::attribute_error(format!("nil has no member '{name}'"))),
            Value::Instance(inst) => {
                if let Some((declaring, field)) = inst.class.find_field(name) {
                    dispatch::check_member_access(
                        field.modifiers,
                        &declaring,
                        self.caller_class(scope).as_ref(),
                        name,
                    )?;
                    if let Some(v) = inst.fields.read().get(name) {
                        return Ok(v.clone());
                    }
                }
                // Constructor-introduced fields have no declaration entry.
                if let Some(v) = inst.fields.read().get(name) {
                    return Ok(v.clone());
                }
                if let Some(method) = inst.class.find_methods(name).first() {
                    if let Some(declaring) = &method.declaring_class {
                        dispatch::check_member_access(
                            method.modifiers,
                            declaring,
                            self.caller_class(scope).as_ref(),
                            name,
                        )?;
                    }
                    return Ok(Value::Func(Arc::new(method.bind(recv.clone()))));
                }
                if let Some(v) = inst.class.static_get(name) {
                    return Ok(v);
                }
                let mut err = Exception::attribute_error(format!(
                    "{} has no member '{name}'",
                    inst.class.name()
                ));
                if let Some(hint) = hints::attribute_hint(name, &inst.class) {
                    err = err.with_hint(hint);
                }
                Err(err)
            }
            Value::Record(rec) => {
                if let Some(v) = rec.values.get(name) {
                    return Ok(v.clone());
                }
                if let Some(method) = rec.def.find_methods(name).first() {
                    return Ok(Value::Func(Arc::new(method.bind(recv.clone()))));
                }
                Err(Exception::attribute_error(format!(
                    "{} has no member '{name}'",
                    rec.def.name()
                )))
            }
            Value::Class(def) | Value::Constructor(def) => {
                if let Some(v) = def.static_get(name) {
                    return Ok(v);
                }
                if let Some(method) = def
                    .find_methods(name)
                    .iter()
                    .find(|m| m.modifiers.is_static)
                {
                    return Ok(Value::Func(method.clone()));
                }
                let mut err = Exception::attribute_error(format!(
                    "{} has no static member '{name}'",
                    def.name()
                ));
                if let Some(hint) = hints::attribute_hint(name, def) {
                    err = err.with_hint(hint);
                }
                Err(err)
            }
            Value::Interface(def) => def.static_get(name).ok_or_else(|| {
                Exception::attribute_error(format!(
                    "interface {} has no static member '{name}'",
                    def.name()
                ))
            }),
            Value::Enum(def) => def.value_of(name).map(Value::EnumValue).ok_or_else(|| {
                let mut err = Exception::attribute_error(format!(
                    "enum {} has no variant '{name}'",
                    def.name()
                ));
                if let Some(hint) = hints::enum_hint(name, def.name(), &def.variant_names()) {
                    err = err.with_hint(hint);
                }
                err
            }),
            Value::EnumValue(ev) => match name {
                "name" => Ok(Value::Str(ev.variant.clone())),
                _ => Err(Exception::attribute_error(format!(
                    "{} has no member '{name}'",
                    ev.enum_name
                ))),
            },
            Value::Pair(p) => match name {
                "first" => Ok(p.0.clone()),
                "second" => Ok(p.1.clone()),
                _ => self.builtin_member(recv, name),
            },
            // Primitives expose the `_value` sentinel: unboxing a
            // primitive yields the value itself.
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Bytes(_)
                if name == "_value" =>
            {
                Ok(recv.clone())
            }
            _ => self.builtin_member(recv, name),
        }
    }

    /// Member lookup through the wrapper class of a builtin value.
    fn builtin_member(&self, recv: &Value, name: &str) -> RunResult<Value> {
        let Some(class) = dispatch::class_of(recv, self.registry()) else {
            return Err(Exception::attribute_error(format!(
                "{} has no member '{name}'",
                recv.type_name()
            )));
        };
        if let Some(method) = class.find_methods(name).first() {
            return Ok(Value::Func(Arc::new(method.bind(recv.clone()))));
        }
        if let Some(v) = class.static_get(name) {
            return Ok(v);
        }
        let mut err =
            Exception::attribute_error(format!("{} has no member '{name}'", class.name()));
        if let Some(hint) = hints::attribute_hint(name, &class) {
            err = err.with_hint(hint);
        }
        Err(err)
    }

    /// Writes a member: instance fields (respecting access and finality),
    /// or static fields through a class value.
    pub(crate) fn set_member(
        &self,
        scope: &Scope,
        recv: &Value,
        name: &str,
        value: Value,
    ) -> RunResult<()> {
        match recv {
            Value::Instance(inst) => {
                if let Some((declaring, field)) = inst.class.find_field(name) {
                    dispatch::check_member_access(
                        field.modifiers,
                        &declaring,
                        self.caller_class(scope).as_ref(),
                        name,
                    )?;
                    if field.modifiers.is_final {
                        let initialized = inst
                            .fields
                            .read()
                            .get(name)
                            .is_some_and(|v| !v.is_nil());
                        if initialized {
                            return Err(Exception::state_error(format!(
                                "cannot reassign final field '{name}'"
                            )));
                        }
                    }
                    if let Some(ty) = &field.ty {
                        self.check_value_type(&value, ty, scope.package())?;
                    }
                    inst.fields.write().insert(name.to_owned(), value);
                    return Ok(());
                }
                // Undeclared fields may only be introduced by the class's
                // own code (typically constructors).
                let own_code = self
                    .caller_class(scope)
                    .is_some_and(|cc| cc.is_subclass_of(&inst.class) || inst.class.is_subclass_of(&cc));
                if own_code || inst.fields.read().contains_key(name) {
                    inst.fields.write().insert(name.to_owned(), value);
                    Ok(())
                } else {
                    let mut err = Exception::attribute_error(format!(
                        "{} has no field '{name}'",
                        inst.class.name()
                    ));
                    if let Some(hint) = hints::attribute_hint(name, &inst.class) {
                        err = err.with_hint(hint);
                    }
                    Err(err)
                }
            }
            Value::Class(def) | Value::Constructor(def) => def.static_set(name, value),
            Value::Record(rec) => Err(Exception::state_error(format!(
                "record {} is immutable",
                rec.def.name()
            ))),
            other => Err(Exception::type_error(format!(
                "cannot assign members on {}",
                other.type_name()
            ))),
        }
    }

    /// Assignment statements: plain names walk the scope chain, member and
    /// index targets delegate to the receiver.
    pub(crate) fn exec_assign(
        &self,
        scope: &Scope,
        target: &AssignTarget,
        value_expr: &ExprNode,
    ) -> RunResult<Flow> {
        match target {
            AssignTarget::Name(name) => {
                let value = self.eval_expr(scope, value_expr)?;
                scope.set(name, value).map_err(|e| {
                    if e.kind == crate::exceptions::ExcKind::NameError {
                        match hints::name_error_hint(name, scope) {
                            Some(hint) => e.with_hint(hint),
                            None => e,
                        }
                    } else {
                        e
                    }
                })?;
                Ok(Flow::Normal(Value::Nil))
            }
            AssignTarget::Field { object, field } => {
                let recv = self.eval_expr(scope, object)?;
                let value = self.eval_expr(scope, value_expr)?;
                self.set_member(scope, &recv, field, value)?;
                Ok(Flow::Normal(Value::Nil))
            }
            AssignTarget::Index { object, index } => {
                let recv = self.eval_expr(scope, object)?;
                let key = self.eval_expr(scope, index)?;
                let value = self.eval_expr(scope, value_expr)?;
                self.index_set(scope, &recv, key, value, &value_expr.pos)?;
                Ok(Flow::Normal(Value::Nil))
            }
        }
    }
}

fn eval_literal(lit: &Literal) -> Value {
    match lit {
        Literal::Nil => Value::Nil,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::str(s.clone()),
        Literal::Bytes(b) => Value::Bytes(Arc::new(b.clone())),
    }
}
