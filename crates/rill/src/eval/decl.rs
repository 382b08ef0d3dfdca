//! Declaration statements: variables, functions, classes, interfaces,
//! enums and records.

use std::sync::Arc;

use crate::ast::{ClassDecl, DeclKind, ExprNode, FuncLit, InterfaceDecl, RecordDecl};
use crate::eval::{Flow, Interp};
use crate::exceptions::{Exception, RunResult};
use crate::scope::Scope;
use crate::types::{ClassBuilder, EnumDef, InterfaceBuilder, RecordDef, TypeDesc};
use crate::value::{FuncValue, Value};

impl Interp {
    /// `let`/`var`/`const`; an annotated type validates the initializer.
    pub(crate) fn exec_var_decl(
        &self,
        scope: &Scope,
        name: &str,
        kind: DeclKind,
        ty: Option<&TypeDesc>,
        init: Option<&ExprNode>,
    ) -> RunResult<Flow> {
        let value = match init {
            Some(expr) => self.eval_expr(scope, expr)?,
            None => Value::Nil,
        };
        if let Some(ty) = ty {
            self.check_value_type(&value, ty, scope.package())?;
        }
        scope.define(name, value, kind)?;
        Ok(Flow::Normal(Value::Nil))
    }

    /// Named function declaration; the closure captures the declaring
    /// scope, so the function can recurse through its own name.
    pub(crate) fn exec_func_decl(&self, scope: &Scope, lit: &FuncLit) -> RunResult<Flow> {
        let name = lit
            .name
            .clone()
            .ok_or_else(|| Exception::runtime_error("function declaration requires a name"))?;
        let mut func = FuncValue::new_ast(
            name.clone(),
            lit.params.clone(),
            lit.body.clone(),
            Some(scope.clone()),
        );
        func.return_type = lit.return_type.clone();
        scope.define(&name, Value::Func(Arc::new(func)), DeclKind::Let)?;
        Ok(Flow::Normal(Value::Nil))
    }

    /// Class declaration, funneled through the class builder so user
    /// classes and builtins share one installation path.
    pub(crate) fn exec_class_decl(&self, scope: &Scope, decl: &ClassDecl) -> RunResult<Flow> {
        let mut builder = ClassBuilder::new(&decl.name).access(decl.access);
        if decl.is_abstract {
            builder = builder.set_abstract();
        }
        if let Some(parent_name) = &decl.parent {
            let parent = self
                .registry()
                .lookup_class(scope.package(), parent_name)
                .ok_or_else(|| {
                    Exception::runtime_error(format!("unknown parent class '{parent_name}'"))
                })?;
            builder = builder.set_parent(parent);
        }
        for iface_name in &decl.interfaces {
            let iface = self
                .registry()
                .lookup_interface(scope.package(), iface_name)
                .ok_or_else(|| {
                    Exception::runtime_error(format!("unknown interface '{iface_name}'"))
                })?;
            builder = builder.add_interface(iface);
        }
        if !decl.type_params.is_empty() {
            builder = builder.add_type_parameters(decl.type_params.clone());
        }
        for alias in &decl.aliases {
            builder = builder.add_alias(alias.clone());
        }

        for field in &decl.fields {
            match &field.init {
                Some(init) => {
                    let default = self.eval_expr(scope, init)?;
                    builder = builder.add_field_with_default(
                        &field.name,
                        field.ty.clone(),
                        field.modifiers,
                        default,
                    );
                }
                None => {
                    builder = builder.add_field(&field.name, field.ty.clone(), field.modifiers);
                }
            }
        }
        for method in &decl.methods {
            let mut func = FuncValue::new_ast(
                method.name.clone(),
                method.func.params.clone(),
                method.func.body.clone(),
                Some(scope.clone()),
            );
            func.return_type = method.func.return_type.clone();
            func.modifiers = method.modifiers;
            builder = builder.add_method(&method.name, func);
        }
        for ctor in &decl.constructors {
            let func = FuncValue::new_ast(
                "init",
                ctor.params.clone(),
                ctor.body.clone(),
                Some(scope.clone()),
            );
            builder = builder.add_constructor(func);
        }

        builder.build(self.registry(), scope)?;
        Ok(Flow::Normal(Value::Nil))
    }

    pub(crate) fn exec_interface_decl(&self, scope: &Scope, decl: &InterfaceDecl) -> RunResult<Flow> {
        let mut builder = InterfaceBuilder::new(&decl.name);
        if decl.is_sealed {
            builder = builder.sealed(decl.permits.clone());
        }
        if !decl.type_params.is_empty() {
            builder = builder.add_type_parameters(decl.type_params.clone());
        }
        for method in &decl.methods {
            match &method.default_body {
                Some(body) => {
                    let mut func = FuncValue::new_ast(
                        method.name.clone(),
                        method.params.clone(),
                        body.body.clone(),
                        Some(scope.clone()),
                    );
                    func.return_type = method.return_type.clone();
                    builder = builder.add_default_method(&method.name, func);
                }
                None => {
                    builder = builder.add_abstract_method(&method.name, method.params.clone());
                }
            }
        }
        builder.build(self.registry(), scope)?;
        Ok(Flow::Normal(Value::Nil))
    }

    pub(crate) fn exec_enum_decl(&self, scope: &Scope, name: &str, variants: &[String]) -> RunResult<Flow> {
        EnumDef::new(name, scope.package(), variants.to_vec()).install(self.registry(), scope)?;
        Ok(Flow::Normal(Value::Nil))
    }

    pub(crate) fn exec_record_decl(&self, scope: &Scope, decl: &RecordDecl) -> RunResult<Flow> {
        let def = RecordDef::new(decl.name.clone(), scope.package(), decl.components.clone());
        for method in &decl.methods {
            let mut func = FuncValue::new_ast(
                method.name.clone(),
                method.func.params.clone(),
                method.func.body.clone(),
                Some(scope.clone()),
            );
            func.return_type = method.func.return_type.clone();
            func.modifiers = method.modifiers;
            def.add_method(&method.name, func);
        }
        def.install(self.registry(), scope)?;
        Ok(Flow::Normal(Value::Nil))
    }
}
