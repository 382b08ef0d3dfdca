//! The AST-walking evaluator.
//!
//! [`Interp`] owns the registries and output plumbing and is cheap to
//! clone, so spawned tasks and promise handlers carry their own handle.
//! Statement execution produces a [`Flow`] signal; `break`/`continue`
//! travel through nested constructs (including select bodies) up to the
//! enclosing loop.

mod control;
mod decl;
mod expr;
mod ops;

use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::args::Args;
use crate::ast::{Expr, Pos, Stmt, StmtNode};
use crate::dispatch;
use crate::exceptions::{ExcKind, Exception, RunResult};
use crate::io::{PrintWriter, StdPrint};
use crate::registry::Registry;
use crate::scope::Scope;
use crate::types::{ClassDef, TypeDesc, bind_type_args};
use crate::value::{FuncBody, FuncValue, Instance, Value, display_value};

/// Result of executing one statement.
#[derive(Debug)]
pub(crate) enum Flow {
    /// Execution continues; carries the statement's value.
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

/// The interpreter handle: registries, the global scope holding the
/// builtins, and the host output writer.
#[derive(Clone)]
pub struct Interp {
    registry: Arc<Registry>,
    globals: Scope,
    printer: Arc<Mutex<Box<dyn PrintWriter>>>,
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

impl Interp {
    /// Creates an interpreter with all builtins installed, printing to
    /// stdout.
    pub fn new() -> Self {
        Self::with_printer(Box::new(StdPrint))
    }

    /// Creates an interpreter routing print output to `writer`.
    pub fn with_printer(writer: Box<dyn PrintWriter>) -> Self {
        let interp = Self {
            registry: Arc::new(Registry::new()),
            globals: Scope::new_root(crate::registry::BUILTIN_PACKAGE, "<builtin>"),
            printer: Arc::new(Mutex::new(writer)),
        };
        crate::builtins::install(&interp).expect("builtin installation cannot fail");
        interp
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The scope builtins are bound in; user programs run in children of
    /// this scope.
    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    pub(crate) fn write_stdout(&self, text: &str) -> RunResult<()> {
        self.printer.lock().stdout_write(text)
    }

    pub(crate) fn push_stdout(&self, end: char) -> RunResult<()> {
        self.printer.lock().stdout_push(end)
    }

    /// Runs a program in a fresh child of the global scope under the
    /// `main` package, returning the value of its last statement.
    pub fn run(&self, stmts: &[StmtNode]) -> Result<Value, Exception> {
        let file = stmts.first().map_or_else(|| "<main>".into(), |s| s.pos.file.clone());
        let scope = self.globals.child_in("main", file);
        self.run_in(&scope, stmts)
    }

    /// Runs a program in the given scope (a child of [`Self::globals`]),
    /// so callers can pre-bind names or install source text for hints.
    pub fn run_in(&self, scope: &Scope, stmts: &[StmtNode]) -> Result<Value, Exception> {
        let result = self.exec_stmts(scope, stmts);
        match self.run_scope_defers(scope, result)? {
            Flow::Normal(v) | Flow::Return(v) => Ok(v),
            Flow::Break | Flow::Continue => {
                Err(Exception::runtime_error("break or continue outside a loop"))
            }
        }
    }

    /// Executes statements in `scope`, threading the last produced value.
    pub(crate) fn exec_stmts(&self, scope: &Scope, stmts: &[StmtNode]) -> RunResult<Flow> {
        let mut last = Value::Nil;
        for stmt in stmts {
            match self.exec_stmt(scope, stmt)? {
                Flow::Normal(v) => last = v,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(last))
    }

    /// Executes one block in a fresh child scope, running its defers on
    /// every exit path.
    pub(crate) fn exec_block(&self, scope: &Scope, stmts: &[StmtNode]) -> RunResult<Flow> {
        let child = scope.child();
        let result = self.exec_stmts(&child, stmts);
        self.run_scope_defers(&child, result)
    }

    /// Runs the scope's deferred thunks in LIFO order. All thunks run even
    /// when some fail; the last error propagates (superseding the in-flight
    /// result, which becomes its cause), earlier errors are logged and
    /// recorded on the propagated stack trace.
    pub(crate) fn run_scope_defers(&self, scope: &Scope, result: RunResult<Flow>) -> RunResult<Flow> {
        let defers = scope.take_defers();
        if defers.is_empty() {
            return result;
        }
        let mut errors: Vec<Exception> = Vec::new();
        for thunk in defers.into_iter().rev() {
            let func = match &thunk.func {
                Value::Func(f) => f.clone(),
                other => {
                    errors.push(
                        Exception::type_error(format!(
                            "deferred value is not callable: {}",
                            other.type_name()
                        ))
                        .at(thunk.pos.clone()),
                    );
                    continue;
                }
            };
            if let Err(e) = self.invoke(&func, Args::empty()) {
                errors.push(e.at(thunk.pos.clone()));
            }
        }
        let Some(mut last_err) = errors.pop() else {
            return result;
        };
        for earlier in errors {
            log::warn!("error in deferred block: {earlier}");
            last_err.push_frame(
                format!("deferred block ({}: {})", earlier.kind, earlier.message),
                earlier.pos.clone(),
            );
        }
        match result {
            Err(body_err) => Err(last_err.with_cause(body_err)),
            Ok(_) => Err(last_err),
        }
    }

    /// Executes one statement, stamping its position on the scope and on
    /// any escaping error.
    pub(crate) fn exec_stmt(&self, scope: &Scope, node: &StmtNode) -> RunResult<Flow> {
        scope.set_position(node.pos.line, node.pos.col);
        if let Some(line) = scope.source_line(node.pos.line) {
            scope.note_context(line);
        }
        self.exec_stmt_inner(scope, node)
            .map_err(|e| e.at(node.pos.clone()))
    }

    fn exec_stmt_inner(&self, scope: &Scope, node: &StmtNode) -> RunResult<Flow> {
        match &node.stmt {
            Stmt::VarDecl { name, kind, ty, init } => self.exec_var_decl(scope, name, *kind, ty.as_ref(), init.as_ref()),
            Stmt::FuncDecl(func) => self.exec_func_decl(scope, func),
            Stmt::ClassDecl(decl) => self.exec_class_decl(scope, decl),
            Stmt::InterfaceDecl(decl) => self.exec_interface_decl(scope, decl),
            Stmt::EnumDecl { name, variants } => self.exec_enum_decl(scope, name, variants),
            Stmt::RecordDecl(decl) => self.exec_record_decl(scope, decl),
            Stmt::Expr(expr) => Ok(Flow::Normal(self.eval_expr(scope, expr)?)),
            Stmt::Assign { target, value } => self.exec_assign(scope, target, value),
            Stmt::Destructure { names, value } => self.exec_destructure(scope, names, value),
            Stmt::If { cond, then_block, else_block } => self.exec_if(scope, cond, then_block, else_block.as_deref()),
            Stmt::While { cond, body } => self.exec_while(scope, Some(cond), body),
            Stmt::Loop { body } => self.exec_while(scope, None, body),
            Stmt::ForIn { names, iterable, body } => self.exec_for_in(scope, names, iterable, body),
            Stmt::Block(stmts) => self.exec_block(scope, stmts),
            Stmt::Return(expr) => {
                let v = match expr {
                    Some(e) => self.eval_expr(scope, e)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(v))
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Try { body, catches, finally } => self.exec_try(scope, body, catches, finally.as_deref()),
            Stmt::Throw(expr) => {
                let v = self.eval_expr(scope, expr)?;
                Err(self.exception_from_value(v, &node.pos))
            }
            Stmt::Defer(body) => self.exec_defer(scope, body, &node.pos),
            Stmt::Select { cases, closed } => self.exec_select(scope, cases, closed.as_deref()),
            Stmt::Go(expr) => self.exec_go(scope, expr),
        }
    }

    // ---- call machinery -------------------------------------------------

    /// Calls a function value with pre-marshalled arguments. The receiver,
    /// if any, travels in `args`.
    pub(crate) fn invoke(&self, func: &Arc<FuncValue>, args: Args) -> RunResult<Value> {
        match &func.body {
            FuncBody::Builtin(f) => {
                let scope = func.captured.clone().unwrap_or_else(|| self.globals.clone());
                f(self, &scope, args)
            }
            FuncBody::Ast(body) => {
                let this = args.this().cloned().or_else(|| func.bound_this.clone());
                let fixed = if func.is_variadic() {
                    func.params.len() - 1
                } else {
                    func.params.len()
                };
                if (func.is_variadic() && args.len() < fixed)
                    || (!func.is_variadic() && args.len() != func.params.len())
                {
                    return Err(Exception::arity_error(&func.name, func.params.len(), args.len()));
                }

                let parent = func.captured.clone().unwrap_or_else(|| self.globals.clone());
                let scope = parent.child();
                if let Some(this) = this {
                    scope.bind_this(this);
                }
                if let Some(class) = &func.declaring_class {
                    scope.bind_internal("__class__", Value::Class(class.clone()));
                }
                let bound = dispatch::collect_variadic(func, args);
                for (param, value) in func.params.iter().zip(bound) {
                    scope.bind_internal(&param.name, value);
                }

                let body = body.clone();
                let result = self.exec_stmts(&scope, &body);
                match self.run_scope_defers(&scope, result)? {
                    Flow::Return(v) | Flow::Normal(v) => Ok(v),
                    Flow::Break | Flow::Continue => {
                        Err(Exception::runtime_error("break or continue outside a loop"))
                    }
                }
            }
        }
    }

    /// [`Self::invoke`] plus a stack frame on the error path.
    pub(crate) fn invoke_at(&self, func: &Arc<FuncValue>, args: Args, pos: &Pos) -> RunResult<Value> {
        self.invoke(func, args).map_err(|mut e| {
            let frame = match &func.declaring_class {
                Some(class) => format!("{}.{}", class.name(), func.name),
                None => func.name.to_string(),
            };
            e.push_frame(frame, Some(pos.clone()));
            e
        })
    }

    /// Calls any function value from host context (promise handlers,
    /// spawned tasks); arity rules are the function's own.
    pub fn call_function(&self, func: &Arc<FuncValue>, args: Args) -> RunResult<Value> {
        self.invoke(func, args)
    }

    /// Calls an arbitrary callable value: functions, class constructors
    /// and record definitions.
    pub(crate) fn call_value(&self, callee: Value, args: Args, scope: &Scope, pos: &Pos) -> RunResult<Value> {
        match callee {
            Value::Func(f) => self.invoke_at(&f, args, pos),
            Value::Constructor(def) => self.create_instance(&def, None, args, scope, pos),
            Value::Class(def) if def.is_abstract() => Err(Exception::initialization_error(format!(
                "cannot instantiate abstract class {}",
                def.name()
            ))),
            Value::Class(def) => self.create_instance(&def, None, args, scope, pos),
            Value::RecordDef(def) => self.construct_record(&def, args),
            other => Err(Exception::type_error(format!(
                "{} is not callable",
                other.type_name()
            ))),
        }
    }

    /// Resolves and calls a method on a receiver.
    pub(crate) fn call_method(
        &self,
        recv: &Value,
        name: &str,
        args: Args,
        scope: &Scope,
        pos: &Pos,
    ) -> RunResult<Value> {
        // Receivers without a backing class: records and enum values.
        if let Value::Record(rec) = recv {
            let candidates = rec.def.find_methods(name);
            if candidates.is_empty() {
                return self.record_intrinsic(recv, rec, name, args);
            }
            let package = scope.package().to_owned();
            let func = dispatch::select_overload(&candidates, &args, None, &package, &self.registry)
                .ok_or_else(|| no_overload(name, &args))?;
            return self.invoke_at(&func, args.with_this(recv.clone()), pos);
        }
        if let Value::EnumValue(ev) = recv {
            return self.enum_value_intrinsic(ev, name, args, scope.package());
        }
        if let Value::Enum(def) = recv {
            return self.enum_def_intrinsic(def, name, args, pos);
        }
        // Static dispatch through a class value: only static overloads,
        // no receiver bound.
        if let Value::Class(def) | Value::Constructor(def) = recv {
            let candidates: Vec<_> = def
                .find_methods(name)
                .into_iter()
                .filter(|m| m.modifiers.is_static)
                .collect();
            if candidates.is_empty() {
                let mut err = Exception::attribute_error(format!(
                    "{} has no static member '{name}'",
                    def.name()
                ));
                if let Some(hint) = crate::hints::attribute_hint(name, def) {
                    err = err.with_hint(hint);
                }
                return Err(err);
            }
            let package = scope.package().to_owned();
            let func =
                dispatch::select_overload(&candidates, &args, None, &package, &self.registry)
                    .ok_or_else(|| no_overload(name, &args))?;
            return self.invoke_at(&func, args, pos);
        }

        let class = dispatch::class_of(recv, &self.registry).ok_or_else(|| {
            Exception::attribute_error(format!("{} has no member '{name}'", recv.type_name()))
        })?;
        let candidates = class.find_methods(name);
        if candidates.is_empty() {
            // Every class-backed value answers getClass() with its
            // definition, for static-member access.
            if name == "getClass" && args.is_empty() {
                return Ok(Value::Class(class));
            }
            let mut err =
                Exception::attribute_error(format!("{} has no member '{name}'", class.name()));
            if let Some(hint) = crate::hints::attribute_hint(name, &class) {
                err = err.with_hint(hint);
            }
            return Err(err);
        }

        let bindings = match recv {
            Value::Instance(inst) => inst
                .type_args
                .as_ref()
                .map(|ta| bind_type_args(inst.class.type_params(), ta)),
            _ => None,
        };
        let package = scope.package().to_owned();
        let func = dispatch::select_overload(&candidates, &args, bindings.as_ref(), &package, &self.registry)
            .ok_or_else(|| no_overload(name, &args))?;

        if let Some(declaring) = &func.declaring_class {
            dispatch::check_member_access(func.modifiers, declaring, self.caller_class(scope).as_ref(), name)?;
        }
        self.invoke_at(&func, args.with_this(recv.clone()), pos)
    }

    /// The class of the `this` executing in `scope`, for access checks.
    pub(crate) fn caller_class(&self, scope: &Scope) -> Option<Arc<ClassDef>> {
        match scope.get("__class__") {
            Some(Value::Class(c)) => Some(c),
            _ => match scope.get("this") {
                Some(this) => dispatch::class_of(&this, &self.registry),
                None => None,
            },
        }
    }

    // ---- instance creation ----------------------------------------------

    /// Creates an instance of `class`.
    ///
    /// Field defaults are copied up the inheritance chain (parent first),
    /// the matching constructor overload runs with `this` bound, and an
    /// explicit `super(...)` first statement (or, failing that, an
    /// implicit zero-argument parent constructor) initializes the parent
    /// part. Field-initialization completeness is not checked at
    /// constructor exit.
    pub(crate) fn create_instance(
        &self,
        class: &Arc<ClassDef>,
        type_args: Option<Vec<TypeDesc>>,
        args: Args,
        scope: &Scope,
        pos: &Pos,
    ) -> RunResult<Value> {
        if class.is_abstract() {
            return Err(Exception::initialization_error(format!(
                "cannot instantiate abstract class {}",
                class.name()
            )));
        }
        if let Some(ta) = &type_args {
            self.check_type_args(class, ta, scope.package())?;
        }

        // Builtin constructors are factories: they receive the raw
        // arguments and return the constructed value themselves (native
        // containers, or self-allocated instances for the exception
        // classes).
        if class.is_builtin() {
            let ctors = class.constructors();
            if ctors.is_empty() {
                return Err(Exception::initialization_error(format!(
                    "{} cannot be constructed directly",
                    class.name()
                )));
            }
            let package = scope.package().to_owned();
            let ctor = dispatch::select_overload(&ctors, &args, None, &package, &self.registry)
                .ok_or_else(|| {
                    Exception::runtime_error(format!(
                        "no overload of {}() takes {} arguments",
                        class.name(),
                        args.len()
                    ))
                })?;
            return self.invoke_at(&ctor, args, pos);
        }

        let instance = Arc::new(Instance {
            class: class.clone(),
            fields: parking_lot::RwLock::new(class.field_defaults()),
            type_args,
        });
        let value = Value::Instance(instance);

        // A class that declares no constructors inherits its parent's.
        let mut ctors = class.constructors();
        let mut ctor_owner = class.clone();
        while ctors.is_empty() {
            match ctor_owner.parent() {
                Some(parent) => {
                    ctors = parent.constructors();
                    ctor_owner = parent;
                }
                None => break,
            }
        }
        if ctors.is_empty() {
            if !args.is_empty() {
                return Err(Exception::runtime_error(format!(
                    "no overload of {}() takes {} arguments",
                    class.name(),
                    args.len()
                )));
            }
            return Ok(value);
        }

        let package = scope.package().to_owned();
        let ctor = dispatch::select_overload(&ctors, &args, None, &package, &self.registry)
            .ok_or_else(|| {
                Exception::runtime_error(format!(
                    "no overload of {}() takes {} arguments",
                    class.name(),
                    args.len()
                ))
            })?;

        match &ctor.body {
            FuncBody::Builtin(_) => {
                self.invoke_at(&ctor, args.with_this(value.clone()), pos)?;
            }
            FuncBody::Ast(body) => {
                let explicit_super = matches!(
                    body.first(),
                    Some(StmtNode {
                        stmt: Stmt::Expr(e),
                        ..
                    }) if matches!(e.expr, Expr::Super { .. })
                );
                if !explicit_super {
                    // Start from the constructor's declaring class so an
                    // inherited constructor does not re-run itself.
                    self.run_implicit_super(&ctor_owner, &value, scope, pos)?;
                }
                self.invoke_at(&ctor, args.with_this(value.clone()), pos)?;
            }
        }
        Ok(value)
    }

    /// Auto-invokes the parent's zero-argument constructor when one
    /// exists.
    fn run_implicit_super(
        &self,
        class: &Arc<ClassDef>,
        this: &Value,
        scope: &Scope,
        pos: &Pos,
    ) -> RunResult<()> {
        let Some(parent) = class.parent() else {
            return Ok(());
        };
        if let Some(ctor) = parent.zero_arg_constructor() {
            self.invoke_at(&ctor, Args::empty().with_this(this.clone()), pos)?;
        } else {
            self.run_implicit_super(&parent, this, scope, pos)?;
        }
        Ok(())
    }

    /// Validates concrete type arguments against the class's declared
    /// parameters and their bounds.
    fn check_type_args(&self, class: &Arc<ClassDef>, args: &[TypeDesc], package: &str) -> RunResult<()> {
        let params = class.type_params();
        if params.len() != args.len() {
            return Err(Exception::type_error(format!(
                "{} expects {} type argument{}, got {}",
                class.name(),
                params.len(),
                if params.len() == 1 { "" } else { "s" },
                args.len()
            )));
        }
        for (param, arg) in params.iter().zip(args) {
            let Some(bound) = &param.bound else { continue };
            if !param.upper {
                // `super` bounds are accepted without deeper checking.
                continue;
            }
            if !self.type_satisfies(arg, bound, package) {
                return Err(Exception::type_error(format!(
                    "type argument {} does not satisfy bound {} of parameter {}",
                    arg.name, bound.name, param.name
                )));
            }
        }
        Ok(())
    }

    /// Shallow nominal check that type `arg` satisfies `bound`.
    fn type_satisfies(&self, arg: &TypeDesc, bound: &TypeDesc, package: &str) -> bool {
        if arg.name == bound.name {
            return true;
        }
        let Some(arg_class) = self.registry.lookup_class(package, &arg.name) else {
            return false;
        };
        if bound.is_interface {
            if let Some(iface) = self.registry.lookup_interface(package, &bound.name) {
                return arg_class.implements_interface(&iface);
            }
            return false;
        }
        match self.registry.lookup_class(package, &bound.name) {
            Some(bound_class) => arg_class.is_subclass_of(&bound_class),
            None => false,
        }
    }

    /// Constructs a record instance from positional component values.
    pub(crate) fn construct_record(
        &self,
        def: &Arc<crate::types::RecordDef>,
        args: Args,
    ) -> RunResult<Value> {
        let components = def.components();
        if args.len() != components.len() {
            return Err(Exception::arity_error(def.name(), components.len(), args.len()));
        }
        let values = components
            .iter()
            .zip(args.into_values())
            .map(|((name, _), v)| (name.clone(), v))
            .collect();
        Ok(Value::Record(Arc::new(crate::value::RecordInstance {
            def: def.clone(),
            values,
        })))
    }

    // ---- exceptions ------------------------------------------------------

    /// Converts a thrown value into a structured exception, wrapping
    /// non-exception values into RuntimeError.
    pub(crate) fn exception_from_value(&self, value: Value, pos: &Pos) -> Exception {
        if let Value::Instance(inst) = &value {
            if let Some(kind) = self.exception_kind_of(&inst.class) {
                let message = match inst.fields.read().get("message") {
                    Some(Value::Str(s)) => s.to_string(),
                    Some(other) if !other.is_nil() => display_value(other),
                    _ => String::new(),
                };
                {
                    // The constructor usually ran without a position; the
                    // throw site is the position users want to see.
                    let mut fields = inst.fields.write();
                    let unset = fields.get("line").is_none_or(Value::is_nil);
                    if unset {
                        fields.insert("file".to_owned(), Value::Str(pos.file.clone()));
                        fields.insert("line".to_owned(), Value::Int(i64::from(pos.line)));
                        fields.insert("column".to_owned(), Value::Int(i64::from(pos.col)));
                    }
                }
                let mut exc = Exception::new(kind, message)
                    .at(pos.clone())
                    .with_payload(value.clone());
                if ExcKind::from_str(inst.class.name()).is_err() {
                    exc = exc.with_class(inst.class.clone());
                }
                return exc;
            }
        }
        Exception::runtime_error(display_value(&value))
            .at(pos.clone())
            .with_payload(value)
    }

    /// The builtin kind a class maps to, walking the parent chain.
    pub(crate) fn exception_kind_of(&self, class: &Arc<ClassDef>) -> Option<ExcKind> {
        let mut cur = class.clone();
        loop {
            if let Ok(kind) = ExcKind::from_str(cur.name()) {
                return Some(kind);
            }
            cur = cur.parent()?;
        }
    }

    /// The user-accessible exception object, materialized on demand.
    pub fn exception_to_value(&self, exc: &Exception) -> Value {
        if let Some(payload) = &exc.payload {
            return payload.clone();
        }
        let class = exc
            .class
            .clone()
            .or_else(|| self.registry.builtin_class(exc.kind.into()));
        let Some(class) = class else {
            // Exception classes install at startup; reaching this means a
            // raise before installation finished.
            return Value::str(exc.message.clone());
        };
        let mut fields = class.field_defaults();
        fields.insert("message".to_owned(), Value::str(exc.message.clone()));
        fields.insert("kind".to_owned(), Value::str(exc.class_name().to_owned()));
        if let Some(pos) = &exc.pos {
            fields.insert("file".to_owned(), Value::Str(pos.file.clone()));
            fields.insert("line".to_owned(), Value::Int(i64::from(pos.line)));
            fields.insert("column".to_owned(), Value::Int(i64::from(pos.col)));
        }
        if let Some(hint) = &exc.hint {
            fields.insert("hint".to_owned(), Value::str(hint.to_string()));
        }
        if let Some(cause) = &exc.cause {
            fields.insert("cause".to_owned(), self.exception_to_value(cause));
        }
        let stack: Vec<Value> = exc
            .stack
            .iter()
            .map(|frame| match &frame.pos {
                Some(pos) => Value::str(format!("{} ({pos})", frame.name)),
                None => Value::str(frame.name.clone()),
            })
            .collect();
        fields.insert("stackTrace".to_owned(), Value::array(stack));

        Value::Instance(Arc::new(Instance {
            class,
            fields: parking_lot::RwLock::new(fields),
            type_args: None,
        }))
    }

    // ---- intrinsic members for class-less receivers ----------------------

    fn record_intrinsic(
        &self,
        recv: &Value,
        rec: &Arc<crate::value::RecordInstance>,
        name: &str,
        args: Args,
    ) -> RunResult<Value> {
        match name {
            "toString" => {
                args.check_zero(name)?;
                Ok(Value::str(crate::value::repr_value(recv)))
            }
            "__pieces" => {
                args.check_zero(name)?;
                Ok(Value::Int(rec.values.len() as i64))
            }
            "__get_piece" => {
                let idx = args.get_one(name)?.as_int()?;
                rec.values
                    .get_index(idx as usize)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| Exception::index_error(format!("record piece {idx} out of range")))
            }
            _ => {
                let mut err = Exception::attribute_error(format!(
                    "{} has no member '{name}'",
                    rec.def.name()
                ));
                let mut names = rec.def.component_names();
                names.extend(rec.def.method_names());
                let matches = crate::hints::rank_suggestions(name, names);
                if !matches.is_empty() {
                    err = err.with_hint(crate::hints::Hint::new(
                        crate::hints::HintKind::Attribute,
                        format!("{} has no member '{name}'", rec.def.name()),
                        matches,
                    ));
                }
                Err(err)
            }
        }
    }

    fn enum_value_intrinsic(
        &self,
        ev: &crate::value::EnumValue,
        name: &str,
        args: Args,
        package: &str,
    ) -> RunResult<Value> {
        match name {
            "name" | "toString" => {
                args.check_zero(name)?;
                Ok(Value::Str(ev.variant.clone()))
            }
            "ordinal" => {
                args.check_zero(name)?;
                let def = self.registry.lookup_enum(package, &ev.enum_name);
                match def.and_then(|d| d.ordinal(&ev.variant)) {
                    Some(i) => Ok(Value::Int(i as i64)),
                    None => Err(Exception::state_error(format!(
                        "enum {} is not registered",
                        ev.enum_name
                    ))),
                }
            }
            _ => Err(Exception::attribute_error(format!(
                "{} has no member '{name}'",
                ev.enum_name
            ))),
        }
    }

    fn enum_def_intrinsic(
        &self,
        def: &Arc<crate::types::EnumDef>,
        name: &str,
        args: Args,
        _pos: &Pos,
    ) -> RunResult<Value> {
        match name {
            "values" => {
                args.check_zero(name)?;
                let items = def
                    .variants()
                    .iter()
                    .map(|v| {
                        Value::EnumValue(crate::value::EnumValue {
                            enum_name: Arc::from(def.name()),
                            variant: v.clone(),
                        })
                    })
                    .collect();
                Ok(Value::array(items))
            }
            "valueOf" => {
                let arg = args.get_one(name)?;
                let wanted = arg.as_str()?;
                def.value_of(&wanted).map(Value::EnumValue).ok_or_else(|| {
                    let mut err = Exception::value_error(format!(
                        "enum {} has no variant '{wanted}'",
                        def.name()
                    ));
                    if let Some(hint) =
                        crate::hints::enum_hint(&wanted, def.name(), &def.variant_names())
                    {
                        err = err.with_hint(hint);
                    }
                    err
                })
            }
            _ => Err(Exception::attribute_error(format!(
                "enum {} has no member '{name}'",
                def.name()
            ))),
        }
    }
}

/// The uniform "no overload" failure.
pub(crate) fn no_overload(name: &str, args: &Args) -> Exception {
    Exception::runtime_error(format!(
        "no overload of '{name}' matches {} argument{}",
        args.len(),
        if args.len() == 1 { "" } else { "s" }
    ))
}
