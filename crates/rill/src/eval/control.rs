//! Control-flow statements: conditionals, loops, iteration, destructuring,
//! try/catch/finally, defer, select and go.

use std::str::FromStr;
use std::sync::Arc;

use crate::args::Args;
use crate::ast::{CatchClause, Expr, ExprNode, Pos, SelectCase, StmtNode};
use crate::eval::{Flow, Interp};
use crate::exceptions::{ExcKind, Exception, RunResult};
use crate::scope::{DeferThunk, Scope};
use crate::value::{FuncValue, Value};

impl Interp {
    pub(crate) fn exec_if(
        &self,
        scope: &Scope,
        cond: &ExprNode,
        then_block: &[StmtNode],
        else_block: Option<&[StmtNode]>,
    ) -> RunResult<Flow> {
        if self.eval_expr(scope, cond)?.as_bool()? {
            self.exec_block(scope, then_block)
        } else if let Some(else_block) = else_block {
            self.exec_block(scope, else_block)
        } else {
            Ok(Flow::Normal(Value::Nil))
        }
    }

    /// `while` when a condition is present, `loop` otherwise.
    pub(crate) fn exec_while(
        &self,
        scope: &Scope,
        cond: Option<&ExprNode>,
        body: &[StmtNode],
    ) -> RunResult<Flow> {
        loop {
            if let Some(cond) = cond {
                if !self.eval_expr(scope, cond)?.as_bool()? {
                    break;
                }
            }
            match self.exec_block(scope, body)? {
                Flow::Break => break,
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Normal(_) | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    /// For-in over an iterable: index iteration when the value has a
    /// length, piece iteration otherwise. With multiple loop variables,
    /// every element must decompose into exactly that many pieces.
    pub(crate) fn exec_for_in(
        &self,
        scope: &Scope,
        names: &[String],
        iterable: &ExprNode,
        body: &[StmtNode],
    ) -> RunResult<Flow> {
        let it = self.eval_expr(scope, iterable)?;
        let pos = &iterable.pos;

        let (count, by_length) = if let Some(len) = self.length_of(scope, &it, pos)? {
            (len, true)
        } else if let Some(pieces) = self.pieces_of(scope, &it, pos)? {
            (pieces, false)
        } else {
            return Err(Exception::type_error(format!(
                "{} is not iterable",
                it.type_name()
            )));
        };

        for i in 0..count {
            let elem = if by_length {
                self.get_at(scope, &it, i, pos)?
            } else {
                self.get_piece(scope, &it, i, pos)?
            };
            let child = scope.child();
            self.bind_loop_names(&child, names, elem, pos)?;
            let result = self.exec_stmts(&child, body);
            match self.run_scope_defers(&child, result)? {
                Flow::Break => break,
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Normal(_) | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    fn bind_loop_names(&self, scope: &Scope, names: &[String], elem: Value, pos: &Pos) -> RunResult<()> {
        if names.len() == 1 {
            scope.bind_internal(&names[0], elem);
            return Ok(());
        }
        let pieces = self.pieces_of(scope, &elem, pos)?.ok_or_else(|| {
            Exception::value_error(format!(
                "loop element {} does not decompose into pieces",
                elem.type_name()
            ))
        })?;
        if pieces != names.len() {
            return Err(Exception::value_error(format!(
                "expected {} pieces, got {pieces}",
                names.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            let piece = self.get_piece(scope, &elem, i, pos)?;
            scope.bind_internal(name, piece);
        }
        Ok(())
    }

    /// `a, b = expr`: the value must decompose into exactly as many
    /// pieces as there are targets.
    pub(crate) fn exec_destructure(
        &self,
        scope: &Scope,
        names: &[String],
        value: &ExprNode,
    ) -> RunResult<Flow> {
        let v = self.eval_expr(scope, value)?;
        let pos = &value.pos;
        let pieces = self.pieces_of(scope, &v, pos)?.ok_or_else(|| {
            Exception::value_error(format!(
                "{} does not decompose into pieces",
                v.type_name()
            ))
        })?;
        if pieces != names.len() {
            return Err(Exception::value_error(format!(
                "expected {} pieces, got {pieces}",
                names.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            let piece = self.get_piece(scope, &v, i, pos)?;
            if scope.is_defined(name) {
                scope.set(name, piece)?;
            } else {
                scope.define(name, piece, crate::ast::DeclKind::Let)?;
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    // ---- try / defer -----------------------------------------------------

    pub(crate) fn exec_try(
        &self,
        scope: &Scope,
        body: &[StmtNode],
        catches: &[CatchClause],
        finally: Option<&[StmtNode]>,
    ) -> RunResult<Flow> {
        let mut outcome = self.exec_block(scope, body);

        if let Err(exc) = &outcome {
            let exc = exc.clone();
            for clause in catches {
                if self.catch_matches(scope, &exc, clause)? {
                    let cscope = scope.child();
                    cscope.bind_internal(&clause.binding, self.exception_to_value(&exc));
                    let result = self.exec_stmts(&cscope, &clause.body);
                    // A throwing clause replaces the original exception.
                    outcome = self.run_scope_defers(&cscope, result);
                    break;
                }
            }
        }

        if let Some(finally) = finally {
            match self.exec_block(scope, finally) {
                // A finally that throws or produces control flow
                // overrides any pending value or exception.
                Err(e) => outcome = Err(e),
                Ok(Flow::Normal(_)) => {}
                Ok(other) => outcome = Ok(other),
            }
        }
        outcome
    }

    fn catch_matches(&self, scope: &Scope, exc: &Exception, clause: &CatchClause) -> RunResult<bool> {
        let Some(kind_name) = &clause.kind else {
            return Ok(true);
        };
        if let Ok(kind) = ExcKind::from_str(kind_name) {
            return Ok(exc.kind.is_subclass_of(kind));
        }
        if let Some(class) = self.registry().lookup_class(scope.package(), kind_name) {
            return Ok(exc
                .class
                .as_ref()
                .is_some_and(|ec| ec.is_subclass_of(&class)));
        }
        Err(Exception::runtime_error(format!(
            "unknown exception kind '{kind_name}' in catch clause"
        )))
    }

    /// Queues the block on the current scope's defer stack.
    pub(crate) fn exec_defer(&self, scope: &Scope, body: &[StmtNode], pos: &Pos) -> RunResult<Flow> {
        let func = FuncValue::new_ast(
            "<deferred>",
            Vec::new(),
            Arc::new(body.to_vec()),
            Some(scope.clone()),
        );
        scope.push_defer(DeferThunk {
            func: Value::Func(Arc::new(func)),
            pos: pos.clone(),
        });
        Ok(Flow::Normal(Value::Nil))
    }

    // ---- select / go -----------------------------------------------------

    /// Multiplexes over channel receives. Exactly one ready case runs; a
    /// receive observing a closed, drained channel routes to the
    /// closed-case body. Break/continue from a case body propagate to the
    /// enclosing loop.
    pub(crate) fn exec_select(
        &self,
        scope: &Scope,
        cases: &[SelectCase],
        closed: Option<&[StmtNode]>,
    ) -> RunResult<Flow> {
        if cases.is_empty() {
            return Err(Exception::state_error("select requires at least one case"));
        }
        let mut channels = Vec::with_capacity(cases.len());
        for case in cases {
            channels.push(self.eval_expr(scope, &case.channel)?.as_channel()?);
        }

        let mut active: Vec<usize> = (0..cases.len()).collect();
        loop {
            let mut sel = crossbeam_channel::Select::new();
            for &i in &active {
                sel.recv(channels[i].receiver());
            }
            let oper = sel.select();
            let slot = oper.index();
            let case_idx = active[slot];
            match oper.recv(channels[case_idx].receiver()) {
                Ok(v) => {
                    let child = scope.child();
                    if let Some(name) = &cases[case_idx].binding {
                        child.bind_internal(name, v);
                    }
                    let result = self.exec_stmts(&child, &cases[case_idx].body);
                    return self.run_scope_defers(&child, result);
                }
                Err(_) => {
                    if let Some(closed_body) = closed {
                        return self.exec_block(scope, closed_body);
                    }
                    // No closed-case: stop watching the closed channel.
                    active.remove(slot);
                    if active.is_empty() {
                        return Err(Exception::state_error(
                            "select: all channels closed and no closed case",
                        ));
                    }
                }
            }
        }
    }

    /// Spawns a task running the given call. The callee and its arguments
    /// evaluate on the spawning thread; only the call itself runs
    /// concurrently.
    pub(crate) fn exec_go(&self, scope: &Scope, expr: &ExprNode) -> RunResult<Flow> {
        match &expr.expr {
            Expr::Call { callee, args } => {
                let callee_value = self.eval_expr(scope, callee)?;
                let args = args
                    .iter()
                    .map(|a| self.eval_expr(scope, a))
                    .collect::<RunResult<Args>>()?;
                let pos = expr.pos.clone();
                self.spawn_task(move |interp| {
                    let scope = interp.globals().child();
                    interp.call_value(callee_value, args, &scope, &pos)
                })?;
            }
            Expr::MethodCall { object, method, args } => {
                let recv = self.eval_expr(scope, object)?;
                let args = args
                    .iter()
                    .map(|a| self.eval_expr(scope, a))
                    .collect::<RunResult<Args>>()?;
                let method = method.clone();
                let pos = expr.pos.clone();
                self.spawn_task(move |interp| {
                    let scope = interp.globals().child();
                    interp.call_method(&recv, &method, args, &scope, &pos)
                })?;
            }
            _ => {
                let v = self.eval_expr(scope, expr)?;
                let func = v.as_func().map_err(|_| {
                    Exception::type_error("go requires a call or a zero-argument function")
                })?;
                self.spawn_task(move |interp| interp.invoke(&func, Args::empty()))?;
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    fn spawn_task(
        &self,
        task: impl FnOnce(&Interp) -> RunResult<Value> + Send + 'static,
    ) -> RunResult<()> {
        let interp = self.clone();
        log::trace!("spawning task");
        std::thread::Builder::new()
            .name("rill-task".to_owned())
            .spawn(move || {
                if let Err(e) = task(&interp) {
                    log::warn!("unhandled exception in spawned task: {e}");
                }
            })
            .map_err(|e| Exception::runtime_error(format!("failed to spawn task: {e}")))?;
        Ok(())
    }
}
