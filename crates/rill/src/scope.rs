//! Lexical scope chain.
//!
//! A [`Scope`] is one node of the environment chain: name bindings, the set
//! of `const` names, the current source position, the deferred-cleanup
//! stack, and (on root scopes) the source lines used for hint generation.
//! Scopes are reference-counted and internally locked so closures and
//! spawned tasks can share them; a captured lambda keeps its enclosing
//! chain alive.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};

use crate::ast::{DeclKind, Pos};
use crate::exceptions::{Exception, RunResult};
use crate::value::Value;

/// Number of recently executed source lines kept for diagnostics.
const CODE_CONTEXT_LINES: usize = 10;

/// A deferred thunk queued by a `defer` statement, run when the owning
/// scope exits.
#[derive(Debug, Clone)]
pub struct DeferThunk {
    /// Zero-argument closure capturing the scope at the defer site.
    pub func: Value,
    pub pos: Pos,
}

#[derive(Debug)]
struct ScopeInner {
    parent: Option<Scope>,
    bindings: RwLock<AHashMap<String, Value>>,
    consts: RwLock<AHashSet<String>>,
    package: Arc<str>,
    file: Arc<str>,
    line_col: RwLock<(u32, u32)>,
    defers: Mutex<Vec<DeferThunk>>,
    /// Source text of the current file, present on root scopes when the
    /// host provides it. Consulted for language-conversion hints.
    source_lines: RwLock<Option<Arc<Vec<String>>>>,
    /// Recently executed lines, most recent last.
    code_context: Mutex<VecDeque<String>>,
}

/// A shared handle to one scope node.
#[derive(Debug, Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Creates a root scope for the given package and file.
    pub fn new_root(package: impl Into<Arc<str>>, file: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent: None,
                bindings: RwLock::new(AHashMap::new()),
                consts: RwLock::new(AHashSet::new()),
                package: package.into(),
                file: file.into(),
                line_col: RwLock::new((0, 0)),
                defers: Mutex::new(Vec::new()),
                source_lines: RwLock::new(None),
                code_context: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Creates a child scope chaining to `self`.
    pub fn child(&self) -> Self {
        self.child_inner(self.inner.package.clone(), self.inner.file.clone())
    }

    /// Creates a child scope under a different package and file; used to
    /// enter user code from the builtin globals.
    pub fn child_in(&self, package: impl Into<Arc<str>>, file: impl Into<Arc<str>>) -> Self {
        self.child_inner(package.into(), file.into())
    }

    fn child_inner(&self, package: Arc<str>, file: Arc<str>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent: Some(self.clone()),
                bindings: RwLock::new(AHashMap::new()),
                consts: RwLock::new(AHashSet::new()),
                package,
                file,
                line_col: RwLock::new(*self.inner.line_col.read()),
                defers: Mutex::new(Vec::new()),
                source_lines: RwLock::new(None),
                code_context: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn package(&self) -> &str {
        &self.inner.package
    }

    pub fn file(&self) -> &str {
        &self.inner.file
    }

    /// Declares a binding in this scope.
    ///
    /// Fails with StateError when the name is already a `const` here, or
    /// when attempting to bind the reserved name `this`.
    pub fn define(&self, name: &str, value: Value, kind: DeclKind) -> RunResult<()> {
        if name == "this" {
            return Err(Exception::state_error("'this' is a reserved binding"));
        }
        if self.inner.consts.read().contains(name) {
            return Err(Exception::state_error(format!(
                "cannot redeclare const '{name}'"
            )));
        }
        self.inner.bindings.write().insert(name.to_owned(), value);
        if kind == DeclKind::Const {
            self.inner.consts.write().insert(name.to_owned());
        }
        Ok(())
    }

    /// Binds the receiver for a method or constructor body.
    pub(crate) fn bind_this(&self, value: Value) {
        self.inner.bindings.write().insert("this".to_owned(), value);
    }

    /// Binds a name without the declaration checks; used for parameters
    /// and the runtime's own context bindings.
    pub(crate) fn bind_internal(&self, name: &str, value: Value) {
        self.inner.bindings.write().insert(name.to_owned(), value);
    }

    /// Reads a name, walking the chain upward.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut cur = Some(self);
        while let Some(scope) = cur {
            if let Some(v) = scope.inner.bindings.read().get(name) {
                return Some(v.clone());
            }
            cur = scope.inner.parent.as_ref();
        }
        None
    }

    /// True when `name` resolves somewhere on the chain.
    pub fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Reassigns an existing binding, walking the chain to the declaring
    /// scope. Fails with StateError for const names and NameError when the
    /// name was never declared.
    pub fn set(&self, name: &str, value: Value) -> RunResult<()> {
        let mut cur = Some(self);
        while let Some(scope) = cur {
            if scope.inner.bindings.read().contains_key(name) {
                if scope.inner.consts.read().contains(name) {
                    return Err(Exception::state_error(format!(
                        "cannot reassign const '{name}'"
                    )));
                }
                scope.inner.bindings.write().insert(name.to_owned(), value);
                return Ok(());
            }
            cur = scope.inner.parent.as_ref();
        }
        Err(Exception::name_error(name))
    }

    /// All names visible from this scope, innermost first, deduplicated.
    pub fn visible_names(&self) -> Vec<String> {
        let mut seen = AHashSet::new();
        let mut out = Vec::new();
        let mut cur = Some(self);
        while let Some(scope) = cur {
            for name in scope.inner.bindings.read().keys() {
                if seen.insert(name.clone()) {
                    out.push(name.clone());
                }
            }
            cur = scope.inner.parent.as_ref();
        }
        out
    }

    /// Queues a deferred thunk on this scope.
    pub fn push_defer(&self, thunk: DeferThunk) {
        self.inner.defers.lock().push(thunk);
    }

    /// Drains the defer stack in registration order; the caller runs the
    /// thunks in reverse (LIFO).
    pub fn take_defers(&self) -> Vec<DeferThunk> {
        std::mem::take(&mut *self.inner.defers.lock())
    }

    /// Records the position of the statement currently executing.
    pub fn set_position(&self, line: u32, col: u32) {
        *self.inner.line_col.write() = (line, col);
    }

    /// The current source position of this scope.
    pub fn pos(&self) -> Pos {
        let (line, col) = *self.inner.line_col.read();
        Pos {
            file: self.inner.file.clone(),
            line,
            col,
        }
    }

    /// Installs the source text used for hint generation. Lines are
    /// addressed 1-based.
    pub fn set_source_lines(&self, lines: Vec<String>) {
        *self.inner.source_lines.write() = Some(Arc::new(lines));
    }

    /// Looks up a 1-based source line, walking the chain to the scope that
    /// holds the source text.
    pub fn source_line(&self, line: u32) -> Option<String> {
        let mut cur = Some(self);
        while let Some(scope) = cur {
            if let Some(lines) = scope.inner.source_lines.read().as_ref() {
                return lines.get(line.saturating_sub(1) as usize).cloned();
            }
            cur = scope.inner.parent.as_ref();
        }
        None
    }

    /// Appends a line to the recent-code buffer.
    pub fn note_context(&self, line: impl Into<String>) {
        let mut buf = self.inner.code_context.lock();
        if buf.len() == CODE_CONTEXT_LINES {
            buf.pop_front();
        }
        buf.push_back(line.into());
    }

    /// The recent-code buffer, oldest first.
    pub fn code_context(&self) -> Vec<String> {
        self.inner.code_context.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_bindings_but_not_vice_versa() {
        let root = Scope::new_root("main", "test.rl");
        root.define("x", Value::Int(1), DeclKind::Let).unwrap();

        let child = root.child();
        child.define("y", Value::Int(2), DeclKind::Let).unwrap();

        assert!(matches!(child.get("x"), Some(Value::Int(1))));
        assert!(matches!(child.get("y"), Some(Value::Int(2))));
        assert!(root.get("y").is_none());
    }

    #[test]
    fn assignment_walks_to_declaring_scope() {
        let root = Scope::new_root("main", "test.rl");
        root.define("x", Value::Int(1), DeclKind::Var).unwrap();

        let child = root.child();
        child.set("x", Value::Int(5)).unwrap();
        assert!(matches!(root.get("x"), Some(Value::Int(5))));
    }

    #[test]
    fn assignment_to_undeclared_name_is_a_name_error() {
        let root = Scope::new_root("main", "test.rl");
        let err = root.set("missing", Value::Nil).unwrap_err();
        assert_eq!(err.kind, crate::exceptions::ExcKind::NameError);
    }

    #[test]
    fn const_blocks_redeclaration_and_reassignment() {
        let root = Scope::new_root("main", "test.rl");
        root.define("k", Value::Int(1), DeclKind::Const).unwrap();

        let err = root.define("k", Value::Int(2), DeclKind::Let).unwrap_err();
        assert_eq!(err.kind, crate::exceptions::ExcKind::StateError);

        let err = root.set("k", Value::Int(2)).unwrap_err();
        assert_eq!(err.kind, crate::exceptions::ExcKind::StateError);
    }

    #[test]
    fn shadowing_a_parent_const_in_a_child_is_allowed() {
        let root = Scope::new_root("main", "test.rl");
        root.define("k", Value::Int(1), DeclKind::Const).unwrap();

        let child = root.child();
        child.define("k", Value::Int(2), DeclKind::Let).unwrap();
        assert!(matches!(child.get("k"), Some(Value::Int(2))));
        assert!(matches!(root.get("k"), Some(Value::Int(1))));
    }

    #[test]
    fn this_is_reserved() {
        let root = Scope::new_root("main", "test.rl");
        let err = root.define("this", Value::Nil, DeclKind::Let).unwrap_err();
        assert_eq!(err.kind, crate::exceptions::ExcKind::StateError);
    }

    #[test]
    fn source_lines_resolve_through_the_chain() {
        let root = Scope::new_root("main", "test.rl");
        root.set_source_lines(vec!["first".to_owned(), "second".to_owned()]);

        let child = root.child().child();
        assert_eq!(child.source_line(2).as_deref(), Some("second"));
        assert_eq!(child.source_line(9), None);
    }
}
