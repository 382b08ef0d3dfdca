//! Structured exception values and the builtin exception taxonomy.
//!
//! Every fallible runtime operation returns [`RunResult`], propagating an
//! [`Exception`]: a kind from the closed [`ExcKind`] taxonomy (or a
//! user-defined subclass of one), a message, the source position captured at
//! the raise site, an accumulated stack trace, an optional cause, and an
//! optional [`Hint`].

use std::fmt::{self, Write};
use std::sync::Arc;

use strum::{Display, EnumString, IntoStaticStr};

use crate::ast::Pos;
use crate::hints::Hint;
use crate::types::ClassDef;
use crate::value::Value;

/// Result type alias for operations that can raise a runtime exception.
pub type RunResult<T> = Result<T, Exception>;

/// Builtin exception kinds.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and
/// `Into<&'static str>` implementations; the string form matches the
/// variant name exactly (`ValueError` -> "ValueError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ExcKind {
    /// Root of the exception hierarchy; catches everything.
    Throwable,
    /// General runtime failure; parent of every concrete kind below.
    RuntimeError,

    // --- TypeError hierarchy ---
    TypeError,
    /// Wrong number of call arguments. Subclass of TypeError.
    ArityError,
    /// Failed value conversion. Subclass of TypeError.
    ConversionError,

    // --- Direct RuntimeError subclasses ---
    IndexError,
    StateError,
    NameError,
    AttributeError,
    ValueError,
    AccessError,
    InitializationError,
    NotImplementedError,
}

impl ExcKind {
    /// The direct parent kind, or `None` for the root.
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::Throwable => None,
            Self::RuntimeError => Some(Self::Throwable),
            Self::ArityError | Self::ConversionError => Some(Self::TypeError),
            _ => Some(Self::RuntimeError),
        }
    }

    /// Returns true if `self` would be caught by a handler declaring
    /// `handler_kind`.
    pub fn is_subclass_of(self, handler_kind: Self) -> bool {
        let mut cur = self;
        loop {
            if cur == handler_kind {
                return true;
            }
            match cur.parent() {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// Only these kinds may carry a hint.
    pub fn may_carry_hint(self) -> bool {
        matches!(self, Self::NameError | Self::AttributeError | Self::ValueError)
    }

    /// All kinds, in registration order (parents before children).
    pub fn all() -> &'static [Self] {
        &[
            Self::Throwable,
            Self::RuntimeError,
            Self::TypeError,
            Self::ArityError,
            Self::ConversionError,
            Self::IndexError,
            Self::StateError,
            Self::NameError,
            Self::AttributeError,
            Self::ValueError,
            Self::AccessError,
            Self::InitializationError,
            Self::NotImplementedError,
        ]
    }
}

/// One frame of an exception stack trace.
#[derive(Debug, Clone)]
pub struct StackFrame {
    /// Function or method name, e.g. `run` or `Point.scale`.
    pub name: String,
    pub pos: Option<Pos>,
}

/// A structured runtime exception.
#[derive(Debug, Clone)]
pub struct Exception {
    pub kind: ExcKind,
    /// The user-defined exception class, when thrown from a class that
    /// subclasses one of the builtin kinds.
    pub class: Option<Arc<ClassDef>>,
    pub message: String,
    /// Source position captured at the raise site.
    pub pos: Option<Pos>,
    pub stack: Vec<StackFrame>,
    pub cause: Option<Box<Exception>>,
    pub hint: Option<Hint>,
    /// The user-accessible exception object, materialized lazily when a
    /// catch clause binds the exception.
    pub payload: Option<Value>,
}

impl Exception {
    pub fn new(kind: ExcKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            class: None,
            message: message.into(),
            pos: None,
            stack: Vec::new(),
            cause: None,
            hint: None,
            payload: None,
        }
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::RuntimeError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::TypeError, message)
    }

    /// Arity failure for a named callable: `f() takes 2 arguments, got 3`.
    pub fn arity_error(name: &str, expected: usize, got: usize) -> Self {
        Self::new(
            ExcKind::ArityError,
            format!("{name}() takes {expected} argument{} but {got} {} given",
                if expected == 1 { "" } else { "s" },
                if got == 1 { "was" } else { "were" }),
        )
    }

    pub fn conversion_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::ConversionError, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::IndexError, message)
    }

    pub fn state_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::StateError, message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(ExcKind::NameError, format!("name '{name}' is not defined"))
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::AttributeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::ValueError, message)
    }

    pub fn access_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::AccessError, message)
    }

    pub fn initialization_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::InitializationError, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(ExcKind::NotImplementedError, message)
    }

    /// Stamps the raise-site position, keeping the first position on
    /// rethrow paths.
    pub fn at(mut self, pos: Pos) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos);
        }
        self
    }

    /// Associates the user-defined exception class this was thrown from.
    pub fn with_class(mut self, class: Arc<ClassDef>) -> Self {
        self.class = Some(class);
        self
    }

    /// Attaches a hint. Ignored for kinds that never carry hints.
    pub fn with_hint(mut self, hint: Hint) -> Self {
        if self.kind.may_carry_hint() {
            self.hint = Some(hint);
        }
        self
    }

    pub fn with_cause(mut self, cause: Exception) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Appends a function/method frame while unwinding through a call.
    pub fn push_frame(&mut self, name: impl Into<String>, pos: Option<Pos>) {
        self.stack.push(StackFrame {
            name: name.into(),
            pos,
        });
    }

    /// The name of the most specific class of this exception: the user
    /// class when present, the builtin kind otherwise.
    pub fn class_name(&self) -> &str {
        match &self.class {
            Some(class) => class.name(),
            None => self.kind.into(),
        }
    }

    /// Renders the stack trace, innermost frame first.
    pub fn format_stack(&self) -> String {
        let mut out = String::new();
        for frame in &self.stack {
            match &frame.pos {
                Some(pos) => {
                    let _ = writeln!(out, "  at {} ({pos})", frame.name);
                }
                None => {
                    let _ = writeln!(out, "  at {}", frame.name);
                }
            }
        }
        out
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pos) = &self.pos {
            write!(f, "{pos}: ")?;
        }
        write!(f, "{}: {}", self.class_name(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n{hint}")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "\ncaused by: {cause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_tree_transitivity() {
        assert!(ExcKind::ArityError.is_subclass_of(ExcKind::TypeError));
        assert!(ExcKind::ArityError.is_subclass_of(ExcKind::RuntimeError));
        assert!(ExcKind::ArityError.is_subclass_of(ExcKind::Throwable));
        assert!(ExcKind::ConversionError.is_subclass_of(ExcKind::TypeError));
        assert!(ExcKind::NameError.is_subclass_of(ExcKind::RuntimeError));
        assert!(!ExcKind::NameError.is_subclass_of(ExcKind::TypeError));
        assert!(!ExcKind::RuntimeError.is_subclass_of(ExcKind::TypeError));
        assert!(ExcKind::Throwable.is_subclass_of(ExcKind::Throwable));
    }

    #[test]
    fn every_kind_reaches_the_root() {
        for kind in ExcKind::all() {
            assert!(kind.is_subclass_of(ExcKind::Throwable), "{kind} must chain to Throwable");
        }
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in ExcKind::all() {
            let name: &'static str = (*kind).into();
            assert_eq!(ExcKind::from_str(name).unwrap(), *kind);
        }
    }

    #[test]
    fn hint_gating_by_kind() {
        assert!(ExcKind::NameError.may_carry_hint());
        assert!(ExcKind::AttributeError.may_carry_hint());
        assert!(ExcKind::ValueError.may_carry_hint());
        assert!(!ExcKind::TypeError.may_carry_hint());
        assert!(!ExcKind::RuntimeError.may_carry_hint());
        assert!(!ExcKind::StateError.may_carry_hint());
    }

    #[test]
    fn display_includes_position_and_kind() {
        let exc = Exception::state_error("cannot reassign const 'x'").at(Pos::new("main.rl", 3, 5));
        assert_eq!(exc.to_string(), "main.rl:3:5: StateError: cannot reassign const 'x'");
    }
}
