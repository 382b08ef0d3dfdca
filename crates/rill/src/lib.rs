//! The core runtime of the Rill scripting language.
//!
//! Rill is dynamically evaluated and statically declared: classes with
//! single inheritance and interfaces, generics with bounded parameters,
//! records, enums, overloaded methods, closures, structured exceptions
//! with typo hints, a deferred-cleanup construct, and channel/promise
//! concurrency. The parser is an external collaborator: it produces the
//! AST in [`ast`] and hands it to [`Interp`].
//!
//! ```
//! use rill::{Interp, ast::{Expr, ExprNode, Literal, Pos, Stmt, StmtNode}};
//!
//! let interp = Interp::new();
//! let pos = Pos::new("demo.rl", 1, 1);
//! let program = vec![StmtNode::new(
//!     Stmt::Expr(ExprNode::new(Expr::Literal(Literal::Int(40)), pos.clone())),
//!     pos,
//! )];
//! let value = interp.run(&program).unwrap();
//! assert_eq!(rill::display_value(&value), "40");
//! ```

pub mod args;
pub mod ast;
mod builtins;
pub mod concurrent;
mod dispatch;
mod eval;
pub mod exceptions;
pub mod hints;
mod io;
mod registry;
mod scope;
pub mod types;
pub mod value;

pub use crate::{
    args::Args,
    ast::Pos,
    eval::Interp,
    exceptions::{ExcKind, Exception, RunResult, StackFrame},
    hints::{Hint, HintKind},
    io::{CollectPrint, NoPrint, PrintWriter, StdPrint},
    registry::{BUILTIN_PACKAGE, Registry},
    scope::Scope,
    types::{
        AccessLevel, ClassBuilder, ClassDef, EnumDef, GenericParam, InterfaceBuilder,
        InterfaceDef, Modifiers, RecordDef, TypeDesc,
    },
    value::{Value, display_value, repr_value, value_eq},
};
