//! AST data model for the Rill runtime.
//!
//! The parser is an external collaborator: it produces these nodes and hands
//! them to [`crate::Interp`]. Every statement and expression node carries a
//! source position so errors and stack traces can report `file:line:col`.

use std::sync::Arc;

use crate::types::{AccessLevel, GenericParam, Modifiers, TypeDesc};

/// A source position: file, 1-based line, 1-based column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pos {
    pub file: Arc<str>,
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(file: impl Into<Arc<str>>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col,
        }
    }

    /// A position for synthesized nodes that have no source location.
    pub fn synthetic() -> Self {
        Self::new("<builtin>", 0, 0)
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

/// A statement with its source position.
#[derive(Debug, Clone)]
pub struct StmtNode {
    pub stmt: Stmt,
    pub pos: Pos,
}

impl StmtNode {
    pub fn new(stmt: Stmt, pos: Pos) -> Self {
        Self { stmt, pos }
    }
}

/// An expression with its source position.
#[derive(Debug, Clone)]
pub struct ExprNode {
    pub expr: Expr,
    pub pos: Pos,
}

impl ExprNode {
    pub fn new(expr: Expr, pos: Pos) -> Self {
        Self { expr, pos }
    }
}

/// Declaration modifier for variable bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Var,
    Const,
}

/// A function or method parameter.
///
/// The last parameter of a signature may be variadic; excess call arguments
/// are collected into an Array bound to it.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub ty: Option<TypeDesc>,
    pub variadic: bool,
}

impl ParamSpec {
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            variadic: false,
        }
    }

    pub fn typed(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            variadic: false,
        }
    }

    pub fn variadic(name: impl Into<String>, ty: Option<TypeDesc>) -> Self {
        Self {
            name: name.into(),
            ty,
            variadic: true,
        }
    }
}

/// A function literal: shared by function declarations, methods,
/// constructors and lambdas.
///
/// The body is reference-counted so closures and spawned tasks can share it
/// without cloning statement trees.
#[derive(Debug, Clone)]
pub struct FuncLit {
    pub name: Option<String>,
    pub params: Vec<ParamSpec>,
    pub return_type: Option<TypeDesc>,
    pub body: Arc<Vec<StmtNode>>,
}

impl FuncLit {
    pub fn new(name: Option<String>, params: Vec<ParamSpec>, body: Vec<StmtNode>) -> Self {
        Self {
            name,
            params,
            return_type: None,
            body: Arc::new(body),
        }
    }

    pub fn with_return_type(mut self, ty: TypeDesc) -> Self {
        self.return_type = Some(ty);
        self
    }
}

/// A field declaration inside a class body.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Option<TypeDesc>,
    pub modifiers: Modifiers,
    pub init: Option<ExprNode>,
}

/// A method declaration inside a class body.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub func: FuncLit,
    pub modifiers: Modifiers,
}

/// A class declaration statement.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub is_abstract: bool,
    pub access: AccessLevel,
    pub type_params: Vec<GenericParam>,
    pub aliases: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub constructors: Vec<FuncLit>,
}

/// A method signature inside an interface declaration, optionally carrying
/// a default body.
#[derive(Debug, Clone)]
pub struct InterfaceMethodDecl {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub return_type: Option<TypeDesc>,
    pub default_body: Option<FuncLit>,
}

/// An interface declaration statement.
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub is_sealed: bool,
    pub permits: Vec<String>,
    pub type_params: Vec<GenericParam>,
    pub methods: Vec<InterfaceMethodDecl>,
}

/// A record declaration statement.
#[derive(Debug, Clone)]
pub struct RecordDecl {
    pub name: String,
    pub components: Vec<(String, Option<TypeDesc>)>,
    pub methods: Vec<MethodDecl>,
}

/// One `catch` clause of a try statement. An empty `kind` is a catch-all.
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// Declared exception kind (a class name), or `None` for catch-all.
    pub kind: Option<String>,
    /// Name the exception instance is bound to inside the clause.
    pub binding: String,
    pub body: Vec<StmtNode>,
}

/// One receive case of a select statement.
#[derive(Debug, Clone)]
pub struct SelectCase {
    /// Expression evaluating to the channel to receive from.
    pub channel: ExprNode,
    /// Name the received value is bound to, if any.
    pub binding: Option<String>,
    pub body: Vec<StmtNode>,
}

/// Assignment target: a plain name, an object field, or an index slot.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    Name(String),
    Field { object: ExprNode, field: String },
    Index { object: ExprNode, index: ExprNode },
}

/// Statements.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `let`/`var`/`const` declaration, optionally type-annotated.
    VarDecl {
        name: String,
        kind: DeclKind,
        ty: Option<TypeDesc>,
        init: Option<ExprNode>,
    },
    FuncDecl(FuncLit),
    ClassDecl(ClassDecl),
    InterfaceDecl(InterfaceDecl),
    EnumDecl { name: String, variants: Vec<String> },
    RecordDecl(RecordDecl),
    Expr(ExprNode),
    Assign { target: AssignTarget, value: ExprNode },
    /// `a, b = expr` — requires the value to decompose into matching pieces.
    Destructure { names: Vec<String>, value: ExprNode },
    If {
        cond: ExprNode,
        then_block: Vec<StmtNode>,
        else_block: Option<Vec<StmtNode>>,
    },
    While { cond: ExprNode, body: Vec<StmtNode> },
    Loop { body: Vec<StmtNode> },
    /// `for a, b in iterable { ... }` — one or more loop variables.
    ForIn {
        names: Vec<String>,
        iterable: ExprNode,
        body: Vec<StmtNode>,
    },
    Block(Vec<StmtNode>),
    Return(Option<ExprNode>),
    Break,
    Continue,
    Try {
        body: Vec<StmtNode>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<StmtNode>>,
    },
    Throw(ExprNode),
    /// Queue a block for execution when the enclosing scope exits.
    Defer(Vec<StmtNode>),
    Select {
        cases: Vec<SelectCase>,
        /// Body run when a chosen receive observes a closed, drained channel.
        closed: Option<Vec<StmtNode>>,
    },
    /// Spawn a concurrent task running the given call.
    Go(ExprNode),
}

/// Literal values.
#[derive(Debug, Clone)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Expressions.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    Binary {
        op: BinOp,
        lhs: Box<ExprNode>,
        rhs: Box<ExprNode>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<ExprNode>,
    },
    /// Call of an arbitrary callee expression (function, constructor,
    /// record definition, or lambda).
    Call {
        callee: Box<ExprNode>,
        args: Vec<ExprNode>,
    },
    /// Method call on a receiver, resolved by overload at runtime.
    MethodCall {
        object: Box<ExprNode>,
        method: String,
        args: Vec<ExprNode>,
    },
    FieldAccess {
        object: Box<ExprNode>,
        field: String,
    },
    Index {
        object: Box<ExprNode>,
        index: Box<ExprNode>,
    },
    Slice {
        object: Box<ExprNode>,
        start: Box<ExprNode>,
        end: Box<ExprNode>,
    },
    ArrayLit(Vec<ExprNode>),
    MapLit(Vec<(ExprNode, ExprNode)>),
    /// `a..b` / `a..b step s` — lazy, not materialized.
    RangeLit {
        start: Box<ExprNode>,
        end: Box<ExprNode>,
        step: Option<Box<ExprNode>>,
    },
    Lambda(FuncLit),
    This,
    /// Explicit super-constructor invocation; only valid as the first
    /// statement of a constructor body.
    Super { args: Vec<ExprNode> },
    /// Generic or plain instantiation: `new Box<Int>(x)`.
    New {
        class: Box<ExprNode>,
        type_args: Vec<TypeDesc>,
        args: Vec<ExprNode>,
    },
    /// Channel construction: `chan` / `chan(capacity)`.
    Channel { capacity: Option<Box<ExprNode>> },
}
