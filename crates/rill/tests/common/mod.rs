//! Shared helpers for building programs against the parser contract.
#![allow(dead_code)]

use rill::ast::{
    AssignTarget, BinOp, CatchClause, ClassDecl, DeclKind, Expr, ExprNode, FieldDecl, FuncLit,
    Literal, MethodDecl, ParamSpec, Pos, SelectCase, Stmt, StmtNode,
};
use rill::types::{AccessLevel, Modifiers, TypeDesc};
use rill::{CollectPrint, Exception, Interp, NoPrint, Value};

pub fn pos(line: u32) -> Pos {
    Pos::new("test.rl", line, 1)
}

pub fn stmt(s: Stmt) -> StmtNode {
    StmtNode::new(s, pos(1))
}

pub fn stmt_at(s: Stmt, line: u32) -> StmtNode {
    StmtNode::new(s, pos(line))
}

pub fn e(x: Expr) -> ExprNode {
    ExprNode::new(x, pos(1))
}

pub fn e_at(x: Expr, line: u32) -> ExprNode {
    ExprNode::new(x, pos(line))
}

// ---- expressions ---------------------------------------------------------

pub fn nil() -> ExprNode {
    e(Expr::Literal(Literal::Nil))
}

pub fn int(v: i64) -> ExprNode {
    e(Expr::Literal(Literal::Int(v)))
}

pub fn float(v: f64) -> ExprNode {
    e(Expr::Literal(Literal::Float(v)))
}

pub fn boolean(v: bool) -> ExprNode {
    e(Expr::Literal(Literal::Bool(v)))
}

pub fn str_(v: &str) -> ExprNode {
    e(Expr::Literal(Literal::Str(v.to_owned())))
}

pub fn ident(name: &str) -> ExprNode {
    e(Expr::Ident(name.to_owned()))
}

pub fn call(callee: ExprNode, args: Vec<ExprNode>) -> ExprNode {
    e(Expr::Call {
        callee: Box::new(callee),
        args,
    })
}

pub fn call_name(name: &str, args: Vec<ExprNode>) -> ExprNode {
    call(ident(name), args)
}

pub fn method(object: ExprNode, name: &str, args: Vec<ExprNode>) -> ExprNode {
    e(Expr::MethodCall {
        object: Box::new(object),
        method: name.to_owned(),
        args,
    })
}

pub fn field(object: ExprNode, name: &str) -> ExprNode {
    e(Expr::FieldAccess {
        object: Box::new(object),
        field: name.to_owned(),
    })
}

pub fn index(object: ExprNode, key: ExprNode) -> ExprNode {
    e(Expr::Index {
        object: Box::new(object),
        index: Box::new(key),
    })
}

pub fn slice(object: ExprNode, start: ExprNode, end: ExprNode) -> ExprNode {
    e(Expr::Slice {
        object: Box::new(object),
        start: Box::new(start),
        end: Box::new(end),
    })
}

pub fn binop(op: BinOp, lhs: ExprNode, rhs: ExprNode) -> ExprNode {
    e(Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

pub fn add(lhs: ExprNode, rhs: ExprNode) -> ExprNode {
    binop(BinOp::Add, lhs, rhs)
}

pub fn array_lit(items: Vec<ExprNode>) -> ExprNode {
    e(Expr::ArrayLit(items))
}

pub fn map_lit(pairs: Vec<(ExprNode, ExprNode)>) -> ExprNode {
    e(Expr::MapLit(pairs))
}

pub fn range_lit(start: ExprNode, end: ExprNode) -> ExprNode {
    e(Expr::RangeLit {
        start: Box::new(start),
        end: Box::new(end),
        step: None,
    })
}

pub fn this() -> ExprNode {
    e(Expr::This)
}

pub fn super_call(args: Vec<ExprNode>) -> ExprNode {
    e(Expr::Super { args })
}

/// A lambda whose body is a list of statements.
pub fn lambda(params: Vec<&str>, body: Vec<StmtNode>) -> ExprNode {
    e(Expr::Lambda(FuncLit::new(
        None,
        params.into_iter().map(ParamSpec::untyped).collect(),
        body,
    )))
}

/// A lambda whose body is a single expression.
pub fn lambda_expr(params: Vec<&str>, body: ExprNode) -> ExprNode {
    lambda(params, vec![stmt(Stmt::Expr(body))])
}

// ---- statements ----------------------------------------------------------

pub fn expr_stmt(x: ExprNode) -> StmtNode {
    stmt(Stmt::Expr(x))
}

pub fn let_(name: &str, init: ExprNode) -> StmtNode {
    stmt(Stmt::VarDecl {
        name: name.to_owned(),
        kind: DeclKind::Let,
        ty: None,
        init: Some(init),
    })
}

pub fn var_(name: &str, init: ExprNode) -> StmtNode {
    stmt(Stmt::VarDecl {
        name: name.to_owned(),
        kind: DeclKind::Var,
        ty: None,
        init: Some(init),
    })
}

pub fn const_(name: &str, init: ExprNode) -> StmtNode {
    stmt(Stmt::VarDecl {
        name: name.to_owned(),
        kind: DeclKind::Const,
        ty: None,
        init: Some(init),
    })
}

pub fn typed_let(name: &str, ty: TypeDesc, init: ExprNode) -> StmtNode {
    stmt(Stmt::VarDecl {
        name: name.to_owned(),
        kind: DeclKind::Let,
        ty: Some(ty),
        init: Some(init),
    })
}

pub fn assign(name: &str, value: ExprNode) -> StmtNode {
    stmt(Stmt::Assign {
        target: AssignTarget::Name(name.to_owned()),
        value,
    })
}

pub fn assign_field(object: ExprNode, name: &str, value: ExprNode) -> StmtNode {
    stmt(Stmt::Assign {
        target: AssignTarget::Field {
            object,
            field: name.to_owned(),
        },
        value,
    })
}

pub fn assign_index(object: ExprNode, key: ExprNode, value: ExprNode) -> StmtNode {
    stmt(Stmt::Assign {
        target: AssignTarget::Index { object, index: key },
        value,
    })
}

pub fn ret(value: Option<ExprNode>) -> StmtNode {
    stmt(Stmt::Return(value))
}

pub fn func_decl(name: &str, params: Vec<&str>, body: Vec<StmtNode>) -> StmtNode {
    stmt(Stmt::FuncDecl(FuncLit::new(
        Some(name.to_owned()),
        params.into_iter().map(ParamSpec::untyped).collect(),
        body,
    )))
}

pub fn println_of(arg: ExprNode) -> StmtNode {
    expr_stmt(call_name("println", vec![arg]))
}

pub fn throw_new(kind: &str, message: &str) -> StmtNode {
    stmt(Stmt::Throw(call_name(kind, vec![str_(message)])))
}

pub fn catch_clause(kind: Option<&str>, binding: &str, body: Vec<StmtNode>) -> CatchClause {
    CatchClause {
        kind: kind.map(str::to_owned),
        binding: binding.to_owned(),
        body,
    }
}

pub fn select_case(channel: ExprNode, binding: Option<&str>, body: Vec<StmtNode>) -> SelectCase {
    SelectCase {
        channel,
        binding: binding.map(str::to_owned),
        body,
    }
}

// ---- class declarations --------------------------------------------------

pub fn class_decl(name: &str) -> ClassDecl {
    ClassDecl {
        name: name.to_owned(),
        parent: None,
        interfaces: Vec::new(),
        is_abstract: false,
        access: AccessLevel::Public,
        type_params: Vec::new(),
        aliases: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
        constructors: Vec::new(),
    }
}

pub fn field_decl(name: &str, modifiers: Modifiers) -> FieldDecl {
    FieldDecl {
        name: name.to_owned(),
        ty: None,
        modifiers,
        init: None,
    }
}

pub fn method_decl(name: &str, params: Vec<ParamSpec>, body: Vec<StmtNode>) -> MethodDecl {
    MethodDecl {
        name: name.to_owned(),
        func: FuncLit::new(Some(name.to_owned()), params, body),
        modifiers: Modifiers::default(),
    }
}

/// An expression-bodied method: `def name(params) = expr`.
pub fn method_expr(name: &str, params: Vec<ParamSpec>, body: ExprNode) -> MethodDecl {
    method_decl(name, params, vec![stmt(Stmt::Expr(body))])
}

pub fn ctor(params: Vec<ParamSpec>, body: Vec<StmtNode>) -> FuncLit {
    FuncLit::new(Some("init".to_owned()), params, body)
}

pub fn p(name: &str) -> ParamSpec {
    ParamSpec::untyped(name)
}

pub fn pt(name: &str, ty: &str) -> ParamSpec {
    ParamSpec::typed(name, TypeDesc::builtin(ty))
}

// ---- runners -------------------------------------------------------------

/// Runs a program with output discarded.
pub fn run(program: Vec<StmtNode>) -> Result<Value, Exception> {
    Interp::with_printer(Box::new(NoPrint)).run(&program)
}

pub fn run_ok(program: Vec<StmtNode>) -> Value {
    match run(program) {
        Ok(v) => v,
        Err(e) => panic!("program failed: {e}"),
    }
}

pub fn run_err(program: Vec<StmtNode>) -> Exception {
    match run(program) {
        Ok(v) => panic!("program unexpectedly succeeded with {v:?}"),
        Err(e) => e,
    }
}

/// Runs a program, returning its result and the captured stdout.
pub fn run_capture(program: Vec<StmtNode>) -> (Result<Value, Exception>, String) {
    let collector = CollectPrint::new();
    let interp = Interp::with_printer(Box::new(collector.clone()));
    let result = interp.run(&program);
    (result, collector.output())
}

pub fn as_int(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        other => panic!("expected Int, got {other:?}"),
    }
}

pub fn as_str(v: &Value) -> String {
    match v {
        Value::Str(s) => s.to_string(),
        other => panic!("expected String, got {other:?}"),
    }
}

pub fn as_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        other => panic!("expected Bool, got {other:?}"),
    }
}
