// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement nodes.

use crate::{Ident, NodeId, Span};
use crate::decl::{TypeSpec, ValueSpec};
use crate::expr::Expr;

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

/// A braced statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    /// Byte offset of `{`.
    pub lbrace: usize,
    /// Byte offset of `}`.
    pub rbrace: usize,
    pub stmts: Vec<Stmt>,
}

/// The kind of statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    /// `a, b := x, y`
    Define { names: Vec<Ident>, values: Vec<Expr> },
    /// `a, b = x, y` and compound forms `a += x`
    Assign { targets: Vec<Expr>, op: AssignOp, values: Vec<Expr> },
    /// `x++` / `x--`
    IncDec { target: Expr, inc: bool },
    /// `ch <- v`
    Send { chan: Expr, value: Expr },
    Var(Vec<ValueSpec>),
    Const(Vec<ValueSpec>),
    Type(Vec<TypeSpec>),
    Return(Vec<Expr>),
    If(IfStmt),
    /// Three-clause, condition-only and infinite loops.
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    /// `for k, v := range x { }`
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        iterable: Expr,
        body: Block,
    },
    Block(Block),
    Defer(Expr),
    Go(Expr),
    Break(Option<String>),
    Continue(Option<String>),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    /// Either another `If` statement or a `Block` statement.
    pub els: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}
