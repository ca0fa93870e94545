// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression nodes.

use crate::{Ident, NodeId, Span};
use crate::stmt::Block;
use crate::types::{FuncSig, TypeExpr};

/// An expression in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(String),
    Float(String),
    String(String),
    Char(char),
    /// A name use; the resolver keys the use on the expression's id.
    Ident(String),
    /// `x.sel`, also used for qualified identifiers `pkg.Name`.
    Selector { base: Box<Expr>, sel: Ident },
    /// `func(args)`
    Call(CallExpr),
    /// `x[i]`
    Index { base: Box<Expr>, index: Box<Expr> },
    /// `x[lo:hi]`
    Slice { base: Box<Expr>, lo: Option<Box<Expr>>, hi: Option<Box<Expr>> },
    /// `x.(T)`
    TypeAssert { base: Box<Expr>, ty: TypeExpr },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    Paren(Box<Expr>),
    /// `func(params) results { body }`
    FuncLit { sig: FuncSig, body: Block },
    /// `T{elems}`; the type is absent for elided inner literals.
    Composite { ty: Option<TypeExpr>, elems: Vec<Element> },
    /// A type in expression position: `[]byte(s)`, `make(map[K]V)`.
    Type(TypeExpr),
}

/// A call expression with the positions needed to insert arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
    /// Byte offset of `(`.
    pub lparen: usize,
    /// Byte offset of `)`.
    pub rparen: usize,
    /// Trailing `...` on the last argument.
    pub spread: bool,
}

/// An element of a composite literal, optionally keyed.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Deref,
    Addr,
    Recv,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    AndNot,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn yields_bool(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::And | BinOp::Or
        )
    }
}

impl Expr {
    /// The call node if this expression is a call.
    pub fn as_call(&self) -> Option<&CallExpr> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Strips any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }
}
