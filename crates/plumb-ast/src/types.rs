// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type expressions as written in source.

use crate::{Ident, NodeId, Span};
use crate::expr::Expr;

/// A type as written in a declaration, parameter list, or conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub id: NodeId,
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// `T`
    Name(Ident),
    /// `pkg.T`
    Qualified { pkg: Ident, name: Ident },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T` or `[...]T`
    Array { len: Option<Box<Expr>>, elem: Box<TypeExpr> },
    /// `map[K]V`
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    /// `chan T`, `<-chan T`, `chan<- T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    /// `func(params) results`
    Func(FuncSig),
    /// `interface { methods }`
    Interface(Vec<InterfaceElem>),
    /// `struct { fields }`
    Struct(Vec<FieldDecl>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// An entry of an interface type.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method { name: Ident, sig: FuncSig },
    Embedded(TypeExpr),
}

/// One line of a struct body: `a, b T`, or an embedded `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

/// A parameter or result list entry after grouping has been expanded.
///
/// `func(a, b int)` yields two params sharing a copy of the type
/// expression; `func(int)` yields one param without a name.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub id: NodeId,
    pub name: Option<Ident>,
    pub ty: TypeExpr,
    pub variadic: bool,
    pub span: Span,
}

/// A parenthesized parameter list with the positions of its delimiters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamList {
    /// Byte offset of `(`.
    pub lparen: usize,
    /// Byte offset of `)`.
    pub rparen: usize,
    pub params: Vec<Param>,
}

/// Parameters and results of a function or method.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncSig {
    pub params: ParamList,
    pub results: Vec<Param>,
}
