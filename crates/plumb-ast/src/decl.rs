// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Top-level declarations and the file node.

use crate::{Ident, NodeId, Span};
use crate::expr::Expr;
use crate::stmt::Block;
use crate::types::{FuncSig, Param, TypeExpr};

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub package: Ident,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl File {
    /// All import specs in declaration order.
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls.iter().flat_map(|d| match &d.kind {
            DeclKind::Import(group) => group.specs.as_slice(),
            _ => &[],
        })
    }

    /// The first parenthesized `import ( ... )` block, if any.
    pub fn import_block(&self) -> Option<&ImportGroup> {
        self.decls.iter().find_map(|d| match &d.kind {
            DeclKind::Import(group) if group.lparen.is_some() => Some(group),
            _ => None,
        })
    }

    /// All function and method declarations.
    pub fn funcs(&self) -> impl Iterator<Item = (&Decl, &FuncDecl)> {
        self.decls.iter().filter_map(|d| match &d.kind {
            DeclKind::Func(f) => Some((d, f)),
            _ => None,
        })
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub id: NodeId,
    pub kind: DeclKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Import(ImportGroup),
    Func(FuncDecl),
    Type(Vec<TypeSpec>),
    Var(Vec<ValueSpec>),
    Const(Vec<ValueSpec>),
}

/// `import "p"` or `import ( ... )`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportGroup {
    /// Byte offset of `(` for the grouped form.
    pub lparen: Option<usize>,
    pub specs: Vec<ImportSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub id: NodeId,
    pub alias: Option<Ident>,
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// The name the import binds in the file: the alias, or the last path segment.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => &alias.name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// A function or method declaration. Stub files may omit the body.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: Ident,
    pub recv: Option<Param>,
    pub sig: FuncSig,
    pub body: Option<Block>,
}

/// `Name T` or `Name = T` inside a `type` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    pub ty: TypeExpr,
    pub alias: bool,
}

/// `a, b T = x, y` inside a `var` or `const` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub id: NodeId,
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}
