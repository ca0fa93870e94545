// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Syntax tree types for the Go-style sources plumb rewrites.
//!
//! This crate defines the nodes shared between the lexer, parser,
//! resolver and the context-plumbing pass. Every node that a later
//! phase needs to refer back to carries a `NodeId`; every node that an
//! edit may target carries byte offsets into its file.

pub mod span;
pub mod token;
pub mod types;
pub mod expr;
pub mod stmt;
pub mod decl;

pub use span::{Span, LineMap};

/// Unique identifier for syntax nodes within one compilation unit.
///
/// Used by the resolver to attach symbols and scopes to nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const DUMMY: NodeId = NodeId(u32::MAX);
}

/// A name occurrence in the source, either declaring or referring.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

impl Ident {
    /// The blank identifier `_`.
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    /// Exported names start with an uppercase letter.
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

/// Whether a name is visible outside its package.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}
