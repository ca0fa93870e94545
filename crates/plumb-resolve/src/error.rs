// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Resolution error types.

use std::path::PathBuf;

use plumb_ast::Span;
use thiserror::Error;

/// A name resolution error. Resolution continues after reporting one.
#[derive(Debug, Clone, Error)]
#[error("{}: {kind}", file.display())]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub file: PathBuf,
    pub span: Span,
}

impl ResolveError {
    pub fn undefined(name: String, file: PathBuf, span: Span) -> Self {
        Self { kind: ResolveErrorKind::Undefined { name }, file, span }
    }

    pub fn redeclared(name: String, file: PathBuf, span: Span, previous: Span) -> Self {
        Self { kind: ResolveErrorKind::Redeclared { name, previous }, file, span }
    }

    pub fn not_a_type(name: String, file: PathBuf, span: Span) -> Self {
        Self { kind: ResolveErrorKind::NotAType { name }, file, span }
    }

    pub fn unknown_import(path: String, file: PathBuf, span: Span) -> Self {
        Self { kind: ResolveErrorKind::UnknownImport { path }, file, span }
    }

    pub fn unknown_member(pkg: String, name: String, file: PathBuf, span: Span) -> Self {
        Self { kind: ResolveErrorKind::UnknownMember { pkg, name }, file, span }
    }
}

/// The kind of resolution error.
#[derive(Debug, Clone, Error)]
pub enum ResolveErrorKind {
    #[error("undefined: {name}")]
    Undefined { name: String },

    #[error("{name} redeclared in this block (previous declaration at {previous:?})")]
    Redeclared { name: String, previous: Span },

    #[error("{name} is not a type")]
    NotAType { name: String },

    #[error("could not import \"{path}\"")]
    UnknownImport { path: String },

    #[error("undefined: {pkg}.{name}")]
    UnknownMember { pkg: String, name: String },
}
