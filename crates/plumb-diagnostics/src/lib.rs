// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Diagnostics and suggested fixes produced by plumb.
//!
//! A [`Diagnostic`] points at one location and carries zero or more
//! [`SuggestedFix`]es, each a set of [`TextEdit`]s that may span several
//! files. The CLI renders them with [`formatter`] or [`json`] and writes
//! them back to disk through [`apply`].

pub mod apply;
pub mod formatter;
pub mod json;

use std::fmt;
use std::path::PathBuf;

use plumb_ast::Span;
use serde::Serialize;

pub use apply::{apply_edits, edits_by_file, ApplyError};

// ============================================================================
// Core Types
// ============================================================================

/// Why a diagnostic was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A placeholder context request in the analyzed code.
    Direct,
    /// A call whose callee gained a context parameter in another unit.
    Continuation,
    /// An unnamed parameter that could otherwise provide a context.
    Naming,
    /// A `ctx` parameter that is not a context.
    Ambiguity,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Direct => "direct",
            Category::Continuation => "continuation",
            Category::Naming => "naming",
            Category::Ambiguity => "ambiguity",
        }
    }

    fn severity(&self) -> Severity {
        match self {
            Category::Direct | Category::Continuation | Category::Ambiguity => Severity::Warning,
            Category::Naming => Severity::Note,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// Replace `span` of `file` with `new_text`. Zero-width spans insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub file: PathBuf,
    pub span: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn insert(file: impl Into<PathBuf>, at: usize, text: impl Into<String>) -> Self {
        Self { file: file.into(), span: Span::point(at), new_text: text.into() }
    }

    pub fn replace(file: impl Into<PathBuf>, span: Span, text: impl Into<String>) -> Self {
        Self { file: file.into(), span, new_text: text.into() }
    }

    pub fn delete(file: impl Into<PathBuf>, span: Span) -> Self {
        Self { file: file.into(), span, new_text: String::new() }
    }
}

/// A named group of edits that together fix a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedFix {
    pub message: String,
    pub edits: Vec<TextEdit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub span: Span,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    pub fixes: Vec<SuggestedFix>,
}

// ============================================================================
// Builder API
// ============================================================================

impl Diagnostic {
    pub fn new(category: Category, file: impl Into<PathBuf>, span: Span, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            span,
            category,
            severity: category.severity(),
            message: message.into(),
            fixes: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach a fix. A fix without edits is dropped.
    pub fn with_fix(mut self, message: impl Into<String>, edits: Vec<TextEdit>) -> Self {
        if !edits.is_empty() {
            self.fixes.push(SuggestedFix { message: message.into(), edits });
        }
        self
    }

    /// All edits of all fixes.
    pub fn edits(&self) -> impl Iterator<Item = &TextEdit> {
        self.fixes.iter().flat_map(|f| f.edits.iter())
    }

    pub fn has_edits(&self) -> bool {
        self.edits().next().is_some()
    }
}

/// Order diagnostics by file and position.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.span.start.cmp(&b.span.start))
            .then(a.category.cmp(&b.category))
    });
}
