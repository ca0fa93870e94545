// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! State of one pass over one package.
//!
//! The pass runs in three steps: [`Plumber::build_call_graph`] walks every
//! function once and classifies calls, [`Plumber::build_diagnostics`]
//! rewrites each request and continuation, and [`Plumber::finish`] drops
//! diagnostics that would touch read-only source.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use plumb_ast::expr::CallExpr;
use plumb_ast::{NodeId, Span};
use plumb_diagnostics::Diagnostic;
use plumb_resolve::{Package, PackageInfo, Program, ScopeId, SymbolId, Type};

use crate::config::PassConfig;
use crate::facts::FactStore;

mod callgraph;
mod emit;
mod propagate;
mod provider;
mod scope_index;

use scope_index::ScopeIndex;

/// A call located in the package being rewritten.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallSite<'p> {
    /// Index of the file in the package.
    pub file: usize,
    /// Innermost scope containing the call.
    pub scope: ScopeId,
    /// Enclosing function declaration; `None` at package level.
    pub decl: Option<NodeId>,
    pub call: &'p CallExpr,
    pub span: Span,
}

/// A `context.TODO()` call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Request<'p> {
    pub site: CallSite<'p>,
    /// Start of a `ctx := context.TODO()` statement that is deleted
    /// rather than rewritten.
    pub assign: Option<usize>,
    /// The discarded binding is `_`.
    pub blank: bool,
}

/// Whether a function can supply `ctx` to its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Ready,
    /// The function cannot get a `ctx` without manual changes.
    Blocked,
}

pub(crate) struct Plumber<'p> {
    pub(super) program: &'p Program,
    pub(super) pkg: &'p Package,
    pub(super) info: &'p PackageInfo,
    pub(super) config: &'p PassConfig,
    pub(super) facts: &'p mut dyn FactStore,
    /// `context.TODO`.
    pub(super) todo: SymbolId,
    /// `context.Context`.
    pub(super) context: SymbolId,
    pub(super) index: ScopeIndex<'p>,

    pub(super) requests: Vec<Request<'p>>,
    pub(super) continuations: Vec<CallSite<'p>>,
    /// Calls to local functions, by callee.
    pub(super) callers: HashMap<SymbolId, Vec<CallSite<'p>>>,
    /// Calls whose target has no symbol, such as interface methods.
    pub(super) unknown: Vec<CallSite<'p>>,

    /// Functions already handled, by declaration.
    pub(super) outcomes: HashMap<NodeId, Outcome>,
    /// Functions that got a `ctx :=` declaration at the top of the body.
    pub(super) declared: HashSet<NodeId>,
    /// Files that import `context` or already got the import edit.
    pub(super) imported: HashSet<usize>,
    /// Unnamed parameters already reported.
    pub(super) named: HashSet<NodeId>,
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl<'p> Plumber<'p> {
    pub fn new(
        program: &'p Program,
        pkg: &'p Package,
        info: &'p PackageInfo,
        config: &'p PassConfig,
        facts: &'p mut dyn FactStore,
        todo: SymbolId,
        context: SymbolId,
    ) -> Self {
        let imported = pkg
            .files
            .iter()
            .enumerate()
            .filter(|(_, f)| f.import_paths().any(|p| p == "context"))
            .map(|(i, _)| i)
            .collect();

        Self {
            program,
            pkg,
            info,
            config,
            facts,
            todo,
            context,
            index: ScopeIndex::new(pkg, info),
            requests: Vec::new(),
            continuations: Vec::new(),
            callers: HashMap::new(),
            unknown: Vec::new(),
            outcomes: HashMap::new(),
            declared: HashSet::new(),
            imported,
            named: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(super) fn file_path(&self, file: usize) -> &'p Path {
        let pkg: &'p Package = self.pkg;
        pkg.files.get(file).map(|f| f.path.as_path()).unwrap_or(Path::new(""))
    }

    pub(super) fn source(&self, file: usize) -> &'p str {
        let pkg: &'p Package = self.pkg;
        pkg.files.get(file).map(|f| f.source.as_str()).unwrap_or("")
    }

    pub(super) fn is_context(&self, ty: &Type) -> bool {
        matches!(ty, Type::Named(id) if *id == self.context)
    }
}
