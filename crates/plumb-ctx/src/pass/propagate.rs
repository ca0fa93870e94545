// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Propagation: giving functions a context and passing it to calls.

use std::collections::HashSet;

use plumb_ast::NodeId;
use plumb_diagnostics::{Category, Diagnostic, TextEdit};
use tracing::{debug, info};

use super::{CallSite, Outcome, Plumber, Request};
use crate::entry;

pub(crate) const PLUMB: &str = "Plumb context";
pub(crate) const CONTINUE: &str = "Continue plumbing context";
pub(crate) const AMBIGUOUS: &str = "Non-context ctx parameter";
pub(crate) const FIX: &str = "Plumb context.Context";

impl<'p> Plumber<'p> {
    pub(crate) fn build_diagnostics(&mut self) {
        let requests = std::mem::take(&mut self.requests);
        for request in requests {
            let diag = self.rewrite_request(request);
            self.diagnostics.push(diag);
        }
        let continuations = std::mem::take(&mut self.continuations);
        for site in continuations {
            let mut seen = HashSet::new();
            let mut edits = Vec::new();
            self.ensure_context_for_call(site, &mut seen, &mut edits);
            let diag = Diagnostic::new(Category::Continuation, self.file_path(site.file), site.span, CONTINUE)
                .with_fix(FIX, edits);
            self.diagnostics.push(diag);
        }
    }

    fn rewrite_request(&mut self, request: Request<'p>) -> Diagnostic {
        let site = request.site;
        let file = self.file_path(site.file);
        let mut seen = HashSet::new();
        let mut edits = Vec::new();

        if let Some(start) = request.assign {
            if self.ensure_in_enclosing(site, &mut seen, &mut edits) == Outcome::Ready {
                let declared = site.decl.is_some_and(|decl| self.declared.contains(&decl));
                if request.blank && declared {
                    // `_ = ctx` keeps the declared local used
                    edits.push(TextEdit::replace(file, site.span, "ctx"));
                } else {
                    edits.push(TextEdit::delete(file, plumb_ast::Span::new(start, site.span.end)));
                }
            }
        } else if let Some(expr) = self.provider_at(site.file, site.scope, site.span.start) {
            edits.push(TextEdit::replace(file, site.span, expr));
        } else if self.ensure_in_enclosing(site, &mut seen, &mut edits) == Outcome::Ready {
            edits.push(TextEdit::replace(file, site.span, "ctx"));
        }

        Diagnostic::new(Category::Direct, file, site.span, PLUMB).with_fix(FIX, edits)
    }

    fn ensure_in_enclosing(&mut self, site: CallSite<'p>, seen: &mut HashSet<NodeId>, edits: &mut Vec<TextEdit>) -> Outcome {
        match site.decl {
            Some(decl) => self.ensure_context_in(decl, seen, edits),
            None => Outcome::Blocked,
        }
    }

    /// Make `ctx` available in the body of function `decl`.
    pub(super) fn ensure_context_in(
        &mut self,
        decl: NodeId,
        seen: &mut HashSet<NodeId>,
        edits: &mut Vec<TextEdit>,
    ) -> Outcome {
        if !seen.insert(decl) {
            return self.outcomes.get(&decl).copied().unwrap_or(Outcome::Ready);
        }
        if let Some(&outcome) = self.outcomes.get(&decl) {
            return outcome;
        }
        let Some(func) = self.index.func(decl) else { return Outcome::Blocked };
        let params = &func.func.sig.params.params;
        let key = self.program.symbol(func.symbol).and_then(|s| s.as_func()).map(|f| f.key.clone()).unwrap_or_default();

        if let Some(param) = params.iter().find(|p| p.name.as_ref().is_some_and(|n| n.name == "ctx")) {
            let is_context = self.info.param_types.get(&param.id).is_some_and(|ty| self.is_context(ty));
            if is_context {
                self.outcomes.insert(decl, Outcome::Ready);
                return Outcome::Ready;
            }
            let diag = Diagnostic::new(Category::Ambiguity, self.file_path(func.file), param.span, AMBIGUOUS);
            self.diagnostics.push(diag);
            self.outcomes.insert(decl, Outcome::Blocked);
            return Outcome::Blocked;
        }

        let source = &self.pkg.files[func.file];
        if let Some(kind) = entry::classify(self.pkg, source, func.func) {
            debug!(func = %key, ?kind, "creating root context in entry point");
            edits.extend(self.declare_ctx(func, "context.Background()"));
            edits.extend(self.import_context(func.file));
            self.declared.insert(decl);
            self.outcomes.insert(decl, Outcome::Ready);
            return Outcome::Ready;
        }

        if let Some(expr) = self.provider_param(func.file, &func.func.sig, &HashSet::new()) {
            edits.extend(self.declare_ctx(func, &expr));
            edits.extend(self.import_context(func.file));
            self.declared.insert(decl);
            self.outcomes.insert(decl, Outcome::Ready);
            return Outcome::Ready;
        }

        if params.iter().any(|p| p.name.is_none()) {
            debug!(func = %key, "cannot add a named context next to unnamed parameters");
            self.outcomes.insert(decl, Outcome::Blocked);
            return Outcome::Blocked;
        }

        info!(func = %key, "adding context parameter");
        let readonly = self.config.is_readonly(self.file_path(func.file));
        if func.func.name.is_exported() && !readonly {
            self.facts.export(&key);
        }
        edits.push(self.add_param(func));
        edits.extend(self.import_context(func.file));
        self.outcomes.insert(decl, Outcome::Ready);

        let callers = self.callers.get(&func.symbol).cloned().unwrap_or_default();
        for caller in callers {
            self.ensure_context_for_call(caller, seen, edits);
        }
        Outcome::Ready
    }

    /// Pass a context as the first argument of the call at `site`.
    pub(super) fn ensure_context_for_call(
        &mut self,
        site: CallSite<'p>,
        seen: &mut HashSet<NodeId>,
        edits: &mut Vec<TextEdit>,
    ) {
        let expr = match self.provider_at(site.file, site.scope, site.span.start) {
            Some(expr) => expr,
            None => match self.ensure_in_enclosing(site, seen, edits) {
                Outcome::Ready => "ctx".to_string(),
                Outcome::Blocked => {
                    edits.extend(self.import_context(site.file));
                    "context.TODO()".to_string()
                }
            },
        };
        edits.push(self.prepend_arg(site, &expr));
    }
}
