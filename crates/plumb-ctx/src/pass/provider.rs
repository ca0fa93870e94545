// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Finding a context already reachable at a position.

use std::collections::HashSet;

use plumb_ast::types::FuncSig;
use plumb_diagnostics::{Category, Diagnostic};
use plumb_resolve::{Binding, Program, Scope, ScopeId, ScopeKind, SymbolKind, Type};

use super::Plumber;

pub(crate) const NAME_PARAM: &str = "Name this param if you want plumber to use it";

/// How a value yields a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provides {
    /// The value is a `context.Context`.
    Direct,
    /// The value has a `Context() context.Context` method.
    Accessor,
}

impl Provides {
    fn expr(self, name: &str) -> String {
        match self {
            Provides::Direct => name.to_string(),
            Provides::Accessor => format!("{}.Context()", name),
        }
    }
}

impl<'p> Plumber<'p> {
    fn provides(&self, ty: &Type) -> Option<Provides> {
        if self.is_context(ty) {
            return Some(Provides::Direct);
        }
        let method = self.program.concrete_method(ty, "Context")?;
        let sig = &self.program.symbol(method)?.as_func()?.sig;
        match sig.results.as_slice() {
            [result] if sig.params.is_empty() && self.is_context(result) => Some(Provides::Accessor),
            _ => None,
        }
    }

    /// Context expression visible at offset `at` of `file`, searching from
    /// `scope` outward to the enclosing function declaration. Each function
    /// or closure on the way offers its parameters before its locals.
    pub(super) fn provider_at(&mut self, file: usize, scope: ScopeId, at: usize) -> Option<String> {
        let info = self.info;
        // Names bound in inner scopes hide outer providers
        let mut hidden: HashSet<String> = HashSet::new();
        let mut segment: Vec<&'p Scope> = Vec::new();
        for scope in info.scopes.ancestors(scope) {
            if matches!(scope.kind, ScopeKind::Package | ScopeKind::File) {
                break;
            }
            segment.push(scope);
            if !scope.is_function() {
                continue;
            }
            if let Some(expr) = self.provider_in(file, &segment, at, &mut hidden) {
                return Some(expr);
            }
            segment.clear();
        }
        None
    }

    /// Provider within one function: `segment` runs from the innermost
    /// block out to the function or closure scope.
    fn provider_in(&mut self, file: usize, segment: &[&'p Scope], at: usize, hidden: &mut HashSet<String>) -> Option<String> {
        let visible: Vec<Vec<&'p Binding>> = segment
            .iter()
            .map(|scope| scope.bindings.iter().filter(|b| b.visible_from <= at).collect())
            .collect();

        let owner = segment.last().and_then(|scope| self.index.owner(scope.id));
        if let Some(sig) = owner.and_then(|owner| self.index.signature(owner)) {
            let mut masked = hidden.clone();
            masked.extend(
                visible
                    .iter()
                    .flatten()
                    .filter(|b| self.local_var(b).is_some())
                    .map(|b| b.name.clone()),
            );
            if let Some(expr) = self.provider_param(file, sig, &masked) {
                return Some(expr);
            }
        }

        for bindings in &visible {
            for (i, binding) in bindings.iter().enumerate() {
                let shadowed = bindings[i + 1..].iter().any(|later| later.name == binding.name);
                if shadowed || hidden.contains(&binding.name) {
                    continue;
                }
                if let Some(provides) = self.local_var(binding).and_then(|ty| self.provides(ty)) {
                    return Some(provides.expr(&binding.name));
                }
            }
            hidden.extend(bindings.iter().map(|b| b.name.clone()));
        }
        None
    }

    /// Type of `binding` when it is a local variable rather than a parameter.
    fn local_var(&self, binding: &Binding) -> Option<&'p Type> {
        let program: &'p Program = self.program;
        match &program.symbol(binding.symbol)?.kind {
            SymbolKind::Var { ty, param: false } => Some(ty),
            _ => None,
        }
    }

    /// First parameter of `sig` that provides a context. Unnamed parameters
    /// that would qualify are reported and skipped.
    pub(super) fn provider_param(&mut self, file: usize, sig: &FuncSig, hidden: &HashSet<String>) -> Option<String> {
        for param in &sig.params.params {
            let Some(ty) = self.info.param_types.get(&param.id) else { continue };
            let Some(provides) = self.provides(ty) else { continue };
            match &param.name {
                None => {
                    if self.named.insert(param.id) {
                        let diag = Diagnostic::new(Category::Naming, self.file_path(file), param.span, NAME_PARAM);
                        self.diagnostics.push(diag);
                    }
                }
                Some(name) if name.is_blank() || hidden.contains(&name.name) => {}
                Some(name) => return Some(provides.expr(&name.name)),
            }
        }
        None
    }
}
