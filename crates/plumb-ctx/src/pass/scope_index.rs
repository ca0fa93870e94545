// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Maps scopes back to the function or closure that opened them.

use std::collections::HashMap;

use plumb_ast::decl::{DeclKind, FuncDecl};
use plumb_ast::types::FuncSig;
use plumb_ast::NodeId;
use plumb_resolve::{Package, PackageInfo, ScopeId, ScopeKind, SymbolId};

/// A function declaration of the package.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FuncRef<'p> {
    pub file: usize,
    pub func: &'p FuncDecl,
    pub symbol: SymbolId,
}

/// What opened a function-like scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    /// A function declaration, by `Decl.id`.
    Func(NodeId),
    /// A function literal, by its `Expr.id`.
    Closure(NodeId),
}

pub(crate) struct ScopeIndex<'p> {
    funcs: HashMap<NodeId, FuncRef<'p>>,
    closures: HashMap<NodeId, &'p FuncSig>,
    owners: HashMap<ScopeId, Owner>,
}

impl<'p> ScopeIndex<'p> {
    pub fn new(pkg: &'p Package, info: &PackageInfo) -> Self {
        let owners = info
            .scopes
            .iter()
            .filter_map(|scope| match (scope.kind, scope.owner) {
                (ScopeKind::Function, Some(id)) => Some((scope.id, Owner::Func(id))),
                (ScopeKind::Closure, Some(id)) => Some((scope.id, Owner::Closure(id))),
                _ => None,
            })
            .collect();

        let mut funcs = HashMap::new();
        for (file, source) in pkg.files.iter().enumerate() {
            for decl in &source.ast.decls {
                let DeclKind::Func(func) = &decl.kind else { continue };
                if let Some(&symbol) = info.defs.get(&func.name.id) {
                    funcs.insert(decl.id, FuncRef { file, func, symbol });
                }
            }
        }

        Self { funcs, closures: HashMap::new(), owners }
    }

    /// Record the signature of a function literal met while walking.
    pub fn add_closure(&mut self, id: NodeId, sig: &'p FuncSig) {
        self.closures.insert(id, sig);
    }

    pub fn func(&self, decl: NodeId) -> Option<FuncRef<'p>> {
        self.funcs.get(&decl).copied()
    }

    pub fn owner(&self, scope: ScopeId) -> Option<Owner> {
        self.owners.get(&scope).copied()
    }

    /// Parameters of the function or closure owning `scope`.
    pub fn signature(&self, owner: Owner) -> Option<&'p FuncSig> {
        match owner {
            Owner::Func(id) => self.funcs.get(&id).map(|f| &f.func.sig),
            Owner::Closure(id) => self.closures.get(&id).copied(),
        }
    }
}
