// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scope tree for name resolution.

use plumb_ast::{NodeId, Span};

use crate::symbol::SymbolId;

/// Unique identifier for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

/// The kind of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Package-level declarations of all files.
    Package,
    /// Imports of one file.
    File,
    /// Parameters and top-level body locals of a function or method.
    Function,
    /// Parameters and top-level body locals of a function literal.
    Closure,
    /// Nested blocks, `if` and `for` headers.
    Block,
}

/// A name bound in a scope.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub symbol: SymbolId,
    /// Offset from which the binding is in scope: the end of the declaring
    /// statement for locals, the start of the function for parameters.
    pub visible_from: usize,
}

/// A scope in the scope tree.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    /// The node that opened the scope: `Decl.id` of a function, `Expr.id`
    /// of a function literal, `Stmt.id` or `Block.id` for blocks.
    pub owner: Option<NodeId>,
    /// Index of the file the scope lies in; `None` for the package scope.
    pub file: Option<usize>,
    pub span: Span,
    /// Bindings in declaration order.
    pub bindings: Vec<Binding>,
}

impl Scope {
    /// The most recent binding of `name` in this scope.
    pub fn lookup_local(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| b.name == name)
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, ScopeKind::Function | ScopeKind::Closure)
    }
}

/// Tree of scopes for name lookup.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl ScopeTree {
    /// Create a new scope tree with a package scope.
    pub fn new() -> Self {
        let package = Scope {
            id: ScopeId(0),
            parent: None,
            kind: ScopeKind::Package,
            owner: None,
            file: None,
            span: Span::default(),
            bindings: Vec::new(),
        };
        Self {
            scopes: vec![package],
            current: ScopeId(0),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Push a new scope below the current one.
    pub fn push(&mut self, kind: ScopeKind, owner: Option<NodeId>, file: Option<usize>, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            parent: Some(self.current),
            kind,
            owner,
            file,
            span,
            bindings: Vec::new(),
        });
        self.current = id;
        id
    }

    /// Pop the current scope and return to parent.
    pub fn pop(&mut self) {
        if let Some(parent) = self.get(self.current).and_then(|s| s.parent) {
            self.current = parent;
        }
    }

    /// Make `id` the current scope; used to re-enter a file scope.
    pub fn enter(&mut self, id: ScopeId) {
        self.current = id;
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Scopes from `id` outward to the package scope.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = &Scope> {
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let scope = self.get(next?)?;
            next = scope.parent;
            Some(scope)
        })
    }

    /// Look up a name in the current scope chain.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.ancestors(self.current)
            .find_map(|scope| scope.lookup_local(name))
            .map(|b| b.symbol)
    }

    /// Binding of `name` in the current scope only.
    pub fn lookup_current(&self, name: &str) -> Option<&Binding> {
        self.get(self.current)?.lookup_local(name)
    }

    /// Define a name in the current scope.
    /// Shadowing is allowed - a new binding hides the previous one.
    pub fn define(&mut self, name: String, symbol: SymbolId, visible_from: usize) {
        let current = self.current.0 as usize;
        if let Some(scope) = self.scopes.get_mut(current) {
            scope.bindings.push(Binding { name, symbol, visible_from });
        }
    }

    /// Define a name in the package scope regardless of the current scope.
    pub fn define_package(&mut self, name: String, symbol: SymbolId) {
        self.scopes[0].bindings.push(Binding { name, symbol, visible_from: 0 });
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_binding_shadows_outer() {
        let mut tree = ScopeTree::new();
        tree.define_package("x".to_string(), SymbolId(1));
        tree.push(ScopeKind::Function, Some(NodeId(7)), Some(0), Span::new(0, 50));
        tree.define("x".to_string(), SymbolId(2), 10);
        assert_eq!(tree.lookup("x"), Some(SymbolId(2)));
        tree.pop();
        assert_eq!(tree.lookup("x"), Some(SymbolId(1)));
    }

    #[test]
    fn ancestors_walk_to_package_scope() {
        let mut tree = ScopeTree::new();
        let file = tree.push(ScopeKind::File, None, Some(0), Span::new(0, 100));
        let func = tree.push(ScopeKind::Function, Some(NodeId(3)), Some(0), Span::new(10, 90));
        let block = tree.push(ScopeKind::Block, Some(NodeId(4)), Some(0), Span::new(20, 30));

        let chain: Vec<_> = tree.ancestors(block).map(|s| s.id).collect();
        assert_eq!(chain, vec![block, func, file, ScopeId(0)]);
        assert!(tree.get(func).unwrap().is_function());
    }

    #[test]
    fn lookup_current_ignores_parents() {
        let mut tree = ScopeTree::new();
        tree.define_package("y".to_string(), SymbolId(5));
        tree.push(ScopeKind::Block, None, Some(0), Span::default());
        assert!(tree.lookup_current("y").is_none());
        assert_eq!(tree.lookup("y"), Some(SymbolId(5)));
    }
}
