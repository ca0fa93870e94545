// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Name resolution and lightweight type checking for plumb.
//!
//! Packages are discovered and parsed by the [`PackageRegistry`], then
//! [`Program::check`] resolves every identifier to a [`Symbol`], builds the
//! lexical [`ScopeTree`] of each package and infers the static types of
//! parameters and locals. The context-plumbing pass only queries the result.

mod error;
mod scope;
mod symbol;
mod types;
mod checker;
mod stubs;
pub mod package;

pub use error::{ResolveError, ResolveErrorKind};
pub use scope::{Binding, Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbol::{FuncInfo, Symbol, SymbolId, SymbolKind, SymbolTable};
pub use types::{InterfaceType, ParamInfo, Signature, StructField, Type};
pub use package::{Package, PackageError, PackageId, PackageRegistry, SourceFile};

use std::collections::HashMap;

use plumb_ast::NodeId;

/// Resolution results for one package.
#[derive(Debug, Default)]
pub struct PackageInfo {
    /// Identifier uses (including selector names) to the symbol they denote.
    pub uses: HashMap<NodeId, SymbolId>,
    /// Declaring identifiers to the symbol they introduce.
    pub defs: HashMap<NodeId, SymbolId>,
    /// Lexical scopes of the package, its files and every function body.
    pub scopes: ScopeTree,
    /// Scope opened by a node: function decls, function literals, blocks,
    /// `if` and `for` statements.
    pub node_scopes: HashMap<NodeId, ScopeId>,
    /// File scope of each source file, by file index.
    pub file_scopes: Vec<ScopeId>,
    /// Static type of every parameter, named or not, keyed by `Param.id`.
    pub param_types: HashMap<NodeId, Type>,
    /// Package-level declarations by name.
    pub members: HashMap<String, SymbolId>,
    pub errors: Vec<ResolveError>,
}

/// A checked set of packages sharing one symbol table.
#[derive(Debug)]
pub struct Program {
    registry: PackageRegistry,
    pub symbols: SymbolTable,
    infos: Vec<PackageInfo>,
    order: Vec<PackageId>,
    universe: HashMap<String, SymbolId>,
}

impl Program {
    /// Check every package of the registry in dependency order.
    pub fn check(registry: PackageRegistry) -> Result<Program, PackageError> {
        let order = registry.topological_order()?;
        let mut symbols = SymbolTable::new();
        let universe = checker::declare_universe(&mut symbols);

        let mut infos: Vec<Option<PackageInfo>> = (0..registry.len()).map(|_| None).collect();
        for &id in &order {
            let Some(pkg) = registry.get(id) else { continue };
            let info = checker::Checker::new(&mut symbols, &universe, &registry, &infos, pkg).check();
            if !info.errors.is_empty() {
                tracing::debug!(package = %pkg.path, errors = info.errors.len(), "resolution errors");
            }
            infos[id.0 as usize] = Some(info);
        }

        Ok(Program {
            registry,
            symbols,
            infos: infos.into_iter().map(Option::unwrap_or_default).collect(),
            order,
            universe,
        })
    }

    /// Packages in dependency order: every package follows its imports.
    pub fn order(&self) -> &[PackageId] {
        &self.order
    }

    pub fn package(&self, id: PackageId) -> Option<&Package> {
        self.registry.get(id)
    }

    pub fn info(&self, id: PackageId) -> Option<&PackageInfo> {
        self.infos.get(id.0 as usize)
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// Look up a package-level declaration by import path and name.
    pub fn lookup_member(&self, path: &str, name: &str) -> Option<SymbolId> {
        let id = self.registry.lookup(path)?;
        self.info(id)?.members.get(name).copied()
    }

    /// Look up a predeclared identifier such as `error` or `len`.
    pub fn lookup_universe(&self, name: &str) -> Option<SymbolId> {
        self.universe.get(name).copied()
    }

    /// Method set lookup on named types and pointers to them.
    pub fn concrete_method(&self, ty: &Type, name: &str) -> Option<SymbolId> {
        types::concrete_method(&self.symbols, ty, name)
    }

    /// Whether `ty` is the named type `path.name`.
    pub fn is_named(&self, ty: &Type, path: &str, name: &str) -> bool {
        match ty {
            Type::Named(id) => self
                .symbols
                .get(*id)
                .map(|s| s.name == name && s.pkg.as_deref() == Some(path))
                .unwrap_or(false),
            _ => false,
        }
    }
}
