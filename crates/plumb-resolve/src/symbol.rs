// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Symbol definitions and symbol table.

use plumb_ast::Span;

use crate::package::PackageId;
use crate::types::{Signature, Type};

/// Unique identifier for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Function or method details.
#[derive(Debug, Clone)]
pub struct FuncInfo {
    pub sig: Signature,
    /// Receiver type for methods.
    pub recv: Option<Type>,
    /// Stable identity: `path.Name` for functions, `path.Recv.Name` for methods.
    pub key: String,
    /// Whether the declaration has a body (stubs don't).
    pub has_body: bool,
}

/// The kind of symbol.
#[derive(Debug, Clone)]
pub enum SymbolKind {
    /// An imported package, bound in a file scope.
    Package { id: PackageId, path: String },
    Func(FuncInfo),
    /// A variable; `param` is set for parameters and receivers.
    Var { ty: Type, param: bool },
    Const { ty: Type },
    TypeName {
        underlying: Type,
        /// Methods declared with this type as receiver base.
        methods: Vec<(String, SymbolId)>,
    },
    /// Predeclared functions like `len` and `make`.
    Builtin,
}

/// A declared symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Import path of the declaring package; `None` for predeclared names.
    pub pkg: Option<String>,
    /// Where this symbol was declared.
    pub span: Span,
}

impl Symbol {
    pub fn is_exported(&self) -> bool {
        plumb_ast::is_exported(&self.name)
    }

    pub fn as_func(&self) -> Option<&FuncInfo> {
        match &self.kind {
            SymbolKind::Func(info) => Some(info),
            _ => None,
        }
    }

    /// Type of a value symbol; `None` for packages, types and builtins.
    pub fn value_type(&self) -> Option<Type> {
        match &self.kind {
            SymbolKind::Var { ty, .. } | SymbolKind::Const { ty } => Some(ty.clone()),
            SymbolKind::Func(info) => Some(Type::Func(Box::new(info.sig.clone()))),
            _ => None,
        }
    }
}

/// Table of all symbols in a program.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { symbols: Vec::new() }
    }

    /// Insert a new symbol and return its ID.
    pub fn insert(&mut self, name: String, kind: SymbolKind, pkg: Option<String>, span: Span) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol { id, name, kind, pkg, span });
        id
    }

    /// Get a symbol by ID.
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    /// Get a mutable reference to a symbol by ID.
    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
