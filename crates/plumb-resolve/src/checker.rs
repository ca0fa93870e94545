// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Per-package resolution and type inference.
//!
//! The checker runs in phases so that package-level declarations can be
//! used before they appear:
//! 1. bind imports in file scopes and declare package members
//! 2. resolve the underlying types of type declarations
//! 3. resolve function signatures and attach methods to their receivers
//! 4. type package-level variables and constants
//! 5. walk function bodies, opening scopes and binding locals

use std::collections::HashMap;
use std::path::PathBuf;

use plumb_ast::decl::{DeclKind, FuncDecl, TypeSpec, ValueSpec};
use plumb_ast::expr::{CallExpr, Element, Expr, ExprKind, UnaryOp};
use plumb_ast::stmt::{Block, Stmt, StmtKind};
use plumb_ast::types::{FuncSig, InterfaceElem, TypeExpr, TypeExprKind};
use plumb_ast::{Ident, NodeId, Span};

use crate::error::ResolveError;
use crate::package::{Package, PackageId, PackageRegistry};
use crate::scope::ScopeKind;
use crate::symbol::{FuncInfo, SymbolId, SymbolKind, SymbolTable};
use crate::types::{self, InterfaceType, MethodRef, ParamInfo, Signature, StructField, Type};
use crate::PackageInfo;

const BASIC_TYPES: &[&str] = &[
    "bool", "byte", "rune", "string", "uintptr",
    "int", "int8", "int16", "int32", "int64",
    "uint", "uint8", "uint16", "uint32", "uint64",
    "float32", "float64", "complex64", "complex128",
];

const BUILTIN_FUNCS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag",
    "len", "make", "max", "min", "new", "panic", "print", "println", "real", "recover",
];

/// Declare the predeclared identifiers shared by all packages.
pub(crate) fn declare_universe(symbols: &mut SymbolTable) -> HashMap<String, SymbolId> {
    let mut universe = HashMap::new();
    let mut declare = |symbols: &mut SymbolTable, name: &str, kind: SymbolKind| {
        let id = symbols.insert(name.to_string(), kind, None, Span::default());
        universe.insert(name.to_string(), id);
    };

    for name in BASIC_TYPES {
        declare(symbols, name, SymbolKind::TypeName { underlying: Type::basic(name), methods: Vec::new() });
    }
    declare(symbols, "any", SymbolKind::TypeName {
        underlying: Type::Interface(InterfaceType::default()),
        methods: Vec::new(),
    });
    let error_sig = Signature { params: Vec::new(), results: vec![Type::basic("string")], variadic: false };
    declare(symbols, "error", SymbolKind::TypeName {
        underlying: Type::Interface(InterfaceType {
            methods: vec![("Error".to_string(), error_sig)],
            embedded: Vec::new(),
        }),
        methods: Vec::new(),
    });

    declare(symbols, "true", SymbolKind::Const { ty: Type::basic("bool") });
    declare(symbols, "false", SymbolKind::Const { ty: Type::basic("bool") });
    declare(symbols, "iota", SymbolKind::Const { ty: Type::basic("int") });
    declare(symbols, "nil", SymbolKind::Const { ty: Type::Nil });

    for name in BUILTIN_FUNCS {
        declare(symbols, name, SymbolKind::Builtin);
    }
    universe
}

pub(crate) struct Checker<'a> {
    symbols: &'a mut SymbolTable,
    universe: &'a HashMap<String, SymbolId>,
    registry: &'a PackageRegistry,
    infos: &'a [Option<PackageInfo>],
    pkg: &'a Package,
    info: PackageInfo,
    /// Index of the file being checked.
    file: usize,
}

impl<'a> Checker<'a> {
    pub fn new(
        symbols: &'a mut SymbolTable,
        universe: &'a HashMap<String, SymbolId>,
        registry: &'a PackageRegistry,
        infos: &'a [Option<PackageInfo>],
        pkg: &'a Package,
    ) -> Self {
        Self { symbols, universe, registry, infos, pkg, info: PackageInfo::default(), file: 0 }
    }

    pub fn check(mut self) -> PackageInfo {
        let pkg = self.pkg;

        for (idx, file) in pkg.files.iter().enumerate() {
            self.file = idx;
            self.info.scopes.enter(self.info.scopes.root());
            let scope = self.info.scopes.push(ScopeKind::File, None, Some(idx), file.ast.span);
            self.info.file_scopes.push(scope);
            self.bind_imports(idx);
        }

        self.each_file(|c, decl| c.declare_member(decl));
        self.each_file(|c, decl| {
            if let DeclKind::Type(specs) = decl {
                for spec in specs {
                    c.resolve_type_spec(spec);
                }
            }
        });
        self.each_file(|c, decl| {
            if let DeclKind::Func(f) = decl {
                c.resolve_func_signature(f);
            }
        });
        self.each_file(|c, decl| match decl {
            DeclKind::Var(specs) => {
                for spec in specs {
                    c.check_value_spec(spec, false, 0);
                }
            }
            DeclKind::Const(specs) => {
                for spec in specs {
                    c.check_value_spec(spec, true, 0);
                }
            }
            _ => {}
        });
        for (idx, file) in pkg.files.iter().enumerate() {
            self.file = idx;
            for decl in &file.ast.decls {
                if let DeclKind::Func(f) = &decl.kind {
                    self.enter_file(idx);
                    self.check_func_body(decl.id, decl.span, f);
                }
            }
        }

        self.info
    }

    /// Run `f` over every top-level declaration with its file scope current.
    fn each_file(&mut self, mut f: impl FnMut(&mut Self, &'a DeclKind)) {
        let pkg = self.pkg;
        for (idx, file) in pkg.files.iter().enumerate() {
            self.file = idx;
            for decl in &file.ast.decls {
                self.enter_file(idx);
                f(self, &decl.kind);
            }
        }
    }

    fn enter_file(&mut self, idx: usize) {
        if let Some(&scope) = self.info.file_scopes.get(idx) {
            self.info.scopes.enter(scope);
        }
    }

    fn file_path(&self) -> PathBuf {
        self.pkg.files.get(self.file).map(|f| f.path.clone()).unwrap_or_default()
    }

    fn pkg_path(&self) -> Option<String> {
        Some(self.pkg.path.clone())
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn bind_imports(&mut self, idx: usize) {
        let pkg = self.pkg;
        for spec in pkg.files[idx].ast.imports() {
            let name = spec.local_name();
            if name == "_" || name == "." {
                continue;
            }
            let Some(id) = self.registry.lookup(&spec.path) else {
                self.info.errors.push(ResolveError::unknown_import(spec.path.clone(), self.file_path(), spec.span));
                continue;
            };
            // Without an alias the package clause decides the bound name
            let name = match (&spec.alias, self.registry.get(id)) {
                (None, Some(imported)) => imported.name.clone(),
                _ => name.to_string(),
            };
            let sym = self.symbols.insert(
                name.clone(),
                SymbolKind::Package { id, path: spec.path.clone() },
                self.pkg_path(),
                spec.span,
            );
            self.info.defs.insert(spec.id, sym);
            self.info.scopes.define(name, sym, 0);
        }
    }

    fn declare_member(&mut self, decl: &'a DeclKind) {
        match decl {
            DeclKind::Type(specs) => {
                for spec in specs {
                    let kind = SymbolKind::TypeName { underlying: Type::Invalid, methods: Vec::new() };
                    self.declare_package_name(&spec.name, kind);
                }
            }
            DeclKind::Func(f) if f.recv.is_none() => {
                let kind = SymbolKind::Func(FuncInfo {
                    sig: Signature::default(),
                    recv: None,
                    key: format!("{}.{}", self.pkg.path, f.name.name),
                    has_body: f.body.is_some(),
                });
                if f.name.name == "init" {
                    // init functions cannot be referenced
                    let sym = self.symbols.insert(f.name.name.clone(), kind, self.pkg_path(), f.name.span);
                    self.info.defs.insert(f.name.id, sym);
                } else {
                    self.declare_package_name(&f.name, kind);
                }
            }
            DeclKind::Var(specs) => {
                for spec in specs {
                    for name in &spec.names {
                        self.declare_package_name(name, SymbolKind::Var { ty: Type::Invalid, param: false });
                    }
                }
            }
            DeclKind::Const(specs) => {
                for spec in specs {
                    for name in &spec.names {
                        self.declare_package_name(name, SymbolKind::Const { ty: Type::Invalid });
                    }
                }
            }
            _ => {}
        }
    }

    fn declare_package_name(&mut self, name: &Ident, kind: SymbolKind) {
        let sym = self.symbols.insert(name.name.clone(), kind, self.pkg_path(), name.span);
        self.info.defs.insert(name.id, sym);
        if name.is_blank() {
            return;
        }
        if let Some(previous) = self.info.members.get(&name.name).and_then(|&p| self.symbols.get(p)) {
            self.info.errors.push(ResolveError::redeclared(
                name.name.clone(),
                self.file_path(),
                name.span,
                previous.span,
            ));
            return;
        }
        self.info.members.insert(name.name.clone(), sym);
        self.info.scopes.define_package(name.name.clone(), sym);
    }

    fn resolve_type_spec(&mut self, spec: &TypeSpec) {
        let underlying = self.resolve_type(&spec.ty);
        if let Some(sym) = self.info.defs.get(&spec.name.id).and_then(|&id| self.symbols.get_mut(id)) {
            if let SymbolKind::TypeName { underlying: slot, .. } = &mut sym.kind {
                *slot = underlying;
            }
        }
    }

    fn resolve_func_signature(&mut self, f: &'a FuncDecl) {
        let sig = self.resolve_sig(&f.sig);

        let Some(recv) = &f.recv else {
            if let Some(sym) = self.info.defs.get(&f.name.id).and_then(|&id| self.symbols.get_mut(id)) {
                if let SymbolKind::Func(info) = &mut sym.kind {
                    info.sig = sig;
                }
            }
            return;
        };

        let recv_ty = self.resolve_type(&recv.ty);
        self.info.param_types.insert(recv.id, recv_ty.clone());
        let base = match recv_ty.deref() {
            Type::Named(id) => Some(*id),
            _ => None,
        };
        let base_name = base
            .and_then(|id| self.symbols.get(id))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "?".to_string());

        let method = self.symbols.insert(
            f.name.name.clone(),
            SymbolKind::Func(FuncInfo {
                sig,
                recv: Some(recv_ty),
                key: format!("{}.{}.{}", self.pkg.path, base_name, f.name.name),
                has_body: f.body.is_some(),
            }),
            self.pkg_path(),
            f.name.span,
        );
        self.info.defs.insert(f.name.id, method);

        if let Some(sym) = base.and_then(|id| self.symbols.get_mut(id)) {
            if let SymbolKind::TypeName { methods, .. } = &mut sym.kind {
                methods.push((f.name.name.clone(), method));
            }
        }
    }

    /// Type a `var` or `const` spec and bind its names. Package-level specs
    /// were declared in phase 1 and only get their types here.
    fn check_value_spec(&mut self, spec: &ValueSpec, is_const: bool, visible_from: usize) {
        let declared = spec.ty.as_ref().map(|ty| self.resolve_type(ty));
        let values = self.check_values(spec.names.len(), &spec.values);

        for (i, name) in spec.names.iter().enumerate() {
            let ty = match &declared {
                Some(ty) => ty.clone(),
                None => values.get(i).cloned().unwrap_or_default(),
            };
            let kind = if is_const {
                SymbolKind::Const { ty }
            } else {
                SymbolKind::Var { ty, param: false }
            };

            match self.info.defs.get(&name.id).copied() {
                Some(existing) => {
                    if let Some(sym) = self.symbols.get_mut(existing) {
                        sym.kind = kind;
                    }
                }
                None => self.declare_local(name, kind, visible_from),
            }
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.info.scopes.lookup(name).or_else(|| self.universe.get(name).copied())
    }

    fn kind(&self, id: SymbolId) -> Option<&SymbolKind> {
        self.symbols.get(id).map(|s| &s.kind)
    }

    fn member(&self, pkg: PackageId, name: &str) -> Option<SymbolId> {
        self.infos.get(pkg.0 as usize)?.as_ref()?.members.get(name).copied()
    }

    /// The type a type name denotes: predeclared names other than `error`
    /// stand for their underlying type, everything else stays named.
    fn type_of_type_name(&self, id: SymbolId) -> Type {
        match self.symbols.get(id) {
            Some(sym) if sym.pkg.is_none() && sym.name != "error" => match &sym.kind {
                SymbolKind::TypeName { underlying, .. } => underlying.clone(),
                _ => Type::Invalid,
            },
            Some(_) => Type::Named(id),
            None => Type::Invalid,
        }
    }

    pub fn resolve_type(&mut self, ty: &TypeExpr) -> Type {
        match &ty.kind {
            TypeExprKind::Name(ident) => match self.lookup(&ident.name) {
                Some(id) if matches!(self.kind(id), Some(SymbolKind::TypeName { .. })) => {
                    self.info.uses.insert(ident.id, id);
                    self.type_of_type_name(id)
                }
                Some(_) => {
                    self.info.errors.push(ResolveError::not_a_type(ident.name.clone(), self.file_path(), ident.span));
                    Type::Invalid
                }
                None => {
                    self.info.errors.push(ResolveError::undefined(ident.name.clone(), self.file_path(), ident.span));
                    Type::Invalid
                }
            },
            TypeExprKind::Qualified { pkg, name } => {
                match self.qualified_member(pkg, name) {
                    Some(id) if matches!(self.kind(id), Some(SymbolKind::TypeName { .. })) => Type::Named(id),
                    _ => Type::Invalid,
                }
            }
            TypeExprKind::Pointer(inner) => Type::Pointer(Box::new(self.resolve_type(inner))),
            TypeExprKind::Slice(elem) => Type::Slice(Box::new(self.resolve_type(elem))),
            TypeExprKind::Array { len, elem } => {
                if let Some(len) = len {
                    self.check_expr(len);
                }
                Type::Array(Box::new(self.resolve_type(elem)))
            }
            TypeExprKind::Map { key, value } => {
                Type::Map(Box::new(self.resolve_type(key)), Box::new(self.resolve_type(value)))
            }
            TypeExprKind::Chan { elem, .. } => Type::Chan(Box::new(self.resolve_type(elem))),
            TypeExprKind::Func(sig) => Type::Func(Box::new(self.resolve_sig(sig))),
            TypeExprKind::Interface(elems) => {
                let mut iface = InterfaceType::default();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, sig } => {
                            let sig = self.resolve_sig(sig);
                            iface.methods.push((name.name.clone(), sig));
                        }
                        InterfaceElem::Embedded(ty) => {
                            let ty = self.resolve_type(ty);
                            iface.embedded.push(ty);
                        }
                    }
                }
                Type::Interface(iface)
            }
            TypeExprKind::Struct(decls) => {
                let mut fields = Vec::new();
                for decl in decls {
                    let ty = self.resolve_type(&decl.ty);
                    if decl.is_embedded() {
                        fields.push(StructField { name: embedded_name(&decl.ty), ty, embedded: true });
                    } else {
                        for name in &decl.names {
                            fields.push(StructField { name: name.name.clone(), ty: ty.clone(), embedded: false });
                        }
                    }
                }
                Type::Struct(fields)
            }
        }
    }

    /// Resolve `pkg.name`, recording uses for both identifiers.
    fn qualified_member(&mut self, pkg: &Ident, name: &Ident) -> Option<SymbolId> {
        let pkg_sym = self.lookup(&pkg.name)?;
        let Some(SymbolKind::Package { id, path }) = self.kind(pkg_sym).cloned() else {
            return None;
        };
        self.info.uses.insert(pkg.id, pkg_sym);
        match self.member(id, &name.name) {
            Some(member) => {
                self.info.uses.insert(name.id, member);
                Some(member)
            }
            None => {
                self.info.errors.push(ResolveError::unknown_member(path, name.name.clone(), self.file_path(), name.span));
                None
            }
        }
    }

    /// Resolve a signature, recording the type of every parameter.
    fn resolve_sig(&mut self, sig: &FuncSig) -> Signature {
        let mut resolved = Signature::default();
        for param in &sig.params.params {
            let mut ty = self.resolve_type(&param.ty);
            if param.variadic {
                ty = Type::Slice(Box::new(ty));
                resolved.variadic = true;
            }
            self.info.param_types.insert(param.id, ty.clone());
            resolved.params.push(ParamInfo { name: param.name.as_ref().map(|n| n.name.clone()), ty });
        }
        for result in &sig.results {
            let ty = self.resolve_type(&result.ty);
            resolved.results.push(ty);
        }
        resolved
    }

    // =========================================================================
    // Bodies
    // =========================================================================

    fn declare_local(&mut self, name: &Ident, kind: SymbolKind, visible_from: usize) {
        if name.is_blank() {
            return;
        }
        let sym = self.symbols.insert(name.name.clone(), kind, self.pkg_path(), name.span);
        self.info.defs.insert(name.id, sym);
        self.info.scopes.define(name.name.clone(), sym, visible_from);
    }

    /// Bind named parameters of a function or literal in the current scope.
    fn declare_params(&mut self, sig: &FuncSig, visible_from: usize) {
        for param in &sig.params.params {
            if let Some(name) = &param.name {
                let ty = self.info.param_types.get(&param.id).cloned().unwrap_or_default();
                self.declare_local(name, SymbolKind::Var { ty, param: true }, visible_from);
            }
        }
    }

    fn check_func_body(&mut self, decl_id: NodeId, span: Span, f: &'a FuncDecl) {
        let Some(body) = &f.body else { return };

        let scope = self.info.scopes.push(ScopeKind::Function, Some(decl_id), Some(self.file), span);
        self.info.node_scopes.insert(decl_id, scope);
        self.info.node_scopes.insert(body.id, scope);

        if let Some(recv) = &f.recv {
            if let Some(name) = &recv.name {
                let ty = self.info.param_types.get(&recv.id).cloned().unwrap_or_default();
                self.declare_local(name, SymbolKind::Var { ty, param: true }, span.start);
            }
        }
        self.declare_params(&f.sig, span.start);
        self.check_stmts(&body.stmts);
        self.info.scopes.pop();
    }

    fn check_block(&mut self, block: &Block) {
        let span = Span::new(block.lbrace, block.rbrace + 1);
        let scope = self.info.scopes.push(ScopeKind::Block, Some(block.id), Some(self.file), span);
        self.info.node_scopes.insert(block.id, scope);
        self.check_stmts(&block.stmts);
        self.info.scopes.pop();
    }

    fn check_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Defer(expr) | StmtKind::Go(expr) => {
                self.check_expr(expr);
            }
            StmtKind::Define { names, values } => {
                let types = self.check_values(names.len(), values);
                for (i, name) in names.iter().enumerate() {
                    if name.is_blank() {
                        continue;
                    }
                    // `:=` reuses names already declared in the same scope
                    if let Some(existing) = self.info.scopes.lookup_current(&name.name).map(|b| b.symbol) {
                        self.info.uses.insert(name.id, existing);
                        continue;
                    }
                    let ty = types.get(i).cloned().unwrap_or_default();
                    self.declare_local(name, SymbolKind::Var { ty, param: false }, stmt.span.end);
                }
            }
            StmtKind::Assign { targets, values, .. } => {
                for target in targets {
                    if !matches!(&target.kind, ExprKind::Ident(name) if name == "_") {
                        self.check_expr(target);
                    }
                }
                for value in values {
                    self.check_expr(value);
                }
            }
            StmtKind::IncDec { target, .. } => {
                self.check_expr(target);
            }
            StmtKind::Send { chan, value } => {
                self.check_expr(chan);
                self.check_expr(value);
            }
            StmtKind::Var(specs) => {
                for spec in specs {
                    self.check_value_spec(spec, false, stmt.span.end);
                }
            }
            StmtKind::Const(specs) => {
                for spec in specs {
                    self.check_value_spec(spec, true, stmt.span.end);
                }
            }
            StmtKind::Type(specs) => {
                for spec in specs {
                    let kind = SymbolKind::TypeName { underlying: Type::Invalid, methods: Vec::new() };
                    self.declare_local(&spec.name, kind, stmt.span.start);
                    self.resolve_type_spec(spec);
                }
            }
            StmtKind::Return(values) => {
                for value in values {
                    self.check_expr(value);
                }
            }
            StmtKind::If(if_stmt) => {
                let scope = self.info.scopes.push(ScopeKind::Block, Some(stmt.id), Some(self.file), stmt.span);
                self.info.node_scopes.insert(stmt.id, scope);
                if let Some(init) = &if_stmt.init {
                    self.check_stmt(init);
                }
                self.check_expr(&if_stmt.cond);
                self.check_block(&if_stmt.then);
                if let Some(els) = &if_stmt.els {
                    self.check_stmt(els);
                }
                self.info.scopes.pop();
            }
            StmtKind::For { init, cond, post, body } => {
                let scope = self.info.scopes.push(ScopeKind::Block, Some(stmt.id), Some(self.file), stmt.span);
                self.info.node_scopes.insert(stmt.id, scope);
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_expr(cond);
                }
                if let Some(post) = post {
                    self.check_stmt(post);
                }
                self.check_block(body);
                self.info.scopes.pop();
            }
            StmtKind::Range { key, value, define, iterable, body } => {
                let scope = self.info.scopes.push(ScopeKind::Block, Some(stmt.id), Some(self.file), stmt.span);
                self.info.node_scopes.insert(stmt.id, scope);
                let iter_ty = self.check_expr(iterable);
                let (key_ty, value_ty) = types::range_types(self.symbols, &iter_ty);
                for (var, ty) in [(key, key_ty), (value, value_ty)] {
                    let Some(var) = var else { continue };
                    match (&var.kind, *define) {
                        (ExprKind::Ident(name), true) => {
                            let ident = Ident { id: var.id, name: name.clone(), span: var.span };
                            self.declare_local(&ident, SymbolKind::Var { ty, param: false }, body.lbrace);
                        }
                        _ => {
                            self.check_expr(var);
                        }
                    }
                }
                self.check_block(body);
                self.info.scopes.pop();
            }
            StmtKind::Block(block) => self.check_block(block),
            StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Empty => {}
        }
    }

    /// Types of the values assigned to `count` names, spreading a
    /// multi-value call and the comma-ok forms over the names.
    fn check_values(&mut self, count: usize, values: &[Expr]) -> Vec<Type> {
        let mut types: Vec<Type> = values.iter().map(|v| self.check_expr(v)).collect();

        if let ([value], [ty]) = (values, types.as_slice()) {
            if count > 1 {
                types = match ty {
                    Type::Tuple(elems) => elems.clone(),
                    single if is_comma_ok(value) => vec![single.clone(), Type::basic("bool")],
                    single => vec![single.clone()],
                };
            }
        }
        types.resize(count.max(types.len()), Type::Invalid);
        types
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn check_expr(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Int(_) => Type::basic("int"),
            ExprKind::Float(_) => Type::basic("float64"),
            ExprKind::String(_) => Type::basic("string"),
            ExprKind::Char(_) => Type::basic("rune"),
            ExprKind::Ident(name) => {
                if name == "_" {
                    return Type::Invalid;
                }
                match self.lookup(name) {
                    Some(id) => {
                        self.info.uses.insert(expr.id, id);
                        self.symbols.get(id).and_then(|s| s.value_type()).unwrap_or_default()
                    }
                    None => {
                        self.info.errors.push(ResolveError::undefined(name.clone(), self.file_path(), expr.span));
                        Type::Invalid
                    }
                }
            }
            ExprKind::Selector { base, sel } => self.check_selector(base, sel),
            ExprKind::Call(call) => self.check_call(call),
            ExprKind::Index { base, index } => {
                let base_ty = self.check_expr(base);
                self.check_expr(index);
                types::index_type(self.symbols, &base_ty)
            }
            ExprKind::Slice { base, lo, hi } => {
                let base_ty = self.check_expr(base);
                for bound in [lo, hi].into_iter().flatten() {
                    self.check_expr(bound);
                }
                if let Type::Array(elem) = types::underlying(self.symbols, &base_ty) {
                    return Type::Slice(elem.clone());
                }
                base_ty
            }
            ExprKind::TypeAssert { base, ty } => {
                self.check_expr(base);
                self.resolve_type(ty)
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand);
                match op {
                    UnaryOp::Addr => Type::Pointer(Box::new(ty)),
                    UnaryOp::Deref => match types::underlying(self.symbols, &ty) {
                        Type::Pointer(inner) => (**inner).clone(),
                        _ => Type::Invalid,
                    },
                    UnaryOp::Recv => match types::underlying(self.symbols, &ty) {
                        Type::Chan(elem) => (**elem).clone(),
                        _ => Type::Invalid,
                    },
                    UnaryOp::Not => Type::basic("bool"),
                    UnaryOp::Neg | UnaryOp::BitNot => ty,
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                if op.yields_bool() {
                    Type::basic("bool")
                } else if left_ty.is_invalid() {
                    right_ty
                } else {
                    left_ty
                }
            }
            ExprKind::Paren(inner) => self.check_expr(inner),
            ExprKind::FuncLit { sig, body } => {
                let scope = self.info.scopes.push(ScopeKind::Closure, Some(expr.id), Some(self.file), expr.span);
                self.info.node_scopes.insert(expr.id, scope);
                self.info.node_scopes.insert(body.id, scope);
                let resolved = self.resolve_sig(sig);
                self.declare_params(sig, expr.span.start);
                self.check_stmts(&body.stmts);
                self.info.scopes.pop();
                Type::Func(Box::new(resolved))
            }
            ExprKind::Composite { ty, elems } => {
                let ty = ty.as_ref().map(|t| self.resolve_type(t)).unwrap_or_default();
                self.check_composite(&ty, elems);
                ty
            }
            ExprKind::Type(ty) => {
                self.resolve_type(ty);
                Type::Invalid
            }
        }
    }

    fn check_selector(&mut self, base: &Expr, sel: &Ident) -> Type {
        if let ExprKind::Ident(name) = &base.kind {
            let is_package = self
                .lookup(name)
                .map(|id| matches!(self.kind(id), Some(SymbolKind::Package { .. })))
                .unwrap_or(false);
            if is_package {
                let pkg = Ident { id: base.id, name: name.clone(), span: base.span };
                return self
                    .qualified_member(&pkg, sel)
                    .and_then(|id| self.symbols.get(id))
                    .and_then(|s| s.value_type())
                    .unwrap_or_default();
            }
        }

        let base_ty = self.check_expr(base);
        match types::lookup_method(self.symbols, &base_ty, &sel.name) {
            Some(MethodRef::Concrete(method)) => {
                self.info.uses.insert(sel.id, method);
                self.symbols.get(method).and_then(|s| s.value_type()).unwrap_or_default()
            }
            Some(MethodRef::Interface(sig)) => Type::Func(Box::new(sig)),
            None => types::field_type(self.symbols, &base_ty, &sel.name).unwrap_or_default(),
        }
    }

    fn check_call(&mut self, call: &CallExpr) -> Type {
        if let Some(target) = self.conversion_target(&call.func) {
            for arg in &call.args {
                self.check_expr(arg);
            }
            return target;
        }

        if let ExprKind::Ident(name) = &call.func.kind {
            if let Some(id) = self.lookup(name) {
                if matches!(self.kind(id), Some(SymbolKind::Builtin)) {
                    self.info.uses.insert(call.func.id, id);
                    return self.check_builtin(name, &call.args);
                }
            }
        }

        let func_ty = self.check_expr(&call.func);
        for arg in &call.args {
            self.check_expr(arg);
        }
        match types::underlying(self.symbols, &func_ty) {
            Type::Func(sig) => Type::from_results(&sig.results),
            _ => Type::Invalid,
        }
    }

    fn check_builtin(&mut self, name: &str, args: &[Expr]) -> Type {
        let (first, rest) = match args.split_first() {
            Some((first, rest)) => (Some(first), rest),
            None => (None, args),
        };
        let first_ty = match (name, first) {
            ("new" | "make", Some(arg)) => self.type_argument(arg),
            (_, Some(arg)) => self.check_expr(arg),
            (_, None) => Type::Invalid,
        };
        for arg in rest {
            self.check_expr(arg);
        }

        match name {
            "new" => Type::Pointer(Box::new(first_ty)),
            "make" | "append" | "min" | "max" => first_ty,
            "len" | "cap" | "copy" => Type::basic("int"),
            "recover" => Type::Interface(InterfaceType::default()),
            "real" | "imag" => Type::basic("float64"),
            "complex" => Type::basic("complex128"),
            _ => Type::Tuple(Vec::new()),
        }
    }

    /// An expression in type position, as in `new(T)` and `make([]T, n)`.
    fn type_argument(&mut self, expr: &Expr) -> Type {
        match self.conversion_target(expr) {
            Some(ty) => ty,
            None => {
                self.check_expr(expr);
                Type::Invalid
            }
        }
    }

    /// If `func` names a type, the call is a conversion to it.
    fn conversion_target(&mut self, func: &Expr) -> Option<Type> {
        match &func.unparen().kind {
            ExprKind::Type(ty) => Some(self.resolve_type(ty)),
            ExprKind::Ident(name) => {
                let id = self.lookup(name)?;
                if !matches!(self.kind(id), Some(SymbolKind::TypeName { .. })) {
                    return None;
                }
                self.info.uses.insert(func.unparen().id, id);
                Some(self.type_of_type_name(id))
            }
            ExprKind::Selector { base, sel } => {
                let ExprKind::Ident(pkg_name) = &base.kind else { return None };
                let pkg_sym = self.lookup(pkg_name)?;
                let Some(SymbolKind::Package { id: pkg, .. }) = self.kind(pkg_sym) else { return None };
                let member = self.member(*pkg, &sel.name)?;
                if !matches!(self.kind(member), Some(SymbolKind::TypeName { .. })) {
                    return None;
                }
                self.info.uses.insert(base.id, pkg_sym);
                self.info.uses.insert(sel.id, member);
                Some(Type::Named(member))
            }
            ExprKind::Unary { op: UnaryOp::Deref, operand } => {
                let inner = self.conversion_target(operand)?;
                Some(Type::Pointer(Box::new(inner)))
            }
            _ => None,
        }
    }

    fn check_composite(&mut self, ty: &Type, elems: &[Element]) {
        let underlying = types::underlying(self.symbols, ty.deref()).clone();
        let elem_ty = match &underlying {
            Type::Slice(elem) | Type::Array(elem) => (**elem).clone(),
            Type::Map(_, value) => (**value).clone(),
            _ => Type::Invalid,
        };

        for elem in elems {
            if let Some(key) = &elem.key {
                // Bare keys of struct literals are field names
                let is_field_name = matches!(key.kind, ExprKind::Ident(_)) && !matches!(underlying, Type::Map(..));
                if !is_field_name {
                    self.check_expr(key);
                }
            }
            match &elem.value.kind {
                ExprKind::Composite { ty: None, elems: inner } => self.check_composite(&elem_ty, inner),
                _ => {
                    self.check_expr(&elem.value);
                }
            }
        }
    }
}

/// Forms that yield an extra boolean when assigned to two names.
fn is_comma_ok(expr: &Expr) -> bool {
    matches!(
        expr.unparen().kind,
        ExprKind::Index { .. } | ExprKind::TypeAssert { .. } | ExprKind::Unary { op: UnaryOp::Recv, .. }
    )
}

/// Field name of an embedded field: the type name without pointer or package.
fn embedded_name(ty: &TypeExpr) -> String {
    match &ty.kind {
        TypeExprKind::Name(ident) => ident.name.clone(),
        TypeExprKind::Qualified { name, .. } => name.name.clone(),
        TypeExprKind::Pointer(inner) => embedded_name(inner),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Program;
    use plumb_ast::decl::File;

    fn check(sources: &[(&str, &str)]) -> (Program, PackageId) {
        let mut registry = PackageRegistry::new();
        let mut last = None;
        for (path, source) in sources {
            let file = PathBuf::from(format!("{}/file.go", path));
            last = Some(registry.add_source(path, vec![(file, source.to_string())]).unwrap());
        }
        registry.load("context").unwrap();
        let program = Program::check(registry).unwrap();
        (program, last.unwrap())
    }

    fn file(program: &Program, pkg: PackageId) -> &File {
        &program.package(pkg).unwrap().files[0].ast
    }

    fn symbol_named<'p>(program: &'p Program, pkg: &str, name: &str) -> &'p crate::Symbol {
        program
            .symbols
            .iter()
            .filter(|s| s.pkg.as_deref() == Some(pkg))
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no symbol {}", name))
    }

    fn first_call(stmt: &Stmt) -> &CallExpr {
        match &stmt.kind {
            StmtKind::Expr(e) => e.as_call().unwrap(),
            StmtKind::Assign { values, .. } | StmtKind::Define { values, .. } => values[0].as_call().unwrap(),
            other => panic!("no call in {:?}", other),
        }
    }

    #[test]
    fn selector_call_resolves_to_qualified_function() {
        let (program, id) = check(&[(
            "p",
            "package p\n\nimport \"context\"\n\nfunc f() {\n\t_ = context.TODO()\n}\n",
        )]);
        let info = program.info(id).unwrap();
        assert!(info.errors.is_empty(), "{:?}", info.errors);

        let (_, f) = file(&program, id).funcs().next().unwrap();
        let call = first_call(&f.body.as_ref().unwrap().stmts[0]);
        let ExprKind::Selector { sel, .. } = &call.func.kind else { panic!("expected selector") };
        let todo = program.symbol(info.uses[&sel.id]).unwrap();
        assert_eq!(todo.as_func().unwrap().key, "context.TODO");
    }

    #[test]
    fn request_parameter_has_context_accessor() {
        let (program, id) = check(&[(
            "p",
            "package p\n\nimport \"net/http\"\n\nfunc g(r *http.Request) {}\n",
        )]);
        let info = program.info(id).unwrap();
        let (_, g) = file(&program, id).funcs().next().unwrap();
        let param = &g.sig.params.params[0];
        let ty = &info.param_types[&param.id];

        let method = program.concrete_method(ty, "Context").unwrap();
        let sig = &program.symbol(method).unwrap().as_func().unwrap().sig;
        assert!(sig.params.is_empty());
        assert!(program.is_named(&sig.results[0], "context", "Context"));
    }

    #[test]
    fn short_declaration_reuses_parameter() {
        let (program, id) = check(&[(
            "p",
            "package p\n\nimport (\n\t\"context\"\n\t\"time\"\n)\n\nfunc f(ctx context.Context, d time.Duration) {\n\tctx, cancel := context.WithTimeout(ctx, d)\n\tdefer cancel()\n\t_ = ctx\n}\n",
        )]);
        let info = program.info(id).unwrap();
        assert!(info.errors.is_empty(), "{:?}", info.errors);

        let (_, f) = file(&program, id).funcs().next().unwrap();
        let StmtKind::Define { names, .. } = &f.body.as_ref().unwrap().stmts[0].kind else { panic!() };
        assert!(!info.defs.contains_key(&names[0].id));
        let reused = program.symbol(info.uses[&names[0].id]).unwrap();
        assert!(matches!(reused.kind, SymbolKind::Var { param: true, .. }));

        let cancel = program.symbol(info.defs[&names[1].id]).unwrap();
        let SymbolKind::Var { ty, .. } = &cancel.kind else { panic!() };
        assert!(program.is_named(ty, "context", "CancelFunc"));
    }

    #[test]
    fn locals_become_visible_after_their_statement() {
        let src = "package p\n\nfunc f() {\n\tx := 1\n\t_ = x\n}\n";
        let (program, id) = check(&[("p", src)]);
        let info = program.info(id).unwrap();
        let (decl, f) = file(&program, id).funcs().next().unwrap();

        let scope = info.node_scopes[&decl.id];
        let binding = info.scopes.get(scope).unwrap().lookup_local("x").unwrap();
        let define = &f.body.as_ref().unwrap().stmts[0];
        assert_eq!(binding.visible_from, define.span.end);
        assert_eq!(&src[define.span.start..define.span.end], "x := 1");
    }

    #[test]
    fn local_type_and_var_declarations_are_typed() {
        let src = "package p\n\nimport \"context\"\n\nfunc f() {\n\ttype key int\n\tvar ctx context.Context\n\tconst limit = 3\n\tvar k key\n\t_ = ctx\n\t_ = k\n\t_ = limit\n}\n";
        let (program, id) = check(&[("p", src)]);
        let info = program.info(id).unwrap();
        assert!(info.errors.is_empty(), "{:?}", info.errors);

        let (decl, _) = file(&program, id).funcs().next().unwrap();
        let scope = info.scopes.get(info.node_scopes[&decl.id]).unwrap();
        let ctx = scope.lookup_local("ctx").unwrap();
        let SymbolKind::Var { ty, param: false } = &program.symbol(ctx.symbol).unwrap().kind else { panic!() };
        assert!(program.is_named(ty, "context", "Context"));

        let key = scope.lookup_local("key").unwrap();
        let SymbolKind::TypeName { underlying, .. } = &program.symbol(key.symbol).unwrap().kind else { panic!() };
        assert_ne!(*underlying, Type::Invalid);
        assert!(scope.lookup_local("limit").is_some());
    }

    #[test]
    fn closures_open_their_own_scope() {
        let (program, id) = check(&[(
            "p",
            "package p\n\nimport \"net/http\"\n\nfunc g() {\n\tfunc(r *http.Request) {\n\t\t_ = r\n\t}(nil)\n}\n",
        )]);
        let info = program.info(id).unwrap();
        let closure = info.scopes.iter().find(|s| s.kind == ScopeKind::Closure).unwrap();
        let parent = info.scopes.get(closure.parent.unwrap()).unwrap();
        assert_eq!(parent.kind, ScopeKind::Function);
        assert_eq!(closure.bindings[0].name, "r");
        assert!(closure.owner.is_some());
    }

    #[test]
    fn method_keys_include_receiver_base() {
        let (program, _) = check(&[(
            "svc",
            "package svc\n\ntype Client struct{}\n\nfunc (c *Client) Noop() {}\n\nfunc Dial(addr string) (*Client, error) {\n\treturn &Client{}, nil\n}\n",
        )]);
        let noop = symbol_named(&program, "svc", "Noop");
        assert_eq!(noop.as_func().unwrap().key, "svc.Client.Noop");
        let dial = symbol_named(&program, "svc", "Dial");
        assert_eq!(dial.as_func().unwrap().sig.results.len(), 2);
    }

    #[test]
    fn multi_value_results_spread_over_names() {
        let (program, id) = check(&[
            ("svc", "package svc\n\ntype Client struct{}\n\nfunc (c *Client) Noop() {}\n\nfunc Dial() (*Client, error)\n"),
            ("app", "package app\n\nimport \"svc\"\n\nfunc main() {\n\tclient, err := svc.Dial()\n\t_ = err\n\tclient.Noop()\n}\n"),
        ]);
        let info = program.info(id).unwrap();
        assert!(info.errors.is_empty(), "{:?}", info.errors);

        let (_, main) = file(&program, id).funcs().next().unwrap();
        let call = first_call(&main.body.as_ref().unwrap().stmts[2]);
        let ExprKind::Selector { sel, .. } = &call.func.kind else { panic!() };
        let noop = program.symbol(info.uses[&sel.id]).unwrap();
        assert_eq!(noop.as_func().unwrap().key, "svc.Client.Noop");
    }

    #[test]
    fn interface_method_calls_have_no_symbol() {
        let (program, id) = check(&[(
            "p",
            "package p\n\nimport \"context\"\n\nfunc f() {\n\tvar db interface{ Close(context.Context) error }\n\t_ = db.Close(nil)\n}\n",
        )]);
        let info = program.info(id).unwrap();
        let (_, f) = file(&program, id).funcs().next().unwrap();
        let call = first_call(&f.body.as_ref().unwrap().stmts[1]);
        let ExprKind::Selector { sel, .. } = &call.func.kind else { panic!() };
        assert!(!info.uses.contains_key(&sel.id));
    }

    #[test]
    fn struct_literal_keys_are_not_resolved() {
        let (program, id) = check(&[(
            "p",
            "package p\n\nimport (\n\t\"net\"\n\t\"time\"\n)\n\nfunc f() {\n\td := &net.Dialer{Timeout: time.Second}\n\t_ = d\n}\n",
        )]);
        assert!(program.info(id).unwrap().errors.is_empty());
    }

    #[test]
    fn undefined_names_are_reported() {
        let (program, id) = check(&[("p", "package p\n\nfunc f() {\n\tmissing()\n}\n")]);
        let errors = &program.info(id).unwrap().errors;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("undefined: missing"));
    }
}
