// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Call classification: requests, local edges and continuations.

use plumb_ast::decl::DeclKind;
use plumb_ast::expr::{CallExpr, Expr, ExprKind};
use plumb_ast::stmt::{AssignOp, Block, Stmt, StmtKind};
use plumb_ast::NodeId;
use plumb_resolve::{Package, ScopeId, Signature, SymbolId};
use tracing::{trace, warn};

use super::{CallSite, Plumber, Request};

/// Where the walker is.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    file: usize,
    decl: Option<NodeId>,
    scope: ScopeId,
}

/// Names a discarded request may be bound to.
fn is_request_binding(name: &str) -> bool {
    name == "ctx" || name == "_"
}

impl<'p> Plumber<'p> {
    pub(crate) fn build_call_graph(&mut self) {
        let pkg: &'p Package = self.pkg;
        for (file, source) in pkg.files.iter().enumerate() {
            let Some(&file_scope) = self.info.file_scopes.get(file) else { continue };
            for decl in &source.ast.decls {
                match &decl.kind {
                    DeclKind::Func(func) => {
                        let Some(body) = &func.body else { continue };
                        let scope = self.info.node_scopes.get(&decl.id).copied();
                        let (Some(scope), Some(_)) = (scope, self.index.func(decl.id)) else {
                            warn!(func = %func.name.name, file = %source.path.display(), "skipping function without type information");
                            continue;
                        };
                        let cur = Cursor { file, decl: Some(decl.id), scope };
                        self.walk_stmts(cur, &body.stmts);
                    }
                    DeclKind::Var(specs) | DeclKind::Const(specs) => {
                        let cur = Cursor { file, decl: None, scope: file_scope };
                        for value in specs.iter().flat_map(|s| s.values.iter()) {
                            self.walk_expr(cur, value);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Move into the scope opened by node `id`, if any.
    fn enter(&self, cur: Cursor, id: NodeId) -> Cursor {
        match self.info.node_scopes.get(&id) {
            Some(&scope) => Cursor { scope, ..cur },
            None => cur,
        }
    }

    fn site(&self, cur: Cursor, call: &'p CallExpr, expr: &'p Expr) -> CallSite<'p> {
        CallSite { file: cur.file, scope: cur.scope, decl: cur.decl, call, span: expr.span }
    }

    fn walk_block(&mut self, cur: Cursor, block: &'p Block) {
        let cur = self.enter(cur, block.id);
        self.walk_stmts(cur, &block.stmts);
    }

    fn walk_stmts(&mut self, cur: Cursor, stmts: &'p [Stmt]) {
        for stmt in stmts {
            self.walk_stmt(cur, stmt);
        }
    }

    fn walk_stmt(&mut self, cur: Cursor, stmt: &'p Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Defer(expr) | StmtKind::Go(expr) => self.walk_expr(cur, expr),
            StmtKind::Define { names, values } => {
                if let ([name], [value]) = (names.as_slice(), values.as_slice()) {
                    if is_request_binding(&name.name) && self.discarded_request(cur, stmt, value, false) {
                        return;
                    }
                }
                for value in values {
                    self.walk_expr(cur, value);
                }
            }
            StmtKind::Assign { targets, op, values } => {
                if let ([target], [value], AssignOp::Assign) = (targets.as_slice(), values.as_slice(), op) {
                    let binds = matches!(&target.kind, ExprKind::Ident(name) if is_request_binding(name));
                    let blank = matches!(&target.kind, ExprKind::Ident(name) if name == "_");
                    if binds && self.discarded_request(cur, stmt, value, blank) {
                        return;
                    }
                }
                for expr in targets.iter().chain(values) {
                    self.walk_expr(cur, expr);
                }
            }
            StmtKind::IncDec { target, .. } => self.walk_expr(cur, target),
            StmtKind::Send { chan, value } => {
                self.walk_expr(cur, chan);
                self.walk_expr(cur, value);
            }
            StmtKind::Var(specs) | StmtKind::Const(specs) => {
                for value in specs.iter().flat_map(|s| s.values.iter()) {
                    self.walk_expr(cur, value);
                }
            }
            StmtKind::Return(values) => {
                for value in values {
                    self.walk_expr(cur, value);
                }
            }
            StmtKind::If(if_stmt) => {
                let cur = self.enter(cur, stmt.id);
                if let Some(init) = &if_stmt.init {
                    self.walk_stmt(cur, init);
                }
                self.walk_expr(cur, &if_stmt.cond);
                self.walk_block(cur, &if_stmt.then);
                if let Some(els) = &if_stmt.els {
                    self.walk_stmt(cur, els);
                }
            }
            StmtKind::For { init, cond, post, body } => {
                let cur = self.enter(cur, stmt.id);
                if let Some(init) = init {
                    self.walk_stmt(cur, init);
                }
                if let Some(cond) = cond {
                    self.walk_expr(cur, cond);
                }
                if let Some(post) = post {
                    self.walk_stmt(cur, post);
                }
                self.walk_block(cur, body);
            }
            StmtKind::Range { iterable, body, .. } => {
                let cur = self.enter(cur, stmt.id);
                self.walk_expr(cur, iterable);
                self.walk_block(cur, body);
            }
            StmtKind::Block(block) => self.walk_block(cur, block),
            StmtKind::Type(_) | StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Empty => {}
        }
    }

    /// `ctx := context.TODO()` and `_ = context.TODO()`: the binding is
    /// deleted and later uses of `ctx` pick up the function's context.
    fn discarded_request(&mut self, cur: Cursor, stmt: &'p Stmt, value: &'p Expr, blank: bool) -> bool {
        let Some(call) = value.as_call() else { return false };
        let ExprKind::Selector { sel, .. } = &call.func.kind else { return false };
        if self.info.uses.get(&sel.id) != Some(&self.todo) {
            return false;
        }
        let site = self.site(cur, call, value);
        self.requests.push(Request { site, assign: Some(stmt.span.start), blank });
        true
    }

    fn walk_expr(&mut self, cur: Cursor, expr: &'p Expr) {
        match &expr.kind {
            ExprKind::Call(call) => self.walk_call(cur, expr, call),
            ExprKind::Selector { base, .. } | ExprKind::TypeAssert { base, .. } => self.walk_expr(cur, base),
            ExprKind::Index { base, index } => {
                self.walk_expr(cur, base);
                self.walk_expr(cur, index);
            }
            ExprKind::Slice { base, lo, hi } => {
                self.walk_expr(cur, base);
                for bound in [lo, hi].into_iter().flatten() {
                    self.walk_expr(cur, bound);
                }
            }
            ExprKind::Unary { operand, .. } => self.walk_expr(cur, operand),
            ExprKind::Binary { left, right, .. } => {
                self.walk_expr(cur, left);
                self.walk_expr(cur, right);
            }
            ExprKind::Paren(inner) => self.walk_expr(cur, inner),
            ExprKind::FuncLit { sig, body } => {
                self.index.add_closure(expr.id, sig);
                let cur = self.enter(cur, expr.id);
                self.walk_stmts(cur, &body.stmts);
            }
            ExprKind::Composite { elems, .. } => {
                for elem in elems {
                    if let Some(key) = &elem.key {
                        self.walk_expr(cur, key);
                    }
                    self.walk_expr(cur, &elem.value);
                }
            }
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Char(_)
            | ExprKind::Ident(_)
            | ExprKind::Type(_) => {}
        }
    }

    fn walk_call(&mut self, cur: Cursor, expr: &'p Expr, call: &'p CallExpr) {
        let target = match &call.func.kind {
            ExprKind::Ident(_) => Some(call.func.id),
            ExprKind::Selector { sel, .. } => Some(sel.id),
            _ => None,
        };
        let site = self.site(cur, call, expr);

        match target.and_then(|id| self.info.uses.get(&id)).copied() {
            Some(symbol) if symbol == self.todo => {
                self.requests.push(Request { site, assign: None, blank: false });
                return;
            }
            Some(symbol) => self.classify_call(site, symbol),
            None => {
                trace!(offset = expr.span.start, "call with unknown target");
                self.unknown.push(site);
            }
        }

        self.walk_expr(cur, &call.func);
        for arg in &call.args {
            self.walk_expr(cur, arg);
        }
    }

    fn classify_call(&mut self, site: CallSite<'p>, symbol: SymbolId) {
        let Some(callee) = self.program.symbol(symbol) else { return };
        // Conversions, builtins and calls of function values
        let Some(func) = callee.as_func() else { return };

        if callee.pkg.as_deref() == Some(self.pkg.path.as_str()) {
            self.callers.entry(symbol).or_default().push(site);
        } else if self.facts.has(&func.key) && !self.already_plumbed(site.call, &func.sig) {
            self.continuations.push(site);
        }
    }

    /// The callee takes a leading context and the call passes enough
    /// arguments to include it.
    fn already_plumbed(&self, call: &CallExpr, sig: &Signature) -> bool {
        let Some(first) = sig.params.first() else { return false };
        let required = if sig.variadic { sig.params.len() - 1 } else { sig.params.len() };
        self.is_context(&first.ty) && call.args.len() >= required
    }
}
