// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation using Pratt parsing for expressions.

use plumb_ast::decl::{Decl, DeclKind, File, FuncDecl, ImportGroup, ImportSpec, TypeSpec, ValueSpec};
use plumb_ast::expr::{BinOp, CallExpr, Element, Expr, ExprKind, UnaryOp};
use plumb_ast::stmt::{AssignOp, Block, IfStmt, Stmt, StmtKind};
use plumb_ast::token::{Token, TokenKind};
use plumb_ast::types::{ChanDir, FieldDecl, FuncSig, InterfaceElem, Param, ParamList, TypeExpr, TypeExprKind};
use plumb_ast::{Ident, NodeId, Span};

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

/// Keywords of the full language that the subset does not parse.
const UNSUPPORTED_STATEMENTS: &[&str] = &["switch", "select", "goto", "fallthrough"];

/// The parser for Go-style source code.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Controls whether `T {` can start a composite literal (false in control clauses)
    allow_brace_expr: bool,
    /// Collected errors during parsing
    errors: Vec<ParseError>,
    /// Counter for generating unique NodeIds
    next_node_id: u32,
}

/// An entry of a parameter list before name grouping is applied.
enum ParamEntry {
    Named { name: Ident, ty: TypeExpr, variadic: bool, start: usize },
    Bare { ty: TypeExpr, variadic: bool },
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, allow_brace_expr: true, errors: Vec::new(), next_node_id: 0 }
    }

    /// Number nodes from `first` so several files of one unit get distinct ids.
    pub fn starting_at(mut self, first: u32) -> Self {
        self.next_node_id = first;
        self
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Record error, return if should continue.
    fn record_error(&mut self, error: ParseError) -> bool {
        self.errors.push(error);
        self.errors.len() < MAX_ERRORS
    }

    /// Skip to next top-level declaration after error.
    fn synchronize(&mut self) {
        let mut brace_depth = 0usize;

        while !self.at_end() {
            match self.current_kind() {
                TokenKind::LBrace => {
                    brace_depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    brace_depth = brace_depth.saturating_sub(1);
                    self.advance();
                }
                TokenKind::Func | TokenKind::Type | TokenKind::Var |
                TokenKind::Const | TokenKind::Import if brace_depth == 0 => {
                    return;
                }
                _ => { self.advance(); }
            }
        }
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, n: usize) -> &TokenKind {
        self.tokens.get(self.pos + n).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                kind.display_name(),
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) || self.check(&TokenKind::Semi) {
            self.advance();
        }
    }

    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Newline) || self.check(&TokenKind::Semi) {
            self.advance();
            self.skip_newlines();
            Ok(())
        } else if self.check(&TokenKind::Eof) || self.check(&TokenKind::RBrace) || self.check(&TokenKind::RParen) {
            Ok(())
        } else {
            Err(ParseError::expected(
                "newline or ';'",
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                let span = self.current().span;
                self.advance();
                Ok(Ident { id: self.next_id(), name, span })
            }
            _ => Err(ParseError::expected(
                "a name",
                self.current_kind(),
                self.current().span,
            )),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match self.current_kind().clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(ParseError::expected(
                "a string",
                self.current_kind(),
                self.current().span,
            )),
        }
    }

    /// Whether the current token can begin a type.
    fn at_type_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Ident(_) | TokenKind::Star | TokenKind::LBracket | TokenKind::Map |
            TokenKind::Chan | TokenKind::Func | TokenKind::Interface | TokenKind::Struct |
            TokenKind::Arrow | TokenKind::LParen
        )
    }

    /// Run `f` with composite literals re-enabled (inside delimiters).
    fn with_braces<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        let old = self.allow_brace_expr;
        self.allow_brace_expr = true;
        let result = f(self);
        self.allow_brace_expr = old;
        result
    }

    // =========================================================================
    // Top-Level Parsing
    // =========================================================================

    pub fn parse(&mut self) -> ParseResult {
        let file = match self.parse_file() {
            Ok(file) => Some(file),
            Err(e) => {
                self.record_error(e);
                None
            }
        };

        ParseResult {
            file,
            errors: std::mem::take(&mut self.errors),
            next_id: self.next_node_id,
        }
    }

    fn parse_file(&mut self) -> Result<File, ParseError> {
        self.skip_newlines();
        let start = self.current().span.start;
        self.expect(&TokenKind::Package)?;
        let package = self.expect_ident()?;
        self.expect_terminator()?;

        let mut decls = Vec::new();
        while !self.at_end() {
            match self.parse_decl() {
                Ok(decl) => {
                    decls.push(decl);
                    if let Err(e) = self.expect_terminator() {
                        if !self.record_error(e) {
                            break;
                        }
                        self.synchronize();
                    }
                }
                Err(e) => {
                    if !self.record_error(e) {
                        break;
                    }
                    self.synchronize();
                }
            }
            self.skip_newlines();
        }

        Ok(File { package, decls, span: Span::new(start, self.prev_end()) })
    }

    fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        let start = self.current().span.start;

        let kind = match self.current_kind() {
            TokenKind::Import => self.parse_import_decl()?,
            TokenKind::Func => DeclKind::Func(self.parse_func_decl()?),
            TokenKind::Type => {
                self.advance();
                DeclKind::Type(self.parse_group(Self::parse_type_spec)?)
            }
            TokenKind::Var => {
                self.advance();
                DeclKind::Var(self.parse_group(Self::parse_value_spec)?)
            }
            TokenKind::Const => {
                self.advance();
                DeclKind::Const(self.parse_group(Self::parse_value_spec)?)
            }
            _ => {
                return Err(ParseError::expected(
                    "declaration (func, type, var, const, import)",
                    self.current_kind(),
                    self.current().span,
                ));
            }
        };

        Ok(Decl { id: self.next_id(), kind, span: Span::new(start, self.prev_end()) })
    }

    /// Parse one spec, or a parenthesized list of specs.
    fn parse_group<T>(&mut self, mut spec: impl FnMut(&mut Self) -> Result<T, ParseError>) -> Result<Vec<T>, ParseError> {
        if !self.match_token(&TokenKind::LParen) {
            return Ok(vec![spec(self)?]);
        }
        let mut specs = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            specs.push(spec(self)?);
            self.expect_terminator()?;
        }
        self.expect(&TokenKind::RParen)?;
        Ok(specs)
    }

    // =========================================================================
    // Declaration Parsing
    // =========================================================================

    fn parse_import_decl(&mut self) -> Result<DeclKind, ParseError> {
        self.expect(&TokenKind::Import)?;
        let lparen = if self.check(&TokenKind::LParen) {
            Some(self.current().span.start)
        } else {
            None
        };
        let specs = self.parse_group(Self::parse_import_spec)?;
        Ok(DeclKind::Import(ImportGroup { lparen, specs }))
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, ParseError> {
        let start = self.current().span.start;
        let alias = match self.current_kind() {
            TokenKind::Ident(_) => Some(self.expect_ident()?),
            TokenKind::Dot => {
                let span = self.current().span;
                self.advance();
                Some(Ident { id: self.next_id(), name: ".".to_string(), span })
            }
            _ => None,
        };
        let path = self.expect_string()?;
        Ok(ImportSpec { id: self.next_id(), alias, path, span: Span::new(start, self.prev_end()) })
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, ParseError> {
        self.expect(&TokenKind::Func)?;

        let recv = if self.check(&TokenKind::LParen) {
            let list = self.parse_param_list()?;
            let span = Span::new(list.lparen, list.rparen + 1);
            let mut params = list.params;
            if params.len() != 1 {
                return Err(ParseError {
                    span,
                    message: "method has multiple receivers".to_string(),
                    hint: Some("a receiver looks like (r *T)".to_string()),
                });
            }
            params.pop()
        } else {
            None
        };

        let name = self.expect_ident()?;
        let sig = self.parse_signature()?;
        let body = if self.check(&TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(FuncDecl { name, recv, sig, body })
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        let name = self.expect_ident()?;
        let alias = self.match_token(&TokenKind::Eq);
        let ty = self.parse_type()?;
        Ok(TypeSpec { name, ty, alias })
    }

    fn parse_value_spec(&mut self) -> Result<ValueSpec, ParseError> {
        let start = self.current().span.start;
        let mut names = vec![self.expect_ident()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }

        let ty = if !self.check(&TokenKind::Eq) && self.at_type_start() {
            Some(self.parse_type()?)
        } else {
            None
        };

        let values = if self.match_token(&TokenKind::Eq) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };

        Ok(ValueSpec { id: self.next_id(), names, ty, values, span: Span::new(start, self.prev_end()) })
    }

    // =========================================================================
    // Signatures and Types
    // =========================================================================

    fn parse_signature(&mut self) -> Result<FuncSig, ParseError> {
        let params = self.parse_param_list()?;
        let results = if self.check(&TokenKind::LParen) {
            self.parse_param_list()?.params
        } else if self.at_type_start() {
            let ty = self.parse_type()?;
            let span = ty.span;
            vec![Param { id: self.next_id(), name: None, ty, variadic: false, span }]
        } else {
            Vec::new()
        };
        Ok(FuncSig { params, results })
    }

    /// Parse `( ... )` applying the grouping rule: `(a, b int)` names both.
    fn parse_param_list(&mut self) -> Result<ParamList, ParseError> {
        let lparen = self.expect(&TokenKind::LParen)?.span.start;
        let mut entries = Vec::new();

        self.with_braces(|p| {
            p.skip_newlines();
            while !p.check(&TokenKind::RParen) && !p.at_end() {
                entries.push(p.parse_param_entry()?);
                if !p.match_token(&TokenKind::Comma) {
                    break;
                }
                p.skip_newlines();
            }
            p.skip_newlines();
            Ok(())
        })?;

        let rparen = self.expect(&TokenKind::RParen)?.span.start;
        let params = self.group_params(entries)?;
        Ok(ParamList { lparen, rparen, params })
    }

    fn parse_param_entry(&mut self) -> Result<ParamEntry, ParseError> {
        let start = self.current().span.start;
        if let TokenKind::Ident(_) = self.current_kind() {
            let named = matches!(
                self.peek(1),
                TokenKind::Ident(_) | TokenKind::Star | TokenKind::LBracket | TokenKind::Map |
                TokenKind::Chan | TokenKind::Func | TokenKind::Interface | TokenKind::Struct |
                TokenKind::Arrow | TokenKind::LParen | TokenKind::Ellipsis
            );
            if named {
                let name = self.expect_ident()?;
                let variadic = self.match_token(&TokenKind::Ellipsis);
                let ty = self.parse_type()?;
                return Ok(ParamEntry::Named { name, ty, variadic, start });
            }
        }
        let variadic = self.match_token(&TokenKind::Ellipsis);
        let ty = self.parse_type()?;
        Ok(ParamEntry::Bare { ty, variadic })
    }

    /// Bare names preceding a named entry take that entry's type.
    fn group_params(&mut self, entries: Vec<ParamEntry>) -> Result<Vec<Param>, ParseError> {
        let any_named = entries.iter().any(|e| matches!(e, ParamEntry::Named { .. }));
        let mut params = Vec::new();

        if !any_named {
            for entry in entries {
                if let ParamEntry::Bare { ty, variadic } = entry {
                    let span = ty.span;
                    params.push(Param { id: self.next_id(), name: None, ty, variadic, span });
                }
            }
            return Ok(params);
        }

        let mut pending: Vec<Ident> = Vec::new();
        for entry in entries {
            match entry {
                ParamEntry::Bare { ty, .. } => match ty.kind {
                    TypeExprKind::Name(ident) => pending.push(ident),
                    _ => {
                        return Err(ParseError {
                            span: ty.span,
                            message: "mixed named and unnamed parameters".to_string(),
                            hint: Some("name every parameter or none of them".to_string()),
                        });
                    }
                },
                ParamEntry::Named { name, ty, variadic, start } => {
                    for ident in pending.drain(..) {
                        let span = ident.span;
                        params.push(Param { id: self.next_id(), name: Some(ident), ty: ty.clone(), variadic: false, span });
                    }
                    let span = Span::new(start, ty.span.end);
                    params.push(Param { id: self.next_id(), name: Some(name), ty, variadic, span });
                }
            }
        }
        if let Some(ident) = pending.first() {
            return Err(ParseError {
                span: ident.span,
                message: "mixed named and unnamed parameters".to_string(),
                hint: Some("the last parameter of a group needs a type".to_string()),
            });
        }
        Ok(params)
    }

    pub fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.current().span.start;
        let kind = match self.current_kind().clone() {
            TokenKind::Ident(_) => {
                let first = self.expect_ident()?;
                if self.check(&TokenKind::Dot) && matches!(self.peek(1), TokenKind::Ident(_)) {
                    self.advance();
                    let name = self.expect_ident()?;
                    TypeExprKind::Qualified { pkg: first, name }
                } else {
                    TypeExprKind::Name(first)
                }
            }
            TokenKind::Star => {
                self.advance();
                TypeExprKind::Pointer(Box::new(self.parse_type()?))
            }
            TokenKind::LBracket => {
                self.advance();
                if self.match_token(&TokenKind::RBracket) {
                    TypeExprKind::Slice(Box::new(self.parse_type()?))
                } else {
                    let len = if self.match_token(&TokenKind::Ellipsis) {
                        None
                    } else {
                        Some(Box::new(self.with_braces(|p| p.parse_expr())?))
                    };
                    self.expect(&TokenKind::RBracket)?;
                    TypeExprKind::Array { len, elem: Box::new(self.parse_type()?) }
                }
            }
            TokenKind::Map => {
                self.advance();
                self.expect(&TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                let value = self.parse_type()?;
                TypeExprKind::Map { key: Box::new(key), value: Box::new(value) }
            }
            TokenKind::Chan => {
                self.advance();
                let dir = if self.match_token(&TokenKind::Arrow) { ChanDir::Send } else { ChanDir::Both };
                TypeExprKind::Chan { dir, elem: Box::new(self.parse_type()?) }
            }
            TokenKind::Arrow => {
                self.advance();
                self.expect(&TokenKind::Chan)?;
                TypeExprKind::Chan { dir: ChanDir::Recv, elem: Box::new(self.parse_type()?) }
            }
            TokenKind::Func => {
                self.advance();
                TypeExprKind::Func(self.parse_signature()?)
            }
            TokenKind::Interface => {
                self.advance();
                TypeExprKind::Interface(self.parse_interface_body()?)
            }
            TokenKind::Struct => {
                self.advance();
                TypeExprKind::Struct(self.parse_struct_body()?)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            _ => {
                return Err(ParseError::expected("type", self.current_kind(), self.current().span));
            }
        };
        Ok(TypeExpr { id: self.next_id(), kind, span: Span::new(start, self.prev_end()) })
    }

    fn parse_interface_body(&mut self) -> Result<Vec<InterfaceElem>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        self.skip_newlines();
        let mut elems = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if matches!(self.current_kind(), TokenKind::Ident(_)) && self.peek(1) == &TokenKind::LParen {
                let name = self.expect_ident()?;
                let sig = self.parse_signature()?;
                elems.push(InterfaceElem::Method { name, sig });
            } else {
                elems.push(InterfaceElem::Embedded(self.parse_type()?));
            }
            self.expect_terminator()?;
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(elems)
    }

    fn parse_struct_body(&mut self) -> Result<Vec<FieldDecl>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        self.skip_newlines();
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let start = self.current().span.start;
            let embedded = match self.current_kind() {
                TokenKind::Star => true,
                TokenKind::Ident(_) => matches!(
                    self.peek(1),
                    TokenKind::Newline | TokenKind::Semi | TokenKind::RBrace | TokenKind::Dot | TokenKind::String(_)
                ),
                _ => false,
            };
            let (names, ty) = if embedded {
                (Vec::new(), self.parse_type()?)
            } else {
                let mut names = vec![self.expect_ident()?];
                while self.match_token(&TokenKind::Comma) {
                    names.push(self.expect_ident()?);
                }
                (names, self.parse_type()?)
            };
            // Field tags are accepted and dropped
            if let TokenKind::String(_) = self.current_kind() {
                self.advance();
            }
            fields.push(FieldDecl { names, ty, span: Span::new(start, self.prev_end()) });
            self.expect_terminator()?;
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(fields)
    }

    // =========================================================================
    // Statement Parsing
    // =========================================================================

    /// Parse a braced block, with error recovery inside it.
    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let lbrace = self.expect(&TokenKind::LBrace)?.span.start;
        let old = self.allow_brace_expr;
        self.allow_brace_expr = true;
        self.skip_newlines();

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let parsed = self.parse_stmt().and_then(|stmt| {
                self.expect_terminator()?;
                Ok(stmt)
            });
            match parsed {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    if !self.record_error(e) {
                        self.skip_to_closing_brace();
                        break;
                    }
                    self.synchronize_in_block();
                }
            }
        }

        self.allow_brace_expr = old;
        let rbrace = self.expect(&TokenKind::RBrace)?.span.start;
        Ok(Block { id: self.next_id(), lbrace, rbrace, stmts })
    }

    /// Synchronize within a block - skip to the next statement boundary.
    fn synchronize_in_block(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            match self.current_kind() {
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::Newline | TokenKind::Semi if depth == 0 => {
                    self.skip_newlines();
                    return;
                }
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip to the closing brace of a block.
    fn skip_to_closing_brace(&mut self) {
        let mut depth = 1;
        while !self.at_end() && depth > 0 {
            match self.current_kind() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            if depth > 0 {
                self.advance();
            }
        }
    }

    /// Parse a statement, leaving its terminator in place.
    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;

        if let TokenKind::Ident(name) = self.current_kind() {
            if UNSUPPORTED_STATEMENTS.contains(&name.as_str()) {
                return Err(ParseError::not_supported(&format!("'{}' statements", name), self.current().span));
            }
        }

        let kind = match self.current_kind() {
            TokenKind::Var => {
                self.advance();
                StmtKind::Var(self.parse_group(Self::parse_value_spec)?)
            }
            TokenKind::Const => {
                self.advance();
                StmtKind::Const(self.parse_group(Self::parse_value_spec)?)
            }
            TokenKind::Type => {
                self.advance();
                StmtKind::Type(self.parse_group(Self::parse_type_spec)?)
            }
            TokenKind::Return => {
                self.advance();
                if matches!(self.current_kind(), TokenKind::Newline | TokenKind::Semi | TokenKind::RBrace) {
                    StmtKind::Return(Vec::new())
                } else {
                    StmtKind::Return(self.parse_expr_list()?)
                }
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break(self.parse_label()?)
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue(self.parse_label()?)
            }
            TokenKind::Defer => {
                self.advance();
                StmtKind::Defer(self.parse_expr()?)
            }
            TokenKind::Go => {
                self.advance();
                StmtKind::Go(self.parse_expr()?)
            }
            TokenKind::If => StmtKind::If(self.parse_if()?),
            TokenKind::For => self.parse_for()?,
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Semi | TokenKind::Newline => StmtKind::Empty,
            _ => return self.parse_simple_stmt(),
        };

        Ok(Stmt { id: self.next_id(), kind, span: Span::new(start, self.prev_end()) })
    }

    fn parse_label(&mut self) -> Result<Option<String>, ParseError> {
        if let TokenKind::Ident(_) = self.current_kind() {
            Ok(Some(self.expect_ident()?.name))
        } else {
            Ok(None)
        }
    }

    /// Expression, send, inc/dec, assignment, or short variable declaration.
    fn parse_simple_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;
        let lhs = self.parse_expr_list()?;

        let kind = match self.current_kind() {
            TokenKind::ColonEq => {
                let colon_span = self.current().span;
                self.advance();
                let mut names = Vec::new();
                for expr in lhs {
                    match expr.kind {
                        ExprKind::Ident(name) => names.push(Ident { id: expr.id, name, span: expr.span }),
                        _ => {
                            return Err(ParseError {
                                span: colon_span,
                                message: "non-name on left side of ':='".to_string(),
                                hint: Some("use '=' to assign to fields or elements".to_string()),
                            });
                        }
                    }
                }
                let values = self.parse_expr_list()?;
                StmtKind::Define { names, values }
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let inc = self.check(&TokenKind::PlusPlus);
                self.advance();
                StmtKind::IncDec { target: single(lhs, start)?, inc }
            }
            TokenKind::Arrow => {
                self.advance();
                let value = self.parse_expr()?;
                StmtKind::Send { chan: single(lhs, start)?, value }
            }
            _ => {
                if let Some(op) = self.match_assign_op() {
                    let values = self.parse_expr_list()?;
                    StmtKind::Assign { targets: lhs, op, values }
                } else {
                    StmtKind::Expr(single(lhs, start)?)
                }
            }
        };

        Ok(Stmt { id: self.next_id(), kind, span: Span::new(start, self.prev_end()) })
    }

    fn match_assign_op(&mut self) -> Option<AssignOp> {
        let op = match self.current_kind() {
            TokenKind::Eq => Some(AssignOp::Assign),
            TokenKind::PlusEq => Some(AssignOp::Add),
            TokenKind::MinusEq => Some(AssignOp::Sub),
            TokenKind::StarEq => Some(AssignOp::Mul),
            TokenKind::SlashEq => Some(AssignOp::Div),
            TokenKind::PercentEq => Some(AssignOp::Mod),
            TokenKind::AmpEq => Some(AssignOp::BitAnd),
            TokenKind::PipeEq => Some(AssignOp::BitOr),
            TokenKind::CaretEq => Some(AssignOp::BitXor),
            TokenKind::LtLtEq => Some(AssignOp::Shl),
            TokenKind::GtGtEq => Some(AssignOp::Shr),
            _ => None,
        };
        if op.is_some() {
            self.advance();
        }
        op
    }

    fn parse_if(&mut self) -> Result<IfStmt, ParseError> {
        self.expect(&TokenKind::If)?;
        let old = self.allow_brace_expr;
        self.allow_brace_expr = false;

        let header = self.parse_if_header();
        self.allow_brace_expr = old;
        let (init, cond) = header?;

        let then = self.parse_block()?;
        let els = if self.match_token(&TokenKind::Else) {
            let start = self.current().span.start;
            let stmt = if self.check(&TokenKind::If) {
                let nested = self.parse_if()?;
                Stmt { id: self.next_id(), kind: StmtKind::If(nested), span: Span::new(start, self.prev_end()) }
            } else {
                let block = self.parse_block()?;
                Stmt { id: self.next_id(), kind: StmtKind::Block(block), span: Span::new(start, self.prev_end()) }
            };
            Some(Box::new(stmt))
        } else {
            None
        };

        Ok(IfStmt { init, cond, then, els })
    }

    fn parse_if_header(&mut self) -> Result<(Option<Box<Stmt>>, Expr), ParseError> {
        let first = self.parse_simple_stmt()?;
        if self.match_token(&TokenKind::Semi) {
            let cond = self.parse_expr()?;
            return Ok((Some(Box::new(first)), cond));
        }
        match first.kind {
            StmtKind::Expr(cond) => Ok((None, cond)),
            _ => Err(ParseError {
                span: first.span,
                message: "missing condition in if statement".to_string(),
                hint: Some("write `if init; cond {`".to_string()),
            }),
        }
    }

    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(&TokenKind::For)?;

        if self.check(&TokenKind::LBrace) {
            let body = self.parse_block()?;
            return Ok(StmtKind::For { init: None, cond: None, post: None, body });
        }

        let old = self.allow_brace_expr;
        self.allow_brace_expr = false;
        let header = self.parse_for_header();
        self.allow_brace_expr = old;
        let header = header?;

        let body = self.parse_block()?;
        Ok(match header {
            ForHeader::Range { key, value, define, iterable } => {
                StmtKind::Range { key, value, define, iterable, body }
            }
            ForHeader::Clauses { init, cond, post } => StmtKind::For { init, cond, post, body },
        })
    }

    fn parse_for_header(&mut self) -> Result<ForHeader, ParseError> {
        if self.match_token(&TokenKind::Range) {
            let iterable = self.parse_expr()?;
            return Ok(ForHeader::Range { key: None, value: None, define: false, iterable });
        }

        let init = if self.check(&TokenKind::Semi) {
            None
        } else {
            let lhs = self.parse_expr_list()?;
            let define = self.check(&TokenKind::ColonEq);
            if (define || self.check(&TokenKind::Eq)) && self.peek(1) == &TokenKind::Range {
                self.advance();
                self.advance();
                let iterable = self.parse_expr()?;
                let mut vars = lhs.into_iter();
                let key = vars.next();
                let value = vars.next();
                return Ok(ForHeader::Range { key, value, define, iterable });
            }
            Some(self.finish_simple_stmt(lhs)?)
        };

        if !self.match_token(&TokenKind::Semi) {
            // Condition-only loop: `for cond {`
            let cond = match init {
                Some(stmt) => match stmt.kind {
                    StmtKind::Expr(cond) => Some(cond),
                    _ => {
                        return Err(ParseError {
                            span: stmt.span,
                            message: "expected for loop condition".to_string(),
                            hint: None,
                        });
                    }
                },
                None => None,
            };
            return Ok(ForHeader::Clauses { init: None, cond, post: None });
        }

        let cond = if self.check(&TokenKind::Semi) { None } else { Some(self.parse_expr()?) };
        self.expect(&TokenKind::Semi)?;
        let post = if self.check(&TokenKind::LBrace) {
            None
        } else {
            Some(Box::new(self.parse_simple_stmt()?))
        };
        Ok(ForHeader::Clauses { init: init.map(Box::new), cond, post })
    }

    /// Finish a simple statement whose left side has already been parsed.
    fn finish_simple_stmt(&mut self, lhs: Vec<Expr>) -> Result<Stmt, ParseError> {
        let start = lhs.first().map(|e| e.span.start).unwrap_or(self.current().span.start);
        let kind = if self.match_token(&TokenKind::ColonEq) {
            let mut names = Vec::new();
            for expr in lhs {
                match expr.kind {
                    ExprKind::Ident(name) => names.push(Ident { id: expr.id, name, span: expr.span }),
                    _ => return Err(ParseError::expected("a name", &TokenKind::ColonEq, expr.span)),
                }
            }
            StmtKind::Define { names, values: self.parse_expr_list()? }
        } else if let Some(op) = self.match_assign_op() {
            StmtKind::Assign { targets: lhs, op, values: self.parse_expr_list()? }
        } else if self.check(&TokenKind::PlusPlus) || self.check(&TokenKind::MinusMinus) {
            let inc = self.check(&TokenKind::PlusPlus);
            self.advance();
            StmtKind::IncDec { target: single(lhs, start)?, inc }
        } else {
            StmtKind::Expr(single(lhs, start)?)
        };
        Ok(Stmt { id: self.next_id(), kind, span: Span::new(start, self.prev_end()) })
    }

    // =========================================================================
    // Expression Parsing (Pratt Parser)
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.match_token(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let mut lhs = self.parse_unary()?;

        while let Some((l_bp, r_bp)) = self.infix_bp() {
            if l_bp < min_bp {
                break;
            }
            let op = self.parse_binop()?;
            let rhs = self.parse_expr_bp(r_bp)?;
            let end = rhs.span.end;
            lhs = Expr {
                id: self.next_id(),
                kind: ExprKind::Binary { op, left: Box::new(lhs), right: Box::new(rhs) },
                span: Span::new(start, end),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let op = match self.current_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => None,
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Amp => Some(UnaryOp::Addr),
            TokenKind::Caret => Some(UnaryOp::BitNot),
            TokenKind::Arrow if self.peek(1) != &TokenKind::Chan => Some(UnaryOp::Recv),
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        match op {
            Some(op) => Ok(Expr {
                id: self.next_id(),
                span: Span::new(start, operand.span.end),
                kind: ExprKind::Unary { op, operand: Box::new(operand) },
            }),
            None => Ok(operand),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_operand()?;
        loop {
            expr = match self.current_kind() {
                TokenKind::Dot => self.parse_selector(expr)?,
                TokenKind::LParen => self.parse_call(expr)?,
                TokenKind::LBracket => self.parse_index(expr)?,
                TokenKind::LBrace if self.brace_starts_literal(&expr) => {
                    let start = expr.span.start;
                    let ty = expr_to_type(expr)?;
                    self.parse_composite(Some(ty), start)?
                }
                _ => break,
            };
        }
        Ok(expr)
    }

    /// Whether `{` after `expr` opens a composite literal rather than a block.
    fn brace_starts_literal(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Type(_) => true,
            ExprKind::Ident(_) => self.allow_brace_expr,
            ExprKind::Selector { base, .. } => {
                self.allow_brace_expr && matches!(base.kind, ExprKind::Ident(_))
            }
            _ => false,
        }
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;

        let kind = match self.current_kind().clone() {
            TokenKind::Int(text) => {
                self.advance();
                ExprKind::Int(text)
            }
            TokenKind::Float(text) => {
                self.advance();
                ExprKind::Float(text)
            }
            TokenKind::String(s) => {
                self.advance();
                ExprKind::String(s)
            }
            TokenKind::Char(c) => {
                self.advance();
                ExprKind::Char(c)
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.with_braces(|p| p.parse_expr())?;
                self.expect(&TokenKind::RParen)?;
                ExprKind::Paren(Box::new(inner))
            }
            TokenKind::Func => {
                self.advance();
                let sig = self.parse_signature()?;
                if self.check(&TokenKind::LBrace) {
                    let body = self.parse_block()?;
                    ExprKind::FuncLit { sig, body }
                } else {
                    let span = Span::new(start, self.prev_end());
                    ExprKind::Type(TypeExpr { id: self.next_id(), kind: TypeExprKind::Func(sig), span })
                }
            }
            TokenKind::LBracket | TokenKind::Map | TokenKind::Chan |
            TokenKind::Struct | TokenKind::Interface | TokenKind::Arrow => {
                ExprKind::Type(self.parse_type()?)
            }
            _ => {
                return Err(ParseError::expected("expression", self.current_kind(), self.current().span));
            }
        };

        Ok(Expr { id: self.next_id(), kind, span: Span::new(start, self.prev_end()) })
    }

    fn parse_selector(&mut self, base: Expr) -> Result<Expr, ParseError> {
        let start = base.span.start;
        self.expect(&TokenKind::Dot)?;
        if self.match_token(&TokenKind::LParen) {
            let ty = self.parse_type()?;
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr {
                id: self.next_id(),
                kind: ExprKind::TypeAssert { base: Box::new(base), ty },
                span: Span::new(start, self.prev_end()),
            });
        }
        let sel = self.expect_ident()?;
        let end = sel.span.end;
        Ok(Expr { id: self.next_id(), kind: ExprKind::Selector { base: Box::new(base), sel }, span: Span::new(start, end) })
    }

    fn parse_call(&mut self, func: Expr) -> Result<Expr, ParseError> {
        let start = func.span.start;
        let lparen = self.expect(&TokenKind::LParen)?.span.start;
        let mut args = Vec::new();
        let mut spread = false;

        self.with_braces(|p| {
            p.skip_newlines();
            while !p.check(&TokenKind::RParen) && !p.at_end() {
                args.push(p.parse_expr()?);
                if p.match_token(&TokenKind::Ellipsis) {
                    spread = true;
                }
                if !p.match_token(&TokenKind::Comma) {
                    break;
                }
                p.skip_newlines();
            }
            p.skip_newlines();
            Ok(())
        })?;

        let rparen = self.expect(&TokenKind::RParen)?.span.start;
        Ok(Expr {
            id: self.next_id(),
            kind: ExprKind::Call(CallExpr { func: Box::new(func), args, lparen, rparen, spread }),
            span: Span::new(start, rparen + 1),
        })
    }

    fn parse_index(&mut self, base: Expr) -> Result<Expr, ParseError> {
        let start = base.span.start;
        self.expect(&TokenKind::LBracket)?;

        let kind = self.with_braces(|p| {
            let lo = if p.check(&TokenKind::Colon) { None } else { Some(Box::new(p.parse_expr()?)) };
            if p.match_token(&TokenKind::Colon) {
                let hi = if p.check(&TokenKind::RBracket) { None } else { Some(Box::new(p.parse_expr()?)) };
                Ok(ExprKind::Slice { base: Box::new(base), lo, hi })
            } else {
                match lo {
                    Some(index) => Ok(ExprKind::Index { base: Box::new(base), index }),
                    None => Err(ParseError::expected("expression", p.current_kind(), p.current().span)),
                }
            }
        })?;

        self.expect(&TokenKind::RBracket)?;
        Ok(Expr { id: self.next_id(), kind, span: Span::new(start, self.prev_end()) })
    }

    fn parse_composite(&mut self, ty: Option<TypeExpr>, start: usize) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut elems = Vec::new();

        self.with_braces(|p| {
            p.skip_newlines();
            while !p.check(&TokenKind::RBrace) && !p.at_end() {
                let first = p.parse_element_value()?;
                let elem = if p.match_token(&TokenKind::Colon) {
                    let value = p.parse_element_value()?;
                    Element { key: Some(first), value }
                } else {
                    Element { key: None, value: first }
                };
                elems.push(elem);
                if !p.match_token(&TokenKind::Comma) {
                    break;
                }
                p.skip_newlines();
            }
            p.skip_newlines();
            Ok(())
        })?;

        self.expect(&TokenKind::RBrace)?;
        Ok(Expr { id: self.next_id(), kind: ExprKind::Composite { ty, elems }, span: Span::new(start, self.prev_end()) })
    }

    /// A composite element may elide its type: `{1, 2}` inside `[][]int{...}`.
    fn parse_element_value(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::LBrace) {
            let start = self.current().span.start;
            self.parse_composite(None, start)
        } else {
            self.parse_expr()
        }
    }

    // =========================================================================
    // Operator Precedence
    // =========================================================================

    fn infix_bp(&self) -> Option<(u8, u8)> {
        match self.current_kind() {
            TokenKind::PipePipe => Some((1, 2)),
            TokenKind::AmpAmp => Some((3, 4)),
            TokenKind::EqEq | TokenKind::BangEq | TokenKind::Lt |
            TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => Some((5, 6)),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Pipe | TokenKind::Caret => Some((7, 8)),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent | TokenKind::LtLt |
            TokenKind::GtGt | TokenKind::Amp | TokenKind::AmpCaret => Some((9, 10)),
            _ => None,
        }
    }

    fn parse_binop(&mut self) -> Result<BinOp, ParseError> {
        let op = match self.current_kind() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::GtEq => BinOp::Ge,
            TokenKind::AmpAmp => BinOp::And,
            TokenKind::PipePipe => BinOp::Or,
            TokenKind::Amp => BinOp::BitAnd,
            TokenKind::Pipe => BinOp::BitOr,
            TokenKind::Caret => BinOp::BitXor,
            TokenKind::AmpCaret => BinOp::AndNot,
            TokenKind::LtLt => BinOp::Shl,
            TokenKind::GtGt => BinOp::Shr,
            _ => return Err(ParseError::expected(
                "operator like '+' or '-'",
                self.current_kind(),
                self.current().span,
            )),
        };
        self.advance();
        Ok(op)
    }
}

enum ForHeader {
    Range { key: Option<Expr>, value: Option<Expr>, define: bool, iterable: Expr },
    Clauses { init: Option<Box<Stmt>>, cond: Option<Expr>, post: Option<Box<Stmt>> },
}

/// Exactly one expression, as required by non-assignment statements.
fn single(mut exprs: Vec<Expr>, start: usize) -> Result<Expr, ParseError> {
    if exprs.len() == 1 {
        if let Some(expr) = exprs.pop() {
            return Ok(expr);
        }
    }
    let end = exprs.last().map(|e| e.span.end).unwrap_or(start);
    Err(ParseError {
        span: Span::new(start, end),
        message: "expected 1 expression".to_string(),
        hint: Some("a list of expressions is only valid in an assignment".to_string()),
    })
}

/// Reinterpret the operand before `{` as the literal's type.
fn expr_to_type(expr: Expr) -> Result<TypeExpr, ParseError> {
    let kind = match expr.kind {
        ExprKind::Type(ty) => return Ok(ty),
        ExprKind::Ident(name) => TypeExprKind::Name(Ident { id: expr.id, name, span: expr.span }),
        ExprKind::Selector { base, sel } => match base.kind {
            ExprKind::Ident(pkg) => TypeExprKind::Qualified {
                pkg: Ident { id: base.id, name: pkg, span: base.span },
                name: sel,
            },
            _ => return Err(ParseError::expected("type", &TokenKind::LBrace, expr.span)),
        },
        _ => return Err(ParseError::expected("type", &TokenKind::LBrace, expr.span)),
    };
    Ok(TypeExpr { id: expr.id, kind, span: expr.span })
}

/// Result of parsing one file.
#[derive(Debug)]
pub struct ParseResult {
    pub file: Option<File>,
    pub errors: Vec<ParseError>,
    /// First node id not used by this file.
    pub next_id: u32,
}

impl ParseResult {
    /// Returns true if parsing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.file.is_some()
    }
}

/// A parser error with location and friendly message.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        let message = format!("Expected {}, found {}", expected, found.display_name());
        let hint = crate::hints::for_expected(expected, found).map(String::from);
        Self { span, message, hint }
    }

    fn not_supported(feature: &str, span: Span) -> Self {
        Self {
            span,
            message: format!("{} are not supported", feature),
            hint: Some("rewrite using if/else chains".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plumb_ast::decl::DeclKind;

    fn parse(src: &str) -> File {
        let lexed = plumb_lexer::Lexer::new(src).tokenize();
        assert!(lexed.is_ok(), "Lex errors: {:?}", lexed.errors);
        let result = Parser::new(lexed.tokens).parse();
        assert!(result.errors.is_empty(), "Parse errors: {:?}", result.errors);
        result.file.unwrap()
    }

    fn first_func(file: &File) -> &FuncDecl {
        file.funcs().next().map(|(_, f)| f).unwrap()
    }

    #[test]
    fn grouped_params_share_type() {
        let file = parse("package p\nfunc f(a, b int, c string) {}\n");
        let params = &first_func(&file).sig.params.params;
        let names: Vec<_> = params.iter().map(|p| p.name.as_ref().unwrap().name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(matches!(&params[1].ty.kind, TypeExprKind::Name(n) if n.name == "int"));
    }

    #[test]
    fn unnamed_params_and_receiver() {
        let file = parse("package p\nfunc (t) m(*http.Request, int) {}\n");
        let f = first_func(&file);
        assert!(f.recv.as_ref().unwrap().name.is_none());
        let params = &f.sig.params.params;
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|p| p.name.is_none()));
        assert!(matches!(&params[0].ty.kind, TypeExprKind::Pointer(_)));
    }

    #[test]
    fn param_list_positions() {
        let src = "package p\nfunc f(x int) {}\n";
        let file = parse(src);
        let list = &first_func(&file).sig.params;
        assert_eq!(&src[list.lparen..list.lparen + 1], "(");
        assert_eq!(&src[list.rparen..list.rparen + 1], ")");
    }

    #[test]
    fn body_less_stub_function() {
        let file = parse("package context\nfunc TODO() Context\nfunc Background() Context\n");
        assert_eq!(file.funcs().count(), 2);
        assert!(first_func(&file).body.is_none());
        assert_eq!(first_func(&file).sig.results.len(), 1);
    }

    #[test]
    fn import_block_position() {
        let src = "package p\n\nimport (\n\t\"log\"\n\tnh \"net/http\"\n)\n";
        let file = parse(src);
        let block = file.import_block().unwrap();
        assert_eq!(&src[block.lparen.unwrap()..block.lparen.unwrap() + 1], "(");
        let names: Vec<_> = file.imports().map(|i| i.local_name().to_string()).collect();
        assert_eq!(names, vec!["log", "nh"]);
    }

    #[test]
    fn call_spans_cover_parens() {
        let src = "package p\nfunc f() {\n\tlog.Println(context.TODO())\n}\n";
        let file = parse(src);
        let body = first_func(&file).body.as_ref().unwrap();
        let StmtKind::Expr(expr) = &body.stmts[0].kind else { panic!("expected expression statement") };
        let call = expr.as_call().unwrap();
        assert_eq!(&src[expr.span.start..expr.span.end], "log.Println(context.TODO())");
        let inner = call.args[0].as_call().unwrap();
        assert_eq!(&src[inner.lparen..=inner.rparen], "()");
    }

    #[test]
    fn define_with_multiple_results() {
        let file = parse("package p\nfunc f() {\n\tctx, cancel := context.WithCancel(parent)\n\tdefer cancel()\n}\n");
        let body = first_func(&file).body.as_ref().unwrap();
        assert!(matches!(&body.stmts[0].kind, StmtKind::Define { names, .. } if names.len() == 2));
        assert!(matches!(&body.stmts[1].kind, StmtKind::Defer(_)));
    }

    #[test]
    fn if_with_init_and_composite_in_body() {
        let src = "package p\nfunc f() {\n\tif err := g(); err != nil {\n\t\td := &net.Dialer{}\n\t\t_ = d\n\t} else if x {\n\t}\n}\n";
        let file = parse(src);
        let body = first_func(&file).body.as_ref().unwrap();
        let StmtKind::If(stmt) = &body.stmts[0].kind else { panic!("expected if") };
        assert!(stmt.init.is_some());
        assert!(matches!(stmt.els.as_deref().map(|s| &s.kind), Some(StmtKind::If(_))));
        assert!(matches!(&stmt.then.stmts[0].kind, StmtKind::Define { .. }));
    }

    #[test]
    fn range_loop() {
        let file = parse("package p\nfunc f(m map[string][]string) {\n\tfor k, v := range m {\n\t\t_, _ = k, v\n\t}\n}\n");
        let body = first_func(&file).body.as_ref().unwrap();
        assert!(matches!(&body.stmts[0].kind, StmtKind::Range { define: true, key: Some(_), value: Some(_), .. }));
    }

    #[test]
    fn three_clause_loop() {
        let file = parse("package p\nfunc f() {\n\tfor i := 0; i < 3; i++ {\n\t}\n\tfor {\n\t\tbreak\n\t}\n}\n");
        let body = first_func(&file).body.as_ref().unwrap();
        assert!(matches!(&body.stmts[0].kind, StmtKind::For { init: Some(_), cond: Some(_), post: Some(_), .. }));
        assert!(matches!(&body.stmts[1].kind, StmtKind::For { cond: None, .. }));
    }

    #[test]
    fn immediately_invoked_closure() {
        let file = parse("package p\nfunc g() {\n\tfunc(r *http.Request) {\n\t\ta()\n\t}(nil)\n}\n");
        let body = first_func(&file).body.as_ref().unwrap();
        let StmtKind::Expr(expr) = &body.stmts[0].kind else { panic!("expected call") };
        let call = expr.as_call().unwrap();
        assert!(matches!(call.func.kind, ExprKind::FuncLit { .. }));
    }

    #[test]
    fn inline_interface_and_struct_types() {
        let file = parse("package p\ntype T struct {\n\tA, B int\n\tio.Reader\n}\nvar db interface{ Close(context.Context) error }\n");
        let DeclKind::Type(specs) = &file.decls[0].kind else { panic!("expected type") };
        let TypeExprKind::Struct(fields) = &specs[0].ty.kind else { panic!("expected struct") };
        assert_eq!(fields.len(), 2);
        assert!(fields[1].is_embedded());
        assert!(matches!(&file.decls[1].kind, DeclKind::Var(_)));
    }

    #[test]
    fn single_line_body_with_semicolons() {
        let file = parse("package p\ntype t struct{}\nfunc (t) m() { _ = context.TODO() }\n");
        let f = first_func(&file);
        assert_eq!(f.body.as_ref().unwrap().stmts.len(), 1);
    }

    #[test]
    fn switch_is_reported() {
        let lexed = plumb_lexer::Lexer::new("package p\nfunc f() {\n\tswitch x {\n\t}\n}\n").tokenize();
        let result = Parser::new(lexed.tokens).parse();
        assert!(!result.errors.is_empty());
        assert!(result.errors[0].message.contains("not supported"));
    }

    #[test]
    fn node_ids_continue_from_offset() {
        let lexed = plumb_lexer::Lexer::new("package p\n").tokenize();
        let result = Parser::new(lexed.tokens).starting_at(100).parse();
        assert_eq!(result.file.unwrap().package.id, NodeId(100));
        assert_eq!(result.next_id, 101);
    }
}
