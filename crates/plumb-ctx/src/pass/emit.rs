// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Text edits produced by the pass.

use plumb_ast::LineMap;
use plumb_diagnostics::{sort_diagnostics, Diagnostic, TextEdit};
use tracing::{debug, info};

use super::scope_index::FuncRef;
use super::{CallSite, Plumber};

impl<'p> Plumber<'p> {
    /// `ctx := <expr>` as the first statement of `func`.
    pub(super) fn declare_ctx(&self, func: FuncRef<'p>, expr: &str) -> Option<TextEdit> {
        let body = func.func.body.as_ref()?;
        let source = self.source(func.file);
        let at = body.lbrace + 1;

        let own_line = body
            .stmts
            .first()
            .and_then(|first| source.get(at..first.span.start).map(|gap| (first, gap)))
            .filter(|(_, gap)| gap.contains('\n'));
        let text = match own_line {
            Some((first, _)) => {
                let indent = LineMap::new(source).indent_at(source, first.span.start);
                format!("\n{}ctx := {}", indent, expr)
            }
            None => format!(" ctx := {};", expr),
        };
        Some(TextEdit::insert(self.file_path(func.file), at, text))
    }

    /// Prepend `ctx context.Context` to the parameters of `func`.
    pub(super) fn add_param(&self, func: FuncRef<'p>) -> TextEdit {
        let params = &func.func.sig.params;
        let text = if params.params.is_empty() {
            "ctx context.Context".to_string()
        } else {
            "ctx context.Context, ".to_string()
        };
        TextEdit::insert(self.file_path(func.file), params.lparen + 1, text)
    }

    pub(super) fn prepend_arg(&self, site: CallSite<'p>, expr: &str) -> TextEdit {
        let text = if site.call.args.is_empty() { expr.to_string() } else { format!("{}, ", expr) };
        TextEdit::insert(self.file_path(site.file), site.call.lparen + 1, text)
    }

    /// Import "context" into `file`, once.
    pub(super) fn import_context(&mut self, file: usize) -> Option<TextEdit> {
        if !self.imported.insert(file) {
            return None;
        }
        let source = self.pkg.files.get(file)?;
        info!(file = %source.path.display(), "adding context import");

        if let Some(lparen) = source.ast.import_block().and_then(|group| group.lparen) {
            return Some(TextEdit::insert(&source.path, lparen + 1, "\n\t\"context\""));
        }
        let at = match source.ast.decls.first() {
            Some(decl) => decl.span.start,
            None => source.ast.package.span.end,
        };
        let text = if source.ast.decls.is_empty() { "\n\nimport \"context\"" } else { "import \"context\"\n\n" };
        Some(TextEdit::insert(&source.path, at, text))
    }

    /// Drop diagnostics about or editing read-only source and order the rest.
    pub(crate) fn finish(self) -> Vec<Diagnostic> {
        if !self.unknown.is_empty() {
            debug!(count = self.unknown.len(), "calls without a static target were not followed");
        }
        let config = self.config;
        let mut diagnostics: Vec<Diagnostic> = self
            .diagnostics
            .into_iter()
            .filter(|diag| {
                let readonly = config.is_readonly(&diag.file) || diag.edits().any(|e| config.is_readonly(&e.file));
                if readonly {
                    debug!(file = %diag.file.display(), "dropping diagnostic in read-only source");
                }
                !readonly
            })
            .collect();
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }
}
