// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatter for diagnostics.
//!
//! ```text
//! warning[direct]: Plumb context
//!   --> server/handler.go:14:6
//!    |
//! 14 |     _ = context.TODO()
//!    |         ^^^^^^^^^^^^^^
//!    = fix: Plumb context.Context (3 edits in 2 files)
//! ```

use std::collections::BTreeSet;

use colored::Colorize;

use plumb_ast::LineMap;

use crate::{Category, Diagnostic, Severity};

/// Formats diagnostics of one file for terminal output.
pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    line_map: LineMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, file_name: None, line_map: LineMap::new(source) }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        self.format_header(&mut out, diagnostic);

        let (line, col) = self.line_map.offset_to_line_col(diagnostic.span.start);
        let file = self.file_name.map(str::to_string).unwrap_or_else(|| diagnostic.file.display().to_string());
        out.push_str(&format!("  {} {}:{}:{}\n", "-->".blue(), file, line, col));

        let gutter = line.to_string().len().max(2);
        if let Some(text) = self.line_map.line_text(self.source, line) {
            out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
            out.push_str(&format!(
                "{:>width$} {} {}\n",
                line.to_string().blue().bold(),
                "|".blue(),
                text,
                width = gutter + 1,
            ));

            let start = (col as usize).saturating_sub(1).min(text.len());
            let end_on_line = diagnostic.span.end.saturating_sub(self.line_map.line_start(diagnostic.span.start));
            let width = end_on_line.min(text.len()).saturating_sub(start).max(1);
            out.push_str(&format!(
                "{} {} {}{}\n",
                " ".repeat(gutter + 1),
                "|".blue(),
                " ".repeat(start),
                "^".repeat(width).red().bold(),
            ));
        }

        if diagnostic.category == Category::Continuation {
            out.push_str(&format!(
                "{} {} {}: the callee gained a context parameter upstream\n",
                " ".repeat(gutter + 1),
                "=".cyan(),
                "note".cyan().bold(),
            ));
        }
        for fix in &diagnostic.fixes {
            let files: BTreeSet<_> = fix.edits.iter().map(|e| &e.file).collect();
            let edits = plural(fix.edits.len(), "edit");
            let summary = if files.len() > 1 {
                format!("{} in {}", edits, plural(files.len(), "file"))
            } else {
                edits
            };
            out.push_str(&format!(
                "{} {} {}: {} ({})\n",
                " ".repeat(gutter + 1),
                "=".cyan(),
                "fix".green().bold(),
                fix.message,
                summary,
            ));
        }
        out
    }

    fn format_header(&self, out: &mut String, diagnostic: &Diagnostic) {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Note => "note".blue().bold(),
        };
        out.push_str(&format!(
            "{}[{}]: {}\n",
            severity,
            diagnostic.category.as_str(),
            diagnostic.message.bold()
        ));
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextEdit;
    use plumb_ast::Span;

    #[test]
    fn renders_location_and_underline() {
        colored::control::set_override(false);
        let src = "package p\n\nfunc f() {\n\t_ = context.TODO()\n}\n";
        let start = src.find("context.TODO").unwrap();
        let diag = Diagnostic::new(Category::Direct, "p/f.go", Span::new(start, start + 14), "Plumb context")
            .with_fix("Plumb context.Context", vec![
                TextEdit::replace("p/f.go", Span::new(start, start + 14), "ctx"),
                TextEdit::insert("p/f.go", 18, "ctx context.Context"),
            ]);

        let out = DiagnosticFormatter::new(src).format(&diag);
        assert!(out.starts_with("warning[direct]: Plumb context\n"));
        assert!(out.contains("--> p/f.go:4:6"));
        assert!(out.contains("|      ^^^^^^^^^^^^^^"));
        assert!(out.contains("= fix: Plumb context.Context (2 edits)"));
    }

    #[test]
    fn continuation_explains_itself() {
        colored::control::set_override(false);
        let src = "x.Dial()\n";
        let diag = Diagnostic::new(Category::Continuation, "a.go", Span::new(0, 8), "Continue plumbing context");
        let out = DiagnosticFormatter::new(src).with_file_name("a.go").format(&diag);
        assert!(out.contains("gained a context parameter upstream"));
    }
}
