// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON diagnostic output for machine consumption.
//!
//! Use `--format json` to get this output. Locations are 1-based
//! line/column pairs plus the raw byte offsets the edits refer to.

use std::path::Path;

use plumb_ast::LineMap;
use serde::Serialize;

use crate::{Diagnostic, Severity};

/// A complete JSON report for one run.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub diagnostics: Vec<JsonDiagnostic>,
    pub warning_count: usize,
    pub note_count: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub file: String,
    pub category: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LineCol>,
    pub byte_offset: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<JsonFix>,
}

/// Line/column pair (1-based).
#[derive(Debug, Serialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonFix {
    pub message: String,
    pub edits: Vec<JsonEdit>,
}

#[derive(Debug, Serialize)]
pub struct JsonEdit {
    pub file: String,
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

/// Build a report; `source_of` supplies file text for line/column lookup.
pub fn to_json_report<'s>(
    diagnostics: &[Diagnostic],
    source_of: impl Fn(&Path) -> Option<&'s str>,
) -> DiagnosticReport {
    let mut warning_count = 0;
    let mut note_count = 0;

    let diagnostics = diagnostics
        .iter()
        .map(|d| {
            match d.severity {
                Severity::Error | Severity::Warning => warning_count += 1,
                Severity::Note => note_count += 1,
            }
            let location = source_of(&d.file).map(|src| {
                let (line, column) = LineMap::new(src).offset_to_line_col(d.span.start);
                LineCol { line: line as usize, column: column as usize }
            });
            JsonDiagnostic {
                file: d.file.display().to_string(),
                category: d.category.as_str().to_string(),
                severity: match d.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Note => "note",
                }
                .to_string(),
                message: d.message.clone(),
                location,
                byte_offset: d.span.start,
                fixes: d
                    .fixes
                    .iter()
                    .map(|f| JsonFix {
                        message: f.message.clone(),
                        edits: f
                            .edits
                            .iter()
                            .map(|e| JsonEdit {
                                file: e.file.display().to_string(),
                                start: e.span.start,
                                end: e.span.end,
                                new_text: e.new_text.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            }
        })
        .collect();

    DiagnosticReport { version: 1, diagnostics, warning_count, note_count }
}

/// Serialize a report to pretty JSON.
pub fn to_json_string(report: &DiagnosticReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, TextEdit};
    use plumb_ast::Span;

    #[test]
    fn report_counts_and_locates() {
        let src = "package p\nfunc f() {}\n";
        let diags = vec![
            Diagnostic::new(Category::Direct, "p/a.go", Span::new(15, 16), "Plumb context")
                .with_fix("Plumb context.Context", vec![TextEdit::insert("p/a.go", 17, "ctx context.Context")]),
            Diagnostic::new(Category::Naming, "p/a.go", Span::new(0, 7), "Name this param if you want plumber to use it"),
        ];
        let report = to_json_report(&diags, |_| Some(src));
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.note_count, 1);

        let value: serde_json::Value = serde_json::from_str(&to_json_string(&report)).unwrap();
        let first = &value["diagnostics"][0];
        assert_eq!(first["location"]["line"], 2);
        assert_eq!(first["location"]["column"], 6);
        assert_eq!(first["fixes"][0]["edits"][0]["new_text"], "ctx context.Context");
        assert!(value["diagnostics"][1].get("fixes").is_none());
    }
}
