// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Applying text edits to source.

use std::collections::BTreeMap;
use std::path::PathBuf;

use plumb_ast::Span;
use thiserror::Error;

use crate::{Diagnostic, TextEdit};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApplyError {
    #[error("{}: overlapping edits at {}..{} and {}..{}", file.display(), first.start, first.end, second.start, second.end)]
    Overlap { file: PathBuf, first: Span, second: Span },

    #[error("{}: edit {}..{} is outside the source ({len} bytes)", file.display(), span.start, span.end)]
    OutOfRange { file: PathBuf, span: Span, len: usize },
}

/// Collect the edits of every fix, grouped per file.
pub fn edits_by_file<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> BTreeMap<PathBuf, Vec<TextEdit>> {
    let mut files: BTreeMap<PathBuf, Vec<TextEdit>> = BTreeMap::new();
    for diag in diagnostics {
        for edit in diag.edits() {
            files.entry(edit.file.clone()).or_default().push(edit.clone());
        }
    }
    files
}

/// Apply edits of one file to `source`.
///
/// Identical edits are applied once. Insertions at the start of a replaced
/// range go before the replacement. Any other overlap is an error.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String, ApplyError> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.span.start, e.span.end));
    sorted.dedup_by(|b, a| a.span == b.span && a.new_text == b.new_text);

    for edit in &sorted {
        let Span { start, end } = edit.span;
        if start > end || end > source.len() || !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return Err(ApplyError::OutOfRange { file: edit.file.clone(), span: edit.span, len: source.len() });
        }
    }
    for pair in sorted.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if first.span.end > second.span.start {
            return Err(ApplyError::Overlap { file: second.file.clone(), first: first.span, second: second.span });
        }
    }

    let mut out = source.to_string();
    for edit in sorted.iter().rev() {
        out.replace_range(edit.span.start..edit.span.end, &edit.new_text);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(at: usize, text: &str) -> TextEdit {
        TextEdit::insert("f.go", at, text)
    }

    fn replace(start: usize, end: usize, text: &str) -> TextEdit {
        TextEdit::replace("f.go", Span::new(start, end), text)
    }

    #[test]
    fn edits_apply_in_any_order() {
        let src = "func f() { g() }";
        let edits = vec![insert(13, "ctx"), insert(7, "ctx context.Context")];
        assert_eq!(apply_edits(src, &edits).unwrap(), "func f(ctx context.Context) { g(ctx) }");
    }

    #[test]
    fn duplicate_edits_apply_once() {
        let src = "import (\n)";
        let edits = vec![insert(8, "\n\t\"context\""), insert(8, "\n\t\"context\"")];
        assert_eq!(apply_edits(src, &edits).unwrap(), "import (\n\t\"context\"\n)");
    }

    #[test]
    fn insert_before_replacement_at_same_offset() {
        let src = "x := context.TODO()";
        let edits = vec![replace(5, 19, "ctx"), insert(5, "/*a*/")];
        assert_eq!(apply_edits(src, &edits).unwrap(), "x := /*a*/ctx");
    }

    #[test]
    fn overlapping_replacements_are_rejected() {
        let err = apply_edits("abcdef", &[replace(0, 3, "x"), replace(2, 4, "y")]).unwrap_err();
        assert!(matches!(err, ApplyError::Overlap { .. }));
    }

    #[test]
    fn insert_inside_replacement_is_rejected() {
        let err = apply_edits("abcdef", &[replace(0, 4, "x"), insert(2, "y")]).unwrap_err();
        assert!(matches!(err, ApplyError::Overlap { .. }));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let err = apply_edits("abc", &[replace(2, 9, "x")]).unwrap_err();
        assert!(err.to_string().contains("outside the source"));
    }
}
