// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.

use plumb_ast::token::TokenKind;

/// Get a hint for an "expected X" error based on context.
pub fn for_expected(expected: &str, found: &TokenKind) -> Option<&'static str> {
    match (expected, found) {
        ("'{'", _) => Some("blocks start with '{'"),
        ("'}'", _) => Some("every '{' needs a matching '}'"),
        ("')'", TokenKind::Eof) => Some("add ')' to close the parenthesis"),
        ("']'", TokenKind::Eof) => Some("add ']' to close the bracket"),
        ("expression", TokenKind::Newline) => Some("statement is incomplete"),
        ("expression", _) => Some("try a value, variable, or function call"),
        ("type", _) => Some("types look like: T, pkg.T, *T, []T, map[K]V, func(...)"),
        ("'package'", _) => Some("every file starts with a package clause"),
        ("newline or ';'", _) => Some("put each statement on its own line"),
        _ => None,
    }
}
