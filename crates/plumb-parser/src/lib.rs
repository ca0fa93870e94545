// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for the Go-style source subset.
//!
//! Transforms a token stream into a `File` syntax tree.

mod hints;
mod parser;

pub use parser::{ParseError, ParseResult, Parser};

/// Lex and parse one source file, numbering nodes from `first_id`.
pub fn parse_source(source: &str, first_id: u32) -> Result<ParseResult, Vec<plumb_lexer::LexError>> {
    let lexed = plumb_lexer::Lexer::new(source).tokenize();
    if !lexed.is_ok() {
        return Err(lexed.errors);
    }
    Ok(Parser::new(lexed.tokens).starting_at(first_id).parse())
}
