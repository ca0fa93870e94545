// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for the Go-style source subset.

mod lexer;

pub use lexer::{LexError, LexResult, Lexer};
