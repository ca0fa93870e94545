// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The lexer implementation using logos.

use logos::Logos;
use plumb_ast::token::{Token, TokenKind};
use plumb_ast::Span;

/// Raw token type for logos - values are parsed in a second pass.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]  // Skip horizontal whitespace (not newlines)
enum RawToken {
    // === Keywords ===
    #[token("break")]
    Break,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("struct")]
    Struct,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    // === Operators (longest match wins) ===
    #[token("...")]
    Ellipsis,
    #[token("<<=")]
    LtLtEq,
    #[token(">>=")]
    GtGtEq,
    #[token(":=")]
    ColonEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<-")]
    Arrow,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token("&^")]
    AmpCaret,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,
    #[token(".")]
    Dot,

    // === Delimiters ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    // Kept as a token: a block comment spanning lines acts as a line break.
    #[token("/*", block_comment)]
    BlockComment,

    // === Literals ===
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[bB][01_]+")]
    #[regex(r"0[oO][0-7_]+")]
    #[regex(r"[0-9][0-9_]*")]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+")]
    Float,

    #[regex(r"'([^'\\\n]|\\.|\\x[0-9a-fA-F]{2}|\\u[0-9a-fA-F]{4})'")]
    Char,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r"`[^`]*`")]
    RawString,

    // === Identifier (must come after keywords) ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

/// The lexer for Go-style source code.
///
/// Line breaks are only emitted as `Newline` tokens where they end a
/// statement, i.e. after an identifier, literal, closing delimiter,
/// `return`, `break`, `continue`, `++` or `--`.
pub struct Lexer<'a> {
    source: &'a str,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self { source, errors: Vec::new() }
    }

    /// Tokenize the entire source, collecting multiple errors.
    pub fn tokenize(&mut self) -> LexResult {
        let mut tokens: Vec<Token> = Vec::new();
        let mut logos_lexer = RawToken::lexer(self.source);

        while let Some(result) = logos_lexer.next() {
            if self.errors.len() >= MAX_ERRORS {
                break;
            }

            let span = logos_lexer.span();
            let slice = logos_lexer.slice();

            let raw = match result {
                Ok(raw) => raw,
                Err(()) => {
                    let ch = self.source[span.start..].chars().next().unwrap_or('?');
                    self.errors.push(LexError::unexpected_char(ch, span.start));
                    continue;
                }
            };

            let line_break = match raw {
                RawToken::Newline => true,
                RawToken::BlockComment => slice.contains('\n'),
                _ => false,
            };
            if matches!(raw, RawToken::Newline | RawToken::BlockComment) {
                if line_break && ends_statement(&tokens) {
                    tokens.push(Token {
                        kind: TokenKind::Newline,
                        span: Span::new(span.start, span.start + 1),
                    });
                }
                continue;
            }

            match self.convert_token(raw, slice, span.start) {
                Ok(kind) => tokens.push(Token {
                    kind,
                    span: Span::new(span.start, span.end),
                }),
                Err(e) => self.errors.push(e),
            }
        }

        let end = self.source.len();
        if ends_statement(&tokens) {
            tokens.push(Token { kind: TokenKind::Newline, span: Span::point(end) });
        }
        tokens.push(Token { kind: TokenKind::Eof, span: Span::point(end) });

        LexResult {
            tokens,
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Convert a raw logos token to our TokenKind, parsing literals.
    fn convert_token(&self, raw: RawToken, slice: &str, start: usize) -> Result<TokenKind, LexError> {
        Ok(match raw {
            RawToken::Break => TokenKind::Break,
            RawToken::Chan => TokenKind::Chan,
            RawToken::Const => TokenKind::Const,
            RawToken::Continue => TokenKind::Continue,
            RawToken::Defer => TokenKind::Defer,
            RawToken::Else => TokenKind::Else,
            RawToken::For => TokenKind::For,
            RawToken::Func => TokenKind::Func,
            RawToken::Go => TokenKind::Go,
            RawToken::If => TokenKind::If,
            RawToken::Import => TokenKind::Import,
            RawToken::Interface => TokenKind::Interface,
            RawToken::Map => TokenKind::Map,
            RawToken::Package => TokenKind::Package,
            RawToken::Range => TokenKind::Range,
            RawToken::Return => TokenKind::Return,
            RawToken::Struct => TokenKind::Struct,
            RawToken::Type => TokenKind::Type,
            RawToken::Var => TokenKind::Var,

            RawToken::Ellipsis => TokenKind::Ellipsis,
            RawToken::LtLtEq => TokenKind::LtLtEq,
            RawToken::GtGtEq => TokenKind::GtGtEq,
            RawToken::ColonEq => TokenKind::ColonEq,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::BangEq => TokenKind::BangEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::PlusPlus => TokenKind::PlusPlus,
            RawToken::MinusMinus => TokenKind::MinusMinus,
            RawToken::LtLt => TokenKind::LtLt,
            RawToken::GtGt => TokenKind::GtGt,
            RawToken::AmpCaret => TokenKind::AmpCaret,
            RawToken::PlusEq => TokenKind::PlusEq,
            RawToken::MinusEq => TokenKind::MinusEq,
            RawToken::StarEq => TokenKind::StarEq,
            RawToken::SlashEq => TokenKind::SlashEq,
            RawToken::PercentEq => TokenKind::PercentEq,
            RawToken::AmpEq => TokenKind::AmpEq,
            RawToken::PipeEq => TokenKind::PipeEq,
            RawToken::CaretEq => TokenKind::CaretEq,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Caret => TokenKind::Caret,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Eq => TokenKind::Eq,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Dot => TokenKind::Dot,

            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Semi => TokenKind::Semi,
            RawToken::Comma => TokenKind::Comma,

            RawToken::Int => TokenKind::Int(slice.to_string()),
            RawToken::Float => TokenKind::Float(slice.to_string()),
            RawToken::Char => {
                let inner = &slice[1..slice.len() - 1];
                TokenKind::Char(parse_char(inner, start)?)
            }
            RawToken::String => {
                let inner = &slice[1..slice.len() - 1];
                TokenKind::String(parse_string(inner, start)?)
            }
            RawToken::RawString => {
                // Raw strings drop carriage returns and process no escapes
                let inner = &slice[1..slice.len() - 1];
                TokenKind::String(inner.replace('\r', ""))
            }
            RawToken::Ident => TokenKind::Ident(slice.to_string()),

            RawToken::Newline | RawToken::LineComment | RawToken::BlockComment => {
                unreachable!("line breaks and comments are handled by tokenize")
            }
        })
    }
}

/// Consume a block comment up to its closing `*/`. Block comments do not nest.
fn block_comment(lexer: &mut logos::Lexer<RawToken>) -> bool {
    match lexer.remainder().find("*/") {
        Some(end) => {
            lexer.bump(end + 2);
            true
        }
        None => {
            // Unterminated: swallow the rest so the error is reported once
            lexer.bump(lexer.remainder().len());
            false
        }
    }
}

/// Whether a line break after the last emitted token terminates a statement.
fn ends_statement(tokens: &[Token]) -> bool {
    tokens.last().map(|t| t.kind.ends_statement()).unwrap_or(false)
}

/// Parse a rune literal (handling escape sequences).
fn parse_char(s: &str, pos: usize) -> Result<char, LexError> {
    let mut chars = s.chars();
    match chars.next() {
        Some('\\') => parse_escape(&mut chars, pos),
        Some(c) => Ok(c),
        None => Err(LexError::invalid_escape(pos)),
    }
}

/// Parse an interpreted string literal (handling escape sequences).
fn parse_string(s: &str, pos: usize) -> Result<String, LexError> {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            result.push(parse_escape(&mut chars, pos)?);
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

/// Parse an escape sequence.
fn parse_escape(chars: &mut impl Iterator<Item = char>, pos: usize) -> Result<char, LexError> {
    match chars.next() {
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),
        Some('a') => Ok('\u{7}'),
        Some('b') => Ok('\u{8}'),
        Some('f') => Ok('\u{c}'),
        Some('v') => Ok('\u{b}'),
        Some('\\') => Ok('\\'),
        Some('\'') => Ok('\''),
        Some('"') => Ok('"'),
        Some('x') => parse_hex_escape(chars, 2, pos),
        Some('u') => parse_hex_escape(chars, 4, pos),
        Some(d @ '0'..='7') => {
            let mut value = d.to_digit(8).unwrap_or(0);
            for _ in 0..2 {
                let digit = chars.next().and_then(|c| c.to_digit(8)).ok_or(LexError::invalid_escape(pos))?;
                value = value * 8 + digit;
            }
            char::from_u32(value).ok_or(LexError::invalid_escape(pos))
        }
        _ => Err(LexError::invalid_escape(pos)),
    }
}

/// Parse `\xHH` or `\uHHHH`.
fn parse_hex_escape(chars: &mut impl Iterator<Item = char>, digits: usize, pos: usize) -> Result<char, LexError> {
    let hex: String = chars.take(digits).collect();
    if hex.len() != digits {
        return Err(LexError::invalid_escape(pos));
    }
    let code_point = u32::from_str_radix(&hex, 16).map_err(|_| LexError::invalid_escape(pos))?;
    char::from_u32(code_point).ok_or(LexError::invalid_escape(pos))
}

/// Result of lexing: tokens plus any errors found.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexResult {
    /// Returns true if lexing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A lexer error with location and friendly message.
#[derive(Debug, Clone)]
pub struct LexError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LexError {}

impl LexError {
    fn unexpected_char(ch: char, pos: usize) -> Self {
        let hint = match ch {
            '"' => Some("Add a closing '\"' on the same line".to_string()),
            '`' => Some("Add a closing '`'".to_string()),
            '/' => Some("Close the block comment with '*/'".to_string()),
            _ => None,
        };
        Self {
            span: Span::new(pos, pos + ch.len_utf8()),
            message: format!("Unexpected character '{}'", ch),
            hint,
        }
    }

    fn invalid_escape(pos: usize) -> Self {
        Self {
            span: Span::new(pos, pos + 1),
            message: "Invalid escape sequence".to_string(),
            hint: Some("Valid: \\n \\r \\t \\\\ \\' \\\" \\xHH \\uHHHH \\NNN".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let result = Lexer::new(src).tokenize();
        assert!(result.is_ok(), "Lex errors: {:?}", result.errors);
        result.tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn newline_terminates_after_call() {
        let toks = kinds("a()\nb");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Newline,
                TokenKind::Ident("b".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn newline_after_operator_is_dropped() {
        let toks = kinds("x := a +\n\tb");
        assert!(!toks[..toks.len() - 2].contains(&TokenKind::Newline));
        assert_eq!(toks[1], TokenKind::ColonEq);
    }

    #[test]
    fn newline_after_open_brace_is_dropped() {
        let toks = kinds("func f() {\n}");
        assert_eq!(toks.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn comments_are_skipped() {
        let toks = kinds("a // trailing\n/* inline */ b");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Newline,
                TokenKind::Ident("b".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn multiline_block_comment_acts_as_line_break() {
        let toks = kinds("a /* one\ntwo */ b");
        assert_eq!(toks[1], TokenKind::Newline);
    }

    #[test]
    fn header_comment_before_package() {
        let toks = kinds("/* Copyright header\n * more */\npackage p\n");
        assert_eq!(toks[0], TokenKind::Package);
    }

    #[test]
    fn block_comment_with_stars_and_slashes() {
        let toks = kinds("a /** x / y **/ + /*/ */ b");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Plus,
                TokenKind::Ident("b".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let result = Lexer::new("a /* never closed\nb").tokenize();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].span.start, 2);
        assert!(result.errors[0].hint.as_deref().is_some_and(|h| h.contains("*/")));
    }

    #[test]
    fn strings_and_raw_strings() {
        let toks = kinds(r#"f("a\tb", `c\d`)"#);
        assert_eq!(toks[2], TokenKind::String("a\tb".into()));
        assert_eq!(toks[4], TokenKind::String("c\\d".into()));
    }

    #[test]
    fn operators_longest_match() {
        let toks = kinds("x := <-ch; y <<= 1; f(xs...)");
        assert!(toks.contains(&TokenKind::ColonEq));
        assert!(toks.contains(&TokenKind::Arrow));
        assert!(toks.contains(&TokenKind::LtLtEq));
        assert!(toks.contains(&TokenKind::Ellipsis));
    }

    #[test]
    fn keywords_and_numbers() {
        let toks = kinds("package p; var x = 0x1F + 1.5e3");
        assert_eq!(toks[0], TokenKind::Package);
        assert!(toks.contains(&TokenKind::Var));
        assert!(toks.contains(&TokenKind::Int("0x1F".into())));
        assert!(toks.contains(&TokenKind::Float("1.5e3".into())));
    }

    #[test]
    fn spans_are_byte_offsets() {
        let result = Lexer::new("ab  cd").tokenize();
        assert_eq!(result.tokens[1].span, Span::new(4, 6));
    }

    #[test]
    fn unterminated_string_reports_error() {
        let result = Lexer::new("x := \"abc\n").tokenize();
        assert!(!result.is_ok());
        assert!(result.errors[0].hint.is_some());
    }
}
