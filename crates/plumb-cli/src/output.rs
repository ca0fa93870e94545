// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! CLI output formatting with colors and styling.
//!
//! Respects NO_COLOR and FORCE_COLOR environment variables.

use colored::{ColoredString, Colorize};

/// Initialize color support based on environment.
/// Call once at startup.
pub fn init() {
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    } else if std::env::var("FORCE_COLOR").is_ok() {
        colored::control::set_override(true);
    }
}

pub fn error_label() -> ColoredString {
    "error".red().bold()
}

pub fn warning_label() -> ColoredString {
    "warning".yellow().bold()
}

pub fn file_path(path: &str) -> ColoredString {
    path.underline()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// `3 warnings, 1 note`
pub fn summary(warnings: usize, notes: usize) -> String {
    let mut parts = Vec::new();
    if warnings > 0 {
        parts.push(plural(warnings, "warning").yellow().bold().to_string());
    }
    if notes > 0 {
        parts.push(plural(notes, "note").cyan().to_string());
    }
    parts.join(", ")
}

pub fn clean(units: usize) -> String {
    format!("{} {}", "ok".green().bold(), format!("({} analyzed, no context requests)", plural(units, "package")).dimmed())
}

pub fn fixed(files: usize) -> String {
    format!("{} {}", "fixed".green().bold(), plural(files, "file"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_pluralizes() {
        colored::control::set_override(false);
        assert_eq!(summary(1, 0), "1 warning");
        assert_eq!(summary(3, 2), "3 warnings, 2 notes");
        assert_eq!(fixed(2), "fixed 2 files");
    }
}
