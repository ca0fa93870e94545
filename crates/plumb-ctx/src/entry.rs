// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Entry points: functions that may create a root context.

use std::sync::OnceLock;

use plumb_ast::decl::FuncDecl;
use plumb_resolve::{Package, SourceFile};
use regex::Regex;

static TEST_FUNC: OnceLock<Option<Regex>> = OnceLock::new();

fn is_test_name(name: &str) -> bool {
    TEST_FUNC
        .get_or_init(|| Regex::new(r"^(Test|Benchmark|Fuzz)[A-Z]").ok())
        .as_ref()
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `main` of package `main`.
    Main,
    /// A package `init` function.
    Init,
    /// A test, benchmark or fuzz function in a `_test.go` file.
    Test,
}

/// Classify `func` declared in `file` of `pkg`.
pub fn classify(pkg: &Package, file: &SourceFile, func: &FuncDecl) -> Option<EntryKind> {
    if func.recv.is_some() {
        return None;
    }
    match func.name.name.as_str() {
        "main" if pkg.name == "main" => Some(EntryKind::Main),
        "init" => Some(EntryKind::Init),
        name if file.is_test && is_test_name(name) => Some(EntryKind::Test),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_needs_uppercase_follower() {
        assert!(is_test_name("TestFetch"));
        assert!(is_test_name("BenchmarkDial"));
        assert!(is_test_name("FuzzParse"));
        assert!(!is_test_name("Testify"));
        assert!(!is_test_name("helperTest"));
    }
}
