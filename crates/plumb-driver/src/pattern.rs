// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Package patterns: `./...`, `dir/...` and exact import paths.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pattern {
    All,
    /// A package and everything below it.
    Tree(String),
    Exact(String),
}

impl Pattern {
    pub fn parse(text: &str) -> Pattern {
        let text = text.strip_prefix("./").unwrap_or(text);
        match text {
            "..." | "" => Pattern::All,
            _ => match text.strip_suffix("/...") {
                Some(dir) => Pattern::Tree(dir.to_string()),
                None => Pattern::Exact(text.trim_end_matches('/').to_string()),
            },
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::All => true,
            Pattern::Tree(dir) => path == dir || path.strip_prefix(dir.as_str()).is_some_and(|rest| rest.starts_with('/')),
            Pattern::Exact(exact) => path == exact,
        }
    }
}

/// Whether any of `patterns` selects `path`.
pub(crate) fn any_match(patterns: &[Pattern], path: &str) -> bool {
    patterns.iter().any(|p| p.matches(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pattern_forms() {
        assert_eq!(Pattern::parse("./..."), Pattern::All);
        assert_eq!(Pattern::parse("./multi/..."), Pattern::Tree("multi".into()));
        assert_eq!(Pattern::parse("multi/consumer"), Pattern::Exact("multi/consumer".into()));
        assert_eq!(Pattern::parse("./basic/"), Pattern::Exact("basic".into()));
    }

    #[test]
    fn tree_matches_whole_segments() {
        let tree = Pattern::parse("multi/...");
        assert!(tree.matches("multi"));
        assert!(tree.matches("multi/producer"));
        assert!(!tree.matches("multiple"));
        assert!(any_match(&[Pattern::Exact("basic".into()), tree], "basic"));
    }
}
