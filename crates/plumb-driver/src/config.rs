// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Driver configuration.

use std::path::PathBuf;

use crate::error::DriverError;

/// Environment variable naming the module cache.
pub const MODCACHE_ENV: &str = "PLUMB_MODCACHE";

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Root of the source tree; import paths are relative to it.
    pub src_root: PathBuf,
    /// Read-only module cache. Resolved from the environment when unset.
    pub modcache: Option<PathBuf>,
    /// Write suggested fixes back to disk.
    pub apply: bool,
    /// JSON file carrying facts between invocations.
    pub facts_path: Option<PathBuf>,
    /// Package patterns selecting the reported units.
    pub patterns: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            src_root: PathBuf::from("."),
            modcache: None,
            apply: false,
            facts_path: None,
            patterns: vec!["./...".to_string()],
        }
    }
}

impl DriverConfig {
    /// Configuration rooted at `src_root`, reporting every package.
    pub fn with_root(src_root: impl Into<PathBuf>) -> Self {
        Self { src_root: src_root.into(), ..Self::default() }
    }

    pub fn with_modcache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.modcache = Some(dir.into());
        self
    }

    pub fn with_apply(mut self, apply: bool) -> Self {
        self.apply = apply;
        self
    }

    pub fn with_facts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.facts_path = Some(path.into());
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        self
    }

    /// The module cache: the configured directory, then `PLUMB_MODCACHE`,
    /// then `$HOME/.plumb/pkg/mod`.
    pub fn modcache_dir(&self) -> Result<PathBuf, DriverError> {
        resolve_modcache(
            self.modcache.clone(),
            std::env::var(MODCACHE_ENV).ok(),
            std::env::var_os("HOME").map(PathBuf::from),
        )
    }
}

fn resolve_modcache(
    explicit: Option<PathBuf>,
    env: Option<String>,
    home: Option<PathBuf>,
) -> Result<PathBuf, DriverError> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = env.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    match home {
        Some(home) => Ok(home.join(".plumb").join("pkg").join("mod")),
        None => Err(DriverError::NoModcache { env: MODCACHE_ENV }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_modcache_wins() {
        let dir = resolve_modcache(Some("/flag".into()), Some("/env".into()), Some("/home/u".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/flag"));
    }

    #[test]
    fn environment_before_home() {
        let dir = resolve_modcache(None, Some("/env".into()), Some("/home/u".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/env"));

        let dir = resolve_modcache(None, Some(String::new()), Some("/home/u".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.plumb/pkg/mod"));
    }

    #[test]
    fn no_modcache_is_an_error() {
        assert!(matches!(resolve_modcache(None, None, None), Err(DriverError::NoModcache { .. })));
    }

    #[test]
    fn empty_patterns_keep_default() {
        let config = DriverConfig::with_root("/src").with_patterns(Vec::new());
        assert_eq!(config.patterns, vec!["./...".to_string()]);
    }
}
