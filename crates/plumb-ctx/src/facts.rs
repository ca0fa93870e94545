// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cross-unit facts: which exported functions now require a context.
//!
//! A fact is keyed by the stable function identity (`path.Name` or
//! `path.Recv.Name`). Facts are only ever added.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage for "needs context" facts shared between passes.
pub trait FactStore {
    /// Whether the function identified by `key` needs a context argument.
    fn has(&self, key: &str) -> bool;

    /// Record that `key` needs a context. Returns `false` if it already did.
    fn export(&mut self, key: &str) -> bool;
}

#[derive(Debug, Error)]
pub enum FactsError {
    #[error("failed to access facts file {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("malformed facts file {}: {source}", path.display())]
    Format { path: PathBuf, source: serde_json::Error },
}

const FACTS_VERSION: u32 = 1;

/// In-memory fact store, persisted as JSON between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFacts {
    version: u32,
    needs_context: BTreeSet<String>,
}

impl MemoryFacts {
    pub fn new() -> Self {
        Self { version: FACTS_VERSION, needs_context: BTreeSet::new() }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.needs_context.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.needs_context.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needs_context.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self, FactsError> {
        let text = fs::read_to_string(path).map_err(|source| FactsError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text).map_err(|source| FactsError::Format { path: path.to_path_buf(), source })
    }

    pub fn save(&self, path: &Path) -> Result<(), FactsError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|source| FactsError::Format { path: path.to_path_buf(), source })?;
        fs::write(path, text + "\n").map_err(|source| FactsError::Io { path: path.to_path_buf(), source })
    }
}

impl Default for MemoryFacts {
    fn default() -> Self {
        Self::new()
    }
}

impl FactStore for MemoryFacts {
    fn has(&self, key: &str) -> bool {
        self.needs_context.contains(key)
    }

    fn export(&mut self, key: &str) -> bool {
        self.needs_context.insert(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_is_idempotent() {
        let mut facts = MemoryFacts::new();
        assert!(facts.export("multi/producer.Dial"));
        assert!(!facts.export("multi/producer.Dial"));
        assert_eq!(facts.len(), 1);
        assert!(facts.has("multi/producer.Dial"));
        assert!(!facts.has("multi/producer.Client.Noop"));
    }

    #[test]
    fn survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.json");
        let mut facts = MemoryFacts::new();
        facts.export("svc.Client.Close");
        facts.save(&path).unwrap();

        let loaded = MemoryFacts::load(&path).unwrap();
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["svc.Client.Close"]);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.json");
        fs::write(&path, "{not json").unwrap();
        let err = MemoryFacts::load(&path).unwrap_err();
        assert!(matches!(err, FactsError::Format { .. }));
    }
}
