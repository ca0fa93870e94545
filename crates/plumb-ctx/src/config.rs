// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Pass configuration.

use std::path::{Path, PathBuf};

/// Options for one run of the context-plumbing pass.
#[derive(Debug, Clone, Default)]
pub struct PassConfig {
    /// Source under this prefix is never rewritten. Required.
    pub readonly_prefix: Option<PathBuf>,
}

impl PassConfig {
    pub fn new(readonly_prefix: impl Into<PathBuf>) -> Self {
        Self { readonly_prefix: Some(readonly_prefix.into()) }
    }

    /// Whether `path` lies under the read-only prefix.
    pub fn is_readonly(&self, path: &Path) -> bool {
        self.readonly_prefix.as_deref().map(|p| path.starts_with(p)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matches_whole_components() {
        let config = PassConfig::new("/home/u/.plumb/pkg/mod");
        assert!(config.is_readonly(Path::new("/home/u/.plumb/pkg/mod/example.com/lib/lib.go")));
        assert!(!config.is_readonly(Path::new("/home/u/.plumb/pkg/module/x.go")));
        assert!(!PassConfig::default().is_readonly(Path::new("/anything")));
    }
}
