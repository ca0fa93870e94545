// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Driver errors.

use std::path::PathBuf;

use plumb_ctx::{FactsError, PassError};
use plumb_diagnostics::ApplyError;
use plumb_resolve::PackageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot locate the module cache; pass --modcache, set {env} or set HOME")]
    NoModcache { env: &'static str },

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Pass(#[from] PassError),

    #[error(transparent)]
    Facts(#[from] FactsError),

    #[error("cannot apply fixes to {}: {source}", path.display())]
    Apply { path: PathBuf, source: ApplyError },

    #[error("I/O error at {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
}
