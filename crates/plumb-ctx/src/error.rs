// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Errors that abort a pass.

use plumb_resolve::PackageId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassError {
    #[error("no read-only source prefix configured; pass --modcache or set PLUMB_MODCACHE")]
    NoReadonlyPrefix,

    #[error("cannot resolve {path}.{name}; the \"{path}\" package is missing or incomplete")]
    MissingSymbol { path: &'static str, name: &'static str },

    #[error("package {0:?} was not checked")]
    UnknownPackage(PackageId),
}
