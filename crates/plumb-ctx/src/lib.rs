// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Context plumbing.
//!
//! Finds `context.TODO()` calls in a package and proposes edits that
//! replace them with a real `context.Context`: one already in scope, a new
//! `ctx context.Context` parameter on the enclosing function, or a root
//! context in entry points. Functions that gain a parameter are recorded
//! in a [`FactStore`] so that callers in other packages are plumbed when
//! their packages are analyzed.

mod config;
pub mod entry;
mod error;
mod facts;
mod pass;

pub use config::PassConfig;
pub use entry::EntryKind;
pub use error::PassError;
pub use facts::{FactStore, FactsError, MemoryFacts};

use plumb_diagnostics::Diagnostic;
use plumb_resolve::{PackageId, Program};
use tracing::debug;

use pass::Plumber;

/// Analyze one package of `program`.
///
/// Packages must be run in dependency order with the same `facts` so that
/// continuations into upstream packages are seen.
pub fn run(
    program: &Program,
    pkg: PackageId,
    config: &PassConfig,
    facts: &mut dyn FactStore,
) -> Result<Vec<Diagnostic>, PassError> {
    if config.readonly_prefix.is_none() {
        return Err(PassError::NoReadonlyPrefix);
    }
    let package = program.package(pkg).ok_or(PassError::UnknownPackage(pkg))?;
    let info = program.info(pkg).ok_or(PassError::UnknownPackage(pkg))?;
    let todo = program
        .lookup_member("context", "TODO")
        .ok_or(PassError::MissingSymbol { path: "context", name: "TODO" })?;
    let context = program
        .lookup_member("context", "Context")
        .ok_or(PassError::MissingSymbol { path: "context", name: "Context" })?;

    debug!(package = %package.path, files = package.files.len(), "plumbing");
    let mut plumber = Plumber::new(program, package, info, config, facts, todo, context);
    plumber.build_call_graph();
    plumber.build_diagnostics();
    Ok(plumber.finish())
}
