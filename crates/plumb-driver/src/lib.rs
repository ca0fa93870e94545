// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Runs the context-plumbing pass over a source tree.
//!
//! Every package under the source root is a unit. Units are loaded with
//! their imports, checked, and analyzed in dependency order with one
//! shared fact store, so a function that gains a context parameter in one
//! unit is seen by every unit that calls it. Only units selected by the
//! configured patterns are reported and, with `apply`, rewritten. A unit
//! that fails to parse is skipped along with every unit importing it.

mod config;
mod error;
mod pattern;

pub use config::{DriverConfig, MODCACHE_ENV};
pub use error::DriverError;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use plumb_ctx::{FactsError, MemoryFacts, PassConfig};
use plumb_diagnostics::{apply_edits, edits_by_file, sort_diagnostics, Diagnostic};
use plumb_resolve::package::Origin;
use plumb_resolve::{PackageId, PackageRegistry, Program};
use tracing::{debug, info, warn};

use pattern::Pattern;

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct Report {
    /// Diagnostics of the selected units, ordered by file and position.
    pub diagnostics: Vec<Diagnostic>,
    /// Text of every file a diagnostic points into, as analyzed.
    pub sources: BTreeMap<PathBuf, String>,
    /// Number of units analyzed, dependencies included.
    pub units: usize,
    /// Files rewritten when fixes were applied.
    pub files_fixed: usize,
    /// Units left out because they, or a unit they import, failed to
    /// load, with the reason.
    pub skipped: BTreeMap<String, String>,
}

impl Report {
    pub fn source(&self, path: &Path) -> Option<&str> {
        self.sources.get(path).map(String::as_str)
    }
}

pub fn run(config: &DriverConfig) -> Result<Report, DriverError> {
    let modcache = config.modcache_dir()?;
    debug!(src = %config.src_root.display(), modcache = %modcache.display(), "loading packages");

    let mut registry = PackageRegistry::new()
        .with_src_root(&config.src_root)
        .with_modcache(&modcache);
    let local = registry.discover()?;
    let program = Program::check(registry)?;

    let patterns: Vec<Pattern> = config.patterns.iter().map(|p| Pattern::parse(p)).collect();
    let selected: HashSet<_> = local
        .into_iter()
        .filter(|&id| program.package(id).is_some_and(|pkg| pattern::any_match(&patterns, &pkg.path)))
        .collect();

    let mut facts = match &config.facts_path {
        Some(path) => load_facts(path)?,
        None => MemoryFacts::new(),
    };
    let pass_config = PassConfig::new(&modcache);

    let mut report = Report { skipped: program.registry().failed().clone(), ..Report::default() };
    let mut broken: HashSet<PackageId> = HashSet::new();
    for &id in program.order() {
        let Some(pkg) = program.package(id) else { continue };
        if pkg.origin == Origin::Builtin {
            continue;
        }
        if program.registry().is_failed(&pkg.path) {
            broken.insert(id);
            continue;
        }
        if let Some(dep) = pkg.imports.iter().find(|&dep| broken.contains(dep)) {
            let dep_path = program.package(*dep).map(|p| p.path.as_str()).unwrap_or("?");
            warn!(package = %pkg.path, import = %dep_path, "skipping package with a broken import");
            report.skipped.insert(pkg.path.clone(), format!("imports broken package \"{}\"", dep_path));
            broken.insert(id);
            continue;
        }
        if let Some(info) = program.info(id).filter(|info| !info.errors.is_empty()) {
            warn!(package = %pkg.path, errors = info.errors.len(), "package has unresolved names");
            for err in &info.errors {
                debug!("{}", err);
            }
        }

        info!(package = %pkg.path, "analyzing");
        let diagnostics = plumb_ctx::run(&program, id, &pass_config, &mut facts)?;
        report.units += 1;
        if selected.contains(&id) {
            report.diagnostics.extend(diagnostics);
        }
    }
    sort_diagnostics(&mut report.diagnostics);

    for pkg in program.registry().packages() {
        for file in &pkg.files {
            if report.diagnostics.iter().any(|d| d.file == file.path) {
                report.sources.insert(file.path.clone(), file.source.clone());
            }
        }
    }

    if config.apply {
        report.files_fixed = apply_fixes(&report)?;
    }
    if let Some(path) = &config.facts_path {
        facts.save(path)?;
        debug!(path = %path.display(), facts = facts.len(), "saved facts");
    }
    Ok(report)
}

/// Facts from a previous run. A malformed file is ignored.
fn load_facts(path: &Path) -> Result<MemoryFacts, DriverError> {
    if !path.exists() {
        debug!(path = %path.display(), "no facts file yet");
        return Ok(MemoryFacts::new());
    }
    match MemoryFacts::load(path) {
        Ok(facts) => Ok(facts),
        Err(err @ FactsError::Format { .. }) => {
            warn!("{}; starting without facts", err);
            Ok(MemoryFacts::new())
        }
        Err(err) => Err(err.into()),
    }
}

/// Write the fixes of every reported diagnostic to disk.
fn apply_fixes(report: &Report) -> Result<usize, DriverError> {
    let mut fixed = 0;
    for (path, edits) in edits_by_file(&report.diagnostics) {
        let source = match report.source(&path) {
            Some(source) => source.to_string(),
            None => fs::read_to_string(&path).map_err(|source| DriverError::Io { path: path.clone(), source })?,
        };
        let rewritten = apply_edits(&source, &edits).map_err(|source| DriverError::Apply { path: path.clone(), source })?;
        if rewritten != source {
            fs::write(&path, rewritten).map_err(|source| DriverError::Io { path: path.clone(), source })?;
            info!(file = %path.display(), edits = edits.len(), "applied fixes");
            fixed += 1;
        }
    }
    Ok(fixed)
}
