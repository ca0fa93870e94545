// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Package discovery and management.
//!
//! A package is a directory containing `.go` source files. All files in a
//! directory, tests included, form one compilation unit whose import path
//! is the directory path relative to the source root. Imports are looked
//! up in the source root, then in the module cache, then among the
//! built-in packages.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use plumb_ast::decl::File;
use thiserror::Error;
use tracing::{debug, warn};

use crate::stubs;

/// Unique identifier for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub u32);

/// Where a package's sources came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The source root being rewritten.
    Source,
    /// The read-only module cache.
    ModuleCache,
    /// A built-in package compiled into plumb.
    Builtin,
    /// Sources registered directly, without a directory.
    Memory,
}

/// A discovered package.
#[derive(Debug)]
pub struct Package {
    pub id: PackageId,
    /// Import path, e.g. `net/http` or `multi/producer`.
    pub path: String,
    /// Name from the package clause of the first file.
    pub name: String,
    pub dir: Option<PathBuf>,
    pub files: Vec<SourceFile>,
    /// Packages this package imports.
    pub imports: Vec<PackageId>,
    pub origin: Origin,
}

/// A parsed source file within a package.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub ast: File,
    /// File name ends in `_test.go`.
    pub is_test: bool,
}

impl SourceFile {
    /// Import path of every import spec in the file.
    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        self.ast.imports().map(|spec| spec.path.as_str())
    }
}

/// Error that can occur during package discovery.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Lex errors in {}:\n{}", file.display(), errors.join("\n"))]
    Lex { file: PathBuf, errors: Vec<String> },

    #[error("Parse errors in {}:\n{}", file.display(), errors.join("\n"))]
    Parse { file: PathBuf, errors: Vec<String> },

    #[error("import cycle not allowed: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    #[error("cannot find package \"{0}\"")]
    NotFound(String),

    #[error("no source root configured")]
    NoSourceRoot,

    #[error("package \"{0}\" failed to load earlier")]
    Broken(String),
}

impl PackageError {
    /// Errors confined to one package, which is skipped rather than
    /// aborting the whole load.
    pub fn is_unit_error(&self) -> bool {
        matches!(self, PackageError::Lex { .. } | PackageError::Parse { .. } | PackageError::Broken(_))
    }
}

/// Registry of all discovered packages.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    packages: Vec<Package>,
    path_to_id: HashMap<String, PackageId>,
    src_root: Option<PathBuf>,
    modcache: Option<PathBuf>,
    /// Packages that could not be loaded, or import one that could not,
    /// with the reason.
    failed: BTreeMap<String, String>,
}

impl PackageRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_src_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.src_root = Some(root.into());
        self
    }

    pub fn with_modcache(mut self, root: impl Into<PathBuf>) -> Self {
        self.modcache = Some(root.into());
        self
    }

    pub fn src_root(&self) -> Option<&Path> {
        self.src_root.as_deref()
    }

    pub fn modcache(&self) -> Option<&Path> {
        self.modcache.as_deref()
    }

    /// Load every package under the source root, plus their imports and
    /// the `context` package. Returns the source packages in path order.
    pub fn discover(&mut self) -> Result<Vec<PackageId>, PackageError> {
        let root = self.src_root.clone().ok_or(PackageError::NoSourceRoot)?;

        let mut dirs = Vec::new();
        collect_package_dirs(&root, &mut dirs)?;
        dirs.sort();

        let mut ids = Vec::new();
        for dir in dirs {
            let path = import_path(&root, &dir);
            debug!(path = %path, dir = %dir.display(), "discovered package");
            match self.load(&path) {
                Ok(id) => ids.push(id),
                Err(e) if e.is_unit_error() => self.fail(&path, e.to_string()),
                Err(e) => return Err(e),
            }
        }
        self.load("context")?;
        Ok(ids)
    }

    /// Load the package with import path `path` and, recursively, its imports.
    pub fn load(&mut self, path: &str) -> Result<PackageId, PackageError> {
        if let Some(&id) = self.path_to_id.get(path) {
            return Ok(id);
        }
        if self.failed.contains_key(path) {
            return Err(PackageError::Broken(path.to_string()));
        }

        let roots = [
            (self.src_root.clone(), Origin::Source),
            (self.modcache.clone(), Origin::ModuleCache),
        ];
        for (root, origin) in roots {
            let Some(root) = root else { continue };
            let dir = root.join(path);
            let files = read_go_files(&dir)?;
            if !files.is_empty() {
                return self.register(path, Some(dir), files, origin);
            }
        }

        match stubs::lookup(path) {
            Some(source) => {
                let file = PathBuf::from(stubs::STUB_ROOT).join(path).join("stub.go");
                self.register(path, None, vec![(file, source.to_string())], Origin::Builtin)
            }
            None => Err(PackageError::NotFound(path.to_string())),
        }
    }

    /// Register a package from in-memory sources.
    pub fn add_source(&mut self, path: &str, files: Vec<(PathBuf, String)>) -> Result<PackageId, PackageError> {
        self.register(path, None, files, Origin::Memory)
    }

    fn register(
        &mut self,
        path: &str,
        dir: Option<PathBuf>,
        files: Vec<(PathBuf, String)>,
        origin: Origin,
    ) -> Result<PackageId, PackageError> {
        let files = parse_files(files)?;
        let name = files
            .first()
            .map(|f| f.ast.package.name.clone())
            .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path).to_string());

        let mut import_paths: Vec<String> = Vec::new();
        for file in &files {
            for import in file.import_paths() {
                if !import_paths.iter().any(|p| p == import) {
                    import_paths.push(import.to_string());
                }
            }
        }

        // Register before loading imports so cycles terminate
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package {
            id,
            path: path.to_string(),
            name,
            dir,
            files,
            imports: Vec::new(),
            origin,
        });
        self.path_to_id.insert(path.to_string(), id);

        let mut imports = Vec::new();
        for import in import_paths {
            match self.load(&import) {
                Ok(dep) => imports.push(dep),
                Err(PackageError::NotFound(missing)) => {
                    warn!(package = %path, import = %missing, "import not found");
                }
                Err(e) if e.is_unit_error() => {
                    self.fail(&import, e.to_string());
                    self.fail(path, format!("imports broken package \"{}\"", import));
                }
                Err(e) => return Err(e),
            }
        }
        if let Some(pkg) = self.packages.get_mut(id.0 as usize) {
            pkg.imports = imports;
        }

        Ok(id)
    }

    /// Record `path` as unusable. The first reason given is kept.
    fn fail(&mut self, path: &str, reason: String) {
        if !self.failed.contains_key(path) {
            warn!(package = %path, "skipping package: {}", reason);
            self.failed.insert(path.to_string(), reason);
        }
    }

    /// Packages skipped because they, or one of their imports, failed to
    /// load, by import path.
    pub fn failed(&self) -> &BTreeMap<String, String> {
        &self.failed
    }

    pub fn is_failed(&self, path: &str) -> bool {
        self.failed.contains_key(path)
    }

    /// Get a package by ID.
    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(id.0 as usize)
    }

    /// Look up package by import path.
    pub fn lookup(&self, path: &str) -> Option<PackageId> {
        self.path_to_id.get(path).copied()
    }

    /// Get all packages.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// All packages ordered so that each one follows everything it imports.
    pub fn topological_order(&self) -> Result<Vec<PackageId>, PackageError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(
            registry: &PackageRegistry,
            id: PackageId,
            marks: &mut [Mark],
            stack: &mut Vec<PackageId>,
            order: &mut Vec<PackageId>,
        ) -> Result<(), PackageError> {
            match marks[id.0 as usize] {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    let start = stack.iter().position(|&p| p == id).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start..]
                        .iter()
                        .filter_map(|&p| registry.get(p).map(|pkg| pkg.path.clone()))
                        .collect();
                    if let Some(pkg) = registry.get(id) {
                        cycle.push(pkg.path.clone());
                    }
                    return Err(PackageError::CircularDependency(cycle));
                }
                Mark::Unvisited => {}
            }

            marks[id.0 as usize] = Mark::InProgress;
            stack.push(id);
            if let Some(pkg) = registry.get(id) {
                for &dep in &pkg.imports {
                    visit(registry, dep, marks, stack, order)?;
                }
            }
            stack.pop();
            marks[id.0 as usize] = Mark::Done;
            order.push(id);
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.packages.len()];
        let mut stack = Vec::new();
        let mut order = Vec::with_capacity(self.packages.len());
        for pkg in &self.packages {
            visit(self, pkg.id, &mut marks, &mut stack, &mut order)?;
        }
        Ok(order)
    }
}

impl Package {
    /// Whether the package is rewritable source rather than a dependency.
    pub fn is_local(&self) -> bool {
        matches!(self.origin, Origin::Source | Origin::Memory)
    }
}

/// Lex and parse a package's files, numbering nodes across all of them.
fn parse_files(files: Vec<(PathBuf, String)>) -> Result<Vec<SourceFile>, PackageError> {
    let mut next_id = 0;
    let mut parsed = Vec::with_capacity(files.len());

    for (path, source) in files {
        let result = plumb_parser::parse_source(&source, next_id).map_err(|errors| PackageError::Lex {
            file: path.clone(),
            errors: errors.iter().map(|e| e.to_string()).collect(),
        })?;

        let ast = match result.file {
            Some(ast) if result.errors.is_empty() => ast,
            _ => {
                return Err(PackageError::Parse {
                    file: path,
                    errors: result.errors.iter().map(|e| e.to_string()).collect(),
                });
            }
        };
        next_id = result.next_id;

        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with("_test.go"))
            .unwrap_or(false);
        parsed.push(SourceFile { path, source, ast, is_test });
    }

    Ok(parsed)
}

/// Read all `.go` files of a directory, sorted by name. A missing
/// directory yields no files.
fn read_go_files(dir: &Path) -> Result<Vec<(PathBuf, String)>, PackageError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| PackageError::Io { source, path: dir.to_path_buf() })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PackageError::Io { source, path: dir.to_path_buf() })?;
        let path = entry.path();
        if path.is_file() && path.extension().map(|e| e == "go").unwrap_or(false) {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let source = fs::read_to_string(&path).map_err(|source| PackageError::Io { source, path: path.clone() })?;
            Ok((path, source))
        })
        .collect()
}

/// Directories below `dir` holding `.go` files. Hidden, underscore-prefixed
/// and `testdata` directories are skipped.
fn collect_package_dirs(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), PackageError> {
    let entries = fs::read_dir(dir).map_err(|source| PackageError::Io { source, path: dir.to_path_buf() })?;

    let mut has_go = false;
    for entry in entries {
        let entry = entry.map_err(|source| PackageError::Io { source, path: dir.to_path_buf() })?;
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.starts_with('.') && !name.starts_with('_') && name != "testdata" {
                collect_package_dirs(&path, out)?;
            }
        } else if path.extension().map(|e| e == "go").unwrap_or(false) {
            has_go = true;
        }
    }
    if has_go {
        out.push(dir.to_path_buf());
    }
    Ok(())
}

/// Slash-separated path of `dir` relative to `root`.
fn import_path(root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_package(dir: &Path, files: &[(&str, &str)]) {
        fs::create_dir_all(dir).unwrap();
        for (name, content) in files {
            let mut file = File::create(dir.join(name)).unwrap();
            file.write_all(content.as_bytes()).unwrap();
        }
    }

    #[test]
    fn discover_nested_packages() {
        let tmp = TempDir::new().unwrap();
        create_test_package(&tmp.path().join("app"), &[
            ("main.go", "package main\n\nimport \"app/util\"\n\nfunc main() {\n\tutil.Help()\n}\n"),
            ("main_test.go", "package main\n\nimport \"testing\"\n\nfunc TestMain(t *testing.T) {}\n"),
        ]);
        create_test_package(&tmp.path().join("app/util"), &[
            ("util.go", "package util\n\nfunc Help() {}\n"),
        ]);

        let mut registry = PackageRegistry::new().with_src_root(tmp.path());
        let ids = registry.discover().unwrap();
        assert_eq!(ids.len(), 2);

        let app = registry.get(registry.lookup("app").unwrap()).unwrap();
        assert_eq!(app.name, "main");
        assert_eq!(app.files.len(), 2);
        assert!(app.files[1].is_test);
        assert!(app.is_local());

        // Built-ins are loaded on demand, context always
        assert_eq!(registry.get(registry.lookup("testing").unwrap()).unwrap().origin, Origin::Builtin);
        assert!(registry.lookup("context").is_some());
    }

    #[test]
    fn dependencies_come_first() {
        let tmp = TempDir::new().unwrap();
        create_test_package(&tmp.path().join("a"), &[("a.go", "package a\n\nimport \"b\"\n")]);
        create_test_package(&tmp.path().join("b"), &[("b.go", "package b\n\nimport \"fmt\"\n")]);

        let mut registry = PackageRegistry::new().with_src_root(tmp.path());
        registry.discover().unwrap();
        let order = registry.topological_order().unwrap();
        let pos = |path: &str| order.iter().position(|&id| id == registry.lookup(path).unwrap()).unwrap();
        assert!(pos("fmt") < pos("b"));
        assert!(pos("b") < pos("a"));
    }

    #[test]
    fn import_cycle_is_an_error() {
        let tmp = TempDir::new().unwrap();
        create_test_package(&tmp.path().join("x"), &[("x.go", "package x\n\nimport \"y\"\n")]);
        create_test_package(&tmp.path().join("y"), &[("y.go", "package y\n\nimport \"x\"\n")]);

        let mut registry = PackageRegistry::new().with_src_root(tmp.path());
        registry.discover().unwrap();
        match registry.topological_order() {
            Err(PackageError::CircularDependency(cycle)) => {
                assert_eq!(cycle.first(), cycle.last());
                assert!(cycle.contains(&"x".to_string()) && cycle.contains(&"y".to_string()));
            }
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn module_cache_is_searched_after_source_root() {
        let src = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        create_test_package(&src.path().join("app"), &[("app.go", "package app\n\nimport \"example.com/lib\"\n")]);
        create_test_package(&cache.path().join("example.com/lib"), &[("lib.go", "package lib\n\nfunc Do() {}\n")]);

        let mut registry = PackageRegistry::new().with_src_root(src.path()).with_modcache(cache.path());
        registry.discover().unwrap();
        let lib = registry.get(registry.lookup("example.com/lib").unwrap()).unwrap();
        assert_eq!(lib.origin, Origin::ModuleCache);
        assert!(!lib.is_local());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let tmp = TempDir::new().unwrap();
        create_test_package(&tmp.path().join("bad"), &[("bad.go", "package bad\n\nfunc {\n")]);

        let mut registry = PackageRegistry::new().with_src_root(tmp.path());
        match registry.load("bad") {
            Err(PackageError::Parse { file, .. }) => assert!(file.ends_with("bad.go")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn broken_packages_are_skipped_with_their_importers() {
        let tmp = TempDir::new().unwrap();
        create_test_package(&tmp.path().join("bad"), &[("bad.go", "package bad\n\nfunc {\n")]);
        create_test_package(
            &tmp.path().join("user"),
            &[("user.go", "package user\n\nimport \"bad\"\n\nfunc F() { bad.G() }\n")],
        );
        create_test_package(&tmp.path().join("good"), &[("good.go", "package good\n\nfunc H() {}\n")]);

        let mut registry = PackageRegistry::new().with_src_root(tmp.path());
        let ids = registry.discover().unwrap();
        let paths: Vec<_> = ids.iter().map(|&id| registry.get(id).unwrap().path.as_str()).collect();
        assert_eq!(paths, vec!["good", "user"]);

        assert!(registry.failed()["bad"].contains("bad.go"));
        assert!(registry.is_failed("user"));
        assert!(!registry.is_failed("good"));
        assert!(registry.lookup("bad").is_none());
    }

    #[test]
    fn missing_import_is_not_fatal() {
        let mut registry = PackageRegistry::new();
        let id = registry
            .add_source("m", vec![(PathBuf::from("m.go"), "package m\n\nimport \"nowhere/pkg\"\n".to_string())])
            .unwrap();
        assert!(registry.get(id).unwrap().imports.is_empty());
    }
}
