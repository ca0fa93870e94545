// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! End-to-end tests of the context-plumbing pass.
//!
//! Each package under `tests/testdata/src` is loaded together with its
//! imports and the pass runs over all of them in dependency order. The
//! diagnostics of the package under test are checked against the
//! `// want "regex"` comments of its files, and the result of applying
//! every suggested fix is compared with the `.golden` file next to each
//! source file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use plumb_ast::LineMap;
use plumb_ctx::{FactStore, MemoryFacts, PassConfig, PassError};
use plumb_diagnostics::{apply_edits, edits_by_file, Category, Diagnostic};
use plumb_resolve::package::Origin;
use plumb_resolve::{PackageRegistry, Program};
use regex::Regex;

fn testdata() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata")
}

fn src_root() -> PathBuf {
    testdata().join("src")
}

fn modcache() -> PathBuf {
    testdata().join("modcache")
}

struct Analysis {
    diagnostics: Vec<Diagnostic>,
    facts: MemoryFacts,
}

/// Run the pass over `path` loaded from `src`, and over everything it
/// imports first.
fn analyze_in(src: &Path, path: &str) -> Analysis {
    let mut registry = PackageRegistry::new().with_src_root(src).with_modcache(modcache());
    let target = registry.load(path).unwrap();
    registry.load("context").unwrap();
    let program = Program::check(registry).unwrap();

    let config = PassConfig::new(modcache());
    let mut facts = MemoryFacts::new();
    let mut diagnostics = Vec::new();
    for &id in program.order() {
        if program.package(id).unwrap().origin == Origin::Builtin {
            continue;
        }
        let found = plumb_ctx::run(&program, id, &config, &mut facts).unwrap();
        if id == target {
            diagnostics = found;
        }
    }
    Analysis { diagnostics, facts }
}

fn analyze(path: &str) -> Analysis {
    analyze_in(&src_root(), path)
}

fn go_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().map(|e| e == "go").unwrap_or(false))
        .collect();
    files.sort();
    files
}

/// `// want "regex"` annotations, by file and 1-based line.
fn expectations(dir: &Path) -> BTreeMap<(PathBuf, u32), Vec<Regex>> {
    let want = Regex::new(r"//\s*want\s+(.*)$").unwrap();
    let quoted = Regex::new(r#""([^"]*)""#).unwrap();

    let mut expected = BTreeMap::new();
    for file in go_files(dir) {
        let source = fs::read_to_string(&file).unwrap();
        for (i, line) in source.lines().enumerate() {
            let Some(caps) = want.captures(line) else { continue };
            let patterns: Vec<Regex> = quoted
                .captures_iter(&caps[1])
                .map(|c| Regex::new(&c[1]).unwrap())
                .collect();
            expected.insert((file.clone(), i as u32 + 1), patterns);
        }
    }
    expected
}

/// Every diagnostic matches a `want` on its line, and every `want` is met.
fn check_wants(path: &str, diagnostics: &[Diagnostic]) {
    let mut expected = expectations(&src_root().join(path));

    for diag in diagnostics {
        let source = fs::read_to_string(&diag.file).unwrap();
        let (line, _) = LineMap::new(&source).offset_to_line_col(diag.span.start);
        let patterns = expected.entry((diag.file.clone(), line)).or_default();
        match patterns.iter().position(|re| re.is_match(&diag.message)) {
            Some(i) => {
                patterns.remove(i);
            }
            None => panic!("{}:{}: unexpected diagnostic: {}", diag.file.display(), line, diag.message),
        }
    }

    let missing: Vec<String> = expected
        .iter()
        .flat_map(|((file, line), res)| res.iter().map(move |re| format!("{}:{}: {}", file.display(), line, re)))
        .collect();
    assert!(missing.is_empty(), "expected diagnostics not reported:\n{}", missing.join("\n"));
}

/// Sources after applying every suggested fix.
fn fixed_sources(diagnostics: &[Diagnostic]) -> BTreeMap<PathBuf, String> {
    edits_by_file(diagnostics)
        .into_iter()
        .map(|(file, edits)| {
            let source = fs::read_to_string(&file).unwrap();
            let fixed = apply_edits(&source, &edits).unwrap();
            (file, fixed)
        })
        .collect()
}

fn check_golden(path: &str, diagnostics: &[Diagnostic]) {
    let fixed = fixed_sources(diagnostics);
    for file in go_files(&src_root().join(path)) {
        let golden = PathBuf::from(format!("{}.golden", file.display()));
        let Ok(expected) = fs::read_to_string(&golden) else { continue };
        let actual = fixed.get(&file).cloned().unwrap_or_else(|| fs::read_to_string(&file).unwrap());
        assert_eq!(actual, expected, "fixed {} differs from {}", file.display(), golden.display());
    }
}

fn run_fixture(path: &str) -> Analysis {
    let analysis = analyze(path);
    check_wants(path, &analysis.diagnostics);
    check_golden(path, &analysis.diagnostics);
    analysis
}

/// Copy the packages `paths` of the source tree into `dst`.
fn copy_packages(paths: &[&str], dst: &Path) {
    for path in paths {
        let to = dst.join(path);
        fs::create_dir_all(&to).unwrap();
        for file in go_files(&src_root().join(path)) {
            fs::copy(&file, to.join(file.file_name().unwrap())).unwrap();
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

#[test]
fn basic_requests_gain_parameters() {
    let analysis = run_fixture("basic");
    assert!(analysis.diagnostics.iter().all(|d| d.category == Category::Direct));
    assert!(analysis.diagnostics.iter().all(|d| d.has_edits()));
}

#[test]
fn existing_providers_are_reused() {
    let analysis = run_fixture("providers");
    let naming = analysis.diagnostics.iter().filter(|d| d.category == Category::Naming).count();
    assert_eq!(naming, 2);
}

#[test]
fn parameters_win_over_block_locals() {
    let analysis = analyze("providers");
    let fixed = fixed_sources(&analysis.diagnostics);
    let source = fixed.values().next().unwrap();
    assert!(source.contains("\t\tlocal := context.Background()\n\t\tfetch(r.Context())\n"));
    assert!(source.contains("func hiddenParam(r *http.Request) {\n\tctx := r.Context()\n"));
}

#[test]
fn discarded_request_keeps_declared_context_used() {
    let analysis = run_fixture("discard");
    assert!(analysis.diagnostics.iter().all(|d| d.has_edits()));
}

#[test]
fn entry_point_declares_root_context() {
    let analysis = run_fixture("demo");
    let fixed = fixed_sources(&analysis.diagnostics);
    let main = fixed.values().next().unwrap();
    assert!(main.contains("func main() {\n\tctx := context.Background()\n"));
    assert!(!main.contains("func main(ctx"));
}

#[test]
fn exported_functions_produce_facts() {
    let analysis = run_fixture("multi/producer");
    assert!(analysis.facts.has("multi/producer.Dial"));
    assert!(analysis.facts.has("multi/producer.Client.Noop"));
    assert_eq!(analysis.facts.len(), 2);
}

#[test]
fn callers_in_dependent_packages_continue_plumbing() {
    let analysis = run_fixture("multi/consumer");
    let continuations = analysis.diagnostics.iter().filter(|d| d.category == Category::Continuation).count();
    assert_eq!(continuations, 3);
}

#[test]
fn facts_flow_through_intermediate_packages() {
    for path in ["chain/a", "chain/b", "chain/cmd"] {
        run_fixture(path);
    }
    let analysis = analyze("chain/cmd");
    assert!(analysis.facts.has("chain/a.Fetch"));
    assert!(analysis.facts.has("chain/b.Lookup"));
    assert!(!analysis.facts.has("chain/b.helper"), "unexported functions produce no facts");
    assert_eq!(analysis.diagnostics.len(), 1);
    assert_eq!(analysis.diagnostics[0].category, Category::Continuation);
}

#[test]
fn blocked_functions_pass_placeholder() {
    let analysis = run_fixture("ambiguous");
    let fallback = analysis.diagnostics.iter().find(|d| d.category == Category::Direct && !d.has_edits());
    assert!(fallback.is_some(), "package-level request should carry no fix");
    assert!(analysis.diagnostics.iter().any(|d| d.category == Category::Ambiguity));
}

#[test]
fn diamond_adds_each_parameter_once() {
    let analysis = run_fixture("diamond");
    let fixed = fixed_sources(&analysis.diagnostics);
    let source = fixed.values().next().unwrap();
    assert_eq!(source.matches("ctx context.Context").count(), 4);
    assert!(source.contains("func top(ctx context.Context) {\n\tleft(ctx)\n\tright(ctx)\n}"));
}

#[test]
fn read_only_code_is_left_alone() {
    let analysis = analyze("vendoruser");
    assert!(analysis.diagnostics.is_empty());
    assert!(analysis.facts.is_empty());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn applying_fixes_then_rerunning_is_clean() {
    let packages = [
        "basic",
        "demo",
        "diamond",
        "discard",
        "multi/producer",
        "multi/consumer",
        "chain/a",
        "chain/b",
        "chain/cmd",
    ];
    let dir = tempfile::tempdir().unwrap();
    copy_packages(&packages, dir.path());

    // Fix against the original sources so consumers still see producer facts
    let fixed: Vec<_> = packages
        .iter()
        .flat_map(|path| fixed_sources(&analyze_in(dir.path(), path).diagnostics))
        .collect();
    for (file, source) in fixed {
        fs::write(file, source).unwrap();
    }

    for path in packages {
        let analysis = analyze_in(dir.path(), path);
        let messages: Vec<_> = analysis.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert!(messages.is_empty(), "{} still reports {:?}", path, messages);
    }
}

#[test]
fn fix_edits_never_overlap() {
    for path in ["basic", "providers", "demo", "multi/consumer", "ambiguous", "diamond", "discard", "chain/cmd"] {
        let analysis = analyze(path);
        for (file, edits) in edits_by_file(&analysis.diagnostics) {
            let source = fs::read_to_string(&file).unwrap();
            assert!(apply_edits(&source, &edits).is_ok(), "overlapping edits in {}", file.display());
        }
    }
}

#[test]
fn missing_readonly_prefix_is_fatal() {
    let mut registry = PackageRegistry::new().with_src_root(src_root());
    let id = registry.load("diamond").unwrap();
    let program = Program::check(registry).unwrap();
    let mut facts = MemoryFacts::new();
    let err = plumb_ctx::run(&program, id, &PassConfig::default(), &mut facts).unwrap_err();
    assert!(matches!(err, PassError::NoReadonlyPrefix));
}

#[test]
fn missing_context_package_is_fatal() {
    let mut registry = PackageRegistry::new();
    let src = "package p\n\nfunc f() {}\n".to_string();
    let id = registry.add_source("p", vec![(PathBuf::from("p/p.go"), src)]).unwrap();
    let program = Program::check(registry).unwrap();
    let mut facts = MemoryFacts::new();
    let err = plumb_ctx::run(&program, id, &PassConfig::new(modcache()), &mut facts).unwrap_err();
    assert!(matches!(err, PassError::MissingSymbol { path: "context", .. }));
}
