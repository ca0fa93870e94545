// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `plumb check`: analyze packages and optionally apply fixes.

use std::path::Path;
use std::process::ExitCode;

use plumb_diagnostics::formatter::DiagnosticFormatter;
use plumb_diagnostics::json::{to_json_report, to_json_string};
use plumb_diagnostics::Severity;
use plumb_driver::{DriverConfig, Report};
use tracing::debug;

use crate::{output, CheckArgs, Format};

/// Exit status when diagnostics were reported and not fixed.
const EXIT_DIAGNOSTICS: u8 = 3;

pub fn cmd_check(args: &CheckArgs) -> ExitCode {
    let mut config = DriverConfig::with_root(&args.root)
        .with_apply(args.fix)
        .with_patterns(args.patterns.clone());
    if let Some(dir) = &args.modcache {
        config = config.with_modcache(dir);
    }
    if let Some(path) = &args.facts {
        config = config.with_facts_path(path);
    }

    debug!(root = %args.root.display(), patterns = ?args.patterns, fix = args.fix, "check");
    let report = match plumb_driver::run(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}: {}", output::error_label(), e);
            return ExitCode::FAILURE;
        }
    };

    match args.format {
        Format::Json => {
            let json = to_json_report(&report.diagnostics, |path| report.source(path));
            println!("{}", to_json_string(&json));
        }
        Format::Human => show_report(&report, &args.root, args.fix),
    }

    if report.diagnostics.is_empty() || args.fix {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DIAGNOSTICS)
    }
}

fn show_report(report: &Report, root: &Path, fixed: bool) {
    for (path, reason) in &report.skipped {
        eprintln!("{}: skipped package {}: {}", output::warning_label(), output::file_path(path), reason);
    }
    for diag in &report.diagnostics {
        let name = diag.file.strip_prefix(root).unwrap_or(&diag.file).display().to_string();
        let source = report.source(&diag.file).unwrap_or("");
        let formatter = DiagnosticFormatter::new(source).with_file_name(&name);
        println!("{}", formatter.format(diag));
    }

    if report.diagnostics.is_empty() {
        eprintln!("{}", output::clean(report.units));
        return;
    }
    let notes = report.diagnostics.iter().filter(|d| d.severity == Severity::Note).count();
    eprintln!("{}", output::summary(report.diagnostics.len() - notes, notes));
    if fixed {
        eprintln!("{}", output::fixed(report.files_fixed));
    }
}
