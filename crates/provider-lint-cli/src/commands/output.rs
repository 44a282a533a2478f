//! Shared output formatting for lint results.

use anyhow::Result;
use miette::GraphicalReportHandler;
use provider_lint_core::{Issue, IssueDiagnostic, LintResult, Severity};
use std::path::Path;

use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// Text output renders source snippets when the configuration file an issue
/// points at can be read from `source_dir`.
pub fn print(result: &LintResult, format: OutputFormat, source_dir: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(result, source_dir)),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print!("{}", render_compact(result)),
    }
    Ok(())
}

fn render_text(result: &LintResult, source_dir: &Path) -> String {
    use std::fmt::Write;

    let (errors, warnings, notices) = result.count_by_severity();
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();

    for issue in &result.issues {
        let source = std::fs::read_to_string(source_dir.join(&issue.range.filename)).ok();
        let rendered = source.and_then(|src| {
            let mut buf = String::new();
            handler
                .render_report(&mut buf, &IssueDiagnostic::new(issue, src))
                .ok()
                .map(|()| buf)
        });
        match rendered {
            Some(report) => {
                let _ = writeln!(out, "{report}");
            }
            None => write_plain(&mut out, issue),
        }
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    let _ = writeln!(
        out,
        "{}Found {} error(s), {} warning(s), {} notice(s) in {} file(s)\x1b[0m",
        summary_color, errors, warnings, notices, result.files_checked
    );
    out
}

fn write_plain(out: &mut String, issue: &Issue) {
    use std::fmt::Write;

    let severity_indicator = match issue.severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Notice => "\x1b[34mnotice\x1b[0m",
    };

    let _ = writeln!(out, "{} at {}", issue.rule, issue.range);
    let _ = writeln!(out, "  {}: {}", severity_indicator, issue.message);
    if let Some(link) = &issue.link {
        let _ = writeln!(out, "  = see: {link}");
    }
    let _ = writeln!(out);
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn render_compact(result: &LintResult) -> String {
    result
        .issues
        .iter()
        .map(|issue| format!("{issue}\n"))
        .collect()
}
