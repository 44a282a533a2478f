//! Check command implementation.

use anyhow::{Context, Result};
use provider_lint_core::{Analyzer, Value};
use provider_lint_rules::RuleSet;
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Runs the check command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    only: &[String],
    vars: Vec<(String, Value)>,
    source: &ConfigSource,
) -> Result<()> {
    let mut config = source.load()?;

    // Rules named with --only run even when disabled by default
    let rules = if only.is_empty() {
        RuleSet::builtin().into_rules()
    } else {
        for name in only {
            config.enable_rule(name);
        }
        let names: Vec<&str> = only.iter().map(String::as_str).collect();
        RuleSet::builtin().select(&names)
    };

    let mut builder = Analyzer::builder().root(path).config(config);
    for (name, value) in vars {
        builder = builder.input(name, value);
    }
    for rule in rules {
        builder = builder.rule_box(rule);
    }

    let analyzer = builder
        .build()
        .with_context(|| format!("Failed to load module: {}", path.display()))?;

    tracing::info!("Analyzing {:?} with {} rules", path, analyzer.rule_count());

    let result = analyzer.analyze().context("Analysis failed")?;

    let source_dir = if path.is_file() {
        path.parent().unwrap_or(path)
    } else {
        path
    };
    super::output::print(&result, format, source_dir)?;

    // Exit with error code if there are errors
    if result.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}
