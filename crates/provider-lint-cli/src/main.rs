//! provider-lint CLI tool.
//!
//! Usage:
//! ```bash
//! provider-lint check [OPTIONS] [PATH]
//! provider-lint list-rules
//! provider-lint init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use provider_lint_core::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Provider default tag linter for parsed infrastructure configuration
#[derive(Parser)]
#[command(name = "provider-lint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run lint checks
    Check {
        /// Module directory or single tree file (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific rules (comma-separated), enabling them
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Set an input variable (NAME=VALUE, VALUE is parsed as JSON when possible)
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, Value)>,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-issue compact format.
    Compact,
}

fn parse_var(arg: &str) -> Result<(String, Value), String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{arg}`"))?;
    if name.is_empty() {
        return Err(format!("missing variable name in `{arg}`"));
    }
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map_or_else(|_| Value::from(raw), Value::from);
    Ok((name.to_string(), value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            only,
            vars,
        } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            commands::check::run(&path, format, &only, vars, &source)
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(())
        }
        Commands::Init { force } => commands::init::run(force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_reads_json_values() {
        let (name, value) = parse_var(r#"default_tags={"Owner":"me"}"#).unwrap();
        assert_eq!(name, "default_tags");
        assert_eq!(value.get("Owner"), Some(&Value::from("me")));
    }

    #[test]
    fn parse_var_falls_back_to_string() {
        assert_eq!(
            parse_var("region=us-east-1").unwrap(),
            ("region".to_string(), Value::from("us-east-1"))
        );
    }

    #[test]
    fn parse_var_rejects_missing_separator() {
        assert!(parse_var("region").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn cli_parses_check_options() {
        let cli = Cli::try_parse_from([
            "provider-lint",
            "check",
            "infra",
            "--format",
            "compact",
            "--only",
            "provider_default_tags",
            "--var",
            "env=prod",
        ])
        .unwrap();

        let Commands::Check {
            path, only, vars, ..
        } = cli.command
        else {
            panic!("expected check command");
        };
        assert_eq!(path, PathBuf::from("infra"));
        assert_eq!(only, ["provider_default_tags"]);
        assert_eq!(vars.len(), 1);
    }
}
