//! Core analyzer for orchestrating lint execution.

use crate::config::Config;
use crate::rule::{Rule, RuleBox};
use crate::runner::{ModuleRunner, RunnerError};
use crate::tree::{LoadError, Module};
use crate::types::LintResult;
use crate::value::Value;

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The module could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// A rule failed in a way it could not recover from.
    #[error("Rule {rule} failed: {source}")]
    Rule {
        /// Name of the failing rule.
        rule: String,
        /// Underlying runner error.
        source: RunnerError,
    },

    /// The runner could not be prepared for the module.
    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    /// Neither a module nor a root path was given.
    #[error("No module to analyze")]
    NoModule,
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    module: Option<Module>,
    rules: Vec<RuleBox>,
    config: Option<Config>,
    inputs: HashMap<String, Value>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the module directory (or single tree file) to load.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Sets an already loaded module. Takes precedence over [`Self::root`].
    #[must_use]
    pub fn module(mut self, module: Module) -> Self {
        self.module = Some(module);
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Sets an input variable value.
    #[must_use]
    pub fn input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the analyzer, loading the module from disk if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the module cannot be loaded.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let module = match (self.module, self.root) {
            (Some(module), _) => module,
            (None, Some(root)) => Module::load(&root)?,
            (None, None) => return Err(AnalyzerError::NoModule),
        };

        Ok(Analyzer {
            module,
            rules: self.rules,
            config: self.config.unwrap_or_default(),
            inputs: self.inputs,
        })
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    module: Module,
    rules: Vec<RuleBox>,
    config: Config,
    inputs: HashMap<String, Value>,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the module being analyzed.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Runs every enabled rule and returns the collected issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the runner cannot be prepared or a rule fails.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!(
            "Starting analysis of {} file(s)",
            self.module.files().len()
        );

        let mut runner = ModuleRunner::with_inputs(
            self.module.clone(),
            self.config.clone(),
            self.inputs.clone(),
        )?;

        for rule in &self.rules {
            if !self.config.is_rule_enabled(rule.name(), rule.enabled()) {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }

            debug!("Running rule: {}", rule.name());
            rule.check(&mut runner).map_err(|source| AnalyzerError::Rule {
                rule: rule.name().to_string(),
                source,
            })?;
        }

        let mut result = LintResult::new();
        result.files_checked = self.module.files().len();
        result.issues = runner.take_issues();

        // Sort issues by file, then line
        result.issues.sort_by(|a, b| {
            a.range
                .filename
                .cmp(&b.range.filename)
                .then(a.range.start.line.cmp(&b.range.start.line))
                .then(a.range.start.column.cmp(&b.range.start.column))
        });

        info!(
            "Analysis complete: {} issue(s) in {} file(s)",
            result.issues.len(),
            result.files_checked
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Runner;
    use crate::tree::{Body, File};
    use crate::types::{Pos, Severity, SourceRange};

    struct AlwaysFires {
        enabled: bool,
    }

    impl Rule for AlwaysFires {
        fn name(&self) -> &'static str {
            "always_fires"
        }
        fn enabled(&self) -> bool {
            self.enabled
        }
        fn check(&self, runner: &mut dyn Runner) -> Result<(), RunnerError> {
            let range = SourceRange::new("main.tf", Pos::new(1, 1, 0), Pos::new(1, 2, 1));
            runner.emit_issue(self, "fired".into(), range)
        }
    }

    struct PointsElsewhere;

    impl Rule for PointsElsewhere {
        fn name(&self) -> &'static str {
            "points_elsewhere"
        }
        fn check(&self, runner: &mut dyn Runner) -> Result<(), RunnerError> {
            let range = SourceRange::new("nowhere.tf", Pos::default(), Pos::default());
            runner.emit_issue(self, "lost".into(), range)
        }
    }

    fn module() -> Module {
        Module::new(vec![File::new("main.tf", Body::default())])
    }

    #[test]
    fn test_builder_requires_module() {
        let err = Analyzer::builder().build().err().expect("no module");
        assert!(matches!(err, AnalyzerError::NoModule));
    }

    #[test]
    fn runs_rules_enabled_by_default() {
        let analyzer = Analyzer::builder()
            .module(module())
            .rule(AlwaysFires { enabled: true })
            .build()
            .expect("Failed to build analyzer");

        let result = analyzer.analyze().expect("analysis succeeds");
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.files_checked, 1);
        assert!(result.has_errors());
    }

    #[test]
    fn config_controls_rules_disabled_by_default() {
        let disabled = Analyzer::builder()
            .module(module())
            .rule(AlwaysFires { enabled: false })
            .build()
            .expect("Failed to build analyzer");
        assert!(disabled.analyze().expect("analysis").issues.is_empty());

        let config = Config::parse(
            "[rules.always_fires]\nenabled = true\nseverity = \"warning\"\n",
        )
        .expect("config");
        let enabled = Analyzer::builder()
            .module(module())
            .config(config)
            .rule(AlwaysFires { enabled: false })
            .build()
            .expect("Failed to build analyzer");
        let result = enabled.analyze().expect("analysis");
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn sink_failure_fails_analysis() {
        let analyzer = Analyzer::builder()
            .module(module())
            .rule(PointsElsewhere)
            .build()
            .expect("Failed to build analyzer");

        let err = analyzer.analyze().expect_err("sink failure");
        assert!(matches!(err, AnalyzerError::Rule { ref rule, .. } if rule == "points_elsewhere"));
    }
}
