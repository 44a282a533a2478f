//! The host interface rules run against.

use crate::config::{Config, RuleConfig};
use crate::eval::{EvalError, ModuleEvaluator, WantType};
use crate::expr::Expression;
use crate::rule::Rule;
use crate::schema::{BlockSchema, BodyContent, BodySchema, SchemaError};
use crate::tree::Module;
use crate::types::{Issue, SourceRange};
use crate::value::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by a [`Runner`].
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The module does not match a rule's schema.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// An expression could not be evaluated.
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// An issue points at a file outside the module.
    #[error("Cannot emit issue for {rule}: {filename} is not part of the module")]
    UnknownFile {
        /// Rule that emitted the issue.
        rule: String,
        /// File name the issue pointed at.
        filename: String,
    },
}

/// Capabilities a rule needs from the linter host.
pub trait Runner {
    /// Returns the top-level `provider` blocks labelled `name`, across all
    /// files in order, each body filtered by `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider block conflicts with `schema`.
    fn provider_content(&self, name: &str, schema: &BodySchema)
        -> Result<BodyContent, RunnerError>;

    /// Evaluates an expression to the requested shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression cannot be evaluated.
    fn evaluate_expr(&self, expr: &Expression, want: WantType) -> Result<Value, EvalError>;

    /// Returns the configuration block of the named rule, if any.
    fn rule_config(&self, rule_name: &str) -> Option<&RuleConfig>;

    /// Records an issue for `rule` at `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be recorded.
    fn emit_issue(
        &mut self,
        rule: &dyn Rule,
        message: String,
        range: SourceRange,
    ) -> Result<(), RunnerError>;
}

/// A [`Runner`] over an in-memory [`Module`] that collects issues.
#[derive(Debug)]
pub struct ModuleRunner {
    module: Module,
    config: Config,
    evaluator: ModuleEvaluator,
    issues: Vec<Issue>,
}

impl ModuleRunner {
    /// Creates a runner with no input variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the module's variable declarations are malformed.
    pub fn new(module: Module, config: Config) -> Result<Self, RunnerError> {
        Self::with_inputs(module, config, HashMap::new())
    }

    /// Creates a runner with input variable values.
    ///
    /// # Errors
    ///
    /// Returns an error if the module's variable declarations are malformed.
    pub fn with_inputs(
        module: Module,
        config: Config,
        inputs: HashMap<String, Value>,
    ) -> Result<Self, RunnerError> {
        let evaluator = ModuleEvaluator::new(&module, inputs)?;
        Ok(Self {
            module,
            config,
            evaluator,
            issues: Vec::new(),
        })
    }

    /// Returns the module being checked.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Returns the configuration rules read from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the issues emitted so far.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Takes the issues emitted so far, leaving the runner empty.
    pub fn take_issues(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }
}

impl Runner for ModuleRunner {
    fn provider_content(
        &self,
        name: &str,
        schema: &BodySchema,
    ) -> Result<BodyContent, RunnerError> {
        let root_schema = BodySchema::new().block(
            BlockSchema::new("provider")
                .labels(&["name"])
                .body(schema.clone()),
        );

        let mut content = BodyContent::default();
        for file in self.module.files() {
            let file_content = file.body.content(&root_schema)?;
            content.blocks.extend(
                file_content
                    .blocks
                    .into_iter()
                    .filter(|b| b.labels.first().map(String::as_str) == Some(name)),
            );
        }

        debug!("Found {} `{}` provider block(s)", content.blocks.len(), name);
        Ok(content)
    }

    fn evaluate_expr(&self, expr: &Expression, want: WantType) -> Result<Value, EvalError> {
        self.evaluator.evaluate(expr, want)
    }

    fn rule_config(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.config.rules.get(rule_name)
    }

    fn emit_issue(
        &mut self,
        rule: &dyn Rule,
        message: String,
        range: SourceRange,
    ) -> Result<(), RunnerError> {
        if !range.is_empty() && !self.module.contains_file(&range.filename) {
            return Err(RunnerError::UnknownFile {
                rule: rule.name().to_string(),
                filename: range.filename,
            });
        }

        let severity = self
            .config
            .rule_severity(rule.name())
            .unwrap_or_else(|| rule.severity());
        self.issues
            .push(Issue::new(rule.name(), severity, message, range).with_link(rule.link()));
        Ok(())
    }
}
