//! Rule trait for defining lint rules.

use crate::runner::{Runner, RunnerError};
use crate::types::Severity;

/// A lint rule checked against a configuration module.
///
/// Rules pull what they need from the [`Runner`]: schema-filtered content,
/// evaluated expressions and their own configuration. Findings are pushed
/// back through [`Runner::emit_issue`].
///
/// # Example
///
/// ```ignore
/// use provider_lint_core::{BodySchema, Rule, Runner, RunnerError};
///
/// pub struct RequireRegion;
///
/// impl Rule for RequireRegion {
///     fn name(&self) -> &'static str { "require_region" }
///
///     fn check(&self, runner: &mut dyn Runner) -> Result<(), RunnerError> {
///         let schema = BodySchema::new().attribute("region");
///         let content = runner.provider_content("aws", &schema)?;
///         for provider in content.blocks_of_type("provider") {
///             if !provider.body.attributes.contains_key("region") {
///                 runner.emit_issue(self, "region is not set".into(), provider.def_range.clone())?;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the snake_case name of this rule (e.g., "provider_default_tags").
    fn name(&self) -> &'static str;

    /// Whether the rule runs without being enabled in configuration.
    fn enabled(&self) -> bool {
        true
    }

    /// Returns the default severity for issues from this rule.
    fn severity(&self) -> Severity {
        Severity::Error
    }

    /// Returns a reference documentation link, or an empty string.
    fn link(&self) -> &'static str {
        ""
    }

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Checks the module behind `runner`, emitting issues through it.
    ///
    /// # Errors
    ///
    /// Returns an error only when the runner itself fails.
    fn check(&self, runner: &mut dyn Runner) -> Result<(), RunnerError>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
