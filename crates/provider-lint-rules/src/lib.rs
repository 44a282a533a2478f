//! # provider-lint-rules
//!
//! Built-in lint rules for provider-lint.
//!
//! ## Available Rules
//!
//! | Name | Default | Description |
//! |------|---------|-------------|
//! | `provider_default_tags` | disabled | Requires configured tag keys in every provider's `default_tags` |
//!
//! ## Usage
//!
//! ```ignore
//! use provider_lint_core::{Analyzer, Config};
//! use provider_lint_rules::ProviderDefaultTags;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./infra")
//!     .config(Config::parse(r#"
//! [rules.provider_default_tags]
//! enabled = true
//! tags = ["Managed By"]
//! "#)?)
//!     .rule(ProviderDefaultTags::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod provider_default_tags;
mod ruleset;

pub use provider_default_tags::{ProviderDefaultTags, ProviderTagsConfig, TagKeys};
pub use ruleset::{all_rules, RuleSet, RULESET_NAME};

/// Re-export core types for convenience.
pub use provider_lint_core::{Issue, Rule, Severity};
