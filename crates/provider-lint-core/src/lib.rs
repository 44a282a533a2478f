//! # provider-lint-core
//!
//! Core framework for linting parsed infrastructure configuration.
//!
//! This crate provides the foundational traits and types for building
//! provider lint rules. It includes:
//!
//! - [`Module`] and friends, the generic block/attribute tree
//! - [`BodySchema`] for schema-constrained extraction
//! - [`Value`] and [`ModuleEvaluator`] for static expression evaluation
//! - [`Runner`], the host interface rules run against
//! - [`Rule`] trait for lint rules
//! - [`Analyzer`] for orchestrating lint execution
//! - [`Issue`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use provider_lint_core::{Analyzer, Config};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./infra")
//!     .config(Config::from_file(".provider-lint.toml".as_ref())?)
//!     .rule(MyRule)
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod eval;
mod expr;
mod rule;
mod runner;
mod schema;
mod tree;
mod types;
mod value;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{Config, ConfigError, RuleConfig};
pub use eval::{EvalError, ModuleEvaluator, WantType};
pub use expr::{ExprKind, Expression, ObjectItem};
pub use rule::{Rule, RuleBox};
pub use runner::{ModuleRunner, Runner, RunnerError};
pub use schema::{AttributeSchema, BlockSchema, BodyContent, BodySchema, ContentBlock, SchemaError};
pub use tree::{Attribute, Block, Body, File, LoadError, Module};
pub use types::{Issue, IssueDiagnostic, LintResult, Pos, Severity, SourceRange};
pub use value::Value;
