//! Unevaluated expressions as produced by the configuration parser.
//!
//! Expressions are stored in their parsed form and only turned into
//! [`Value`](crate::Value)s by an evaluator at check time.

use crate::types::SourceRange;
use serde::{Deserialize, Serialize};

/// A parsed expression together with its location.
///
/// The JSON form is the expression kind as a single-key object plus an
/// optional `range`, e.g. `{"reference": ["var", "tags"], "range": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// What kind of expression this is.
    #[serde(flatten)]
    pub kind: ExprKind,
    /// Where the expression appears in source.
    #[serde(default)]
    pub range: SourceRange,
}

/// Expression kinds supported by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    /// A constant JSON-compatible value.
    Literal(serde_json::Value),
    /// A traversal such as `var.default_tags` or `local.tags.Owner`.
    Reference(Vec<String>),
    /// An object constructor `{ key = value, ... }`.
    Object(Vec<ObjectItem>),
    /// A tuple constructor `[a, b, ...]`.
    Tuple(Vec<Expression>),
    /// A function call `name(args...)`.
    Call {
        /// Function name.
        name: String,
        /// Call arguments in order.
        #[serde(default)]
        args: Vec<Expression>,
    },
}

/// One `key = value` item of an object constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectItem {
    /// Key expression. Usually a literal string, but may be any expression.
    pub key: Expression,
    /// Value expression.
    pub value: Expression,
}

impl Expression {
    /// Creates an expression with an empty range.
    #[must_use]
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            range: SourceRange::default(),
        }
    }

    /// Creates a literal expression.
    #[must_use]
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Self::new(ExprKind::Literal(value.into()))
    }

    /// Creates a reference from a dotted traversal such as `var.tags`.
    #[must_use]
    pub fn reference(traversal: &str) -> Self {
        Self::new(ExprKind::Reference(
            traversal.split('.').map(String::from).collect(),
        ))
    }

    /// Creates an object constructor from key/value expressions.
    #[must_use]
    pub fn object(items: impl IntoIterator<Item = (Expression, Expression)>) -> Self {
        Self::new(ExprKind::Object(
            items
                .into_iter()
                .map(|(key, value)| ObjectItem { key, value })
                .collect(),
        ))
    }

    /// Creates an object constructor with literal string keys and values.
    #[must_use]
    pub fn string_map<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::object(
            items
                .into_iter()
                .map(|(k, v)| (Self::literal(k), Self::literal(v))),
        )
    }

    /// Creates a function call expression.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::new(ExprKind::Call {
            name: name.into(),
            args,
        })
    }

    /// Sets the source range of this expression.
    #[must_use]
    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = range;
        self
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Literal(v) => write!(f, "{v}"),
            ExprKind::Reference(path) => write!(f, "{}", path.join(".")),
            ExprKind::Object(items) => write!(f, "{{ {} items }}", items.len()),
            ExprKind::Tuple(items) => write!(f, "[ {} items ]", items.len()),
            ExprKind::Call { name, args } => write!(f, "{name}(/* {} args */)", args.len()),
        }
    }
}
