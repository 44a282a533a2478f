//! Evaluated expression values.
//!
//! Unlike a plain JSON value, a [`Value`] can be *unknown* (its contents
//! cannot be determined at lint time) or *sensitive* (marked as secret).
//! Map keys are themselves values so a single key can carry either state.

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An explicit null.
    Null,
    /// A value that cannot be determined statically.
    Unknown,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered sequence.
    List(Vec<Value>),
    /// An ordered mapping. Later entries win over earlier ones with the same key.
    Map(Vec<(Value, Value)>),
    /// A value marked as sensitive.
    Sensitive(Box<Value>),
}

impl Value {
    /// Returns the human-readable name of this value's kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Unknown => "unknown",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Sensitive(_) => "sensitive",
        }
    }

    /// Returns false only for [`Value::Unknown`]. Nested elements are not inspected.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this value carries a sensitive mark.
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Self::Sensitive(_))
    }

    /// Returns the string content of a known, unmarked string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Removes a sensitive mark, returning the inner value.
    #[must_use]
    pub fn unmark(self) -> Self {
        match self {
            Self::Sensitive(inner) => inner.unmark(),
            other => other,
        }
    }

    /// Wraps the value in a sensitive mark unless it already carries one.
    #[must_use]
    pub fn mark_sensitive(self) -> Self {
        match self {
            Self::Sensitive(_) => self,
            other => Self::Sensitive(Box::new(other)),
        }
    }

    /// Converts a primitive into its string form (`true`, `42`, ...).
    ///
    /// Returns `None` for collections and opaque values.
    #[must_use]
    pub fn to_primitive_string(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            _ => None,
        }
    }

    /// Looks up `key` in a map value. The last matching entry wins.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .rev()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Builds a map from string keys.
    #[must_use]
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Self::String(k.into()), v))
                .collect(),
        )
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(fields) => Self::map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v))),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
