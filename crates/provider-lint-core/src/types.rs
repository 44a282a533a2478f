//! Core types for lint issues and results.

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};

/// Severity level for lint issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Notice,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notice => write!(f, "notice"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A position inside a configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file (for miette integration).
    #[serde(default)]
    pub byte: usize,
}

impl Pos {
    /// Creates a new position.
    #[must_use]
    pub fn new(line: usize, column: usize, byte: usize) -> Self {
        Self { line, column, byte }
    }
}

/// A span of source text inside a named configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    /// File name relative to the module directory.
    pub filename: String,
    /// Start of the range (inclusive).
    pub start: Pos,
    /// End of the range (exclusive).
    pub end: Pos,
}

impl SourceRange {
    /// Creates a new range.
    #[must_use]
    pub fn new(filename: impl Into<String>, start: Pos, end: Pos) -> Self {
        Self {
            filename: filename.into(),
            start,
            end,
        }
    }

    /// Returns true if the range carries no file name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filename.is_empty()
    }

    /// Byte span of this range for diagnostics rendering.
    #[must_use]
    pub fn span(&self) -> SourceSpan {
        let len = self.end.byte.saturating_sub(self.start.byte);
        SourceSpan::from((self.start.byte, len))
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.filename, self.start.line, self.start.column
        )
    }
}

/// A lint issue reported by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Rule name (e.g., "provider_default_tags").
    pub rule: String,
    /// Severity of this issue.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Location of the offending declaration.
    pub range: SourceRange,
    /// Reference documentation for the rule, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Issue {
    /// Creates a new issue.
    #[must_use]
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        range: SourceRange,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            message: message.into(),
            range,
            link: None,
        }
    }

    /// Adds a documentation link to this issue.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        let link = link.into();
        self.link = (!link.is_empty()).then_some(link);
        self
    }

    /// Formats the issue for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!("{} at {}\n", self.rule, self.range);
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(link) = &self.link {
            let _ = writeln!(output, "  = see: {link}");
        }
        output
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.range, self.severity, self.rule, self.message
        )?;
        if let Some(link) = &self.link {
            write!(f, " (see: {link})")?;
        }
        Ok(())
    }
}

/// An issue paired with its source text for rich error display.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("[{rule}] {message}")]
pub struct IssueDiagnostic {
    rule: String,
    message: String,
    #[help]
    help: Option<String>,
    #[source_code]
    src: NamedSource<String>,
    #[label("{severity}")]
    span: SourceSpan,
    severity: Severity,
}

impl IssueDiagnostic {
    /// Builds a diagnostic for `issue` over the contents of its file.
    #[must_use]
    pub fn new(issue: &Issue, source: String) -> Self {
        Self {
            rule: issue.rule.clone(),
            message: issue.message.clone(),
            help: issue.link.as_ref().map(|l| format!("see {l}")),
            src: NamedSource::new(issue.range.filename.clone(), source),
            span: issue.range.span(),
            severity: issue.severity,
        }
    }
}

/// Result of running lint analysis.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All issues found.
    pub issues: Vec<Issue>,
    /// Number of configuration files checked.
    pub files_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Counts issues by severity as `(errors, warnings, notices)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity| self.issues.iter().filter(|i| i.severity == severity).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Notice),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_issue(severity: Severity) -> Issue {
        Issue::new(
            "provider_default_tags",
            severity,
            "Provider default does not have Sample in default tags!",
            SourceRange::new("main.tf", Pos::new(4, 12, 60), Pos::new(7, 6, 120)),
        )
    }

    #[test]
    fn issue_with_empty_link_has_none() {
        let issue = make_issue(Severity::Error).with_link("");
        assert!(issue.link.is_none());
    }

    #[test]
    fn issue_format_includes_link() {
        let issue = make_issue(Severity::Error).with_link("https://example.com/rule");
        insta::assert_snapshot!(issue.format(), @r"
        provider_default_tags at main.tf:4:12
          error: Provider default does not have Sample in default tags!
          = see: https://example.com/rule
        ");
    }

    #[test]
    fn issue_display_is_compact() {
        let issue = make_issue(Severity::Warning);
        assert_eq!(
            issue.to_string(),
            "main.tf:4:12: warning [provider_default_tags] Provider default does not have Sample in default tags!"
        );
    }

    #[test]
    fn range_span_uses_byte_offsets() {
        let range = SourceRange::new("main.tf", Pos::new(1, 1, 10), Pos::new(1, 5, 14));
        assert_eq!(range.span(), SourceSpan::from((10, 4)));
    }

    #[test]
    fn count_by_severity_splits_levels() {
        let mut result = LintResult::new();
        result.issues.push(make_issue(Severity::Error));
        result.issues.push(make_issue(Severity::Warning));
        result.issues.push(make_issue(Severity::Warning));

        assert_eq!(result.count_by_severity(), (1, 2, 0));
        assert!(result.has_errors());
    }
}
