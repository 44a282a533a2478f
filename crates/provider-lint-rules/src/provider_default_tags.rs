//! Rule to require default tags on every provider instance.
//!
//! # Rationale
//!
//! Tags set in a provider's `default_tags` block are applied to every
//! resource the provider creates. Requiring them at the provider level keeps
//! ownership and cost allocation tags from being forgotten on individual
//! resources.
//!
//! # Configuration
//!
//! ```toml
//! [rules.provider_default_tags]
//! enabled = true
//! tags = ["Managed By", "Sample"]
//! ```
//!
//! - `tags`: tag keys every provider instance must declare (required)
//! - `exclude`: accepted for compatibility, currently not consulted
//!
//! # Behavior
//!
//! Only the first missing tag is reported per run. Tag maps that cannot be
//! fully resolved (unknown values, sensitive or unknown keys) count as
//! declaring nothing. Aliased providers are always checked; a provider
//! without an alias is checked only once it declares a `tags` attribute.

use indexmap::IndexMap;
use provider_lint_core::{
    Attribute, BlockSchema, BodySchema, EvalError, Rule, RuleConfig, Runner, RunnerError,
    Severity, SourceRange, Value, WantType,
};
use serde::Deserialize;
use tracing::{debug, warn};

/// Rule name for provider-default-tags.
pub const NAME: &str = "provider_default_tags";

/// Alias of a provider block without an `alias` attribute.
pub const DEFAULT_ALIAS: &str = "default";

const DEFAULT_PROVIDER: &str = "aws";
const DEFAULT_TAGS_BLOCK: &str = "default_tags";
const TAGS_ATTRIBUTE: &str = "tags";
const ALIAS_ATTRIBUTE: &str = "alias";

/// Options of the `provider_default_tags` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderTagsConfig {
    /// Tag keys every provider instance must declare.
    pub tags: Vec<String>,
    /// Decoded but not used when checking.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Tag keys declared by one provider instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKeys {
    /// No tag attribute has been seen for the instance.
    Absent,
    /// Every key was resolved to a string.
    Resolved(Vec<String>),
    /// The tag map could not be fully determined.
    Unresolved,
}

impl TagKeys {
    /// Returns true if `tag` is a resolved key.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.keys().iter().any(|k| k == tag)
    }

    /// Returns the resolved keys. Absent and unresolved sets are empty.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Resolved(keys) => keys,
            Self::Absent | Self::Unresolved => &[],
        }
    }
}

/// Extracts the tag keys declared by an evaluated `tags` value.
///
/// A null value declares no keys. Anything that is not a map, is unknown,
/// or is sensitive as a whole is unresolved, and so is a map with a single
/// unknown, null or sensitive key: that key could be the one a check is
/// looking for.
#[must_use]
pub fn tag_keys_for_value(value: &Value) -> TagKeys {
    let entries = match value {
        Value::Null => return TagKeys::Resolved(Vec::new()),
        Value::Map(entries) => entries,
        _ => return TagKeys::Unresolved,
    };

    let mut keys = Vec::with_capacity(entries.len());
    for (key, _) in entries {
        match key {
            Value::String(key) => keys.push(key.clone()),
            _ => return TagKeys::Unresolved,
        }
    }
    TagKeys::Resolved(keys)
}

/// One provider instance, keyed by alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInstance {
    /// Alias, or [`DEFAULT_ALIAS`].
    pub alias: String,
    /// Keys of the last tag attribute seen for this alias.
    pub tag_keys: TagKeys,
    /// Range of the last tag expression seen for this alias.
    pub tags_range: Option<SourceRange>,
    /// Header range of the provider block that declared the alias.
    pub block_range: SourceRange,
}

impl ProviderInstance {
    fn new(alias: String, block_range: SourceRange) -> Self {
        Self {
            alias,
            tag_keys: TagKeys::Absent,
            tags_range: None,
            block_range,
        }
    }

    /// Where issues about this instance point: the tag expression, or the
    /// provider block when no tag attribute exists.
    #[must_use]
    pub fn location(&self) -> &SourceRange {
        self.tags_range.as_ref().unwrap_or(&self.block_range)
    }
}

/// Provider instances in the order their aliases were first seen.
pub type ProviderInstances = IndexMap<String, ProviderInstance>;

/// Schema of a provider block: an optional alias and `default_tags` blocks.
#[must_use]
pub fn provider_schema() -> BodySchema {
    BodySchema::new().attribute(ALIAS_ATTRIBUTE).block(
        BlockSchema::new(DEFAULT_TAGS_BLOCK).body(BodySchema::new().attribute(TAGS_ATTRIBUTE)),
    )
}

/// Discovers every instance of `provider` and the tag keys it declares.
///
/// A block with an `alias` attribute registers its instance before nested
/// blocks are inspected, replacing any earlier instance of that alias, so an
/// alias without any tag block is still present with [`TagKeys::Absent`].
/// A block without an alias only contributes a [`DEFAULT_ALIAS`] instance
/// once a tag attribute is found in it.
///
/// # Errors
///
/// Returns an error if the blocks do not match [`provider_schema`], or if an
/// alias or tag expression cannot be evaluated.
pub fn resolve_providers(
    runner: &dyn Runner,
    provider: &str,
) -> Result<ProviderInstances, RunnerError> {
    let content = runner.provider_content(provider, &provider_schema())?;
    let mut instances = ProviderInstances::new();

    for block in content.blocks_of_type("provider") {
        let alias = match block.body.attributes.get(ALIAS_ATTRIBUTE) {
            Some(attr) => {
                let alias = resolve_alias(runner, attr)?;
                instances.insert(
                    alias.clone(),
                    ProviderInstance::new(alias.clone(), block.def_range.clone()),
                );
                alias
            }
            None => DEFAULT_ALIAS.to_string(),
        };
        debug!("Walk `{}` provider", alias);

        for nested in &block.body.blocks {
            let Some(attr) = nested.body.attributes.get(TAGS_ATTRIBUTE) else {
                continue;
            };
            let value = runner.evaluate_expr(&attr.expr, WantType::Any)?;
            let tag_keys = tag_keys_for_value(&value);
            debug!("Walk `{}` provider with tags {:?}", alias, tag_keys);

            let instance = instances
                .entry(alias.clone())
                .or_insert_with(|| ProviderInstance::new(alias.clone(), block.def_range.clone()));
            instance.tag_keys = tag_keys;
            instance.tags_range = Some(attr.expr.range.clone());
        }
    }

    Ok(instances)
}

fn resolve_alias(runner: &dyn Runner, attr: &Attribute) -> Result<String, RunnerError> {
    match runner.evaluate_expr(&attr.expr, WantType::String)? {
        Value::String(alias) => Ok(alias),
        other => Err(EvalError::TypeMismatch {
            expected: "known string",
            found: other.kind(),
            range: attr.expr.range.clone(),
        }
        .into()),
    }
}

/// A required tag missing from a provider instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTag<'a> {
    /// Alias of the offending instance.
    pub alias: &'a str,
    /// The missing tag key.
    pub tag: &'a str,
    /// Where to report it.
    pub range: &'a SourceRange,
}

/// Finds the first required tag missing from any instance.
///
/// Tags are tried in configuration order and, for each tag, instances in
/// discovery order. Matching is exact and case-sensitive.
#[must_use]
pub fn find_missing_tag<'a>(
    required: &'a [String],
    instances: &'a ProviderInstances,
) -> Option<MissingTag<'a>> {
    required.iter().find_map(|tag| {
        instances
            .values()
            .find(|instance| !instance.tag_keys.contains(tag))
            .map(|instance| MissingTag {
                alias: &instance.alias,
                tag,
                range: instance.location(),
            })
    })
}

/// Requires every provider instance to declare the configured default tags.
#[derive(Debug, Clone)]
pub struct ProviderDefaultTags {
    /// Provider type whose blocks are checked.
    pub provider: String,
}

impl Default for ProviderDefaultTags {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderDefaultTags {
    /// Creates a new rule checking `aws` providers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
        }
    }

    /// Sets the provider type to check.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }
}

impl Rule for ProviderDefaultTags {
    fn name(&self) -> &'static str {
        NAME
    }

    fn enabled(&self) -> bool {
        false
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn description(&self) -> &'static str {
        "Requires configured tag keys in every provider's default_tags"
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), RunnerError> {
        let config = match runner.rule_config(NAME).map(RuleConfig::decode::<ProviderTagsConfig>) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                debug!("Skipping {}: invalid rule config: {}", NAME, e);
                return Ok(());
            }
            None => {
                debug!("Skipping {}: no rule config", NAME);
                return Ok(());
            }
        };

        let instances = match resolve_providers(&*runner, &self.provider) {
            Ok(instances) => instances,
            Err(e) => {
                warn!("Skipping {}: {}", NAME, e);
                return Ok(());
            }
        };

        let Some(missing) = find_missing_tag(&config.tags, &instances) else {
            return Ok(());
        };
        if missing.range.is_empty() {
            warn!(
                "Provider {} has no source range, reporting without a location",
                missing.alias
            );
        }

        runner.emit_issue(
            self,
            format!(
                "Provider {} does not have {} in default tags!",
                missing.alias, missing.tag
            ),
            missing.range.clone(),
        )
    }
}
