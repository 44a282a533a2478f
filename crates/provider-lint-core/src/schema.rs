//! Schema-constrained extraction of body contents.
//!
//! Rules describe the attributes and blocks they care about with a
//! [`BodySchema`]. Extraction keeps only the declared parts of a body and
//! rejects bodies that conflict with the declaration.

use crate::tree::{Attribute, Body};
use crate::types::SourceRange;
use std::collections::BTreeMap;
use thiserror::Error;

/// Declared attributes and blocks of a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodySchema {
    /// Attributes to extract.
    pub attributes: Vec<AttributeSchema>,
    /// Block types to extract.
    pub blocks: Vec<BlockSchema>,
}

impl BodySchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an optional attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttributeSchema {
            name: name.into(),
            required: false,
        });
        self
    }

    /// Declares a required attribute.
    #[must_use]
    pub fn required_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttributeSchema {
            name: name.into(),
            required: true,
        });
        self
    }

    /// Declares a nested block type.
    #[must_use]
    pub fn block(mut self, block: BlockSchema) -> Self {
        self.blocks.push(block);
        self
    }
}

/// A declared attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    /// Attribute name.
    pub name: String,
    /// Whether extraction fails when the attribute is missing.
    pub required: bool,
}

/// A declared block type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSchema {
    /// Block type name.
    pub type_name: String,
    /// Names of the labels the block must carry.
    pub label_names: Vec<String>,
    /// Schema of the block body. `None` extracts an empty body.
    pub body: Option<BodySchema>,
}

impl BlockSchema {
    /// Declares a block type without labels or body.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            label_names: Vec::new(),
            body: None,
        }
    }

    /// Declares the labels the block must carry.
    #[must_use]
    pub fn labels(mut self, names: &[&str]) -> Self {
        self.label_names = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    /// Declares the body schema.
    #[must_use]
    pub fn body(mut self, body: BodySchema) -> Self {
        self.body = Some(body);
        self
    }
}

/// Schema-filtered contents of a body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyContent {
    /// Declared attributes present in the body, by name.
    pub attributes: BTreeMap<String, Attribute>,
    /// Declared blocks present in the body, in source order.
    pub blocks: Vec<ContentBlock>,
}

impl BodyContent {
    /// Iterates over extracted blocks of the given type.
    pub fn blocks_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a ContentBlock> {
        self.blocks.iter().filter(move |b| b.type_name == type_name)
    }
}

/// A block extracted with a [`BlockSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    /// Block type name.
    pub type_name: String,
    /// Block labels.
    pub labels: Vec<String>,
    /// Filtered body.
    pub body: BodyContent,
    /// Range of the block header.
    pub def_range: SourceRange,
}

/// Errors when a body does not satisfy a schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The same attribute is defined twice in one body.
    #[error("{range}: attribute \"{name}\" was already defined at {previous}")]
    DuplicateAttribute {
        /// Attribute name.
        name: String,
        /// Range of the second definition.
        range: SourceRange,
        /// Range of the first definition.
        previous: SourceRange,
    },

    /// A required attribute is missing.
    #[error("missing required attribute \"{name}\" in {block}")]
    MissingAttribute {
        /// Attribute name.
        name: String,
        /// Description of the enclosing block.
        block: String,
    },

    /// A block carries the wrong number of labels.
    #[error("{range}: block \"{type_name}\" expects {expected} label(s), found {found}")]
    LabelCount {
        /// Block type name.
        type_name: String,
        /// Number of declared labels.
        expected: usize,
        /// Number of labels present.
        found: usize,
        /// Range of the block header.
        range: SourceRange,
    },
}

pub(crate) fn extract(body: &Body, schema: &BodySchema) -> Result<BodyContent, SchemaError> {
    extract_named(body, schema, "body")
}

fn extract_named(
    body: &Body,
    schema: &BodySchema,
    owner: &str,
) -> Result<BodyContent, SchemaError> {
    let mut content = BodyContent::default();

    for attr in &body.attributes {
        if !schema.attributes.iter().any(|s| s.name == attr.name) {
            continue;
        }
        if let Some(previous) = content.attributes.get(&attr.name) {
            return Err(SchemaError::DuplicateAttribute {
                name: attr.name.clone(),
                range: attr.range.clone(),
                previous: previous.range.clone(),
            });
        }
        content.attributes.insert(attr.name.clone(), attr.clone());
    }

    if let Some(missing) = schema
        .attributes
        .iter()
        .find(|s| s.required && !content.attributes.contains_key(&s.name))
    {
        return Err(SchemaError::MissingAttribute {
            name: missing.name.clone(),
            block: owner.to_string(),
        });
    }

    for block in &body.blocks {
        let Some(block_schema) = schema.blocks.iter().find(|s| s.type_name == block.type_name)
        else {
            continue;
        };
        if block.labels.len() != block_schema.label_names.len() {
            return Err(SchemaError::LabelCount {
                type_name: block.type_name.clone(),
                expected: block_schema.label_names.len(),
                found: block.labels.len(),
                range: block.def_range.clone(),
            });
        }
        let nested = match &block_schema.body {
            Some(nested_schema) => extract_named(&block.body, nested_schema, &block.type_name)?,
            None => BodyContent::default(),
        };
        content.blocks.push(ContentBlock {
            type_name: block.type_name.clone(),
            labels: block.labels.clone(),
            body: nested,
            def_range: block.def_range.clone(),
        });
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;
    use crate::tree::Block;
    use crate::types::Pos;

    fn provider_schema() -> BodySchema {
        BodySchema::new().attribute("alias").block(
            BlockSchema::new("default_tags").body(BodySchema::new().attribute("tags")),
        )
    }

    #[test]
    fn keeps_only_declared_parts() {
        let body = Block::new("provider")
            .attribute(Attribute::new("region", Expression::literal("us-east-1")))
            .attribute(Attribute::new("alias", Expression::literal("bar")))
            .block(Block::new("assume_role"))
            .block(
                Block::new("default_tags")
                    .attribute(Attribute::new("tags", Expression::string_map([("A", "1")]))),
            )
            .body;

        let content = body.content(&provider_schema()).expect("schema matches");

        assert_eq!(content.attributes.keys().collect::<Vec<_>>(), ["alias"]);
        assert_eq!(content.blocks.len(), 1);
        let tags_block = content.blocks_of_type("default_tags").next().expect("block");
        assert!(tags_block.body.attributes.contains_key("tags"));
    }

    #[test]
    fn rejects_duplicate_attribute() {
        let first = SourceRange::new("a.tf", Pos::new(2, 3, 10), Pos::new(2, 16, 23));
        let second = SourceRange::new("a.tf", Pos::new(3, 3, 26), Pos::new(3, 16, 39));
        let body = Block::new("provider")
            .attribute(Attribute::new("alias", Expression::literal("a").with_range(first.clone())))
            .attribute(Attribute::new("alias", Expression::literal("b").with_range(second.clone())))
            .body;

        let err = body.content(&provider_schema()).expect_err("duplicate");
        assert_eq!(
            err,
            SchemaError::DuplicateAttribute {
                name: "alias".into(),
                range: second,
                previous: first,
            }
        );
    }

    #[test]
    fn rejects_missing_required_attribute() {
        let schema = BodySchema::new().block(
            BlockSchema::new("default_tags").body(BodySchema::new().required_attribute("tags")),
        );
        let body = Block::new("provider").block(Block::new("default_tags")).body;

        let err = body.content(&schema).expect_err("missing tags");
        assert!(err.to_string().contains("\"tags\" in default_tags"));
    }

    #[test]
    fn rejects_label_mismatch() {
        let schema = BodySchema::new().block(BlockSchema::new("provider").labels(&["name"]));
        let body = Block::new("root").block(Block::new("provider")).body;

        let err = body.content(&schema).expect_err("label mismatch");
        assert!(matches!(
            err,
            SchemaError::LabelCount { expected: 1, found: 0, .. }
        ));
    }
}
