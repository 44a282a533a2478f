//! The generic configuration tree.
//!
//! A [`Module`] is an ordered list of parsed [`File`]s. Each file holds a root
//! [`Body`] of attributes and nested blocks. The tree is produced by an
//! external parser and serialized as JSON; this crate only reads it.

use crate::expr::Expression;
use crate::schema::{BodyContent, BodySchema, SchemaError};
use crate::types::SourceRange;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// A `name = expression` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value expression.
    pub expr: Expression,
    /// Range of the whole attribute.
    #[serde(default)]
    pub range: SourceRange,
}

impl Attribute {
    /// Creates an attribute. The attribute range defaults to the expression range.
    #[must_use]
    pub fn new(name: impl Into<String>, expr: Expression) -> Self {
        let range = expr.range.clone();
        Self {
            name: name.into(),
            expr,
            range,
        }
    }
}

/// A typed block such as `provider "aws" { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block type name (e.g., "provider").
    #[serde(rename = "type")]
    pub type_name: String,
    /// Block labels (e.g., `["aws"]`).
    #[serde(default)]
    pub labels: Vec<String>,
    /// Block contents.
    #[serde(default)]
    pub body: Body,
    /// Range of the block header.
    #[serde(default)]
    pub def_range: SourceRange,
}

impl Block {
    /// Creates an empty block of the given type.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            labels: Vec::new(),
            body: Body::default(),
            def_range: SourceRange::default(),
        }
    }

    /// Appends a label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Appends an attribute to the body.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.body.attributes.push(attribute);
        self
    }

    /// Appends a nested block to the body.
    #[must_use]
    pub fn block(mut self, block: Block) -> Self {
        self.body.blocks.push(block);
        self
    }

    /// Sets the definition range.
    #[must_use]
    pub fn at(mut self, range: SourceRange) -> Self {
        self.def_range = range;
        self
    }
}

/// The contents of a file or block, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Attributes in source order.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Nested blocks in source order.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Body {
    /// Returns the first attribute with the given name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Iterates over nested blocks of the given type.
    pub fn blocks_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |b| b.type_name == type_name)
    }

    /// Extracts the parts of this body declared by `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body conflicts with the schema.
    pub fn content(&self, schema: &BodySchema) -> Result<BodyContent, SchemaError> {
        crate::schema::extract(self, schema)
    }
}

/// One parsed configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    /// File name relative to the module directory (e.g., "main.tf").
    pub name: String,
    /// Root body of the file.
    #[serde(default)]
    pub body: Body,
}

impl File {
    /// Creates a file from its root body.
    #[must_use]
    pub fn new(name: impl Into<String>, body: Body) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// Errors when loading a module from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error reading a tree file.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A tree file is not valid JSON for the tree model.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A set of configuration files evaluated together.
///
/// Files are kept sorted by name so traversal order does not depend on the
/// order in which they were loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    files: Vec<File>,
}

impl Module {
    /// Creates a module from parsed files.
    #[must_use]
    pub fn new(mut files: Vec<File>) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Self { files }
    }

    /// Returns the files in name order.
    #[must_use]
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Returns true if a file with this name is part of the module.
    #[must_use]
    pub fn contains_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    /// Iterates over top-level blocks of every file, in file order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.files.iter().flat_map(|f| f.body.blocks.iter())
    }

    /// Loads a module from a tree file or a directory of `*.json` tree files.
    ///
    /// Only files directly inside the directory are read; subdirectories
    /// belong to other modules.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if path.is_file() {
            return Ok(Self::new(vec![load_file(path)?]));
        }

        let pattern = format!("{}/*.json", glob::Pattern::escape(&path.to_string_lossy()));
        let mut files = Vec::new();
        for entry in glob::glob(&pattern)? {
            let file_path = entry.map_err(|e| LoadError::Io {
                path: e.path().to_path_buf(),
                source: e.into(),
            })?;
            debug!("Loading: {}", file_path.display());
            files.push(load_file(&file_path)?);
        }

        Ok(Self::new(files))
    }
}

fn load_file(path: &Path) -> Result<File, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_TREE: &str = r#"{
        "name": "main.tf",
        "body": {
            "blocks": [
                {
                    "type": "provider",
                    "labels": ["aws"],
                    "body": {
                        "attributes": [
                            {"name": "region", "expr": {"literal": "us-east-1"}}
                        ]
                    }
                }
            ]
        }
    }"#;

    #[test]
    fn module_sorts_files_by_name() {
        let module = Module::new(vec![
            File::new("variables.tf", Body::default()),
            File::new("main.tf", Body::default()),
        ]);
        let names: Vec<&str> = module.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["main.tf", "variables.tf"]);
        assert!(module.contains_file("main.tf"));
        assert!(!module.contains_file("other.tf"));
    }

    #[test]
    fn builder_assembles_nested_blocks() {
        let block = Block::new("provider")
            .label("aws")
            .attribute(Attribute::new("alias", Expression::literal("bar")))
            .block(Block::new("default_tags"));

        assert_eq!(block.labels, ["aws"]);
        assert!(block.body.attribute("alias").is_some());
        assert_eq!(block.body.blocks_of_type("default_tags").count(), 1);
    }

    #[test]
    fn load_reads_directory_of_trees() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("main.json"), MAIN_TREE).expect("write tree");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write notes");

        let module = Module::load(dir.path()).expect("module loads");

        assert_eq!(module.files().len(), 1);
        let provider = module.blocks().next().expect("provider block");
        assert_eq!(provider.type_name, "provider");
        assert_eq!(provider.labels, ["aws"]);
    }

    #[test]
    fn load_reports_malformed_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write tree");

        let err = Module::load(&path).expect_err("parse error");
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
