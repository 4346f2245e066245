//! Bean declarations and the sources that supply them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Declarative record describing how to construct and wire one bean
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanDefinition {
    pub id: String,
    /// Name under which the type was registered in the [crate::TypeRegistry]
    #[serde(rename = "class")]
    pub type_name: String,
    /// property name => literal value
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// property name => identifier of the referenced bean
    #[serde(default)]
    pub references: BTreeMap<String, String>,
}

impl BeanDefinition {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            properties: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, literal: impl Into<String>) -> Self {
        self.properties.insert(name.into(), literal.into());
        self
    }

    pub fn with_reference(mut self, name: impl Into<String>, bean_id: impl Into<String>) -> Self {
        self.references.insert(name.into(), bean_id.into());
        self
    }
}

/// Errors raised while reading bean declarations
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Malformed bean declarations: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Supply the ordered list of declarations for a build.
///
/// The context calls this exactly once per build.
pub trait BeanDefinitionReader: Send + Sync {
    fn bean_definitions(&self) -> Result<Vec<BeanDefinition>, ReadError>;
}

/// Declarations held in memory
#[derive(Clone, Debug, Default)]
pub struct StaticDefinitionReader(Vec<BeanDefinition>);

impl StaticDefinitionReader {
    pub fn new(definitions: Vec<BeanDefinition>) -> Self {
        Self(definitions)
    }
}

impl BeanDefinitionReader for StaticDefinitionReader {
    fn bean_definitions(&self) -> Result<Vec<BeanDefinition>, ReadError> {
        Ok(self.0.clone())
    }
}

impl FromIterator<BeanDefinition> for StaticDefinitionReader {
    fn from_iter<I: IntoIterator<Item = BeanDefinition>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Wrapped { beans: Vec<BeanDefinition> },
    List(Vec<BeanDefinition>),
}

/// Declarations parsed from a JSON document.
///
/// Accepts either a bare array of beans or an object with a `beans` array:
///
/// ```json
/// { "beans": [
///     { "id": "alice", "class": "Person",
///       "properties": { "age": "42" },
///       "references": { "address": "home" } }
/// ] }
/// ```
///
/// The document is parsed on every call, so a malformed one fails the build that reads it.
#[derive(Clone, Debug)]
pub struct JsonDefinitionReader {
    document: String,
}

impl JsonDefinitionReader {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

impl BeanDefinitionReader for JsonDefinitionReader {
    fn bean_definitions(&self) -> Result<Vec<BeanDefinition>, ReadError> {
        let beans = match serde_json::from_str(&self.document)? {
            JsonDocument::Wrapped { beans } => beans,
            JsonDocument::List(beans) => beans,
        };
        Ok(beans)
    }
}
