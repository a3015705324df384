//! Raw configuration types: application, database, and model specs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub logging: bool,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            name: String::new(),
            description: None,
            db: DbConfig::default(),
            logging: false,
            models: Vec::new(),
        }
    }
}

/// Backing store settings. An empty `name` with both flags unset yields an
/// in-memory store.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default)]
    pub name: String,
    /// Persist the store file on sync.
    #[serde(default)]
    pub create: bool,
    /// Open an existing store file; a missing file is downgraded to a warning.
    #[serde(default)]
    pub load: bool,
}

/// Declarative model description. Immutable once registered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSpec>,
}

/// Abstract field types mapped to storage column types by the persistence
/// binding. Unspecified fields default to `String`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Date,
    Number,
    String,
}

/// Declarative value generators, standing in for function-valued generators
/// in the configuration document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorSpec {
    /// Current time as unix milliseconds.
    Now,
    /// Random v4 UUID string.
    Uuid,
}

impl GeneratorSpec {
    pub fn generate(&self) -> Value {
        match self {
            GeneratorSpec::Now => Value::from(chrono::Utc::now().timestamp_millis()),
            GeneratorSpec::Uuid => Value::String(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// Per-attribute metadata.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Marks the attribute as the model's logical id. At most one per model.
    #[serde(default)]
    pub id: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub autogenerate: bool,
    #[serde(default)]
    pub generator: Option<GeneratorSpec>,
    #[serde(default, rename = "type")]
    pub kind: Option<FieldKind>,
    /// Storage tags: `primary-key`, `auto-increment`.
    #[serde(default)]
    pub extra: Vec<String>,
}

impl AttributeSpec {
    pub fn kind(&self) -> FieldKind {
        self.kind.unwrap_or(FieldKind::String)
    }

    pub fn has_extra(&self, tag: &str) -> bool {
        self.extra.iter().any(|t| t == tag)
    }
}
