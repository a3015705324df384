//! The model layer: registry (factory), models, and instances.

mod instance;
mod registry;

pub use instance::Instance;
pub use registry::ModelRegistry;

use crate::config::ModelSpec;
use crate::db::{Database, TableSchema};
use crate::error::AppError;
use crate::query::Condition;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Model-local setting naming the field treated as the logical id. Defaults
/// to the storage-native key column.
pub const ID_ATTRIBUTE: &str = "id.attribute";

/// A named, schema-bearing handle to one collection of records, plus the
/// operations to create and query them. Produced by [`ModelRegistry::define`].
pub struct Model {
    name: String,
    spec: ModelSpec,
    schema: TableSchema,
    db: Arc<Database>,
    settings: RwLock<HashMap<String, String>>,
}

impl Model {
    pub(crate) fn new(spec: ModelSpec, schema: TableSchema, db: Arc<Database>) -> Model {
        Model {
            name: spec.name.clone(),
            spec,
            schema,
            db,
            settings: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    /// Store a model-local setting, e.g. `ID_ATTRIBUTE`.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.settings
            .write()
            .expect("model settings poisoned")
            .insert(key.to_string(), value.into());
    }

    pub fn setting(&self, key: &str) -> Option<String> {
        self.settings
            .read()
            .expect("model settings poisoned")
            .get(key)
            .cloned()
    }

    /// The field holding the externally visible id of an instance.
    pub fn id_attribute(&self) -> String {
        self.setting(ID_ATTRIBUTE)
            .unwrap_or_else(|| self.schema.key_column.clone())
    }

    /// Every record in the collection. An empty collection yields an empty
    /// vec; errors are reserved for engine faults.
    pub async fn all(self: &Arc<Self>) -> Result<Vec<Instance>, AppError> {
        let q = crate::sql::select_all(&self.schema);
        let rows = self.db.fetch_all(&q.sql, &q.params).await?;
        Ok(rows
            .into_iter()
            .map(|r| Instance::from_record(Arc::clone(self), r))
            .collect())
    }

    /// Build an in-memory instance with defaults and autogenerated values
    /// applied. Nothing is persisted until `save`.
    pub fn create(self: &Arc<Self>, fields: Value) -> Result<Instance, AppError> {
        let mut fields = match fields {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(AppError::BadRequest(
                    "instance fields must be a JSON object".to_string(),
                ))
            }
        };
        for (name, attr) in &self.spec.attributes {
            if fields.contains_key(name) {
                continue;
            }
            if let Some(default) = &attr.default {
                fields.insert(name.clone(), default.clone());
            } else if attr.autogenerate {
                if let Some(generator) = &attr.generator {
                    fields.insert(name.clone(), generator.generate());
                }
            }
        }
        Ok(Instance::new(Arc::clone(self), fields))
    }

    /// Construct an instance and immediately persist it.
    pub async fn insert(self: &Arc<Self>, fields: Value) -> Result<Instance, AppError> {
        let mut instance = self.create(fields)?;
        instance.save().await?;
        Ok(instance)
    }

    /// Alias of [`Model::insert`], kept for API ergonomics.
    pub async fn save(self: &Arc<Self>, fields: Value) -> Result<Instance, AppError> {
        self.insert(fields).await
    }

    /// Retrieval operations.
    pub fn retrieve(self: &Arc<Self>) -> Retrieve {
        Retrieve {
            model: Arc::clone(self),
        }
    }

    /// Missing required fields (absent or null) are a validation error.
    pub(crate) fn validate_required(&self, fields: &Map<String, Value>) -> Result<(), AppError> {
        for (name, attr) in &self.spec.attributes {
            if !attr.required {
                continue;
            }
            match fields.get(name) {
                None | Some(Value::Null) => {
                    return Err(AppError::Validation(format!(
                        "{}.{} is required",
                        self.name, name
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Retrieval namespace for a model.
pub struct Retrieve {
    model: Arc<Model>,
}

impl Retrieve {
    /// Look up by the storage-native key. Fails with `NotFound` when the key
    /// does not resolve; on success the stored record is merged onto a fresh
    /// instance shell.
    pub async fn by_id(&self, id: &Value) -> Result<Instance, AppError> {
        let q = crate::sql::select_by_key(self.model.schema(), id);
        let row = self.model.db().fetch_optional(&q.sql, &q.params).await?;
        match row {
            Some(record) => Ok(Instance::from_record(Arc::clone(&self.model), record)),
            None => Err(AppError::NotFound(format!(
                "no {} found for id {}",
                self.model.name(),
                id
            ))),
        }
    }

    /// Attribute query from a flat argument list: exactly two arguments are
    /// an equality test, otherwise complete (field, operator, value) triples
    /// combined under AND. An empty match set is an empty vec.
    pub async fn by_attr(&self, args: &[Value]) -> Result<Vec<Instance>, AppError> {
        let condition = Condition::from_args(args)?;
        self.find(&condition).await
    }

    /// Typed entry point for a prebuilt condition.
    pub async fn find(&self, condition: &Condition) -> Result<Vec<Instance>, AppError> {
        let q = crate::sql::select_where(self.model.schema(), condition)?;
        let rows = self.model.db().fetch_all(&q.sql, &q.params).await?;
        Ok(rows
            .into_iter()
            .map(|r| Instance::from_record(Arc::clone(&self.model), r))
            .collect())
    }
}
