//! Instances: one in-memory representation of a persisted or
//! about-to-be-persisted record, bound to its model.

use crate::data::extract_data;
use crate::error::AppError;
use crate::model::Model;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Field data plus a reference to the owning model. Behavior is defined once
/// here; records fetched from storage are merged onto fresh shells.
pub struct Instance {
    model: Arc<Model>,
    fields: Map<String, Value>,
}

impl Instance {
    pub(crate) fn new(model: Arc<Model>, fields: Map<String, Value>) -> Instance {
        Instance { model, fields }
    }

    pub(crate) fn from_record(model: Arc<Model>, record: Value) -> Instance {
        let fields = match record {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Instance { model, fields }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field in memory. Fields outside the model's schema survive on
    /// the instance but are stripped before persistence.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// The value of whichever field is configured as the logical id.
    pub fn id(&self) -> Option<Value> {
        self.fields.get(&self.model.id_attribute()).cloned()
    }

    fn native_key(&self) -> Option<Value> {
        self.fields
            .get(&self.model.schema().key_column)
            .cloned()
    }

    /// Persist the instance's persistable projection and merge the
    /// storage-assigned fields (notably the native key) back onto it.
    pub async fn save(&mut self) -> Result<(), AppError> {
        self.model.validate_required(&self.fields)?;
        let columns = self.model.schema().column_names();
        let data = extract_data(&self.fields, &columns);
        let q = crate::sql::insert(self.model.schema(), &data);
        let row = self
            .model
            .db()
            .fetch_optional(&q.sql, &q.params)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        self.merge(row);
        Ok(())
    }

    /// Re-persist the projection against the existing record, then re-read
    /// the canonical record and merge it back. A record that no longer exists
    /// leaves the instance untouched.
    pub async fn update(&mut self) -> Result<(), AppError> {
        let key = self.native_key().ok_or_else(|| {
            AppError::BadRequest(format!(
                "cannot update a {} instance without its storage key",
                self.model.name()
            ))
        })?;
        let columns = self.model.schema().column_names();
        let data = extract_data(&self.fields, &columns);
        let key_column = &self.model.schema().key_column;
        if data.keys().any(|k| k != key_column) {
            let q = crate::sql::update_by_key(self.model.schema(), &key, &data);
            self.model.db().execute(&q.sql, &q.params).await?;
        }

        let q = crate::sql::select_by_key(self.model.schema(), &key);
        if let Some(row) = self.model.db().fetch_optional(&q.sql, &q.params).await? {
            self.merge(row);
        }
        Ok(())
    }

    /// Remove the record from the collection. The instance is stale
    /// afterwards.
    pub async fn delete(&self) -> Result<bool, AppError> {
        let key = self.native_key().ok_or_else(|| {
            AppError::BadRequest(format!(
                "cannot delete a {} instance without its storage key",
                self.model.name()
            ))
        })?;
        let q = crate::sql::delete_by_key(self.model.schema(), &key);
        self.model.db().execute(&q.sql, &q.params).await?;
        Ok(true)
    }

    fn merge(&mut self, record: Value) {
        if let Value::Object(map) = record {
            for (key, value) in map {
                self.fields.insert(key, value);
            }
        }
    }
}
