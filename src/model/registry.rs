//! The model factory: owns the store handle and produces models.

use crate::config::{AppConfig, ModelSpec};
use crate::db::Database;
use crate::error::AppError;
use crate::model::Model;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Produces and holds the application's models. A registry only exists after
/// the store's load/create sequence has resolved, so model production cannot
/// race initialization.
pub struct ModelRegistry {
    db: Arc<Database>,
    models: RwLock<HashMap<String, Arc<Model>>>,
}

impl ModelRegistry {
    /// Run the full init sequence: open the store (load first when enabled),
    /// then materialize anything pending when `create` is set.
    pub async fn open(config: &AppConfig) -> Result<Arc<ModelRegistry>, AppError> {
        let db = Arc::new(Database::open(&config.db).await?);
        if config.db.create {
            db.sync().await?;
        }
        Ok(Arc::new(ModelRegistry {
            db,
            models: RwLock::new(HashMap::new()),
        }))
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Produce a model for `spec`: register its schema, create the backing
    /// collection if absent (exactly once per name), and store the model.
    /// Defining the same name again returns the existing model.
    pub async fn define(&self, spec: &ModelSpec) -> Result<Arc<Model>, AppError> {
        if let Some(existing) = self.get(&spec.name) {
            return Ok(existing);
        }
        let schema = self.db.add_model(spec)?;
        self.db.ensure_collection(&spec.name).await?;
        let model = Arc::new(Model::new(spec.clone(), schema, Arc::clone(&self.db)));
        self.models
            .write()
            .expect("model registry poisoned")
            .insert(spec.name.clone(), Arc::clone(&model));
        Ok(model)
    }

    /// Look a model up by name.
    pub fn get(&self, name: &str) -> Option<Arc<Model>> {
        self.models
            .read()
            .expect("model registry poisoned")
            .get(name)
            .cloned()
    }

    pub fn models(&self) -> Vec<Arc<Model>> {
        self.models
            .read()
            .expect("model registry poisoned")
            .values()
            .cloned()
            .collect()
    }
}
