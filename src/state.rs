//! Shared state for the generated routes.

use crate::error::AppError;
use crate::model::{Model, ModelRegistry};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    /// Resource path segment (pluralized, lowercased) -> model name.
    pub resources: Arc<HashMap<String, String>>,
}

impl AppState {
    pub fn new(registry: Arc<ModelRegistry>) -> AppState {
        let resources = registry
            .models()
            .iter()
            .map(|m| (crate::inflect::resource_name(m.name()), m.name().to_string()))
            .collect();
        AppState {
            registry,
            resources: Arc::new(resources),
        }
    }

    /// Resolve the model behind a resource path segment. Models defined after
    /// the router was built miss the snapshot, so fall back to the registry.
    pub fn model_for(&self, resource: &str) -> Result<Arc<Model>, AppError> {
        if let Some(model) = self
            .resources
            .get(resource)
            .and_then(|name| self.registry.get(name))
        {
            return Ok(model);
        }
        self.registry
            .models()
            .into_iter()
            .find(|m| crate::inflect::resource_name(m.name()) == resource)
            .ok_or_else(|| AppError::NotFound(resource.to_string()))
    }
}
