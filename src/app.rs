//! Application orchestrator: configuration registration, store init, model
//! definition, endpoint generation, and the status state machine.

use crate::config::{self, AppConfig, ModelSpec};
use crate::error::AppError;
use crate::model::{Model, ModelRegistry};
use crate::routes::{self, EndpointInfo};
use crate::state::AppState;
use axum::Router;
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// Application lifecycle states. Transitions are strictly forward
/// (initialized -> started -> stopped); anything else is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Initialized,
    Started,
    Stopped,
}

impl AppStatus {
    fn rank(self) -> u8 {
        match self {
            AppStatus::Initialized => 0,
            AppStatus::Started => 1,
            AppStatus::Stopped => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AppStatus::Initialized => "initialized",
            AppStatus::Started => "started",
            AppStatus::Stopped => "stopped",
        }
    }
}

pub struct Application {
    name: String,
    status: RwLock<AppStatus>,
    configuration: AppConfig,
    registry: Arc<ModelRegistry>,
    endpoints: Vec<EndpointInfo>,
}

impl Application {
    /// Create an application from a configuration: register it, run the
    /// store's init sequence, define every configured model, and generate
    /// endpoint descriptors. The first failure of any stage fails the whole
    /// creation.
    pub async fn create(config: AppConfig) -> Result<Application, AppError> {
        let configuration = config::registry::register(config);
        if configuration.logging {
            init_logging();
        }

        let registry = ModelRegistry::open(&configuration).await?;

        let mut endpoints = Vec::new();
        for spec in &configuration.models {
            let model = registry.define(spec).await?;
            endpoints.extend(routes::describe(&model));
        }

        Ok(Application {
            name: configuration.name.clone(),
            status: RwLock::new(AppStatus::Initialized),
            configuration,
            registry,
            endpoints,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &AppConfig {
        &self.configuration
    }

    pub fn status(&self) -> AppStatus {
        *self.status.read().expect("application status poisoned")
    }

    pub fn models(&self) -> Vec<Arc<Model>> {
        self.registry.models()
    }

    pub fn endpoints(&self) -> &[EndpointInfo] {
        &self.endpoints
    }

    /// Look up a model produced for this application.
    pub fn model(&self, name: &str) -> Option<Arc<Model>> {
        self.registry.get(name)
    }

    /// Define an additional model after creation.
    pub async fn define(&self, spec: &ModelSpec) -> Result<Arc<Model>, AppError> {
        self.registry.define(spec).await
    }

    /// Build the router exposing the generated endpoints.
    pub fn router(&self) -> Router {
        let state = AppState::new(Arc::clone(&self.registry));
        routes::common_routes().merge(routes::entity_routes(state))
    }

    /// Mark the application started.
    pub fn run(&self) -> Result<(), AppError> {
        self.transition(AppStatus::Started)?;
        tracing::info!(app = %self.name, "started application");
        Ok(())
    }

    /// Mark the application stopped. Does not tear down a serving listener
    /// or the storage handle.
    pub fn stop(&self) -> Result<(), AppError> {
        self.transition(AppStatus::Stopped)?;
        tracing::info!(app = %self.name, "stopped application");
        Ok(())
    }

    fn transition(&self, to: AppStatus) -> Result<(), AppError> {
        let mut status = self.status.write().expect("application status poisoned");
        if to.rank() <= status.rank() {
            return Err(AppError::InvalidTransition {
                from: status.name(),
                to: to.name(),
            });
        }
        *status = to;
        Ok(())
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("restforge=info")),
        )
        .try_init();
}
