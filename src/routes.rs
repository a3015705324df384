//! Generated REST routes: one pluralized resource per model.
//!
//! Routes are parameterized on the resource segment; handlers resolve the
//! model by path so newly defined models are reachable without rebuilding
//! the router.

use crate::handlers::{create, delete as delete_handler, list, read, update};
use crate::model::Model;
use crate::state::AppState;
use axum::{routing::get, Json, Router};
use serde::Serialize;

/// One generated endpoint, kept on the application for introspection.
#[derive(Clone, Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: String,
    pub model: String,
}

/// The five CRUD endpoints generated for one model.
pub fn describe(model: &Model) -> Vec<EndpointInfo> {
    let resource = crate::inflect::resource_name(model.name());
    let base = format!("/{}", resource);
    let item = format!("/{}/:id", resource);
    let descriptors = vec![
        ("GET", base.clone()),
        ("POST", base),
        ("GET", item.clone()),
        ("PUT", item.clone()),
        ("DELETE", item),
    ];
    descriptors
        .into_iter()
        .map(|(method, path)| {
            tracing::info!(method, path = %path, model = model.name(), "endpoint");
            EndpointInfo {
                method,
                path,
                model: model.name().to_string(),
            }
        })
        .collect()
}

/// Entity CRUD routes over the generated resources.
pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:resource", get(list).post(create))
        .route(
            "/:resource/:id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Common routes (no state): GET /health, GET /version.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}
