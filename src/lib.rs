//! restforge: configuration-driven REST scaffolding engine.
//!
//! A declarative list of data models becomes a set of CRUD endpoints backed
//! by an embedded SQLite store: configuration registration -> store open ->
//! model definition -> endpoint generation.

pub mod app;
pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod handlers;
pub mod inflect;
pub mod model;
pub mod query;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;

pub use app::{AppStatus, Application};
pub use config::{AppConfig, AttributeSpec, DbConfig, FieldKind, GeneratorSpec, ModelSpec};
pub use db::Database;
pub use error::{AppError, ConfigError};
pub use model::{Instance, Model, ModelRegistry, ID_ATTRIBUTE};
pub use query::{CmpOp, Condition};
pub use routes::{common_routes, entity_routes, EndpointInfo};
pub use state::AppState;
