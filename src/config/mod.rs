//! Configuration types and the process-wide registry.

pub mod registry;
mod types;

pub use types::{AppConfig, AttributeSpec, DbConfig, FieldKind, GeneratorSpec, ModelSpec};
