//! Persistence binding: derives relational schemas from model specs and
//! materializes them against the backing SQLite engine.

use crate::config::{DbConfig, FieldKind, ModelSpec};
use crate::error::{AppError, ConfigError};
use crate::sql::{row_to_json, SqliteBindValue};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

/// Bound on every storage open/sync call so a wedged engine cannot hang the
/// init sequence.
const STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the synthesized primary-key column.
pub const SYNTHETIC_ID: &str = "id";

pub const TAG_PRIMARY_KEY: &str = "primary-key";
pub const TAG_AUTO_INCREMENT: &str = "auto-increment";

#[derive(Clone, Debug)]
pub struct ColumnDef {
    pub name: String,
    pub kind: FieldKind,
    pub primary_key: bool,
    pub auto_increment: bool,
}

/// Concrete schema derived from a [`ModelSpec`].
#[derive(Clone, Debug)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// The storage-native key column.
    pub key_column: String,
    /// Whether the key column was synthesized rather than declared.
    pub synthetic_key: bool,
}

impl TableSchema {
    pub fn column_names(&self) -> HashSet<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn column_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Date => "INTEGER",
        FieldKind::Number => "NUMERIC",
        FieldKind::String => "TEXT",
    }
}

/// Derive a table schema from a model spec. When no attribute is flagged as
/// the id and none carries a `primary-key` tag, a synthetic auto-increment
/// integer key column is added.
pub fn derive_schema(spec: &ModelSpec) -> Result<TableSchema, ConfigError> {
    let mut columns = Vec::with_capacity(spec.attributes.len() + 1);
    let mut key_column: Option<String> = None;

    for (name, attr) in &spec.attributes {
        let primary_key = attr.id || attr.has_extra(TAG_PRIMARY_KEY);
        if primary_key {
            if key_column.is_some() {
                return Err(ConfigError::DuplicateIdAttribute {
                    model: spec.name.clone(),
                });
            }
            key_column = Some(name.clone());
        }
        columns.push(ColumnDef {
            name: name.clone(),
            kind: attr.kind(),
            primary_key,
            auto_increment: attr.has_extra(TAG_AUTO_INCREMENT),
        });
    }

    let synthetic_key = key_column.is_none();
    let key_column = match key_column {
        Some(k) => k,
        None => {
            columns.insert(
                0,
                ColumnDef {
                    name: SYNTHETIC_ID.to_string(),
                    kind: FieldKind::Number,
                    primary_key: true,
                    auto_increment: true,
                },
            );
            SYNTHETIC_ID.to_string()
        }
    };

    Ok(TableSchema {
        name: spec.name.clone(),
        columns,
        key_column,
        synthetic_key,
    })
}

fn create_table_sql(schema: &TableSchema) -> String {
    let cols: Vec<String> = schema
        .columns
        .iter()
        .map(|c| {
            let mut def = format!("{} ", crate::sql::quoted(&c.name));
            if c.auto_increment {
                // SQLite only honors AUTOINCREMENT on INTEGER PRIMARY KEY.
                def.push_str("INTEGER PRIMARY KEY AUTOINCREMENT");
            } else {
                def.push_str(column_type(c.kind));
                if c.primary_key {
                    def.push_str(" PRIMARY KEY");
                }
            }
            def
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        crate::sql::quoted(&schema.name),
        cols.join(", ")
    )
}

/// Handle to the backing store plus the schemas registered against it.
pub struct Database {
    pool: SqlitePool,
    schemas: RwLock<HashMap<String, TableSchema>>,
    materialized: RwLock<HashSet<String>>,
}

impl Database {
    /// Open the store described by `config`. An empty name, or one with
    /// neither `load` nor `create` set, yields an in-memory store. A missing
    /// file under `load` is downgraded to a warning and an empty store.
    pub async fn open(config: &DbConfig) -> Result<Database, AppError> {
        let file_backed = !config.name.is_empty() && (config.load || config.create);
        let (options, pool_options) = if file_backed {
            if config.load {
                if Path::new(&config.name).exists() {
                    tracing::info!(db = %config.name, "existing store found, connected");
                } else {
                    tracing::warn!(db = %config.name, "no existing store found, starting empty");
                }
            }
            (
                SqliteConnectOptions::new()
                    .filename(&config.name)
                    .create_if_missing(true),
                SqlitePoolOptions::new().max_connections(5),
            )
        } else {
            // A single never-recycled connection holds the in-memory store;
            // a second connection would see a fresh empty database.
            (
                SqliteConnectOptions::new().in_memory(true),
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None),
            )
        };

        let connected = tokio::time::timeout(STORAGE_TIMEOUT, pool_options.connect_with(options))
            .await
            .map_err(|_| AppError::Timeout("open"))?;
        let pool = match connected {
            Ok(pool) => pool,
            // An unreadable store under `load` downgrades to a warning and an
            // empty in-memory store, matching the missing-file case.
            Err(e) if config.load && !config.create => {
                tracing::warn!(db = %config.name, error = %e, "could not open store, starting empty");
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(SqliteConnectOptions::new().in_memory(true))
                    .await?
            }
            Err(e) => return Err(AppError::Db(e)),
        };

        Ok(Database {
            pool,
            schemas: RwLock::new(HashMap::new()),
            materialized: RwLock::new(HashSet::new()),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Register a schema for `spec`. Registering the same model name twice is
    /// a no-op returning the existing schema; the synthetic key is added at
    /// most once.
    pub fn add_model(&self, spec: &ModelSpec) -> Result<TableSchema, AppError> {
        let mut schemas = self.schemas.write().expect("schema registry poisoned");
        if let Some(existing) = schemas.get(&spec.name) {
            return Ok(existing.clone());
        }
        let schema = derive_schema(spec)?;
        schemas.insert(spec.name.clone(), schema.clone());
        Ok(schema)
    }

    pub fn schema(&self, name: &str) -> Result<TableSchema, AppError> {
        self.schemas
            .read()
            .expect("schema registry poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownModel(name.to_string()).into())
    }

    /// Create the backing table for one registered model if it does not exist
    /// yet. Idempotent; the table is created at most once per name.
    pub async fn ensure_collection(&self, name: &str) -> Result<(), AppError> {
        let schema = self.schema(name)?;
        {
            let materialized = self.materialized.read().expect("materialized set poisoned");
            if materialized.contains(name) {
                return Ok(());
            }
        }
        let ddl = create_table_sql(&schema);
        tracing::debug!(sql = %ddl, "create collection");
        tokio::time::timeout(STORAGE_TIMEOUT, sqlx::query(&ddl).execute(&self.pool))
            .await
            .map_err(|_| AppError::Timeout("sync"))??;
        self.materialized
            .write()
            .expect("materialized set poisoned")
            .insert(name.to_string());
        Ok(())
    }

    /// Materialize every registered schema that has not been created yet.
    pub async fn sync(&self) -> Result<(), AppError> {
        let names: Vec<String> = {
            let schemas = self.schemas.read().expect("schema registry poisoned");
            schemas.keys().cloned().collect()
        };
        for name in names {
            self.ensure_collection(&name).await?;
        }
        Ok(())
    }

    /// All records for a registered model. Unknown names fail loudly.
    pub async fn get(&self, name: &str) -> Result<Vec<Value>, AppError> {
        let schema = self.schema(name)?;
        let q = crate::sql::select_all(&schema);
        self.fetch_all(&q.sql, &q.params).await
    }

    /// Raw query passthrough to the storage engine. Escape hatch, untyped.
    pub async fn query(&self, sql: &str) -> Result<Vec<Value>, AppError> {
        self.fetch_all(sql, &[]).await
    }

    pub(crate) async fn fetch_all(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    pub(crate) async fn fetch_optional(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    pub(crate) async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "execute");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttributeSpec;
    use std::collections::BTreeMap;

    fn spec(name: &str, attrs: &[(&str, AttributeSpec)]) -> ModelSpec {
        ModelSpec {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|(n, a)| (n.to_string(), a.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn synthesizes_one_key_when_no_id_attribute() {
        let s = spec(
            "Event",
            &[
                ("email", AttributeSpec::default()),
                ("when", AttributeSpec::default()),
            ],
        );
        let schema = derive_schema(&s).unwrap();
        assert!(schema.synthetic_key);
        assert_eq!(schema.key_column, SYNTHETIC_ID);
        let keys: Vec<_> = schema.columns.iter().filter(|c| c.primary_key).collect();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].auto_increment);
    }

    #[test]
    fn explicit_id_attribute_becomes_the_key() {
        let s = spec(
            "User",
            &[(
                "email",
                AttributeSpec {
                    id: true,
                    ..AttributeSpec::default()
                },
            )],
        );
        let schema = derive_schema(&s).unwrap();
        assert!(!schema.synthetic_key);
        assert_eq!(schema.key_column, "email");
        assert_eq!(schema.columns.len(), 1);
    }

    #[test]
    fn two_id_attributes_are_rejected() {
        let id = AttributeSpec {
            id: true,
            ..AttributeSpec::default()
        };
        let s = spec("Broken", &[("a", id.clone()), ("b", id)]);
        assert!(derive_schema(&s).is_err());
    }

    #[tokio::test]
    async fn add_model_is_idempotent_per_name() {
        let db = Database::open(&DbConfig::default()).await.unwrap();
        let s = spec("Event", &[("email", AttributeSpec::default())]);
        let first = db.add_model(&s).unwrap();
        let second = db.add_model(&s).unwrap();
        assert_eq!(first.columns.len(), second.columns.len());
        assert_eq!(second.key_column, SYNTHETIC_ID);
    }

    #[tokio::test]
    async fn get_for_unregistered_model_fails_loudly() {
        let db = Database::open(&DbConfig::default()).await.unwrap();
        assert!(matches!(
            db.get("Nope").await,
            Err(AppError::Config(ConfigError::UnknownModel(_)))
        ));
    }
}
