//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a table schema.

use crate::db::TableSchema;
use crate::error::AppError;
use crate::query::{CmpOp, Condition};
use serde_json::{Map, Value};

/// Quote an identifier for SQLite.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }
}

/// INSERT from a field map, returning the stored row (including the
/// engine-assigned key). Fields outside the schema were already stripped by
/// the caller.
pub fn insert(schema: &TableSchema, fields: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = quoted(&schema.name);
    let cols: Vec<&String> = schema
        .columns
        .iter()
        .map(|c| &c.name)
        .filter(|name| fields.contains_key(*name))
        .collect();
    if cols.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table);
        return q;
    }
    let col_list: Vec<String> = cols.iter().map(|c| quoted(c)).collect();
    let placeholders: Vec<&str> = cols.iter().map(|_| "?").collect();
    for col in &cols {
        q.params.push(fields[col.as_str()].clone());
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        col_list.join(", "),
        placeholders.join(", ")
    );
    q
}

pub fn select_all(schema: &TableSchema) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT * FROM {}", quoted(&schema.name));
    q
}

/// SELECT by the storage-native key.
pub fn select_by_key(schema: &TableSchema, key: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT * FROM {} WHERE {} = ?",
        quoted(&schema.name),
        quoted(&schema.key_column)
    );
    q.params.push(key.clone());
    q
}

/// SELECT with a WHERE clause rendered from a condition tree. Fields are
/// checked against the schema before rendering.
pub fn select_where(schema: &TableSchema, condition: &Condition) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut clause = String::new();
    render_condition(schema, condition, &mut clause, &mut q.params)?;
    q.sql = format!("SELECT * FROM {} WHERE {}", quoted(&schema.name), clause);
    Ok(q)
}

/// UPDATE the row addressed by the native key. The key column is never part
/// of the SET list.
pub fn update_by_key(
    schema: &TableSchema,
    key: &Value,
    fields: &Map<String, Value>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let assignments: Vec<String> = schema
        .columns
        .iter()
        .filter(|c| c.name != schema.key_column && fields.contains_key(&c.name))
        .map(|c| {
            q.params.push(fields[&c.name].clone());
            format!("{} = ?", quoted(&c.name))
        })
        .collect();
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quoted(&schema.name),
        assignments.join(", "),
        quoted(&schema.key_column)
    );
    q.params.push(key.clone());
    q
}

/// DELETE the row addressed by the native key.
pub fn delete_by_key(schema: &TableSchema, key: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        quoted(&schema.name),
        quoted(&schema.key_column)
    );
    q.params.push(key.clone());
    q
}

fn render_condition(
    schema: &TableSchema,
    condition: &Condition,
    out: &mut String,
    params: &mut Vec<Value>,
) -> Result<(), AppError> {
    match condition {
        Condition::And(parts) => {
            if parts.is_empty() {
                return Err(AppError::BadRequest(
                    "conjunction must contain at least one condition".to_string(),
                ));
            }
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push_str(" AND ");
                }
                out.push('(');
                render_condition(schema, part, out, params)?;
                out.push(')');
            }
            Ok(())
        }
        Condition::Cmp { field, op, value } => {
            if schema.column(field).is_none() {
                return Err(AppError::BadRequest(format!(
                    "unknown field '{}' for model '{}'",
                    field, schema.name
                )));
            }
            let col = quoted(field);
            match op {
                CmpOp::Eq => push_simple(out, params, &col, "=", value),
                CmpOp::Gt => push_simple(out, params, &col, ">", value),
                CmpOp::Gte => push_simple(out, params, &col, ">=", value),
                CmpOp::Lt => push_simple(out, params, &col, "<", value),
                CmpOp::Lte => push_simple(out, params, &col, "<=", value),
                CmpOp::Ne => push_simple(out, params, &col, "!=", value),
                CmpOp::Contains => {
                    out.push_str(&format!("instr({}, ?) > 0", col));
                    params.push(value.clone());
                }
                CmpOp::In => {
                    let items = value.as_array().ok_or_else(|| {
                        AppError::BadRequest("'in' operator expects an array value".to_string())
                    })?;
                    if items.is_empty() {
                        // IN () is not valid SQL; an empty list matches nothing.
                        out.push_str("1 = 0");
                        return Ok(());
                    }
                    let placeholders: Vec<&str> = items.iter().map(|_| "?").collect();
                    out.push_str(&format!("{} IN ({})", col, placeholders.join(", ")));
                    params.extend(items.iter().cloned());
                }
            }
            Ok(())
        }
    }
}

fn push_simple(out: &mut String, params: &mut Vec<Value>, col: &str, op: &str, value: &Value) {
    out.push_str(&format!("{} {} ?", col, op));
    params.push(value.clone());
}
