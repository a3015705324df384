//! CRUD handlers bound to the generated resource routes.

use crate::config::FieldKind;
use crate::error::AppError;
use crate::model::Model;
use crate::query::Condition;
use crate::response::{success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

fn parse_id(model: &Arc<Model>, id_str: &str) -> Result<Value, AppError> {
    let key = &model.schema().key_column;
    let kind = model
        .schema()
        .column(key)
        .map(|c| c.kind)
        .unwrap_or(FieldKind::String);
    Ok(match kind {
        FieldKind::Number | FieldKind::Date => {
            if let Ok(n) = id_str.parse::<i64>() {
                Value::Number(n.into())
            } else {
                id_str
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| AppError::BadRequest("invalid id".to_string()))?
            }
        }
        FieldKind::String => Value::String(id_str.to_string()),
    })
}

/// Coerce a query-string value to the column's field type for filtering.
fn query_value_for_column(model: &Arc<Model>, col: &str, s: &str) -> Value {
    let kind = model
        .schema()
        .column(col)
        .map(|c| c.kind)
        .unwrap_or(FieldKind::String);
    match kind {
        FieldKind::Number | FieldKind::Date => {
            if let Ok(n) = s.parse::<i64>() {
                return Value::Number(n.into());
            }
            if let Ok(f) = s.parse::<f64>() {
                if let Some(n) = serde_json::Number::from_f64(f) {
                    return Value::Number(n);
                }
            }
            Value::String(s.to_string())
        }
        FieldKind::String => Value::String(s.to_string()),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let model = state.model_for(&resource)?;
    let mut condition: Option<Condition> = None;
    for (k, v) in &params {
        if model.schema().column(k).is_none() {
            continue;
        }
        let next = Condition::eq(k.clone(), query_value_for_column(&model, k, v));
        condition = Some(match condition {
            None => next,
            Some(existing) => existing.and(next),
        });
    }
    let instances = match condition {
        Some(c) => model.retrieve().find(&c).await?,
        None => model.all().await?,
    };
    let rows: Vec<Value> = instances
        .iter()
        .map(|i| Value::Object(i.fields().clone()))
        .collect();
    Ok(success_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let model = state.model_for(&resource)?;
    if !body.is_object() {
        return Err(AppError::BadRequest("body must be a JSON object".to_string()));
    }
    let instance = model.insert(body).await?;
    Ok(success_one(Value::Object(instance.fields().clone())))
}

pub async fn read(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let model = state.model_for(&resource)?;
    let id = parse_id(&model, &id_str)?;
    let instance = model.retrieve().by_id(&id).await?;
    Ok(success_one_ok(Value::Object(instance.fields().clone())))
}

pub async fn update(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let model = state.model_for(&resource)?;
    let id = parse_id(&model, &id_str)?;
    let fields = match body {
        Value::Object(map) => map,
        _ => return Err(AppError::BadRequest("body must be a JSON object".to_string())),
    };
    let mut instance = model.retrieve().by_id(&id).await?;
    for (k, v) in fields {
        instance.set(k, v);
    }
    instance.update().await?;
    Ok(success_one_ok(Value::Object(instance.fields().clone())))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let model = state.model_for(&resource)?;
    let id = parse_id(&model, &id_str)?;
    let instance = model.retrieve().by_id(&id).await?;
    instance.delete().await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
