//! Query-condition composition: comparison operators, conjunction trees, and
//! the flat-argument parser behind `retrieve().by_attr`.

use crate::error::AppError;
use serde_json::Value;

/// Comparison operators accepted in attribute queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    Contains,
    In,
}

impl CmpOp {
    pub fn parse(s: &str) -> Result<CmpOp, AppError> {
        Ok(match s {
            "=" => CmpOp::Eq,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::Gte,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::Lte,
            "!=" => CmpOp::Ne,
            "contains" => CmpOp::Contains,
            "in" => CmpOp::In,
            other => {
                return Err(AppError::BadRequest(format!(
                    "unsupported operator '{}'",
                    other
                )))
            }
        })
    }
}

/// A filter condition: a single comparison or a conjunction of conditions.
#[derive(Clone, Debug)]
pub enum Condition {
    Cmp {
        field: String,
        op: CmpOp,
        value: Value,
    },
    And(Vec<Condition>),
}

impl Condition {
    pub fn eq(field: impl Into<String>, value: Value) -> Condition {
        Condition::cmp(field, CmpOp::Eq, value)
    }

    pub fn cmp(field: impl Into<String>, op: CmpOp, value: Value) -> Condition {
        Condition::Cmp {
            field: field.into(),
            op,
            value,
        }
    }

    /// Fold another comparison into this condition. An existing conjunction
    /// grows; a lone comparison and the new one combine into a fresh
    /// conjunction.
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut conditions) => {
                conditions.push(other);
                Condition::And(conditions)
            }
            single => Condition::And(vec![single, other]),
        }
    }

    /// Parse a flat argument list into a condition.
    ///
    /// Exactly two arguments are an equality test `(field, value)`. Otherwise
    /// the list must decompose into complete `(field, operator, value)`
    /// triples combined under AND; any remainder is a caller error.
    pub fn from_args(args: &[Value]) -> Result<Condition, AppError> {
        if args.len() == 2 {
            let field = field_name(&args[0])?;
            return Ok(Condition::eq(field, args[1].clone()));
        }
        if args.is_empty() || args.len() % 3 != 0 {
            return Err(AppError::BadRequest(format!(
                "attribute query takes 2 arguments or complete (field, operator, value) triples; got {}",
                args.len()
            )));
        }
        let mut condition: Option<Condition> = None;
        for triple in args.chunks(3) {
            let field = field_name(&triple[0])?;
            let op = match triple[1].as_str() {
                Some(s) => CmpOp::parse(s)?,
                None => {
                    return Err(AppError::BadRequest(
                        "operator must be a string".to_string(),
                    ))
                }
            };
            let next = Condition::cmp(field, op, triple[2].clone());
            condition = Some(match condition {
                None => next,
                Some(existing) => existing.and(next),
            });
        }
        Ok(condition.expect("at least one triple"))
    }
}

fn field_name(v: &Value) -> Result<String, AppError> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("field name must be a string".to_string()))
}
