//! JSON envelopes exchanged with the record store over HTTP
//!
//! Every response is wrapped in `{ "success": bool, "message": ... }`. Writes
//! report one result per submitted record.

use crate::{Direction, EntityKind, Error, FieldError, Query, Record, RecordId};

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FieldRef {
    pub field: FieldName,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct WhereClause {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: String,
    #[serde(rename = "Values")]
    pub values: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct OrderClause {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub sorttype: Direction,
}

pub const OPERATOR_EQUAL_TO: &str = "EqualTo";

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub fields: Vec<FieldRef>,
    #[serde(default, rename = "where")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(default, rename = "orderBy")]
    pub order_by: Vec<OrderClause>,
}

impl FetchRequest {
    /// Requests every field of `kind`'s table
    pub fn new(kind: EntityKind, query: &Query) -> FetchRequest {
        FetchRequest {
            fields: kind
                .field_names()
                .into_iter()
                .map(|n| FieldRef {
                    field: FieldName {
                        name: String::from(n),
                    },
                })
                .collect(),
            where_clauses: query
                .filter
                .iter()
                .map(|f| WhereClause {
                    field_name: f.field.clone(),
                    operator: String::from(OPERATOR_EQUAL_TO),
                    values: vec![f.value.clone()],
                })
                .collect(),
            order_by: query
                .order_by
                .iter()
                .map(|o| OrderClause {
                    field_name: o.field.clone(),
                    sorttype: o.direction,
                })
                .collect(),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| &f.field.name as &str)
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Record>>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FetchOneResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Record>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MutationRequest {
    pub records: Vec<Record>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DeleteRequest {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<RecordId>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl RecordResult {
    pub fn ok(data: Option<Record>) -> RecordResult {
        RecordResult {
            success: true,
            data,
            message: None,
            errors: None,
        }
    }

    /// Per-record outcome for a failed write
    pub fn failed(err: &Error) -> RecordResult {
        let errors = match err {
            Error::Validation { fields, .. } if !fields.is_empty() => Some(fields.clone()),
            _ => None,
        };
        RecordResult {
            success: false,
            data: None,
            message: Some(err.to_string()),
            errors,
        }
    }

    pub fn into_error(self) -> Error {
        Error::Validation {
            message: self
                .message
                .unwrap_or_else(|| String::from("record was rejected by the store")),
            fields: self.errors.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<RecordResult>>,
}
