use anyhow::{anyhow, Context};
use serde_json::json;

use crate::{EntityKind, RecordId};

/// A store's complaint about one field of a record
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel")]
    pub field_label: String,
    pub message: String,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("{kind} record {id} not found")]
    NotFound { kind: EntityKind, id: RecordId },

    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("Record store failure: {0}")]
    Store(String),

    #[error("Malformed field {field:?}: {reason}")]
    MalformedRecord { field: String, reason: String },
}

impl Error {
    pub fn malformed(field: impl Into<String>, reason: impl ToString) -> Error {
        Error::MalformedRecord {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Store(_) => StatusCode::BAD_GATEWAY,
            Error::MalformedRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::NotFound { kind, id } => json!({
                "message": "record not found",
                "type": "not-found",
                "table": kind.table(),
                "id": id,
            }),
            Error::Validation { message, fields } => json!({
                "message": message,
                "type": "validation",
                "errors": fields,
            }),
            Error::Store(msg) => json!({
                "message": msg,
                "type": "store",
            }),
            Error::MalformedRecord { field, reason } => json!({
                "message": reason,
                "type": "malformed-record",
                "field": field,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let message = || {
            String::from(
                data.get("message")
                    .and_then(|msg| msg.as_str())
                    .unwrap_or(""),
            )
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(message()),
                "not-found" => Error::NotFound {
                    kind: data
                        .get("table")
                        .and_then(|t| t.as_str())
                        .and_then(EntityKind::from_table)
                        .ok_or_else(|| anyhow!("error is a not-found without a known table"))?,
                    id: RecordId(
                        data.get("id")
                            .and_then(|id| id.as_i64())
                            .ok_or_else(|| anyhow!("error is a not-found without an id"))?,
                    ),
                },
                "validation" => Error::Validation {
                    message: message(),
                    fields: match data.get("errors") {
                        Some(errors) => serde_json::from_value(errors.clone())
                            .context("parsing validation field errors")?,
                        None => Vec::new(),
                    },
                },
                "store" => Error::Store(message()),
                "malformed-record" => Error::MalformedRecord {
                    field: String::from(
                        data.get("field")
                            .and_then(|f| f.as_str())
                            .ok_or_else(|| anyhow!("error is a malformed-record without a field"))?,
                    ),
                    reason: message(),
                },
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
