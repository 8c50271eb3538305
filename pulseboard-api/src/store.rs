use async_trait::async_trait;
use std::{fmt, sync::Arc};

use crate::{Error, Record, RecordId};

/// Which table of the record store an entity lives in
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub enum EntityKind {
    Changelog,
    Feedback,
    Roadmap,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldType {
    Integer,
    Text,
    DateTime,
    /// Text holding an embedded JSON document
    Json,
}

// Fields every table carries, maintained by the store itself
const SYSTEM_FIELDS: &[(&str, FieldType)] = &[
    ("Id", FieldType::Integer),
    ("Name", FieldType::Text),
    ("CreatedOn", FieldType::DateTime),
    ("ModifiedOn", FieldType::DateTime),
];

const CHANGELOG_FIELDS: &[(&str, FieldType)] = &[
    ("title_c", FieldType::Text),
    ("description_c", FieldType::Text),
    ("release_date_c", FieldType::DateTime),
    ("type_c", FieldType::Text),
    ("version_c", FieldType::Text),
];

const FEEDBACK_FIELDS: &[(&str, FieldType)] = &[
    ("title_c", FieldType::Text),
    ("description_c", FieldType::Text),
    ("category_c", FieldType::Text),
    ("status_c", FieldType::Text),
    ("upvotes_c", FieldType::Integer),
    ("downvotes_c", FieldType::Integer),
    ("upvoted_by_c", FieldType::Json),
    ("downvoted_by_c", FieldType::Json),
    ("comments_c", FieldType::Json),
];

const ROADMAP_FIELDS: &[(&str, FieldType)] = &[
    ("title_c", FieldType::Text),
    ("description_c", FieldType::Text),
    ("timeline_c", FieldType::Text),
    ("status_c", FieldType::Text),
    ("estimated_date_c", FieldType::Text),
    ("votes_c", FieldType::Integer),
    ("linked_feedback_ids_c", FieldType::Json),
];

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Changelog,
        EntityKind::Feedback,
        EntityKind::Roadmap,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Changelog => "changelog_c",
            EntityKind::Feedback => "feedback_c",
            EntityKind::Roadmap => "roadmap_c",
        }
    }

    pub fn from_table(table: &str) -> Option<EntityKind> {
        EntityKind::ALL.into_iter().find(|k| k.table() == table)
    }

    /// Table-specific fields, without the system ones
    pub fn custom_fields(&self) -> &'static [(&'static str, FieldType)] {
        match self {
            EntityKind::Changelog => CHANGELOG_FIELDS,
            EntityKind::Feedback => FEEDBACK_FIELDS,
            EntityKind::Roadmap => ROADMAP_FIELDS,
        }
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        SYSTEM_FIELDS
            .iter()
            .chain(self.custom_fields().iter())
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t)
    }

    /// Every field name of the table, system fields first
    pub fn field_names(&self) -> Vec<&'static str> {
        SYSTEM_FIELDS
            .iter()
            .chain(self.custom_fields().iter())
            .map(|(n, _)| *n)
            .collect()
    }

    pub fn is_system_field(name: &str) -> bool {
        SYSTEM_FIELDS.iter().any(|(n, _)| *n == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Direction {
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

/// Equality filter on a single field
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn all() -> Query {
        Query::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Query {
        self.filter = Some(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Query {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }
}

/// The remote tabular store all entities are persisted in
///
/// Returned records always carry their `Id`. Writes only need the fields being
/// set, the store fills in the rest.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_one(&self, kind: EntityKind, id: RecordId) -> Result<Record, Error>;
    async fn fetch_many(&self, kind: EntityKind, query: &Query) -> Result<Vec<Record>, Error>;
    async fn create_one(&self, kind: EntityKind, fields: Record) -> Result<Record, Error>;
    async fn update_one(
        &self,
        kind: EntityKind,
        id: RecordId,
        fields: Record,
    ) -> Result<Record, Error>;
    /// Returns whether a record was actually deleted
    async fn delete_one(&self, kind: EntityKind, id: RecordId) -> Result<bool, Error>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn fetch_one(&self, kind: EntityKind, id: RecordId) -> Result<Record, Error> {
        (**self).fetch_one(kind, id).await
    }

    async fn fetch_many(&self, kind: EntityKind, query: &Query) -> Result<Vec<Record>, Error> {
        (**self).fetch_many(kind, query).await
    }

    async fn create_one(&self, kind: EntityKind, fields: Record) -> Result<Record, Error> {
        (**self).create_one(kind, fields).await
    }

    async fn update_one(
        &self,
        kind: EntityKind,
        id: RecordId,
        fields: Record,
    ) -> Result<Record, Error> {
        (**self).update_one(kind, id, fields).await
    }

    async fn delete_one(&self, kind: EntityKind, id: RecordId) -> Result<bool, Error> {
        (**self).delete_one(kind, id).await
    }
}
