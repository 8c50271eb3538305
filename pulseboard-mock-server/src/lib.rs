use std::{
    cmp::Ordering,
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use pulseboard_api::{
    Direction, EntityKind, Error, FieldError, FieldType, Notifier, Query, Record, RecordId,
    RecordStore,
};
use serde_json::Value;

mod http;
pub use http::{router, spawn, HttpState};

/// In-memory stand-in for the remote record store
///
/// Every table knows its schema, writes to unknown fields or with values of the
/// wrong type are rejected the way the real store rejects them.
#[derive(Debug, Default)]
pub struct MockServer {
    tables: BTreeMap<EntityKind, Table>,
    injected: VecDeque<Error>,
}

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<RecordId, Record>,
}

fn now_str() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn validate(kind: EntityKind, fields: &Record) -> Result<(), Error> {
    let mut errors = Vec::new();
    for (name, value) in fields.0.iter() {
        if EntityKind::is_system_field(name) && name != "Name" {
            // maintained by the store, silently ignored
            continue;
        }
        let ok = match kind.field_type(name) {
            None => {
                errors.push(FieldError {
                    field_label: name.clone(),
                    message: format!("is not a field of {}", kind.table()),
                });
                continue;
            }
            Some(_) if value.is_null() => true,
            Some(FieldType::Integer) => value.is_i64() || value.is_u64(),
            Some(FieldType::Text) | Some(FieldType::DateTime) | Some(FieldType::Json) => {
                value.is_string()
            }
        };
        if !ok {
            errors.push(FieldError {
                field_label: name.clone(),
                message: format!("has the wrong type: {value}"),
            });
        }
    }
    match errors.is_empty() {
        true => Ok(()),
        false => Err(Error::Validation {
            message: format!("invalid {} record", kind.table()),
            fields: errors,
        }),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        // rfc3339 timestamps of one store sort correctly as text
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::default()
    }

    /// Makes the next store call fail with `err`, whatever it is
    pub fn test_fail_next(&mut self, err: Error) {
        self.injected.push_back(err);
    }

    /// Stores `record` exactly as given, bypassing validation, and returns its id
    pub fn test_insert_raw(&mut self, kind: EntityKind, mut record: Record) -> RecordId {
        let table = self.tables.entry(kind).or_default();
        table.last_id += 1;
        let id = RecordId(table.last_id);
        record.set("Id", id.0);
        table.rows.insert(id, record);
        id
    }

    /// Raw view of a stored record
    pub fn test_get_raw(&self, kind: EntityKind, id: RecordId) -> Option<&Record> {
        self.tables.get(&kind).and_then(|t| t.rows.get(&id))
    }

    pub fn test_num_records(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map(|t| t.rows.len()).unwrap_or(0)
    }

    fn injected_failure(&mut self) -> Result<(), Error> {
        match self.injected.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn fetch_one(&mut self, kind: EntityKind, id: RecordId) -> Result<Record, Error> {
        self.injected_failure()?;
        self.tables
            .get(&kind)
            .and_then(|t| t.rows.get(&id))
            .cloned()
            .ok_or(Error::NotFound { kind, id })
    }

    pub fn fetch_many(&mut self, kind: EntityKind, query: &Query) -> Result<Vec<Record>, Error> {
        self.injected_failure()?;
        let mut res: Vec<Record> = match self.tables.get(&kind) {
            None => Vec::new(),
            Some(t) => t
                .rows
                .values()
                .filter(|r| match &query.filter {
                    None => true,
                    Some(f) => r.get(&f.field) == Some(&f.value),
                })
                .cloned()
                .collect(),
        };
        if let Some(o) = &query.order_by {
            // rows come out of the map by ascending id, which breaks ties
            res.sort_by(|a, b| {
                let ord = compare(a.get(&o.field), b.get(&o.field));
                match o.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        Ok(res)
    }

    pub fn create_one(&mut self, kind: EntityKind, fields: Record) -> Result<Record, Error> {
        self.injected_failure()?;
        validate(kind, &fields)?;
        let table = self.tables.entry(kind).or_default();
        table.last_id += 1;
        let id = RecordId(table.last_id);
        let now = now_str();
        let mut record = Record::new();
        for (name, value) in fields.0 {
            if !EntityKind::is_system_field(&name) || name == "Name" {
                record.set(name, value);
            }
        }
        record.set("Id", id.0);
        record.set("CreatedOn", now.clone());
        record.set("ModifiedOn", now);
        table.rows.insert(id, record.clone());
        tracing::debug!(table = kind.table(), ?id, "created record");
        Ok(record)
    }

    pub fn update_one(
        &mut self,
        kind: EntityKind,
        id: RecordId,
        fields: Record,
    ) -> Result<Record, Error> {
        self.injected_failure()?;
        validate(kind, &fields)?;
        let record = self
            .tables
            .get_mut(&kind)
            .and_then(|t| t.rows.get_mut(&id))
            .ok_or(Error::NotFound { kind, id })?;
        for (name, value) in fields.0 {
            if !EntityKind::is_system_field(&name) || name == "Name" {
                record.set(name, value);
            }
        }
        record.set("ModifiedOn", now_str());
        tracing::debug!(table = kind.table(), ?id, "updated record");
        Ok(record.clone())
    }

    pub fn delete_one(&mut self, kind: EntityKind, id: RecordId) -> Result<bool, Error> {
        self.injected_failure()?;
        Ok(self
            .tables
            .get_mut(&kind)
            .and_then(|t| t.rows.remove(&id))
            .is_some())
    }
}

/// Shareable handle on a [`MockServer`], usable wherever a [`RecordStore`] is
#[derive(Clone, Debug, Default)]
pub struct MockStore(Arc<Mutex<MockServer>>);

impl MockStore {
    pub fn new() -> MockStore {
        MockStore::default()
    }

    /// Runs `f` with exclusive access to the underlying server
    pub fn with<R>(&self, f: impl FnOnce(&mut MockServer) -> R) -> R {
        let mut server = self.0.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut server)
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn fetch_one(&self, kind: EntityKind, id: RecordId) -> Result<Record, Error> {
        self.with(|s| s.fetch_one(kind, id))
    }

    async fn fetch_many(&self, kind: EntityKind, query: &Query) -> Result<Vec<Record>, Error> {
        self.with(|s| s.fetch_many(kind, query))
    }

    async fn create_one(&self, kind: EntityKind, fields: Record) -> Result<Record, Error> {
        self.with(|s| s.create_one(kind, fields))
    }

    async fn update_one(
        &self,
        kind: EntityKind,
        id: RecordId,
        fields: Record,
    ) -> Result<Record, Error> {
        self.with(|s| s.update_one(kind, id, fields))
    }

    async fn delete_one(&self, kind: EntityKind, id: RecordId) -> Result<bool, Error> {
        self.with(|s| s.delete_one(kind, id))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Notifier keeping everything it is told, for assertions
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier(Arc<Mutex<Vec<Notification>>>);

impl RecordingNotifier {
    pub fn new() -> RecordingNotifier {
        RecordingNotifier::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn errors(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter_map(|n| match n {
                Notification::Error(msg) => Some(msg.clone()),
                Notification::Success(_) => None,
            })
            .collect()
    }

    fn push(&self, n: Notification) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(n);
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.push(Notification::Success(String::from(message)));
    }

    fn error(&self, message: &str) {
        self.push(Notification::Error(String::from(message)));
    }
}
