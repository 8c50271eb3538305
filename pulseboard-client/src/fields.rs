//! Reading the store's loosely named columns
//!
//! Custom columns carry a `_c` suffix (`title_c`), but records written by older
//! clients may use the bare name. Readers try the suffixed name first.

use crate::api::{Error, Record, Time};

pub(crate) const UNTITLED: &str = "Untitled";

pub(crate) fn column(name: &str) -> String {
    format!("{name}_c")
}

fn key(record: &Record, name: &str) -> String {
    let suffixed = column(name);
    if !record.contains(&suffixed) && record.contains(name) {
        return String::from(name);
    }
    suffixed
}

pub(crate) fn text(record: &Record, name: &str) -> Result<Option<String>, Error> {
    record.str(&key(record, name))
}

pub(crate) fn integer(record: &Record, name: &str) -> Result<Option<i64>, Error> {
    record.i64(&key(record, name))
}

pub(crate) fn time(record: &Record, name: &str) -> Result<Option<Time>, Error> {
    record.time(&key(record, name))
}

pub(crate) fn embedded<T>(record: &Record, name: &str) -> Result<Option<T>, Error>
where
    T: serde::de::DeserializeOwned,
{
    record.embedded(&key(record, name))
}

/// `title_c`, else the record's `Name`
pub(crate) fn title(record: &Record) -> Result<String, Error> {
    match text(record, "title")?.filter(|t| !t.is_empty()) {
        Some(t) => Ok(t),
        None => Ok(record.str("Name")?.unwrap_or_default()),
    }
}

/// The store shows `Name` in its own UI, so it mirrors the title
pub(crate) fn set_title(fields: &mut Record, title: &str) {
    let name = match title.is_empty() {
        true => UNTITLED,
        false => title,
    };
    fields.set("Name", name);
    fields.set(column("title"), title);
}

pub(crate) fn set_opt(fields: &mut Record, name: &str, value: Option<&String>) {
    if let Some(v) = value {
        fields.set(column(name), v.as_str());
    }
}
