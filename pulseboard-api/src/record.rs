use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::{Error, RecordId, Time};

pub type Fields = serde_json::Map<String, Value>;

/// A row of the record store, as loosely typed as the store hands it out
///
/// `null` values are treated the same as missing ones by every accessor.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct Record(pub Fields);

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn id(&self) -> Result<RecordId, Error> {
        self.i64("Id")?
            .map(RecordId)
            .ok_or_else(|| Error::malformed("Id", "record has no id"))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn str(&self, name: &str) -> Result<Option<String>, Error> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(v) => Err(Error::malformed(name, format!("expected text, got {v}"))),
        }
    }

    /// Integers may also be stored as their decimal text
    pub fn i64(&self, name: &str) -> Result<Option<i64>, Error> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| Error::malformed(name, format!("expected an integer, got {n}"))),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| Error::malformed(name, format!("expected an integer: {e}"))),
            Some(v) => Err(Error::malformed(name, format!("expected an integer, got {v}"))),
        }
    }

    /// Accepts RFC 3339 timestamps as well as bare dates, taken as midnight UTC
    pub fn time(&self, name: &str) -> Result<Option<Time>, Error> {
        let s = match self.str(name)? {
            None => return Ok(None),
            Some(s) if s.is_empty() => return Ok(None),
            Some(s) => s,
        };
        if let Ok(t) = DateTime::parse_from_rfc3339(&s) {
            return Ok(Some(t.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| Some(Utc.from_utc_datetime(&t)))
            .ok_or_else(|| Error::malformed(name, format!("expected a date, got {s:?}")))
    }

    /// Decodes a JSON document embedded as text in field `name`
    ///
    /// Stores able to hold nested documents directly are supported too.
    pub fn embedded<T>(&self, name: &str) -> Result<Option<T>, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let res = match self.get(name) {
            None => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => serde_json::from_str(s),
            Some(v) => serde_json::from_value(v.clone()),
        };
        res.map(Some).map_err(|e| Error::malformed(name, e))
    }

    pub fn set_embedded<T>(&mut self, name: &str, doc: &T) -> Result<(), Error>
    where
        T: serde::Serialize,
    {
        let text = serde_json::to_string(doc).map_err(|e| Error::malformed(name, e))?;
        self.set(name, text);
        Ok(())
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Record {
        Record(fields)
    }
}
