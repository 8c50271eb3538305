use crate::{RecordId, Time};

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogEntry {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub release_date: Option<Time>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub version: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewChangelogEntry {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to the time of creation
    pub release_date: Option<Time>,
    /// Defaults to `feature`
    pub kind: Option<String>,
    pub version: Option<String>,
}

impl NewChangelogEntry {
    pub const DEFAULT_KIND: &'static str = "feature";

    pub fn new(title: impl Into<String>) -> NewChangelogEntry {
        NewChangelogEntry {
            title: title.into(),
            description: None,
            release_date: None,
            kind: None,
            version: None,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ChangelogUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<Time>,
    pub kind: Option<String>,
    pub version: Option<String>,
}
