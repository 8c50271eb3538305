use crate::RecordId;

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapItem {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub timeline: Option<String>,
    pub status: Option<String>,
    /// Free-form, e.g. `Q3 2024`
    pub estimated_date: Option<String>,
    pub votes: i64,
    pub linked_feedback_ids: Vec<RecordId>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewRoadmapItem {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `immediate`
    pub timeline: Option<String>,
    /// Defaults to `Planned`
    pub status: Option<String>,
    pub estimated_date: Option<String>,
    pub votes: i64,
    pub linked_feedback_ids: Vec<RecordId>,
}

impl NewRoadmapItem {
    pub const DEFAULT_TIMELINE: &'static str = "immediate";
    pub const DEFAULT_STATUS: &'static str = "Planned";

    pub fn new(title: impl Into<String>) -> NewRoadmapItem {
        NewRoadmapItem {
            title: title.into(),
            description: None,
            timeline: None,
            status: None,
            estimated_date: None,
            votes: 0,
            linked_feedback_ids: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RoadmapUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub timeline: Option<String>,
    pub status: Option<String>,
    pub estimated_date: Option<String>,
    pub votes: Option<i64>,
    pub linked_feedback_ids: Option<Vec<RecordId>>,
}
