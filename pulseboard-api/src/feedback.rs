use crate::{CommentLog, RecordId, Time, VoteLedger};

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItem {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,

    #[serde(flatten)]
    pub votes: VoteLedger,

    /// Oldest first
    #[serde(default)]
    pub comments: CommentLog,

    pub created_at: Option<Time>,
    pub updated_at: Option<Time>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewFeedback {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `feature`
    pub category: Option<String>,
    /// Defaults to `new`
    pub status: Option<String>,
}

impl NewFeedback {
    pub const DEFAULT_CATEGORY: &'static str = "feature";
    pub const DEFAULT_STATUS: &'static str = "new";

    pub fn new(title: impl Into<String>) -> NewFeedback {
        NewFeedback {
            title: title.into(),
            description: None,
            category: None,
            status: None,
        }
    }
}

/// Fields left to `None` are not touched
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FeedbackUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}
