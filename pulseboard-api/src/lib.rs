use chrono::Utc;
use std::fmt;

mod changelog;
pub use changelog::{ChangelogEntry, ChangelogUpdate, NewChangelogEntry};

mod comment;
pub use comment::{Comment, CommentId, CommentLog, NewComment, ANONYMOUS_AUTHOR};

mod error;
pub use error::{Error, FieldError};

mod feedback;
pub use feedback::{FeedbackItem, FeedbackUpdate, NewFeedback};

mod notify;
pub use notify::Notifier;

mod record;
pub use record::{Fields, Record};

mod roadmap;
pub use roadmap::{NewRoadmapItem, RoadmapItem, RoadmapUpdate};

mod store;
pub use store::{Direction, EntityKind, FieldType, Filter, OrderBy, Query, RecordStore};

mod vote;
pub use vote::{VoteLedger, VoteState};

pub mod wire;

mod fuzz;

pub type Time = chrono::DateTime<Utc>;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of someone casting votes
///
/// Stored vote lists hold strings, numbers or a mix of both. The JSON type is
/// kept, `42` and `"42"` are different voters.
#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(untagged)]
pub enum VoterId {
    Number(i64),
    Text(String),
}

impl VoterId {
    pub fn new(id: impl Into<String>) -> VoterId {
        VoterId::Text(id.into())
    }
}

impl From<i64> for VoterId {
    fn from(id: i64) -> VoterId {
        VoterId::Number(id)
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoterId::Number(n) => write!(f, "{n}"),
            VoterId::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voter_ids_keep_their_json_type() {
        let ids: Vec<VoterId> = serde_json::from_str(r#"["u1", 42, "42"]"#).unwrap();
        assert_eq!(
            ids,
            vec![VoterId::new("u1"), VoterId::from(42), VoterId::new("42")]
        );
        assert_ne!(ids[1], ids[2]);
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"["u1",42,"42"]"#);
    }

    #[test]
    fn record_ids_are_bare_integers() {
        assert_eq!(serde_json::to_string(&RecordId(7)).unwrap(), "7");
        assert_eq!(serde_json::from_str::<RecordId>("12").unwrap(), RecordId(12));
    }
}
