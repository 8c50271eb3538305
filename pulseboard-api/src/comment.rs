use chrono::{TimeZone, Utc};

use crate::Time;

pub const ANONYMOUS_AUTHOR: &str = "Anonymous User";

/// Identifies a comment within its log, later comments have higher ids
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub i64);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(from = "StoredComment")]
pub struct Comment {
    #[serde(rename = "Id")]
    pub id: CommentId,

    pub author: String,

    pub content: String,

    #[serde(rename = "createdAt")]
    pub created_at: Time,
}

fn anonymous() -> String {
    String::from(ANONYMOUS_AUTHOR)
}

/// Comments written by older clients may lack any field but the id
#[derive(serde::Deserialize)]
struct StoredComment {
    #[serde(rename = "Id")]
    id: CommentId,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default, rename = "createdAt")]
    created_at: Option<Time>,
}

impl From<StoredComment> for Comment {
    fn from(c: StoredComment) -> Comment {
        // ids are creation timestamps, the best guess for a missing date
        let created_at = c
            .created_at
            .or_else(|| Utc.timestamp_millis_opt(c.id.0).single())
            .unwrap_or_default();
        Comment {
            id: c.id,
            author: c.author.unwrap_or_else(anonymous),
            content: c.content,
            created_at,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    /// Falls back to [`ANONYMOUS_AUTHOR`] when missing or empty
    pub author: Option<String>,
    pub content: String,
}

/// Append-only list of comments, in the order they were written
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct CommentLog(Vec<Comment>);

impl CommentLog {
    pub fn new() -> CommentLog {
        CommentLog::default()
    }

    /// Appends a comment written at `now` and returns it
    ///
    /// The id is the millisecond timestamp, bumped past the last id of the log
    /// when the clock did not move forward.
    pub fn append(&mut self, author: Option<String>, content: String, now: Time) -> &Comment {
        let mut id = now.timestamp_millis();
        if let Some(last) = self.0.iter().map(|c| c.id.0).max() {
            id = id.max(last.saturating_add(1));
        }
        self.0.push(Comment {
            id: CommentId(id),
            author: author.filter(|a| !a.is_empty()).unwrap_or_else(anonymous),
            content,
            created_at: now,
        });
        &self.0[self.0.len() - 1]
    }

    pub fn append_now(&mut self, comment: NewComment) -> &Comment {
        self.append(comment.author, comment.content, Utc::now())
    }

    pub fn list(&self) -> &[Comment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Comment> {
        self.0
    }
}

impl From<Vec<Comment>> for CommentLog {
    fn from(comments: Vec<Comment>) -> CommentLog {
        CommentLog(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> Time {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn append_defaults_author() {
        let mut log = CommentLog::new();
        let c = log.append(None, String::from("hello"), at(1_000)).clone();
        assert_eq!(c.content, "hello");
        assert_eq!(c.author, ANONYMOUS_AUTHOR);
        assert_eq!(c.id, CommentId(1_000));
        assert_eq!(c.created_at, at(1_000));
        assert_eq!(log.list(), &[c]);

        let c = log.append(Some(String::new()), String::from("again"), at(2_000));
        assert_eq!(c.author, ANONYMOUS_AUTHOR);
    }

    #[test]
    fn ids_increase_when_clock_stalls() {
        let mut log = CommentLog::new();
        log.append(Some(String::from("a")), String::from("1"), at(5_000));
        log.append(Some(String::from("b")), String::from("2"), at(5_000));
        log.append(Some(String::from("c")), String::from("3"), at(4_000));
        let ids: Vec<i64> = log.list().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![5_000, 5_001, 5_002]);
        let contents: Vec<&str> = log.list().iter().map(|c| &c.content as &str).collect();
        assert_eq!(contents, vec!["1", "2", "3"]);
    }

    #[test]
    fn stored_shape() {
        let stored = r#"[{"Id":1700000000000,"content":"hi","createdAt":"2023-11-14T22:13:20.000Z"}]"#;
        let log: CommentLog = serde_json::from_str(stored).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.list()[0].author, ANONYMOUS_AUTHOR);
        assert_eq!(log.list()[0].created_at, at(1_700_000_000_000));

        let written = serde_json::to_value(&log).unwrap();
        assert_eq!(written[0]["Id"], 1_700_000_000_000i64);
        assert_eq!(written[0]["author"], ANONYMOUS_AUTHOR);
    }

    #[test]
    fn legacy_comments_without_content_or_date() {
        let stored = r#"[{"Id":1700000000000,"author":null},{"Id":1700000000001,"content":"ok"}]"#;
        let log: CommentLog = serde_json::from_str(stored).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.list()[0].content, "");
        assert_eq!(log.list()[0].author, ANONYMOUS_AUTHOR);
        assert_eq!(log.list()[0].created_at, at(1_700_000_000_000));
        assert_eq!(log.list()[1].content, "ok");
        assert_eq!(log.list()[1].created_at, at(1_700_000_000_001));
    }
}
