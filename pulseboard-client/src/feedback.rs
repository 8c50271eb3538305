use crate::{
    api::{
        Comment, CommentLog, Direction, EntityKind, Error, FeedbackItem, FeedbackUpdate,
        NewComment, NewFeedback, Notifier, Query, Record, RecordId, RecordStore, VoteLedger,
        VoterId,
    },
    fields::{self, column},
    Client,
};

const KIND: EntityKind = EntityKind::Feedback;

pub(crate) fn from_record(r: &Record) -> Result<FeedbackItem, Error> {
    let id = r.id()?;
    let upvoted_by: Vec<VoterId> = fields::embedded(r, "upvoted_by")?.unwrap_or_default();
    let downvoted_by: Vec<VoterId> = fields::embedded(r, "downvoted_by")?.unwrap_or_default();
    let (votes, conflicting) = VoteLedger::from_stored(upvoted_by, downvoted_by);
    if !conflicting.is_empty() {
        tracing::warn!(
            ?id,
            ?conflicting,
            "feedback lists voters as both up- and down-voters, ignoring their votes"
        );
    }
    let stored_counts = (
        fields::integer(r, "upvotes")?.unwrap_or(0),
        fields::integer(r, "downvotes")?.unwrap_or(0),
    );
    if stored_counts != (votes.upvotes() as i64, votes.downvotes() as i64) {
        tracing::warn!(
            ?id,
            ?stored_counts,
            upvotes = votes.upvotes(),
            downvotes = votes.downvotes(),
            "stored vote counts disagree with voter lists, using the lists"
        );
    }
    Ok(FeedbackItem {
        id,
        title: fields::title(r)?,
        description: fields::text(r, "description")?,
        category: fields::text(r, "category")?,
        status: fields::text(r, "status")?,
        votes,
        comments: fields::embedded::<CommentLog>(r, "comments")?.unwrap_or_default(),
        created_at: r.time("CreatedOn")?,
        updated_at: r.time("ModifiedOn")?,
    })
}

fn votes_fields(votes: &VoteLedger) -> Result<Record, Error> {
    let mut f = Record::new();
    f.set(column("upvotes"), votes.upvotes());
    f.set(column("downvotes"), votes.downvotes());
    f.set_embedded(&column("upvoted_by"), votes.upvoted_by())?;
    f.set_embedded(&column("downvoted_by"), votes.downvoted_by())?;
    Ok(f)
}

fn comments_fields(comments: &CommentLog) -> Result<Record, Error> {
    let mut f = Record::new();
    f.set_embedded(&column("comments"), comments)?;
    Ok(f)
}

fn create_fields(new: &NewFeedback) -> Result<Record, Error> {
    let mut f = Record::new();
    fields::set_title(&mut f, &new.title);
    fields::set_opt(&mut f, "description", new.description.as_ref());
    f.set(
        column("category"),
        new.category
            .as_deref()
            .unwrap_or(NewFeedback::DEFAULT_CATEGORY),
    );
    f.set(
        column("status"),
        new.status.as_deref().unwrap_or(NewFeedback::DEFAULT_STATUS),
    );
    let mut empty = votes_fields(&VoteLedger::new())?;
    f.0.append(&mut empty.0);
    let mut empty = comments_fields(&CommentLog::new())?;
    f.0.append(&mut empty.0);
    Ok(f)
}

fn update_fields(patch: &FeedbackUpdate) -> Record {
    let mut f = Record::new();
    if let Some(title) = &patch.title {
        fields::set_title(&mut f, title);
    }
    fields::set_opt(&mut f, "description", patch.description.as_ref());
    fields::set_opt(&mut f, "category", patch.category.as_ref());
    fields::set_opt(&mut f, "status", patch.status.as_ref());
    f
}

#[derive(Clone, Copy, Debug)]
enum Vote {
    Up,
    Down,
}

pub struct FeedbackService<'a, S, N> {
    client: &'a Client<S, N>,
}

impl<'a, S: RecordStore, N: Notifier> FeedbackService<'a, S, N> {
    pub(crate) fn new(client: &'a Client<S, N>) -> Self {
        FeedbackService { client }
    }

    async fn load(&self, id: RecordId) -> Result<FeedbackItem, Error> {
        from_record(&self.client.store().fetch_one(KIND, id).await?)
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<FeedbackItem>, Error> {
        let res: Result<Vec<FeedbackItem>, Error> = async {
            let query = Query::all().order_by("Id", Direction::Descending);
            self.client
                .store()
                .fetch_many(KIND, &query)
                .await?
                .iter()
                .map(from_record)
                .collect()
        }
        .await;
        self.client.reported("fetching feedback", res)
    }

    pub async fn get(&self, id: RecordId) -> Result<FeedbackItem, Error> {
        let res = self.load(id).await;
        self.client.reported(&format!("fetching feedback {id}"), res)
    }

    pub async fn create(&self, new: NewFeedback) -> Result<FeedbackItem, Error> {
        let res: Result<FeedbackItem, Error> = async {
            let fields = create_fields(&new)?;
            from_record(&self.client.store().create_one(KIND, fields).await?)
        }
        .await;
        let item = self.client.reported("creating feedback", res)?;
        self.client.succeeded(&format!("Feedback {} created", item.id));
        Ok(item)
    }

    pub async fn update(&self, id: RecordId, patch: FeedbackUpdate) -> Result<FeedbackItem, Error> {
        let res: Result<FeedbackItem, Error> = async {
            let record = self
                .client
                .store()
                .update_one(KIND, id, update_fields(&patch))
                .await?;
            from_record(&record)
        }
        .await;
        let item = self.client.reported(&format!("updating feedback {id}"), res)?;
        self.client.succeeded(&format!("Feedback {id} updated"));
        Ok(item)
    }

    pub async fn update_status(&self, id: RecordId, status: String) -> Result<FeedbackItem, Error> {
        self.update(
            id,
            FeedbackUpdate {
                status: Some(status),
                ..FeedbackUpdate::default()
            },
        )
        .await
    }

    /// Returns whether there was something to delete
    pub async fn delete(&self, id: RecordId) -> Result<bool, Error> {
        let res = self.client.store().delete_one(KIND, id).await;
        let deleted = self.client.reported(&format!("deleting feedback {id}"), res)?;
        if deleted {
            self.client.succeeded(&format!("Feedback {id} deleted"));
        }
        Ok(deleted)
    }

    /// Toggles `voter`'s upvote and returns the item as stored afterwards
    pub async fn upvote(&self, id: RecordId, voter: VoterId) -> Result<FeedbackItem, Error> {
        self.vote(id, voter, Vote::Up).await
    }

    /// Toggles `voter`'s downvote and returns the item as stored afterwards
    pub async fn downvote(&self, id: RecordId, voter: VoterId) -> Result<FeedbackItem, Error> {
        self.vote(id, voter, Vote::Down).await
    }

    // Not atomic: a concurrent vote on the same item between the read and the
    // write is lost.
    async fn vote(&self, id: RecordId, voter: VoterId, vote: Vote) -> Result<FeedbackItem, Error> {
        let res: Result<FeedbackItem, Error> = async {
            let mut votes = self.load(id).await?.votes;
            let state = match vote {
                Vote::Up => votes.toggle_upvote(voter.clone()),
                Vote::Down => votes.toggle_downvote(voter.clone()),
            };
            tracing::debug!(?id, ?voter, ?state, "toggled vote");
            self.client
                .store()
                .update_one(KIND, id, votes_fields(&votes)?)
                .await?;
            self.load(id).await
        }
        .await;
        self.client
            .reported(&format!("recording {vote:?} vote on feedback {id}"), res)
    }

    /// Oldest first
    pub async fn comments(&self, id: RecordId) -> Result<Vec<Comment>, Error> {
        let res = self.load(id).await.map(|f| f.comments.into_vec());
        self.client
            .reported(&format!("fetching comments of feedback {id}"), res)
    }

    pub async fn add_comment(&self, id: RecordId, comment: NewComment) -> Result<Comment, Error> {
        let res: Result<Comment, Error> = async {
            let mut comments = self.load(id).await?.comments;
            let added = comments.append_now(comment).clone();
            self.client
                .store()
                .update_one(KIND, id, comments_fields(&comments)?)
                .await?;
            Ok(added)
        }
        .await;
        let added = self
            .client
            .reported(&format!("adding comment to feedback {id}"), res)?;
        self.client.succeeded("Comment added");
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(v: serde_json::Value) -> Record {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn stored_record_is_normalized() {
        let f = from_record(&record(json!({
            "Id": 3,
            "Name": "Dark mode",
            "description_c": "please",
            "category_c": "feature",
            "status_c": "new",
            "upvotes_c": 2,
            "downvotes_c": 0,
            "upvoted_by_c": "[\"u1\", 7]",
            "downvoted_by_c": null,
            "comments_c": "[{\"Id\": 1, \"author\": \"Ann\", \"content\": \"+1\", \"createdAt\": \"2024-01-02T03:04:05.000Z\"}]",
            "CreatedOn": "2024-01-01T00:00:00Z",
        })))
        .unwrap();
        assert_eq!(f.id, RecordId(3));
        assert_eq!(f.title, "Dark mode");
        assert_eq!(f.description.as_deref(), Some("please"));
        assert_eq!(f.votes.upvotes(), 2);
        assert!(f.votes.upvoted_by().contains(&VoterId::from(7)));
        assert_eq!(f.votes.downvotes(), 0);
        assert_eq!(f.comments.len(), 1);
        assert_eq!(f.comments.list()[0].author, "Ann");
        assert!(f.created_at.is_some());
        assert_eq!(f.updated_at, None);
    }

    #[test]
    fn counts_come_from_voter_lists() {
        let f = from_record(&record(json!({
            "Id": 1,
            "upvotes_c": 10,
            "downvotes_c": 4,
            "upvoted_by_c": "[\"a\",\"b\"]",
            "downvoted_by_c": "[\"b\"]",
        })))
        .unwrap();
        assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (1, 0));
        assert!(f.comments.is_empty());
    }

    #[test]
    fn broken_comment_list_is_an_error() {
        let err = from_record(&record(json!({"Id": 1, "comments_c": "[{"}))).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { field, .. } if field == "comments_c"));
    }

    #[test]
    fn new_feedback_defaults() {
        let f = create_fields(&NewFeedback::new("")).unwrap();
        assert_eq!(f.get("Name"), Some(&json!("Untitled")));
        assert_eq!(f.get("category_c"), Some(&json!("feature")));
        assert_eq!(f.get("status_c"), Some(&json!("new")));
        assert_eq!(f.get("upvotes_c"), Some(&json!(0)));
        assert_eq!(f.get("upvoted_by_c"), Some(&json!("[]")));
        assert_eq!(f.get("comments_c"), Some(&json!("[]")));
        assert!(!f.contains("description_c"));
    }

    #[test]
    fn update_only_writes_given_fields() {
        let f = update_fields(&FeedbackUpdate {
            status: Some(String::from("planned")),
            ..FeedbackUpdate::default()
        });
        assert_eq!(f.0.len(), 1);
        assert_eq!(f.get("status_c"), Some(&json!("planned")));
    }
}
