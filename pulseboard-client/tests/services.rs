use chrono::TimeZone;
use pulseboard_client::{
    api::{
        ChangelogUpdate, EntityKind, Error, FieldError, NewChangelogEntry, NewComment,
        NewFeedback, NewRoadmapItem, Record, RecordId, RoadmapUpdate, VoterId, ANONYMOUS_AUTHOR,
    },
    Client,
};
use pulseboard_mock_server::{MockStore, Notification, RecordingNotifier};
use serde_json::json;

fn client() -> (Client<MockStore, RecordingNotifier>, MockStore, RecordingNotifier) {
    let store = MockStore::new();
    let notifier = RecordingNotifier::new();
    (
        Client::new(store.clone(), notifier.clone()),
        store,
        notifier,
    )
}

fn raw(v: serde_json::Value) -> Record {
    serde_json::from_value(v).unwrap()
}

#[tokio::test]
async fn votes_toggle_and_switch() {
    let (client, store, _) = client();
    let feedback = client.feedback();
    let id = feedback.create(NewFeedback::new("Dark mode")).await.unwrap().id;
    let u1 = VoterId::new("u1");

    let f = feedback.downvote(id, u1.clone()).await.unwrap();
    assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (0, 1));

    let f = feedback.upvote(id, u1.clone()).await.unwrap();
    assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (1, 0));
    assert!(f.votes.upvoted_by().contains(&u1));

    let f = feedback.upvote(id, u1.clone()).await.unwrap();
    assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (0, 0));

    let stored = store.with(|s| s.test_get_raw(EntityKind::Feedback, id).cloned().unwrap());
    assert_eq!(stored.get("upvotes_c"), Some(&json!(0)));
    assert_eq!(stored.get("upvoted_by_c"), Some(&json!("[]")));
    assert_eq!(stored.get("downvoted_by_c"), Some(&json!("[]")));
}

#[tokio::test]
async fn votes_of_others_are_kept() {
    let (client, _, _) = client();
    let feedback = client.feedback();
    let id = feedback.create(NewFeedback::new("Export")).await.unwrap().id;
    feedback.upvote(id, VoterId::new("a")).await.unwrap();
    feedback.downvote(id, VoterId::new("b")).await.unwrap();
    let f = feedback.upvote(id, VoterId::new("c")).await.unwrap();
    assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (2, 1));
    assert_eq!(f.votes.score(), 1);
}

#[tokio::test]
async fn voters_listed_twice_are_dropped() {
    let (client, store, _) = client();
    let id = store.with(|s| {
        s.test_insert_raw(
            EntityKind::Feedback,
            raw(json!({
                "Name": "Corrupt",
                "upvotes_c": 1,
                "downvotes_c": 1,
                "upvoted_by_c": "[\"u1\"]",
                "downvoted_by_c": "[\"u1\"]",
            })),
        )
    });

    let f = client.feedback().get(id).await.unwrap();
    assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (0, 0));

    let f = client.feedback().upvote(id, VoterId::new("u2")).await.unwrap();
    assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (1, 0));
    let stored = store.with(|s| s.test_get_raw(EntityKind::Feedback, id).cloned().unwrap());
    assert_eq!(stored.get("upvoted_by_c"), Some(&json!("[\"u2\"]")));
    assert_eq!(stored.get("downvoted_by_c"), Some(&json!("[]")));
}

#[tokio::test]
async fn voting_on_missing_feedback_writes_nothing() {
    let (client, store, notifier) = client();
    let err = client
        .feedback()
        .upvote(RecordId(5), VoterId::new("u1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::NotFound {
            kind: EntityKind::Feedback,
            id: RecordId(5)
        }
    );
    assert_eq!(store.with(|s| s.test_num_records(EntityKind::Feedback)), 0);
    let errors = notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("feedback_c record 5 not found"), "{errors:?}");
}

#[tokio::test]
async fn comments_are_appended_in_order() {
    let (client, _, notifier) = client();
    let feedback = client.feedback();
    let id = feedback.create(NewFeedback::new("Tags")).await.unwrap().id;
    notifier.take();

    let first = feedback
        .add_comment(
            id,
            NewComment {
                author: None,
                content: String::from("first"),
            },
        )
        .await
        .unwrap();
    assert_eq!(first.author, ANONYMOUS_AUTHOR);
    let second = feedback
        .add_comment(
            id,
            NewComment {
                author: Some(String::from("Ann")),
                content: String::from("second"),
            },
        )
        .await
        .unwrap();
    assert!(second.id > first.id);

    let comments = feedback.comments(id).await.unwrap();
    assert_eq!(comments, vec![first, second]);
    assert_eq!(
        notifier.take(),
        vec![
            Notification::Success(String::from("Comment added")),
            Notification::Success(String::from("Comment added")),
        ]
    );
}

#[tokio::test]
async fn rejected_writes_reach_the_notifier() {
    let (client, store, notifier) = client();
    store.with(|s| {
        s.test_fail_next(Error::Validation {
            message: String::from("invalid feedback_c record"),
            fields: vec![FieldError {
                field_label: String::from("title_c"),
                message: String::from("is too long"),
            }],
        })
    });
    let err = client
        .feedback()
        .create(NewFeedback::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(
        notifier.take(),
        vec![
            Notification::Error(String::from("title_c: is too long")),
            Notification::Error(String::from("invalid feedback_c record")),
        ]
    );
    assert_eq!(store.with(|s| s.test_num_records(EntityKind::Feedback)), 0);
}

#[tokio::test]
async fn store_failures_are_returned_not_swallowed() {
    let (client, store, notifier) = client();
    store.with(|s| s.test_fail_next(Error::Store(String::from("timed out"))));
    let err = client.roadmap().list().await.unwrap_err();
    assert_eq!(err, Error::Store(String::from("timed out")));
    assert_eq!(
        notifier.errors(),
        vec![String::from(
            "Failed fetching roadmap: Record store failure: timed out"
        )]
    );
    assert!(client.roadmap().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn feedback_is_listed_newest_first() {
    let (client, _, _) = client();
    let feedback = client.feedback();
    for title in ["a", "b", "c"] {
        feedback.create(NewFeedback::new(title)).await.unwrap();
    }
    let titles: Vec<String> = feedback
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.title)
        .collect();
    assert_eq!(titles, ["c", "b", "a"]);
}

#[tokio::test]
async fn status_updates_keep_the_rest() {
    let (client, _, _) = client();
    let feedback = client.feedback();
    let id = feedback.create(NewFeedback::new("Search")).await.unwrap().id;
    feedback.upvote(id, VoterId::new("u1")).await.unwrap();
    let f = feedback
        .update_status(id, String::from("planned"))
        .await
        .unwrap();
    assert_eq!(f.status.as_deref(), Some("planned"));
    assert_eq!(f.title, "Search");
    assert_eq!(f.category.as_deref(), Some(NewFeedback::DEFAULT_CATEGORY));
    assert_eq!(f.votes.upvotes(), 1);
}

#[tokio::test]
async fn deleting_twice() {
    let (client, _, notifier) = client();
    let id = client
        .feedback()
        .create(NewFeedback::new("Gone"))
        .await
        .unwrap()
        .id;
    assert!(client.feedback().delete(id).await.unwrap());
    assert!(!client.feedback().delete(id).await.unwrap());
    assert!(client.feedback().get(id).await.is_err());
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn changelog_by_release_date_and_version() {
    let (client, _, _) = client();
    let changelog = client.changelog();
    for (title, day, version) in [("one", 1, "1.0"), ("three", 3, "1.1"), ("two", 2, "1.1")] {
        let mut new = NewChangelogEntry::new(title);
        new.release_date = Some(chrono::Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap());
        new.version = Some(String::from(version));
        changelog.create(new).await.unwrap();
    }

    let titles = |entries: Vec<pulseboard_client::api::ChangelogEntry>| -> Vec<String> {
        entries.into_iter().map(|e| e.title).collect()
    };
    assert_eq!(titles(changelog.list().await.unwrap()), ["three", "two", "one"]);
    assert_eq!(titles(changelog.by_version("1.1").await.unwrap()), ["three", "two"]);
    assert!(changelog.by_version("2.0").await.unwrap().is_empty());

    let first = changelog.list().await.unwrap().remove(0);
    assert_eq!(first.kind.as_deref(), Some(NewChangelogEntry::DEFAULT_KIND));
    let updated = changelog
        .update(
            first.id,
            ChangelogUpdate {
                version: Some(String::from("1.2")),
                ..ChangelogUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version.as_deref(), Some("1.2"));
    assert_eq!(updated.release_date, first.release_date);
}

#[tokio::test]
async fn roadmap_by_timeline() {
    let (client, _, _) = client();
    let roadmap = client.roadmap();
    let now = roadmap.create(NewRoadmapItem::new("SSO")).await.unwrap();
    assert_eq!(now.timeline.as_deref(), Some(NewRoadmapItem::DEFAULT_TIMELINE));
    assert_eq!(now.status.as_deref(), Some(NewRoadmapItem::DEFAULT_STATUS));
    assert_eq!(now.votes, 0);

    let mut later = NewRoadmapItem::new("Mobile app");
    later.timeline = Some(String::from("later"));
    later.linked_feedback_ids = vec![RecordId(1), RecordId(4)];
    let later = roadmap.create(later).await.unwrap();
    assert_eq!(later.linked_feedback_ids, [RecordId(1), RecordId(4)]);

    let ids: Vec<RecordId> = roadmap
        .by_timeline("immediate")
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, [now.id]);
    assert_eq!(roadmap.list().await.unwrap()[0].id, later.id);

    let moved = roadmap
        .update(
            now.id,
            RoadmapUpdate {
                timeline: Some(String::from("later")),
                votes: Some(3),
                ..RoadmapUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.votes, 3);
    assert_eq!(roadmap.by_timeline("later").await.unwrap().len(), 2);
}

#[tokio::test]
async fn legacy_field_names_are_read() {
    let (client, store, _) = client();
    let id = store.with(|s| {
        s.test_insert_raw(
            EntityKind::Roadmap,
            raw(json!({
                "Name": "Legacy",
                "timeline": "next",
                "votes": "7",
                "linked_feedback_ids": [2],
            })),
        )
    });
    let item = client.roadmap().get(id).await.unwrap();
    assert_eq!(item.title, "Legacy");
    assert_eq!(item.timeline.as_deref(), Some("next"));
    assert_eq!(item.votes, 7);
    assert_eq!(item.linked_feedback_ids, [RecordId(2)]);
}

#[tokio::test]
async fn numeric_voters_keep_their_type() {
    let (client, store, _) = client();
    let id = store.with(|s| {
        s.test_insert_raw(
            EntityKind::Feedback,
            raw(json!({
                "Name": "Mixed voters",
                "upvotes_c": 1,
                "downvotes_c": 1,
                "upvoted_by_c": "[42]",
                "downvoted_by_c": "[\"42\"]",
            })),
        )
    });

    let f = client.feedback().upvote(id, VoterId::new("u2")).await.unwrap();
    assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (2, 1));
    let stored = store.with(|s| s.test_get_raw(EntityKind::Feedback, id).cloned().unwrap());
    assert_eq!(stored.get("upvoted_by_c"), Some(&json!("[42,\"u2\"]")));
    assert_eq!(stored.get("downvoted_by_c"), Some(&json!("[\"42\"]")));

    let f = client.feedback().upvote(id, VoterId::from(42)).await.unwrap();
    assert_eq!((f.votes.upvotes(), f.votes.downvotes()), (1, 1));
    assert!(f.votes.downvoted_by().contains(&VoterId::new("42")));
}
