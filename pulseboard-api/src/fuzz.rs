#![cfg(test)]

use chrono::{Duration, TimeZone, Utc};

use crate::{CommentLog, VoteLedger, VoteState, VoterId};

// Few distinct voters so that sequences revisit the same ones
fn voter(n: u8) -> VoterId {
    VoterId::new(format!("u{}", n % 6))
}

fn check_invariants(l: &VoteLedger) {
    assert!(l.upvoted_by().is_disjoint(l.downvoted_by()));
    assert_eq!(l.upvotes(), l.upvoted_by().len() as u64);
    assert_eq!(l.downvotes(), l.downvoted_by().len() as u64);
}

fn apply(l: &mut VoteLedger, up: bool, v: VoterId) -> VoteState {
    match up {
        true => l.toggle_upvote(v),
        false => l.toggle_downvote(v),
    }
}

fn build(ops: &[(bool, u8)]) -> VoteLedger {
    let mut l = VoteLedger::new();
    for (up, v) in ops {
        apply(&mut l, *up, voter(*v));
    }
    l
}

#[test]
fn toggles_keep_ledger_consistent() {
    bolero::check!()
        .with_type::<Vec<(bool, u8)>>()
        .cloned()
        .for_each(|ops| {
            let mut l = VoteLedger::new();
            for (up, v) in ops {
                let v = voter(v);
                let before = l.clone();
                let state = apply(&mut l, up, v.clone());
                check_invariants(&l);
                assert_eq!(l.state_of(&v), state);

                // only the toggled voter may move
                let moved = before
                    .upvoted_by()
                    .symmetric_difference(l.upvoted_by())
                    .chain(before.downvoted_by().symmetric_difference(l.downvoted_by()));
                for m in moved {
                    assert_eq!(*m, v);
                }
            }
        })
}

#[test]
fn double_toggle_is_a_no_op() {
    bolero::check!()
        .with_type::<(Vec<(bool, u8)>, bool, u8)>()
        .cloned()
        .for_each(|(ops, up, v)| {
            let start = build(&ops);
            let mut l = start.clone();
            apply(&mut l, up, voter(v));
            apply(&mut l, up, voter(v));
            assert_eq!(l, start);
        })
}

#[test]
fn switching_sides_moves_one_vote() {
    bolero::check!()
        .with_type::<(Vec<(bool, u8)>, u8)>()
        .cloned()
        .for_each(|(ops, v)| {
            let mut l = build(&ops);
            let v = voter(v);
            if l.state_of(&v) != VoteState::Down {
                l.toggle_downvote(v.clone());
            }
            let (up, down) = (l.upvotes(), l.downvotes());
            assert_eq!(l.toggle_upvote(v.clone()), VoteState::Up);
            assert!(l.upvoted_by().contains(&v));
            assert!(!l.downvoted_by().contains(&v));
            assert_eq!((l.upvotes(), l.downvotes()), (up + 1, down - 1));
        })
}

#[test]
fn comments_are_append_only() {
    bolero::check!()
        .with_type::<Vec<(Option<u8>, String, i16)>>()
        .cloned()
        .for_each(|appends| {
            let mut log = CommentLog::new();
            let mut now = Utc.timestamp_millis_opt(1_600_000_000_000).unwrap();
            for (author, content, delta) in appends {
                // the clock may go backwards
                now = now + Duration::milliseconds(delta as i64);
                let before = log.list().to_vec();
                let added = log
                    .append(author.map(|a| format!("author {a}")), content.clone(), now)
                    .clone();
                assert_eq!(log.list().len(), before.len() + 1);
                assert_eq!(&log.list()[..before.len()], &before[..]);
                assert_eq!(added.content, content);
                assert_eq!(added.created_at, now);
                if let Some(last) = before.last() {
                    assert!(added.id > last.id);
                }
            }
        })
}
