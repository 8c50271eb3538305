use std::collections::BTreeSet;

use crate::VoterId;

/// Where a voter stands on a feedback item
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum VoteState {
    Up,
    Down,
    None,
}

/// Up- and down-voters of a single feedback item
///
/// Only the membership sets are stored, counts are always derived from them.
/// A voter is never in both sets at once.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(from = "StoredVotes", into = "StoredVotes")]
pub struct VoteLedger {
    upvoted_by: BTreeSet<VoterId>,
    downvoted_by: BTreeSet<VoterId>,
}

impl VoteLedger {
    pub fn new() -> VoteLedger {
        VoteLedger::default()
    }

    /// Rebuilds a ledger from stored membership lists
    ///
    /// Duplicates collapse. Voters listed on both sides cannot be attributed to
    /// either, so they are dropped from both and returned to the caller.
    pub fn from_stored<U, D>(upvoted_by: U, downvoted_by: D) -> (VoteLedger, Vec<VoterId>)
    where
        U: IntoIterator<Item = VoterId>,
        D: IntoIterator<Item = VoterId>,
    {
        let mut upvoted_by: BTreeSet<VoterId> = upvoted_by.into_iter().collect();
        let mut downvoted_by: BTreeSet<VoterId> = downvoted_by.into_iter().collect();
        let conflicting: Vec<VoterId> = upvoted_by.intersection(&downvoted_by).cloned().collect();
        for v in conflicting.iter() {
            upvoted_by.remove(v);
            downvoted_by.remove(v);
        }
        (
            VoteLedger {
                upvoted_by,
                downvoted_by,
            },
            conflicting,
        )
    }

    pub fn upvoted_by(&self) -> &BTreeSet<VoterId> {
        &self.upvoted_by
    }

    pub fn downvoted_by(&self) -> &BTreeSet<VoterId> {
        &self.downvoted_by
    }

    pub fn upvotes(&self) -> u64 {
        self.upvoted_by.len() as u64
    }

    pub fn downvotes(&self) -> u64 {
        self.downvoted_by.len() as u64
    }

    /// Upvotes minus downvotes
    pub fn score(&self) -> i64 {
        self.upvotes() as i64 - self.downvotes() as i64
    }

    pub fn state_of(&self, voter: &VoterId) -> VoteState {
        if self.upvoted_by.contains(voter) {
            VoteState::Up
        } else if self.downvoted_by.contains(voter) {
            VoteState::Down
        } else {
            VoteState::None
        }
    }

    /// Retracts `voter`'s upvote if there is one, upvotes otherwise
    ///
    /// A downvote by the same voter is withdrawn when the upvote lands.
    pub fn toggle_upvote(&mut self, voter: VoterId) -> VoteState {
        toggle(
            &mut self.upvoted_by,
            &mut self.downvoted_by,
            voter,
            VoteState::Up,
        )
    }

    /// Mirror of [`VoteLedger::toggle_upvote`]
    pub fn toggle_downvote(&mut self, voter: VoterId) -> VoteState {
        toggle(
            &mut self.downvoted_by,
            &mut self.upvoted_by,
            voter,
            VoteState::Down,
        )
    }
}

fn toggle(
    same: &mut BTreeSet<VoterId>,
    opposite: &mut BTreeSet<VoterId>,
    voter: VoterId,
    landed: VoteState,
) -> VoteState {
    if same.remove(&voter) {
        return VoteState::None;
    }
    opposite.remove(&voter);
    same.insert(voter);
    landed
}

/// Serialized shape, with counts alongside the sets for readers that only
/// look at the counts
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredVotes {
    #[serde(default)]
    upvoted_by: Vec<VoterId>,
    #[serde(default)]
    downvoted_by: Vec<VoterId>,
    #[serde(default)]
    upvotes: u64,
    #[serde(default)]
    downvotes: u64,
}

impl From<StoredVotes> for VoteLedger {
    fn from(s: StoredVotes) -> VoteLedger {
        let (ledger, conflicting) = VoteLedger::from_stored(s.upvoted_by, s.downvoted_by);
        if !conflicting.is_empty() {
            tracing::warn!(?conflicting, "dropped voters listed as both up- and down-voters");
        }
        ledger
    }
}

impl From<VoteLedger> for StoredVotes {
    fn from(l: VoteLedger) -> StoredVotes {
        StoredVotes {
            upvotes: l.upvotes(),
            downvotes: l.downvotes(),
            upvoted_by: l.upvoted_by.into_iter().collect(),
            downvoted_by: l.downvoted_by.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> VoterId {
        VoterId::new(s)
    }

    fn ids(set: &BTreeSet<VoterId>) -> Vec<String> {
        set.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn down_then_up_then_up() {
        let mut l = VoteLedger::new();

        assert_eq!(l.toggle_downvote(v("u1")), VoteState::Down);
        assert_eq!(ids(l.downvoted_by()), vec!["u1"]);
        assert_eq!((l.upvotes(), l.downvotes()), (0, 1));

        assert_eq!(l.toggle_upvote(v("u1")), VoteState::Up);
        assert_eq!(ids(l.upvoted_by()), vec!["u1"]);
        assert!(l.downvoted_by().is_empty());
        assert_eq!((l.upvotes(), l.downvotes()), (1, 0));

        assert_eq!(l.toggle_upvote(v("u1")), VoteState::None);
        assert!(l.upvoted_by().is_empty());
        assert_eq!((l.upvotes(), l.downvotes()), (0, 0));
    }

    #[test]
    fn up_then_down_switches() {
        let mut l = VoteLedger::new();
        l.toggle_upvote(v("a"));
        l.toggle_upvote(v("b"));
        assert_eq!(l.toggle_downvote(v("a")), VoteState::Down);
        assert_eq!(l.state_of(&v("a")), VoteState::Down);
        assert_eq!(l.state_of(&v("b")), VoteState::Up);
        assert_eq!(l.state_of(&v("c")), VoteState::None);
        assert_eq!((l.upvotes(), l.downvotes()), (1, 1));
        assert_eq!(l.score(), 0);
    }

    #[test]
    fn other_voters_are_untouched() {
        let mut l = VoteLedger::new();
        l.toggle_downvote(v("a"));
        l.toggle_upvote(v("b"));
        l.toggle_downvote(v("b"));
        assert_eq!(ids(l.downvoted_by()), vec!["a", "b"]);
        assert!(l.upvoted_by().is_empty());
        assert_eq!(l.score(), -2);
    }

    #[test]
    fn stored_conflicts_are_dropped() {
        let (l, conflicting) = VoteLedger::from_stored(
            vec![v("a"), v("b"), v("b")],
            vec![v("b"), v("c")],
        );
        assert_eq!(conflicting, vec![v("b")]);
        assert_eq!(ids(l.upvoted_by()), vec!["a"]);
        assert_eq!(ids(l.downvoted_by()), vec!["c"]);
    }

    #[test]
    fn numbers_and_text_are_distinct_voters() {
        let (l, conflicting) =
            VoteLedger::from_stored(vec![VoterId::from(42)], vec![VoterId::new("42")]);
        assert!(conflicting.is_empty());
        assert_eq!(l.state_of(&VoterId::from(42)), VoteState::Up);
        assert_eq!(l.state_of(&VoterId::new("42")), VoteState::Down);
    }

    #[test]
    fn serialized_counts_follow_sets() {
        let stored = r#"{"upvotedBy":["a","b"],"downvotedBy":[],"upvotes":7,"downvotes":3}"#;
        let l: VoteLedger = serde_json::from_str(stored).unwrap();
        assert_eq!((l.upvotes(), l.downvotes()), (2, 0));
        assert_eq!(
            serde_json::to_value(&l).unwrap(),
            serde_json::json!({
                "upvotedBy": ["a", "b"],
                "downvotedBy": [],
                "upvotes": 2,
                "downvotes": 0,
            })
        );
    }
}
