//! A room's state and its voting rules.
//!
//! A room has a single state, "voting open at `node_id` until
//! `expires_at`". Closing a round loops back into the same state with a
//! new node, empty votes, and a new deadline:
//!
//! ```text
//!            cast_vote after expires_at
//!          ┌──────────────────────────┐
//!          ▼                          │
//!   OpenVoting(node_id, expires_at) ──┘
//! ```
//!
//! There is no terminal state. Whether the story has reached an ending is
//! up to the content pack.

use std::collections::HashMap;
use std::time::Duration;

use grouptale_protocol::{
    ChoiceId, NodeId, PackId, ParticipantId, RoomId, RoomSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::TieBreak;

/// One participant's vote in the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub participant: ParticipantId,
    pub choice: ChoiceId,
}

/// What happened when a round was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// The winning choice, or `None` if nobody voted.
    pub winner: Option<ChoiceId>,
    /// Number of votes tallied.
    pub votes_counted: usize,
}

/// A voting room.
///
/// Fields are private: every change goes through the methods below so
/// the round invariants hold. `Serialize`/`Deserialize` let a durable
/// [`RoomStore`](crate::RoomStore) persist rooms as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    pack_id: PackId,
    node_id: NodeId,
    /// One entry per participant, in order of their first vote this round.
    votes: Vec<Vote>,
    /// Join order, no duplicates.
    members: Vec<ParticipantId>,
    expires_at: u64,
}

impl Room {
    /// Creates a room at `root` with its first round ending at
    /// `now_ms + round`.
    pub fn new(
        id: RoomId,
        pack_id: PackId,
        root: NodeId,
        now_ms: u64,
        round: Duration,
    ) -> Self {
        Self {
            id,
            pack_id,
            node_id: root,
            votes: Vec::new(),
            members: Vec::new(),
            expires_at: deadline(now_ms, round),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn pack_id(&self) -> &PackId {
        &self.pack_id
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    /// End of the current round, in epoch milliseconds.
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Returns the choice `participant` voted for this round, if any.
    pub fn vote_of(&self, participant: &ParticipantId) -> Option<&ChoiceId> {
        self.votes
            .iter()
            .find(|v| &v.participant == participant)
            .map(|v| &v.choice)
    }

    /// Returns `true` once `now_ms` is strictly past the round deadline.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Adds a member. Returns `false` if they were already one.
    pub fn add_member(&mut self, participant: ParticipantId) -> bool {
        if self.members.contains(&participant) {
            return false;
        }
        self.members.push(participant);
        true
    }

    /// Records a vote in the current round.
    ///
    /// A participant who already voted has their choice replaced in
    /// place, so they keep their original position for tie-breaking.
    pub fn record_vote(&mut self, participant: ParticipantId, choice: ChoiceId) {
        match self.votes.iter_mut().find(|v| v.participant == participant) {
            Some(existing) => existing.choice = choice,
            None => self.votes.push(Vote {
                participant,
                choice,
            }),
        }
    }

    /// Counts the current round's votes and returns the winning choice.
    ///
    /// The winner has the strictly highest count. Ties are resolved by
    /// `tie_break`. Returns `None` when there are no votes.
    pub fn tally(&self, tie_break: TieBreak) -> Option<ChoiceId> {
        // Choices in order of their first vote, with counts.
        let mut order: Vec<&ChoiceId> = Vec::new();
        let mut counts: HashMap<&ChoiceId, usize> = HashMap::new();
        for vote in &self.votes {
            let count = counts.entry(&vote.choice).or_insert(0);
            if *count == 0 {
                order.push(&vote.choice);
            }
            *count += 1;
        }

        let mut best: Option<(&ChoiceId, usize)> = None;
        for choice in order {
            let count = counts[choice];
            let better = match best {
                None => true,
                Some((held, held_count)) => {
                    count > held_count
                        || (count == held_count
                            && tie_break == TieBreak::Lexicographic
                            && choice < held)
                }
            };
            if better {
                best = Some((choice, count));
            }
        }
        best.map(|(choice, _)| choice.clone())
    }

    /// Closes the current round and opens the next one.
    ///
    /// With at least one vote the winner becomes the new story node.
    /// The choice is taken verbatim; whether it is a real edge of the
    /// current node is the content pack's concern. Votes are cleared and
    /// the deadline moves to `now_ms + round` either way.
    pub fn close_round(
        &mut self,
        now_ms: u64,
        round: Duration,
        tie_break: TieBreak,
    ) -> RoundOutcome {
        let winner = self.tally(tie_break);
        let votes_counted = self.votes.len();
        if let Some(choice) = &winner {
            self.node_id = choice.clone().into();
        }
        self.votes.clear();
        self.expires_at = deadline(now_ms, round);
        RoundOutcome {
            winner,
            votes_counted,
        }
    }

    /// The wire representation of this room.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            pack_id: self.pack_id.clone(),
            node_id: self.node_id.clone(),
            votes: self
                .votes
                .iter()
                .map(|v| (v.participant.clone(), v.choice.clone()))
                .collect(),
            members: self.members.clone(),
            expires_at: self.expires_at,
        }
    }
}

fn deadline(now_ms: u64, round: Duration) -> u64 {
    now_ms.saturating_add(round.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUND: Duration = Duration::from_secs(60);

    fn room() -> Room {
        Room::new(
            RoomId::from("r1"),
            PackId::from("default"),
            NodeId::from("root"),
            1_000,
            ROUND,
        )
    }

    fn p(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    fn c(s: &str) -> ChoiceId {
        ChoiceId::from(s)
    }

    #[test]
    fn test_new_starts_at_root_with_empty_round() {
        let r = room();
        assert_eq!(r.node_id().as_str(), "root");
        assert!(r.votes().is_empty());
        assert!(r.members().is_empty());
        assert_eq!(r.expires_at(), 61_000);
    }

    #[test]
    fn test_add_member_is_idempotent() {
        let mut r = room();
        assert!(r.add_member(p("alice")));
        assert!(!r.add_member(p("alice")));
        assert_eq!(r.members(), &[p("alice")]);
    }

    #[test]
    fn test_record_vote_revote_replaces_choice() {
        let mut r = room();
        r.record_vote(p("alice"), c("left"));
        r.record_vote(p("alice"), c("right"));
        assert_eq!(r.votes().len(), 1);
        assert_eq!(r.vote_of(&p("alice")), Some(&c("right")));
    }

    #[test]
    fn test_is_expired_only_strictly_after_deadline() {
        let r = room();
        assert!(!r.is_expired(61_000));
        assert!(r.is_expired(61_001));
    }

    #[test]
    fn test_tally_majority_wins() {
        let mut r = room();
        r.record_vote(p("a"), c("x"));
        r.record_vote(p("c"), c("y"));
        r.record_vote(p("b"), c("x"));
        assert_eq!(r.tally(TieBreak::FirstVoted), Some(c("x")));
        assert_eq!(r.tally(TieBreak::Lexicographic), Some(c("x")));
    }

    #[test]
    fn test_tally_no_votes_is_none() {
        assert_eq!(room().tally(TieBreak::FirstVoted), None);
    }

    #[test]
    fn test_tally_tie_first_voted_picks_earliest_choice() {
        let mut r = room();
        r.record_vote(p("a"), c("zebra"));
        r.record_vote(p("b"), c("apple"));
        assert_eq!(r.tally(TieBreak::FirstVoted), Some(c("zebra")));
    }

    #[test]
    fn test_tally_tie_lexicographic_picks_smallest_choice() {
        let mut r = room();
        r.record_vote(p("a"), c("zebra"));
        r.record_vote(p("b"), c("apple"));
        assert_eq!(r.tally(TieBreak::Lexicographic), Some(c("apple")));
    }

    #[test]
    fn test_tally_revote_counts_only_latest_choice() {
        let mut r = room();
        r.record_vote(p("a"), c("x"));
        r.record_vote(p("b"), c("y"));
        r.record_vote(p("c"), c("y"));
        r.record_vote(p("c"), c("x"));
        assert_eq!(r.tally(TieBreak::FirstVoted), Some(c("x")));
    }

    #[test]
    fn test_close_round_advances_node_and_resets() {
        let mut r = room();
        r.record_vote(p("a"), c("cave"));
        let outcome = r.close_round(70_000, ROUND, TieBreak::FirstVoted);
        assert_eq!(outcome.winner, Some(c("cave")));
        assert_eq!(outcome.votes_counted, 1);
        assert_eq!(r.node_id().as_str(), "cave");
        assert!(r.votes().is_empty());
        assert_eq!(r.expires_at(), 130_000);
    }

    #[test]
    fn test_close_round_without_votes_keeps_node() {
        let mut r = room();
        let outcome = r.close_round(70_000, ROUND, TieBreak::FirstVoted);
        assert_eq!(outcome.winner, None);
        assert_eq!(r.node_id().as_str(), "root");
        assert_eq!(r.expires_at(), 130_000);
    }

    #[test]
    fn test_snapshot_maps_votes_by_participant() {
        let mut r = room();
        r.add_member(p("alice"));
        r.record_vote(p("bob"), c("left"));
        let snap = r.snapshot();
        assert_eq!(snap.id.as_str(), "r1");
        assert_eq!(snap.members, vec![p("alice")]);
        assert_eq!(snap.votes.get(&p("bob")), Some(&c("left")));
        assert_eq!(snap.expires_at, 61_000);
    }
}
