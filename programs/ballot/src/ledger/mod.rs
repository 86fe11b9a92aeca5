//! Append-only record of cast votes.

mod memory;

pub use memory::InMemoryLedger;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::LedgerError;
use crate::state::{ChoiceId, Vote, VoteRecordId, VoterId};

/// Storage contract for the vote ledger.
///
/// `append` is the only mutation: there is no update and no delete. A ledger
/// holds at most one vote per voter and answers `DuplicateVoter` otherwise.
pub trait VoteLedger: Send + Sync {
    fn append(
        &self,
        voter: &VoterId,
        choice: &ChoiceId,
        timestamp: DateTime<Utc>,
    ) -> impl Future<Output = Result<VoteRecordId, LedgerError>> + Send;

    /// Every vote, ordered by timestamp then record id. Each call reads afresh.
    fn all_votes(&self) -> impl Future<Output = Result<Vec<Vote>, LedgerError>> + Send;

    fn vote_for(
        &self,
        voter: &VoterId,
    ) -> impl Future<Output = Result<Option<Vote>, LedgerError>> + Send;
}

/// Canonical ledger order.
pub fn sort_votes(votes: &mut [Vote]) {
    votes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
}
