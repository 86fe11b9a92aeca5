use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use super::{sort_votes, VoteLedger};
use crate::error::LedgerError;
use crate::state::{ChoiceId, Vote, VoteRecordId, VoterId};

#[derive(Default)]
struct Inner {
    votes: Vec<Vote>,
    by_voter: HashMap<VoterId, usize>,
}

/// Process-local ledger. Record ids start at 1 and follow append order.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: Mutex<Inner>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .votes
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VoteLedger for InMemoryLedger {
    async fn append(
        &self,
        voter: &VoterId,
        choice: &ChoiceId,
        timestamp: DateTime<Utc>,
    ) -> Result<VoteRecordId, LedgerError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.by_voter.contains_key(voter) {
            return Err(LedgerError::DuplicateVoter(voter.clone()));
        }

        let id = VoteRecordId(inner.votes.len() as u64 + 1);
        let position = inner.votes.len();
        inner.votes.push(Vote {
            id,
            voter_id: voter.clone(),
            choice_id: choice.clone(),
            timestamp,
        });
        inner.by_voter.insert(voter.clone(), position);
        Ok(id)
    }

    async fn all_votes(&self) -> Result<Vec<Vote>, LedgerError> {
        let mut votes = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .votes
            .clone();
        sort_votes(&mut votes);
        Ok(votes)
    }

    async fn vote_for(&self, voter: &VoterId) -> Result<Option<Vote>, LedgerError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .by_voter
            .get(voter)
            .map(|&position| inner.votes[position].clone()))
    }
}
