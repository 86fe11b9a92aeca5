//! Tally computation, from scratch or incrementally.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::state::{ChoiceId, ChoiceSet, Tally, Vote, VoteRecordId};

/// Tally of a full ledger read.
pub fn compute_tally(choices: &ChoiceSet, votes: &[Vote]) -> Tally {
    let mut counts: HashMap<ChoiceId, u64> = HashMap::new();
    for vote in votes {
        *counts.entry(vote.choice_id.clone()).or_insert(0) += 1;
    }
    Tally::from_counts(choices, &counts)
}

#[derive(Default)]
struct Counts {
    counted: HashSet<VoteRecordId>,
    per_choice: HashMap<ChoiceId, u64>,
}

/// Incrementally maintained tally.
///
/// Votes are counted by record id, so recording the same vote twice is a
/// no-op. That makes [`TallyAggregator::catch_up`] safe to run concurrently
/// with submissions.
pub struct TallyAggregator {
    choices: Arc<ChoiceSet>,
    counts: Mutex<Counts>,
}

impl TallyAggregator {
    pub fn new(choices: Arc<ChoiceSet>) -> Self {
        Self {
            choices,
            counts: Mutex::new(Counts::default()),
        }
    }

    /// Count a vote. Returns false if it was already counted.
    pub fn record(&self, vote: &Vote) -> bool {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        if !counts.counted.insert(vote.id) {
            return false;
        }
        *counts
            .per_choice
            .entry(vote.choice_id.clone())
            .or_insert(0) += 1;
        true
    }

    /// Count every vote of `votes` not counted yet. Returns how many were new.
    pub fn catch_up(&self, votes: &[Vote]) -> usize {
        votes.iter().filter(|vote| self.record(vote)).count()
    }

    pub fn snapshot(&self) -> Tally {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        Tally::from_counts(&self.choices, &counts.per_choice)
    }

    pub fn counted(&self) -> usize {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .counted
            .len()
    }
}

/// Result of checking the incremental tally against a full recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyAudit {
    pub ledger_votes: u64,
    pub incremental: Tally,
    pub recomputed: Tally,
    pub consistent: bool,
}

impl TallyAudit {
    pub fn new(ledger_votes: u64, incremental: Tally, recomputed: Tally) -> Self {
        let consistent = incremental == recomputed && recomputed.total_votes() == ledger_votes;
        Self {
            ledger_votes,
            incremental,
            recomputed,
            consistent,
        }
    }
}
