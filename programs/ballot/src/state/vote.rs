use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChoiceId, VoterId};

/// Position of a vote in the ledger. Assigned by the ledger on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteRecordId(pub u64);

impl fmt::Display for VoteRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cast vote as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: VoteRecordId,
    pub voter_id: VoterId,
    pub choice_id: ChoiceId,
    pub timestamp: DateTime<Utc>,
}

/// Confirmation handed back to a voter after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub vote_id: VoteRecordId,
    pub choice_id: ChoiceId,
    pub timestamp: DateTime<Utc>,
}

impl From<&Vote> for VoteReceipt {
    fn from(vote: &Vote) -> Self {
        Self {
            vote_id: vote.id,
            choice_id: vote.choice_id.clone(),
            timestamp: vote.timestamp,
        }
    }
}
