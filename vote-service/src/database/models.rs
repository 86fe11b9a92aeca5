use ballot::{LedgerError, Vote, VoteRecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row of the `votes` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: i64,
    pub voter_id: String,
    pub choice_id: String,
    pub cast_at_micros: i64, // unix microseconds, UTC
}

impl VoteRecord {
    pub fn new(voter_id: &str, choice_id: &str, cast_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            voter_id: voter_id.to_string(),
            choice_id: choice_id.to_string(),
            cast_at_micros: cast_at.timestamp_micros(),
        }
    }
}

impl TryFrom<VoteRecord> for Vote {
    type Error = LedgerError;

    fn try_from(record: VoteRecord) -> Result<Self, Self::Error> {
        let id = u64::try_from(record.id)
            .map_err(|_| LedgerError::Storage(format!("invalid vote id {}", record.id)))?;
        let timestamp = DateTime::from_timestamp_micros(record.cast_at_micros).ok_or_else(|| {
            LedgerError::Storage(format!(
                "vote {} has an out-of-range timestamp {}",
                record.id, record.cast_at_micros
            ))
        })?;

        Ok(Vote {
            id: VoteRecordId(id),
            voter_id: record.voter_id.into(),
            choice_id: record.choice_id.into(),
            timestamp,
        })
    }
}

/// Migration record for tracking schema versions
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i32,
    pub applied_at: String,
    pub description: String,
}
