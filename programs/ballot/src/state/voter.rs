use serde::{Deserialize, Serialize};

use super::string_id;

string_id!(
    /// Identifier of a voter on the roll.
    VoterId
);

/// Entry of the voter roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub id: VoterId,
    #[serde(default = "default_eligible")]
    pub eligible: bool,
}

fn default_eligible() -> bool {
    true
}

impl Voter {
    pub fn eligible(id: impl Into<VoterId>) -> Self {
        Self {
            id: id.into(),
            eligible: true,
        }
    }

    pub fn ineligible(id: impl Into<VoterId>) -> Self {
        Self {
            id: id.into(),
            eligible: false,
        }
    }
}

/// Answer to an eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub eligible: bool,
    pub has_voted: bool,
}

/// Per-voter lifecycle. `Voted` is terminal.
///
/// `Reserved` is held only while a submission is between the registry check and
/// the ledger append; it is never observable as "has voted".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VoterStatus {
    NotVoted = 0,
    Reserved = 1,
    Voted = 2,
}

impl VoterStatus {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => VoterStatus::NotVoted,
            1 => VoterStatus::Reserved,
            _ => VoterStatus::Voted,
        }
    }
}

/// How many eligible voters have cast a vote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turnout {
    pub eligible_voters: u64,
    pub voted: u64,
    pub percentage: f64,
}
