use thiserror::Error;

use crate::state::{ChoiceId, VoterId};

/// Reasons a vote submission is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BallotError {
    #[error("Voter {0} is not eligible to vote")]
    Ineligible(VoterId),
    #[error("Voter {0} has already voted")]
    AlreadyVoted(VoterId),
    #[error("Choice {0} is not registered")]
    InvalidChoice(ChoiceId),
    #[error("Voting is closed")]
    VotingClosed,
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl BallotError {
    /// Stable error code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            BallotError::Ineligible(_) => "Ineligible",
            BallotError::AlreadyVoted(_) => "AlreadyVoted",
            BallotError::InvalidChoice(_) => "InvalidChoice",
            BallotError::VotingClosed => "VotingClosed",
            BallotError::StorageFailure(_) => "StorageFailure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Ledger already holds a vote for voter {0}")]
    DuplicateVoter(VoterId),
    #[error("Ledger storage error: {0}")]
    Storage(String),
}

impl From<LedgerError> for BallotError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateVoter(voter) => BallotError::AlreadyVoted(voter),
            LedgerError::Storage(msg) => BallotError::StorageFailure(msg),
        }
    }
}

/// Errors raised while assembling an election or replaying its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Election must register at least one choice")]
    NoChoices,
    #[error("Choice {0} is registered more than once")]
    DuplicateChoice(ChoiceId),
    #[error("Voter {0} is registered more than once")]
    DuplicateVoter(VoterId),
    #[error("Empty identifier")]
    EmptyId,
    #[error("Voting window closes before it opens")]
    InvalidWindow,
    #[error("Ledger references voter {0} who is not on the roll")]
    UnknownVoter(VoterId),
    #[error("Ledger references choice {0} which is not registered")]
    UnknownChoice(ChoiceId),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
