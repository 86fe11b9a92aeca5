//! Core of the ballot ledger: who may vote, what was voted, and how it adds up.
//!
//! * [`BallotRegistry`] tracks eligibility and guards the one-vote-per-voter rule.
//! * [`VoteLedger`] is the append-only source of truth for cast votes.
//! * [`TallyAggregator`] keeps per-choice counts derived from the ledger.
//! * [`VoteSubmissionService`] ties the three together behind `submit_vote`.

pub mod aggregator;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod state;
pub mod submission;

pub use aggregator::*;
pub use error::*;
pub use ledger::*;
pub use registry::*;
pub use state::*;
pub use submission::*;
