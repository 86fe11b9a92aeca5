//! Vote submission: the only path by which a vote enters the ledger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, warn};

use crate::aggregator::{compute_tally, TallyAggregator, TallyAudit};
use crate::error::{BallotError, LedgerError, SetupError};
use crate::ledger::VoteLedger;
use crate::registry::BallotRegistry;
use crate::state::{
    ChoiceId, ChoiceSet, Eligibility, Tally, Turnout, Vote, VoteReceipt, VoteRecordId, VoterId,
    VotingWindow,
};

/// Bounded retry applied to the ledger append only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(25),
        }
    }
}

/// Who is submitting, and when the request arrived.
///
/// Built per request by the caller; the service keeps no session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionContext {
    pub voter: VoterId,
    pub received_at: DateTime<Utc>,
}

impl SubmissionContext {
    pub fn new(voter: impl Into<VoterId>) -> Self {
        Self::at(voter, Utc::now())
    }

    /// Timestamps are kept to microsecond precision, the finest any ledger stores.
    pub fn at(voter: impl Into<VoterId>, received_at: DateTime<Utc>) -> Self {
        Self {
            voter: voter.into(),
            received_at: received_at.trunc_subsecs(6),
        }
    }
}

struct AppendFailure {
    error: LedgerError,
    attempts: u32,
}

pub struct VoteSubmissionService<L> {
    choices: Arc<ChoiceSet>,
    window: VotingWindow,
    registry: BallotRegistry,
    ledger: L,
    aggregator: TallyAggregator,
    retry: RetryPolicy,
    append_retries: AtomicU64,
}

impl<L: VoteLedger> VoteSubmissionService<L> {
    pub fn new(choices: ChoiceSet, registry: BallotRegistry, ledger: L) -> Self {
        let choices = Arc::new(choices);
        Self {
            aggregator: TallyAggregator::new(choices.clone()),
            choices,
            window: VotingWindow::unbounded(),
            registry,
            ledger,
            retry: RetryPolicy::default(),
            append_retries: AtomicU64::new(0),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_voting_window(mut self, window: VotingWindow) -> Self {
        self.window = window;
        self
    }

    /// Replay the ledger into the registry and the aggregator.
    ///
    /// Run once before serving. Fails if the ledger names a voter or a choice
    /// this election does not know. Returns the number of replayed votes.
    pub async fn restore(&self) -> Result<usize, SetupError> {
        let votes = self.ledger.all_votes().await?;
        for vote in &votes {
            if !self.choices.contains(&vote.choice_id) {
                return Err(SetupError::UnknownChoice(vote.choice_id.clone()));
            }
            self.registry.restore_voted(&vote.voter_id)?;
        }
        self.aggregator.catch_up(&votes);
        info!("Restored {} votes from the ledger", votes.len());
        Ok(votes.len())
    }

    /// Cast `choice` for the voter in `ctx`.
    ///
    /// The registry reservation and the ledger append succeed or fail together
    /// when the call runs to completion: if the append cannot be completed the
    /// reservation is released. Dropping this future mid-append also releases
    /// it, even if the ledger write has already landed; callers that may be
    /// cancelled go through [`submit_vote_detached`](Self::submit_vote_detached).
    pub async fn submit_vote(
        &self,
        ctx: &SubmissionContext,
        choice: &ChoiceId,
    ) -> Result<VoteReceipt, BallotError> {
        let voter = &ctx.voter;

        if !self.choices.contains(choice) {
            return Err(BallotError::InvalidChoice(choice.clone()));
        }
        if !self.window.is_open(ctx.received_at) {
            return Err(BallotError::VotingClosed);
        }

        let eligibility = self.registry.check_eligibility(voter);
        if !eligibility.eligible {
            return Err(BallotError::Ineligible(voter.clone()));
        }
        if eligibility.has_voted {
            return Err(BallotError::AlreadyVoted(voter.clone()));
        }

        let reservation = self.registry.mark_voted(voter)?;

        match self.append_with_retry(voter, choice, ctx.received_at).await {
            Ok(id) => {
                reservation.commit();
                let vote = Vote {
                    id,
                    voter_id: voter.clone(),
                    choice_id: choice.clone(),
                    timestamp: ctx.received_at,
                };
                self.aggregator.record(&vote);
                info!("Vote {} recorded for choice {}", id, choice);
                Ok(VoteReceipt::from(&vote))
            }
            Err(AppendFailure {
                error: LedgerError::DuplicateVoter(_),
                attempts,
            }) => {
                // The ledger is authoritative: the voter has a vote, so the
                // registry must say so whatever happens next.
                reservation.commit();
                self.resolve_duplicate(ctx, choice, attempts).await
            }
            Err(AppendFailure {
                error: LedgerError::Storage(msg),
                attempts,
            }) => {
                drop(reservation);
                warn!(
                    "Ledger append for voter {} failed after {} attempts, reservation released: {}",
                    voter, attempts, msg
                );
                Err(BallotError::StorageFailure(msg))
            }
        }
    }

    async fn append_with_retry(
        &self,
        voter: &VoterId,
        choice: &ChoiceId,
        timestamp: DateTime<Utc>,
    ) -> Result<VoteRecordId, AppendFailure> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 1;
        loop {
            match self.ledger.append(voter, choice, timestamp).await {
                Ok(id) => return Ok(id),
                Err(LedgerError::Storage(msg)) if attempts < max_attempts => {
                    warn!(
                        "Ledger append attempt {}/{} for voter {} failed: {}",
                        attempts, max_attempts, voter, msg
                    );
                    self.append_retries.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(self.retry.backoff).await;
                    attempts += 1;
                }
                Err(error) => return Err(AppendFailure { error, attempts }),
            }
        }
    }

    /// The ledger already holds a vote for this voter.
    ///
    /// Either an earlier attempt of this very call landed despite reporting an
    /// error, or the registry was behind the ledger. In both cases the
    /// aggregator is brought up to date from the ledger.
    async fn resolve_duplicate(
        &self,
        ctx: &SubmissionContext,
        choice: &ChoiceId,
        attempts: u32,
    ) -> Result<VoteReceipt, BallotError> {
        let existing = self.ledger.vote_for(&ctx.voter).await?;
        if let Err(e) = self.catch_up().await {
            warn!("Could not resync tally after duplicate vote: {}", e);
        }

        match existing {
            Some(vote)
                if attempts > 1
                    && &vote.choice_id == choice
                    && vote.timestamp == ctx.received_at =>
            {
                debug!(
                    "Vote {} for voter {} landed on an earlier attempt",
                    vote.id, ctx.voter
                );
                Ok(VoteReceipt::from(&vote))
            }
            _ => {
                warn!("Registry was behind the ledger for voter {}", ctx.voter);
                Err(BallotError::AlreadyVoted(ctx.voter.clone()))
            }
        }
    }

    /// Count any ledger vote the aggregator has not seen. Returns how many were new.
    pub async fn catch_up(&self) -> Result<usize, BallotError> {
        let votes = self.ledger.all_votes().await?;
        Ok(self.aggregator.catch_up(&votes))
    }

    pub fn check_eligibility(&self, voter: &VoterId) -> Eligibility {
        self.registry.check_eligibility(voter)
    }

    pub fn is_registered(&self, voter: &VoterId) -> bool {
        self.registry.is_registered(voter)
    }

    /// Incrementally maintained tally.
    pub fn tally(&self) -> Tally {
        self.aggregator.snapshot()
    }

    /// Tally recomputed from the full ledger.
    pub async fn compute_tally(&self) -> Result<Tally, BallotError> {
        let votes = self.ledger.all_votes().await?;
        Ok(compute_tally(&self.choices, &votes))
    }

    pub async fn audit(&self) -> Result<TallyAudit, BallotError> {
        let votes = self.ledger.all_votes().await?;
        let recomputed = compute_tally(&self.choices, &votes);
        Ok(TallyAudit::new(
            votes.len() as u64,
            self.aggregator.snapshot(),
            recomputed,
        ))
    }

    pub async fn all_votes(&self) -> Result<Vec<Vote>, BallotError> {
        Ok(self.ledger.all_votes().await?)
    }

    pub async fn receipt_for(&self, voter: &VoterId) -> Result<Option<VoteReceipt>, BallotError> {
        let vote = self.ledger.vote_for(voter).await?;
        Ok(vote.as_ref().map(VoteReceipt::from))
    }

    pub fn turnout(&self) -> Turnout {
        self.registry.turnout()
    }

    pub fn choices(&self) -> &ChoiceSet {
        &self.choices
    }

    pub fn window(&self) -> &VotingWindow {
        &self.window
    }

    pub fn registry(&self) -> &BallotRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Append attempts that failed and were retried since startup.
    pub fn append_retries(&self) -> u64 {
        self.append_retries.load(Ordering::Relaxed)
    }
}

impl<L: VoteLedger + 'static> VoteSubmissionService<L> {
    /// [`submit_vote`](Self::submit_vote) on its own task.
    ///
    /// Dropping the returned future does not stop the submission: once a vote
    /// reaches the ledger it is also committed in the registry and counted.
    pub async fn submit_vote_detached(
        self: &Arc<Self>,
        ctx: SubmissionContext,
        choice: ChoiceId,
    ) -> Result<VoteReceipt, BallotError> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.submit_vote(&ctx, &choice).await })
            .await
            .map_err(|e| BallotError::StorageFailure(format!("Submission task failed: {}", e)))?
    }
}
