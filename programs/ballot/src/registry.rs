//! Voter roll with a per-voter atomic vote flag.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::debug;

use crate::error::{BallotError, SetupError};
use crate::state::{percentage, Eligibility, Turnout, Voter, VoterId, VoterStatus};

struct VoterSlot {
    eligible: bool,
    status: AtomicU8,
}

impl VoterSlot {
    fn status(&self) -> VoterStatus {
        VoterStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn try_reserve(&self) -> bool {
        self.status
            .compare_exchange(
                VoterStatus::NotVoted as u8,
                VoterStatus::Reserved as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn commit(&self) {
        let _ = self.status.compare_exchange(
            VoterStatus::Reserved as u8,
            VoterStatus::Voted as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn release(&self) {
        let _ = self.status.compare_exchange(
            VoterStatus::Reserved as u8,
            VoterStatus::NotVoted as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Tracks who may vote and who already has.
///
/// The set of voters is fixed at construction; only the per-voter status
/// changes afterwards, through compare-and-swap.
pub struct BallotRegistry {
    voters: HashMap<VoterId, VoterSlot>,
}

impl BallotRegistry {
    pub fn new(voters: impl IntoIterator<Item = Voter>) -> Result<Self, SetupError> {
        let mut slots = HashMap::new();
        for voter in voters {
            if voter.id.is_empty() {
                return Err(SetupError::EmptyId);
            }
            if slots.contains_key(&voter.id) {
                return Err(SetupError::DuplicateVoter(voter.id));
            }
            slots.insert(
                voter.id,
                VoterSlot {
                    eligible: voter.eligible,
                    status: AtomicU8::new(VoterStatus::NotVoted as u8),
                },
            );
        }
        Ok(Self { voters: slots })
    }

    pub fn is_registered(&self, voter: &VoterId) -> bool {
        self.voters.contains_key(voter)
    }

    /// Voters that are not on the roll are reported as ineligible.
    pub fn check_eligibility(&self, voter: &VoterId) -> Eligibility {
        match self.voters.get(voter) {
            Some(slot) => Eligibility {
                eligible: slot.eligible,
                has_voted: slot.status() == VoterStatus::Voted,
            },
            None => Eligibility {
                eligible: false,
                has_voted: false,
            },
        }
    }

    pub fn status(&self, voter: &VoterId) -> Option<VoterStatus> {
        self.voters.get(voter).map(VoterSlot::status)
    }

    /// Reserve the voter's single vote.
    ///
    /// Exactly one caller per voter gets a [`Reservation`]; all others get
    /// `AlreadyVoted`, including while the winning reservation is still pending.
    pub fn mark_voted(&self, voter: &VoterId) -> Result<Reservation<'_>, BallotError> {
        let (voter, slot) = self
            .voters
            .get_key_value(voter)
            .filter(|(_, slot)| slot.eligible)
            .ok_or_else(|| BallotError::Ineligible(voter.clone()))?;

        if !slot.try_reserve() {
            return Err(BallotError::AlreadyVoted(voter.clone()));
        }

        debug!("Reserved vote for voter {}", voter);
        Ok(Reservation {
            voter,
            slot,
            committed: false,
        })
    }

    /// Mark a voter as voted while replaying the ledger at startup.
    pub fn restore_voted(&self, voter: &VoterId) -> Result<(), SetupError> {
        let slot = self
            .voters
            .get(voter)
            .ok_or_else(|| SetupError::UnknownVoter(voter.clone()))?;
        slot.status.store(VoterStatus::Voted as u8, Ordering::Release);
        Ok(())
    }

    pub fn turnout(&self) -> Turnout {
        let eligible = self.voters.values().filter(|slot| slot.eligible);
        let (eligible_voters, voted) = eligible.fold((0u64, 0u64), |(total, voted), slot| {
            let has_voted = slot.status() == VoterStatus::Voted;
            (total + 1, voted + u64::from(has_voted))
        });

        Turnout {
            eligible_voters,
            voted,
            percentage: percentage(voted, eligible_voters),
        }
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }
}

/// A pending vote. Commit it once the ledger holds the vote; dropping it
/// uncommitted hands the voter's vote back.
#[must_use = "an uncommitted reservation is released on drop"]
pub struct Reservation<'a> {
    voter: &'a VoterId,
    slot: &'a VoterSlot,
    committed: bool,
}

impl Reservation<'_> {
    pub fn voter(&self) -> &VoterId {
        self.voter
    }

    /// Finalize the vote. The voter stays `Voted` for good.
    pub fn commit(mut self) {
        self.slot.commit();
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.slot.release();
            debug!("Released vote reservation for voter {}", self.voter);
        }
    }
}
