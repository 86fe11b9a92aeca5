use std::sync::Arc;

use ballot::{ChoiceId, InMemoryLedger, VoteSubmissionService, VoterId};
use cli::ElectionRoll;

pub struct TestElection {
    pub roll: ElectionRoll,
    pub service: Arc<VoteSubmissionService<InMemoryLedger>>,
}

impl TestElection {
    pub fn demo(voters: usize) -> Self {
        let roll = ElectionRoll::demo(voters);
        let service = roll.build_service(InMemoryLedger::new()).unwrap();
        Self {
            roll,
            service: Arc::new(service),
        }
    }

    pub fn choice_ids(&self) -> Vec<ChoiceId> {
        self.roll.choices.iter().map(|c| c.id.clone()).collect()
    }

    pub fn voter_ids(&self) -> Vec<VoterId> {
        self.roll.voters.iter().map(|v| v.id.clone()).collect()
    }
}
