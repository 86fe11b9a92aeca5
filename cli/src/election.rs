use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ballot::{
    BallotRegistry, Choice, ChoiceSet, SetupError, VoteLedger, VoteSubmissionService, Voter,
    VotingWindow,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{
    compress_gzip, decompress_gzip_with_limit, is_gzip_path, max_roll_bytes, read_all_with_limit,
};

/// Election definition: the registered choices and the voter roll.
///
/// Stored as JSON, optionally gzip-compressed (`.gz` suffix).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionRoll {
    pub name: String,
    #[serde(default)]
    pub opens_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closes_at: Option<DateTime<Utc>>,
    pub choices: Vec<Choice>,
    pub voters: Vec<Voter>,
}

impl ElectionRoll {
    pub fn read(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open election roll {}", path.display()))?;
        let limit = max_roll_bytes();
        let bytes = if is_gzip_path(path) {
            decompress_gzip_with_limit(file, limit)?
        } else {
            read_all_with_limit(file, limit)?
        };
        Self::read_from_bytes(&bytes)
            .with_context(|| format!("Invalid election roll {}", path.display()))
    }

    pub fn read_from_bytes(bytes: &[u8]) -> Result<Self> {
        let roll: Self = serde_json::from_slice(bytes)?;
        roll.validate()?;
        Ok(roll)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let bytes = if is_gzip_path(path) {
            compress_gzip(&json)?
        } else {
            json
        };
        fs::write(path, bytes)
            .with_context(|| format!("Failed to write election roll {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Election name must not be empty");
        }
        self.choice_set()?;
        self.voting_window()?;

        let mut seen = HashSet::with_capacity(self.voters.len());
        for voter in &self.voters {
            if voter.id.is_empty() {
                bail!(SetupError::EmptyId);
            }
            if !seen.insert(&voter.id) {
                bail!(SetupError::DuplicateVoter(voter.id.clone()));
            }
        }
        Ok(())
    }

    pub fn choice_set(&self) -> Result<ChoiceSet, SetupError> {
        ChoiceSet::new(self.choices.clone())
    }

    pub fn registry(&self) -> Result<BallotRegistry, SetupError> {
        BallotRegistry::new(self.voters.iter().cloned())
    }

    pub fn voting_window(&self) -> Result<VotingWindow, SetupError> {
        VotingWindow::new(self.opens_at, self.closes_at)
    }

    pub fn eligible_voters(&self) -> usize {
        self.voters.iter().filter(|voter| voter.eligible).count()
    }

    /// Assemble a submission service for this election on top of `ledger`.
    pub fn build_service<L: VoteLedger>(
        &self,
        ledger: L,
    ) -> Result<VoteSubmissionService<L>, SetupError> {
        Ok(
            VoteSubmissionService::new(self.choice_set()?, self.registry()?, ledger)
                .with_voting_window(self.voting_window()?),
        )
    }

    /// The five parties of the demo front-end and `voters` eligible voters
    /// named `voter-1` .. `voter-N`.
    pub fn demo(voters: usize) -> Self {
        let party = |id: &str, name: &str, color: &str, description: &str| Choice {
            id: id.into(),
            name: name.to_string(),
            description: description.to_string(),
            color: Some(color.to_string()),
            logo: None,
        };

        Self {
            name: "General Election".to_string(),
            opens_at: None,
            closes_at: None,
            choices: vec![
                party(
                    "democratic",
                    "Democratic Party",
                    "blue",
                    "Social justice, climate action and economic equality.",
                ),
                party(
                    "republican",
                    "Republican Party",
                    "red",
                    "Limited government, free markets and fiscal responsibility.",
                ),
                party(
                    "green",
                    "Green Party",
                    "green",
                    "Environmental sustainability and renewable energy.",
                ),
                party(
                    "libertarian",
                    "Libertarian Party",
                    "yellow",
                    "Individual liberty and minimal government intervention.",
                ),
                party(
                    "independent",
                    "Independent",
                    "purple",
                    "Non-partisan, evidence-based policy making.",
                ),
            ],
            voters: (1..=voters)
                .map(|i| Voter::eligible(format!("voter-{i}")))
                .collect(),
        }
    }
}
