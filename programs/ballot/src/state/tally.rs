use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{ChoiceId, ChoiceSet};

/// Count and share of the total for one choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChoiceTally {
    pub count: u64,
    pub percentage: f64,
}

/// Per-choice results. Derived from the ledger, never stored.
///
/// Every registered choice has an entry, including those nobody picked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tally {
    entries: BTreeMap<ChoiceId, ChoiceTally>,
}

impl Tally {
    /// Build a tally from raw counts. Counts for unregistered choices are ignored.
    pub fn from_counts(choices: &ChoiceSet, counts: &HashMap<ChoiceId, u64>) -> Self {
        let total: u64 = choices
            .ids()
            .map(|id| counts.get(id).copied().unwrap_or(0))
            .sum();

        let entries = choices
            .ids()
            .map(|id| {
                let count = counts.get(id).copied().unwrap_or(0);
                (
                    id.clone(),
                    ChoiceTally {
                        count,
                        percentage: percentage(count, total),
                    },
                )
            })
            .collect();

        Self { entries }
    }

    pub fn get(&self, id: &ChoiceId) -> Option<&ChoiceTally> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChoiceId, &ChoiceTally)> {
        self.entries.iter()
    }

    pub fn total_votes(&self) -> u64 {
        self.entries.values().map(|entry| entry.count).sum()
    }

    pub fn percentage_sum(&self) -> f64 {
        self.entries.values().map(|entry| entry.percentage).sum()
    }

    /// The choice with strictly the most votes. `None` when nobody voted or the lead is tied.
    pub fn leader(&self) -> Option<(&ChoiceId, &ChoiceTally)> {
        let mut best: Option<(&ChoiceId, &ChoiceTally)> = None;
        let mut tied = false;
        for (id, entry) in &self.entries {
            match best {
                Some((_, top)) if entry.count == top.count => tied = true,
                Some((_, top)) if entry.count < top.count => {}
                _ => {
                    best = Some((id, entry));
                    tied = false;
                }
            }
        }

        match best {
            Some((_, top)) if top.count == 0 || tied => None,
            other => other,
        }
    }
}

/// Share of `total` in percent, rounded to one decimal. Zero when `total` is zero.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((count as f64) * 1000.0 / (total as f64)).round() / 10.0
}
