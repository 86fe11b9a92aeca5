use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::string_id;
use crate::error::SetupError;

string_id!(
    /// Identifier of a selectable option, e.g. a party.
    ChoiceId
);

/// A selectable option and the metadata the front-end displays for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Choice {
    pub fn new(id: impl Into<ChoiceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            color: None,
            logo: None,
        }
    }
}

/// The registered choices of an election, in registration order.
///
/// There is no way to add or remove a choice once the set is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    choices: Vec<Choice>,
}

impl ChoiceSet {
    pub fn new(choices: Vec<Choice>) -> Result<Self, SetupError> {
        if choices.is_empty() {
            return Err(SetupError::NoChoices);
        }

        let mut seen = HashSet::with_capacity(choices.len());
        for choice in &choices {
            if choice.id.is_empty() {
                return Err(SetupError::EmptyId);
            }
            if !seen.insert(&choice.id) {
                return Err(SetupError::DuplicateChoice(choice.id.clone()));
            }
        }

        Ok(Self { choices })
    }

    pub fn contains(&self, id: &ChoiceId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|choice| &choice.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ChoiceId> {
        self.choices.iter().map(|choice| &choice.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter()
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}
