//! Catalog data model: questions, items and welcome texts.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::events::{Action, MAX_PAYLOAD_BYTES};

/// A single multiple-choice question. The position of an option in
/// `options` is the answer's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
}

impl Question {
    pub fn new(text: impl Into<String>, options: &[&str]) -> Self {
        Self {
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// The option text for `choice`, if it is in range.
    pub fn option(&self, choice: usize) -> Option<&str> {
        self.options.get(choice).map(String::as_str)
    }
}

/// A recommendable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique key; also what the purchase button carries.
    pub name: String,
    pub description: String,
    pub price: String,
    /// Question index → answer indices that count as a match.
    #[serde(default)]
    pub tags: BTreeMap<usize, BTreeSet<usize>>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price: String::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    /// Declare the answers to `question` that match this item.
    pub fn with_tag(mut self, question: usize, answers: &[usize]) -> Self {
        self.tags
            .entry(question)
            .or_default()
            .extend(answers.iter().copied());
        self
    }

    /// Whether `answer` to `question` is one of this item's matches.
    pub fn matches(&self, question: usize, answer: usize) -> bool {
        self.tags
            .get(&question)
            .is_some_and(|answers| answers.contains(&answer))
    }
}

/// A link button attached to a welcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeLink {
    pub label: String,
    pub url: String,
}

/// A greeting sent on `/start`, before the first question. Text is HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Welcome {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<WelcomeLink>,
}

/// The immutable question set and item catalog shared by every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub questions: Vec<Question>,
    pub items: Vec<Item>,
    #[serde(default)]
    pub welcome: Vec<Welcome>,
}

impl Catalog {
    /// Build a catalog from parts, validating cross references.
    pub fn new(questions: Vec<Question>, items: Vec<Item>) -> Result<Self, CatalogError> {
        let catalog = Self {
            questions,
            items,
            welcome: Vec::new(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn with_welcome(mut self, welcome: Vec<Welcome>) -> Self {
        self.welcome = welcome;
        self
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Look an item up by its unique name.
    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Check the invariants the quiz and scoring rely on.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.questions.is_empty() {
            return Err(CatalogError::Invalid("catalog has no questions".into()));
        }
        for (index, question) in self.questions.iter().enumerate() {
            if question.options.is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "question {index} has no options"
                )));
            }
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(CatalogError::Invalid("item with empty name".into()));
            }
            let payload = Action::Purchase(item.name.clone()).to_payload();
            if payload.len() > MAX_PAYLOAD_BYTES {
                return Err(CatalogError::Invalid(format!(
                    "item name {:?} is too long for a purchase button ({} of {MAX_PAYLOAD_BYTES} bytes)",
                    item.name,
                    payload.len()
                )));
            }
            if !seen.insert(item.name.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate item name {:?}",
                    item.name
                )));
            }
            for (&question, answers) in &item.tags {
                let Some(q) = self.questions.get(question) else {
                    return Err(CatalogError::Invalid(format!(
                        "item {:?} tags unknown question {question}",
                        item.name
                    )));
                };
                if let Some(&bad) = answers.iter().find(|&&a| a >= q.options.len()) {
                    return Err(CatalogError::Invalid(format!(
                        "item {:?} tags option {bad} of question {question}, which has {} options",
                        item.name,
                        q.options.len()
                    )));
                }
            }
        }
        Ok(())
    }
}
