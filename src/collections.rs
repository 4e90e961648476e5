//! Backlog / archive collections: the receiving end of triage decisions.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::deck::engine::DecisionSink;
use crate::deck::model::{Decision, DecisionOutcome, FeedbackCard};

/// Experience points granted per decided card.
pub const XP_PER_DECISION: u32 = 25;

const STARTING_XP: u32 = 1450;
const STARTING_STREAK: u32 = 5;

/// Which collection a card lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Backlog,
    Archive,
}

impl From<Decision> for Collection {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Backlog => Self::Backlog,
            Decision::Archive => Self::Archive,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backlog => write!(f, "backlog"),
            Self::Archive => write!(f, "archive"),
        }
    }
}

impl std::str::FromStr for Collection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "archive" => Ok(Self::Archive),
            _ => Err(format!("Unknown collection: {}", s)),
        }
    }
}

/// Decided cards, newest first, plus the session's gamification counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collections {
    pub backlog: Vec<FeedbackCard>,
    pub archive: Vec<FeedbackCard>,
    pub xp: u32,
    pub streak: u32,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            backlog: Vec::new(),
            archive: Vec::new(),
            xp: STARTING_XP,
            streak: STARTING_STREAK,
        }
    }
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn archive_len(&self) -> usize {
        self.archive.len()
    }

    fn list_mut(&mut self, collection: Collection) -> &mut Vec<FeedbackCard> {
        match collection {
            Collection::Backlog => &mut self.backlog,
            Collection::Archive => &mut self.archive,
        }
    }

    /// Delete a card from one collection during review.
    pub fn remove(&mut self, collection: Collection, id: &str) -> Option<FeedbackCard> {
        let list = self.list_mut(collection);
        let pos = list.iter().position(|c| c.id == id)?;
        let card = list.remove(pos);
        info!(card_id = %id, collection = %collection, "Card removed from collection");
        Some(card)
    }
}

impl DecisionSink for Collections {
    fn deliver(&mut self, outcome: DecisionOutcome) {
        let collection = Collection::from(outcome.decision);
        self.list_mut(collection).insert(0, outcome.card);
        self.xp += XP_PER_DECISION;
    }
}
