//! Card store: the full set of undecided cards, in triage order.

use std::collections::HashSet;

use tracing::{info, warn};

use super::model::{CardKind, FeedbackCard};
use super::seed::default_seed;
use crate::error::ImportError;

/// What to do when an imported card's id is already known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Reject the whole batch; the store is left untouched.
    #[default]
    Reject,
    /// Drop colliding cards (first occurrence wins) and import the rest.
    Skip,
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "skip" => Ok(Self::Skip),
            _ => Err(format!("Unknown collision policy: {}", s)),
        }
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub accepted: usize,
    /// Ids dropped under [`CollisionPolicy::Skip`].
    pub skipped: Vec<String>,
}

/// Ordered card store with a restorable seed.
///
/// Cards leave the store only through [`CardStore::remove`]. Ids removed in the
/// current generation are remembered so an import cannot resurrect a card that
/// was already delivered.
#[derive(Debug, Clone)]
pub struct CardStore {
    cards: Vec<FeedbackCard>,
    seed: Vec<FeedbackCard>,
    triaged: HashSet<String>,
    generation: u64,
}

impl CardStore {
    /// Build a store from a seed list, validating id uniqueness.
    pub fn new(seed: Vec<FeedbackCard>) -> Result<Self, ImportError> {
        let mut seen = HashSet::new();
        for (index, card) in seed.iter().enumerate() {
            if card.id.is_empty() {
                return Err(ImportError::EmptyId { index });
            }
            if !seen.insert(card.id.as_str()) {
                return Err(ImportError::DuplicateId {
                    id: card.id.clone(),
                });
            }
        }
        Ok(Self {
            cards: seed.clone(),
            seed,
            triaged: HashSet::new(),
            generation: 0,
        })
    }

    /// Store seeded with the built-in dataset.
    pub fn builtin() -> Self {
        let seed = default_seed();
        Self {
            cards: seed.clone(),
            seed,
            triaged: HashSet::new(),
            generation: 0,
        }
    }

    pub fn cards(&self) -> &[FeedbackCard] {
        &self.cards
    }

    pub fn seed(&self) -> &[FeedbackCard] {
        &self.seed
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cards.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&FeedbackCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Number of cards of one kind.
    pub fn count_kind(&self, kind: CardKind) -> usize {
        self.cards.iter().filter(|c| c.kind == kind).count()
    }

    /// Number of resets since the store was created.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Remove a card by identity. Never positional.
    pub fn remove(&mut self, id: &str) -> Option<FeedbackCard> {
        let pos = self.cards.iter().position(|c| c.id == id)?;
        let card = self.cards.remove(pos);
        self.triaged.insert(card.id.clone());
        Some(card)
    }

    /// Prepend a batch of external cards, keeping the batch's own order.
    ///
    /// The batch is validated in full before anything is inserted.
    pub fn prepend(
        &mut self,
        batch: Vec<FeedbackCard>,
        policy: CollisionPolicy,
    ) -> Result<ImportReport, ImportError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted = Vec::with_capacity(batch.len());
        let mut skipped = Vec::new();

        for (index, card) in batch.into_iter().enumerate() {
            if card.id.is_empty() {
                return Err(ImportError::EmptyId { index });
            }

            let collision = if self.triaged.contains(&card.id) {
                Some(ImportError::AlreadyTriaged {
                    id: card.id.clone(),
                })
            } else if seen.contains(&card.id) || self.contains(&card.id) {
                Some(ImportError::DuplicateId {
                    id: card.id.clone(),
                })
            } else {
                None
            };

            match (collision, policy) {
                (Some(err), CollisionPolicy::Reject) => {
                    warn!(card_id = %card.id, "Import rejected on id collision");
                    return Err(err);
                }
                (Some(_), CollisionPolicy::Skip) => {
                    warn!(card_id = %card.id, "Skipping imported card with colliding id");
                    skipped.push(card.id);
                }
                (None, _) => {
                    seen.insert(card.id.clone());
                    accepted.push(card);
                }
            }
        }

        let report = ImportReport {
            accepted: accepted.len(),
            skipped,
        };
        accepted.append(&mut self.cards);
        self.cards = accepted;

        info!(
            accepted = report.accepted,
            skipped = report.skipped.len(),
            total = self.cards.len(),
            "Cards imported into store"
        );
        Ok(report)
    }

    /// Restore the seed list exactly, dropping imports and decision history.
    pub fn reset(&mut self) {
        self.cards = self.seed.clone();
        self.triaged.clear();
        self.generation += 1;
    }
}

impl Default for CardStore {
    fn default() -> Self {
        Self::builtin()
    }
}
