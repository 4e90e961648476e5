//! Completion detector: tracks whether the visible deck has been exhausted.

use serde::{Deserialize, Serialize};

/// Deck lifecycle.
///
/// InProgress → Complete when the visible deck empties; Complete → InProgress
/// only through an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckState {
    #[default]
    InProgress,
    Complete,
}

impl DeckState {
    pub fn can_transition_to(&self, target: DeckState) -> bool {
        use DeckState::*;
        matches!((self, target), (InProgress, Complete) | (Complete, InProgress))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for DeckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// What the caller may do once the deck is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionIntent {
    /// Navigate to the collections view.
    FinishReview,
    /// Restore the seed deck.
    Reset,
}

const COMPLETE_INTENTS: &[CompletionIntent] =
    &[CompletionIntent::FinishReview, CompletionIntent::Reset];

#[derive(Debug, Clone, Default)]
pub struct CompletionDetector {
    state: DeckState,
}

impl CompletionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DeckState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_terminal()
    }

    /// Feed the current emptiness of the visible deck.
    ///
    /// Returns true only on the InProgress → Complete edge.
    pub fn observe(&mut self, deck_is_empty: bool) -> bool {
        if deck_is_empty && self.state.can_transition_to(DeckState::Complete) {
            self.state = DeckState::Complete;
            return true;
        }
        false
    }

    /// Force the detector back to InProgress.
    pub fn reset(&mut self) {
        self.state = DeckState::InProgress;
    }

    /// Intents available in the current state.
    pub fn intents(&self) -> &'static [CompletionIntent] {
        match self.state {
            DeckState::InProgress => &[],
            DeckState::Complete => COMPLETE_INTENTS,
        }
    }
}
