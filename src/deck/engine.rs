//! Triage engine: applies swipe decisions to the head of the visible deck.
//!
//! The engine owns the card store, the active filter, the favorites set, and
//! the completion detector. Every operation is a synchronous, total state
//! mutation; only the import boundary can fail.

use chrono::Utc;
use tracing::{debug, info};

use super::completion::{CompletionDetector, CompletionIntent, DeckState};
use super::favorites::FavoriteSet;
use super::filter;
use super::model::{
    CardKind, Decision, DecisionOutcome, DeckCounts, DeckSnapshot, FeedbackCard, Filter,
    SwipeDirection,
};
use super::store::{CardStore, CollisionPolicy, ImportReport};
use crate::error::ImportError;

/// Receiver of decided cards (the owner of the backlog/archive collections).
pub trait DecisionSink {
    /// Called once per decided card.
    fn deliver(&mut self, outcome: DecisionOutcome);
}

impl DecisionSink for Vec<DecisionOutcome> {
    fn deliver(&mut self, outcome: DecisionOutcome) {
        self.push(outcome);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Clear favorites on reset. Off by default: favorites are retained.
    pub reset_clears_favorites: bool,
}

/// Summary of one applied decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triaged {
    pub card_id: String,
    pub decision: Decision,
    /// This decision emptied the visible deck and completed it.
    pub completed: bool,
}

pub struct TriageEngine<S> {
    store: CardStore,
    filter: Filter,
    favorites: FavoriteSet,
    completion: CompletionDetector,
    sink: S,
    options: EngineOptions,
}

impl<S: DecisionSink> TriageEngine<S> {
    /// An empty initial deck starts out Complete.
    pub fn new(store: CardStore, sink: S) -> Self {
        let mut engine = Self {
            store,
            filter: Filter::default(),
            favorites: FavoriteSet::new(),
            completion: CompletionDetector::new(),
            sink,
            options: EngineOptions::default(),
        };
        if engine.completion.observe(engine.current().is_none()) {
            info!("Deck starts empty");
        }
        engine
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Head of the visible deck.
    pub fn current(&self) -> Option<&FeedbackCard> {
        filter::head(self.store.cards(), self.filter)
    }

    /// The visible deck, in triage order.
    pub fn deck(&self) -> Vec<&FeedbackCard> {
        filter::project(self.store.cards(), self.filter)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn state(&self) -> DeckState {
        self.completion.state()
    }

    pub fn intents(&self) -> &'static [CompletionIntent] {
        self.completion.intents()
    }

    pub fn store(&self) -> &CardStore {
        &self.store
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Decide whatever card is current right now.
    ///
    /// No-op when the visible deck is empty: nothing is removed or delivered.
    pub fn decide(&mut self, direction: SwipeDirection) -> Option<Triaged> {
        let Some(id) = self.current().map(|c| c.id.clone()) else {
            debug!(filter = %self.filter, "Decide on empty deck ignored");
            return None;
        };

        let card = self.store.remove(&id)?;
        let decision = direction.decision();

        info!(
            card_id = %card.id,
            kind = %card.kind,
            decision = %decision,
            filter = %self.filter,
            "Card triaged"
        );

        self.sink.deliver(DecisionOutcome {
            decision,
            card,
            decided_at: Utc::now(),
        });

        let completed = self.completion.observe(self.current().is_none());
        if completed {
            info!(filter = %self.filter, "Deck complete");
        }

        Some(Triaged {
            card_id: id,
            decision,
            completed,
        })
    }

    /// Switch the visible deck. Returns true if the new deck is empty and
    /// this completed it.
    pub fn set_filter(&mut self, filter: Filter) -> bool {
        if self.filter == filter {
            debug!(filter = %filter, "Filter unchanged");
        } else {
            info!(from = %self.filter, to = %filter, "Filter changed");
            self.filter = filter;
        }

        let completed = self.completion.observe(self.current().is_none());
        if completed {
            info!(filter = %self.filter, "Deck complete after filter change");
        }
        completed
    }

    /// Flip a card's favorite flag. Never touches the store.
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let favorite = self.favorites.toggle(id);
        debug!(card_id = %id, favorite, "Favorite toggled");
        favorite
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.is_favorite(id)
    }

    /// Restore the seed deck and return to InProgress. The filter is kept.
    pub fn reset(&mut self) {
        self.store.reset();
        if self.options.reset_clears_favorites {
            self.favorites.clear();
        }
        self.completion.reset();
        info!(
            generation = self.store.generation(),
            cards = self.store.len(),
            filter = %self.filter,
            "Deck reset"
        );
    }

    /// Hand-off signal. Only offered once the deck is complete; never
    /// changes engine state.
    pub fn finish_review(&self) -> bool {
        if !self.completion.is_complete() {
            debug!("Finish review requested before deck completion");
            return false;
        }
        info!("Review hand-off requested");
        true
    }

    /// Prepend externally sourced cards to the store.
    pub fn import(
        &mut self,
        batch: Vec<FeedbackCard>,
        policy: CollisionPolicy,
    ) -> Result<ImportReport, ImportError> {
        self.store.prepend(batch, policy)
    }

    pub fn counts(&self) -> DeckCounts {
        DeckCounts {
            remaining: filter::visible_len(self.store.cards(), self.filter),
            features: self.store.count_kind(CardKind::Feature),
            bugs: self.store.count_kind(CardKind::Bug),
            favorites: self.favorites.len(),
        }
    }

    pub fn snapshot(&self) -> DeckSnapshot {
        let deck: Vec<FeedbackCard> = self.deck().into_iter().cloned().collect();
        DeckSnapshot {
            filter: self.filter,
            state: self.state(),
            current: deck.first().cloned(),
            counts: self.counts(),
            favorites: self.favorites.ids().map(str::to_string).collect(),
            generation: self.store.generation(),
            deck,
        }
    }
}
