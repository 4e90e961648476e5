//! Triage deck: card store, filter projection, favorites, completion, and
//! the engine that ties them together.

pub mod completion;
pub mod engine;
pub mod favorites;
pub mod filter;
pub mod model;
pub mod queue;
pub mod seed;
pub mod store;
pub mod ws;

pub use completion::{CompletionDetector, CompletionIntent, DeckState};
pub use engine::{DecisionSink, EngineOptions, TriageEngine, Triaged};
pub use favorites::FavoriteSet;
pub use model::{
    CardKind, Decision, DecisionOutcome, DeckAction, DeckCounts, DeckEvent, DeckSnapshot,
    FeedbackCard, Filter, SwipeDirection,
};
pub use queue::{DeckQueue, ReviewHandoff};
pub use store::{CardStore, CollisionPolicy, ImportReport};
pub use ws::deck_routes;
