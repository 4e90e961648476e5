//! Deck queue: the triage engine behind a single lock, with broadcast to
//! WebSocket clients.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::completion::DeckState;
use super::engine::{EngineOptions, TriageEngine, Triaged};
use super::model::{DeckEvent, DeckSnapshot, FeedbackCard, Filter, SwipeDirection};
use super::store::{CardStore, CollisionPolicy, ImportReport};
use crate::collections::{Collection, Collections};
use crate::error::ImportError;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Review hand-off payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewHandoff {
    pub review_id: Uuid,
    pub backlog: usize,
    pub archive: usize,
    /// Reviewer's free-text case for the backlog, passed through to the PM.
    pub argumentation: Option<String>,
}

/// Shared triage session. All mutations are serialized through one mutex;
/// events are broadcast while it is held, in mutation order.
pub struct DeckQueue {
    engine: Mutex<TriageEngine<Collections>>,
    policy: CollisionPolicy,
    tx: broadcast::Sender<DeckEvent>,
}

impl DeckQueue {
    /// Create a queue over the given store.
    pub fn new(store: CardStore, options: EngineOptions, policy: CollisionPolicy) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        let engine = TriageEngine::new(store, Collections::new()).with_options(options);
        Arc::new(Self {
            engine: Mutex::new(engine),
            policy,
            tx,
        })
    }

    /// Queue seeded with the built-in dataset and default options.
    pub fn builtin() -> Arc<Self> {
        Self::new(
            CardStore::builtin(),
            EngineOptions::default(),
            CollisionPolicy::default(),
        )
    }

    /// Subscribe to real-time deck events. Each WS client calls this.
    pub fn subscribe(&self) -> broadcast::Receiver<DeckEvent> {
        self.tx.subscribe()
    }

    fn emit(&self, event: DeckEvent) {
        // Ok if no receivers are listening
        let _ = self.tx.send(event);
    }

    pub async fn snapshot(&self) -> DeckSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn current(&self) -> Option<FeedbackCard> {
        self.engine.lock().await.current().cloned()
    }

    pub async fn state(&self) -> DeckState {
        self.engine.lock().await.state()
    }

    /// Decide the current card. None if the deck is empty.
    pub async fn swipe(&self, direction: SwipeDirection) -> Option<Triaged> {
        let mut engine = self.engine.lock().await;
        let triaged = engine.decide(direction)?;
        let filter = engine.filter();
        let (backlog, archive) = {
            let c = engine.sink();
            (c.backlog_len(), c.archive_len())
        };

        self.emit(DeckEvent::Decided {
            card_id: triaged.card_id.clone(),
            decision: triaged.decision,
            backlog,
            archive,
        });
        if triaged.completed {
            self.emit(DeckEvent::Completed { filter });
        }
        Some(triaged)
    }

    /// Change the filter. Returns the resulting deck state.
    pub async fn set_filter(&self, filter: Filter) -> DeckState {
        let mut engine = self.engine.lock().await;
        let previous = engine.filter();
        let completed = engine.set_filter(filter);
        let state = engine.state();

        if previous != filter {
            self.emit(DeckEvent::FilterChanged { filter });
        }
        if completed {
            self.emit(DeckEvent::Completed { filter });
        }
        state
    }

    /// Toggle a favorite. Returns the new flag.
    pub async fn toggle_favorite(&self, card_id: &str) -> bool {
        let mut engine = self.engine.lock().await;
        let favorite = engine.toggle_favorite(card_id);
        self.emit(DeckEvent::FavoriteToggled {
            card_id: card_id.to_string(),
            favorite,
        });
        favorite
    }

    pub async fn reset(&self) -> DeckSnapshot {
        let mut engine = self.engine.lock().await;
        engine.reset();
        let snapshot = engine.snapshot();

        self.emit(DeckEvent::Reset {
            generation: snapshot.generation,
        });
        snapshot
    }

    /// Request the hand-off to the collections view. None unless complete.
    pub async fn finish_review(&self, argumentation: Option<String>) -> Option<ReviewHandoff> {
        let engine = self.engine.lock().await;
        if !engine.finish_review() {
            return None;
        }
        let handoff = ReviewHandoff {
            review_id: Uuid::new_v4(),
            backlog: engine.sink().backlog_len(),
            archive: engine.sink().archive_len(),
            argumentation: argumentation.filter(|text| !text.trim().is_empty()),
        };

        info!(
            review_id = %handoff.review_id,
            has_argumentation = handoff.argumentation.is_some(),
            "Review requested"
        );
        self.emit(DeckEvent::ReviewRequested {
            review_id: handoff.review_id,
            backlog: handoff.backlog,
            archive: handoff.archive,
            argumentation: handoff.argumentation.clone(),
        });
        Some(handoff)
    }

    /// Atomically prepend external cards under the configured collision policy.
    pub async fn import(&self, batch: Vec<FeedbackCard>) -> Result<ImportReport, ImportError> {
        self.import_with(batch, self.policy).await
    }

    /// Atomically prepend external cards under an explicit collision policy.
    pub async fn import_with(
        &self,
        batch: Vec<FeedbackCard>,
        policy: CollisionPolicy,
    ) -> Result<ImportReport, ImportError> {
        let mut engine = self.engine.lock().await;
        let report = engine.import(batch, policy);

        match &report {
            Ok(report) => self.emit(DeckEvent::Imported {
                accepted: report.accepted,
                skipped: report.skipped.len(),
            }),
            Err(e) => warn!(error = %e, "Import rejected"),
        }
        report
    }

    pub async fn collections(&self) -> Collections {
        self.engine.lock().await.sink().clone()
    }

    /// Delete a decided card from backlog or archive.
    pub async fn remove_from_collection(
        &self,
        collection: Collection,
        card_id: &str,
    ) -> Option<FeedbackCard> {
        let mut engine = self.engine.lock().await;
        let removed = engine.sink_mut().remove(collection, card_id);
        let (backlog, archive) = (engine.sink().backlog_len(), engine.sink().archive_len());

        match removed {
            Some(card) => {
                self.emit(DeckEvent::CollectionsChanged { backlog, archive });
                Some(card)
            }
            None => {
                debug!(card_id = %card_id, collection = %collection, "Card not in collection");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::model::{CardKind, Decision};

    fn small_queue() -> Arc<DeckQueue> {
        let store = CardStore::new(vec![
            FeedbackCard::new("A", CardKind::Feature, "a", "a"),
            FeedbackCard::new("B", CardKind::Bug, "b", "b"),
        ])
        .unwrap();
        DeckQueue::new(store, EngineOptions::default(), CollisionPolicy::Reject)
    }

    #[tokio::test]
    async fn swipe_delivers_to_collections() {
        let queue = small_queue();
        let triaged = queue.swipe(SwipeDirection::Right).await.unwrap();
        assert_eq!(triaged.card_id, "A");

        let collections = queue.collections().await;
        assert_eq!(collections.backlog.len(), 1);
        assert_eq!(collections.backlog[0].id, "A");
        assert_eq!(collections.xp, 1475);
    }

    #[tokio::test]
    async fn broadcast_decided_then_completed() {
        let queue = small_queue();
        let mut rx = queue.subscribe();

        queue.swipe(SwipeDirection::Left).await;
        queue.swipe(SwipeDirection::Right).await;

        match rx.recv().await.unwrap() {
            DeckEvent::Decided {
                card_id, decision, ..
            } => {
                assert_eq!(card_id, "A");
                assert_eq!(decision, Decision::Archive);
            }
            other => panic!("Expected Decided, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            DeckEvent::Decided {
                card_id,
                backlog,
                archive,
                ..
            } => {
                assert_eq!(card_id, "B");
                assert_eq!((backlog, archive), (1, 1));
            }
            other => panic!("Expected Decided, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            DeckEvent::Completed { filter } => assert_eq!(filter, Filter::All),
            other => panic!("Expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn swipe_on_empty_deck_emits_nothing() {
        let queue = small_queue();
        queue.swipe(SwipeDirection::Left).await;
        queue.swipe(SwipeDirection::Left).await;

        let mut rx = queue.subscribe();
        assert!(queue.swipe(SwipeDirection::Left).await.is_none());
        assert!(queue.swipe(SwipeDirection::Right).await.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_swipes_never_double_deliver() {
        let queue = small_queue();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let q = Arc::clone(&queue);
                tokio::spawn(async move { q.swipe(SwipeDirection::Right).await })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                applied += 1;
            }
        }
        assert_eq!(applied, 2);
        assert_eq!(queue.collections().await.backlog.len(), 2);
    }

    #[tokio::test]
    async fn finish_review_requires_completion() {
        let queue = small_queue();
        assert!(queue.finish_review(None).await.is_none());

        queue.swipe(SwipeDirection::Right).await;
        queue.swipe(SwipeDirection::Left).await;
        let handoff = queue.finish_review(None).await.unwrap();
        assert_eq!((handoff.backlog, handoff.archive), (1, 1));
        assert_eq!(handoff.argumentation, None);
        assert_eq!(queue.state().await, DeckState::Complete);
    }

    #[tokio::test]
    async fn finish_review_carries_argumentation() {
        let queue = small_queue();
        queue.swipe(SwipeDirection::Right).await;
        queue.swipe(SwipeDirection::Right).await;

        let mut rx = queue.subscribe();
        let handoff = queue
            .finish_review(Some("Both block enterprise deals".into()))
            .await
            .unwrap();
        assert_eq!(
            handoff.argumentation.as_deref(),
            Some("Both block enterprise deals")
        );

        match rx.recv().await.unwrap() {
            DeckEvent::ReviewRequested {
                review_id,
                backlog,
                argumentation,
                ..
            } => {
                assert_eq!(review_id, handoff.review_id);
                assert_eq!(backlog, 2);
                assert_eq!(
                    argumentation.as_deref(),
                    Some("Both block enterprise deals")
                );
            }
            other => panic!("expected ReviewRequested, got {other:?}"),
        }

        // Blank text is treated as absent.
        let handoff = queue.finish_review(Some("   ".into())).await.unwrap();
        assert_eq!(handoff.argumentation, None);
    }

    #[tokio::test]
    async fn empty_store_is_immediately_reviewable() {
        let queue = DeckQueue::new(
            CardStore::new(Vec::new()).unwrap(),
            EngineOptions::default(),
            CollisionPolicy::Reject,
        );
        assert_eq!(queue.state().await, DeckState::Complete);
        assert!(queue.finish_review(None).await.is_some());
    }

    #[tokio::test]
    async fn import_with_skip_overrides_reject_policy() {
        let queue = small_queue();
        queue.swipe(SwipeDirection::Right).await;

        // "A" was triaged, "B" is still in the store: both collide.
        let batch = vec![
            FeedbackCard::new("A", CardKind::Feature, "a", "a"),
            FeedbackCard::new("B", CardKind::Bug, "b", "b"),
            FeedbackCard::new("N", CardKind::Bug, "n", "n"),
        ];
        assert!(queue.import(batch.clone()).await.is_err());

        let report = queue.import_with(batch, CollisionPolicy::Skip).await.unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.skipped, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(queue.current().await.unwrap().id, "N");
    }

    #[tokio::test]
    async fn reset_round_trip() {
        let queue = small_queue();
        queue.swipe(SwipeDirection::Right).await;
        queue.swipe(SwipeDirection::Right).await;
        assert_eq!(queue.state().await, DeckState::Complete);

        let snapshot = queue.reset().await;
        assert_eq!(snapshot.state, DeckState::InProgress);
        assert_eq!(snapshot.generation, 1);
        let ids: Vec<_> = snapshot.deck.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        // Collections are owned outside the deck and survive the reset.
        assert_eq!(queue.collections().await.backlog.len(), 2);
    }

    #[tokio::test]
    async fn filter_to_empty_deck_emits_completed() {
        let store =
            CardStore::new(vec![FeedbackCard::new("A", CardKind::Feature, "a", "a")]).unwrap();
        let queue = DeckQueue::new(store, EngineOptions::default(), CollisionPolicy::Reject);
        let mut rx = queue.subscribe();

        assert_eq!(queue.set_filter(Filter::Bug).await, DeckState::Complete);
        assert!(matches!(
            rx.recv().await.unwrap(),
            DeckEvent::FilterChanged { filter: Filter::Bug }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            DeckEvent::Completed { filter: Filter::Bug }
        ));
    }

    #[tokio::test]
    async fn import_rejected_batch_changes_nothing() {
        let queue = small_queue();
        let err = queue
            .import(vec![
                FeedbackCard::new("slack-1", CardKind::Bug, "s", "s"),
                FeedbackCard::new("A", CardKind::Bug, "dup", "dup"),
            ])
            .await
            .unwrap_err();
        assert_eq!(err, ImportError::DuplicateId { id: "A".into() });
        assert_eq!(queue.snapshot().await.deck.len(), 2);
    }

    #[tokio::test]
    async fn remove_from_collection_emits_change() {
        let queue = small_queue();
        queue.swipe(SwipeDirection::Right).await;
        let mut rx = queue.subscribe();

        assert!(
            queue
                .remove_from_collection(Collection::Backlog, "A")
                .await
                .is_some()
        );
        assert!(matches!(
            rx.recv().await.unwrap(),
            DeckEvent::CollectionsChanged {
                backlog: 0,
                archive: 0
            }
        ));
    }

    #[tokio::test]
    async fn toggle_favorite_broadcasts() {
        let queue = small_queue();
        let mut rx = queue.subscribe();
        assert!(queue.toggle_favorite("B").await);
        match rx.recv().await.unwrap() {
            DeckEvent::FavoriteToggled { card_id, favorite } => {
                assert_eq!(card_id, "B");
                assert!(favorite);
            }
            other => panic!("Expected FavoriteToggled, got {other:?}"),
        }
        assert_eq!(queue.snapshot().await.deck.len(), 2);
    }
}
