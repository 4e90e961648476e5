//! Filter projection: the visible deck as an ordered subsequence of the store.

use super::model::{FeedbackCard, Filter};

/// Cards visible under `filter`, in store order.
pub fn project(cards: &[FeedbackCard], filter: Filter) -> Vec<&FeedbackCard> {
    cards.iter().filter(|c| filter.matches(c.kind)).collect()
}

/// First visible card, without materializing the whole projection.
pub fn head(cards: &[FeedbackCard], filter: Filter) -> Option<&FeedbackCard> {
    cards.iter().find(|c| filter.matches(c.kind))
}

/// Number of visible cards.
pub fn visible_len(cards: &[FeedbackCard], filter: Filter) -> usize {
    cards.iter().filter(|c| filter.matches(c.kind)).count()
}
