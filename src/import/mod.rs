//! External feedback sources that feed cards into the deck.

pub mod slack;

use async_trait::async_trait;

use crate::deck::model::FeedbackCard;
use crate::error::SourceError;

pub use slack::{SlackConfig, SlackMessage, SlackSource};

/// Something that can produce a batch of cards for import.
#[async_trait]
pub trait FeedbackSource: Send + Sync {
    /// Source name for logs and errors.
    fn name(&self) -> &str;

    /// Fetch the latest batch, already mapped to cards.
    async fn fetch(&self) -> Result<Vec<FeedbackCard>, SourceError>;
}
