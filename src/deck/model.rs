//! Feedback card data model: kinds, filters, swipe decisions, and deck events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::completion::DeckState;

/// The closed set of signal kinds a card can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// A feature request.
    Feature,
    /// A bug report.
    Bug,
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feature => write!(f, "feature"),
            Self::Bug => write!(f, "bug"),
        }
    }
}

impl std::str::FromStr for CardKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(Self::Feature),
            "bug" => Ok(Self::Bug),
            _ => Err(format!("Unknown card kind: {}", s)),
        }
    }
}

/// Someone who reported or upvoted a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    pub name: String,
    pub avatar: String,
}

/// One piece of supporting evidence, in the order it was collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Where the quote came from (e.g. "Zendesk #4410").
    pub source: String,
    pub text: String,
    /// Human-readable relative time ("2h ago").
    pub time: String,
}

/// A competitor that ships (or doesn't ship) the requested capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    #[serde(alias = "featureMatch")]
    pub feature_match: bool,
}

/// One triageable feedback signal.
///
/// The engine never mutates these fields; it only moves whole cards in and
/// out of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackCard {
    /// Stable unique identifier (survives resets).
    pub id: String,
    /// Feature or bug. Accepts "type" for payloads from the web client.
    #[serde(alias = "type")]
    pub kind: CardKind,
    #[serde(default)]
    pub emoji: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub mentions: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<Reporter>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor: Option<Competitor>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl FeedbackCard {
    /// Create a bare card with no reporters, tags, or evidence.
    pub fn new(
        id: impl Into<String>,
        kind: CardKind,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            emoji: String::new(),
            title: title.into(),
            summary: summary.into(),
            mentions: 0,
            users: Vec::new(),
            tags: Vec::new(),
            author: None,
            time: None,
            competitor: None,
            evidence: Vec::new(),
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = emoji.into();
        self
    }

    pub fn with_mentions(mut self, mentions: u32) -> Self {
        self.mentions = mentions;
        self
    }

    /// Add a reporter with an avatar URL.
    pub fn with_reporter(mut self, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        self.users.push(Reporter {
            name: name.into(),
            avatar: avatar.into(),
        });
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Append one evidence record.
    pub fn with_evidence(
        mut self,
        source: impl Into<String>,
        text: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        self.evidence.push(Evidence {
            source: source.into(),
            text: text.into(),
            time: time.into(),
        });
        self
    }

    pub fn with_competitor(mut self, name: impl Into<String>, feature_match: bool) -> Self {
        self.competitor = Some(Competitor {
            name: name.into(),
            feature_match,
        });
        self
    }
}

/// Which subsequence of the store is visible as "the deck".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Feature,
    Bug,
}

impl Filter {
    /// Whether a card of `kind` is visible under this filter.
    pub fn matches(&self, kind: CardKind) -> bool {
        match self {
            Self::All => true,
            Self::Feature => kind == CardKind::Feature,
            Self::Bug => kind == CardKind::Bug,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Feature => write!(f, "feature"),
            Self::Bug => write!(f, "bug"),
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "feature" | "features" => Ok(Self::Feature),
            "bug" | "bugs" => Ok(Self::Bug),
            _ => Err(format!("Unknown filter: {}", s)),
        }
    }
}

/// Physical swipe direction. Carries no meaning beyond its fixed decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    /// Right is backlog, left is archive. Not configurable.
    pub fn decision(self) -> Decision {
        match self {
            Self::Right => Decision::Backlog,
            Self::Left => Decision::Archive,
        }
    }
}

/// Where a triaged card goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Accepted as actionable.
    Backlog,
    /// Dismissed.
    Archive,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backlog => write!(f, "backlog"),
            Self::Archive => write!(f, "archive"),
        }
    }
}

/// A resolved card, handed to the collection owner exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub decision: Decision,
    pub card: FeedbackCard,
    pub decided_at: DateTime<Utc>,
}

/// Badge counts for the deck footer and filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeckCounts {
    /// Cards left under the current filter.
    pub remaining: usize,
    /// Undecided feature cards in the store.
    pub features: usize,
    /// Undecided bug cards in the store.
    pub bugs: usize,
    pub favorites: usize,
}

/// Point-in-time view of the deck, sent to clients on connect and on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub filter: Filter,
    pub state: DeckState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<FeedbackCard>,
    pub deck: Vec<FeedbackCard>,
    pub counts: DeckCounts,
    pub favorites: Vec<String>,
    /// Bumped on every reset.
    pub generation: u64,
}

/// Actions a client can send over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeckAction {
    /// Decide the current card.
    Swipe { direction: SwipeDirection },
    SetFilter { filter: Filter },
    /// Star or unstar a card. Never decides it.
    ToggleFavorite { card_id: String },
    Reset,
    /// Hand off to review, optionally with the reviewer's argumentation.
    FinishReview {
        #[serde(default)]
        argumentation: Option<String>,
    },
}

/// Events broadcast to every subscriber (server → client).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeckEvent {
    /// Full deck state (sent on connect and after lagging).
    Snapshot { snapshot: DeckSnapshot },
    /// A card left the deck.
    Decided {
        card_id: String,
        decision: Decision,
        backlog: usize,
        archive: usize,
    },
    FilterChanged { filter: Filter },
    FavoriteToggled { card_id: String, favorite: bool },
    /// The visible deck ran out.
    Completed { filter: Filter },
    /// The store was restored to its seed.
    Reset { generation: u64 },
    /// External cards were prepended to the store.
    Imported { accepted: usize, skipped: usize },
    /// Hand-off to the collections view.
    ReviewRequested {
        review_id: Uuid,
        backlog: usize,
        archive: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        argumentation: Option<String>,
    },
    /// A card was deleted from backlog or archive during review.
    CollectionsChanged { backlog: usize, archive: usize },
}
