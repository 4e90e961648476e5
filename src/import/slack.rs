//! Slack source: pulls channel history and maps messages to feedback cards.

use async_trait::async_trait;
use chrono::DateTime;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use super::FeedbackSource;
use crate::deck::model::{CardKind, FeedbackCard};
use crate::error::SourceError;

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Characters of message text kept in a card title.
const TITLE_MAX_CHARS: usize = 40;

/// Slack import configuration, built from environment variables.
///
/// Every pull re-reads the channel's recent history. Messages already in the
/// deck or already triaged are skipped, whatever the configured collision
/// policy.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub token: SecretString,
    pub channel_id: String,
    pub api_base: String,
}

impl SlackConfig {
    /// Returns `None` if `SLACK_TOKEN` or `SLACK_CHANNEL_ID` is not set (import disabled).
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("SLACK_TOKEN")?;
        let channel_id = lookup("SLACK_CHANNEL_ID")?;
        if token.trim().is_empty() || channel_id.trim().is_empty() {
            return None;
        }
        let api_base = lookup("SLACK_API_BASE").unwrap_or_else(|| SLACK_API_BASE.to_string());
        Some(Self {
            token: SecretString::from(token),
            channel_id: channel_id.trim().to_string(),
            api_base,
        })
    }
}

/// One message from `conversations.history`.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: String,
    pub ts: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<SlackMessage>,
}

/// Map a Slack message to a card. Messages mentioning "bug" become bug cards.
pub fn message_to_card(msg: &SlackMessage) -> FeedbackCard {
    let is_bug = msg.text.to_lowercase().contains("bug");
    let (kind, emoji) = if is_bug {
        (CardKind::Bug, "🛑")
    } else {
        (CardKind::Feature, "💬")
    };

    FeedbackCard::new(
        format!("slack-{}", msg.ts),
        kind,
        truncate_title(&msg.text),
        msg.text.clone(),
    )
    .with_emoji(emoji)
    .with_mentions(1)
    .with_reporter(
        msg.user.clone(),
        format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", msg.user),
    )
    .with_tags(["Slack", "Imported"])
    .with_evidence("Slack", msg.text.clone(), format_ts(&msg.ts))
}

fn truncate_title(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Render a Slack `ts` ("1700000000.000100") as UTC `HH:MM:SS`.
fn format_ts(ts: &str) -> String {
    ts.parse::<f64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs.trunc() as i64, 0))
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Reads channel history through the Slack Web API.
pub struct SlackSource {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackSource {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.config.api_base.trim_end_matches('/'))
    }

    /// Raw channel history.
    pub async fn fetch_messages(&self) -> Result<Vec<SlackMessage>, SourceError> {
        let resp = self
            .client
            .get(self.api_url("conversations.history"))
            .query(&[("channel", self.config.channel_id.as_str())])
            .bearer_auth(self.config.token.expose_secret())
            .send()
            .await
            .map_err(|e| SourceError::RequestFailed {
                name: "slack".into(),
                reason: e.to_string(),
            })?;

        let body: HistoryResponse = resp.json().await.map_err(|e| SourceError::RequestFailed {
            name: "slack".into(),
            reason: e.to_string(),
        })?;

        if !body.ok {
            return Err(SourceError::Api {
                name: "slack".into(),
                reason: body
                    .error
                    .unwrap_or_else(|| "Failed to fetch Slack messages".to_string()),
            });
        }

        debug!(count = body.messages.len(), channel = %self.config.channel_id, "Fetched Slack history");
        Ok(body.messages)
    }
}

#[async_trait]
impl FeedbackSource for SlackSource {
    fn name(&self) -> &str {
        "slack"
    }

    async fn fetch(&self) -> Result<Vec<FeedbackCard>, SourceError> {
        let messages = self.fetch_messages().await?;
        let cards: Vec<FeedbackCard> = messages.iter().map(message_to_card).collect();
        info!(count = cards.len(), channel = %self.config.channel_id, "Mapped Slack messages to cards");
        Ok(cards)
    }
}
