use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest mention excerpt we keep on a tracking record.
pub const MENTION_CONTENT_MAX: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Open,
    Resolved,
    Escalated,
}

impl TrackingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingState::Open => "open",
            TrackingState::Resolved => "resolved",
            TrackingState::Escalated => "escalated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TrackingState::Open),
            "resolved" => Some(TrackingState::Resolved),
            "escalated" => Some(TrackingState::Escalated),
            _ => None,
        }
    }

    /// Resolved and escalated records never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TrackingState::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Message,
    Reply,
    Reaction,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Message => "message",
            ResponseKind::Reply => "reply",
            ResponseKind::Reaction => "reaction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "message" => Some(ResponseKind::Message),
            "reply" => Some(ResponseKind::Reply),
            "reaction" => Some(ResponseKind::Reaction),
            _ => None,
        }
    }
}

/// How an open help request was answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub curator_id: Uuid,
    pub response_message_id: String,
    pub response_timestamp: DateTime<Utc>,
    pub response_kind: ResponseKind,
    /// response_timestamp - mention_timestamp; never negative, candidate
    /// responses older than the mention are rejected before this is built.
    pub response_time_seconds: i64,
}

/// One open help request. Created exactly once per mention message id;
/// leaves `Open` at most once, to either `Resolved` or `Escalated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub tracking_id: Uuid,
    pub faction_id: Uuid,
    pub channel_id: Option<String>,
    pub mention_message_id: String,
    pub mention_author_id: String,
    pub mention_author_name: Option<String>,
    pub mention_content: String,
    pub mention_timestamp: DateTime<Utc>,
    pub state: TrackingState,
    pub resolution: Option<ResolutionOutcome>,
}

impl TrackingRecord {
    pub fn open(
        faction_id: Uuid,
        channel_id: Option<&str>,
        mention_message_id: &str,
        mention_author_id: &str,
        mention_author_name: Option<&str>,
        content: &str,
        mention_timestamp: DateTime<Utc>,
    ) -> Self {
        let mut mention_content = content.to_string();
        mention_content.truncate(
            mention_content
                .char_indices()
                .map(|(i, _)| i)
                .nth(MENTION_CONTENT_MAX)
                .unwrap_or(mention_content.len()),
        );
        Self {
            tracking_id: Uuid::new_v4(),
            faction_id,
            channel_id: channel_id.map(String::from),
            mention_message_id: mention_message_id.to_string(),
            mention_author_id: mention_author_id.to_string(),
            mention_author_name: mention_author_name.map(String::from),
            mention_content,
            mention_timestamp,
            state: TrackingState::Open,
            resolution: None,
        }
    }
}
