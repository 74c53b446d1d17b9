use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Message,
    Reaction,
    Reply,
    TaskVerification,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Message => "message",
            ActivityKind::Reaction => "reaction",
            ActivityKind::Reply => "reply",
            ActivityKind::TaskVerification => "task_verification",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "message" => Some(ActivityKind::Message),
            "reaction" => Some(ActivityKind::Reaction),
            "reply" => Some(ActivityKind::Reply),
            "task_verification" => Some(ActivityKind::TaskVerification),
            _ => None,
        }
    }
}

/// One observed curator action, priced at record time. Config edits later on
/// never re-price rows that are already in the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: Uuid,
    pub curator_id: Uuid,
    pub faction_id: Uuid,
    pub kind: ActivityKind,
    pub channel_id: String,
    pub message_id: String,
    pub content: Option<String>,
    pub points: i32,
    pub timestamp: DateTime<Utc>,
}
