// File: curatorbot-common/src/models/events.rs
//
// Abstract event shapes exchanged with the chat connector and the
// notification collaborator. The connector translates raw gateway traffic
// into these; the engine never touches a socket itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One observed inbound guild message. The connector emits this for every
/// message it sees; classification happens inside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpCandidateEvent {
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Role ids the client resolved as mentioned in this message.
    pub mentioned_role_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuratorActionKind {
    Message,
    Reply,
    Reaction,
}

/// A message, reply, or reaction authored by someone who may be a curator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorActionEvent {
    pub guild_id: String,
    pub channel_id: String,
    pub platform_user_id: String,
    pub kind: CuratorActionKind,
    pub message_id: String,
    /// For replies: the message being replied to. For reactions: the message
    /// reacted to.
    pub referenced_message_id: Option<String>,
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Emitted once per tracking record that times out unanswered. Consumed by
/// the notification collaborator; delivery failures never roll the record
/// back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationNotice {
    pub faction_id: Uuid,
    pub faction_name: String,
    pub tracking_id: Uuid,
    pub waited_seconds: i64,
    pub author_id: String,
    pub author_name: Option<String>,
    pub content: String,
    pub attention_role_id: Option<String>,
}
