use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One monitored community. `attention_role_id` is the role whose mention
/// marks a message as a help request; `completed_tasks_channel_id` (when set)
/// is where task-completion reports are posted and verified.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct FactionContext {
    pub faction_id: Uuid,
    /// Platform guild id (snowflake as text).
    pub guild_id: String,
    pub name: String,
    pub attention_role_id: Option<String>,
    pub completed_tasks_channel_id: Option<String>,
    pub is_active: bool,
}

impl FactionContext {
    pub fn new(guild_id: &str, name: &str) -> Self {
        Self {
            faction_id: Uuid::new_v4(),
            guild_id: guild_id.to_string(),
            name: name.to_string(),
            attention_role_id: None,
            completed_tasks_channel_id: None,
            is_active: true,
        }
    }
}
