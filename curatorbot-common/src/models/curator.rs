use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A designated helper whose responsiveness and activity are tracked.
/// Owned by the administrative layer; the engine only reads these.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Curator {
    pub curator_id: Uuid,
    /// Platform user id (Discord snowflake as text).
    pub platform_user_id: String,
    pub display_name: String,
    pub faction_tags: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Curator {
    pub fn new(platform_user_id: &str, display_name: &str) -> Self {
        Self {
            curator_id: Uuid::new_v4(),
            platform_user_id: platform_user_id.to_string(),
            display_name: display_name.to_string(),
            faction_tags: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
