use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::activity::ActivityRecord;
use crate::models::curator::Curator;
use crate::models::faction::FactionContext;
use crate::models::task_report::TaskReport;
use crate::models::tracking::TrackingRecord;

#[async_trait]
pub trait CuratorRepository: Send + Sync {
    async fn create(&self, curator: &Curator) -> Result<(), Error>;
    async fn get(&self, curator_id: Uuid) -> Result<Option<Curator>, Error>;

    /// Active curators only; an inactive curator is invisible to the engine.
    async fn get_by_platform_user_id(&self, platform_user_id: &str) -> Result<Option<Curator>, Error>;

    async fn list_active(&self) -> Result<Vec<Curator>, Error>;
    async fn update(&self, curator: &Curator) -> Result<(), Error>;
}

#[async_trait]
pub trait FactionRepository: Send + Sync {
    async fn create(&self, faction: &FactionContext) -> Result<(), Error>;
    async fn get(&self, faction_id: Uuid) -> Result<Option<FactionContext>, Error>;

    /// Active factions only.
    async fn get_by_guild_id(&self, guild_id: &str) -> Result<Option<FactionContext>, Error>;

    async fn list_active(&self) -> Result<Vec<FactionContext>, Error>;
    async fn update(&self, faction: &FactionContext) -> Result<(), Error>;
}

#[async_trait]
pub trait TrackingRepository: Send + Sync {
    async fn create(&self, record: &TrackingRecord) -> Result<(), Error>;
    async fn get(&self, tracking_id: Uuid) -> Result<Option<TrackingRecord>, Error>;
    async fn get_by_mention_message_id(&self, message_id: &str) -> Result<Option<TrackingRecord>, Error>;
    async fn update(&self, record: &TrackingRecord) -> Result<(), Error>;
    async fn list_open(&self) -> Result<Vec<TrackingRecord>, Error>;

    /// Resolved records credited to `curator_id` whose response timestamp
    /// falls within `[since, until]`.
    async fn list_resolved_for_curator(
        &self,
        curator_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<TrackingRecord>, Error>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn insert(&self, record: &ActivityRecord) -> Result<(), Error>;

    async fn list_for_curator(
        &self,
        curator_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, Error>;
}

#[async_trait]
pub trait TaskReportRepository: Send + Sync {
    async fn create(&self, report: &TaskReport) -> Result<(), Error>;
    async fn get_by_message_id(&self, message_id: &str) -> Result<Option<TaskReport>, Error>;
    async fn update(&self, report: &TaskReport) -> Result<(), Error>;

    /// Most recent pending report in a channel submitted at or after `since`.
    async fn find_pending_in_channel(
        &self,
        faction_id: Uuid,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<TaskReport>, Error>;
}

#[async_trait]
pub trait BotConfigRepository: Send + Sync {
    async fn set_value(&self, config_key: &str, config_value: &str) -> Result<(), Error>;
    async fn get_value(&self, config_key: &str) -> Result<Option<String>, Error>;
    async fn list_all(&self) -> Result<Vec<(String, String)>, Error>;
}
