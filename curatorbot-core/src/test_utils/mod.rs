// File: curatorbot-core/src/test_utils/mod.rs
//
// In-memory repository implementations backing the test suites. Same
// contracts as the Postgres repositories, held in mutex-guarded maps.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use curatorbot_common::models::{
    ActivityRecord, Curator, FactionContext, TaskReport, TaskReportStatus, TrackingRecord,
    TrackingState,
};
use curatorbot_common::traits::repository_traits::{
    ActivityRepository, BotConfigRepository, CuratorRepository, FactionRepository,
    TaskReportRepository, TrackingRepository,
};
use curatorbot_common::Error;

/// Install a log subscriber for test debugging. Safe to call from every
/// test; only the first call wins.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
pub struct MemoryCuratorRepository {
    storage: Mutex<HashMap<Uuid, Curator>>,
}

#[async_trait]
impl CuratorRepository for MemoryCuratorRepository {
    async fn create(&self, curator: &Curator) -> Result<(), Error> {
        let mut map = self.storage.lock().unwrap();
        map.insert(curator.curator_id, curator.clone());
        Ok(())
    }

    async fn get(&self, curator_id: Uuid) -> Result<Option<Curator>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map.get(&curator_id).cloned())
    }

    async fn get_by_platform_user_id(
        &self,
        platform_user_id: &str,
    ) -> Result<Option<Curator>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map
            .values()
            .find(|c| c.platform_user_id == platform_user_id && c.is_active)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<Curator>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map.values().filter(|c| c.is_active).cloned().collect())
    }

    async fn update(&self, curator: &Curator) -> Result<(), Error> {
        let mut map = self.storage.lock().unwrap();
        map.insert(curator.curator_id, curator.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFactionRepository {
    storage: Mutex<HashMap<Uuid, FactionContext>>,
}

#[async_trait]
impl FactionRepository for MemoryFactionRepository {
    async fn create(&self, faction: &FactionContext) -> Result<(), Error> {
        let mut map = self.storage.lock().unwrap();
        map.insert(faction.faction_id, faction.clone());
        Ok(())
    }

    async fn get(&self, faction_id: Uuid) -> Result<Option<FactionContext>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map.get(&faction_id).cloned())
    }

    async fn get_by_guild_id(&self, guild_id: &str) -> Result<Option<FactionContext>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map
            .values()
            .find(|f| f.guild_id == guild_id && f.is_active)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<FactionContext>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map.values().filter(|f| f.is_active).cloned().collect())
    }

    async fn update(&self, faction: &FactionContext) -> Result<(), Error> {
        let mut map = self.storage.lock().unwrap();
        map.insert(faction.faction_id, faction.clone());
        Ok(())
    }
}

/// Tracking store with a write-failure toggle so tests can exercise the
/// "in-memory transition stands when persistence fails" path.
#[derive(Default)]
pub struct MemoryTrackingRepository {
    storage: Mutex<HashMap<Uuid, TrackingRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryTrackingRepository {
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Tracking("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TrackingRepository for MemoryTrackingRepository {
    async fn create(&self, record: &TrackingRecord) -> Result<(), Error> {
        self.check_writable()?;
        let mut map = self.storage.lock().unwrap();
        // Mirror the ON CONFLICT DO NOTHING semantics of the real store.
        if map
            .values()
            .any(|r| r.mention_message_id == record.mention_message_id)
        {
            return Ok(());
        }
        map.insert(record.tracking_id, record.clone());
        Ok(())
    }

    async fn get(&self, tracking_id: Uuid) -> Result<Option<TrackingRecord>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map.get(&tracking_id).cloned())
    }

    async fn get_by_mention_message_id(
        &self,
        message_id: &str,
    ) -> Result<Option<TrackingRecord>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map
            .values()
            .find(|r| r.mention_message_id == message_id)
            .cloned())
    }

    async fn update(&self, record: &TrackingRecord) -> Result<(), Error> {
        self.check_writable()?;
        let mut map = self.storage.lock().unwrap();
        map.insert(record.tracking_id, record.clone());
        Ok(())
    }

    async fn list_open(&self) -> Result<Vec<TrackingRecord>, Error> {
        let map = self.storage.lock().unwrap();
        let mut open: Vec<TrackingRecord> = map
            .values()
            .filter(|r| r.state == TrackingState::Open)
            .cloned()
            .collect();
        open.sort_by_key(|r| r.mention_timestamp);
        Ok(open)
    }

    async fn list_resolved_for_curator(
        &self,
        curator_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<TrackingRecord>, Error> {
        let map = self.storage.lock().unwrap();
        let mut resolved: Vec<TrackingRecord> = map
            .values()
            .filter(|r| r.state == TrackingState::Resolved)
            .filter(|r| {
                r.resolution.as_ref().is_some_and(|o| {
                    o.curator_id == curator_id
                        && o.response_timestamp >= since
                        && o.response_timestamp <= until
                })
            })
            .cloned()
            .collect();
        resolved.sort_by_key(|r| r.resolution.as_ref().map(|o| o.response_timestamp));
        Ok(resolved)
    }
}

#[derive(Default)]
pub struct MemoryActivityRepository {
    storage: Mutex<Vec<ActivityRecord>>,
}

#[async_trait]
impl ActivityRepository for MemoryActivityRepository {
    async fn insert(&self, record: &ActivityRecord) -> Result<(), Error> {
        let mut log = self.storage.lock().unwrap();
        log.push(record.clone());
        Ok(())
    }

    async fn list_for_curator(
        &self,
        curator_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, Error> {
        let log = self.storage.lock().unwrap();
        Ok(log
            .iter()
            .filter(|a| a.curator_id == curator_id && a.timestamp >= since && a.timestamp <= until)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryTaskReportRepository {
    storage: Mutex<HashMap<Uuid, TaskReport>>,
}

#[async_trait]
impl TaskReportRepository for MemoryTaskReportRepository {
    async fn create(&self, report: &TaskReport) -> Result<(), Error> {
        let mut map = self.storage.lock().unwrap();
        if map.values().any(|r| r.message_id == report.message_id) {
            return Ok(());
        }
        map.insert(report.report_id, report.clone());
        Ok(())
    }

    async fn get_by_message_id(&self, message_id: &str) -> Result<Option<TaskReport>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map.values().find(|r| r.message_id == message_id).cloned())
    }

    async fn update(&self, report: &TaskReport) -> Result<(), Error> {
        let mut map = self.storage.lock().unwrap();
        map.insert(report.report_id, report.clone());
        Ok(())
    }

    async fn find_pending_in_channel(
        &self,
        faction_id: Uuid,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<TaskReport>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map
            .values()
            .filter(|r| {
                r.faction_id == faction_id
                    && r.channel_id == channel_id
                    && r.status == TaskReportStatus::Pending
                    && r.submitted_at >= since
            })
            .max_by_key(|r| r.submitted_at)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryBotConfigRepository {
    storage: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl BotConfigRepository for MemoryBotConfigRepository {
    async fn set_value(&self, config_key: &str, config_value: &str) -> Result<(), Error> {
        let mut map = self.storage.lock().unwrap();
        map.insert(config_key.to_string(), config_value.to_string());
        Ok(())
    }

    async fn get_value(&self, config_key: &str) -> Result<Option<String>, Error> {
        let map = self.storage.lock().unwrap();
        Ok(map.get(config_key).cloned())
    }

    async fn list_all(&self) -> Result<Vec<(String, String)>, Error> {
        let map = self.storage.lock().unwrap();
        let mut out: Vec<(String, String)> =
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        out.sort();
        Ok(out)
    }
}
