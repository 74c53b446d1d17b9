// File: curatorbot-core/src/context.rs
//
// Explicit composition root. Everything a component needs — configuration,
// storage handles, the event bus, the scheduler — is passed in here and
// threaded through constructors; nothing in the engine reaches for process
// globals.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::warn;
use uuid::Uuid;

use curatorbot_common::traits::repository_traits::{
    ActivityRepository, BotConfigRepository, CuratorRepository, FactionRepository,
    TaskReportRepository, TrackingRepository,
};
use curatorbot_common::Error;

use crate::config::MonitorConfig;
use crate::eventbus::EventBus;
use crate::services::{
    ActivityRecorder, IngestService, KeywordClassifier, RatingService, ResponseTracker,
    TaskReportService,
};
use crate::tasks::escalation::{spawn_escalation_worker, EscalationScheduler};

/// The storage collaborator, one handle per entity family.
#[derive(Clone)]
pub struct StorageHandles {
    pub curators: Arc<dyn CuratorRepository>,
    pub factions: Arc<dyn FactionRepository>,
    pub trackings: Arc<dyn TrackingRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub task_reports: Arc<dyn TaskReportRepository>,
    pub bot_config: Arc<dyn BotConfigRepository>,
}

pub struct PipelineHandles {
    pub ingest: JoinHandle<()>,
    pub escalation_worker: JoinHandle<()>,
}

pub struct ServiceContext {
    pub config: Arc<MonitorConfig>,
    pub storage: StorageHandles,
    pub event_bus: Arc<EventBus>,
    pub scheduler: Arc<EscalationScheduler>,
    pub tracker: Arc<ResponseTracker>,
    pub recorder: Arc<ActivityRecorder>,
    pub task_service: Arc<TaskReportService>,
    pub rating_service: Arc<RatingService>,
    fire_rx: Mutex<Option<mpsc::UnboundedReceiver<Uuid>>>,
}

impl ServiceContext {
    /// Load configuration and wire the services. No background work starts
    /// until `spawn_pipeline`.
    pub async fn build(storage: StorageHandles, event_bus: Arc<EventBus>) -> Result<Self, Error> {
        let config = MonitorConfig::load(storage.bot_config.as_ref()).await?;

        let (scheduler, fire_rx) =
            EscalationScheduler::new(Duration::from_secs(config.escalation_timeout_secs));
        let tracker = Arc::new(ResponseTracker::new(
            storage.trackings.clone(),
            config.resolve_lookback_secs,
        ));
        let recorder = Arc::new(ActivityRecorder::new(
            storage.activities.clone(),
            config.points,
        ));
        let task_service = Arc::new(TaskReportService::new(
            storage.task_reports.clone(),
            recorder.clone(),
        ));
        let rating_service = Arc::new(RatingService::new(
            storage.activities.clone(),
            storage.trackings.clone(),
            storage.curators.clone(),
            config.clone(),
        ));

        Ok(Self {
            config,
            storage,
            event_bus,
            scheduler,
            tracker,
            recorder,
            task_service,
            rating_service,
            fire_rx: Mutex::new(Some(fire_rx)),
        })
    }

    /// Recover open tracking records, reschedule their timers, and start the
    /// ingest loop and escalation worker.
    pub async fn spawn_pipeline(&self) -> Result<PipelineHandles, Error> {
        let fire_rx = self
            .fire_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::Tracking("pipeline already spawned".to_string()))?;

        match self.tracker.recover_open().await {
            Ok(ids) => {
                for id in ids {
                    self.scheduler.schedule(id);
                }
            }
            Err(e) => warn!("open-record recovery failed; continuing empty: {:?}", e),
        }

        let escalation_worker = spawn_escalation_worker(
            fire_rx,
            self.tracker.clone(),
            self.storage.factions.clone(),
            self.event_bus.clone(),
        );

        let ingest = Arc::new(IngestService::new(
            KeywordClassifier::new(&self.config.keywords),
            self.tracker.clone(),
            self.recorder.clone(),
            self.task_service.clone(),
            self.storage.curators.clone(),
            self.storage.factions.clone(),
            self.scheduler.clone(),
            self.event_bus.clone(),
        ))
        .spawn()
        .await;

        Ok(PipelineHandles {
            ingest,
            escalation_worker,
        })
    }
}
