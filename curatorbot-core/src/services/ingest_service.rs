// File: src/services/ingest_service.rs
//
// Subscribes to the event bus and routes connector events through the
// pipeline:
//  1) look up the faction (unknown guilds are dropped quietly),
//  2) classify help candidates and open tracking,
//  3) record curator activity and attempt resolution,
//  4) run the task-report intake/verification paths.
// One bad event never halts the loop.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use curatorbot_common::models::events::{
    CuratorActionEvent, CuratorActionKind, HelpCandidateEvent,
};
use curatorbot_common::models::{ActivityKind, Curator, FactionContext};
use curatorbot_common::traits::repository_traits::{CuratorRepository, FactionRepository};
use curatorbot_common::Error;

use crate::eventbus::{BotEvent, EventBus};
use crate::services::activity_service::ActivityRecorder;
use crate::services::classifier::KeywordClassifier;
use crate::services::task_service::TaskReportService;
use crate::services::tracking_service::{OpenOutcome, ResolveOutcome, ResponseTracker};
use crate::tasks::escalation::EscalationScheduler;

pub struct IngestService {
    classifier: KeywordClassifier,
    tracker: Arc<ResponseTracker>,
    recorder: Arc<ActivityRecorder>,
    task_service: Arc<TaskReportService>,
    curator_repo: Arc<dyn CuratorRepository>,
    faction_repo: Arc<dyn FactionRepository>,
    scheduler: Arc<EscalationScheduler>,
    event_bus: Arc<EventBus>,
}

impl IngestService {
    pub fn new(
        classifier: KeywordClassifier,
        tracker: Arc<ResponseTracker>,
        recorder: Arc<ActivityRecorder>,
        task_service: Arc<TaskReportService>,
        curator_repo: Arc<dyn CuratorRepository>,
        faction_repo: Arc<dyn FactionRepository>,
        scheduler: Arc<EscalationScheduler>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            classifier,
            tracker,
            recorder,
            task_service,
            curator_repo,
            faction_repo,
            scheduler,
            event_bus,
        }
    }

    /// Subscribe to the bus and process events until shutdown. The
    /// subscription is taken before the loop task starts so no event
    /// published after this call can be missed.
    pub async fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.event_bus.subscribe(None).await;
        tokio::spawn(async move {
            let mut shutdown_rx = self.event_bus.shutdown_rx.clone();
            loop {
                tokio::select! {
                    maybe_evt = rx.recv() => {
                        match maybe_evt {
                            Some(evt) => {
                                if let Err(e) = self.handle_event(evt).await {
                                    error!("event processing error: {:?}", e);
                                }
                            }
                            None => break,
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("ingest loop shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }

    pub async fn handle_event(&self, event: BotEvent) -> Result<(), Error> {
        match event {
            BotEvent::HelpCandidate(evt) => self.handle_help_candidate(evt).await,
            BotEvent::CuratorAction(evt) => self.handle_curator_action(evt).await,
            // Escalation notices are for the notification collaborator;
            // ticks and system messages carry nothing for this pipeline.
            _ => Ok(()),
        }
    }

    async fn handle_help_candidate(&self, evt: HelpCandidateEvent) -> Result<(), Error> {
        let Some(faction) = self.lookup_faction(&evt.guild_id).await? else {
            return Ok(());
        };

        if self
            .classifier
            .is_help_request(&evt.text, &evt.mentioned_role_ids, &faction)
        {
            if let OpenOutcome::Created(record) = self.tracker.open_tracking(&faction, &evt).await? {
                self.scheduler.schedule(record.tracking_id);
            }
        }

        // Member-posted task reports live in the completion channel; curator
        // messages there are confirmations, handled on the action path.
        if faction.completed_tasks_channel_id.as_deref() == Some(evt.channel_id.as_str()) {
            let author = self
                .curator_repo
                .get_by_platform_user_id(&evt.author_id)
                .await?;
            if author.is_none() {
                self.task_service.process_report(&faction, &evt).await?;
            }
        }

        Ok(())
    }

    async fn handle_curator_action(&self, evt: CuratorActionEvent) -> Result<(), Error> {
        let Some(faction) = self.lookup_faction(&evt.guild_id).await? else {
            return Ok(());
        };

        let Some(curator) = self
            .curator_repo
            .get_by_platform_user_id(&evt.platform_user_id)
            .await?
        else {
            debug!(
                "action by {} in {} is not from a recognized curator; dropping",
                evt.platform_user_id, faction.name
            );
            return Ok(());
        };

        self.recorder
            .record(
                &curator,
                &faction,
                activity_kind(&evt),
                &evt.channel_id,
                &evt.message_id,
                evt.text.as_deref(),
                evt.timestamp,
            )
            .await?;

        if evt.kind != CuratorActionKind::Reaction
            && faction.completed_tasks_channel_id.as_deref() == Some(evt.channel_id.as_str())
        {
            self.task_service
                .verify_report(&faction, &curator, &evt)
                .await?;
        }

        self.resolve(&faction, &curator, &evt).await
    }

    async fn resolve(
        &self,
        faction: &FactionContext,
        curator: &Curator,
        evt: &CuratorActionEvent,
    ) -> Result<(), Error> {
        match self.tracker.resolve_action(faction, curator, evt).await? {
            ResolveOutcome::Resolved(record) => {
                self.scheduler.cancel(record.tracking_id);
            }
            ResolveOutcome::NoCandidate
            | ResolveOutcome::IgnoredLate(_)
            | ResolveOutcome::IgnoredRace(_) => {}
        }
        Ok(())
    }

    async fn lookup_faction(&self, guild_id: &str) -> Result<Option<FactionContext>, Error> {
        let faction = self.faction_repo.get_by_guild_id(guild_id).await?;
        if faction.is_none() {
            debug!("event for unmonitored guild {}; dropping", guild_id);
        }
        Ok(faction)
    }
}

fn activity_kind(evt: &CuratorActionEvent) -> ActivityKind {
    match evt.kind {
        CuratorActionKind::Reaction => ActivityKind::Reaction,
        CuratorActionKind::Reply => ActivityKind::Reply,
        CuratorActionKind::Message => {
            if evt.referenced_message_id.is_some() {
                ActivityKind::Reply
            } else {
                ActivityKind::Message
            }
        }
    }
}
