// File: src/tasks/escalation.rs
//
// One cancellable delayed task per open tracking record. A fired timer never
// touches tracker state itself: it enqueues the record id, and the worker
// loop re-checks the record's state through the tracker's compare-and-set at
// fire time. Cancel racing a fire is harmless on both sides.

use std::sync::Arc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use curatorbot_common::models::events::EscalationNotice;
use curatorbot_common::traits::repository_traits::FactionRepository;

use crate::eventbus::{BotEvent, EventBus};
use crate::services::tracking_service::{EscalateOutcome, ResponseTracker};

pub struct EscalationScheduler {
    timers: DashMap<Uuid, JoinHandle<()>>,
    fire_tx: mpsc::UnboundedSender<Uuid>,
    timeout: Duration,
}

impl EscalationScheduler {
    /// Returns the scheduler and the receiver the worker loop drains.
    pub fn new(timeout: Duration) -> (Arc<Self>, mpsc::UnboundedReceiver<Uuid>) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                timers: DashMap::new(),
                fire_tx,
                timeout,
            }),
            fire_rx,
        )
    }

    /// Start the timer for a record. A second schedule for the same id is a
    /// no-op; the original deadline stands.
    pub fn schedule(self: &Arc<Self>, tracking_id: Uuid) {
        match self.timers.entry(tracking_id) {
            Entry::Occupied(_) => {
                debug!("timer already scheduled for tracking {}", tracking_id);
            }
            Entry::Vacant(entry) => {
                let this = Arc::clone(self);
                entry.insert(tokio::spawn(async move {
                    sleep(this.timeout).await;
                    this.timers.remove(&tracking_id);
                    if this.fire_tx.send(tracking_id).is_err() {
                        warn!("escalation worker gone; dropping fire for {}", tracking_id);
                    }
                }));
            }
        }
    }

    /// Cancel the pending timer, if any. O(1) and idempotent: cancelling an
    /// unknown or already-fired id does nothing.
    pub fn cancel(&self, tracking_id: Uuid) {
        if let Some((_, handle)) = self.timers.remove(&tracking_id) {
            handle.abort();
            debug!("escalation timer cancelled for tracking {}", tracking_id);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }
}

/// Consume fired timers, drive the tracker's escalate transition, and publish
/// one `EscalationNotice` per escalated record. Notification delivery is
/// strictly downstream of the state transition: a failed faction lookup or a
/// full bus never rolls the record back.
pub fn spawn_escalation_worker(
    mut fire_rx: mpsc::UnboundedReceiver<Uuid>,
    tracker: Arc<ResponseTracker>,
    faction_repo: Arc<dyn FactionRepository>,
    event_bus: Arc<EventBus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(tracking_id) = fire_rx.recv().await {
            let record = match tracker.escalate(tracking_id).await {
                Ok(EscalateOutcome::Escalated(record)) => record,
                Ok(EscalateOutcome::IgnoredNotOpen(_)) => continue,
                Err(e) => {
                    error!("escalate transition failed for {}: {:?}", tracking_id, e);
                    continue;
                }
            };

            let (faction_name, attention_role_id) =
                match faction_repo.get(record.faction_id).await {
                    Ok(Some(f)) => (f.name, f.attention_role_id),
                    Ok(None) => {
                        warn!(
                            "faction {} missing for escalation notice {}",
                            record.faction_id, record.tracking_id
                        );
                        (String::new(), None)
                    }
                    Err(e) => {
                        error!(
                            "faction lookup failed for escalation notice {}: {:?}",
                            record.tracking_id, e
                        );
                        (String::new(), None)
                    }
                };

            let waited_seconds =
                (chrono::Utc::now() - record.mention_timestamp).num_seconds().max(0);
            let notice = EscalationNotice {
                faction_id: record.faction_id,
                faction_name,
                tracking_id: record.tracking_id,
                waited_seconds,
                author_id: record.mention_author_id.clone(),
                author_name: record.mention_author_name.clone(),
                content: record.mention_content.clone(),
                attention_role_id,
            };
            info!(
                "escalation notice published for tracking {} ({}s waited)",
                notice.tracking_id, notice.waited_seconds
            );
            event_bus.publish(BotEvent::Escalation(notice)).await;
        }
    })
}
