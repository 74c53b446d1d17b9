// File: src/services/tracking_service.rs
//
// The response-correlation state machine. A help request opens a tracking
// record; the first matching curator action resolves it; the escalation
// scheduler escalates it when nothing matches in time. A record leaves OPEN
// at most once — the transition is a compare-and-set on the open-record map,
// so a resolve racing an escalation has exactly one winner.

use std::sync::Arc;
use chrono::Duration;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use curatorbot_common::models::events::{CuratorActionEvent, CuratorActionKind, HelpCandidateEvent};
use curatorbot_common::models::{
    Curator, FactionContext, ResolutionOutcome, ResponseKind, TrackingRecord, TrackingState,
};
use curatorbot_common::traits::repository_traits::TrackingRepository;
use curatorbot_common::Error;

/// Result of an open attempt. Duplicate delivery of the same message id is a
/// no-op, not an error.
#[derive(Debug)]
pub enum OpenOutcome {
    Created(TrackingRecord),
    AlreadyTracked(Uuid),
}

/// Result of matching a curator action against the open records.
#[derive(Debug)]
pub enum ResolveOutcome {
    Resolved(TrackingRecord),
    /// Nothing open matched this action.
    NoCandidate,
    /// The action referenced a record that already left OPEN.
    IgnoredLate(Uuid),
    /// A concurrent transition won the record first.
    IgnoredRace(Uuid),
}

#[derive(Debug)]
pub enum EscalateOutcome {
    Escalated(TrackingRecord),
    /// The record resolved (or already escalated) before the timer check.
    IgnoredNotOpen(Uuid),
}

pub struct ResponseTracker {
    tracking_repo: Arc<dyn TrackingRepository>,
    /// Records currently OPEN, keyed by tracking id.
    open_records: DashMap<Uuid, TrackingRecord>,
    /// mention_message_id -> tracking id, for idempotent opens and reply lookups.
    open_by_message: DashMap<String, Uuid>,
    lookback: Duration,
}

impl ResponseTracker {
    pub fn new(tracking_repo: Arc<dyn TrackingRepository>, lookback_secs: i64) -> Self {
        Self {
            tracking_repo,
            open_records: DashMap::new(),
            open_by_message: DashMap::new(),
            lookback: Duration::seconds(lookback_secs),
        }
    }

    /// Reload OPEN records from storage (after a restart) and return their
    /// ids so escalation timers can be rescheduled.
    pub async fn recover_open(&self) -> Result<Vec<Uuid>, Error> {
        let open = self.tracking_repo.list_open().await?;
        let mut ids = Vec::with_capacity(open.len());
        for record in open {
            ids.push(record.tracking_id);
            self.open_by_message
                .insert(record.mention_message_id.clone(), record.tracking_id);
            self.open_records.insert(record.tracking_id, record);
        }
        if !ids.is_empty() {
            info!("recovered {} open tracking records", ids.len());
        }
        Ok(ids)
    }

    /// Open a tracking record for a classified help request. Keyed by the
    /// originating message id: a second attempt for the same message returns
    /// the existing record id.
    pub async fn open_tracking(
        &self,
        faction: &FactionContext,
        evt: &HelpCandidateEvent,
    ) -> Result<OpenOutcome, Error> {
        if let Some(existing) = self.open_by_message.get(&evt.message_id) {
            return Ok(OpenOutcome::AlreadyTracked(*existing));
        }

        // A record that already ran to a terminal state is no longer in the
        // open maps; the store remembers it. A storage error here only costs
        // us the duplicate check, never the pipeline.
        match self.tracking_repo.get_by_mention_message_id(&evt.message_id).await {
            Ok(Some(existing)) => return Ok(OpenOutcome::AlreadyTracked(existing.tracking_id)),
            Ok(None) => {}
            Err(e) => warn!("duplicate-open check failed for {}: {:?}", evt.message_id, e),
        }

        let record = TrackingRecord::open(
            faction.faction_id,
            Some(evt.channel_id.as_str()),
            &evt.message_id,
            &evt.author_id,
            evt.author_name.as_deref(),
            &evt.text,
            evt.timestamp,
        );

        // Entry is the atomic claim on the message id; a concurrent opener
        // for the same message loses here and gets AlreadyTracked.
        match self.open_by_message.entry(evt.message_id.clone()) {
            Entry::Occupied(e) => return Ok(OpenOutcome::AlreadyTracked(*e.get())),
            Entry::Vacant(v) => {
                v.insert(record.tracking_id);
            }
        }
        self.open_records.insert(record.tracking_id, record.clone());

        if let Err(e) = self.tracking_repo.create(&record).await {
            error!(
                "failed to persist tracking record {}: {:?}",
                record.tracking_id, e
            );
        }
        info!(
            "response tracking created for message {} in {}",
            evt.message_id, faction.name
        );
        Ok(OpenOutcome::Created(record))
    }

    /// Match a curator action against the open records and resolve at most
    /// one of them.
    pub async fn resolve_action(
        &self,
        faction: &FactionContext,
        curator: &Curator,
        evt: &CuratorActionEvent,
    ) -> Result<ResolveOutcome, Error> {
        let candidate = match &evt.referenced_message_id {
            Some(ref_id) => match self.referenced_candidate(faction, evt, ref_id).await? {
                ReferencedCandidate::Open(id) => Some(id),
                ReferencedCandidate::Terminal(id) => {
                    info!(
                        "ignored late response by {} to tracking {}",
                        curator.display_name, id
                    );
                    return Ok(ResolveOutcome::IgnoredLate(id));
                }
                ReferencedCandidate::NotApplicable => return Ok(ResolveOutcome::NoCandidate),
                // The reply chain points at an untracked message; fall back
                // to the recency heuristic like an unlinked action.
                ReferencedCandidate::Unknown => self.heuristic_candidate(faction, evt),
            },
            None => self.heuristic_candidate(faction, evt),
        };

        let Some(tracking_id) = candidate else {
            return Ok(ResolveOutcome::NoCandidate);
        };

        // CAS out of OPEN: remove_if is atomic per entry, so exactly one of
        // any concurrent resolve/escalate takes the record.
        match self
            .open_records
            .remove_if(&tracking_id, |_, r| r.state == TrackingState::Open)
        {
            Some((_, mut record)) => {
                let latency = (evt.timestamp - record.mention_timestamp).num_seconds();
                record.state = TrackingState::Resolved;
                record.resolution = Some(ResolutionOutcome {
                    curator_id: curator.curator_id,
                    response_message_id: evt.message_id.clone(),
                    response_timestamp: evt.timestamp,
                    response_kind: response_kind(evt.kind),
                    response_time_seconds: latency,
                });
                self.open_by_message.remove(&record.mention_message_id);

                if let Err(e) = self.tracking_repo.update(&record).await {
                    error!(
                        "failed to persist resolution of {}: {:?}",
                        record.tracking_id, e
                    );
                }
                info!(
                    "response tracked: {} answered {} in {}s",
                    curator.display_name, record.mention_message_id, latency
                );
                Ok(ResolveOutcome::Resolved(record))
            }
            None => {
                debug!(
                    "ignored race: tracking {} was taken by a concurrent transition",
                    tracking_id
                );
                Ok(ResolveOutcome::IgnoredRace(tracking_id))
            }
        }
    }

    /// Escalate a record if it is still OPEN at fire time. The state is
    /// re-checked here, not at schedule time.
    pub async fn escalate(&self, tracking_id: Uuid) -> Result<EscalateOutcome, Error> {
        match self
            .open_records
            .remove_if(&tracking_id, |_, r| r.state == TrackingState::Open)
        {
            Some((_, mut record)) => {
                record.state = TrackingState::Escalated;
                self.open_by_message.remove(&record.mention_message_id);

                if let Err(e) = self.tracking_repo.update(&record).await {
                    error!(
                        "failed to persist escalation of {}: {:?}",
                        record.tracking_id, e
                    );
                }
                info!(
                    "tracking {} escalated after timeout (message {})",
                    record.tracking_id, record.mention_message_id
                );
                Ok(EscalateOutcome::Escalated(record))
            }
            None => {
                debug!(
                    "escalation fired for {} but the record is no longer open",
                    tracking_id
                );
                Ok(EscalateOutcome::IgnoredNotOpen(tracking_id))
            }
        }
    }

    /// Open records, oldest mention first. Query-only dashboard surface.
    pub fn list_pending(&self) -> Vec<TrackingRecord> {
        let mut pending: Vec<TrackingRecord> = self
            .open_records
            .iter()
            .map(|e| e.value().clone())
            .collect();
        pending.sort_by(|a, b| {
            a.mention_timestamp
                .cmp(&b.mention_timestamp)
                .then(a.tracking_id.cmp(&b.tracking_id))
        });
        pending
    }

    pub fn open_count(&self) -> usize {
        self.open_records.len()
    }

    async fn referenced_candidate(
        &self,
        faction: &FactionContext,
        evt: &CuratorActionEvent,
        ref_id: &str,
    ) -> Result<ReferencedCandidate, Error> {
        // Copy the id out so the message-index lock is released before the
        // record map is touched; holding both invites lock-order inversions
        // against the resolve path.
        let open_id = self.open_by_message.get(ref_id).map(|entry| *entry);
        if let Some(id) = open_id {
            if let Some(record) = self.open_records.get(&id) {
                if record.faction_id != faction.faction_id {
                    return Ok(ReferencedCandidate::NotApplicable);
                }
                // Self-responses never resolve, and a response from before
                // the mention cannot be a response to it.
                if record.mention_author_id == evt.platform_user_id
                    || evt.timestamp < record.mention_timestamp
                {
                    return Ok(ReferencedCandidate::NotApplicable);
                }
            }
            return Ok(ReferencedCandidate::Open(id));
        }

        match self.tracking_repo.get_by_mention_message_id(ref_id).await {
            Ok(Some(record)) if record.state.is_terminal() => {
                Ok(ReferencedCandidate::Terminal(record.tracking_id))
            }
            Ok(_) => Ok(ReferencedCandidate::Unknown),
            Err(e) => {
                warn!("referenced-record lookup failed for {}: {:?}", ref_id, e);
                Ok(ReferencedCandidate::Unknown)
            }
        }
    }

    /// Most recent OPEN record in the same faction inside the lookback
    /// window, preferring records from the action's own channel. Nearest
    /// mention timestamp wins; equal timestamps fall back to tracking id for
    /// determinism.
    fn heuristic_candidate(
        &self,
        faction: &FactionContext,
        evt: &CuratorActionEvent,
    ) -> Option<Uuid> {
        let mut best: Option<(bool, chrono::DateTime<chrono::Utc>, Uuid)> = None;
        for entry in self.open_records.iter() {
            let r = entry.value();
            if r.faction_id != faction.faction_id {
                continue;
            }
            if r.mention_author_id == evt.platform_user_id {
                continue;
            }
            if evt.timestamp < r.mention_timestamp {
                continue;
            }
            if evt.timestamp - r.mention_timestamp > self.lookback {
                continue;
            }
            let same_channel = r.channel_id.as_deref() == Some(evt.channel_id.as_str());
            let key = (same_channel, r.mention_timestamp, r.tracking_id);
            let better = match &best {
                None => true,
                Some((b_chan, b_ts, b_id)) => {
                    key.0
                        .cmp(b_chan)
                        .then(key.1.cmp(b_ts))
                        .then(b_id.cmp(&key.2))
                        == std::cmp::Ordering::Greater
                }
            };
            if better {
                best = Some(key);
            }
        }
        best.map(|(_, _, id)| id)
    }
}

enum ReferencedCandidate {
    Open(Uuid),
    Terminal(Uuid),
    Unknown,
    NotApplicable,
}

fn response_kind(kind: CuratorActionKind) -> ResponseKind {
    match kind {
        CuratorActionKind::Message => ResponseKind::Message,
        CuratorActionKind::Reply => ResponseKind::Reply,
        CuratorActionKind::Reaction => ResponseKind::Reaction,
    }
}
