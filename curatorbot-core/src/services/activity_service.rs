// File: src/services/activity_service.rs

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use curatorbot_common::models::{ActivityKind, ActivityRecord, Curator, FactionContext};
use curatorbot_common::traits::repository_traits::ActivityRepository;
use curatorbot_common::Error;

use crate::config::ActivityPoints;

/// Longest content excerpt stored on an activity row.
const ACTIVITY_CONTENT_MAX: usize = 1000;

/// Turns an observed curator action into a point-valued activity record and
/// appends it to the activity log. The point value is snapshotted here so a
/// later configuration change never re-prices history.
pub struct ActivityRecorder {
    activity_repo: Arc<dyn ActivityRepository>,
    points: ActivityPoints,
}

impl ActivityRecorder {
    pub fn new(activity_repo: Arc<dyn ActivityRepository>, points: ActivityPoints) -> Self {
        Self {
            activity_repo,
            points,
        }
    }

    pub async fn record(
        &self,
        curator: &Curator,
        faction: &FactionContext,
        kind: ActivityKind,
        channel_id: &str,
        message_id: &str,
        content: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Result<ActivityRecord, Error> {
        let record = ActivityRecord {
            activity_id: Uuid::new_v4(),
            curator_id: curator.curator_id,
            faction_id: faction.faction_id,
            kind,
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            content: content.map(|c| truncate(c, ACTIVITY_CONTENT_MAX)),
            points: self.points.for_kind(kind),
            timestamp,
        };

        // A failed append is reported but never stops the ingestion path.
        if let Err(e) = self.activity_repo.insert(&record).await {
            error!(
                "failed to persist {} activity for curator {}: {:?}",
                kind.as_str(),
                curator.display_name,
                e
            );
        } else {
            info!(
                "activity logged: {} - {} in {} (+{})",
                curator.display_name,
                kind.as_str(),
                faction.name,
                record.points
            );
        }

        Ok(record)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    let mut out = s.to_string();
    let cut = out
        .char_indices()
        .map(|(i, _)| i)
        .nth(max_chars)
        .unwrap_or(out.len());
    out.truncate(cut);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryActivityRepository;
    use curatorbot_common::traits::repository_traits::ActivityRepository;

    #[tokio::test]
    async fn test_points_snapshot_at_record_time() {
        let repo = Arc::new(MemoryActivityRepository::default());
        let recorder = ActivityRecorder::new(repo.clone(), ActivityPoints::default());

        let curator = Curator::new("42", "Anna");
        let faction = FactionContext::new("100", "Government");

        let rec = recorder
            .record(
                &curator,
                &faction,
                ActivityKind::Message,
                "chan-1",
                "msg-1",
                Some("hello"),
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(rec.points, 3);

        let rec = recorder
            .record(
                &curator,
                &faction,
                ActivityKind::TaskVerification,
                "chan-2",
                "msg-2",
                None,
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(rec.points, 5);

        let stored = repo
            .list_for_curator(
                curator.curator_id,
                Utc::now() - chrono::Duration::minutes(1),
                Utc::now() + chrono::Duration::minutes(1),
            )
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
    }
}
