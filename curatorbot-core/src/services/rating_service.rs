// File: src/services/rating_service.rs
//
// Score computation over the activity and resolution logs. Everything here
// is a read: snapshots are recomputed on demand from the append-only logs
// and never stored back.

use std::sync::Arc;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use curatorbot_common::models::rating::default_rating_bands;
use curatorbot_common::models::{
    ActivityCounts, ActivityKind, Curator, RatingBand, ScoreSnapshot,
};
use curatorbot_common::traits::repository_traits::{
    ActivityRepository, CuratorRepository, TrackingRepository,
};
use curatorbot_common::Error;

use crate::config::MonitorConfig;

/// Aggregated response-time statistics for one curator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseStats {
    pub average_seconds: i64,
    pub response_count: usize,
    pub formatted_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub curator: Curator,
    pub snapshot: ScoreSnapshot,
    pub average_response: Option<ResponseStats>,
}

/// One day of a curator's breakdown, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub score: i64,
    pub activity_counts: ActivityCounts,
    pub total_activities: usize,
    pub response_count: usize,
    pub average_response_seconds: Option<i64>,
}

pub struct RatingService {
    activity_repo: Arc<dyn ActivityRepository>,
    tracking_repo: Arc<dyn TrackingRepository>,
    curator_repo: Arc<dyn CuratorRepository>,
    config: Arc<MonitorConfig>,
}

impl RatingService {
    pub fn new(
        activity_repo: Arc<dyn ActivityRepository>,
        tracking_repo: Arc<dyn TrackingRepository>,
        curator_repo: Arc<dyn CuratorRepository>,
        config: Arc<MonitorConfig>,
    ) -> Self {
        Self {
            activity_repo,
            tracking_repo,
            curator_repo,
            config,
        }
    }

    /// Windowed score: sum of stored activity points plus the response-time
    /// bonus, floored at zero. The raw parts stay on the snapshot for
    /// diagnostics.
    pub async fn curator_score(
        &self,
        curator_id: Uuid,
        window_days: i64,
    ) -> Result<ScoreSnapshot, Error> {
        let until = Utc::now();
        let since = until - Duration::days(window_days);

        let activities = self
            .activity_repo
            .list_for_curator(curator_id, since, until)
            .await?;

        let mut base_score: i64 = 0;
        let mut counts = ActivityCounts::default();
        for a in &activities {
            base_score += a.points as i64;
            match a.kind {
                ActivityKind::Message => counts.messages += 1,
                ActivityKind::Reaction => counts.reactions += 1,
                ActivityKind::Reply => counts.replies += 1,
                ActivityKind::TaskVerification => counts.task_verifications += 1,
            }
        }

        let response_bonus = self.response_bonus(curator_id, since, until).await?;
        let total_score = (base_score + response_bonus).max(0);

        Ok(ScoreSnapshot {
            curator_id,
            period_days: window_days,
            base_score,
            response_bonus,
            total_score,
            activity_counts: counts,
            band: self.resolve_band(total_score),
        })
    }

    /// +2 per fast response, 0 in the neutral band, -1 per slow response.
    async fn response_bonus(
        &self,
        curator_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<i64, Error> {
        let resolved = self
            .tracking_repo
            .list_resolved_for_curator(curator_id, since, until)
            .await?;

        let mut bonus: i64 = 0;
        for record in resolved {
            let Some(resolution) = record.resolution else {
                continue;
            };
            let latency = resolution.response_time_seconds;
            if latency <= self.config.response_good_secs {
                bonus += 2;
            } else if latency < self.config.response_poor_secs {
                // Neutral band.
            } else {
                bonus -= 1;
            }
        }
        Ok(bonus)
    }

    /// Walk the bands highest minimum first; the first satisfied band wins.
    /// A score below every configured minimum gets the lowest band.
    pub fn resolve_band(&self, score: i64) -> RatingBand {
        let bands = if self.config.rating_bands.is_empty() {
            default_rating_bands()
        } else {
            self.config.rating_bands.clone()
        };
        for band in &bands {
            if score >= band.min_score {
                return band.clone();
            }
        }
        bands.last().cloned().expect("band set is never empty")
    }

    pub async fn average_response_time(
        &self,
        curator_id: Uuid,
        window_days: i64,
    ) -> Result<Option<ResponseStats>, Error> {
        let until = Utc::now();
        let since = until - Duration::days(window_days);
        let resolved = self
            .tracking_repo
            .list_resolved_for_curator(curator_id, since, until)
            .await?;

        let latencies: Vec<i64> = resolved
            .iter()
            .filter_map(|r| r.resolution.as_ref())
            .map(|o| o.response_time_seconds)
            .collect();
        if latencies.is_empty() {
            return Ok(None);
        }

        let average = latencies.iter().sum::<i64>() / latencies.len() as i64;
        Ok(Some(ResponseStats {
            average_seconds: average,
            response_count: latencies.len(),
            formatted_time: format_duration(average),
        }))
    }

    /// Active curators ranked by total score, ties broken by curator id so
    /// the ordering is stable across calls.
    pub async fn leaderboard(
        &self,
        limit: usize,
        window_days: i64,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        let curators = self.curator_repo.list_active().await?;
        let mut entries = Vec::with_capacity(curators.len());
        for curator in curators {
            let snapshot = self.curator_score(curator.curator_id, window_days).await?;
            let average_response = self
                .average_response_time(curator.curator_id, window_days)
                .await?;
            entries.push(LeaderboardEntry {
                curator,
                snapshot,
                average_response,
            });
        }
        entries.sort_by(|a, b| {
            b.snapshot
                .total_score
                .cmp(&a.snapshot.total_score)
                .then(a.curator.curator_id.cmp(&b.curator.curator_id))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    /// Per-day stats for the trailing `days` days, oldest day first.
    pub async fn daily_breakdown(
        &self,
        curator_id: Uuid,
        days: i64,
    ) -> Result<Vec<DailyStats>, Error> {
        let until = Utc::now();
        let first_day = until.date_naive() - Duration::days(days - 1);
        let since = first_day
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc();

        let activities = self
            .activity_repo
            .list_for_curator(curator_id, since, until)
            .await?;
        let resolved = self
            .tracking_repo
            .list_resolved_for_curator(curator_id, since, until)
            .await?;

        let mut out = Vec::with_capacity(days as usize);
        for offset in 0..days {
            let date = first_day + Duration::days(offset);

            let mut score: i64 = 0;
            let mut counts = ActivityCounts::default();
            let mut total_activities = 0usize;
            for a in activities.iter().filter(|a| a.timestamp.date_naive() == date) {
                score += a.points as i64;
                total_activities += 1;
                match a.kind {
                    ActivityKind::Message => counts.messages += 1,
                    ActivityKind::Reaction => counts.reactions += 1,
                    ActivityKind::Reply => counts.replies += 1,
                    ActivityKind::TaskVerification => counts.task_verifications += 1,
                }
            }

            let latencies: Vec<i64> = resolved
                .iter()
                .filter_map(|r| r.resolution.as_ref())
                .filter(|o| o.response_timestamp.date_naive() == date)
                .map(|o| o.response_time_seconds)
                .collect();
            let average_response_seconds = if latencies.is_empty() {
                None
            } else {
                Some(latencies.iter().sum::<i64>() / latencies.len() as i64)
            };

            out.push(DailyStats {
                date,
                score,
                activity_counts: counts,
                total_activities,
                response_count: latencies.len(),
                average_response_seconds,
            });
        }
        Ok(out)
    }
}

/// Human-readable duration with the localized declensions the dashboard
/// shows.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{} сек", seconds)
    } else if seconds < 3600 {
        let minutes = seconds / 60;
        if minutes == 1 {
            "1 минута".to_string()
        } else if minutes < 5 {
            format!("{} минуты", minutes)
        } else {
            format!("{} минут", minutes)
        }
    } else if seconds < 86400 {
        let hours = seconds / 3600;
        if hours == 1 {
            "1 час".to_string()
        } else if hours < 5 {
            format!("{} часа", hours)
        } else {
            format!("{} часов", hours)
        }
    } else {
        let days = seconds / 86400;
        if days == 1 {
            "1 день".to_string()
        } else if days < 5 {
            format!("{} дня", days)
        } else {
            format!("{} дней", days)
        }
    }
}
