// File: curatorbot-core/src/config.rs
//
// Runtime configuration for the monitoring engine, loaded from the
// key-value bot_config store. Every key has a built-in default; a missing or
// malformed value falls back to the default and is logged, never an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use curatorbot_common::models::rating::{default_rating_bands, RatingBand};
use curatorbot_common::models::ActivityKind;
use curatorbot_common::traits::repository_traits::BotConfigRepository;
use curatorbot_common::Error;

pub const KEY_KEYWORDS: &str = "mention_keywords";
pub const KEY_POINTS: &str = "activity_points";
pub const KEY_GOOD_SECS: &str = "response_time_good_seconds";
pub const KEY_POOR_SECS: &str = "response_time_poor_seconds";
pub const KEY_TIMEOUT_SECS: &str = "notification_timeout_seconds";
pub const KEY_LOOKBACK_SECS: &str = "resolve_lookback_seconds";
pub const KEY_RATING_BANDS: &str = "rating_bands";

const DEFAULT_KEYWORDS: &[&str] = &[
    "куратор", "curator", "помощь", "help",
    "вопрос", "question", "поддержка", "support",
];

/// Point value per activity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPoints {
    pub message: i32,
    pub reaction: i32,
    pub reply: i32,
    pub task_verification: i32,
}

impl Default for ActivityPoints {
    fn default() -> Self {
        Self {
            message: 3,
            reaction: 1,
            reply: 2,
            task_verification: 5,
        }
    }
}

impl ActivityPoints {
    pub fn for_kind(&self, kind: ActivityKind) -> i32 {
        match kind {
            ActivityKind::Message => self.message,
            ActivityKind::Reaction => self.reaction,
            ActivityKind::Reply => self.reply,
            ActivityKind::TaskVerification => self.task_verification,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Lowercased help-request keywords.
    pub keywords: Vec<String>,
    pub points: ActivityPoints,
    pub response_good_secs: i64,
    pub response_poor_secs: i64,
    /// Delay before an unanswered request escalates.
    pub escalation_timeout_secs: u64,
    /// How far back the heuristic resolve match will look.
    pub resolve_lookback_secs: i64,
    /// Sorted by descending min_score.
    pub rating_bands: Vec<RatingBand>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            points: ActivityPoints::default(),
            response_good_secs: 60,
            response_poor_secs: 300,
            escalation_timeout_secs: 600,
            resolve_lookback_secs: 7200,
            rating_bands: default_rating_bands(),
        }
    }
}

impl MonitorConfig {
    /// Load from the config store, defaulting field by field.
    pub async fn load(repo: &dyn BotConfigRepository) -> Result<Arc<Self>, Error> {
        let mut cfg = MonitorConfig::default();

        if let Some(raw) = repo.get_value(KEY_KEYWORDS).await? {
            let parsed: Vec<String> = raw
                .split(',')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if parsed.is_empty() {
                warn!("'{}' is set but empty; keeping defaults", KEY_KEYWORDS);
            } else {
                cfg.keywords = parsed;
            }
        }

        if let Some(raw) = repo.get_value(KEY_POINTS).await? {
            match serde_json::from_str::<ActivityPoints>(&raw) {
                Ok(points) => cfg.points = points,
                Err(e) => warn!("malformed '{}' ({}); keeping defaults", KEY_POINTS, e),
            }
        }

        cfg.response_good_secs = load_int(repo, KEY_GOOD_SECS, cfg.response_good_secs).await?;
        cfg.response_poor_secs = load_int(repo, KEY_POOR_SECS, cfg.response_poor_secs).await?;
        cfg.escalation_timeout_secs =
            load_int(repo, KEY_TIMEOUT_SECS, cfg.escalation_timeout_secs as i64).await?.max(1) as u64;
        cfg.resolve_lookback_secs = load_int(repo, KEY_LOOKBACK_SECS, cfg.resolve_lookback_secs).await?;

        if let Some(raw) = repo.get_value(KEY_RATING_BANDS).await? {
            match serde_json::from_str::<Vec<RatingBand>>(&raw) {
                Ok(bands) if !bands.is_empty() => cfg.rating_bands = bands,
                Ok(_) => warn!("'{}' is an empty list; keeping defaults", KEY_RATING_BANDS),
                Err(e) => warn!("malformed '{}' ({}); keeping defaults", KEY_RATING_BANDS, e),
            }
        }
        cfg.rating_bands.sort_by(|a, b| b.min_score.cmp(&a.min_score));

        Ok(Arc::new(cfg))
    }
}

async fn load_int(repo: &dyn BotConfigRepository, key: &str, default: i64) -> Result<i64, Error> {
    if let Some(raw) = repo.get_value(key).await? {
        match raw.trim().parse::<i64>() {
            Ok(v) => return Ok(v),
            Err(_) => warn!("malformed '{}' (\"{}\"); keeping default {}", key, raw, default),
        }
    }
    Ok(default)
}
