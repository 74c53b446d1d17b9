use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named score tier. Bands are evaluated highest `min_score` first; the
/// first band whose minimum is satisfied wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBand {
    pub name: String,
    pub label: String,
    pub min_score: i64,
    pub color: String,
}

impl RatingBand {
    pub fn new(name: &str, label: &str, min_score: i64, color: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            min_score,
            color: color.to_string(),
        }
    }
}

/// The built-in band set, used whenever no bands are configured.
pub fn default_rating_bands() -> Vec<RatingBand> {
    vec![
        RatingBand::new("excellent", "Великолепно", 50, "#22c55e"),
        RatingBand::new("good", "Хорошо", 35, "#3b82f6"),
        RatingBand::new("normal", "Нормально", 20, "#f59e0b"),
        RatingBand::new("poor", "Плохо", 10, "#ef4444"),
        RatingBand::new("terrible", "Ужасно", 0, "#991b1b"),
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub messages: u32,
    pub reactions: u32,
    pub replies: u32,
    pub task_verifications: u32,
}

impl ActivityCounts {
    pub fn total(&self) -> u32 {
        self.messages + self.reactions + self.replies + self.task_verifications
    }
}

/// On-demand score for one curator over a window. Derived from the activity
/// and resolution logs; never stored as the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub curator_id: Uuid,
    pub period_days: i64,
    /// Sum of stored activity points. Kept unfloored for diagnostics.
    pub base_score: i64,
    /// Net response-time bonus/penalty. May be negative.
    pub response_bonus: i64,
    /// max(0, base_score + response_bonus)
    pub total_score: i64,
    pub activity_counts: ActivityCounts,
    pub band: RatingBand,
}
