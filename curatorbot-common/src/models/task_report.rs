use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskReportStatus {
    Pending,
    Verified,
}

impl TaskReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskReportStatus::Pending => "pending",
            TaskReportStatus::Verified => "verified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskReportStatus::Pending),
            "verified" => Some(TaskReportStatus::Verified),
            _ => None,
        }
    }
}

/// A task-completion report posted in a faction's completed-tasks channel,
/// waiting for (or holding) a curator's verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub report_id: Uuid,
    pub faction_id: Uuid,
    pub channel_id: String,
    pub message_id: String,
    pub author_id: String,
    pub content: String,
    pub task_count: i32,
    pub status: TaskReportStatus,
    pub submitted_at: DateTime<Utc>,
    pub verified_by: Option<Uuid>,
    pub approved_tasks: Option<i32>,
    pub verified_at: Option<DateTime<Utc>>,
}
