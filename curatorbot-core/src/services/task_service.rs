// File: src/services/task_service.rs
//
// Task-completion reports: members post a report in the faction's
// completed-tasks channel, a curator confirms it, and the confirmation is
// credited as a task-verification activity.

use std::sync::Arc;
use chrono::Duration;
use regex::Regex;
use tracing::{error, info};
use uuid::Uuid;

use curatorbot_common::models::events::{CuratorActionEvent, HelpCandidateEvent};
use curatorbot_common::models::{
    ActivityKind, Curator, FactionContext, TaskReport, TaskReportStatus,
};
use curatorbot_common::traits::repository_traits::TaskReportRepository;
use curatorbot_common::Error;

use crate::services::activity_service::ActivityRecorder;

/// How far back a curator confirmation can reach for a pending report.
const VERIFY_WINDOW_HOURS: i64 = 24;

#[derive(Debug)]
pub enum ReportIntake {
    Created(TaskReport),
    /// No digit sequence in the message; not a report, not an error.
    NotAReport,
    /// A report for this message id already exists.
    AlreadyRecorded,
}

pub struct TaskReportService {
    task_repo: Arc<dyn TaskReportRepository>,
    recorder: Arc<ActivityRecorder>,
    count_pattern: Regex,
    digits_pattern: Regex,
}

impl TaskReportService {
    pub fn new(task_repo: Arc<dyn TaskReportRepository>, recorder: Arc<ActivityRecorder>) -> Self {
        Self {
            task_repo,
            recorder,
            count_pattern: Regex::new(r"(?i)(\d+)\s*задач").expect("static pattern"),
            digits_pattern: Regex::new(r"(\d+)").expect("static pattern"),
        }
    }

    /// Intake of a member-posted report. Idempotent by message id.
    pub async fn process_report(
        &self,
        faction: &FactionContext,
        evt: &HelpCandidateEvent,
    ) -> Result<ReportIntake, Error> {
        let Some(task_count) = self.extract_count(&evt.text) else {
            return Ok(ReportIntake::NotAReport);
        };

        if self.task_repo.get_by_message_id(&evt.message_id).await?.is_some() {
            return Ok(ReportIntake::AlreadyRecorded);
        }

        let report = TaskReport {
            report_id: Uuid::new_v4(),
            faction_id: faction.faction_id,
            channel_id: evt.channel_id.clone(),
            message_id: evt.message_id.clone(),
            author_id: evt.author_id.clone(),
            content: evt.text.clone(),
            task_count,
            status: TaskReportStatus::Pending,
            submitted_at: evt.timestamp,
            verified_by: None,
            approved_tasks: None,
            verified_at: None,
        };

        if let Err(e) = self.task_repo.create(&report).await {
            error!("failed to persist task report {}: {:?}", report.report_id, e);
        } else {
            info!(
                "task report created: {} tasks in {}",
                task_count, faction.name
            );
        }
        Ok(ReportIntake::Created(report))
    }

    /// A curator message in the completion channel confirms the most recent
    /// pending report there. The confirmed count is the first digit run in
    /// the message, defaulting to the reported count.
    pub async fn verify_report(
        &self,
        faction: &FactionContext,
        curator: &Curator,
        evt: &CuratorActionEvent,
    ) -> Result<Option<TaskReport>, Error> {
        let since = evt.timestamp - Duration::hours(VERIFY_WINDOW_HOURS);
        let Some(mut report) = self
            .task_repo
            .find_pending_in_channel(faction.faction_id, &evt.channel_id, since)
            .await?
        else {
            return Ok(None);
        };

        let approved = evt
            .text
            .as_deref()
            .and_then(|t| self.extract_first_number(t))
            .unwrap_or(report.task_count);

        report.status = TaskReportStatus::Verified;
        report.verified_by = Some(curator.curator_id);
        report.approved_tasks = Some(approved);
        report.verified_at = Some(evt.timestamp);

        if let Err(e) = self.task_repo.update(&report).await {
            error!("failed to persist verification of {}: {:?}", report.report_id, e);
        }
        info!(
            "task report verified: {}/{} by {}",
            approved, report.task_count, curator.display_name
        );

        let note = format!("Verified {} tasks", approved);
        self.recorder
            .record(
                curator,
                faction,
                ActivityKind::TaskVerification,
                &evt.channel_id,
                &evt.message_id,
                Some(note.as_str()),
                evt.timestamp,
            )
            .await?;

        Ok(Some(report))
    }

    fn extract_count(&self, text: &str) -> Option<i32> {
        self.count_pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn extract_first_number(&self, text: &str) -> Option<i32> {
        self.digits_pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
