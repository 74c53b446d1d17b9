// curatorbot-core/src/repositories/postgres/task_report.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use curatorbot_common::models::{TaskReport, TaskReportStatus};
use curatorbot_common::traits::repository_traits::TaskReportRepository;
use curatorbot_common::Error;

#[derive(Clone)]
pub struct PostgresTaskReportRepository {
    pool: Pool<Postgres>,
}

impl PostgresTaskReportRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT report_id, faction_id, channel_id, message_id, author_id, content,
           task_count, status, submitted_at, verified_by, approved_tasks,
           verified_at
    FROM task_reports
"#;

fn row_to_report(r: &sqlx::postgres::PgRow) -> Result<TaskReport, Error> {
    let status_str: String = r.try_get("status")?;
    Ok(TaskReport {
        report_id: r.try_get("report_id")?,
        faction_id: r.try_get("faction_id")?,
        channel_id: r.try_get("channel_id")?,
        message_id: r.try_get("message_id")?,
        author_id: r.try_get("author_id")?,
        content: r.try_get("content")?,
        task_count: r.try_get("task_count")?,
        status: TaskReportStatus::parse(&status_str)
            .ok_or_else(|| Error::Parse(format!("unknown report status '{}'", status_str)))?,
        submitted_at: r.try_get("submitted_at")?,
        verified_by: r.try_get("verified_by")?,
        approved_tasks: r.try_get("approved_tasks")?,
        verified_at: r.try_get("verified_at")?,
    })
}

#[async_trait]
impl TaskReportRepository for PostgresTaskReportRepository {
    async fn create(&self, report: &TaskReport) -> Result<(), Error> {
        let q = r#"
            INSERT INTO task_reports
                (report_id, faction_id, channel_id, message_id, author_id,
                 content, task_count, status, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (message_id) DO NOTHING
        "#;
        sqlx::query(q)
            .bind(report.report_id)
            .bind(report.faction_id)
            .bind(&report.channel_id)
            .bind(&report.message_id)
            .bind(&report.author_id)
            .bind(&report.content)
            .bind(report.task_count)
            .bind(report.status.as_str())
            .bind(report.submitted_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_message_id(&self, message_id: &str) -> Result<Option<TaskReport>, Error> {
        let q = format!("{SELECT_COLUMNS} WHERE message_id = $1");
        let row_opt = sqlx::query(&q)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.map(|r| row_to_report(&r)).transpose()
    }

    async fn update(&self, report: &TaskReport) -> Result<(), Error> {
        let q = r#"
            UPDATE task_reports
            SET status = $2,
                verified_by = $3,
                approved_tasks = $4,
                verified_at = $5
            WHERE report_id = $1
        "#;
        sqlx::query(q)
            .bind(report.report_id)
            .bind(report.status.as_str())
            .bind(report.verified_by)
            .bind(report.approved_tasks)
            .bind(report.verified_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_pending_in_channel(
        &self,
        faction_id: Uuid,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<TaskReport>, Error> {
        let q = format!(
            r#"{SELECT_COLUMNS}
            WHERE faction_id = $1
              AND channel_id = $2
              AND status = 'pending'
              AND submitted_at >= $3
            ORDER BY submitted_at DESC
            LIMIT 1"#
        );
        let row_opt = sqlx::query(&q)
            .bind(faction_id)
            .bind(channel_id)
            .bind(since)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.map(|r| row_to_report(&r)).transpose()
    }
}
