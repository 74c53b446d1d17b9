// curatorbot-core/src/repositories/postgres/activity.rs
//
// Append-only activity log in the "activities" table. Rows are priced when
// written; nothing here ever updates a row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use curatorbot_common::models::{ActivityKind, ActivityRecord};
use curatorbot_common::traits::repository_traits::ActivityRepository;
use curatorbot_common::Error;

#[derive(Clone)]
pub struct PostgresActivityRepository {
    pool: Pool<Postgres>,
}

impl PostgresActivityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_record(r: &sqlx::postgres::PgRow) -> Result<ActivityRecord, Error> {
    let kind_str: String = r.try_get("kind")?;
    Ok(ActivityRecord {
        activity_id: r.try_get("activity_id")?,
        curator_id: r.try_get("curator_id")?,
        faction_id: r.try_get("faction_id")?,
        kind: ActivityKind::parse(&kind_str)
            .ok_or_else(|| Error::Parse(format!("unknown activity kind '{}'", kind_str)))?,
        channel_id: r.try_get("channel_id")?,
        message_id: r.try_get("message_id")?,
        content: r.try_get("content")?,
        points: r.try_get("points")?,
        timestamp: r.try_get("timestamp")?,
    })
}

#[async_trait]
impl ActivityRepository for PostgresActivityRepository {
    async fn insert(&self, record: &ActivityRecord) -> Result<(), Error> {
        let q = r#"
            INSERT INTO activities
                (activity_id, curator_id, faction_id, kind, channel_id,
                 message_id, content, points, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#;
        sqlx::query(q)
            .bind(record.activity_id)
            .bind(record.curator_id)
            .bind(record.faction_id)
            .bind(record.kind.as_str())
            .bind(&record.channel_id)
            .bind(&record.message_id)
            .bind(&record.content)
            .bind(record.points)
            .bind(record.timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_for_curator(
        &self,
        curator_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, Error> {
        let q = r#"
            SELECT activity_id, curator_id, faction_id, kind, channel_id,
                   message_id, content, points, timestamp
            FROM activities
            WHERE curator_id = $1
              AND timestamp >= $2
              AND timestamp <= $3
            ORDER BY timestamp
        "#;
        let rows = sqlx::query(q)
            .bind(curator_id)
            .bind(since)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }
}
