// curatorbot-core/src/repositories/postgres/tracking.rs
//
// Tracking records in the "response_tracking" table. The resolution outcome
// is flattened into nullable columns; a row with a curator_id is a resolved
// row. State is stored as text ('open' | 'resolved' | 'escalated').

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use curatorbot_common::models::{
    ResolutionOutcome, ResponseKind, TrackingRecord, TrackingState,
};
use curatorbot_common::traits::repository_traits::TrackingRepository;
use curatorbot_common::Error;

#[derive(Clone)]
pub struct PostgresTrackingRepository {
    pool: Pool<Postgres>,
}

impl PostgresTrackingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT tracking_id, faction_id, channel_id, mention_message_id,
           mention_author_id, mention_author_name, mention_content,
           mention_timestamp, state, curator_id, response_message_id,
           response_timestamp, response_kind, response_time_seconds
    FROM response_tracking
"#;

fn row_to_record(r: &sqlx::postgres::PgRow) -> Result<TrackingRecord, Error> {
    let state_str: String = r.try_get("state")?;
    let state = TrackingState::parse(&state_str)
        .ok_or_else(|| Error::Parse(format!("unknown tracking state '{}'", state_str)))?;

    let curator_id: Option<Uuid> = r.try_get("curator_id")?;
    let resolution = match curator_id {
        Some(curator_id) => {
            let kind_str: String = r.try_get("response_kind")?;
            Some(ResolutionOutcome {
                curator_id,
                response_message_id: r.try_get("response_message_id")?,
                response_timestamp: r.try_get("response_timestamp")?,
                response_kind: ResponseKind::parse(&kind_str)
                    .ok_or_else(|| Error::Parse(format!("unknown response kind '{}'", kind_str)))?,
                response_time_seconds: r.try_get("response_time_seconds")?,
            })
        }
        None => None,
    };

    Ok(TrackingRecord {
        tracking_id: r.try_get("tracking_id")?,
        faction_id: r.try_get("faction_id")?,
        channel_id: r.try_get("channel_id")?,
        mention_message_id: r.try_get("mention_message_id")?,
        mention_author_id: r.try_get("mention_author_id")?,
        mention_author_name: r.try_get("mention_author_name")?,
        mention_content: r.try_get("mention_content")?,
        mention_timestamp: r.try_get("mention_timestamp")?,
        state,
        resolution,
    })
}

#[async_trait]
impl TrackingRepository for PostgresTrackingRepository {
    async fn create(&self, record: &TrackingRecord) -> Result<(), Error> {
        // ON CONFLICT keeps duplicate delivery of the same mention message a
        // no-op at the storage layer too.
        let q = r#"
            INSERT INTO response_tracking
                (tracking_id, faction_id, channel_id, mention_message_id,
                 mention_author_id, mention_author_name, mention_content,
                 mention_timestamp, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (mention_message_id) DO NOTHING
        "#;
        sqlx::query(q)
            .bind(record.tracking_id)
            .bind(record.faction_id)
            .bind(&record.channel_id)
            .bind(&record.mention_message_id)
            .bind(&record.mention_author_id)
            .bind(&record.mention_author_name)
            .bind(&record.mention_content)
            .bind(record.mention_timestamp)
            .bind(record.state.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, tracking_id: Uuid) -> Result<Option<TrackingRecord>, Error> {
        let q = format!("{SELECT_COLUMNS} WHERE tracking_id = $1");
        let row_opt = sqlx::query(&q)
            .bind(tracking_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.map(|r| row_to_record(&r)).transpose()
    }

    async fn get_by_mention_message_id(
        &self,
        message_id: &str,
    ) -> Result<Option<TrackingRecord>, Error> {
        let q = format!("{SELECT_COLUMNS} WHERE mention_message_id = $1");
        let row_opt = sqlx::query(&q)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.map(|r| row_to_record(&r)).transpose()
    }

    async fn update(&self, record: &TrackingRecord) -> Result<(), Error> {
        let q = r#"
            UPDATE response_tracking
            SET state = $2,
                curator_id = $3,
                response_message_id = $4,
                response_timestamp = $5,
                response_kind = $6,
                response_time_seconds = $7
            WHERE tracking_id = $1
        "#;
        let resolution = record.resolution.as_ref();
        sqlx::query(q)
            .bind(record.tracking_id)
            .bind(record.state.as_str())
            .bind(resolution.map(|o| o.curator_id))
            .bind(resolution.map(|o| o.response_message_id.as_str()))
            .bind(resolution.map(|o| o.response_timestamp))
            .bind(resolution.map(|o| o.response_kind.as_str()))
            .bind(resolution.map(|o| o.response_time_seconds))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_open(&self) -> Result<Vec<TrackingRecord>, Error> {
        let q = format!("{SELECT_COLUMNS} WHERE state = 'open' ORDER BY mention_timestamp");
        let rows = sqlx::query(&q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn list_resolved_for_curator(
        &self,
        curator_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<TrackingRecord>, Error> {
        let q = format!(
            r#"{SELECT_COLUMNS}
            WHERE state = 'resolved'
              AND curator_id = $1
              AND response_timestamp >= $2
              AND response_timestamp <= $3
            ORDER BY response_timestamp"#
        );
        let rows = sqlx::query(&q)
            .bind(curator_id)
            .bind(since)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_record).collect()
    }
}
