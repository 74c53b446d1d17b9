// curatorbot-core/src/repositories/postgres/faction.rs
//
// Monitored communities live in the "factions" table, keyed by the platform
// guild id the connector reports.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use curatorbot_common::models::FactionContext;
use curatorbot_common::traits::repository_traits::FactionRepository;
use curatorbot_common::Error;

#[derive(Clone)]
pub struct PostgresFactionRepository {
    pool: Pool<Postgres>,
}

impl PostgresFactionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_faction(r: &sqlx::postgres::PgRow) -> Result<FactionContext, Error> {
    Ok(FactionContext {
        faction_id: r.try_get("faction_id")?,
        guild_id: r.try_get("guild_id")?,
        name: r.try_get("name")?,
        attention_role_id: r.try_get("attention_role_id")?,
        completed_tasks_channel_id: r.try_get("completed_tasks_channel_id")?,
        is_active: r.try_get("is_active")?,
    })
}

#[async_trait]
impl FactionRepository for PostgresFactionRepository {
    async fn create(&self, faction: &FactionContext) -> Result<(), Error> {
        let q = r#"
            INSERT INTO factions (faction_id, guild_id, name, attention_role_id,
                                  completed_tasks_channel_id, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (guild_id)
            DO UPDATE SET name = EXCLUDED.name,
                          attention_role_id = EXCLUDED.attention_role_id,
                          completed_tasks_channel_id = EXCLUDED.completed_tasks_channel_id,
                          is_active = EXCLUDED.is_active
        "#;
        sqlx::query(q)
            .bind(faction.faction_id)
            .bind(&faction.guild_id)
            .bind(&faction.name)
            .bind(&faction.attention_role_id)
            .bind(&faction.completed_tasks_channel_id)
            .bind(faction.is_active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, faction_id: Uuid) -> Result<Option<FactionContext>, Error> {
        let q = r#"
            SELECT faction_id, guild_id, name, attention_role_id,
                   completed_tasks_channel_id, is_active
            FROM factions
            WHERE faction_id = $1
        "#;
        let row_opt = sqlx::query(q)
            .bind(faction_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.map(|r| row_to_faction(&r)).transpose()
    }

    async fn get_by_guild_id(&self, guild_id: &str) -> Result<Option<FactionContext>, Error> {
        let q = r#"
            SELECT faction_id, guild_id, name, attention_role_id,
                   completed_tasks_channel_id, is_active
            FROM factions
            WHERE guild_id = $1
              AND is_active = TRUE
        "#;
        let row_opt = sqlx::query(q)
            .bind(guild_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.map(|r| row_to_faction(&r)).transpose()
    }

    async fn list_active(&self) -> Result<Vec<FactionContext>, Error> {
        let q = r#"
            SELECT faction_id, guild_id, name, attention_role_id,
                   completed_tasks_channel_id, is_active
            FROM factions
            WHERE is_active = TRUE
            ORDER BY name
        "#;
        let rows = sqlx::query(q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_faction).collect()
    }

    async fn update(&self, faction: &FactionContext) -> Result<(), Error> {
        let q = r#"
            UPDATE factions
            SET guild_id = $2,
                name = $3,
                attention_role_id = $4,
                completed_tasks_channel_id = $5,
                is_active = $6
            WHERE faction_id = $1
        "#;
        sqlx::query(q)
            .bind(faction.faction_id)
            .bind(&faction.guild_id)
            .bind(&faction.name)
            .bind(&faction.attention_role_id)
            .bind(&faction.completed_tasks_channel_id)
            .bind(faction.is_active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
