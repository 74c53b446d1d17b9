// curatorbot-core/src/repositories/postgres/curator.rs
//
// Stores the curator roster in the "curators" table. The administrative
// layer owns writes; the engine mostly reads by platform user id.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use curatorbot_common::models::Curator;
use curatorbot_common::traits::repository_traits::CuratorRepository;
use curatorbot_common::Error;

#[derive(Clone)]
pub struct PostgresCuratorRepository {
    pool: Pool<Postgres>,
}

impl PostgresCuratorRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_curator(r: &sqlx::postgres::PgRow) -> Result<Curator, Error> {
    Ok(Curator {
        curator_id: r.try_get("curator_id")?,
        platform_user_id: r.try_get("platform_user_id")?,
        display_name: r.try_get("display_name")?,
        faction_tags: r.try_get("faction_tags")?,
        is_active: r.try_get("is_active")?,
        created_at: r.try_get("created_at")?,
    })
}

#[async_trait]
impl CuratorRepository for PostgresCuratorRepository {
    async fn create(&self, curator: &Curator) -> Result<(), Error> {
        let q = r#"
            INSERT INTO curators (curator_id, platform_user_id, display_name,
                                  faction_tags, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#;
        sqlx::query(q)
            .bind(curator.curator_id)
            .bind(&curator.platform_user_id)
            .bind(&curator.display_name)
            .bind(&curator.faction_tags)
            .bind(curator.is_active)
            .bind(curator.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, curator_id: Uuid) -> Result<Option<Curator>, Error> {
        let q = r#"
            SELECT curator_id, platform_user_id, display_name,
                   faction_tags, is_active, created_at
            FROM curators
            WHERE curator_id = $1
        "#;
        let row_opt = sqlx::query(q)
            .bind(curator_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.map(|r| row_to_curator(&r)).transpose()
    }

    async fn get_by_platform_user_id(
        &self,
        platform_user_id: &str,
    ) -> Result<Option<Curator>, Error> {
        let q = r#"
            SELECT curator_id, platform_user_id, display_name,
                   faction_tags, is_active, created_at
            FROM curators
            WHERE platform_user_id = $1
              AND is_active = TRUE
        "#;
        let row_opt = sqlx::query(q)
            .bind(platform_user_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.map(|r| row_to_curator(&r)).transpose()
    }

    async fn list_active(&self) -> Result<Vec<Curator>, Error> {
        let q = r#"
            SELECT curator_id, platform_user_id, display_name,
                   faction_tags, is_active, created_at
            FROM curators
            WHERE is_active = TRUE
            ORDER BY display_name
        "#;
        let rows = sqlx::query(q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_curator).collect()
    }

    async fn update(&self, curator: &Curator) -> Result<(), Error> {
        let q = r#"
            UPDATE curators
            SET platform_user_id = $2,
                display_name = $3,
                faction_tags = $4,
                is_active = $5
            WHERE curator_id = $1
        "#;
        sqlx::query(q)
            .bind(curator.curator_id)
            .bind(&curator.platform_user_id)
            .bind(&curator.display_name)
            .bind(&curator.faction_tags)
            .bind(curator.is_active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
