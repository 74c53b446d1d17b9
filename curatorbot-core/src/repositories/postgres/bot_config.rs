// curatorbot-core/src/repositories/postgres/bot_config.rs
//
// Key-value configuration store backing MonitorConfig.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use curatorbot_common::traits::repository_traits::BotConfigRepository;
use curatorbot_common::Error;

#[derive(Clone)]
pub struct PostgresBotConfigRepository {
    pool: Pool<Postgres>,
}

impl PostgresBotConfigRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BotConfigRepository for PostgresBotConfigRepository {
    async fn set_value(&self, config_key: &str, config_value: &str) -> Result<(), Error> {
        let q = r#"
            INSERT INTO bot_config (config_key, config_value)
            VALUES ($1, $2)
            ON CONFLICT (config_key)
            DO UPDATE SET config_value = EXCLUDED.config_value
        "#;
        sqlx::query(q)
            .bind(config_key)
            .bind(config_value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_value(&self, config_key: &str) -> Result<Option<String>, Error> {
        let row = sqlx::query(
            r#"
            SELECT config_value
            FROM bot_config
            WHERE config_key = $1
            "#,
        )
        .bind(config_key)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row {
            Ok(Some(r.try_get("config_value")?))
        } else {
            Ok(None)
        }
    }

    async fn list_all(&self) -> Result<Vec<(String, String)>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT config_key, config_value
            FROM bot_config
            ORDER BY config_key
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::new();
        for r in rows {
            out.push((r.try_get("config_key")?, r.try_get("config_value")?));
        }
        Ok(out)
    }
}
