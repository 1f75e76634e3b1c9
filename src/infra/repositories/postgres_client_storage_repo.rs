use crate::domain::ports::ClientStorage;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresClientStorageRepo {
    pool: PgPool,
}

impl PostgresClientStorageRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStorage for PostgresClientStorageRepo {
    async fn get(&self, client_id: &str, key: &str) -> Result<Option<String>, AppError> {
        sqlx::query_scalar::<_, String>("SELECT value FROM client_storage WHERE client_id = $1 AND key = $2")
            .bind(client_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set(&self, client_id: &str, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO client_storage (client_id, key, value, updated_at) VALUES ($1, $2, $3, $4)
            ON CONFLICT (client_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#
        )
            .bind(client_id)
            .bind(key)
            .bind(value)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn remove(&self, client_id: &str, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM client_storage WHERE client_id = $1 AND key = $2")
            .bind(client_id)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
