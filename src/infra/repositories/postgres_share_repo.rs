use crate::domain::{models::share::EventShare, ports::ShareRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresShareRepo {
    pool: PgPool,
}

impl PostgresShareRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for PostgresShareRepo {
    async fn create(&self, share: &EventShare) -> Result<EventShare, AppError> {
        sqlx::query_as::<_, EventShare>(
            "INSERT INTO event_shares (id, event_id, shared_by, share_code, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *"
        )
            .bind(&share.id)
            .bind(&share.event_id)
            .bind(&share.shared_by)
            .bind(&share.share_code)
            .bind(share.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_code(&self, share_code: &str) -> Result<Option<EventShare>, AppError> {
        sqlx::query_as::<_, EventShare>("SELECT * FROM event_shares WHERE share_code = $1")
            .bind(share_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
