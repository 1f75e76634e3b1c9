use crate::domain::{models::share::EventShare, ports::ShareRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteShareRepo {
    pool: SqlitePool,
}

impl SqliteShareRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for SqliteShareRepo {
    async fn create(&self, share: &EventShare) -> Result<EventShare, AppError> {
        sqlx::query_as::<_, EventShare>(
            "INSERT INTO event_shares (id, event_id, shared_by, share_code, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
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
        sqlx::query_as::<_, EventShare>("SELECT * FROM event_shares WHERE share_code = ?")
            .bind(share_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
