use crate::domain::{models::event::Event, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, owner_id, short_id, draft_token, title, description, event_type,
                event_date, start_time, end_time, timezone, location, capacity, banner_image_url,
                is_private, is_temporary, save_the_date_deadline, save_the_date_message, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *"#
        )
            .bind(&event.id)
            .bind(&event.owner_id)
            .bind(&event.short_id)
            .bind(&event.draft_token)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.event_type)
            .bind(event.event_date)
            .bind(&event.start_time)
            .bind(&event.end_time)
            .bind(&event.timezone)
            .bind(&event.location)
            .bind(event.capacity)
            .bind(&event.banner_image_url)
            .bind(event.is_private)
            .bind(event.is_temporary)
            .bind(event.save_the_date_deadline)
            .bind(&event.save_the_date_message)
            .bind(event.created_at)
            .bind(event.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE short_id = $1")
            .bind(short_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_draft_token(&self, draft_token: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE draft_token = $1")
            .bind(draft_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE owner_id = $1 AND is_temporary = FALSE ORDER BY event_date ASC, start_time ASC",
        )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                title = $1, description = $2, event_type = $3, event_date = $4, start_time = $5, end_time = $6,
                timezone = $7, location = $8, capacity = $9, banner_image_url = $10, is_private = $11, is_temporary = $12,
                save_the_date_deadline = $13, save_the_date_message = $14, updated_at = $15
            WHERE id = $16
            RETURNING *"#
        )
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.event_type)
            .bind(event.event_date)
            .bind(&event.start_time)
            .bind(&event.end_time)
            .bind(&event.timezone)
            .bind(&event.location)
            .bind(event.capacity)
            .bind(&event.banner_image_url)
            .bind(event.is_private)
            .bind(event.is_temporary)
            .bind(event.save_the_date_deadline)
            .bind(&event.save_the_date_message)
            .bind(event.updated_at)
            .bind(&event.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }
        Ok(())
    }
}
