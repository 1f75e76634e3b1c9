use crate::domain::{models::event::Event, ports::EventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, owner_id, short_id, draft_token, title, description, event_type,
                event_date, start_time, end_time, timezone, location, capacity, banner_image_url,
                is_private, is_temporary, save_the_date_deadline, save_the_date_message, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
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
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE short_id = ?")
            .bind(short_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_draft_token(&self, draft_token: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE draft_token = ?")
            .bind(draft_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE owner_id = ? AND is_temporary = 0 ORDER BY event_date ASC, start_time ASC",
        )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                title = ?, description = ?, event_type = ?, event_date = ?, start_time = ?, end_time = ?,
                timezone = ?, location = ?, capacity = ?, banner_image_url = ?, is_private = ?, is_temporary = ?,
                save_the_date_deadline = ?, save_the_date_message = ?, updated_at = ?
            WHERE id = ?
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
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
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
