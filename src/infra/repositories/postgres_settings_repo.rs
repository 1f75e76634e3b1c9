use crate::domain::{
    models::settings::{CoOrganizer, EventSettings},
    ports::SettingsRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresSettingsRepo {
    pool: PgPool,
}

impl PostgresSettingsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepo {
    async fn find_settings(&self, event_id: &str) -> Result<Option<EventSettings>, AppError> {
        sqlx::query_as::<_, EventSettings>("SELECT * FROM event_settings WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert_settings(&self, settings: &EventSettings) -> Result<EventSettings, AppError> {
        sqlx::query_as::<_, EventSettings>(
            r#"INSERT INTO event_settings (
                event_id, show_guest_list, allow_plus_ones, show_dietary_restrictions, rsvp_deadline, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (event_id) DO UPDATE SET
                show_guest_list = excluded.show_guest_list,
                allow_plus_ones = excluded.allow_plus_ones,
                show_dietary_restrictions = excluded.show_dietary_restrictions,
                rsvp_deadline = excluded.rsvp_deadline,
                updated_at = excluded.updated_at
            RETURNING *"#
        )
            .bind(&settings.event_id)
            .bind(settings.show_guest_list)
            .bind(settings.allow_plus_ones)
            .bind(settings.show_dietary_restrictions)
            .bind(settings.rsvp_deadline)
            .bind(settings.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_co_organizers(&self, event_id: &str) -> Result<Vec<CoOrganizer>, AppError> {
        sqlx::query_as::<_, CoOrganizer>("SELECT * FROM event_co_organizers WHERE event_id = $1 ORDER BY created_at ASC, name ASC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn replace_co_organizers(&self, event_id: &str, organizers: &[CoOrganizer]) -> Result<Vec<CoOrganizer>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("DELETE FROM event_co_organizers WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let mut saved = Vec::with_capacity(organizers.len());
        for organizer in organizers {
            let row = sqlx::query_as::<_, CoOrganizer>(
                "INSERT INTO event_co_organizers (id, event_id, name, email, avatar_url, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
            )
                .bind(&organizer.id)
                .bind(event_id)
                .bind(&organizer.name)
                .bind(&organizer.email)
                .bind(&organizer.avatar_url)
                .bind(organizer.created_at)
                .fetch_one(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            saved.push(row);
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(saved)
    }
}
