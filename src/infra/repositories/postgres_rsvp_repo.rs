use crate::domain::{
    models::rsvp::{Rsvp, RsvpHistory, RsvpStatus, StatusRow},
    ports::{RsvpRepository, StatsSource},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, PgPool, Transaction};
use tracing::error;

pub struct PostgresRsvpRepo {
    pool: PgPool,
}

impl PostgresRsvpRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(tx: &mut Transaction<'_, Postgres>, rsvp: &Rsvp) -> Result<Rsvp, sqlx::Error> {
        sqlx::query_as::<_, Rsvp>(
            r#"INSERT INTO event_rsvps (
                id, event_id, user_id, name, email, phone, status, guests_count,
                dietary_restrictions, message, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *"#
        )
            .bind(&rsvp.id)
            .bind(&rsvp.event_id)
            .bind(&rsvp.user_id)
            .bind(&rsvp.name)
            .bind(&rsvp.email)
            .bind(&rsvp.phone)
            .bind(&rsvp.status)
            .bind(rsvp.guests_count)
            .bind(&rsvp.dietary_restrictions)
            .bind(&rsvp.message)
            .bind(rsvp.created_at)
            .bind(rsvp.updated_at)
            .fetch_one(&mut **tx)
            .await
    }

    async fn record_history(tx: &mut Transaction<'_, Postgres>, history: &RsvpHistory) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO event_rsvp_history (id, rsvp_id, previous_status, new_status, changed_by, changed_at) VALUES ($1, $2, $3, $4, $5, $6)"
        )
            .bind(&history.id)
            .bind(&history.rsvp_id)
            .bind(&history.previous_status)
            .bind(&history.new_status)
            .bind(&history.changed_by)
            .bind(history.changed_at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RsvpRepository for PostgresRsvpRepo {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = Self::insert(&mut tx, rsvp).await.map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn create_many(&self, rsvps: &[Rsvp]) -> Result<Vec<Rsvp>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut created = Vec::with_capacity(rsvps.len());
        for rsvp in rsvps {
            let row = Self::insert(&mut tx, rsvp).await.map_err(|e| {
                error!("Postgres guest batch insert failed, rolling back: {:?}", e);
                AppError::Database(e)
            })?;
            created.push(row);
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn upsert_for_respondent(&self, rsvp: &Rsvp) -> Result<(Option<Rsvp>, Rsvp), AppError> {
        let user_id = rsvp.user_id.as_deref()
            .ok_or_else(|| AppError::Validation("A respondent RSVP needs a user".into()))?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let previous = sqlx::query_as::<_, Rsvp>("SELECT * FROM event_rsvps WHERE event_id = $1 AND user_id = $2")
            .bind(&rsvp.event_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let stored = sqlx::query_as::<_, Rsvp>(
            r#"INSERT INTO event_rsvps (
                id, event_id, user_id, name, email, phone, status, guests_count,
                dietary_restrictions, message, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (event_id, user_id) WHERE user_id IS NOT NULL DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                phone = excluded.phone,
                status = excluded.status,
                guests_count = excluded.guests_count,
                dietary_restrictions = excluded.dietary_restrictions,
                message = excluded.message,
                updated_at = excluded.updated_at
            RETURNING *"#
        )
            .bind(&rsvp.id)
            .bind(&rsvp.event_id)
            .bind(user_id)
            .bind(&rsvp.name)
            .bind(&rsvp.email)
            .bind(&rsvp.phone)
            .bind(&rsvp.status)
            .bind(rsvp.guests_count)
            .bind(&rsvp.dietary_restrictions)
            .bind(&rsvp.message)
            .bind(rsvp.created_at)
            .bind(rsvp.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if let Some(old) = previous.as_ref().filter(|old| old.status != stored.status) {
            let history = RsvpHistory::new(stored.id.clone(), &old.status, stored.status(), Some(user_id.to_string()));
            Self::record_history(&mut tx, &history).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok((previous, stored))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM event_rsvps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_respondent(&self, event_id: &str, user_id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM event_rsvps WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM event_rsvps WHERE event_id = $1 ORDER BY created_at ASC, id ASC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_status(&self, id: &str, status: RsvpStatus, changed_by: Option<&str>) -> Result<(Rsvp, Rsvp), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let old = sqlx::query_as::<_, Rsvp>("SELECT * FROM event_rsvps WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("RSVP not found".into()))?;

        let history = RsvpHistory::new(old.id.clone(), &old.status, status, changed_by.map(str::to_string));
        Self::record_history(&mut tx, &history).await.map_err(AppError::Database)?;

        let new = sqlx::query_as::<_, Rsvp>("UPDATE event_rsvps SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok((old, new))
    }

    async fn list_history(&self, rsvp_id: &str) -> Result<Vec<RsvpHistory>, AppError> {
        sqlx::query_as::<_, RsvpHistory>("SELECT * FROM event_rsvp_history WHERE rsvp_id = $1 ORDER BY changed_at ASC")
            .bind(rsvp_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<Rsvp, AppError> {
        sqlx::query_as::<_, Rsvp>("DELETE FROM event_rsvps WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("RSVP not found".into()))
    }
}

#[async_trait]
impl StatsSource for PostgresRsvpRepo {
    async fn status_rows(&self, event_id: &str) -> Result<Vec<StatusRow>, AppError> {
        sqlx::query_as::<_, StatusRow>("SELECT status, guests_count FROM event_rsvps WHERE event_id = $1")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
