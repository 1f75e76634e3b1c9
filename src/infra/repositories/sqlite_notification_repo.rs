use crate::domain::{
    models::{notification::NotificationRecord, settings::ReminderSettings},
    ports::NotificationRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepo {
    async fn find_reminder_settings(&self, rsvp_id: &str) -> Result<Option<ReminderSettings>, AppError> {
        sqlx::query_as::<_, ReminderSettings>("SELECT * FROM rsvp_reminder_settings WHERE rsvp_id = ?")
            .bind(rsvp_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert_reminder_settings(&self, settings: &ReminderSettings) -> Result<ReminderSettings, AppError> {
        sqlx::query_as::<_, ReminderSettings>(
            r#"INSERT INTO rsvp_reminder_settings (
                id, rsvp_id, email_reminders, whatsapp_reminders, one_week_reminder, one_day_reminder,
                update_notifications, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (rsvp_id) DO UPDATE SET
                email_reminders = excluded.email_reminders,
                whatsapp_reminders = excluded.whatsapp_reminders,
                one_week_reminder = excluded.one_week_reminder,
                one_day_reminder = excluded.one_day_reminder,
                update_notifications = excluded.update_notifications,
                updated_at = excluded.updated_at
            RETURNING *"#
        )
            .bind(&settings.id)
            .bind(&settings.rsvp_id)
            .bind(settings.email_reminders)
            .bind(settings.whatsapp_reminders)
            .bind(settings.one_week_reminder)
            .bind(settings.one_day_reminder)
            .bind(settings.update_notifications)
            .bind(settings.created_at)
            .bind(settings.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn append(&self, record: &NotificationRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO event_notifications (
                id, event_id, rsvp_id, user_id, notification_type, channel, status, message_id, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
            .bind(&record.id)
            .bind(&record.event_id)
            .bind(&record.rsvp_id)
            .bind(&record.user_id)
            .bind(&record.notification_type)
            .bind(&record.channel)
            .bind(&record.status)
            .bind(&record.message_id)
            .bind(&record.metadata)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<NotificationRecord>, AppError> {
        sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM event_notifications WHERE event_id = ? ORDER BY created_at DESC LIMIT 200"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
