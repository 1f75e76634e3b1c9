use crate::domain::models::{
    user::User, event::Event, auth::RefreshTokenRecord, job::Job, share::EventShare,
    rsvp::{Rsvp, RsvpHistory, RsvpStatus, StatusRow},
    settings::{EventSettings, CoOrganizer, ReminderSettings},
    notification::{NotificationRecord, OutboundMessage},
    change::RowChange,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<Event>, AppError>;
    async fn find_by_draft_token(&self, draft_token: &str) -> Result<Option<Event>, AppError>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait RsvpRepository: Send + Sync {
    async fn create(&self, rsvp: &Rsvp) -> Result<Rsvp, AppError>;
    /// Inserts every row or none of them.
    async fn create_many(&self, rsvps: &[Rsvp]) -> Result<Vec<Rsvp>, AppError>;
    /// Insert-or-update keyed by (event_id, user_id). Returns the previous row, if any, and the stored row.
    async fn upsert_for_respondent(&self, rsvp: &Rsvp) -> Result<(Option<Rsvp>, Rsvp), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Rsvp>, AppError>;
    async fn find_by_respondent(&self, event_id: &str, user_id: &str) -> Result<Option<Rsvp>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Rsvp>, AppError>;
    /// Records the history row and applies the new status in one transaction.
    async fn update_status(&self, id: &str, status: RsvpStatus, changed_by: Option<&str>) -> Result<(Rsvp, Rsvp), AppError>;
    async fn list_history(&self, rsvp_id: &str) -> Result<Vec<RsvpHistory>, AppError>;
    async fn delete(&self, id: &str) -> Result<Rsvp, AppError>;
}

/// Read side of the statistics aggregator.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn status_rows(&self, event_id: &str) -> Result<Vec<StatusRow>, AppError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn find_settings(&self, event_id: &str) -> Result<Option<EventSettings>, AppError>;
    async fn upsert_settings(&self, settings: &EventSettings) -> Result<EventSettings, AppError>;
    async fn list_co_organizers(&self, event_id: &str) -> Result<Vec<CoOrganizer>, AppError>;
    /// Replaces the event's co-organizer list wholesale.
    async fn replace_co_organizers(&self, event_id: &str, organizers: &[CoOrganizer]) -> Result<Vec<CoOrganizer>, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn find_reminder_settings(&self, rsvp_id: &str) -> Result<Option<ReminderSettings>, AppError>;
    async fn upsert_reminder_settings(&self, settings: &ReminderSettings) -> Result<ReminderSettings, AppError>;
    async fn append(&self, record: &NotificationRecord) -> Result<(), AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<NotificationRecord>, AppError>;
}

#[async_trait]
pub trait ShareRepository: Send + Sync {
    async fn create(&self, share: &EventShare) -> Result<EventShare, AppError>;
    async fn find_by_code(&self, share_code: &str) -> Result<Option<EventShare>, AppError>;
}

/// Server-held key/value storage scoped by client id, standing in for browser local storage.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    async fn get(&self, client_id: &str, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, client_id: &str, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, client_id: &str, key: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
    async fn cancel_jobs_for_rsvp(&self, rsvp_id: &str) -> Result<u64, AppError>;
    async fn list_for_rsvp(&self, rsvp_id: &str) -> Result<Vec<Job>, AppError>;
}

/// Outbound email / WhatsApp delivery. Returns the provider message id.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<String, AppError>;
}

/// Sink for RSVP row changes; implemented by the realtime change feed.
pub trait ChangePublisher: Send + Sync {
    fn publish(&self, change: RowChange);
}
