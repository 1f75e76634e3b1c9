pub mod sqlite_auth_repo;
pub mod sqlite_client_storage_repo;
pub mod sqlite_event_repo;
pub mod sqlite_job_repo;
pub mod sqlite_notification_repo;
pub mod sqlite_rsvp_repo;
pub mod sqlite_settings_repo;
pub mod sqlite_share_repo;
pub mod sqlite_user_repo;

pub mod postgres_auth_repo;
pub mod postgres_client_storage_repo;
pub mod postgres_event_repo;
pub mod postgres_job_repo;
pub mod postgres_notification_repo;
pub mod postgres_rsvp_repo;
pub mod postgres_settings_repo;
pub mod postgres_share_repo;
pub mod postgres_user_repo;
