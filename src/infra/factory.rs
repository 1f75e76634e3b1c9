use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::error::StartupError;
use crate::state::AppState;
use crate::domain::ports::{
    AuthRepository, ClientStorage, EventRepository, JobRepository, NotificationGateway,
    NotificationRepository, RsvpRepository, SettingsRepository, ShareRepository, StatsSource,
    UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService, notification_service::NotificationService,
    reminders::ReminderScheduler, rsvp_service::RsvpService, stats::StatsAggregator,
    wizard::DraftService,
};
use crate::infra::notify::http_notification_gateway::HttpNotificationGateway;
use crate::infra::realtime::change_feed::ChangeFeed;
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_client_storage_repo::PostgresClientStorageRepo,
    postgres_event_repo::PostgresEventRepo, postgres_job_repo::PostgresJobRepo,
    postgres_notification_repo::PostgresNotificationRepo, postgres_rsvp_repo::PostgresRsvpRepo,
    postgres_settings_repo::PostgresSettingsRepo, postgres_share_repo::PostgresShareRepo,
    postgres_user_repo::PostgresUserRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_client_storage_repo::SqliteClientStorageRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_job_repo::SqliteJobRepo,
    sqlite_notification_repo::SqliteNotificationRepo, sqlite_rsvp_repo::SqliteRsvpRepo,
    sqlite_settings_repo::SqliteSettingsRepo, sqlite_share_repo::SqliteShareRepo,
    sqlite_user_repo::SqliteUserRepo,
};

/// One backend's worth of repository adapters.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<dyn AuthRepository>,
    pub events: Arc<dyn EventRepository>,
    pub rsvps: Arc<dyn RsvpRepository>,
    pub stats_source: Arc<dyn StatsSource>,
    pub settings: Arc<dyn SettingsRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub shares: Arc<dyn ShareRepository>,
    pub storage: Arc<dyn ClientStorage>,
    pub jobs: Arc<dyn JobRepository>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        let rsvps = Arc::new(SqliteRsvpRepo::new(pool.clone()));
        Self {
            users: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth: Arc::new(SqliteAuthRepo::new(pool.clone())),
            events: Arc::new(SqliteEventRepo::new(pool.clone())),
            rsvps: rsvps.clone(),
            stats_source: rsvps,
            settings: Arc::new(SqliteSettingsRepo::new(pool.clone())),
            notifications: Arc::new(SqliteNotificationRepo::new(pool.clone())),
            shares: Arc::new(SqliteShareRepo::new(pool.clone())),
            storage: Arc::new(SqliteClientStorageRepo::new(pool.clone())),
            jobs: Arc::new(SqliteJobRepo::new(pool)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let rsvps = Arc::new(PostgresRsvpRepo::new(pool.clone()));
        Self {
            users: Arc::new(PostgresUserRepo::new(pool.clone())),
            auth: Arc::new(PostgresAuthRepo::new(pool.clone())),
            events: Arc::new(PostgresEventRepo::new(pool.clone())),
            rsvps: rsvps.clone(),
            stats_source: rsvps,
            settings: Arc::new(PostgresSettingsRepo::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepo::new(pool.clone())),
            shares: Arc::new(PostgresShareRepo::new(pool.clone())),
            storage: Arc::new(PostgresClientStorageRepo::new(pool.clone())),
            jobs: Arc::new(PostgresJobRepo::new(pool)),
        }
    }
}

pub async fn bootstrap_state(config: &Config) -> Result<AppState, StartupError> {
    let repos = connect(&config.database_url).await?;

    let gateway = HttpNotificationGateway::new(
        config.notify_service_url.clone(),
        config.notify_service_token.clone(),
    ).map_err(|e| StartupError::Config(e.to_string()))?;

    assemble_state(config, repos, Arc::new(gateway))
}

/// Picks the backend from the URL scheme, connects and migrates.
pub async fn connect(database_url: &str) -> Result<Repositories, StartupError> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let opts = PgConnectOptions::from_str(database_url)?
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations/postgres").run(&pool).await?;
        Ok(Repositories::postgres(pool))
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations/sqlite").run(&pool).await?;
        Ok(Repositories::sqlite(pool))
    }
}

/// Wires services on top of the repositories. Tests call this with their own gateway.
pub fn assemble_state(config: &Config, repos: Repositories, gateway: Arc<dyn NotificationGateway>) -> Result<AppState, StartupError> {
    let auth_service = Arc::new(AuthService::new(repos.auth.clone(), repos.users.clone(), config)?);
    let stats = Arc::new(StatsAggregator::new(repos.stats_source.clone(), config.stats_cache_ttl));
    let feed = Arc::new(ChangeFeed::new(stats.clone()));
    let notification_service = Arc::new(NotificationService::new(gateway.clone(), repos.notifications.clone()));
    let scheduler = Arc::new(ReminderScheduler::new(repos.jobs.clone()));
    let rsvp_service = Arc::new(RsvpService::new(
        repos.rsvps.clone(),
        repos.settings.clone(),
        notification_service.clone(),
        scheduler,
        feed.clone(),
    ));
    let drafts = Arc::new(DraftService::new(repos.events.clone(), repos.storage.clone()));

    Ok(AppState {
        config: config.clone(),
        user_repo: repos.users,
        auth_repo: repos.auth,
        event_repo: repos.events,
        rsvp_repo: repos.rsvps,
        settings_repo: repos.settings,
        share_repo: repos.shares,
        client_storage: repos.storage,
        job_repo: repos.jobs,
        gateway,
        auth_service,
        stats,
        feed,
        drafts,
        rsvp_service,
        notification_service,
    })
}
