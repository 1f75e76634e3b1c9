use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, ClientStorage, EventRepository, JobRepository, NotificationGateway,
    RsvpRepository, SettingsRepository, ShareRepository, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService, notification_service::NotificationService,
    rsvp_service::RsvpService, stats::StatsAggregator, wizard::DraftService,
};
use crate::infra::realtime::change_feed::ChangeFeed;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub rsvp_repo: Arc<dyn RsvpRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub share_repo: Arc<dyn ShareRepository>,
    pub client_storage: Arc<dyn ClientStorage>,
    pub job_repo: Arc<dyn JobRepository>,
    pub gateway: Arc<dyn NotificationGateway>,
    pub auth_service: Arc<AuthService>,
    pub stats: Arc<StatsAggregator>,
    pub feed: Arc<ChangeFeed>,
    pub drafts: Arc<DraftService>,
    pub rsvp_service: Arc<RsvpService>,
    pub notification_service: Arc<NotificationService>,
}
