use crate::domain::models::{
    change::RowChange,
    event::Event,
    notification::NotificationRecord,
    rsvp::Rsvp,
    settings::{CoOrganizer, EventSettings},
};
use crate::domain::services::{
    share::ShareLinks,
    stats::{EventStats, StatsSnapshot},
    wizard::{Advance, EventWizard},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct WizardResponse {
    pub result: Advance,
    pub wizard: EventWizard,
}

#[derive(Serialize)]
pub struct ResumeResponse {
    pub restored: bool,
    pub wizard: Option<EventWizard>,
}

#[derive(Serialize)]
pub struct FinalizeResponse {
    pub event: Event,
    pub created: bool,
    pub guests_imported: usize,
}

/// A guest as shown on the public invitation page.
#[derive(Serialize)]
pub struct PublicGuest {
    pub name: String,
    pub status: String,
    pub guests_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<String>,
}

#[derive(Serialize)]
pub struct PublicEventResponse {
    pub event: Event,
    pub settings: EventSettings,
    pub co_organizers: Vec<CoOrganizer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guests: Option<Vec<PublicGuest>>,
    pub my_rsvp: Option<Rsvp>,
    /// User who shared the personal link the page was opened from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_by: Option<String>,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub guests: Vec<Rsvp>,
}

#[derive(Serialize)]
pub struct BulkMessageResponse {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub records: Vec<NotificationRecord>,
}

#[derive(Serialize)]
pub struct ShareResponse {
    #[serde(flatten)]
    pub links: ShareLinks,
    pub google_calendar_url: String,
}

#[derive(Serialize)]
pub struct PersonalShareResponse {
    pub share_code: String,
    #[serde(flatten)]
    pub links: ShareLinks,
}

#[derive(Serialize)]
pub struct GoogleCalendarResponse {
    pub url: String,
}

#[derive(Serialize)]
pub struct LanguageResponse {
    pub language: Option<String>,
}

/// Frames pushed to a live guest-list session.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    Snapshot {
        guests: Vec<Rsvp>,
        selected: Vec<String>,
        stats: StatsSnapshot,
    },
    Change {
        change: RowChange,
        stats: Option<EventStats>,
    },
    Selection {
        selected: Vec<String>,
    },
    StatusResult {
        rsvp_id: String,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        guest: Option<Rsvp>,
    },
    MessageResult {
        sent: usize,
        failed: usize,
        skipped: usize,
    },
    Error {
        message: String,
    },
}
