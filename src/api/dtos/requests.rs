use crate::domain::models::{notification::Channel, rsvp::RsvpStatus};
use crate::domain::services::wizard::WizardData;
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct BeginDraftRequest {
    pub draft_token: String,
}

#[derive(Deserialize)]
pub struct FinalizeRequest {
    pub data: WizardData,
}

/// Partial update; absent fields keep their stored value.
#[derive(Deserialize, Default)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub timezone: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub banner_image_url: Option<String>,
    pub is_private: Option<bool>,
    pub save_the_date_deadline: Option<NaiveDate>,
    pub save_the_date_message: Option<String>,
}

#[derive(Deserialize)]
pub struct PublicEventQuery {
    #[serde(rename = "ref")]
    pub share_code: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub show_guest_list: Option<bool>,
    pub allow_plus_ones: Option<bool>,
    pub show_dietary_restrictions: Option<bool>,
    pub rsvp_deadline: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct CoOrganizerInput {
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub struct ReplaceCoOrganizersRequest {
    pub co_organizers: Vec<CoOrganizerInput>,
}

#[derive(Deserialize)]
pub struct ImportGuestsRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: RsvpStatus,
}

#[derive(Deserialize)]
pub struct BulkMessageRequest {
    pub rsvp_ids: Vec<String>,
    pub channels: Vec<Channel>,
    pub subject: String,
    pub body: String,
}

#[derive(Deserialize)]
pub struct ReminderSettingsRequest {
    pub email_reminders: Option<bool>,
    pub whatsapp_reminders: Option<bool>,
    pub one_week_reminder: Option<bool>,
    pub one_day_reminder: Option<bool>,
    pub update_notifications: Option<bool>,
}

#[derive(Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

/// Commands a live guest-list session accepts.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveCommand {
    SetStatus { rsvp_id: String, status: RsvpStatus },
    ToggleSelect { rsvp_id: String },
    SelectAll,
    ClearSelection,
    SendMessage { channels: Vec<Channel>, subject: String, body: String },
    Refresh,
}
