use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct EventSettings {
    pub event_id: String,
    pub show_guest_list: bool,
    pub allow_plus_ones: bool,
    pub show_dietary_restrictions: bool,
    pub rsvp_deadline: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl EventSettings {
    pub fn defaults_for(event_id: &str) -> Self {
        Self {
            event_id: event_id.to_string(),
            show_guest_list: true,
            allow_plus_ones: true,
            show_dietary_restrictions: true,
            rsvp_deadline: None,
            updated_at: Utc::now(),
        }
    }

    pub fn deadline_passed(&self, today: NaiveDate) -> bool {
        self.rsvp_deadline.is_some_and(|deadline| today > deadline)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct CoOrganizer {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CoOrganizer {
    pub fn new(event_id: String, name: String, email: Option<String>, avatar_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            name,
            email,
            avatar_url,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct ReminderSettings {
    pub id: String,
    pub rsvp_id: String,
    pub email_reminders: bool,
    pub whatsapp_reminders: bool,
    pub one_week_reminder: bool,
    pub one_day_reminder: bool,
    pub update_notifications: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReminderSettings {
    pub fn defaults_for(rsvp_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            rsvp_id: rsvp_id.to_string(),
            email_reminders: true,
            whatsapp_reminders: false,
            one_week_reminder: true,
            one_day_reminder: true,
            update_notifications: true,
            created_at: now,
            updated_at: now,
        }
    }
}
