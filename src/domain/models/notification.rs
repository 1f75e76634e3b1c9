use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Whatsapp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Whatsapp => "whatsapp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Confirmation,
    #[serde(rename = "reminder_1day")]
    ReminderOneDay,
    #[serde(rename = "reminder_7day")]
    ReminderOneWeek,
    Update,
    Message,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Confirmation => "confirmation",
            NotificationKind::ReminderOneDay => "reminder_1day",
            NotificationKind::ReminderOneWeek => "reminder_7day",
            NotificationKind::Update => "update",
            NotificationKind::Message => "message",
        }
    }
}

/// Append-only audit row for every attempted send.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct NotificationRecord {
    pub id: String,
    pub event_id: String,
    pub rsvp_id: Option<String>,
    pub user_id: Option<String>,
    pub notification_type: String,
    pub channel: String,
    pub status: String, // sent, failed, skipped
    pub message_id: Option<String>,
    pub metadata: String,
    pub created_at: DateTime<Utc>,
}

pub struct NotificationAttempt<'a> {
    pub event_id: &'a str,
    pub rsvp_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub kind: NotificationKind,
    pub channel: Channel,
}

impl NotificationRecord {
    pub fn new(attempt: &NotificationAttempt<'_>, status: &str, message_id: Option<String>, metadata: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: attempt.event_id.to_string(),
            rsvp_id: attempt.rsvp_id.map(str::to_string),
            user_id: attempt.user_id.map(str::to_string),
            notification_type: attempt.kind.as_str().to_string(),
            channel: attempt.channel.as_str().to_string(),
            status: status.to_string(),
            message_id,
            metadata: metadata.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}
