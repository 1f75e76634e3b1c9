use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Confirmed,
    Maybe,
    Declined,
    Pending,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Confirmed => "confirmed",
            RsvpStatus::Maybe => "maybe",
            RsvpStatus::Declined => "declined",
            RsvpStatus::Pending => "pending",
        }
    }

    /// Statuses a respondent or organizer may set explicitly.
    pub fn is_answer(&self) -> bool {
        !matches!(self, RsvpStatus::Pending)
    }

    /// Answers that keep the guest on the reminder schedule.
    pub fn wants_reminders(&self) -> bool {
        matches!(self, RsvpStatus::Confirmed | RsvpStatus::Maybe)
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RsvpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(RsvpStatus::Confirmed),
            "maybe" => Ok(RsvpStatus::Maybe),
            "declined" => Ok(RsvpStatus::Declined),
            "pending" => Ok(RsvpStatus::Pending),
            other => Err(format!("Unknown RSVP status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Rsvp {
    pub id: String,
    pub event_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub guests_count: i32,
    pub dietary_restrictions: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewRsvpParams {
    pub event_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: RsvpStatus,
    pub guests_count: i32,
    pub dietary_restrictions: Option<String>,
    pub message: Option<String>,
}

impl Rsvp {
    pub fn new(params: NewRsvpParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: params.event_id,
            user_id: params.user_id,
            name: params.name,
            email: params.email,
            phone: params.phone,
            status: params.status.as_str().to_string(),
            guests_count: params.guests_count.max(0),
            dietary_restrictions: params.dietary_restrictions,
            message: params.message,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rows written by older clients may carry unknown statuses; those count as pending.
    pub fn status(&self) -> RsvpStatus {
        self.status.parse().unwrap_or(RsvpStatus::Pending)
    }

    pub fn status_row(&self) -> StatusRow {
        StatusRow {
            status: self.status.clone(),
            guests_count: self.guests_count,
        }
    }
}

/// The two columns the statistics aggregator reads.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StatusRow {
    pub status: String,
    pub guests_count: i32,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RsvpHistory {
    pub id: String,
    pub rsvp_id: String,
    pub previous_status: String,
    pub new_status: String,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl RsvpHistory {
    pub fn new(rsvp_id: String, previous: &str, new: RsvpStatus, changed_by: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rsvp_id,
            previous_status: previous.to_string(),
            new_status: new.as_str().to_string(),
            changed_by,
            changed_at: Utc::now(),
        }
    }
}
