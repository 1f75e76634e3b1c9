use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;
use uuid::Uuid;
use rand::{distributions::Alphanumeric, Rng};

pub const DEFAULT_START_TIME: &str = "19:00";
pub const DEFAULT_CAPACITY: i32 = 100;
const DEFAULT_DURATION_HOURS: i64 = 2;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub owner_id: Option<String>,
    pub short_id: String,
    #[serde(skip_serializing)]
    pub draft_token: Option<String>,
    pub title: String,
    pub description: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub start_time: String,
    pub end_time: Option<String>,
    pub timezone: String,
    pub location: String,
    pub capacity: i32,
    pub banner_image_url: Option<String>,
    pub is_private: bool,
    pub is_temporary: bool,
    pub save_the_date_deadline: Option<NaiveDate>,
    pub save_the_date_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Placeholder row created when a wizard session begins, so guests can
    /// reference it before the organizer has filled in any details.
    pub fn placeholder(draft_token: String, owner_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            short_id: generate_short_id(),
            draft_token: Some(draft_token),
            title: "Temporary event".to_string(),
            description: String::new(),
            event_type: "temp".to_string(),
            event_date: now.date_naive(),
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: None,
            timezone: "UTC".to_string(),
            location: String::new(),
            capacity: DEFAULT_CAPACITY,
            banner_image_url: None,
            is_private: false,
            is_temporary: true,
            save_the_date_deadline: None,
            save_the_date_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Event start as an instant, resolving the local date/time in the event timezone.
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        local_instant(self.tz(), self.event_date, &self.start_time)
    }

    /// Event end; two hours after the start when no end time is set.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        let start = self.starts_at()?;
        let end = self.end_time.as_deref()
            .and_then(|t| local_instant(self.tz(), self.event_date, t))
            .filter(|end| *end > start);

        Some(end.unwrap_or(start + Duration::hours(DEFAULT_DURATION_HOURS)))
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }
}

pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Wall-clock times skipped by a DST jump resolve to the same time one hour later.
fn local_instant(tz: Tz, date: NaiveDate, time: &str) -> Option<DateTime<Utc>> {
    let naive = date.and_time(parse_time_of_day(time)?);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn generate_short_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
