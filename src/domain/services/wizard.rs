use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::models::event::{parse_time_of_day, Event, DEFAULT_CAPACITY, DEFAULT_START_TIME};
use crate::domain::ports::{ClientStorage, EventRepository};
use crate::error::AppError;

pub const KEY_DATA: &str = "eventCreationData";
pub const KEY_STEP: &str = "eventCreationStep";
pub const KEY_TEMPORARY_EVENT: &str = "temporaryEventId";
pub const KEY_FROM_WIZARD: &str = "fromEventCreation";

const MAX_DRAFT_TOKEN_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    TypeSelection,
    BasicDetails,
    GuestManagement,
    ShareInvites,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::TypeSelection => 1,
            WizardStep::BasicDetails => 2,
            WizardStep::GuestManagement => 3,
            WizardStep::ShareInvites => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(WizardStep::TypeSelection),
            2 => Some(WizardStep::BasicDetails),
            3 => Some(WizardStep::GuestManagement),
            4 => Some(WizardStep::ShareInvites),
            _ => None,
        }
    }

    fn following(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    fn preceding(&self) -> Option<Self> {
        Self::from_number(self.number().checked_sub(1)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicDetails {
    pub title: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub location: String,
    pub max_capacity: Option<i32>,
    pub banner_image: Option<String>,
    pub is_private: bool,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveTheDate {
    pub deadline: Option<NaiveDate>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardGuest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Everything the organizer has entered so far; serialized verbatim into client storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardData {
    pub event_type: String,
    pub basic_details: BasicDetails,
    pub save_the_date: SaveTheDate,
    pub guests: Vec<WizardGuest>,
    pub temporary_event_id: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("Choose an event type")]
    MissingEventType,
    #[error("Title must be at least 2 characters")]
    TitleTooShort,
    #[error("Description is required")]
    MissingDescription,
    #[error("Date is required")]
    MissingDate,
    #[error("Date cannot be in the past")]
    DateInPast,
    #[error("Save-the-date deadline must be before the event date")]
    DeadlineNotBeforeEvent,
    #[error("Save-the-date message is required when a deadline is set")]
    MissingSaveTheDateMessage,
    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),
    #[error("Capacity must be positive")]
    InvalidCapacity,
    #[error("Already at the first step")]
    AtFirstStep,
    #[error("Invalid wizard step {0}")]
    InvalidStep(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "step", rename_all = "snake_case")]
pub enum Advance {
    Moved(WizardStep),
    AuthRequired,
    ReadyToFinalize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWizard {
    pub step: WizardStep,
    pub data: WizardData,
}

impl Default for EventWizard {
    fn default() -> Self {
        Self { step: WizardStep::TypeSelection, data: WizardData::default() }
    }
}

impl EventWizard {
    pub fn new(step: WizardStep, data: WizardData) -> Self {
        Self { step, data }
    }

    /// Checks the current step's guard and moves forward when it holds.
    pub fn next(&mut self, authenticated: bool, now: DateTime<Utc>) -> Result<Advance, WizardError> {
        match self.step {
            WizardStep::TypeSelection => {
                if self.data.event_type.trim().is_empty() {
                    return Err(WizardError::MissingEventType);
                }
                if !authenticated {
                    return Ok(Advance::AuthRequired);
                }
            }
            WizardStep::BasicDetails => validate_details(&self.data, now)?,
            WizardStep::GuestManagement => {}
            WizardStep::ShareInvites => return Ok(Advance::ReadyToFinalize),
        }

        match self.step.following() {
            Some(step) => {
                self.step = step;
                Ok(Advance::Moved(step))
            }
            None => Ok(Advance::ReadyToFinalize),
        }
    }

    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let step = self.step.preceding().ok_or(WizardError::AtFirstStep)?;
        self.step = step;
        Ok(step)
    }
}

fn resolve_timezone(details: &BasicDetails) -> Result<Tz, WizardError> {
    match details.timezone.as_deref().map(str::trim).filter(|tz| !tz.is_empty()) {
        Some(name) => name.parse().map_err(|_| WizardError::InvalidTimezone(name.to_string())),
        None => Ok(chrono_tz::UTC),
    }
}

/// The guards of the first two steps; finalizing re-runs them.
pub fn validate_details(data: &WizardData, now: DateTime<Utc>) -> Result<(), WizardError> {
    if data.event_type.trim().is_empty() {
        return Err(WizardError::MissingEventType);
    }

    let details = &data.basic_details;
    if details.title.trim().chars().count() < 2 {
        return Err(WizardError::TitleTooShort);
    }
    if details.description.trim().is_empty() {
        return Err(WizardError::MissingDescription);
    }

    let tz = resolve_timezone(details)?;
    let date = details.date.ok_or(WizardError::MissingDate)?;
    if date < now.with_timezone(&tz).date_naive() {
        return Err(WizardError::DateInPast);
    }

    if !details.start_time.trim().is_empty() && parse_time_of_day(&details.start_time).is_none() {
        return Err(WizardError::InvalidTime(details.start_time.clone()));
    }
    if let Some(end) = details.end_time.as_deref().filter(|t| !t.trim().is_empty()) {
        if parse_time_of_day(end).is_none() {
            return Err(WizardError::InvalidTime(end.to_string()));
        }
    }
    if details.max_capacity.is_some_and(|c| c <= 0) {
        return Err(WizardError::InvalidCapacity);
    }

    if let Some(deadline) = data.save_the_date.deadline {
        if deadline >= date {
            return Err(WizardError::DeadlineNotBeforeEvent);
        }
        if data.save_the_date.message.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            return Err(WizardError::MissingSaveTheDateMessage);
        }
    }

    Ok(())
}

/// Copies validated wizard data onto an event row.
fn apply_details(event: &mut Event, data: &WizardData) -> Result<(), WizardError> {
    let details = &data.basic_details;
    let tz = resolve_timezone(details)?;

    event.title = details.title.trim().to_string();
    event.description = details.description.trim().to_string();
    event.event_type = data.event_type.trim().to_string();
    event.event_date = details.date.ok_or(WizardError::MissingDate)?;
    event.start_time = if details.start_time.trim().is_empty() {
        DEFAULT_START_TIME.to_string()
    } else {
        details.start_time.trim().to_string()
    };
    event.end_time = details.end_time.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    event.timezone = tz.name().to_string();
    event.location = details.location.trim().to_string();
    event.capacity = details.max_capacity.unwrap_or(DEFAULT_CAPACITY);
    event.banner_image_url = details.banner_image.clone().filter(|url| !url.is_empty());
    event.is_private = details.is_private;
    event.save_the_date_deadline = data.save_the_date.deadline;
    event.save_the_date_message = data.save_the_date.deadline
        .and(data.save_the_date.message.as_deref())
        .map(|m| m.trim().to_string());
    event.is_temporary = false;
    event.updated_at = Utc::now();
    Ok(())
}

/// Parks the wizard in client storage while the visitor signs in.
pub async fn suspend_for_auth(storage: &dyn ClientStorage, client_id: &str, wizard: &EventWizard) -> Result<(), AppError> {
    let data = serde_json::to_string(&wizard.data)
        .map_err(|e| AppError::InternalWithMsg(format!("wizard serialization failed: {}", e)))?;

    storage.set(client_id, KEY_DATA, &data).await?;
    storage.set(client_id, KEY_STEP, &wizard.step.number().to_string()).await?;
    storage.set(client_id, KEY_FROM_WIZARD, "true").await?;
    Ok(())
}

/// Restores a parked wizard once a session exists, clearing the parked keys.
pub async fn resume(storage: &dyn ClientStorage, client_id: &str, authenticated: bool) -> Result<Option<EventWizard>, AppError> {
    if !authenticated {
        return Ok(None);
    }

    let data = storage.get(client_id, KEY_DATA).await?;
    let step = storage.get(client_id, KEY_STEP).await?;

    let restored = match (data, step) {
        (Some(data), Some(step)) => {
            let data = serde_json::from_str::<WizardData>(&data);
            let step = step.parse::<u8>().ok().and_then(WizardStep::from_number);
            match (data, step) {
                (Ok(data), Some(step)) => Some(EventWizard::new(step, data)),
                _ => {
                    warn!(client_id, "Discarding unreadable wizard state");
                    None
                }
            }
        }
        _ => None,
    };

    storage.remove(client_id, KEY_DATA).await?;
    storage.remove(client_id, KEY_STEP).await?;
    storage.remove(client_id, KEY_FROM_WIZARD).await?;

    Ok(restored)
}

pub struct Finalized {
    pub event: Event,
    pub created: bool,
}

/// Owns the placeholder event's lifecycle: begin-draft and finalize.
pub struct DraftService {
    events: Arc<dyn EventRepository>,
    storage: Arc<dyn ClientStorage>,
}

impl DraftService {
    pub fn new(events: Arc<dyn EventRepository>, storage: Arc<dyn ClientStorage>) -> Self {
        Self { events, storage }
    }

    /// Idempotent on `draft_token`: repeating the call returns the same placeholder.
    pub async fn begin_draft(&self, client_id: &str, draft_token: &str, owner_id: &str) -> Result<Event, AppError> {
        let draft_token = draft_token.trim();
        if draft_token.is_empty() || draft_token.len() > MAX_DRAFT_TOKEN_LEN {
            return Err(AppError::Validation("draft_token must be 1-128 characters".into()));
        }

        if let Some(existing) = self.events.find_by_draft_token(draft_token).await? {
            return self.adopt(client_id, existing, owner_id).await;
        }

        if let Some(cached_id) = self.storage.get(client_id, KEY_TEMPORARY_EVENT).await? {
            if let Some(existing) = self.events.find_by_id(&cached_id).await? {
                if existing.is_temporary && existing.is_owned_by(owner_id) {
                    return Ok(existing);
                }
            }
        }

        let placeholder = Event::placeholder(draft_token.to_string(), Some(owner_id.to_string()));
        let event = match self.events.create(&placeholder).await {
            Ok(event) => event,
            Err(e) if e.is_unique_violation() => {
                // a concurrent request with the same token won the insert
                let existing = self.events.find_by_draft_token(draft_token).await?
                    .ok_or(AppError::Internal)?;
                return self.adopt(client_id, existing, owner_id).await;
            }
            Err(e) => return Err(e),
        };

        self.storage.set(client_id, KEY_TEMPORARY_EVENT, &event.id).await?;
        info!(event_id = %event.id, "Draft event created");
        Ok(event)
    }

    async fn adopt(&self, client_id: &str, event: Event, owner_id: &str) -> Result<Event, AppError> {
        if !event.is_owned_by(owner_id) {
            return Err(AppError::Forbidden("Draft belongs to another user".into()));
        }
        self.storage.set(client_id, KEY_TEMPORARY_EVENT, &event.id).await?;
        Ok(event)
    }

    /// Updates the placeholder in place when there is one, otherwise inserts the event.
    pub async fn finalize(&self, client_id: &str, owner_id: &str, data: &WizardData, now: DateTime<Utc>) -> Result<Finalized, AppError> {
        validate_details(data, now)?;

        let placeholder_id = match data.temporary_event_id.clone() {
            Some(id) => Some(id),
            None => self.storage.get(client_id, KEY_TEMPORARY_EVENT).await?,
        };

        let placeholder = match placeholder_id {
            Some(id) => self.events.find_by_id(&id).await?,
            None => None,
        };

        let finalized = match placeholder {
            Some(mut event) => {
                if !event.is_owned_by(owner_id) {
                    return Err(AppError::Forbidden("Draft belongs to another user".into()));
                }
                apply_details(&mut event, data)?;
                Finalized { event: self.events.update(&event).await?, created: false }
            }
            None => {
                let mut event = Event::placeholder(String::new(), Some(owner_id.to_string()));
                event.draft_token = None;
                apply_details(&mut event, data)?;
                Finalized { event: self.events.create(&event).await?, created: true }
            }
        };

        self.storage.remove(client_id, KEY_TEMPORARY_EVENT).await?;
        info!(event_id = %finalized.event.id, created = finalized.created, "Event finalized");
        Ok(finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStorage {
        entries: Mutex<HashMap<(String, String), String>>,
    }

    #[async_trait]
    impl ClientStorage for MemoryStorage {
        async fn get(&self, client_id: &str, key: &str) -> Result<Option<String>, AppError> {
            Ok(self.entries.lock().get(&(client_id.to_string(), key.to_string())).cloned())
        }
        async fn set(&self, client_id: &str, key: &str, value: &str) -> Result<(), AppError> {
            self.entries.lock().insert((client_id.to_string(), key.to_string()), value.to_string());
            Ok(())
        }
        async fn remove(&self, client_id: &str, key: &str) -> Result<(), AppError> {
            self.entries.lock().remove(&(client_id.to_string(), key.to_string()));
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2030-06-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn filled() -> WizardData {
        WizardData {
            event_type: "birthday".into(),
            basic_details: BasicDetails {
                title: "Ana's 30th".into(),
                description: "Dinner and drinks".into(),
                date: Some(date("2030-07-01")),
                start_time: "20:00".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn step_one_requires_an_event_type() {
        let mut wizard = EventWizard::default();
        assert_eq!(wizard.next(true, now()), Err(WizardError::MissingEventType));
        assert_eq!(wizard.step, WizardStep::TypeSelection);
    }

    #[test]
    fn step_one_without_session_asks_for_auth_and_stays() {
        let mut wizard = EventWizard::new(WizardStep::TypeSelection, filled());
        assert_eq!(wizard.next(false, now()), Ok(Advance::AuthRequired));
        assert_eq!(wizard.step, WizardStep::TypeSelection);

        assert_eq!(wizard.next(true, now()), Ok(Advance::Moved(WizardStep::BasicDetails)));
    }

    #[test]
    fn basic_details_guard() {
        let mut data = filled();
        data.basic_details.title = " A ".into();
        let mut wizard = EventWizard::new(WizardStep::BasicDetails, data);
        assert_eq!(wizard.next(true, now()), Err(WizardError::TitleTooShort));

        wizard.data = filled();
        wizard.data.basic_details.date = Some(date("2030-05-31"));
        assert_eq!(wizard.next(true, now()), Err(WizardError::DateInPast));

        wizard.data = filled();
        wizard.data.basic_details.date = Some(date("2030-06-01"));
        assert_eq!(wizard.next(true, now()), Ok(Advance::Moved(WizardStep::GuestManagement)));
    }

    #[test]
    fn today_is_judged_in_the_event_timezone() {
        let mut data = filled();
        // 12:00 UTC on June 1st is already June 2nd in Auckland
        data.basic_details.date = Some(date("2030-06-01"));
        data.basic_details.timezone = Some("Pacific/Auckland".into());
        assert_eq!(validate_details(&data, now()), Err(WizardError::DateInPast));
    }

    #[test]
    fn save_the_date_rules() {
        let mut data = filled();
        data.save_the_date.deadline = Some(date("2030-07-01"));
        data.save_the_date.message = Some("Hold the date".into());
        assert_eq!(validate_details(&data, now()), Err(WizardError::DeadlineNotBeforeEvent));

        data.save_the_date.deadline = Some(date("2030-06-20"));
        data.save_the_date.message = Some("  ".into());
        assert_eq!(validate_details(&data, now()), Err(WizardError::MissingSaveTheDateMessage));

        data.save_the_date.message = Some("Hold the date".into());
        assert_eq!(validate_details(&data, now()), Ok(()));
    }

    #[test]
    fn back_is_allowed_above_step_one() {
        let mut wizard = EventWizard::new(WizardStep::GuestManagement, filled());
        assert_eq!(wizard.back(), Ok(WizardStep::BasicDetails));
        assert_eq!(wizard.back(), Ok(WizardStep::TypeSelection));
        assert_eq!(wizard.back(), Err(WizardError::AtFirstStep));
    }

    #[test]
    fn last_step_is_ready_to_finalize() {
        let mut wizard = EventWizard::new(WizardStep::ShareInvites, filled());
        assert_eq!(wizard.next(true, now()), Ok(Advance::ReadyToFinalize));
        assert_eq!(wizard.step, WizardStep::ShareInvites);
    }

    #[test]
    fn details_are_copied_with_defaults() {
        let mut event = Event::placeholder("tok".into(), Some("u1".into()));
        let mut data = filled();
        data.basic_details.start_time = String::new();
        apply_details(&mut event, &data).unwrap();

        assert!(!event.is_temporary);
        assert_eq!(event.start_time, DEFAULT_START_TIME);
        assert_eq!(event.capacity, DEFAULT_CAPACITY);
        assert_eq!(event.timezone, "UTC");
        assert_eq!(event.save_the_date_message, None);
    }

    #[tokio::test]
    async fn suspended_wizard_resumes_only_with_a_session() {
        let storage = MemoryStorage::default();
        let wizard = EventWizard::new(WizardStep::TypeSelection, filled());
        suspend_for_auth(&storage, "c1", &wizard).await.unwrap();
        assert_eq!(storage.get("c1", KEY_FROM_WIZARD).await.unwrap().as_deref(), Some("true"));

        assert_eq!(resume(&storage, "c1", false).await.unwrap(), None);
        assert!(storage.get("c1", KEY_DATA).await.unwrap().is_some());

        assert_eq!(resume(&storage, "c1", true).await.unwrap(), Some(wizard));
        assert!(storage.get("c1", KEY_DATA).await.unwrap().is_none());
        assert!(storage.get("c1", KEY_STEP).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_state_is_discarded() {
        let storage = MemoryStorage::default();
        storage.set("c1", KEY_DATA, "{not json").await.unwrap();
        storage.set("c1", KEY_STEP, "2").await.unwrap();

        assert_eq!(resume(&storage, "c1", true).await.unwrap(), None);
        assert!(storage.get("c1", KEY_DATA).await.unwrap().is_none());
    }
}
