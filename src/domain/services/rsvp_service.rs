use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domain::{
    models::{
        auth::SessionUser,
        change::RowChange,
        event::Event,
        rsvp::{NewRsvpParams, Rsvp, RsvpHistory, RsvpStatus},
        settings::{EventSettings, ReminderSettings},
    },
    ports::{ChangePublisher, RsvpRepository, SettingsRepository},
    services::{
        guest_import::{is_valid_email, is_valid_phone, parse_guests},
        notification_service::NotificationService,
        reminders::ReminderScheduler,
    },
};
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewGuest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A respondent's own answer from the public invitation page.
#[derive(Debug, Clone, Deserialize)]
pub struct RsvpAnswer {
    pub status: RsvpStatus,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub guests_count: i32,
    pub dietary_restrictions: Option<String>,
    pub message: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn pending_guest(event: &Event, guest: NewGuest) -> Result<Rsvp, AppError> {
    let name = guest.name.trim().to_string();
    let email = clean(guest.email);
    let phone = clean(guest.phone);

    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if email.is_none() && phone.is_none() {
        return Err(AppError::Validation("Email or phone is required".into()));
    }
    if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
        return Err(AppError::Validation("Invalid phone".into()));
    }

    Ok(Rsvp::new(NewRsvpParams {
        event_id: event.id.clone(),
        user_id: None,
        name,
        email,
        phone,
        status: RsvpStatus::Pending,
        guests_count: 0,
        dietary_restrictions: None,
        message: None,
    }))
}

/// Every write to `event_rsvps` goes through here so the change feed and the
/// reminder queue stay in step with the table.
pub struct RsvpService {
    rsvps: Arc<dyn RsvpRepository>,
    settings: Arc<dyn SettingsRepository>,
    notifications: Arc<NotificationService>,
    scheduler: Arc<ReminderScheduler>,
    publisher: Arc<dyn ChangePublisher>,
}

impl RsvpService {
    pub fn new(
        rsvps: Arc<dyn RsvpRepository>,
        settings: Arc<dyn SettingsRepository>,
        notifications: Arc<NotificationService>,
        scheduler: Arc<ReminderScheduler>,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        Self { rsvps, settings, notifications, scheduler, publisher }
    }

    pub async fn list(&self, event_id: &str) -> Result<Vec<Rsvp>, AppError> {
        self.rsvps.list_by_event(event_id).await
    }

    pub async fn find(&self, rsvp_id: &str) -> Result<Rsvp, AppError> {
        self.rsvps.find_by_id(rsvp_id).await?
            .ok_or_else(|| AppError::NotFound("RSVP not found".into()))
    }

    pub async fn history(&self, rsvp_id: &str) -> Result<Vec<RsvpHistory>, AppError> {
        self.rsvps.list_history(rsvp_id).await
    }

    pub async fn event_settings(&self, event_id: &str) -> Result<EventSettings, AppError> {
        Ok(self.settings.find_settings(event_id).await?
            .unwrap_or_else(|| EventSettings::defaults_for(event_id)))
    }

    /// Organizer adds a single guest; the row starts as `pending`.
    pub async fn add_guest(&self, event: &Event, guest: NewGuest) -> Result<Rsvp, AppError> {
        let rsvp = pending_guest(event, guest)?;
        let started = Instant::now();
        let created = self.rsvps.create(&rsvp).await?;
        self.publisher.publish(RowChange::insert(created.clone()).started(started));
        Ok(created)
    }

    /// Adds a batch of guests in one transaction; nothing is written when any entry is invalid.
    pub async fn add_guests(&self, event: &Event, guests: Vec<NewGuest>) -> Result<Vec<Rsvp>, AppError> {
        let mut errors = Vec::new();
        let mut rows = Vec::with_capacity(guests.len());
        for (index, guest) in guests.into_iter().enumerate() {
            match pending_guest(event, guest) {
                Ok(row) => rows.push(row),
                Err(AppError::Validation(msg)) => errors.push(format!("Guest {}: {}", index + 1, msg)),
                Err(e) => return Err(e),
            }
        }
        if !errors.is_empty() {
            return Err(AppError::InvalidRows(errors));
        }
        if rows.is_empty() {
            return Ok(rows);
        }

        let started = Instant::now();
        let created = self.rsvps.create_many(&rows).await?;
        for row in &created {
            self.publisher.publish(RowChange::insert(row.clone()).started(started));
        }
        Ok(created)
    }

    /// Parses the pasted text and inserts every guest, or none when any line is bad.
    #[instrument(skip(self, event, text), fields(event_id = %event.id))]
    pub async fn import(&self, event: &Event, text: &str) -> Result<Vec<Rsvp>, AppError> {
        let guests = parse_guests(text)?;
        if guests.is_empty() {
            return Err(AppError::Validation("No guests found in the input".into()));
        }

        let rows: Vec<Rsvp> = guests.into_iter()
            .map(|guest| Rsvp::new(NewRsvpParams {
                event_id: event.id.clone(),
                user_id: None,
                name: guest.name,
                email: guest.email,
                phone: guest.phone,
                status: RsvpStatus::Pending,
                guests_count: 0,
                dietary_restrictions: None,
                message: None,
            }))
            .collect();

        let started = Instant::now();
        let created = self.rsvps.create_many(&rows).await?;
        for row in &created {
            self.publisher.publish(RowChange::insert(row.clone()).started(started));
        }
        info!(imported = created.len(), "Guests imported");
        Ok(created)
    }

    /// Inserts or updates the caller's own RSVP for the event.
    #[instrument(skip(self, event, user, answer), fields(event_id = %event.id, user_id = %user.id))]
    pub async fn respond(&self, event: &Event, user: &SessionUser, answer: RsvpAnswer, now: DateTime<Utc>) -> Result<Rsvp, AppError> {
        if !answer.status.is_answer() {
            return Err(AppError::Validation("Status must be confirmed, maybe or declined".into()));
        }
        if answer.guests_count < 0 {
            return Err(AppError::Validation("guests_count cannot be negative".into()));
        }

        let settings = self.event_settings(&event.id).await?;
        if settings.deadline_passed(now.with_timezone(&event.tz()).date_naive()) {
            return Err(AppError::Forbidden("The RSVP deadline has passed".into()));
        }
        if answer.guests_count > 0 && !settings.allow_plus_ones {
            return Err(AppError::Validation("This event does not allow plus-ones".into()));
        }

        let email = clean(answer.email).or_else(|| Some(user.email.clone()));
        if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            return Err(AppError::Validation("Invalid email".into()));
        }
        let phone = clean(answer.phone);
        if phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
            return Err(AppError::Validation("Invalid phone".into()));
        }

        let rsvp = Rsvp::new(NewRsvpParams {
            event_id: event.id.clone(),
            user_id: Some(user.id.clone()),
            name: clean(answer.name).unwrap_or_else(|| user.display_name.clone()),
            email,
            phone,
            status: answer.status,
            guests_count: answer.guests_count,
            dietary_restrictions: clean(answer.dietary_restrictions),
            message: clean(answer.message),
        });

        let started = Instant::now();
        let (previous, stored) = self.rsvps.upsert_for_respondent(&rsvp).await?;
        let newly_confirmed = stored.status() == RsvpStatus::Confirmed
            && previous.as_ref().map(Rsvp::status) != Some(RsvpStatus::Confirmed);

        let change = match previous {
            Some(old) => RowChange::update(old, stored.clone()),
            None => RowChange::insert(stored.clone()),
        };
        self.publisher.publish(change.started(started));

        let reminder_settings = self.notifications.reminder_settings(&stored.id).await?;
        self.scheduler.reschedule(event, &stored, &reminder_settings, newly_confirmed, now).await?;

        info!(rsvp_id = %stored.id, status = %stored.status(), "RSVP recorded");
        Ok(stored)
    }

    /// Organizer-side status change, recorded in the history table.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn update_status(&self, event: &Event, rsvp_id: &str, status: RsvpStatus, changed_by: Option<&str>) -> Result<Rsvp, AppError> {
        if !status.is_answer() {
            return Err(AppError::Validation("Status must be confirmed, maybe or declined".into()));
        }

        let started = Instant::now();
        let (old, new) = self.rsvps.update_status(rsvp_id, status, changed_by).await?;
        self.publisher.publish(RowChange::update(old, new.clone()).started(started));

        let reminder_settings = self.notifications.reminder_settings(&new.id).await?;
        self.scheduler.reschedule(event, &new, &reminder_settings, false, Utc::now()).await?;

        info!(rsvp_id, status = %status, "RSVP status changed");
        Ok(new)
    }

    pub async fn save_reminder_settings(&self, event: &Event, rsvp: &Rsvp, settings: &ReminderSettings) -> Result<ReminderSettings, AppError> {
        let saved = self.notifications.save_reminder_settings(settings).await?;
        self.scheduler.reschedule(event, rsvp, &saved, false, Utc::now()).await?;
        Ok(saved)
    }

    /// Moves every guest's queued reminders to the event's current start.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn reschedule_event(&self, event: &Event) -> Result<usize, AppError> {
        let now = Utc::now();
        let rows = self.rsvps.list_by_event(&event.id).await?;
        for rsvp in &rows {
            let settings = self.notifications.reminder_settings(&rsvp.id).await?;
            self.scheduler.move_reminders(event, rsvp, &settings, now).await?;
        }
        info!(guests = rows.len(), "Reminders moved to the new start time");
        Ok(rows.len())
    }

    /// Announces the rows removed by an event delete so live sessions drop them.
    pub fn publish_removed(&self, rows: Vec<Rsvp>, started: Instant) {
        for row in rows {
            self.publisher.publish(RowChange::delete(row).started(started));
        }
    }

    pub async fn delete(&self, rsvp_id: &str) -> Result<Rsvp, AppError> {
        let started = Instant::now();
        let removed = self.rsvps.delete(rsvp_id).await?;
        self.scheduler.cancel(rsvp_id).await?;
        self.publisher.publish(RowChange::delete(removed.clone()).started(started));
        info!(rsvp_id, "RSVP removed");
        Ok(removed)
    }
}
