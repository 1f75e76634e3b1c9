use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::{
    models::{
        event::Event,
        notification::{Attachment, Channel, NotificationAttempt, NotificationKind, NotificationRecord, OutboundMessage},
        rsvp::Rsvp,
        settings::ReminderSettings,
    },
    ports::{NotificationGateway, NotificationRepository},
    services::calendar,
};
use crate::error::AppError;

pub const STATUS_SENT: &str = "sent";
pub const STATUS_FAILED: &str = "failed";
pub const STATUS_SKIPPED: &str = "skipped";

pub struct Draft {
    pub subject: String,
    pub body: String,
}

/// Sends notifications over the gateway and appends an audit record for every attempt.
pub struct NotificationService {
    gateway: Arc<dyn NotificationGateway>,
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(gateway: Arc<dyn NotificationGateway>, repo: Arc<dyn NotificationRepository>) -> Self {
        Self { gateway, repo }
    }

    /// Stored preferences, or the defaults when the guest never saved any.
    pub async fn reminder_settings(&self, rsvp_id: &str) -> Result<ReminderSettings, AppError> {
        Ok(self.repo.find_reminder_settings(rsvp_id).await?
            .unwrap_or_else(|| ReminderSettings::defaults_for(rsvp_id)))
    }

    pub async fn save_reminder_settings(&self, settings: &ReminderSettings) -> Result<ReminderSettings, AppError> {
        self.repo.upsert_reminder_settings(settings).await
    }

    pub async fn history(&self, event_id: &str) -> Result<Vec<NotificationRecord>, AppError> {
        self.repo.list_by_event(event_id).await
    }

    pub async fn send_confirmation(&self, event: &Event, rsvp: &Rsvp, public_url: &str) -> Result<Vec<NotificationRecord>, AppError> {
        let settings = self.reminder_settings(&rsvp.id).await?;
        let draft = compose(NotificationKind::Confirmation, event, rsvp, public_url);

        // guests get the calendar file with their confirmation mail
        let attachment = match calendar::generate_ics(event) {
            Ok(ics) => Some(Attachment { filename: calendar::ics_filename(event), content: ics.into_bytes() }),
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Skipping calendar attachment");
                None
            }
        };

        self.deliver(event, rsvp, NotificationKind::Confirmation, &channels_for(&settings), &draft, attachment).await
    }

    pub async fn send_reminder(&self, event: &Event, rsvp: &Rsvp, kind: NotificationKind, public_url: &str) -> Result<Vec<NotificationRecord>, AppError> {
        let settings = self.reminder_settings(&rsvp.id).await?;
        let enabled = match kind {
            NotificationKind::ReminderOneWeek => settings.one_week_reminder,
            NotificationKind::ReminderOneDay => settings.one_day_reminder,
            _ => true,
        };
        if !enabled {
            info!(rsvp_id = %rsvp.id, kind = kind.as_str(), "Reminder disabled by guest");
            return Ok(Vec::new());
        }

        let draft = compose(kind, event, rsvp, public_url);
        self.deliver(event, rsvp, kind, &channels_for(&settings), &draft, None).await
    }

    /// Organizer message to a set of guests. Returns one record per guest and channel.
    pub async fn bulk_message(&self, event: &Event, recipients: &[Rsvp], channels: &[Channel], draft: &Draft) -> Result<Vec<NotificationRecord>, AppError> {
        let mut records = Vec::with_capacity(recipients.len() * channels.len());
        for rsvp in recipients {
            records.extend(self.deliver(event, rsvp, NotificationKind::Message, channels, draft, None).await?);
        }
        info!(event_id = %event.id, recipients = recipients.len(), "Bulk message dispatched");
        Ok(records)
    }

    async fn deliver(
        &self,
        event: &Event,
        rsvp: &Rsvp,
        kind: NotificationKind,
        channels: &[Channel],
        draft: &Draft,
        attachment: Option<Attachment>,
    ) -> Result<Vec<NotificationRecord>, AppError> {
        let mut records = Vec::with_capacity(channels.len());

        for &channel in channels {
            let attempt = NotificationAttempt {
                event_id: &event.id,
                rsvp_id: Some(&rsvp.id),
                user_id: rsvp.user_id.as_deref(),
                kind,
                channel,
            };

            let contact = match channel {
                Channel::Email => rsvp.email.as_deref(),
                Channel::Whatsapp => rsvp.phone.as_deref(),
            }
            .map(str::trim)
            .filter(|c| !c.is_empty());

            let record = match contact {
                None => NotificationRecord::new(&attempt, STATUS_SKIPPED, None, json!({ "reason": "no contact for channel" })),
                Some(recipient) => {
                    let message = OutboundMessage {
                        channel,
                        recipient: recipient.to_string(),
                        subject: draft.subject.clone(),
                        body: draft.body.clone(),
                        attachment: attachment.clone().filter(|_| channel == Channel::Email),
                    };
                    match self.gateway.send(&message).await {
                        Ok(message_id) => NotificationRecord::new(
                            &attempt,
                            STATUS_SENT,
                            Some(message_id),
                            json!({ "recipient": recipient, "sent_at": Utc::now() }),
                        ),
                        Err(e) => {
                            warn!(rsvp_id = %rsvp.id, channel = channel.as_str(), error = %e, "Notification delivery failed");
                            NotificationRecord::new(&attempt, STATUS_FAILED, None, json!({ "recipient": recipient, "error": e.to_string() }))
                        }
                    }
                }
            };

            self.repo.append(&record).await?;
            records.push(record);
        }

        Ok(records)
    }
}

pub fn channels_for(settings: &ReminderSettings) -> Vec<Channel> {
    let mut channels = Vec::with_capacity(2);
    if settings.email_reminders {
        channels.push(Channel::Email);
    }
    if settings.whatsapp_reminders {
        channels.push(Channel::Whatsapp);
    }
    channels
}

pub fn compose(kind: NotificationKind, event: &Event, rsvp: &Rsvp, public_url: &str) -> Draft {
    let when = format!("{} at {} ({})", event.event_date.format("%A, %B %-d, %Y"), event.start_time, event.timezone);
    let place = if event.location.is_empty() { String::new() } else { format!("\nWhere: {}", event.location) };

    let (subject, intro) = match kind {
        NotificationKind::Confirmation => (
            format!("You're confirmed for {}", event.title),
            format!("Thanks for your RSVP to {}.", event.title),
        ),
        NotificationKind::ReminderOneWeek => (
            format!("{} is one week away", event.title),
            format!("A reminder that {} is coming up next week.", event.title),
        ),
        NotificationKind::ReminderOneDay => (
            format!("{} is tomorrow", event.title),
            format!("A reminder that {} is tomorrow.", event.title),
        ),
        NotificationKind::Update => (
            format!("{} has been updated", event.title),
            format!("The details of {} have changed.", event.title),
        ),
        NotificationKind::Message => (
            format!("A message about {}", event.title),
            String::new(),
        ),
    };

    Draft {
        subject,
        body: format!("Hi {},\n\n{}\nWhen: {}{}\n\n{}", rsvp.name, intro, when, place, public_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::rsvp::{NewRsvpParams, RsvpStatus};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<OutboundMessage>>,
        fail_whatsapp: bool,
    }

    #[async_trait]
    impl NotificationGateway for RecordingGateway {
        async fn send(&self, message: &OutboundMessage) -> Result<String, AppError> {
            if self.fail_whatsapp && message.channel == Channel::Whatsapp {
                return Err(AppError::InternalWithMsg("gateway returned 502".into()));
            }
            let mut sent = self.sent.lock();
            sent.push(message.clone());
            Ok(format!("msg-{}", sent.len()))
        }
    }

    #[derive(Default)]
    struct MemoryNotifications {
        settings: Mutex<Vec<ReminderSettings>>,
        records: Mutex<Vec<NotificationRecord>>,
    }

    #[async_trait]
    impl NotificationRepository for MemoryNotifications {
        async fn find_reminder_settings(&self, rsvp_id: &str) -> Result<Option<ReminderSettings>, AppError> {
            Ok(self.settings.lock().iter().find(|s| s.rsvp_id == rsvp_id).cloned())
        }
        async fn upsert_reminder_settings(&self, settings: &ReminderSettings) -> Result<ReminderSettings, AppError> {
            let mut all = self.settings.lock();
            all.retain(|s| s.rsvp_id != settings.rsvp_id);
            all.push(settings.clone());
            Ok(settings.clone())
        }
        async fn append(&self, record: &NotificationRecord) -> Result<(), AppError> {
            self.records.lock().push(record.clone());
            Ok(())
        }
        async fn list_by_event(&self, event_id: &str) -> Result<Vec<NotificationRecord>, AppError> {
            Ok(self.records.lock().iter().filter(|r| r.event_id == event_id).cloned().collect())
        }
    }

    fn guest(email: Option<&str>, phone: Option<&str>) -> Rsvp {
        Rsvp::new(NewRsvpParams {
            event_id: "e1".into(),
            user_id: Some("u1".into()),
            name: "Ana".into(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            status: RsvpStatus::Confirmed,
            guests_count: 0,
            dietary_restrictions: None,
            message: None,
        })
    }

    fn event() -> Event {
        let mut event = Event::placeholder("tok".into(), None);
        event.id = "e1".into();
        event.title = "Launch".into();
        event
    }

    #[tokio::test]
    async fn every_channel_attempt_is_recorded() {
        let gateway = Arc::new(RecordingGateway { fail_whatsapp: true, ..Default::default() });
        let repo = Arc::new(MemoryNotifications::default());
        let service = NotificationService::new(gateway.clone(), repo.clone());
        let rsvp = guest(Some("ana@example.com"), Some("+351 900 000 000"));

        let mut settings = ReminderSettings::defaults_for(&rsvp.id);
        settings.whatsapp_reminders = true;
        service.save_reminder_settings(&settings).await.unwrap();

        let records = service.send_confirmation(&event(), &rsvp, "https://konvite.app/e/x").await.unwrap();

        let statuses: Vec<(&str, &str)> = records.iter().map(|r| (r.channel.as_str(), r.status.as_str())).collect();
        assert_eq!(statuses, vec![("email", STATUS_SENT), ("whatsapp", STATUS_FAILED)]);
        assert_eq!(repo.records.lock().len(), 2);

        let sent = gateway.sent.lock();
        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.filename, "Launch.ics");
    }

    #[tokio::test]
    async fn missing_contact_is_skipped() {
        let gateway = Arc::new(RecordingGateway::default());
        let repo = Arc::new(MemoryNotifications::default());
        let service = NotificationService::new(gateway.clone(), repo);

        let records = service.bulk_message(
            &event(),
            &[guest(None, Some("123"))],
            &[Channel::Email, Channel::Whatsapp],
            &Draft { subject: "Parking".into(), body: "Use the north lot".into() },
        ).await.unwrap();

        assert_eq!(records[0].status, STATUS_SKIPPED);
        assert_eq!(records[1].status, STATUS_SENT);
        assert_eq!(records[1].message_id.as_deref(), Some("msg-1"));
        assert!(gateway.sent.lock()[0].attachment.is_none());
    }

    #[tokio::test]
    async fn disabled_reminders_send_nothing() {
        let gateway = Arc::new(RecordingGateway::default());
        let repo = Arc::new(MemoryNotifications::default());
        let service = NotificationService::new(gateway.clone(), repo);
        let rsvp = guest(Some("ana@example.com"), None);

        let mut settings = ReminderSettings::defaults_for(&rsvp.id);
        settings.one_day_reminder = false;
        service.save_reminder_settings(&settings).await.unwrap();

        let records = service.send_reminder(&event(), &rsvp, NotificationKind::ReminderOneDay, "").await.unwrap();
        assert!(records.is_empty());
        assert!(gateway.sent.lock().is_empty());
    }
}
