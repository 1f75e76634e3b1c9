use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::domain::{
    models::{
        event::Event,
        job::{Job, JOB_CONFIRMATION, JOB_REMINDER_1DAY, JOB_REMINDER_7DAY},
        notification::NotificationKind,
        rsvp::Rsvp,
        settings::ReminderSettings,
    },
    ports::JobRepository,
};
use crate::error::AppError;

/// Reminder jobs due for an answer, skipping offsets already in the past or disabled by the guest.
pub fn plan_reminders(event: &Event, rsvp: &Rsvp, settings: &ReminderSettings, now: DateTime<Utc>) -> Vec<Job> {
    if !rsvp.status().wants_reminders() {
        return Vec::new();
    }
    let Some(start) = event.starts_at() else {
        return Vec::new();
    };

    [
        (JOB_REMINDER_7DAY, Duration::days(7), settings.one_week_reminder),
        (JOB_REMINDER_1DAY, Duration::days(1), settings.one_day_reminder),
    ]
    .into_iter()
    .filter(|(_, _, enabled)| *enabled)
    .map(|(job_type, offset, _)| (job_type, start - offset))
    .filter(|(_, execute_at)| *execute_at > now)
    .map(|(job_type, execute_at)| Job::new(job_type, rsvp.id.clone(), event.id.clone(), execute_at))
    .collect()
}

pub fn kind_for_job(job_type: &str) -> Option<NotificationKind> {
    match job_type {
        JOB_CONFIRMATION => Some(NotificationKind::Confirmation),
        JOB_REMINDER_7DAY => Some(NotificationKind::ReminderOneWeek),
        JOB_REMINDER_1DAY => Some(NotificationKind::ReminderOneDay),
        _ => None,
    }
}

pub struct ReminderScheduler {
    jobs: Arc<dyn JobRepository>,
}

impl ReminderScheduler {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    /// Replaces whatever is queued for the RSVP with the schedule its current answer implies.
    pub async fn reschedule(
        &self,
        event: &Event,
        rsvp: &Rsvp,
        settings: &ReminderSettings,
        send_confirmation: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, AppError> {
        let cancelled = self.jobs.cancel_jobs_for_rsvp(&rsvp.id).await?;
        if cancelled > 0 {
            debug!(rsvp_id = %rsvp.id, cancelled, "Cancelled queued notifications");
        }
        if event.is_temporary {
            return Ok(Vec::new());
        }

        let mut planned = plan_reminders(event, rsvp, settings, now);
        if send_confirmation {
            planned.push(Job::new(JOB_CONFIRMATION, rsvp.id.clone(), event.id.clone(), now));
        }

        let mut created = Vec::with_capacity(planned.len());
        for job in &planned {
            created.push(self.jobs.create(job).await?);
        }

        info!(rsvp_id = %rsvp.id, scheduled = created.len(), "Notifications scheduled");
        Ok(created)
    }

    /// Re-plans reminders after the event moved. A confirmation still waiting in the queue is kept.
    pub async fn move_reminders(
        &self,
        event: &Event,
        rsvp: &Rsvp,
        settings: &ReminderSettings,
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, AppError> {
        let confirmation_queued = self.jobs.list_for_rsvp(&rsvp.id).await?
            .iter()
            .any(|job| job.job_type == JOB_CONFIRMATION && job.status == "PENDING");
        self.reschedule(event, rsvp, settings, confirmation_queued, now).await
    }

    pub async fn cancel(&self, rsvp_id: &str) -> Result<u64, AppError> {
        self.jobs.cancel_jobs_for_rsvp(rsvp_id).await
    }
}
