use std::sync::Arc;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::{job::Job, notification::NotificationKind};
use crate::domain::services::{reminders::kind_for_job, share::public_url};
use crate::error::AppError;

const BATCH_SIZE: i32 = 10;
/// Expired refresh tokens are purged every this many polls.
const PURGE_EVERY: u32 = 720;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!(poll_secs = state.config.worker_poll_interval.as_secs(), "Starting background job worker...");

    let mut polls: u32 = 0;
    loop {
        run_due_jobs(&state).await;

        polls = polls.wrapping_add(1);
        if polls % PURGE_EVERY == 0 {
            match state.auth_repo.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Purged expired refresh tokens"),
                Err(e) => error!("Failed to purge refresh tokens: {:?}", e),
            }
        }

        sleep(state.config.worker_poll_interval).await;
    }
}

/// Claims and processes one batch of due jobs. Returns how many were claimed.
pub async fn run_due_jobs(state: &Arc<AppState>) -> usize {
    let jobs = match state.job_repo.find_pending(BATCH_SIZE).await {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("Failed to fetch pending jobs: {:?}", e);
            return 0;
        }
    };

    let claimed = jobs.len();
    for job in jobs {
        let span = info_span!(
            "background_job",
            job_id = %job.id,
            job_type = %job.job_type,
            rsvp_id = %job.payload.rsvp_id
        );

        async {
            match process_job(state, &job).await {
                Ok(()) => {
                    info!("Job completed");
                    if let Err(e) = state.job_repo.update_status(&job.id, "COMPLETED", None).await {
                        error!("Failed to mark job as completed: {:?}", e);
                    }
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    error!("Job failed with error: {}", err_msg);
                    if let Err(up_err) = state.job_repo.update_status(&job.id, "FAILED", Some(err_msg)).await {
                        error!("Failed to mark job as failed: {:?}", up_err);
                    }
                }
            }
        }
            .instrument(span)
            .await;
    }

    if claimed > 0 {
        debug!(claimed, "Processed job batch");
    }
    claimed
}

async fn process_job(state: &Arc<AppState>, job: &Job) -> Result<(), AppError> {
    let kind = kind_for_job(&job.job_type)
        .ok_or_else(|| AppError::InternalWithMsg(format!("Unknown job type {}", job.job_type)))?;

    // the guest or the event may have been removed after the job was queued
    let Some(rsvp) = state.rsvp_repo.find_by_id(&job.payload.rsvp_id).await? else {
        warn!("RSVP no longer exists, skipping");
        return Ok(());
    };
    let Some(event) = state.event_repo.find_by_id(&rsvp.event_id).await? else {
        warn!(event_id = %rsvp.event_id, "Event no longer exists, skipping");
        return Ok(());
    };

    let link = public_url(&state.config.public_base_url, &event);
    let records = match kind {
        NotificationKind::Confirmation => state.notification_service.send_confirmation(&event, &rsvp, &link).await?,
        _ => {
            if !rsvp.status().wants_reminders() {
                info!(status = %rsvp.status(), "Guest no longer attending, skipping reminder");
                return Ok(());
            }
            state.notification_service.send_reminder(&event, &rsvp, kind, &link).await?
        }
    };

    debug!(attempts = records.len(), "Notifications recorded");
    Ok(())
}
