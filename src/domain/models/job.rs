use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const JOB_CONFIRMATION: &str = "CONFIRMATION";
pub const JOB_REMINDER_7DAY: &str = "REMINDER_7DAY";
pub const JOB_REMINDER_1DAY: &str = "REMINDER_1DAY";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobPayload {
    pub rsvp_id: String,
    pub event_id: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Job {
    pub id: String,
    pub job_type: String,
    pub payload: Json<JobPayload>,
    pub execute_at: DateTime<Utc>,
    pub status: String, // PENDING, PROCESSING, COMPLETED, FAILED, CANCELLED
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_type: &str, rsvp_id: String, event_id: String, execute_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.to_string(),
            payload: Json(JobPayload { rsvp_id, event_id }),
            execute_at,
            status: "PENDING".to_string(),
            error_message: None,
            created_at: Utc::now(),
        }
    }
}
