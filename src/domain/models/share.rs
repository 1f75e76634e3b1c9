use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use rand::{distributions::Alphanumeric, Rng};

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct EventShare {
    pub id: String,
    pub event_id: String,
    pub shared_by: String,
    pub share_code: String,
    pub created_at: DateTime<Utc>,
}

impl EventShare {
    pub fn new(event_id: String, shared_by: String) -> Self {
        let share_code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            shared_by,
            share_code,
            created_at: Utc::now(),
        }
    }
}
