use std::time::Instant;

use serde::Serialize;
use crate::domain::models::rsvp::Rsvp;

pub const RSVP_TABLE: &str = "event_rsvps";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row-level change on `event_rsvps`, carrying the row before and after.
///
/// `started_at` is when the write that produced the change began. Readers that
/// finished reading the table after that instant may already include the row.
#[derive(Debug, Clone, Serialize)]
pub struct RowChange {
    pub kind: ChangeKind,
    pub event_id: String,
    pub old: Option<Rsvp>,
    pub new: Option<Rsvp>,
    #[serde(skip)]
    pub started_at: Instant,
}

impl RowChange {
    pub fn insert(row: Rsvp) -> Self {
        Self { kind: ChangeKind::Insert, event_id: row.event_id.clone(), old: None, new: Some(row), started_at: Instant::now() }
    }

    pub fn update(old: Rsvp, new: Rsvp) -> Self {
        Self { kind: ChangeKind::Update, event_id: new.event_id.clone(), old: Some(old), new: Some(new), started_at: Instant::now() }
    }

    pub fn delete(row: Rsvp) -> Self {
        Self { kind: ChangeKind::Delete, event_id: row.event_id.clone(), old: Some(row), new: None, started_at: Instant::now() }
    }

    pub fn started(mut self, at: Instant) -> Self {
        self.started_at = at;
        self
    }

    pub fn rsvp_id(&self) -> Option<&str> {
        self.new.as_ref().or(self.old.as_ref()).map(|r| r.id.as_str())
    }
}
