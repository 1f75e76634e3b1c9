use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::domain::models::{
    change::{ChangeKind, RowChange},
    rsvp::{Rsvp, RsvpStatus},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuestListError {
    #[error("Guest {0} is not on this list")]
    UnknownGuest(String),
    #[error("Status '{0}' cannot be set by hand")]
    NotAnAnswer(RsvpStatus),
}

/// One event's guest rows plus the organizer's selection, kept as the single source of truth.
///
/// Status edits are optimistic: the row changes immediately and remembers its
/// previous status until [`GuestListStore::reconcile`] confirms or rolls back.
#[derive(Debug, Default)]
pub struct GuestListStore {
    event_id: String,
    rows: Vec<Rsvp>,
    selected: BTreeSet<String>,
    pending: HashMap<String, String>,
}

impl GuestListStore {
    pub fn new(event_id: impl Into<String>, mut rows: Vec<Rsvp>) -> Self {
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Self {
            event_id: event_id.into(),
            rows,
            selected: BTreeSet::new(),
            pending: HashMap::new(),
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn rows(&self) -> &[Rsvp] {
        &self.rows
    }

    pub fn get(&self, rsvp_id: &str) -> Option<&Rsvp> {
        self.rows.iter().find(|r| r.id == rsvp_id)
    }

    fn get_mut(&mut self, rsvp_id: &str) -> Option<&mut Rsvp> {
        self.rows.iter_mut().find(|r| r.id == rsvp_id)
    }

    pub fn is_pending(&self, rsvp_id: &str) -> bool {
        self.pending.contains_key(rsvp_id)
    }

    pub fn begin_status_change(&mut self, rsvp_id: &str, status: RsvpStatus) -> Result<(), GuestListError> {
        if !status.is_answer() {
            return Err(GuestListError::NotAnAnswer(status));
        }
        let row = self.get_mut(rsvp_id)
            .ok_or_else(|| GuestListError::UnknownGuest(rsvp_id.to_string()))?;

        let previous = std::mem::replace(&mut row.status, status.as_str().to_string());
        // keep the oldest confirmed status if edits stack up before the server answers
        self.pending.entry(rsvp_id.to_string()).or_insert(previous);
        Ok(())
    }

    /// Settles an optimistic edit with the server's answer. On failure the row
    /// goes back to its previous status and the error is handed back.
    pub fn reconcile<E>(&mut self, rsvp_id: &str, outcome: Result<Rsvp, E>) -> Result<(), E> {
        let previous = self.pending.remove(rsvp_id);
        match outcome {
            Ok(server_row) => {
                self.upsert_row(server_row);
                Ok(())
            }
            Err(e) => {
                if let (Some(previous), Some(row)) = (previous, self.get_mut(rsvp_id)) {
                    row.status = previous;
                }
                Err(e)
            }
        }
    }

    /// Applies a change pushed by the feed. Rows with an edit in flight keep their optimistic status.
    pub fn apply_remote(&mut self, change: &RowChange) {
        if change.event_id != self.event_id {
            return;
        }
        match change.kind {
            ChangeKind::Insert | ChangeKind::Update => {
                if let Some(new) = &change.new {
                    let mut row = new.clone();
                    if let Some(current) = self.get(&row.id).filter(|_| self.is_pending(&row.id)) {
                        row.status = current.status.clone();
                    }
                    self.upsert_row(row);
                }
            }
            ChangeKind::Delete => {
                if let Some(id) = change.rsvp_id() {
                    let id = id.to_string();
                    self.rows.retain(|r| r.id != id);
                    self.selected.remove(&id);
                    self.pending.remove(&id);
                }
            }
        }
    }

    fn upsert_row(&mut self, row: Rsvp) {
        match self.get_mut(&row.id) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    /// Returns whether the guest is selected after the toggle.
    pub fn toggle_select(&mut self, rsvp_id: &str) -> Result<bool, GuestListError> {
        if self.get(rsvp_id).is_none() {
            return Err(GuestListError::UnknownGuest(rsvp_id.to_string()));
        }
        if self.selected.remove(rsvp_id) {
            Ok(false)
        } else {
            self.selected.insert(rsvp_id.to_string());
            Ok(true)
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.rows.iter().map(|r| r.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn selected(&self) -> Vec<&Rsvp> {
        self.rows.iter().filter(|r| self.selected.contains(&r.id)).collect()
    }
}
