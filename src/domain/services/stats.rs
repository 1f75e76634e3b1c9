use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::models::{
    change::RowChange,
    rsvp::{RsvpStatus, StatusRow},
};
use crate::domain::ports::StatsSource;
use crate::error::AppError;

pub const STATS_LOAD_FAILED: &str = "Failed to load statistics";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub confirmed: i64,
    pub maybe: i64,
    pub declined: i64,
    pub pending: i64,
    pub total_responses: i64,
    pub total_guests: i64,
}

impl EventStats {
    pub fn from_rows(rows: &[StatusRow]) -> Self {
        let mut stats = Self::default();
        for row in rows {
            stats.add(row, 1);
        }
        stats
    }

    /// Applies a row change as delta arithmetic: the old row is taken out, the new one added.
    pub fn apply(&mut self, change: &RowChange) {
        if let Some(old) = &change.old {
            self.add(&old.status_row(), -1);
        }
        if let Some(new) = &change.new {
            self.add(&new.status_row(), 1);
        }
    }

    fn add(&mut self, row: &StatusRow, sign: i64) {
        let status = row.status.parse().unwrap_or(RsvpStatus::Pending);
        match status {
            RsvpStatus::Confirmed => {
                self.confirmed += sign;
                // the respondent plus their companions
                self.total_guests += sign * (1 + i64::from(row.guests_count.max(0)));
            }
            RsvpStatus::Maybe => self.maybe += sign,
            RsvpStatus::Declined => self.declined += sign,
            RsvpStatus::Pending => self.pending += sign,
        }
        self.total_responses += sign;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub stats: EventStats,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsSnapshot {
    fn fresh(stats: EventStats) -> Self {
        Self { stats, stale: false, error: None }
    }
}

struct CacheEntry {
    stats: EventStats,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    // Bumped on every change seen for an event; a fetch that overlaps a bump is not cached.
    generations: HashMap<String, u64>,
}

impl CacheState {
    fn generation(&self, event_id: &str) -> u64 {
        self.generations.get(event_id).copied().unwrap_or(0)
    }

    fn bump(&mut self, event_id: &str) {
        *self.generations.entry(event_id.to_string()).or_insert(0) += 1;
    }
}

/// Per-event RSVP counters with a TTL cache that change-feed deltas keep current.
pub struct StatsAggregator {
    source: Arc<dyn StatsSource>,
    ttl: Duration,
    cache: RwLock<CacheState>,
}

impl StatsAggregator {
    pub fn new(source: Arc<dyn StatsSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: RwLock::new(CacheState::default()),
        }
    }

    pub async fn get(&self, event_id: &str) -> Result<StatsSnapshot, AppError> {
        if event_id.is_empty() {
            return Ok(StatsSnapshot::fresh(EventStats::default()));
        }

        let (previous, generation) = {
            let cache = self.cache.read();
            match cache.entries.get(event_id) {
                Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                    return Ok(StatsSnapshot::fresh(entry.stats));
                }
                entry => (entry.map(|e| e.stats), cache.generation(event_id)),
            }
        };

        match self.source.status_rows(event_id).await {
            Ok(rows) => {
                let stats = EventStats::from_rows(&rows);
                let mut cache = self.cache.write();
                if cache.generation(event_id) == generation {
                    debug!(event_id, rows = rows.len(), "Statistics refreshed");
                    cache.entries.insert(event_id.to_string(), CacheEntry {
                        stats,
                        fetched_at: Instant::now(),
                    });
                } else {
                    debug!(event_id, "Statistics changed during refresh, result not cached");
                }
                Ok(StatsSnapshot::fresh(stats))
            }
            Err(e) => match previous {
                Some(stats) => {
                    warn!(event_id, error = %e, "Serving stale statistics");
                    Ok(StatsSnapshot {
                        stats,
                        stale: true,
                        error: Some(STATS_LOAD_FAILED.to_string()),
                    })
                }
                None => Err(e),
            },
        }
    }

    /// Folds a change into the cached counters. Events that are not cached are left alone.
    ///
    /// An entry fetched after the change's write began may already count the row,
    /// so it is dropped and the next read refetches.
    pub fn apply_change(&self, change: &RowChange) -> Option<EventStats> {
        let mut cache = self.cache.write();
        cache.bump(&change.event_id);

        let overlaps_read = change.started_at < cache.entries.get(&change.event_id)?.fetched_at;
        if overlaps_read {
            cache.entries.remove(&change.event_id);
            debug!(event_id = %change.event_id, "Change overlaps cached read, statistics dropped");
            return None;
        }
        let entry = cache.entries.get_mut(&change.event_id)?;
        entry.stats.apply(change);
        Some(entry.stats)
    }

    pub fn invalidate(&self, event_id: &str) {
        let mut cache = self.cache.write();
        cache.bump(event_id);
        cache.entries.remove(event_id);
    }

    pub fn cached(&self, event_id: &str) -> Option<EventStats> {
        self.cache.read().entries.get(event_id).map(|entry| entry.stats)
    }
}
