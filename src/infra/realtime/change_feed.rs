use std::sync::Arc;

use tracing::debug;

use crate::domain::{
    models::change::RowChange,
    ports::ChangePublisher,
    services::stats::StatsAggregator,
};
use crate::infra::realtime::subscriptions::{Subscription, SubscriptionKey, SubscriptionManager};

/// In-process change feed for `event_rsvps`.
///
/// Folds each change into the statistics cache before fanning it out to live
/// subscribers, so a subscriber reading stats after a change sees it applied.
pub struct ChangeFeed {
    subscriptions: Arc<SubscriptionManager<RowChange>>,
    stats: Arc<StatsAggregator>,
}

impl ChangeFeed {
    pub fn new(stats: Arc<StatsAggregator>) -> Self {
        Self { subscriptions: SubscriptionManager::new(), stats }
    }

    pub fn subscribe(&self, event_id: &str) -> Subscription<RowChange> {
        self.subscriptions.subscribe(SubscriptionKey::rsvps_for_event(event_id))
    }

    pub fn subscriber_count(&self, event_id: &str) -> usize {
        self.subscriptions.subscriber_count(&SubscriptionKey::rsvps_for_event(event_id))
    }
}

impl ChangePublisher for ChangeFeed {
    fn publish(&self, change: RowChange) {
        self.stats.apply_change(&change);

        let key = SubscriptionKey::rsvps_for_event(&change.event_id);
        let kind = change.kind;
        let delivered = self.subscriptions.publish(&key, change);
        debug!(key = %key, ?kind, delivered, "RSVP change published");
    }
}
