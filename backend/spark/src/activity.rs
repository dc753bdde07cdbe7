//! Bounded newest-first feed of confirmed donations.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::amount::Amount;

/// Maximum number of events retained by the feed.
pub const ACTIVITY_CAPACITY: usize = 10;

/// Display record of one confirmed donation. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEvent {
    pub id: u64,
    pub donor: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActivityLedger {
    events: VecDeque<ActivityEvent>,
    next_id: u64,
}

impl Default for ActivityLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLedger {
    pub fn new() -> Self {
        ActivityLedger {
            events: VecDeque::with_capacity(ACTIVITY_CAPACITY + 1),
            next_id: 1,
        }
    }

    /// Issue the next event id. Ids are strictly increasing for the
    /// lifetime of the ledger, including across evictions.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Prepend `event`, evicting the oldest entry past the bound.
    /// Returns the evicted event, if any.
    pub fn record(&mut self, event: ActivityEvent) -> Option<ActivityEvent> {
        self.events.push_front(event);
        if self.events.len() > ACTIVITY_CAPACITY {
            self.events.pop_back()
        } else {
            None
        }
    }

    pub fn size(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActivityEvent> {
        self.events.iter()
    }

    pub fn snapshot(&self) -> Vec<ActivityEvent> {
        self.events.iter().cloned().collect()
    }
}
