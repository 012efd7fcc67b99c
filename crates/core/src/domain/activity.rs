use std::collections::VecDeque;

use super::events::Event;

pub const ACTIVITY_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    /// Unix milliseconds at receipt
    pub received_at: i64,
    pub event: Event,
}

/// Most-recent-first log of every classified event
#[derive(Debug, Clone)]
pub struct ActivityFeed {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::with_capacity(ACTIVITY_CAPACITY)
    }
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: Event, received_at: i64) {
        self.entries.push_front(ActivityEntry { received_at, event });
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
