//! Maps relayed bot messages back to the visitor they were relayed for.
//!
//! When the operator answers a relayed message with Telegram's "reply"
//! feature, the update only carries the id of the message being replied to.
//! The correlator turns that id back into the visitor id.

use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

/// Default lifetime of a correlation entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 10_000;

struct Entry {
    user_id: String,
    inserted_at: Instant,
}

/// Bounded provider-message-id → visitor-id map.
///
/// Entries expire after `ttl`; once `capacity` is reached the oldest entry
/// is evicted on insert.
pub struct ReplyCorrelator {
    entries: HashMap<i64, Entry>,
    /// Insertion order. May hold stale ids for re-remembered entries; those
    /// are skipped when their timestamp no longer matches.
    order: VecDeque<(i64, Instant)>,
    ttl: Duration,
    capacity: usize,
}

impl Default for ReplyCorrelator {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl ReplyCorrelator {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            ttl,
            capacity,
        }
    }

    pub fn remember(&mut self, provider_message_id: i64, user_id: impl Into<String>) {
        self.remember_at(provider_message_id, user_id, Instant::now());
    }

    pub fn remember_at(
        &mut self,
        provider_message_id: i64,
        user_id: impl Into<String>,
        now: Instant,
    ) {
        if self.capacity == 0 {
            return;
        }
        self.prune_at(now);

        self.entries.insert(provider_message_id, Entry {
            user_id: user_id.into(),
            inserted_at: now,
        });
        self.order.push_back((provider_message_id, now));

        while self.entries.len() > self.capacity {
            if !self.pop_oldest() {
                break;
            }
        }
    }

    pub fn resolve(&mut self, provider_message_id: i64) -> Option<String> {
        self.resolve_at(provider_message_id, Instant::now())
    }

    /// Visitor id for `provider_message_id`, unless unknown or expired.
    pub fn resolve_at(&mut self, provider_message_id: i64, now: Instant) -> Option<String> {
        let expired = match self.entries.get(&provider_message_id) {
            Some(entry) if now.saturating_duration_since(entry.inserted_at) < self.ttl => {
                return Some(entry.user_id.clone());
            },
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(&provider_message_id);
        }
        None
    }

    /// Drop every expired entry.
    pub fn prune_at(&mut self, now: Instant) {
        while let Some(&(id, inserted_at)) = self.order.front() {
            if now.saturating_duration_since(inserted_at) < self.ttl {
                break;
            }
            self.order.pop_front();
            if self
                .entries
                .get(&id)
                .is_some_and(|e| e.inserted_at == inserted_at)
            {
                self.entries.remove(&id);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove the oldest live entry. Returns `false` when nothing is left.
    fn pop_oldest(&mut self) -> bool {
        while let Some((id, inserted_at)) = self.order.pop_front() {
            if self
                .entries
                .get(&id)
                .is_some_and(|e| e.inserted_at == inserted_at)
            {
                self.entries.remove(&id);
                return true;
            }
        }
        false
    }
}
