use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Bounded memory of recently delivered article links.
///
/// Only consulted when cross-run deduplication is switched on; without it the
/// bot may repeat an article in consecutive digests.
pub struct RecentLinks {
    ttl: Duration,
    capacity: usize,
    delivered_at: HashMap<String, DateTime<Utc>>,
    order: VecDeque<String>,
}

impl RecentLinks {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            delivered_at: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn contains(&self, link: &str, now: DateTime<Utc>) -> bool {
        self.delivered_at
            .get(link)
            .is_some_and(|at| now.signed_duration_since(*at) < self.ttl)
    }

    pub fn remember(&mut self, link: &str, now: DateTime<Utc>) {
        self.prune(now);
        if self.delivered_at.insert(link.to_string(), now).is_some() {
            self.order.retain(|existing| existing != link);
        }
        self.order.push_back(link.to_string());
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.delivered_at.remove(&oldest);
            }
        }
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        let before = self.order.len();
        while let Some(front) = self.order.front() {
            let expired = self
                .delivered_at
                .get(front)
                .map_or(true, |at| now.signed_duration_since(*at) >= self.ttl);
            if !expired {
                break;
            }
            if let Some(link) = self.order.pop_front() {
                self.delivered_at.remove(&link);
            }
        }
        if self.order.len() < before {
            debug!("Pruned {} expired links", before - self.order.len());
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
