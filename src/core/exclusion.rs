use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

/// Days a passed restaurant stays out of the deck
pub const RECENCY_WINDOW_DAYS: i64 = 3;

pub fn recency_window() -> Duration {
    Duration::days(RECENCY_WINDOW_DAYS)
}

/// Liked and recently-passed restaurant ids for one session
///
/// Both sets only grow. Pass membership is recomputed from timestamps at
/// read time rather than pruned. Inserts are optimistic and are never
/// rolled back when the matching persistence write fails.
#[derive(Debug, Clone, Default)]
pub struct ExclusionTracker {
    liked: HashSet<String>,
    passed: HashMap<String, DateTime<Utc>>,
}

impl ExclusionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from server-side history at session start
    pub fn seed<L, P>(liked: L, passes: P) -> Self
    where
        L: IntoIterator<Item = String>,
        P: IntoIterator<Item = (String, DateTime<Utc>)>,
    {
        let mut tracker = Self::new();
        for id in liked {
            tracker.record_like(id);
        }
        for (id, passed_at) in passes {
            tracker.record_pass_at(id, passed_at);
        }
        tracker
    }

    /// Returns false if the id was already liked
    pub fn record_like(&mut self, id: impl Into<String>) -> bool {
        self.liked.insert(id.into())
    }

    pub fn record_pass(&mut self, id: impl Into<String>) {
        self.record_pass_at(id, Utc::now());
    }

    /// Record a pass at a given instant, keeping the latest timestamp per id
    pub fn record_pass_at(&mut self, id: impl Into<String>, passed_at: DateTime<Utc>) {
        self.passed
            .entry(id.into())
            .and_modify(|existing| {
                if passed_at > *existing {
                    *existing = passed_at;
                }
            })
            .or_insert(passed_at);
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.liked.contains(id)
    }

    /// True iff the last pass is no older than the recency window
    pub fn is_recently_passed(&self, id: &str, now: DateTime<Utc>) -> bool {
        self.passed
            .get(id)
            .map(|passed_at| now.signed_duration_since(*passed_at) <= recency_window())
            .unwrap_or(false)
    }

    pub fn liked_count(&self) -> usize {
        self.liked.len()
    }

    pub fn passed_count(&self) -> usize {
        self.passed.len()
    }
}
