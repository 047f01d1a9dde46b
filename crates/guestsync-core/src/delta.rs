//! Pending-delta accumulator: increments observed locally but not yet
//! confirmed by the remote authority.

use serde::{Deserialize, Serialize};

/// Counts recorded locally that the remote authority has not acknowledged.
///
/// Persisted alongside the snapshot so unsynced counts survive a reload;
/// zeroed only by subtracting exactly what a confirmed flush carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelta {
    pub page_views: u64,
    pub time_spent_seconds: u64,
    pub biography_views: u64,
}

impl PendingDelta {
    /// True when there is nothing to flush.
    pub fn is_empty(&self) -> bool {
        self.page_views == 0 && self.time_spent_seconds == 0 && self.biography_views == 0
    }

    /// Record one page view.
    pub fn add_page_view(&mut self) {
        self.page_views = self.page_views.saturating_add(1);
    }

    /// Record one biography (profile-detail) view.
    pub fn add_biography_view(&mut self) {
        self.biography_views = self.biography_views.saturating_add(1);
    }

    /// Record `seconds` of dwell time.
    pub fn add_time_spent(&mut self, seconds: u64) {
        self.time_spent_seconds = self.time_spent_seconds.saturating_add(seconds);
    }

    /// Settle a confirmed flush: remove exactly the amounts the request
    /// carried, leaving anything that accumulated during the request.
    /// Saturates at zero so a duplicate settlement cannot underflow.
    pub fn subtract(&mut self, confirmed: PendingDelta) {
        self.page_views = self.page_views.saturating_sub(confirmed.page_views);
        self.time_spent_seconds = self
            .time_spent_seconds
            .saturating_sub(confirmed.time_spent_seconds);
        self.biography_views = self.biography_views.saturating_sub(confirmed.biography_views);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
