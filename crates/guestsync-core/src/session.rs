//! Guest session snapshot: the authoritative-shaped record cached locally.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Locally cached snapshot of a guest session.
///
/// Field names match the remote authority's wire shape, so the same struct
/// serves as the persisted snapshot and the `session` object inside
/// handshake and track responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSession {
    /// Opaque identifier, stable for the lifetime of the anonymous visitor.
    pub id: String,
    /// Monotonically non-decreasing page-view total.
    pub page_views: u64,
    /// Coarse-grained dwell total in seconds; advances only on confirmed
    /// flushes, never optimistically.
    pub time_spent_seconds: u64,
    /// Profile-detail view total.
    pub biography_views: u64,
    /// One-way flag: may flip false to true once, never back while unclaimed.
    pub is_eligible_to_share: bool,
    /// Terminal flag: once true, no further tracking applies to this session.
    pub is_claimed: bool,
}

impl GuestSession {
    /// A brand-new session with zeroed counters and both flags down.
    pub fn fresh(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            page_views: 0,
            time_spent_seconds: 0,
            biography_views: 0,
            is_eligible_to_share: false,
            is_claimed: false,
        }
    }

    /// Adopt the authority's counters wholesale (it aggregates, so its
    /// response already reflects submitted deltas). Flags stay monotonic:
    /// eligibility never reverts while unclaimed, claimed never reverts.
    /// The id is left alone; callers match ids before merging.
    pub fn adopt_authoritative(&mut self, remote: &GuestSession) {
        self.page_views = remote.page_views;
        self.time_spent_seconds = remote.time_spent_seconds;
        self.biography_views = remote.biography_views;
        self.is_eligible_to_share = self.is_eligible_to_share || remote.is_eligible_to_share;
        self.is_claimed = self.is_claimed || remote.is_claimed;
    }

    /// Bump the optimistic page-view counter by one.
    pub fn record_page_view(&mut self) {
        self.page_views = self.page_views.saturating_add(1);
    }

    /// Bump the optimistic biography-view counter by one.
    pub fn record_biography_view(&mut self) {
        self.biography_views = self.biography_views.saturating_add(1);
    }
}

/// Generate a fresh opaque session id for the local-fallback path.
pub fn new_session_id() -> String {
    Ulid::new().to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────
