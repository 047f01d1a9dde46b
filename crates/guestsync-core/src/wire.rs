//! Request and response bodies for the remote guest authority.
//!
//! Two endpoints: `POST /guest/session` (handshake) and
//! `POST /guest/track` (delta submission). All fields are snake_case on
//! the wire.

use serde::{Deserialize, Serialize};

use crate::delta::PendingDelta;
use crate::eligibility::EligibilitySignal;
use crate::session::GuestSession;

// ─── Handshake ───────────────────────────────────────────────────────

/// Body for `POST /guest/session`. `session_id` carries a previously
/// stored id so the authority can resume the same session; omitted
/// entirely for a first-time visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response to the handshake. Carries no first-time eligibility marker;
/// only track responses do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: GuestSession,
}

// ─── Delta Submission ────────────────────────────────────────────────

/// Body for `POST /guest/track`. Counter fields are deltas since the
/// last confirmed flush, not absolute totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRequest {
    pub session_id: String,
    pub page_views: u64,
    pub time_spent_seconds: u64,
    pub biography_views: u64,
}

impl TrackRequest {
    /// Build a request carrying a snapshot of the pending bucket.
    pub fn from_pending(session_id: impl Into<String>, pending: PendingDelta) -> Self {
        Self {
            session_id: session_id.into(),
            page_views: pending.page_views,
            time_spent_seconds: pending.time_spent_seconds,
            biography_views: pending.biography_views,
        }
    }

    /// The delta amounts this request carries, used to settle pending
    /// once the authority confirms them.
    pub fn carried(&self) -> PendingDelta {
        PendingDelta {
            page_views: self.page_views,
            time_spent_seconds: self.time_spent_seconds,
            biography_views: self.biography_views,
        }
    }
}

/// Response to a delta submission: the aggregated session plus the
/// first-time eligibility marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackResponse {
    pub success: bool,
    pub session: GuestSession,
    /// Marked by the authority only on the first response after the
    /// eligibility threshold is crossed; absent means false.
    #[serde(default)]
    pub just_became_eligible: bool,
}

impl TrackResponse {
    /// Eligibility bits carried by this response.
    pub fn signal(&self) -> EligibilitySignal {
        EligibilitySignal {
            eligible: self.session.is_eligible_to_share,
            claimed: self.session.is_claimed,
            newly_eligible: self.just_became_eligible,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
