//! Share-eligibility state machine and the transient notice window.
//!
//! Pure and deterministic: all time values are passed in by the caller.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::session::GuestSession;

/// How long `just_became_eligible` stays observable after the transition
/// is reported (seconds).
pub const NOTICE_WINDOW_SECS: i64 = 5;

// ─── Phase ───────────────────────────────────────────────────────────

/// Phase of the share-eligibility lifecycle.
///
/// Transitions are one-way: `NotEligible -> Eligible -> Claimed`, with
/// `Claimed` terminal. The remote authority decides the thresholds; the
/// client only observes flags on its responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePhase {
    NotEligible,
    Eligible,
    Claimed,
}

/// Eligibility-relevant bits read off a remote response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilitySignal {
    pub eligible: bool,
    pub claimed: bool,
    /// Set by the authority only on the first response after the visitor
    /// crossed the eligibility threshold.
    pub newly_eligible: bool,
}

/// What an applied signal changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityOutcome {
    /// The phase moved (became eligible, or became claimed).
    pub phase_changed: bool,
    /// The first-time notice window was armed by this signal.
    pub notice_armed: bool,
}

// ─── Notice Window ───────────────────────────────────────────────────

/// Bounded-time flag: armed at a transition, self-expiring after the
/// window. Purely a UI signal, never persisted.
#[derive(Debug, Clone)]
pub struct NoticeWindow {
    until: Option<DateTime<Utc>>,
    window: TimeDelta,
}

impl NoticeWindow {
    /// Create an unarmed window of the given duration.
    pub fn new(window: TimeDelta) -> Self {
        Self {
            until: None,
            window,
        }
    }

    /// Arm the window starting at `now`.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        self.until = Some(now + self.window);
    }

    /// Is the window still open at `now`?
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.until {
            Some(until) => now < until,
            None => false,
        }
    }

    /// Close the window immediately.
    pub fn clear(&mut self) {
        self.until = None;
    }
}

// ─── State Machine ───────────────────────────────────────────────────

/// One-way eligibility machine plus the transient share-prompt notice.
#[derive(Debug, Clone)]
pub struct ShareEligibility {
    phase: SharePhase,
    notice: NoticeWindow,
}

impl ShareEligibility {
    /// A machine for a session that has never been eligible.
    pub fn new() -> Self {
        Self {
            phase: SharePhase::NotEligible,
            notice: NoticeWindow::new(TimeDelta::seconds(NOTICE_WINDOW_SECS)),
        }
    }

    /// Rebuild the phase from persisted snapshot flags (used when a
    /// session is adopted at initialization). The notice window starts
    /// closed: a reload never replays the share prompt.
    pub fn from_session(session: &GuestSession) -> Self {
        let mut m = Self::new();
        m.phase = if session.is_claimed {
            SharePhase::Claimed
        } else if session.is_eligible_to_share {
            SharePhase::Eligible
        } else {
            SharePhase::NotEligible
        };
        m
    }

    /// Current phase.
    pub fn phase(&self) -> SharePhase {
        self.phase
    }

    /// Whether the session is terminal.
    pub fn is_claimed(&self) -> bool {
        self.phase == SharePhase::Claimed
    }

    /// Whether the first-time notice is still showing at `now`.
    pub fn just_became_eligible(&self, now: DateTime<Utc>) -> bool {
        self.notice.is_active(now)
    }

    /// Apply a response signal at `now`.
    ///
    /// Monotonic: eligibility never reverts while unclaimed, repeats are
    /// no-ops, and `Claimed` absorbs everything (including any late
    /// notice the authority might still send).
    pub fn apply(&mut self, signal: EligibilitySignal, now: DateTime<Utc>) -> EligibilityOutcome {
        if signal.claimed {
            let phase_changed = self.phase != SharePhase::Claimed;
            self.phase = SharePhase::Claimed;
            self.notice.clear();
            return EligibilityOutcome {
                phase_changed,
                notice_armed: false,
            };
        }

        if self.phase == SharePhase::Claimed {
            // Terminal locally; an unclaimed-looking response cannot undo it.
            return EligibilityOutcome {
                phase_changed: false,
                notice_armed: false,
            };
        }

        // A first-time marker implies eligibility even if the plain flag
        // is missing from the response.
        let eligible = signal.eligible || signal.newly_eligible;
        let phase_changed = eligible && self.phase == SharePhase::NotEligible;
        if phase_changed {
            self.phase = SharePhase::Eligible;
        }

        let notice_armed = signal.newly_eligible;
        if notice_armed {
            self.notice.arm(now);
        }

        EligibilityOutcome {
            phase_changed,
            notice_armed,
        }
    }

    /// Forget everything (session cleared or reset).
    pub fn reset(&mut self) {
        self.phase = SharePhase::NotEligible;
        self.notice.clear();
    }
}

impl Default for ShareEligibility {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
