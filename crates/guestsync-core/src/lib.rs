//! guestsync-core: data model and pure state machines for guest tracking.
//! Session snapshots, pending-delta accumulation, the one-way share
//! eligibility machine, and the wire types for the remote authority.
//! No IO, no async, no clocks: callers pass `now` in.

pub mod delta;
pub mod eligibility;
pub mod session;
pub mod wire;

pub use delta::PendingDelta;
pub use eligibility::{
    EligibilityOutcome, EligibilitySignal, NOTICE_WINDOW_SECS, NoticeWindow, ShareEligibility,
    SharePhase,
};
pub use session::{GuestSession, new_session_id};
pub use wire::{SessionRequest, SessionResponse, TrackRequest, TrackResponse};
