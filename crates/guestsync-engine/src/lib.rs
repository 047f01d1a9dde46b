//! guestsync-engine: the guest engagement tracking engine.
//! Owns the session lifecycle (handshake or local fallback), optimistic
//! delta accumulation, and the sync coordinator with its at-most-one
//! in-flight flush, plus the periodic and dwell timer drivers.

pub mod engine;
pub mod timers;

pub use engine::{FlushOutcome, GuestEngine, InitOutcome};
pub use timers::{SyncPolicy, run_dwell_timer, run_flush_timer, spawn_timers};
