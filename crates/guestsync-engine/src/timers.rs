//! Background cadence: the periodic flush loop and the dwell-time
//! accounting loop.
//!
//! Both loops are plain async functions over a shared engine handle, so
//! hosts decide where they run; `spawn_timers` covers the common case of
//! detaching both onto the current runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use guestsync_api::GuestApi;

use crate::engine::GuestEngine;

/// Cadence for the two background loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// How often pending deltas are reconciled with the authority.
    pub flush_every: Duration,
    /// How often elapsed dwell time is credited to the pending bucket.
    /// Dwell is accounted in whole seconds; the loop floors this to a
    /// whole-second interval, minimum one.
    pub dwell_tick: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            flush_every: Duration::from_secs(30),
            dwell_tick: Duration::from_secs(10),
        }
    }
}

/// Flush pending deltas every `every`. Runs until the owning task is
/// aborted; flush outcomes (including failures) are absorbed by the
/// engine, so the loop itself never exits early.
pub async fn run_flush_timer<A: GuestApi>(engine: Arc<GuestEngine<A>>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately; consume it so the first
    // flush waits a full period.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        engine.flush().await;
    }
}

/// Credit one whole tick of dwell time per interval. Missed ticks are
/// skipped, not back-filled: a suspended or frozen process must not
/// credit time the visitor did not spend.
pub async fn run_dwell_timer<A: GuestApi>(engine: Arc<GuestEngine<A>>, tick: Duration) {
    // Dwell is accounted in whole seconds. Floor the tick to a
    // whole-second interval (minimum one) so every tick credits exactly
    // its own length; a sub-second tick would otherwise credit nothing.
    let secs = tick.as_secs().max(1);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        engine.record_dwell(secs).await;
    }
}

/// Detach both loops onto the current runtime. The handles abort their
/// loops on drop of the host, or explicitly at teardown before the exit
/// flush.
pub fn spawn_timers<A: GuestApi + 'static>(
    engine: &Arc<GuestEngine<A>>,
    policy: SyncPolicy,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let flush = tokio::spawn(run_flush_timer(Arc::clone(engine), policy.flush_every));
    let dwell = tokio::spawn(run_dwell_timer(Arc::clone(engine), policy.dwell_tick));
    (flush, dwell)
}

// ─── Tests ───────────────────────────────────────────────────────────
