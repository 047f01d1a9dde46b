//! The guest engine: lifecycle, optimistic tracking, and the sync
//! coordinator.
//!
//! One owned state object behind one lock; no globals. Failures never
//! escape: network and persistence errors are logged and absorbed, and
//! callers observe at most an outcome enum.

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};

use guestsync_api::GuestApi;
use guestsync_core::{GuestSession, PendingDelta, ShareEligibility, TrackRequest, new_session_id};
use guestsync_store::SnapshotStore;

// ─── Outcomes ────────────────────────────────────────────────────────

/// How an `initialize` call resolved. Never an error: network failure
/// degrades to local-only operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Initialization already ran; this call was a no-op.
    AlreadyInitialized,
    /// Guest tracking never applies to authenticated identities.
    SkippedAuthenticated,
    /// Handshake succeeded; the authority's snapshot was adopted.
    Remote,
    /// Handshake failed; a locally cached snapshot was adopted.
    CachedFallback,
    /// Handshake failed with no cache; a fresh local session was minted.
    FreshFallback,
}

/// How a `flush` call resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Deltas confirmed and merged; pending settled.
    Synced,
    /// No deltas to send; the network was not touched.
    NothingPending,
    /// Another flush holds the in-flight guard; this trigger deferred.
    AlreadyInFlight,
    /// Engine uninitialized, authenticated identity, or claimed session.
    NotTracking,
    /// Transport or authority failure; pending left untouched for retry.
    Failed,
    /// Response arrived for a session cleared mid-request; dropped.
    Discarded,
}

// ─── State ───────────────────────────────────────────────────────────

struct EngineState {
    store: SnapshotStore,
    eligibility: ShareEligibility,
    initialized: bool,
    authenticated: bool,
}

impl EngineState {
    /// Tracking guards: initialized, unauthenticated, unclaimed.
    fn accepts_tracking(&self) -> bool {
        self.initialized && !self.authenticated && !self.eligibility.is_claimed()
    }

    /// Persist the store, absorbing any failure. The in-memory state is
    /// already correct; a failed save only costs durability.
    fn persist(&self, context: &str) {
        if let Err(e) = self.store.save() {
            tracing::warn!("{context}: persist failed: {e}");
        }
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

/// Process-wide guest tracking engine, generic over the authority
/// transport so tests can substitute a scripted fake.
///
/// All state sits behind one async lock. Tracking events hold it only
/// briefly; flush releases it for the duration of the network call, so
/// events recorded mid-request land in the live pending bucket and are
/// picked up by the next flush.
pub struct GuestEngine<A> {
    api: A,
    state: Mutex<EngineState>,
    /// Single-permit gate enforcing at most one in-flight flush. The
    /// permit is held for the lifetime of the flush future, so it is
    /// released on completion and on drop alike.
    flush_gate: Semaphore,
}

impl<A: GuestApi> GuestEngine<A> {
    pub fn new(api: A, store: SnapshotStore) -> Self {
        Self {
            api,
            state: Mutex::new(EngineState {
                store,
                eligibility: ShareEligibility::new(),
                initialized: false,
                authenticated: false,
            }),
            flush_gate: Semaphore::new(1),
        }
    }

    /// Produce exactly one authoritative-or-fallback session before any
    /// tracking is accepted. Idempotent; never blocks indefinitely (the
    /// handshake is bounded by the transport timeout) and never fails:
    /// handshake errors degrade to a cached or freshly minted session.
    pub async fn initialize(&self) -> InitOutcome {
        let mut st = self.state.lock().await;
        let st = &mut *st;
        if st.authenticated {
            return InitOutcome::SkippedAuthenticated;
        }
        if st.initialized {
            return InitOutcome::AlreadyInitialized;
        }

        // The lock is held across the handshake on purpose: two racing
        // initialize calls must not both reach the authority and mint
        // two sessions for one visitor.
        let existing = st.store.session_id().map(str::to_owned);
        let outcome = match self.api.start_session(existing.as_deref()).await {
            Ok(remote) => {
                tracing::debug!("handshake adopted session {}", remote.id);
                st.eligibility = ShareEligibility::from_session(&remote);
                st.store.adopt(remote);
                InitOutcome::Remote
            }
            Err(e) => {
                tracing::warn!("session handshake failed: {e}");
                if let Some(cached) = st.store.session() {
                    tracing::debug!("using cached snapshot {}", cached.id);
                    st.eligibility = ShareEligibility::from_session(cached);
                    InitOutcome::CachedFallback
                } else {
                    let fresh = GuestSession::fresh(new_session_id());
                    tracing::debug!("starting local-only session {}", fresh.id);
                    st.eligibility = ShareEligibility::new();
                    st.store.adopt(fresh);
                    InitOutcome::FreshFallback
                }
            }
        };
        st.initialized = true;
        st.persist("initialize");
        outcome
    }

    /// Record a page view: pending and the optimistic snapshot counter
    /// move together, then the store is persisted. No-op unless tracking
    /// is accepted.
    pub async fn track_page_view(&self) {
        let mut st = self.state.lock().await;
        let st = &mut *st;
        if !st.accepts_tracking() {
            return;
        }
        st.store.pending_mut().add_page_view();
        if let Some(session) = st.store.session_mut() {
            session.record_page_view();
        }
        st.persist("page view");
    }

    /// Record a biography (profile-detail) view and flush immediately:
    /// this signal is load-bearing for eligibility and must not wait for
    /// the periodic window.
    pub async fn track_biography_view(&self) -> FlushOutcome {
        {
            let mut st = self.state.lock().await;
            let st = &mut *st;
            if !st.accepts_tracking() {
                return FlushOutcome::NotTracking;
            }
            st.store.pending_mut().add_biography_view();
            if let Some(session) = st.store.session_mut() {
                session.record_biography_view();
            }
            st.persist("biography view");
        }
        self.flush().await
    }

    /// Accumulate `seconds` of dwell time into pending only. The
    /// snapshot's dwell counter advances when a flush confirms it; dwell
    /// is not shown to the user in real time.
    pub async fn record_dwell(&self, seconds: u64) {
        if seconds == 0 {
            return;
        }
        let mut st = self.state.lock().await;
        if !st.accepts_tracking() {
            return;
        }
        st.store.pending_mut().add_time_spent(seconds);
        st.persist("dwell tick");
    }

    /// Reconcile pending deltas with the authority.
    ///
    /// At most one flush is in flight per session; an overlapping
    /// trigger is deferred, not queued. The pending bucket is snapshotted
    /// into the request before sending, so events recorded during the
    /// request accumulate separately and are never lost or re-sent. On
    /// success the authority's totals replace the snapshot counters and
    /// exactly the snapshotted amounts are subtracted from pending; on
    /// failure pending is left untouched for the next trigger.
    pub async fn flush(&self) -> FlushOutcome {
        let (request, _permit) = {
            let st = self.state.lock().await;
            if !st.accepts_tracking() {
                return FlushOutcome::NotTracking;
            }
            let Some(session) = st.store.session() else {
                return FlushOutcome::NotTracking;
            };
            // Holding the permit marks this flush in flight. It lives
            // until the end of the function, and dropping the future at
            // the network await below releases it just the same, so an
            // aborted flush never leaves the gate latched.
            let Ok(permit) = self.flush_gate.try_acquire() else {
                return FlushOutcome::AlreadyInFlight;
            };
            if st.store.pending().is_empty() {
                return FlushOutcome::NothingPending;
            }
            (
                TrackRequest::from_pending(session.id.clone(), st.store.pending()),
                permit,
            )
        };

        // Lock released for the request; tracking continues meanwhile.
        let result = self.api.push_deltas(&request).await;

        let mut st = self.state.lock().await;
        let st = &mut *st;
        match result {
            Ok(response) => {
                if st.store.session_id() != Some(request.session_id.as_str()) {
                    // The session was cleared or replaced while the
                    // request was out; merging would resurrect it.
                    tracing::debug!(
                        "dropping flush response for stale session {}",
                        request.session_id
                    );
                    return FlushOutcome::Discarded;
                }
                st.store.pending_mut().subtract(request.carried());
                if let Some(session) = st.store.session_mut() {
                    session.adopt_authoritative(&response.session);
                }
                let outcome = st.eligibility.apply(response.signal(), Utc::now());
                if outcome.notice_armed {
                    tracing::info!("guest became eligible to share");
                }
                st.persist("flush");
                FlushOutcome::Synced
            }
            Err(e) => {
                tracing::warn!("flush failed: {e}");
                FlushOutcome::Failed
            }
        }
    }

    /// Best-effort transmission of current pending deltas at teardown.
    /// Fire-and-forget: no response is read and pending is not touched,
    /// so an undelivered send is simply retried by the next normal flush
    /// after reload.
    pub async fn exit_flush(&self) {
        let st = self.state.lock().await;
        if !st.accepts_tracking() {
            return;
        }
        let Some(session) = st.store.session() else {
            return;
        };
        let pending = st.store.pending();
        if pending.is_empty() {
            return;
        }
        let request = TrackRequest::from_pending(session.id.clone(), pending);
        drop(st);
        self.api.push_detached(request);
    }

    /// Remove all local persistence and reset in-memory state (used
    /// after a successful claim, or an explicit reset). Initialization
    /// is re-runnable from scratch afterwards.
    pub async fn clear_session(&self) {
        let mut st = self.state.lock().await;
        let st = &mut *st;
        if let Err(e) = st.store.clear() {
            tracing::warn!("clear session: {e}");
        }
        st.eligibility.reset();
        st.initialized = false;
        tracing::info!("guest session cleared");
    }

    /// Mark the identity as authenticated: initialization, tracking, and
    /// flushing all become no-ops.
    pub async fn mark_authenticated(&self) {
        let mut st = self.state.lock().await;
        st.authenticated = true;
    }

    /// The current session id, if a session exists.
    pub async fn session_id(&self) -> Option<String> {
        let st = self.state.lock().await;
        st.store.session_id().map(str::to_owned)
    }

    /// A copy of the optimistic local snapshot.
    pub async fn snapshot(&self) -> Option<GuestSession> {
        let st = self.state.lock().await;
        st.store.session().cloned()
    }

    /// The current pending bucket.
    pub async fn pending(&self) -> PendingDelta {
        let st = self.state.lock().await;
        st.store.pending()
    }

    /// Whether the first-time eligibility notice is still showing.
    pub async fn just_became_eligible(&self) -> bool {
        let st = self.state.lock().await;
        st.eligibility.just_became_eligible(Utc::now())
    }

    /// Whether initialization has completed.
    pub async fn is_initialized(&self) -> bool {
        let st = self.state.lock().await;
        st.initialized
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
