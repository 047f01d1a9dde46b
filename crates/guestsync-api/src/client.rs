//! GuestApi trait and the HTTP client for the remote authority.
//! The trait is the mock-injection seam: the engine is generic over it
//! and tests substitute a scripted fake.

use std::time::Duration;

use guestsync_core::{GuestSession, SessionRequest, SessionResponse, TrackRequest, TrackResponse};

use crate::error::ApiError;

/// Default per-request timeout for authority calls. Bounds the
/// initialization handshake, so startup can never hang indefinitely.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport seam to the remote guest authority.
pub trait GuestApi: Send + Sync {
    /// `POST /guest/session`: open a session, resuming `existing` if the
    /// authority still knows it.
    fn start_session(
        &self,
        existing: Option<&str>,
    ) -> impl Future<Output = Result<GuestSession, ApiError>> + Send;

    /// `POST /guest/track`: submit pending deltas, returning the
    /// aggregated session and the first-time eligibility marker.
    fn push_deltas(
        &self,
        request: &TrackRequest,
    ) -> impl Future<Output = Result<TrackResponse, ApiError>> + Send;

    /// Best-effort delivery for page exit: send without waiting for or
    /// reading a response. The send may outlive the caller; delivery is
    /// not guaranteed and no error is reported.
    fn push_detached(&self, request: TrackRequest);
}

/// HTTP client for the production guest authority.
pub struct HttpGuestApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGuestApi {
    /// Build a client for the authority at `base_url`
    /// (e.g. `https://api.example.com`). Trailing slashes are tolerated.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Build a client with a custom per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { base_url, client })
    }

    fn session_url(&self) -> String {
        format!("{}/guest/session", self.base_url)
    }

    fn track_url(&self) -> String {
        format!("{}/guest/track", self.base_url)
    }
}

impl GuestApi for HttpGuestApi {
    async fn start_session(&self, existing: Option<&str>) -> Result<GuestSession, ApiError> {
        let body = SessionRequest {
            session_id: existing.map(str::to_owned),
        };
        let response = self
            .client
            .post(self.session_url())
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        let parsed = response.json::<SessionResponse>().await?;
        if !parsed.success {
            return Err(ApiError::Rejected);
        }
        Ok(parsed.session)
    }

    async fn push_deltas(&self, request: &TrackRequest) -> Result<TrackResponse, ApiError> {
        let response = self
            .client
            .post(self.track_url())
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        let parsed = response.json::<TrackResponse>().await?;
        if !parsed.success {
            return Err(ApiError::Rejected);
        }
        Ok(parsed)
    }

    fn push_detached(&self, request: TrackRequest) {
        let client = self.client.clone();
        let url = self.track_url();
        // The caller may be torn down before any response arrives; the
        // outcome is dropped on purpose. Durability comes from the
        // persisted pending bucket, not from this send.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _ = client.post(url).json(&request).send().await;
                });
            }
            Err(_) => {
                tracing::warn!("exit send skipped: no async runtime available");
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
