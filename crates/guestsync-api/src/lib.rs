//! guestsync-api: remote guest-authority client.
//! The `GuestApi` transport seam plus the reqwest implementation of the
//! two authority endpoints, including the fire-and-forget exit path.
//! No business logic: pure IO boundary.

pub mod client;
pub mod error;

pub use client::{DEFAULT_TIMEOUT, GuestApi, HttpGuestApi};
pub use error::ApiError;
