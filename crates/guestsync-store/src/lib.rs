//! guestsync-store: local snapshot persistence.
//! One versioned JSON document holds the session id, the cached session
//! snapshot, and unsynced pending deltas. Loads are defensive (missing,
//! empty, corrupt, or future-version files degrade to an empty store);
//! writes are atomic via temp file + rename.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{SnapshotStore, default_store_path};
