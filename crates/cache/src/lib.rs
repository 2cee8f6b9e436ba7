//! Local cache for data the pages read repeatedly
//!
//! This crate provides:
//! - A sled-backed key/value cache with bincode-encoded entries
//! - Explicit `refresh` on reads instead of ambient storage access
//! - Entries valid until explicitly invalidated (logout, settings write,
//!   profile write); there is no time-based expiry

pub mod store;

pub use store::{CacheEntry, LocalCache};

use thiserror::Error;

/// Well-known cache keys
pub mod keys {
    /// The signed-in session
    pub const SESSION: &str = "session";
    /// The signed-in user's profile row
    pub const USER_PROFILE: &str = "user_profile";
    /// The signed-in user's settings row
    pub const USER_SETTINGS: &str = "user_settings";
    /// Last page visited, restored after login
    pub const LAST_PAGE: &str = "last_page";
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("cache encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}
