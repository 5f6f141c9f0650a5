//! Persisted flag store port
//!
//! A small string key-value store that survives restarts (browser
//! `localStorage`, a settings file, platform preferences...). Used for the
//! two session flags and the cached verification status.

use crate::domain::result::Result;

/// Set while a regular user session is active
pub const USER_SESSION_KEY: &str = "addispay_logged_in";

/// Set while an admin session is active
pub const ADMIN_SESSION_KEY: &str = "addispay_admin_logged_in";

/// Last known verification status of the user
pub const KYC_STATUS_KEY: &str = "kyc_status";

/// Value stored for a set boolean flag
pub const FLAG_TRUE: &str = "true";

/// Persisted string flags
///
/// Calls are synchronous; hosts back this with storage that answers
/// immediately. `clear` wipes every key the store holds.
pub trait FlagStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}
