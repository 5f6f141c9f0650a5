//! Session service - persisted session flags
//!
//! The user and admin sessions are two boolean flags in the [`FlagStore`].
//! They are mutually exclusive: starting one clears the other. A flag that
//! cannot be read counts as unset.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::domain::result::Result;
use crate::domain::VerificationStatus;
use crate::ports::flag_store::{ADMIN_SESSION_KEY, FLAG_TRUE, KYC_STATUS_KEY, USER_SESSION_KEY};
use crate::ports::FlagStore;

/// Which kind of session is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    #[default]
    None,
    User,
    Admin,
}

pub struct SessionService {
    flags: Arc<dyn FlagStore>,
}

impl SessionService {
    pub fn new(flags: Arc<dyn FlagStore>) -> Self {
        Self { flags }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.flags.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "flag read failed, treating as unset");
                None
            }
        }
    }

    fn is_set(&self, key: &str) -> bool {
        self.read(key).as_deref() == Some(FLAG_TRUE)
    }

    /// Session persisted by a previous run. Admin wins over user.
    pub fn restore(&self) -> Session {
        if self.is_set(ADMIN_SESSION_KEY) {
            Session::Admin
        } else if self.is_set(USER_SESSION_KEY) {
            Session::User
        } else {
            Session::None
        }
    }

    /// Persist a user session; `verified` also caches an approved status
    pub fn begin_user(&self, verified: bool) -> Result<()> {
        self.flags.remove(ADMIN_SESSION_KEY)?;
        self.flags.set(USER_SESSION_KEY, FLAG_TRUE)?;
        if verified {
            self.cache_verification(VerificationStatus::Approved)?;
        }
        Ok(())
    }

    pub fn begin_admin(&self) -> Result<()> {
        self.flags.remove(USER_SESSION_KEY)?;
        self.flags.set(ADMIN_SESSION_KEY, FLAG_TRUE)
    }

    /// Verification status cached on this device, if any
    pub fn cached_verification(&self) -> Option<VerificationStatus> {
        let raw = self.read(KYC_STATUS_KEY)?;
        match raw.parse() {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(value = %raw, error = %e, "ignoring unknown cached verification status");
                None
            }
        }
    }

    pub fn cache_verification(&self, status: VerificationStatus) -> Result<()> {
        self.flags.set(KYC_STATUS_KEY, status.as_str())
    }

    /// Forget everything persisted for the session
    pub fn end(&self) -> Result<()> {
        self.flags.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_flags::MemoryFlagStore;

    fn service(store: &Arc<MemoryFlagStore>) -> SessionService {
        let flags: Arc<dyn FlagStore> = store.clone();
        SessionService::new(flags)
    }

    #[test]
    fn test_restore_prefers_admin() {
        let store = Arc::new(MemoryFlagStore::with_flags([
            (USER_SESSION_KEY, FLAG_TRUE),
            (ADMIN_SESSION_KEY, FLAG_TRUE),
        ]));
        assert_eq!(service(&store).restore(), Session::Admin);
    }

    #[test]
    fn test_restore_requires_true_value() {
        let store = Arc::new(MemoryFlagStore::with_flags([(USER_SESSION_KEY, "yes")]));
        assert_eq!(service(&store).restore(), Session::None);
    }

    #[test]
    fn test_sessions_are_exclusive() {
        let store = Arc::new(MemoryFlagStore::new());
        let session = service(&store);

        session.begin_admin().unwrap();
        session.begin_user(false).unwrap();
        assert_eq!(session.restore(), Session::User);
        assert_eq!(store.get(ADMIN_SESSION_KEY).unwrap(), None);

        session.begin_admin().unwrap();
        assert_eq!(store.get(USER_SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_verified_login_caches_approval() {
        let store = Arc::new(MemoryFlagStore::new());
        let session = service(&store);
        session.begin_user(true).unwrap();
        assert_eq!(session.cached_verification(), Some(VerificationStatus::Approved));
    }

    #[test]
    fn test_unreadable_store_means_no_session() {
        let store = Arc::new(MemoryFlagStore::with_flags([(USER_SESSION_KEY, FLAG_TRUE)]));
        store.set_unavailable(true);
        let session = service(&store);
        assert_eq!(session.restore(), Session::None);
        assert_eq!(session.cached_verification(), None);
    }

    #[test]
    fn test_garbage_status_is_ignored() {
        let store = Arc::new(MemoryFlagStore::with_flags([(KYC_STATUS_KEY, "MAYBE")]));
        assert_eq!(service(&store).cached_verification(), None);
    }

    #[test]
    fn test_end_clears_everything() {
        let store = Arc::new(MemoryFlagStore::new());
        let session = service(&store);
        session.begin_user(true).unwrap();
        session.end().unwrap();
        assert!(store.is_empty());
        assert_eq!(session.restore(), Session::None);
    }
}
