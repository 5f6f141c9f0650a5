//! Host feedback port (alerts, haptics, scrolling)
//!
//! Everything here is best-effort: older Telegram clients lack haptics or
//! native alerts. The core ignores the returned errors.

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Haptic pattern requested from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Haptic {
    Success,
    Warning,
    Error,
    ImpactLight,
    ImpactHeavy,
}

pub trait HostFeedback: Send + Sync {
    /// Non-blocking user-visible message
    fn alert(&self, message: &str) -> Result<()>;

    fn haptic(&self, haptic: Haptic) -> Result<()>;

    fn scroll_to_top(&self) -> Result<()>;
}
