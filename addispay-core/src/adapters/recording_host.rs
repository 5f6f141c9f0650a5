//! Host feedback adapter that records what the core asked for
//!
//! Used by tests and by hosts that render feedback themselves (they drain
//! the recorded events after each call into the controller).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::ports::{Haptic, HostFeedback};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    Alert(String),
    Haptic(Haptic),
    ScrollToTop,
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Mutex<Vec<FeedbackEvent>>,
    /// Simulates an old client that throws on every bridge call
    broken: AtomicBool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn take_events(&self) -> Vec<FeedbackEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FeedbackEvent::Alert(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn haptics(&self) -> Vec<Haptic> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FeedbackEvent::Haptic(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: FeedbackEvent) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(Error::Other("WebApp bridge unavailable".to_string()));
        }
        self.events
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?
            .push(event);
        Ok(())
    }
}

impl HostFeedback for RecordingHost {
    fn alert(&self, message: &str) -> Result<()> {
        self.record(FeedbackEvent::Alert(message.to_string()))
    }

    fn haptic(&self, haptic: Haptic) -> Result<()> {
        self.record(FeedbackEvent::Haptic(haptic))
    }

    fn scroll_to_top(&self) -> Result<()> {
        self.record(FeedbackEvent::ScrollToTop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let host = RecordingHost::new();
        host.alert("hello").unwrap();
        host.haptic(Haptic::Warning).unwrap();
        host.scroll_to_top().unwrap();

        assert_eq!(host.alerts(), vec!["hello".to_string()]);
        assert_eq!(host.haptics(), vec![Haptic::Warning]);
        assert_eq!(host.take_events().len(), 3);
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_broken_bridge_errors() {
        let host = RecordingHost::new();
        host.set_broken(true);
        assert!(host.alert("hello").is_err());
        assert!(host.events().is_empty());
    }
}
