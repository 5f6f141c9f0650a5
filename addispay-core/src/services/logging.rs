//! Activity logging - structured client events
//!
//! Records privacy-safe events (page opens, actions, failures) in a bounded
//! in-memory journal that backs the admin console's log view. No card
//! numbers, balances, credentials or document images are ever logged.
//!
//! Every entry is also emitted through `tracing`; hosts that want console
//! output call [`init_tracing`] once at startup.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::domain::result::{Error, Result};
use crate::domain::View;

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique ID based on timestamp + counter
fn generate_id() -> u64 {
    // Lower 16 bits: counter (65536 unique IDs per millisecond)
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    ((now_ms() as u64) << 16) | counter
}

/// Current unix timestamp in milliseconds
fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn detect_platform() -> &'static str {
    if cfg!(target_arch = "wasm32") {
        "web"
    } else if cfg!(target_os = "android") {
        "android"
    } else if cfg!(target_os = "ios") {
        "ios"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// How the client is embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    /// Inside the Telegram WebApp container
    Telegram,
    /// Plain browser or native shell
    Standalone,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Telegram => "telegram",
            EntryPoint::Standalone => "standalone",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            page: None,
            action: None,
            error_message: None,
            error_details: None,
        }
    }

    pub fn with_page(mut self, page: View) -> Self {
        self.page = Some(page.as_str().to_string());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A recorded log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub page: Option<String>,
    pub action: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

/// Bounded journal of client events
pub struct ActivityLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl ActivityLog {
    /// `capacity` is the number of entries kept; the oldest are dropped first
    pub fn new(entry_point: EntryPoint, app_version: impl Into<String>, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<LogEntry>>> {
        self.entries
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))
    }

    /// Record an event
    pub fn log(&self, event: LogEvent) -> Result<()> {
        match &event.error_message {
            Some(error) => warn!(
                event = %event.event,
                page = event.page.as_deref().unwrap_or(""),
                action = event.action.as_deref().unwrap_or(""),
                %error,
                "client event failed"
            ),
            None => info!(
                event = %event.event,
                page = event.page.as_deref().unwrap_or(""),
                action = event.action.as_deref().unwrap_or(""),
                "client event"
            ),
        }

        let entry = LogEntry {
            id: generate_id(),
            timestamp: now_ms(),
            entry_point: self.entry_point.as_str().to_string(),
            app_version: self.app_version.clone(),
            platform: self.platform.to_string(),
            event: event.event,
            page: event.page,
            action: event.action,
            error_message: event.error_message,
            error_details: event.error_details,
        };

        let mut entries = self.entries()?;
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }

    /// Log a simple event with just a name
    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    /// Log a view becoming current
    pub fn log_page(&self, page: View) -> Result<()> {
        self.log(LogEvent::new("page_opened").with_page(page))
    }

    /// Log a user or admin action
    pub fn log_action(&self, action: &str) -> Result<()> {
        self.log(LogEvent::new("action_completed").with_action(action))
    }

    /// Log an error
    pub fn log_error(&self, event: &str, message: &str, details: Option<&str>) -> Result<()> {
        let mut log_event = LogEvent::new(event).with_error(message);
        if let Some(d) = details {
            log_event = log_event.with_error_details(d);
        }
        self.log(log_event)
    }

    /// Most recent entries first, up to `limit`
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self.entries()?.iter().rev().take(limit).cloned().collect())
    }

    /// Most recent failures first, up to `limit`
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self
            .entries()?
            .iter()
            .rev()
            .filter(|e| e.error_message.is_some())
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn count(&self) -> Result<u64> {
        Ok(self.entries()?.len() as u64)
    }

    /// Delete entries older than the timestamp (unix ms)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let mut entries = self.entries()?;
        let before = entries.len();
        entries.retain(|e| e.timestamp >= timestamp_ms);
        Ok((before - entries.len()) as u64)
    }
}

/// Install a `tracing` formatter filtered by `RUST_LOG`, falling back to
/// `default_filter`. Safe to call more than once.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
