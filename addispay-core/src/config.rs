//! Configuration management
//!
//! Read from `settings.json` in the app directory:
//! ```json
//! {
//!   "app": { "appName": "Addis Pay", "bootstrapTimeoutMs": 10000, ... },
//!   "credentials": { "admin": { "email": "...", "passwordSha256": "..." } }
//! }
//! ```
//! Keys the core does not manage are preserved when saving.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What to do when a capture is requested while another one is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapturePolicy {
    /// Refuse the new session; the open one stays untouched
    Reject,
    /// Release the open session, then start the new one
    #[default]
    Replace,
}

/// How admin review actions treat a rejection from the backing store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminUpdatePolicy {
    /// Local state changes only after the store accepted the update
    #[default]
    Confirmed,
    /// Local state changes first and is kept even if the store rejects
    Optimistic,
}

/// Email plus SHA-256 digest of the password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub email: String,
    pub password_sha256: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: &str) -> Self {
        Self {
            email: email.into(),
            password_sha256: sha256_hex(password),
        }
    }

    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
            && self.password_sha256.eq_ignore_ascii_case(&sha256_hex(password))
    }
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    credentials: CredentialSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bootstrap_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capture_policy: Option<CapturePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin_update_policy: Option<AdminUpdatePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    activity_log_capacity: Option<usize>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin: Option<Credential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verified_account: Option<Credential>,
}

const DEFAULT_APP_NAME: &str = "Addis Pay";
const DEFAULT_BOOTSTRAP_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_ACTIVITY_LOG_CAPACITY: usize = 500;

/// Addis Pay configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub bootstrap_timeout: Duration,
    pub capture_policy: CapturePolicy,
    pub admin_update_policy: AdminUpdatePolicy,
    pub activity_log_capacity: usize,
    pub admin: Credential,
    /// Test account that signs in already verified
    pub verified_account: Option<Credential>,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            bootstrap_timeout: Duration::from_millis(DEFAULT_BOOTSTRAP_TIMEOUT_MS),
            capture_policy: CapturePolicy::default(),
            admin_update_policy: AdminUpdatePolicy::default(),
            activity_log_capacity: DEFAULT_ACTIVITY_LOG_CAPACITY,
            admin: Credential {
                email: "ethiopian@payment.com".to_string(),
                password_sha256: "e92306d51de6f1e747d55bead79f60bcf2dc5bdc52bcdb065e67f34fc985e0a1"
                    .to_string(),
            },
            verified_account: Some(Credential {
                email: "verified@pay.bot".to_string(),
                password_sha256: "0b7d533eaf02301e9b047563b1237947b263f45f9c76a1b602781da3257a5746"
                    .to_string(),
            }),
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the app directory
    ///
    /// Environment overrides (for CI/testing):
    /// `ADDISPAY_BOOTSTRAP_TIMEOUT_MS`, `ADDISPAY_CAPTURE_POLICY`,
    /// `ADDISPAY_ADMIN_UPDATE_POLICY`.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let settings_path = app_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)?
        } else {
            SettingsFile::default()
        };

        let defaults = Config::default();

        let timeout_ms = match std::env::var("ADDISPAY_BOOTSTRAP_TIMEOUT_MS") {
            Ok(value) => value.trim().parse::<u64>()?,
            Err(_) => raw
                .app
                .bootstrap_timeout_ms
                .unwrap_or(DEFAULT_BOOTSTRAP_TIMEOUT_MS),
        };

        let capture_policy = match std::env::var("ADDISPAY_CAPTURE_POLICY").ok().as_deref() {
            Some("reject" | "REJECT") => CapturePolicy::Reject,
            Some("replace" | "REPLACE") => CapturePolicy::Replace,
            _ => raw.app.capture_policy.unwrap_or_default(),
        };

        let admin_update_policy = match std::env::var("ADDISPAY_ADMIN_UPDATE_POLICY").ok().as_deref() {
            Some("confirmed" | "CONFIRMED") => AdminUpdatePolicy::Confirmed,
            Some("optimistic" | "OPTIMISTIC") => AdminUpdatePolicy::Optimistic,
            _ => raw.app.admin_update_policy.unwrap_or_default(),
        };

        Ok(Self {
            app_name: raw.app.app_name.clone().unwrap_or(defaults.app_name),
            bootstrap_timeout: Duration::from_millis(timeout_ms),
            capture_policy,
            admin_update_policy,
            activity_log_capacity: raw
                .app
                .activity_log_capacity
                .unwrap_or(defaults.activity_log_capacity),
            admin: raw.credentials.admin.clone().unwrap_or(defaults.admin),
            verified_account: raw
                .credentials
                .verified_account
                .clone()
                .or(defaults.verified_account),
            _raw_settings: raw,
        })
    }

    /// Save config to the app directory
    /// Preserves other settings that the core doesn't manage
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let settings_path = app_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_else(|_| self._raw_settings.clone())
        } else {
            self._raw_settings.clone()
        };

        settings.app.app_name = Some(self.app_name.clone());
        settings.app.bootstrap_timeout_ms = Some(self.bootstrap_timeout.as_millis() as u64);
        settings.app.capture_policy = Some(self.capture_policy);
        settings.app.admin_update_policy = Some(self.admin_update_policy);
        settings.app.activity_log_capacity = Some(self.activity_log_capacity);
        settings.credentials.admin = Some(self.admin.clone());
        settings.credentials.verified_account = self.verified_account.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}
