//! Addis Pay Core - headless state core for the Addis Pay virtual-card mini-app
//!
//! This crate implements the client logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (View, Card, Transaction, KYC, etc.)
//! - **ports**: Trait definitions for external dependencies (data stores, flags, camera, host)
//! - **services**: Navigation reducer, capture sessions, wallet and admin use cases, activity log
//! - **adapters**: Concrete implementations (fixture backend, flag stores, mock camera)
//! - **controller**: The [`ViewController`] a host renders from and forwards events to

pub mod adapters;
pub mod config;
pub mod controller;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::{FileFlagStore, FixedCodeReader, MockApi, MockCamera, MockConfig, RecordingHost};
use config::Config;

// Re-export commonly used types at crate root
pub use controller::{CaptureOutcome, Ports, ViewController};
pub use domain::result::{Error, OperationResult};
pub use domain::{
    Card, CaptureTarget, KycStep, Transaction, UserProfile, VerificationStatus, View,
};
pub use services::{init_tracing, Session};

/// Main context for a locally hosted mini-app
///
/// Wires a [`ViewController`] to the fixture backend, the simulated camera,
/// a recording host and a flag file in `app_dir`, so session flags survive
/// restarts.
pub struct AddisPayContext {
    pub config: Config,
    pub api: Arc<MockApi>,
    pub camera: Arc<MockCamera>,
    pub host: Arc<RecordingHost>,
    pub controller: ViewController,
}

impl AddisPayContext {
    /// Create a new context from the settings in `app_dir`
    pub fn new(app_dir: &Path) -> Result<Self> {
        Self::with_backend(app_dir, MockConfig::default())
    }

    /// Same as [`AddisPayContext::new`] with explicit backend latency
    pub fn with_backend(app_dir: &Path, backend: MockConfig) -> Result<Self> {
        let config = Config::load(app_dir)?;
        let flags = Arc::new(FileFlagStore::new(app_dir)?);

        let api = Arc::new(MockApi::new(backend));
        let camera = Arc::new(MockCamera::new());
        let host = Arc::new(RecordingHost::new());

        let ports = Ports {
            flags,
            profiles: api.clone(),
            cards: api.clone(),
            admin: api.clone(),
            camera: camera.clone(),
            codes: Arc::new(FixedCodeReader::default()),
            host: host.clone(),
        };
        let controller = ViewController::new(config.clone(), ports);

        Ok(Self {
            config,
            api,
            camera,
            host,
            controller,
        })
    }
}
