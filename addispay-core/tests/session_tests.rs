//! Session bootstrap, login and logout tests
//!
//! Simulated latency is real `tokio::time::sleep`; tests that depend on
//! it run with a paused clock so they finish instantly.
//!
//! Run with: cargo test --test session_tests -- --nocapture

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use addispay_core::adapters::{
    FixedCodeReader, MemoryFlagStore, MockApi, MockCamera, MockConfig, RecordingHost,
};
use addispay_core::config::Config;
use addispay_core::domain::{CaptureTarget, View};
use addispay_core::ports::flag_store::{
    ADMIN_SESSION_KEY, FLAG_TRUE, KYC_STATUS_KEY, USER_SESSION_KEY,
};
use addispay_core::ports::FlagStore;
use addispay_core::{AddisPayContext, Error, Ports, Session, VerificationStatus, ViewController};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestApp {
    api: Arc<MockApi>,
    flags: Arc<MemoryFlagStore>,
    camera: Arc<MockCamera>,
    host: Arc<RecordingHost>,
    controller: ViewController,
}

fn create_app(backend: MockConfig, config: Config, flags: MemoryFlagStore) -> TestApp {
    let api = Arc::new(MockApi::new(backend));
    let flags = Arc::new(flags);
    let camera = Arc::new(MockCamera::new());
    let host = Arc::new(RecordingHost::new());
    let ports = Ports {
        flags: flags.clone(),
        profiles: api.clone(),
        cards: api.clone(),
        admin: api.clone(),
        camera: camera.clone(),
        codes: Arc::new(FixedCodeReader::default()),
        host: host.clone(),
    };
    TestApp {
        api,
        flags,
        camera,
        host,
        controller: ViewController::new(config, ports),
    }
}

fn instant_app(flags: MemoryFlagStore) -> TestApp {
    create_app(MockConfig::instant(), Config::default(), flags)
}

// ============================================================================
// Bootstrap Routing Tests
// ============================================================================

#[tokio::test]
async fn test_no_flags_shows_splash() {
    let mut app = instant_app(MemoryFlagStore::new());
    assert_eq!(app.controller.bootstrap().await, View::Splash);
    assert_eq!(app.controller.session(), Session::None);
    assert!(app.controller.wallet().profile.is_none());
}

#[tokio::test]
async fn test_user_flag_loads_wallet() {
    let mut app = instant_app(MemoryFlagStore::with_flags([(USER_SESSION_KEY, FLAG_TRUE)]));
    assert_eq!(app.controller.bootstrap().await, View::Dashboard);
    assert_eq!(app.controller.session(), Session::User);

    let wallet = app.controller.wallet();
    assert_eq!(wallet.profile.as_ref().map(|p| p.id), Some(12345));
    assert_eq!(wallet.selected_card_id.as_deref(), Some("card_7721"));
    assert_eq!(wallet.transactions.len(), 3);
    assert_eq!(app.controller.verification(), VerificationStatus::None);
}

#[tokio::test]
async fn test_cached_status_overrides_profile() {
    let mut app = instant_app(MemoryFlagStore::with_flags([
        (USER_SESSION_KEY, FLAG_TRUE),
        (KYC_STATUS_KEY, "APPROVED"),
    ]));
    app.controller.bootstrap().await;
    assert_eq!(app.controller.verification(), VerificationStatus::Approved);
}

#[tokio::test]
async fn test_admin_flag_wins_over_user_flag() {
    let mut app = instant_app(MemoryFlagStore::with_flags([
        (USER_SESSION_KEY, FLAG_TRUE),
        (ADMIN_SESSION_KEY, FLAG_TRUE),
    ]));
    assert_eq!(app.controller.bootstrap().await, View::AdminDashboard);
    assert_eq!(app.controller.session(), Session::Admin);
    assert_eq!(app.controller.admin().users.len(), 4);
    assert!(app.controller.wallet().profile.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_waits_for_simulated_latency() {
    let mut app = create_app(
        MockConfig::default(),
        Config::default(),
        MemoryFlagStore::with_flags([(USER_SESSION_KEY, FLAG_TRUE)]),
    );
    let start = tokio::time::Instant::now();
    assert_eq!(app.controller.bootstrap().await, View::Dashboard);
    // profile + cards + transactions
    assert!(start.elapsed() >= Duration::from_millis(1200));
}

// ============================================================================
// Bootstrap Failure Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_bootstrap_timeout_falls_back_to_splash() {
    let backend = MockConfig {
        hang_reads: true,
        ..MockConfig::instant()
    };
    let mut config = Config::default();
    config.bootstrap_timeout = Duration::from_millis(250);
    let mut app = create_app(
        backend,
        config,
        MemoryFlagStore::with_flags([(USER_SESSION_KEY, FLAG_TRUE)]),
    );

    assert_eq!(app.controller.bootstrap().await, View::Splash);
    assert_eq!(app.controller.session(), Session::None);
    assert!(app.controller.wallet().profile.is_none());
    assert!(app.host.alerts().is_empty());

    let errors = app.controller.recent_errors(10).unwrap();
    assert_eq!(errors[0].event, "bootstrap_failed");
    assert!(errors[0].error_message.as_deref().unwrap_or("").contains("250 ms"));
}

#[tokio::test]
async fn test_admin_load_failure_falls_back_to_splash() {
    let app_flags = MemoryFlagStore::with_flags([(ADMIN_SESSION_KEY, FLAG_TRUE)]);
    let mut app = instant_app(app_flags);
    app.api.set_fail_reads(true);

    assert_eq!(app.controller.bootstrap().await, View::Splash);
    assert_eq!(app.controller.session(), Session::None);
    assert!(app.controller.admin().users.is_empty());
}

#[tokio::test]
async fn test_unreadable_flags_mean_no_session() {
    let flags = MemoryFlagStore::with_flags([(USER_SESSION_KEY, FLAG_TRUE)]);
    flags.set_unavailable(true);
    let mut app = instant_app(flags);
    assert_eq!(app.controller.bootstrap().await, View::Splash);
}

// ============================================================================
// Login / Logout Tests
// ============================================================================

#[tokio::test]
async fn test_verified_account_login() {
    let mut app = instant_app(MemoryFlagStore::new());
    app.controller.bootstrap().await;

    let view = app.controller.login_user("verified@pay.bot", "paymentbot").await.unwrap();
    assert_eq!(view, View::Dashboard);
    assert_eq!(app.controller.verification(), VerificationStatus::Approved);
    assert_eq!(app.flags.get(USER_SESSION_KEY).unwrap().as_deref(), Some(FLAG_TRUE));
    assert_eq!(app.flags.get(KYC_STATUS_KEY).unwrap().as_deref(), Some("APPROVED"));
}

#[tokio::test]
async fn test_regular_login_is_unverified() {
    let mut app = instant_app(MemoryFlagStore::new());
    app.controller.login_user("someone@example.com", "secret").await.unwrap();
    assert_eq!(app.controller.session(), Session::User);
    assert_eq!(app.controller.verification(), VerificationStatus::None);
    assert_eq!(app.flags.get(KYC_STATUS_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let mut app = instant_app(MemoryFlagStore::new());
    let result = app.controller.login_user("", "secret").await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(app.flags.is_empty());
    assert_eq!(app.host.alerts().len(), 1);
}

#[tokio::test]
async fn test_signup_prefills_kyc_form() {
    let mut app = instant_app(MemoryFlagStore::new());
    assert!(app.controller.signup(" ", "a@b.co", "pw").await.is_err());

    app.controller.signup("Meseret Defar", "meseret@example.com", "pw").await.unwrap();
    assert_eq!(app.controller.wallet().kyc.full_name, "Meseret Defar");
    assert_eq!(app.controller.wallet().kyc.email, "meseret@example.com");
}

#[tokio::test]
async fn test_invalid_admin_credentials() {
    let mut app = instant_app(MemoryFlagStore::new());
    let result = app.controller.login_admin("ethiopian@payment.com", "wrong").await;

    assert!(matches!(result, Err(Error::Unauthorized(_))));
    assert_eq!(app.host.alerts(), vec!["Invalid Admin Credentials.".to_string()]);
    assert!(app.flags.is_empty());
    assert_eq!(app.controller.session(), Session::None);
}

#[tokio::test]
async fn test_admin_login_replaces_user_session() {
    let mut app = instant_app(MemoryFlagStore::with_flags([(USER_SESSION_KEY, FLAG_TRUE)]));
    app.controller.bootstrap().await;

    let view = app.controller.login_admin("ethiopian@payment.com", "Payment2025").await.unwrap();
    assert_eq!(view, View::AdminDashboard);
    assert_eq!(app.flags.get(USER_SESSION_KEY).unwrap(), None);
    assert_eq!(app.flags.get(ADMIN_SESSION_KEY).unwrap().as_deref(), Some(FLAG_TRUE));
    assert!(app.controller.wallet().profile.is_none());
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let mut app = instant_app(MemoryFlagStore::with_flags([
        (USER_SESSION_KEY, FLAG_TRUE),
        (KYC_STATUS_KEY, "APPROVED"),
    ]));
    app.controller.bootstrap().await;
    app.controller.navigate(View::Pay);
    app.controller.start_capture(CaptureTarget::QrScan).await.unwrap();

    app.controller.logout().unwrap();
    assert_eq!(app.controller.current_view(), View::Splash);
    assert!(app.controller.stack().is_empty());
    assert_eq!(app.controller.session(), Session::None);
    assert_eq!(app.controller.verification(), VerificationStatus::None);
    assert_eq!(app.camera.open_streams(), 0);
    assert!(app.flags.is_empty());

    assert_eq!(app.controller.bootstrap().await, View::Splash);
}

// ============================================================================
// Persistence Tests
// ============================================================================

/// Session flags written by one context are restored by the next
#[tokio::test]
async fn test_session_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut ctx = AddisPayContext::with_backend(temp_dir.path(), MockConfig::instant()).unwrap();
        ctx.controller.login_user("verified@pay.bot", "paymentbot").await.unwrap();
    }

    let mut ctx = AddisPayContext::with_backend(temp_dir.path(), MockConfig::instant()).unwrap();
    assert_eq!(ctx.controller.bootstrap().await, View::Dashboard);
    assert_eq!(ctx.controller.verification(), VerificationStatus::Approved);

    ctx.controller.logout().unwrap();
    let mut ctx = AddisPayContext::with_backend(temp_dir.path(), MockConfig::instant()).unwrap();
    assert_eq!(ctx.controller.bootstrap().await, View::Splash);
}
