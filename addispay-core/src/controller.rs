//! View controller - the single entry point a host drives
//!
//! Owns the navigation state, the session data and the camera slot. Every
//! view change goes through [`transition`]; the controller runs the
//! returned effects against the ports. Operations take `&mut self` and
//! await their calls to completion, so a response can never be applied
//! after a later navigation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{CapturePolicy, Config};
use crate::domain::result::{Error, Result};
use crate::domain::{
    AccountStatus, CaptureTarget, CapturedImage, CardRequest, CardStatus, FinanceKind, KycStep,
    ReviewDecision, SettingsPatch, SystemSettings, Transaction, UserProfile, VerificationStatus,
    View,
};
use crate::ports::{
    AdminDataStore, CaptureDevice, CardStore, CodeReader, FlagStore, Haptic, HostFeedback,
    ProfileStore,
};
use crate::services::{
    transition, ActivityLog, AdminMetrics, AdminService, AdminState, CaptureService, Effect,
    EntryPoint, LogEntry, LogEvent, NavEvent, NavigationState, Session, SessionService,
    StatusFilter, Transition, WalletService, WalletState,
};

pub const FUND_SUCCESS: &str = "Card Funded Successfully!";
pub const CARD_REQUESTED: &str = "Card Request Submitted! Admin will review your node shortly.";
pub const CAMERA_DENIED: &str = "Camera access denied.";
pub const INVALID_ADMIN_CREDENTIALS: &str = "Invalid Admin Credentials.";

/// The adapters a controller runs against
#[derive(Clone)]
pub struct Ports {
    pub flags: Arc<dyn FlagStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub cards: Arc<dyn CardStore>,
    pub admin: Arc<dyn AdminDataStore>,
    pub camera: Arc<dyn CaptureDevice>,
    pub codes: Arc<dyn CodeReader>,
    pub host: Arc<dyn HostFeedback>,
}

/// What a captured frame turned into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// Image stored in the KYC form slot for this target
    Document { target: CaptureTarget },
    /// QR text stored as the payment recipient
    Recipient { text: String },
}

async fn bounded<T>(limit: Duration, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, call).await.map_err(|_| {
        Error::Timeout(format!("{} did not load within {} ms", what, limit.as_millis()))
    })?
}

pub struct ViewController {
    config: Config,
    nav: NavigationState,
    session: Session,
    sessions: SessionService,
    capture: CaptureService,
    wallet_service: WalletService,
    admin_service: AdminService,
    wallet: WalletState,
    admin: AdminState,
    log: ActivityLog,
    host: Arc<dyn HostFeedback>,
}

impl ViewController {
    pub fn new(config: Config, ports: Ports) -> Self {
        let log = ActivityLog::new(
            EntryPoint::Telegram,
            env!("CARGO_PKG_VERSION"),
            config.activity_log_capacity,
        );
        Self {
            nav: NavigationState::default(),
            session: Session::None,
            sessions: SessionService::new(ports.flags),
            capture: CaptureService::new(ports.camera, ports.codes),
            wallet_service: WalletService::new(ports.profiles, ports.cards),
            admin_service: AdminService::new(ports.admin, config.admin_update_policy),
            wallet: WalletState::default(),
            admin: AdminState::default(),
            log,
            host: ports.host,
            config,
        }
    }

    /// Tag activity entries with another embedding
    pub fn with_entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.log = ActivityLog::new(
            entry_point,
            env!("CARGO_PKG_VERSION"),
            self.config.activity_log_capacity,
        );
        self
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_view(&self) -> View {
        self.nav.current()
    }

    pub fn stack(&self) -> &[View] {
        self.nav.stack()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn verification(&self) -> VerificationStatus {
        self.nav.verification()
    }

    pub fn kyc_step(&self) -> KycStep {
        self.nav.kyc_step()
    }

    pub fn active_capture(&self) -> Option<CaptureTarget> {
        self.nav.capture()
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn wallet(&self) -> &WalletState {
        &self.wallet
    }

    pub fn admin(&self) -> &AdminState {
        &self.admin
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.log
    }

    // =========================================================================
    // Effects
    // =========================================================================

    fn dispatch(&mut self, event: NavEvent) {
        let before = self.nav.current();
        let Transition { state, effects } = transition(self.nav.clone(), event);

        // The stream must be stopped before the new view is committed
        if effects.contains(&Effect::ReleaseCapture) {
            self.capture.close();
        }
        self.nav = state;

        for effect in effects {
            match effect {
                Effect::ReleaseCapture => {}
                Effect::Alert(message) => self.alert(&message),
                Effect::Haptic(haptic) => self.haptic(haptic),
                Effect::ScrollToTop => {
                    if let Err(e) = self.host.scroll_to_top() {
                        debug!(error = %e, "scroll unavailable");
                    }
                }
            }
        }

        let current = self.nav.current();
        if current != before {
            self.record(self.log.log_page(current));
        }
    }

    fn alert(&self, message: &str) {
        if let Err(e) = self.host.alert(message) {
            debug!(error = %e, "alert unavailable");
        }
    }

    fn haptic(&self, haptic: Haptic) {
        if let Err(e) = self.host.haptic(haptic) {
            debug!(error = %e, ?haptic, "haptics unavailable");
        }
    }

    fn record(&self, logged: Result<()>) {
        if let Err(e) = logged {
            debug!(error = %e, "activity log unavailable");
        }
    }

    fn action_done(&self, action: &str, haptic: Haptic) {
        self.haptic(haptic);
        self.record(self.log.log_action(action));
    }

    /// Surface a failed action to the user and hand the error back
    fn fail(&self, action: &str, error: Error) -> Error {
        self.alert(&error.user_message());
        self.record(
            self.log.log(
                LogEvent::new("action_failed")
                    .with_page(self.nav.current())
                    .with_action(action)
                    .with_error(error.to_string()),
            ),
        );
        error
    }

    fn require_session(&self, expected: Session) -> Result<()> {
        if self.session == expected {
            Ok(())
        } else {
            Err(Error::Unauthorized(match expected {
                Session::Admin => "Admin sign-in required.".to_string(),
                _ => "Please sign in first.".to_string(),
            }))
        }
    }

    fn drop_session_data(&mut self) {
        self.wallet = WalletState::default();
        self.admin = AdminState::default();
        self.session = Session::None;
        self.dispatch(NavEvent::SetVerification(VerificationStatus::None));
        self.dispatch(NavEvent::SetKycStep(KycStep::Details));
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Forward navigation; restricted views redirect to the KYC form
    /// while the user is not verified
    pub fn navigate(&mut self, target: View) -> View {
        self.dispatch(NavEvent::Navigate(target));
        self.nav.current()
    }

    /// Back button: closes an open capture first, otherwise pops history
    pub fn go_back(&mut self) -> View {
        self.dispatch(NavEvent::Back);
        self.nav.current()
    }

    /// Jump to `view` and forget the history
    pub fn reset_to(&mut self, view: View) -> View {
        self.dispatch(NavEvent::ResetTo(view));
        self.nav.current()
    }

    pub fn set_verification_status(&mut self, status: VerificationStatus) {
        if let Err(e) = self.sessions.cache_verification(status) {
            warn!(error = %e, "could not cache verification status");
        }
        if let Some(profile) = self.wallet.profile.as_mut() {
            profile.kyc_status = status;
        }
        self.dispatch(NavEvent::SetVerification(status));
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Restore the persisted session and load its data
    ///
    /// Never fails: a load error or timeout is logged and leaves the
    /// controller on the splash view without session data.
    pub async fn bootstrap(&mut self) -> View {
        let restored = self.sessions.restore();
        info!(session = ?restored, "bootstrapping");

        let loaded = match restored {
            Session::Admin => self.enter_admin().await,
            Session::User => self.enter_user().await,
            Session::None => Ok(()),
        };

        if let Err(e) = loaded {
            warn!(session = ?restored, error = %e, "bootstrap failed, falling back to splash");
            self.record(
                self.log.log(
                    LogEvent::new("bootstrap_failed")
                        .with_action(format!("{:?}", restored).to_lowercase())
                        .with_error(e.to_string()),
                ),
            );
            self.drop_session_data();
        }
        if self.session == Session::None {
            self.dispatch(NavEvent::ResetTo(View::Splash));
        }
        self.nav.current()
    }

    async fn enter_user(&mut self) -> Result<()> {
        let cached = self.sessions.cached_verification();
        let wallet = bounded(
            self.config.bootstrap_timeout,
            "user data",
            self.wallet_service.load(cached),
        )
        .await?;

        let verification = wallet.verification();
        self.wallet = wallet;
        self.admin = AdminState::default();
        self.session = Session::User;
        self.dispatch(NavEvent::SetVerification(verification));
        self.dispatch(NavEvent::ResetTo(View::Dashboard));
        Ok(())
    }

    async fn enter_admin(&mut self) -> Result<()> {
        let admin = bounded(
            self.config.bootstrap_timeout,
            "admin data",
            self.admin_service.load(),
        )
        .await?;

        self.admin = admin;
        self.wallet = WalletState::default();
        self.session = Session::Admin;
        self.dispatch(NavEvent::ResetTo(View::AdminDashboard));
        Ok(())
    }

    async fn start_user_session(&mut self, verified: bool) -> Result<View> {
        if let Err(e) = self.sessions.begin_user(verified) {
            return Err(self.fail("login", e));
        }
        if let Err(e) = self.enter_user().await {
            self.drop_session_data();
            return Err(self.fail("login", e));
        }
        self.action_done("login", Haptic::Success);
        Ok(self.nav.current())
    }

    /// Sign in as a regular user
    ///
    /// The configured verified account signs in with an approved status.
    pub async fn login_user(&mut self, email: &str, password: &str) -> Result<View> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(self.fail("login", Error::validation("Please enter your email and password.")));
        }
        let verified = self
            .config
            .verified_account
            .as_ref()
            .map(|account| account.matches(email, password))
            .unwrap_or(false);
        self.start_user_session(verified).await
    }

    /// Create an account; the name and email prefill the KYC form
    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> Result<View> {
        if name.trim().is_empty() {
            return Err(self.fail("signup", Error::validation("Please enter your name.")));
        }
        if email.trim().is_empty() || password.is_empty() {
            return Err(self.fail("signup", Error::validation("Please enter your email and password.")));
        }
        let view = self.start_user_session(false).await?;
        self.wallet.kyc.full_name = name.trim().to_string();
        self.wallet.kyc.email = email.trim().to_string();
        Ok(view)
    }

    pub async fn login_admin(&mut self, email: &str, password: &str) -> Result<View> {
        if !self.config.admin.matches(email, password) {
            return Err(self.fail(
                "admin_login",
                Error::Unauthorized(INVALID_ADMIN_CREDENTIALS.to_string()),
            ));
        }
        if let Err(e) = self.sessions.begin_admin() {
            return Err(self.fail("admin_login", e));
        }
        if let Err(e) = self.enter_admin().await {
            self.drop_session_data();
            return Err(self.fail("admin_login", e));
        }
        self.action_done("admin_login", Haptic::Success);
        Ok(self.nav.current())
    }

    /// End the session and wipe everything persisted for it
    ///
    /// Local state is always reset; a storage failure is still reported.
    pub fn logout(&mut self) -> Result<()> {
        let cleared = self.sessions.end();
        self.drop_session_data();
        self.dispatch(NavEvent::ResetTo(View::Splash));
        self.record(self.log.log_event("logout"));
        cleared.inspect_err(|e| warn!(error = %e, "could not clear session flags"))
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Open the camera for `target`
    ///
    /// With a session already open, [`CapturePolicy::Reject`] refuses and
    /// [`CapturePolicy::Replace`] releases the old stream first.
    pub async fn start_capture(&mut self, target: CaptureTarget) -> Result<()> {
        if let Some(active) = self.capture.active_target() {
            match self.config.capture_policy {
                CapturePolicy::Reject => {
                    debug!(active = %active, requested = %target, "capture busy");
                    return Err(Error::CaptureBusy(active.to_string()));
                }
                CapturePolicy::Replace => self.dispatch(NavEvent::CaptureClosed),
            }
        }

        match self.capture.open(target).await {
            Ok(()) => {
                self.dispatch(NavEvent::CaptureOpened(target));
                Ok(())
            }
            Err(e) => {
                self.alert(CAMERA_DENIED);
                self.record(
                    self.log.log(
                        LogEvent::new("capture_denied")
                            .with_page(self.nav.current())
                            .with_action(target.as_str())
                            .with_error(e.to_string()),
                    ),
                );
                Err(e)
            }
        }
    }

    /// Take the still for the open capture and close it
    pub fn capture_frame(&mut self) -> Result<CaptureOutcome> {
        let target = self
            .capture
            .active_target()
            .ok_or_else(|| Error::CaptureUnavailable("no capture session is open".to_string()))?;

        let image = match self.capture.grab() {
            Ok(image) => image,
            Err(e) => {
                self.dispatch(NavEvent::CaptureClosed);
                return Err(self.fail("capture", e));
            }
        };

        let outcome = if target == CaptureTarget::QrScan {
            let decoded = self.capture.decode(&image.data);
            self.dispatch(NavEvent::CaptureClosed);
            let text = decoded.ok_or_else(|| self.fail("qr_scan", Error::validation("No QR code found.")))?;
            self.wallet.pay_recipient = text.clone();
            self.action_done("qr_scan", Haptic::ImpactHeavy);
            CaptureOutcome::Recipient { text }
        } else {
            self.wallet.kyc.attach(image);
            self.dispatch(NavEvent::CaptureClosed);
            self.action_done("capture", Haptic::Success);
            CaptureOutcome::Document { target }
        };
        Ok(outcome)
    }

    /// File-picker path for a document slot; QR uploads are ignored
    pub fn attach_upload(&mut self, target: CaptureTarget, data: Vec<u8>, mime: &str) -> Result<()> {
        if target == CaptureTarget::QrScan {
            debug!("ignoring QR upload");
            return Ok(());
        }
        if data.is_empty() {
            return Err(self.fail("upload", Error::validation("The selected file is empty.")));
        }
        self.wallet.kyc.attach(CapturedImage::new(target, mime, data));
        self.action_done("upload", Haptic::Success);
        Ok(())
    }

    /// Cancel the open capture. Returns whether one was open.
    pub fn close_capture(&mut self) -> bool {
        let open = self.nav.capture().is_some();
        self.dispatch(NavEvent::CaptureClosed);
        open
    }

    // =========================================================================
    // KYC form
    // =========================================================================

    pub fn set_kyc_details(&mut self, full_name: &str, email: &str) {
        self.wallet.kyc.full_name = full_name.to_string();
        self.wallet.kyc.email = email.to_string();
    }

    /// Leave the current KYC step; the last step submits the form
    pub async fn advance_kyc(&mut self) -> Result<KycStep> {
        let step = self.nav.kyc_step();
        if let Err(e) = self.wallet.kyc.validate_step(step) {
            return Err(self.fail("kyc_step", e));
        }
        match step.next() {
            Some(next) => {
                self.dispatch(NavEvent::SetKycStep(next));
                Ok(next)
            }
            None => {
                self.submit_kyc().await?;
                Ok(step)
            }
        }
    }

    pub async fn submit_kyc(&mut self) -> Result<()> {
        if let Err(e) = self.require_session(Session::User) {
            return Err(self.fail("kyc_submit", e));
        }
        if let Err(e) = self.wallet_service.submit_kyc(&mut self.wallet).await {
            return Err(self.fail("kyc_submit", e));
        }
        if let Err(e) = self.sessions.cache_verification(VerificationStatus::Pending) {
            warn!(error = %e, "could not cache verification status");
        }
        self.dispatch(NavEvent::SetVerification(VerificationStatus::Pending));
        self.dispatch(NavEvent::SetKycStep(KycStep::Details));
        self.dispatch(NavEvent::ResetTo(View::KycSubmitted));
        self.action_done("kyc_submit", Haptic::Success);
        Ok(())
    }

    // =========================================================================
    // Wallet
    // =========================================================================

    pub async fn select_card(&mut self, card_id: &str) -> Result<()> {
        if let Err(e) = self.require_session(Session::User) {
            return Err(self.fail("select_card", e));
        }
        if let Err(e) = self.wallet_service.select_card(&mut self.wallet, card_id).await {
            return Err(self.fail("select_card", e));
        }
        Ok(())
    }

    pub async fn fund_card(&mut self, amount: &str) -> Result<Transaction> {
        if let Err(e) = self.require_session(Session::User) {
            return Err(self.fail("fund", e));
        }
        match self.wallet_service.fund(&mut self.wallet, amount).await {
            Ok(transaction) => {
                self.alert(FUND_SUCCESS);
                self.action_done("fund", Haptic::Success);
                self.dispatch(NavEvent::ResetTo(View::Dashboard));
                Ok(transaction)
            }
            Err(e) => Err(self.fail("fund", e)),
        }
    }

    pub async fn pay(&mut self, recipient: &str, amount: &str) -> Result<Transaction> {
        if let Err(e) = self.require_session(Session::User) {
            return Err(self.fail("pay", e));
        }
        match self.wallet_service.pay(&mut self.wallet, recipient, amount).await {
            Ok(transaction) => {
                self.action_done("pay", Haptic::Success);
                self.dispatch(NavEvent::ResetTo(View::PaySuccess));
                Ok(transaction)
            }
            Err(e) => Err(self.fail("pay", e)),
        }
    }

    pub async fn request_card(&mut self) -> Result<CardRequest> {
        if let Err(e) = self.require_session(Session::User) {
            return Err(self.fail("request_card", e));
        }
        match self.wallet_service.request_card(&self.wallet).await {
            Ok(request) => {
                self.alert(CARD_REQUESTED);
                self.action_done("request_card", Haptic::Success);
                self.dispatch(NavEvent::ResetTo(View::Dashboard));
                Ok(request)
            }
            Err(e) => Err(self.fail("request_card", e)),
        }
    }

    pub async fn toggle_freeze(&mut self) -> Result<CardStatus> {
        if let Err(e) = self.require_session(Session::User) {
            return Err(self.fail("toggle_freeze", e));
        }
        match self.wallet_service.toggle_freeze(&mut self.wallet).await {
            Ok(status) => {
                self.action_done("toggle_freeze", Haptic::Success);
                Ok(status)
            }
            Err(e) => Err(self.fail("toggle_freeze", e)),
        }
    }

    // =========================================================================
    // Admin console
    // =========================================================================

    /// Refetch every admin aggregate
    pub async fn load_admin_data(&mut self) -> Result<()> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("admin_load", e));
        }
        match self.admin_service.load().await {
            Ok(mut admin) => {
                admin.selected_user_id = self.admin.selected_user_id;
                self.admin = admin;
                Ok(())
            }
            Err(e) => Err(self.fail("admin_load", e)),
        }
    }

    /// Show a top-level admin tab
    pub fn switch_tab(&mut self, tab: View) -> Result<View> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("switch_tab", e));
        }
        if !tab.is_admin_tab() {
            return Err(Error::validation(format!("{} is not an admin tab", tab)));
        }
        self.dispatch(NavEvent::ResetTo(tab));
        Ok(self.nav.current())
    }

    pub fn open_user(&mut self, user_id: i64) -> Result<View> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("open_user", e));
        }
        if !self.admin.users.iter().any(|u| u.id == user_id) {
            return Err(Error::not_found(format!("user {}", user_id)));
        }
        self.admin.selected_user_id = Some(user_id);
        self.dispatch(NavEvent::Navigate(View::AdminUserDetail));
        Ok(self.nav.current())
    }

    pub async fn update_user_status(&mut self, user_id: i64, status: AccountStatus) -> Result<()> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("update_user", e));
        }
        match self
            .admin_service
            .update_user_status(&mut self.admin, user_id, status)
            .await
        {
            Ok(()) => {
                self.action_done("update_user", Haptic::Success);
                Ok(())
            }
            Err(e) => Err(self.fail("update_user", e)),
        }
    }

    pub async fn update_kyc_status(&mut self, user_id: i64, decision: ReviewDecision) -> Result<()> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("update_kyc", e));
        }
        match self
            .admin_service
            .update_kyc_status(&mut self.admin, user_id, decision)
            .await
        {
            Ok(()) => {
                self.action_done("update_kyc", Haptic::Success);
                Ok(())
            }
            Err(e) => Err(self.fail("update_kyc", e)),
        }
    }

    pub async fn process_finance(
        &mut self,
        request_id: &str,
        kind: FinanceKind,
        decision: ReviewDecision,
    ) -> Result<()> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("process_finance", e));
        }
        match self
            .admin_service
            .process_finance(&mut self.admin, kind, request_id, decision)
            .await
        {
            Ok(()) => {
                self.action_done("process_finance", Haptic::Success);
                Ok(())
            }
            Err(e) => Err(self.fail("process_finance", e)),
        }
    }

    pub async fn process_card_request(&mut self, request_id: &str, decision: ReviewDecision) -> Result<()> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("process_card_request", e));
        }
        match self
            .admin_service
            .process_card_request(&mut self.admin, request_id, decision)
            .await
        {
            Ok(()) => {
                self.action_done("process_card_request", Haptic::Success);
                Ok(())
            }
            Err(e) => Err(self.fail("process_card_request", e)),
        }
    }

    pub async fn update_card_status(&mut self, card_id: &str, status: CardStatus) -> Result<()> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("update_card", e));
        }
        match self
            .admin_service
            .update_card_status(&mut self.admin, card_id, status)
            .await
        {
            Ok(()) => {
                self.action_done("update_card", Haptic::Success);
                Ok(())
            }
            Err(e) => Err(self.fail("update_card", e)),
        }
    }

    pub async fn update_settings(&mut self, patch: &SettingsPatch) -> Result<SystemSettings> {
        if let Err(e) = self.require_session(Session::Admin) {
            return Err(self.fail("update_settings", e));
        }
        match self.admin_service.update_settings(&mut self.admin, patch).await {
            Ok(settings) => {
                self.action_done("update_settings", Haptic::ImpactLight);
                Ok(settings)
            }
            Err(e) => Err(self.fail("update_settings", e)),
        }
    }

    pub fn metrics(&self) -> AdminMetrics {
        self.admin.metrics()
    }

    pub fn filter_users(&self, term: &str, filter: StatusFilter) -> Vec<&UserProfile> {
        self.admin.filter_users(term, filter)
    }

    /// Newest activity entries for the log view
    pub fn recent_activity(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.log.get_recent(limit)
    }

    pub fn recent_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.log.get_errors(limit)
    }
}
