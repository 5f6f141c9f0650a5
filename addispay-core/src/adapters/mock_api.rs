//! In-memory mock of the Addis Pay backend
//!
//! Implements every data port against fixture data, with per-call latency
//! simulated by `tokio::time::sleep` so hosts see realistic loading states
//! and tests can drive time with `start_paused`.
//!
//! Writes are kept in memory: an approval made from the admin console is
//! visible to the user side on its next fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AccountStatus, Card, CardRequest, CardStatus, FinanceKind, FinanceRequest, KycApplication,
    RequestStatus, ReviewDecision, SystemSettings, Transaction, TransactionKind,
    TransactionStatus, UserProfile, VerificationStatus,
};
use crate::ports::{AdminDataStore, CardMovement, CardStore, ProfileStore};

/// Latency and fault configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub profile_delay_ms: u64,
    pub cards_delay_ms: u64,
    pub transactions_delay_ms: u64,
    pub admin_delay_ms: u64,
    /// Funding and payments
    pub movement_delay_ms: u64,
    pub card_status_delay_ms: u64,
    pub card_request_delay_ms: u64,
    pub kyc_submit_delay_ms: u64,
    /// Reads never resolve (stuck backend)
    pub hang_reads: bool,
    /// Telegram user the profile is derived from
    pub telegram_user_id: i64,
    pub telegram_first_name: String,
    pub telegram_last_name: Option<String>,
    pub telegram_username: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            profile_delay_ms: 300,
            cards_delay_ms: 500,
            transactions_delay_ms: 400,
            admin_delay_ms: 0,
            movement_delay_ms: 1500,
            card_status_delay_ms: 800,
            card_request_delay_ms: 2000,
            kyc_submit_delay_ms: 2000,
            hang_reads: false,
            telegram_user_id: 12345,
            telegram_first_name: "User".to_string(),
            telegram_last_name: None,
            telegram_username: None,
        }
    }
}

impl MockConfig {
    /// Every call resolves immediately
    pub fn instant() -> Self {
        Self {
            profile_delay_ms: 0,
            cards_delay_ms: 0,
            transactions_delay_ms: 0,
            admin_delay_ms: 0,
            movement_delay_ms: 0,
            card_status_delay_ms: 0,
            card_request_delay_ms: 0,
            kyc_submit_delay_ms: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct MockState {
    profile: UserProfile,
    user_cards: Vec<Card>,
    user_transactions: Vec<Transaction>,
    users: Vec<UserProfile>,
    kyc_applications: Vec<KycApplication>,
    card_requests: Vec<CardRequest>,
    all_cards: Vec<Card>,
    deposits: Vec<FinanceRequest>,
    withdrawals: Vec<FinanceRequest>,
    settings: SystemSettings,
}

/// Mock backend implementing [`ProfileStore`], [`CardStore`] and [`AdminDataStore`]
pub struct MockApi {
    config: MockConfig,
    state: Mutex<MockState>,
    fail_reads: AtomicBool,
    fail_updates: AtomicBool,
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn card(id: &str, last_four: &str, balance: Decimal, status: CardStatus, expiry: &str, email: &str, cvv: &str) -> Card {
    Card {
        id: id.to_string(),
        last_four: last_four.to_string(),
        balance,
        currency: "USD".to_string(),
        status,
        expiry: expiry.to_string(),
        email: email.to_string(),
        cvv: cvv.to_string(),
        user_id: None,
        user_name: None,
    }
}

fn user(id: i64, first: &str, last: &str, email: &str, kyc: VerificationStatus) -> UserProfile {
    let mut profile = UserProfile::new(id, first);
    profile.last_name = Some(last.to_string());
    profile.email = Some(email.to_string());
    profile.kyc_status = kyc;
    profile
}

fn kyc_application(id: &str, user_id: i64, name: &str, phone: &str, email: &str) -> KycApplication {
    KycApplication {
        id: id.to_string(),
        user_id,
        full_name: name.to_string(),
        phone: phone.to_string(),
        country: "Ethiopia".to_string(),
        email: email.to_string(),
        date: Utc::now(),
        status: VerificationStatus::Pending,
        documents: None,
    }
}

fn finance_request(id: &str, user_id: i64, name: &str, amount: Decimal) -> FinanceRequest {
    FinanceRequest {
        id: id.to_string(),
        user_id,
        user_name: name.to_string(),
        amount,
        date: Utc::now(),
        status: RequestStatus::Pending,
    }
}

fn fixture_transaction(
    id: &str,
    amount: Decimal,
    kind: TransactionKind,
    status: TransactionStatus,
    description: &str,
    date: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        amount,
        kind,
        status,
        description: description.to_string(),
        date,
        user_id: None,
    }
}

impl MockState {
    fn seed(config: &MockConfig) -> Self {
        let mut profile = UserProfile::new(config.telegram_user_id, config.telegram_first_name.clone());
        profile.last_name = config.telegram_last_name.clone();
        profile.username = config.telegram_username.clone();
        profile.email = Some("user@example.com".to_string());

        let mut abebe_card = card("card_1", "4242", Decimal::new(150_000, 2), CardStatus::Active, "12/26", "abebe@example.com", "123");
        abebe_card.user_name = Some("Abebe Bikila".to_string());
        abebe_card.user_id = Some(9901);
        let mut haile_card = card("card_2", "8812", Decimal::new(4_520, 2), CardStatus::Frozen, "05/27", "haile@example.com", "445");
        haile_card.user_name = Some("Haile Gebrselassie".to_string());
        haile_card.user_id = Some(9903);

        Self {
            profile,
            user_cards: vec![card(
                "card_7721",
                "4242",
                Decimal::new(15_050, 2),
                CardStatus::Active,
                "12/26",
                "user@example.com",
                "123",
            )],
            user_transactions: vec![
                fixture_transaction("1", Decimal::new(2_000, 2), TransactionKind::Debit, TransactionStatus::Completed, "Netflix Subscription", at(2023, 10, 24, 10, 0)),
                fixture_transaction("2", Decimal::new(15_000, 2), TransactionKind::Credit, TransactionStatus::Completed, "Initial Load", at(2023, 10, 20, 14, 22)),
                fixture_transaction("3", Decimal::new(550, 2), TransactionKind::Debit, TransactionStatus::Pending, "Starbucks Coffee", at(2023, 10, 25, 8, 15)),
            ],
            users: vec![
                user(9901, "Abebe", "Bikila", "abebe@example.com", VerificationStatus::Approved),
                user(9902, "Meseret", "Defar", "meseret@example.com", VerificationStatus::Pending),
                user(9903, "Haile", "Gebrselassie", "haile@example.com", VerificationStatus::Approved),
                user(9904, "Tirunesh", "Dibaba", "tiru@example.com", VerificationStatus::None),
            ],
            kyc_applications: vec![
                kyc_application("app_1", 9901, "Abebe Bikila", "+251911223344", "abebe@example.com"),
                kyc_application("app_2", 9902, "Meseret Defar", "+251911556677", "meseret@example.com"),
            ],
            card_requests: vec![CardRequest {
                id: "creq_1".to_string(),
                user_id: 9904,
                user_name: "Tirunesh Dibaba".to_string(),
                email: "tiru@example.com".to_string(),
                date: Utc::now(),
                status: RequestStatus::Pending,
            }],
            all_cards: vec![abebe_card, haile_card],
            deposits: vec![
                finance_request("dep_1", 9901, "Abebe Bikila", Decimal::new(50_000, 2)),
                finance_request("dep_2", 9903, "Haile Gebrselassie", Decimal::new(250_000, 2)),
            ],
            withdrawals: vec![finance_request("wth_1", 9904, "Tirunesh Dibaba", Decimal::new(12_000, 2))],
            settings: SystemSettings {
                max_deposit: Decimal::new(10_000, 0),
                max_withdrawal: Decimal::new(5_000, 0),
                sandbox_mode: true,
                issuing_enabled: true,
                maintenance_mode: false,
            },
        }
    }
}

impl MockApi {
    pub fn new(config: MockConfig) -> Self {
        let state = MockState::seed(&config);
        Self {
            config,
            state: Mutex::new(state),
            fail_reads: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    /// Make every read return a service error
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write return a service error
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Replace the signed-in user's cards (e.g. a verified user without a card)
    pub fn set_user_cards(&self, cards: Vec<Card>) -> Result<()> {
        self.state()?.user_cards = cards;
        Ok(())
    }

    /// Current server-side copy of the signed-in user's profile
    pub fn profile_snapshot(&self) -> Result<UserProfile> {
        Ok(self.state()?.profile.clone())
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))
    }

    async fn read_delay(&self, ms: u64) -> Result<()> {
        if self.config.hang_reads {
            std::future::pending::<()>().await;
        }
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::service("Network request failed"));
        }
        Ok(())
    }

    async fn write_delay(&self, ms: u64) -> Result<()> {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::service("Update rejected by server"));
        }
        Ok(())
    }

    fn apply_movement(
        &self,
        card_id: &str,
        kind: TransactionKind,
        amount: Decimal,
        description: String,
    ) -> Result<CardMovement> {
        let mut state = self.state()?;
        let user_id = state.profile.id;
        let card = state
            .user_cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| Error::not_found(format!("card {}", card_id)))?;
        if !card.is_active() {
            return Err(Error::validation(format!("Card {} is not active.", card.last_four)));
        }

        let mut transaction = Transaction::completed(kind, amount, description);
        transaction.user_id = Some(user_id);
        let new_balance = card
            .balance
            .checked_add(transaction.signed_amount())
            .ok_or_else(|| Error::validation("Card balance limit exceeded."))?;
        if new_balance < Decimal::ZERO {
            return Err(Error::validation("Insufficient node balance."));
        }
        card.balance = new_balance;
        let card = card.clone();

        state.user_transactions.insert(0, transaction.clone());
        Ok(CardMovement { card, transaction })
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

#[async_trait]
impl ProfileStore for MockApi {
    async fn get_profile(&self) -> Result<UserProfile> {
        self.read_delay(self.config.profile_delay_ms).await?;
        Ok(self.state()?.profile.clone())
    }

    async fn submit_kyc(&self, application: &KycApplication) -> Result<()> {
        self.write_delay(self.config.kyc_submit_delay_ms).await?;
        let mut state = self.state()?;
        state.kyc_applications.retain(|a| a.user_id != application.user_id);
        state.kyc_applications.insert(0, application.clone());
        if state.profile.id == application.user_id {
            state.profile.kyc_status = VerificationStatus::Pending;
        }
        debug!(application = %application.id, "KYC application submitted");
        Ok(())
    }
}

#[async_trait]
impl CardStore for MockApi {
    async fn get_cards(&self) -> Result<Vec<Card>> {
        self.read_delay(self.config.cards_delay_ms).await?;
        Ok(self.state()?.user_cards.clone())
    }

    async fn get_transactions(&self, card_id: &str) -> Result<Vec<Transaction>> {
        self.read_delay(self.config.transactions_delay_ms).await?;
        let state = self.state()?;
        if !state.user_cards.iter().any(|c| c.id == card_id) {
            return Err(Error::not_found(format!("card {}", card_id)));
        }
        Ok(state.user_transactions.clone())
    }

    async fn get_max_deposit(&self) -> Result<Decimal> {
        self.read_delay(0).await?;
        Ok(self.state()?.settings.max_deposit)
    }

    async fn fund(&self, card_id: &str, amount: Decimal) -> Result<CardMovement> {
        self.write_delay(self.config.movement_delay_ms).await?;
        self.apply_movement(card_id, TransactionKind::Credit, amount, "Manual Node Funding".to_string())
    }

    async fn pay(&self, card_id: &str, recipient: &str, amount: Decimal) -> Result<CardMovement> {
        self.write_delay(self.config.movement_delay_ms).await?;
        self.apply_movement(card_id, TransactionKind::Debit, amount, format!("Payment to {}", recipient))
    }

    async fn set_card_status(&self, card_id: &str, status: CardStatus) -> Result<Card> {
        self.write_delay(self.config.card_status_delay_ms).await?;
        let mut state = self.state()?;
        let card = state
            .user_cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| Error::not_found(format!("card {}", card_id)))?;
        card.status = status;
        Ok(card.clone())
    }

    async fn request_card(&self, request: &CardRequest) -> Result<()> {
        self.write_delay(self.config.card_request_delay_ms).await?;
        self.state()?.card_requests.insert(0, request.clone());
        debug!(request = %request.id, "card request queued");
        Ok(())
    }
}

#[async_trait]
impl AdminDataStore for MockApi {
    async fn get_users(&self) -> Result<Vec<UserProfile>> {
        self.read_delay(self.config.admin_delay_ms).await?;
        Ok(self.state()?.users.clone())
    }

    async fn get_kyc_applications(&self) -> Result<Vec<KycApplication>> {
        self.read_delay(self.config.admin_delay_ms).await?;
        Ok(self.state()?.kyc_applications.clone())
    }

    async fn get_card_requests(&self) -> Result<Vec<CardRequest>> {
        self.read_delay(self.config.admin_delay_ms).await?;
        Ok(self.state()?.card_requests.clone())
    }

    async fn get_all_cards(&self) -> Result<Vec<Card>> {
        self.read_delay(self.config.admin_delay_ms).await?;
        Ok(self.state()?.all_cards.clone())
    }

    async fn get_finance_requests(&self, kind: FinanceKind) -> Result<Vec<FinanceRequest>> {
        self.read_delay(self.config.admin_delay_ms).await?;
        let state = self.state()?;
        Ok(match kind {
            FinanceKind::Deposit => state.deposits.clone(),
            FinanceKind::Withdrawal => state.withdrawals.clone(),
        })
    }

    async fn get_settings(&self) -> Result<SystemSettings> {
        self.read_delay(self.config.admin_delay_ms).await?;
        Ok(self.state()?.settings.clone())
    }

    async fn update_user_status(&self, user_id: i64, status: AccountStatus) -> Result<()> {
        self.write_delay(self.config.admin_delay_ms).await?;
        let mut state = self.state()?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| Error::not_found(format!("user {}", user_id)))?;
        user.status = status;
        debug!(user_id, ?status, "user status updated");
        Ok(())
    }

    async fn update_kyc_status(&self, application_id: &str, decision: ReviewDecision) -> Result<()> {
        self.write_delay(self.config.admin_delay_ms).await?;
        let mut state = self.state()?;
        let status = VerificationStatus::from(decision);
        let application = state
            .kyc_applications
            .iter_mut()
            .find(|a| a.id == application_id)
            .ok_or_else(|| Error::not_found(format!("KYC application {}", application_id)))?;
        application.status = status;
        let user_id = application.user_id;

        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.kyc_status = status;
        }
        if state.profile.id == user_id {
            state.profile.kyc_status = status;
        }
        debug!(application = application_id, ?status, "KYC status updated");
        Ok(())
    }

    async fn update_finance_status(
        &self,
        kind: FinanceKind,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<()> {
        self.write_delay(self.config.admin_delay_ms).await?;
        let mut state = self.state()?;
        let queue = match kind {
            FinanceKind::Deposit => &mut state.deposits,
            FinanceKind::Withdrawal => &mut state.withdrawals,
        };
        let request = queue
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| Error::not_found(format!("{:?} request {}", kind, request_id)))?;
        request.status = status;
        debug!(request = request_id, ?kind, ?status, "finance request updated");
        Ok(())
    }

    async fn update_card_request_status(&self, request_id: &str, status: RequestStatus) -> Result<()> {
        self.write_delay(self.config.admin_delay_ms).await?;
        let mut state = self.state()?;
        let request = state
            .card_requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| Error::not_found(format!("card request {}", request_id)))?;
        request.status = status;
        debug!(request = request_id, ?status, "card request updated");
        Ok(())
    }

    async fn update_card_status(&self, card_id: &str, status: CardStatus) -> Result<()> {
        self.write_delay(self.config.admin_delay_ms).await?;
        let mut guard = self.state()?;
        let state = &mut *guard;
        let mut found = false;
        for card in state
            .all_cards
            .iter_mut()
            .chain(state.user_cards.iter_mut())
            .filter(|c| c.id == card_id)
        {
            card.status = status;
            found = true;
        }
        if !found {
            return Err(Error::not_found(format!("card {}", card_id)));
        }
        debug!(card = card_id, ?status, "card status updated");
        Ok(())
    }

    async fn update_settings(&self, settings: &SystemSettings) -> Result<()> {
        self.write_delay(self.config.admin_delay_ms).await?;
        self.state()?.settings = settings.clone();
        debug!(?settings, "settings updated");
        Ok(())
    }
}
