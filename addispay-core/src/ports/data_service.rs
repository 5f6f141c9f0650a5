//! Data service ports
//!
//! The backing API is split along the three consumers in the client:
//! the user's profile, the user's cards, and the admin console. Every call
//! is a plain request/response; the core imposes no retry policy and only
//! bounds the bootstrap sequence with a timeout.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{
    AccountStatus, Card, CardRequest, CardStatus, FinanceKind, FinanceRequest, KycApplication,
    RequestStatus, ReviewDecision, SystemSettings, Transaction, UserProfile,
};

/// Outcome of a balance-changing card operation
#[derive(Debug, Clone)]
pub struct CardMovement {
    /// Card after the movement was applied
    pub card: Card,
    /// Ledger entry recorded for it
    pub transaction: Transaction,
}

/// The signed-in user's profile and verification submissions
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self) -> Result<UserProfile>;

    /// Hand a completed KYC application over for review
    async fn submit_kyc(&self, application: &KycApplication) -> Result<()>;
}

/// The signed-in user's cards and their ledgers
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn get_cards(&self) -> Result<Vec<Card>>;

    /// Most recent page of transactions for a card, newest first
    async fn get_transactions(&self, card_id: &str) -> Result<Vec<Transaction>>;

    /// Largest single deposit the backend accepts
    async fn get_max_deposit(&self) -> Result<Decimal>;

    async fn fund(&self, card_id: &str, amount: Decimal) -> Result<CardMovement>;

    async fn pay(&self, card_id: &str, recipient: &str, amount: Decimal) -> Result<CardMovement>;

    async fn set_card_status(&self, card_id: &str, status: CardStatus) -> Result<Card>;

    async fn request_card(&self, request: &CardRequest) -> Result<()>;
}

/// Aggregates and review actions of the admin console
#[async_trait]
pub trait AdminDataStore: Send + Sync {
    async fn get_users(&self) -> Result<Vec<UserProfile>>;

    async fn get_kyc_applications(&self) -> Result<Vec<KycApplication>>;

    async fn get_card_requests(&self) -> Result<Vec<CardRequest>>;

    async fn get_all_cards(&self) -> Result<Vec<Card>>;

    async fn get_finance_requests(&self, kind: FinanceKind) -> Result<Vec<FinanceRequest>>;

    async fn get_settings(&self) -> Result<SystemSettings>;

    async fn update_user_status(&self, user_id: i64, status: AccountStatus) -> Result<()>;

    async fn update_kyc_status(&self, application_id: &str, decision: ReviewDecision) -> Result<()>;

    async fn update_finance_status(
        &self,
        kind: FinanceKind,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<()>;

    async fn update_card_request_status(&self, request_id: &str, status: RequestStatus) -> Result<()>;

    async fn update_card_status(&self, card_id: &str, status: CardStatus) -> Result<()>;

    async fn update_settings(&self, settings: &SystemSettings) -> Result<()>;
}
