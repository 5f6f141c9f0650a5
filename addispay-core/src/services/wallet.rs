//! Wallet service - the signed-in user's cards, ledger and KYC form
//!
//! Every action validates its input synchronously before calling a port.
//! A failed validation or a rejected call leaves [`WalletState`] untouched;
//! local state only changes with what the store returned.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    parse_amount, Card, CardRequest, CardStatus, KycApplication, KycDraft, KycStep, RequestStatus,
    Transaction, UserProfile, VerificationStatus,
};
use crate::ports::{CardMovement, CardStore, ProfileStore};

/// Session data of a regular user
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalletState {
    pub profile: Option<UserProfile>,
    pub cards: Vec<Card>,
    /// Ledger of the selected card, newest first
    pub transactions: Vec<Transaction>,
    pub selected_card_id: Option<String>,
    /// Deposit limit as published by the backend at load time
    pub max_deposit: Option<Decimal>,
    /// Filled by a QR scan, cleared after a payment
    pub pay_recipient: String,
    #[serde(skip)]
    pub kyc: KycDraft,
}

impl WalletState {
    pub fn selected_card(&self) -> Option<&Card> {
        let id = self.selected_card_id.as_deref()?;
        self.cards.iter().find(|c| c.id == id)
    }

    /// Verification status as known from the profile
    pub fn verification(&self) -> VerificationStatus {
        self.profile
            .as_ref()
            .map(|p| p.kyc_status)
            .unwrap_or_default()
    }

    fn require_card(&self) -> Result<&Card> {
        self.selected_card()
            .ok_or_else(|| Error::validation("No card selected."))
    }

    fn require_profile(&self) -> Result<&UserProfile> {
        self.profile
            .as_ref()
            .ok_or_else(|| Error::validation("Profile is not loaded yet."))
    }

    fn replace_card(&mut self, card: Card) {
        if let Some(slot) = self.cards.iter_mut().find(|c| c.id == card.id) {
            *slot = card;
        }
    }

    fn apply_movement(&mut self, movement: CardMovement) -> Transaction {
        self.replace_card(movement.card);
        self.transactions.insert(0, movement.transaction.clone());
        movement.transaction
    }
}

pub struct WalletService {
    profiles: Arc<dyn ProfileStore>,
    cards: Arc<dyn CardStore>,
}

impl WalletService {
    pub fn new(profiles: Arc<dyn ProfileStore>, cards: Arc<dyn CardStore>) -> Self {
        Self { profiles, cards }
    }

    /// Fetch profile, cards and the first card's ledger
    ///
    /// A verification status cached on the device overrides the profile's.
    pub async fn load(&self, cached: Option<VerificationStatus>) -> Result<WalletState> {
        let mut profile = self.profiles.get_profile().await?;
        if let Some(status) = cached {
            profile.kyc_status = status;
        }

        let cards = self.cards.get_cards().await?;
        let max_deposit = self.cards.get_max_deposit().await?;
        let mut state = WalletState {
            profile: Some(profile),
            max_deposit: Some(max_deposit),
            ..Default::default()
        };

        if let Some(first) = cards.first() {
            state.transactions = self.cards.get_transactions(&first.id).await?;
            state.selected_card_id = Some(first.id.clone());
        }
        state.cards = cards;

        debug!(
            cards = state.cards.len(),
            transactions = state.transactions.len(),
            "wallet loaded"
        );
        Ok(state)
    }

    /// Select another card and fetch its ledger
    pub async fn select_card(&self, state: &mut WalletState, card_id: &str) -> Result<()> {
        if !state.cards.iter().any(|c| c.id == card_id) {
            return Err(Error::not_found(format!("card {}", card_id)));
        }
        let transactions = self.cards.get_transactions(card_id).await?;
        state.selected_card_id = Some(card_id.to_string());
        state.transactions = transactions;
        Ok(())
    }

    /// Load funds onto the selected card
    pub async fn fund(&self, state: &mut WalletState, amount: &str) -> Result<Transaction> {
        let amount = parse_amount(amount)?;
        if let Some(max) = state.max_deposit {
            if amount > max {
                return Err(Error::validation(format!(
                    "Amount exceeds the maximum deposit of {}.",
                    max
                )));
            }
        }
        let card_id = state.require_card()?.id.clone();

        let movement = self.cards.fund(&card_id, amount).await?;
        info!(card = %card_id, "card funded");
        Ok(state.apply_movement(movement))
    }

    /// Pay a recipient from the selected card
    pub async fn pay(&self, state: &mut WalletState, recipient: &str, amount: &str) -> Result<Transaction> {
        let recipient = recipient.trim();
        if recipient.is_empty() || amount.trim().is_empty() {
            return Err(Error::validation("Please enter recipient and amount."));
        }
        let amount = parse_amount(amount)?;
        let card = state.require_card()?;
        if card.balance < amount {
            return Err(Error::validation("Insufficient node balance."));
        }
        let card_id = card.id.clone();

        let movement = self.cards.pay(&card_id, recipient, amount).await?;
        info!(card = %card_id, "payment sent");
        state.pay_recipient.clear();
        Ok(state.apply_movement(movement))
    }

    /// Queue a card issuance request for admin review
    pub async fn request_card(&self, state: &WalletState) -> Result<CardRequest> {
        let profile = state.require_profile()?;
        let request = CardRequest {
            id: format!("creq_{}", Uuid::new_v4().simple()),
            user_id: profile.id,
            user_name: profile.display_name(),
            email: profile
                .email
                .clone()
                .unwrap_or_else(|| "user@example.com".to_string()),
            date: Utc::now(),
            status: RequestStatus::Pending,
        };
        self.cards.request_card(&request).await?;
        info!(request = %request.id, "card requested");
        Ok(request)
    }

    /// Flip the selected card between active and frozen
    pub async fn toggle_freeze(&self, state: &mut WalletState) -> Result<CardStatus> {
        let card = state.require_card()?;
        let next = card.status.toggled().ok_or_else(|| {
            Error::validation(format!("Card {} cannot be frozen or unfrozen.", card.last_four))
        })?;
        let card_id = card.id.clone();

        let updated = self.cards.set_card_status(&card_id, next).await?;
        let status = updated.status;
        state.replace_card(updated);
        info!(card = %card_id, ?status, "card status toggled");
        Ok(status)
    }

    /// Send the completed KYC form
    pub async fn submit_kyc(&self, state: &mut WalletState) -> Result<KycApplication> {
        for step in [KycStep::Details, KycStep::IdFront, KycStep::IdBack, KycStep::Selfie] {
            state.kyc.validate_step(step)?;
        }
        let profile = state.require_profile()?;
        let documents = state
            .kyc
            .documents()
            .ok_or_else(|| Error::validation("Please capture all verification images."))?;

        let application = KycApplication {
            id: format!("kyc_{}", Uuid::new_v4().simple()),
            user_id: profile.id,
            full_name: state.kyc.full_name.trim().to_string(),
            phone: profile.phone.clone().unwrap_or_default(),
            country: profile.country.clone().unwrap_or_default(),
            email: state.kyc.email.trim().to_string(),
            date: Utc::now(),
            status: VerificationStatus::Pending,
            documents: Some(documents),
        };
        self.profiles.submit_kyc(&application).await?;

        if let Some(profile) = state.profile.as_mut() {
            profile.kyc_status = VerificationStatus::Pending;
        }
        state.kyc = KycDraft::default();
        info!(application = %application.id, "KYC submitted");
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_api::{MockApi, MockConfig};
    use crate::domain::{CaptureTarget, CapturedImage, TransactionKind};

    fn service(api: &Arc<MockApi>) -> WalletService {
        let profiles: Arc<dyn ProfileStore> = api.clone();
        let cards: Arc<dyn CardStore> = api.clone();
        WalletService::new(profiles, cards)
    }

    async fn loaded() -> (Arc<MockApi>, WalletService, WalletState) {
        let api = Arc::new(MockApi::new(MockConfig::instant()));
        let wallet = service(&api);
        let state = wallet.load(None).await.unwrap();
        (api, wallet, state)
    }

    #[tokio::test]
    async fn test_load_selects_first_card() {
        let (_, _, state) = loaded().await;
        assert_eq!(state.selected_card_id.as_deref(), Some("card_7721"));
        assert_eq!(state.transactions.len(), 3);
        assert_eq!(state.verification(), VerificationStatus::None);
        assert_eq!(state.max_deposit, Some(Decimal::new(10_000, 0)));
    }

    #[tokio::test]
    async fn test_cached_status_overrides_profile() {
        let api = Arc::new(MockApi::new(MockConfig::instant()));
        let state = service(&api)
            .load(Some(VerificationStatus::Approved))
            .await
            .unwrap();
        assert_eq!(state.verification(), VerificationStatus::Approved);
    }

    #[tokio::test]
    async fn test_load_without_cards() {
        let api = Arc::new(MockApi::new(MockConfig::instant()));
        api.set_user_cards(Vec::new()).unwrap();
        let state = service(&api).load(None).await.unwrap();
        assert!(state.selected_card().is_none());
        assert!(state.transactions.is_empty());
    }

    #[tokio::test]
    async fn test_fund_applies_balance_and_ledger() {
        let (_, wallet, mut state) = loaded().await;
        let tx = wallet.fund(&mut state, "25").await.unwrap();
        assert_eq!(tx.kind, TransactionKind::Credit);
        assert_eq!(state.selected_card().unwrap().balance, Decimal::new(17_550, 2));
        assert_eq!(state.transactions[0].id, tx.id);
    }

    #[tokio::test]
    async fn test_fund_validation_mutates_nothing() {
        let (_, wallet, mut state) = loaded().await;
        let before = state.clone();

        let empty = wallet.fund(&mut state, "").await.unwrap_err();
        assert_eq!(empty.user_message(), "Please enter or select an amount.");

        let over = wallet.fund(&mut state, "20000").await;
        assert!(matches!(over, Err(Error::Validation(_))));

        assert_eq!(state.cards, before.cards);
        assert_eq!(state.transactions, before.transactions);
    }

    #[tokio::test]
    async fn test_pay_rejects_overdraft_locally() {
        let (_, wallet, mut state) = loaded().await;
        let err = wallet.pay(&mut state, "node_1", "500").await.unwrap_err();
        assert_eq!(err.user_message(), "Insufficient node balance.");
        assert_eq!(state.transactions.len(), 3);
    }

    #[tokio::test]
    async fn test_pay_requires_recipient() {
        let (_, wallet, mut state) = loaded().await;
        let err = wallet.pay(&mut state, "  ", "5").await.unwrap_err();
        assert_eq!(err.user_message(), "Please enter recipient and amount.");
    }

    #[tokio::test]
    async fn test_pay_clears_recipient() {
        let (_, wallet, mut state) = loaded().await;
        state.pay_recipient = "qr_node_8812".to_string();
        let tx = wallet.pay(&mut state, "qr_node_8812", "50.50").await.unwrap();
        assert_eq!(tx.description, "Payment to qr_node_8812");
        assert!(state.pay_recipient.is_empty());
        assert_eq!(state.selected_card().unwrap().balance, Decimal::new(10_000, 2));
    }

    #[tokio::test]
    async fn test_rejected_call_mutates_nothing() {
        let (api, wallet, mut state) = loaded().await;
        api.set_fail_updates(true);
        assert!(wallet.fund(&mut state, "10").await.is_err());
        assert!(wallet.toggle_freeze(&mut state).await.is_err());
        assert_eq!(state.selected_card().unwrap().balance, Decimal::new(15_050, 2));
        assert_eq!(state.selected_card().unwrap().status, CardStatus::Active);
    }

    #[tokio::test]
    async fn test_toggle_freeze_round_trip() {
        let (_, wallet, mut state) = loaded().await;
        assert_eq!(wallet.toggle_freeze(&mut state).await.unwrap(), CardStatus::Frozen);
        assert_eq!(wallet.toggle_freeze(&mut state).await.unwrap(), CardStatus::Active);
    }

    #[tokio::test]
    async fn test_request_card_uses_profile() {
        let (_, wallet, state) = loaded().await;
        let request = wallet.request_card(&state).await.unwrap();
        assert!(request.id.starts_with("creq_"));
        assert_eq!(request.user_id, 12345);
        assert_eq!(request.user_name, "User");
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_kyc_requires_every_step() {
        let (api, wallet, mut state) = loaded().await;
        state.kyc.full_name = "Test User".to_string();
        state.kyc.email = "test@example.com".to_string();
        state.kyc.attach(CapturedImage::jpeg(CaptureTarget::IdFront, vec![1]));
        state.kyc.attach(CapturedImage::jpeg(CaptureTarget::IdBack, vec![2]));

        let err = wallet.submit_kyc(&mut state).await.unwrap_err();
        assert_eq!(err.user_message(), "Please take a selfie to finish verification.");
        assert_eq!(state.verification(), VerificationStatus::None);

        state.kyc.attach(CapturedImage::jpeg(CaptureTarget::Selfie, vec![3]));
        let application = wallet.submit_kyc(&mut state).await.unwrap();
        assert_eq!(application.full_name, "Test User");
        assert!(application.documents.unwrap().selfie.starts_with("data:image/jpeg;base64,"));
        assert_eq!(state.verification(), VerificationStatus::Pending);
        assert!(state.kyc.front.is_none());
        assert_eq!(api.profile_snapshot().unwrap().kyc_status, VerificationStatus::Pending);
    }

    #[tokio::test]
    async fn test_select_unknown_card() {
        let (_, wallet, mut state) = loaded().await;
        assert!(wallet.select_card(&mut state, "card_x").await.is_err());
        assert_eq!(state.selected_card_id.as_deref(), Some("card_7721"));
    }
}
