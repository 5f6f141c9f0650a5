//! Admin console service - review queues, metrics and system settings
//!
//! Review actions go through the [`AdminUpdatePolicy`]: with `Confirmed`
//! the local copy changes only after the store accepted the update, with
//! `Optimistic` it changes first and stays changed when the store rejects.
//! Either way the store's error is returned. There are no retries.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AdminUpdatePolicy;
use crate::domain::result::{Error, Result};
use crate::domain::{
    AccountStatus, Card, CardRequest, CardStatus, FinanceKind, FinanceRequest, KycApplication,
    RequestStatus, ReviewDecision, SettingsPatch, SystemSettings, UserProfile, VerificationStatus,
};
use crate::ports::AdminDataStore;

/// Everything the admin console shows
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminState {
    pub users: Vec<UserProfile>,
    pub kyc_applications: Vec<KycApplication>,
    pub card_requests: Vec<CardRequest>,
    pub cards: Vec<Card>,
    pub deposits: Vec<FinanceRequest>,
    pub withdrawals: Vec<FinanceRequest>,
    pub settings: Option<SystemSettings>,
    /// User opened in the detail view
    pub selected_user_id: Option<i64>,
}

/// Account status filter of the user list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Suspended,
}

impl StatusFilter {
    fn accepts(self, status: AccountStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => status == AccountStatus::Active,
            StatusFilter::Suspended => status == AccountStatus::Suspended,
        }
    }
}

/// Dashboard figures derived from [`AdminState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminMetrics {
    pub total_users: usize,
    pub pending_kyc: usize,
    pub approved_kyc: usize,
    pub active_cards: usize,
    pub frozen_cards: usize,
    pub pending_deposit_amount: Decimal,
    pub pending_withdrawal_amount: Decimal,
    pub total_card_float: Decimal,
    pub pending_card_requests: usize,
}

fn pending_sum(requests: &[FinanceRequest]) -> Decimal {
    requests
        .iter()
        .filter(|r| r.is_pending())
        .map(|r| r.amount)
        .sum()
}

impl AdminState {
    pub fn selected_user(&self) -> Option<&UserProfile> {
        let id = self.selected_user_id?;
        self.users.iter().find(|u| u.id == id)
    }

    pub fn metrics(&self) -> AdminMetrics {
        let kyc_with = |status: VerificationStatus| {
            self.kyc_applications
                .iter()
                .filter(|a| a.status == status)
                .count()
        };
        let cards_with = |status: CardStatus| self.cards.iter().filter(|c| c.status == status).count();

        AdminMetrics {
            total_users: self.users.len(),
            pending_kyc: kyc_with(VerificationStatus::Pending),
            approved_kyc: kyc_with(VerificationStatus::Approved),
            active_cards: cards_with(CardStatus::Active),
            frozen_cards: cards_with(CardStatus::Frozen),
            pending_deposit_amount: pending_sum(&self.deposits),
            pending_withdrawal_amount: pending_sum(&self.withdrawals),
            total_card_float: self.cards.iter().map(|c| c.balance).sum(),
            pending_card_requests: self
                .card_requests
                .iter()
                .filter(|r| r.status == RequestStatus::Pending)
                .count(),
        }
    }

    /// Users matching a search term (name, email or id) and a status filter
    pub fn filter_users(&self, term: &str, filter: StatusFilter) -> Vec<&UserProfile> {
        self.users
            .iter()
            .filter(|u| filter.accepts(u.status) && u.matches_search(term))
            .collect()
    }

    fn finance_queue(&mut self, kind: FinanceKind) -> &mut Vec<FinanceRequest> {
        match kind {
            FinanceKind::Deposit => &mut self.deposits,
            FinanceKind::Withdrawal => &mut self.withdrawals,
        }
    }
}

pub struct AdminService {
    store: Arc<dyn AdminDataStore>,
    policy: AdminUpdatePolicy,
}

impl AdminService {
    pub fn new(store: Arc<dyn AdminDataStore>, policy: AdminUpdatePolicy) -> Self {
        Self { store, policy }
    }

    /// Fetch every aggregate concurrently; the first failure wins
    pub async fn load(&self) -> Result<AdminState> {
        let (users, kyc_applications, card_requests, cards, deposits, withdrawals, settings) = tokio::try_join!(
            self.store.get_users(),
            self.store.get_kyc_applications(),
            self.store.get_card_requests(),
            self.store.get_all_cards(),
            self.store.get_finance_requests(FinanceKind::Deposit),
            self.store.get_finance_requests(FinanceKind::Withdrawal),
            self.store.get_settings(),
        )?;

        debug!(
            users = users.len(),
            kyc = kyc_applications.len(),
            cards = cards.len(),
            "admin data loaded"
        );
        Ok(AdminState {
            users,
            kyc_applications,
            card_requests,
            cards,
            deposits,
            withdrawals,
            settings: Some(settings),
            selected_user_id: None,
        })
    }

    /// Run a store update and apply `change` according to the policy
    async fn commit<Fut, F>(&self, state: &mut AdminState, update: Fut, change: F) -> Result<()>
    where
        Fut: Future<Output = Result<()>>,
        F: FnOnce(&mut AdminState),
    {
        match self.policy {
            AdminUpdatePolicy::Confirmed => {
                update.await?;
                change(state);
                Ok(())
            }
            AdminUpdatePolicy::Optimistic => {
                change(state);
                update.await.inspect_err(|e| {
                    warn!(error = %e, "update rejected, keeping optimistic change");
                })
            }
        }
    }

    pub async fn update_user_status(
        &self,
        state: &mut AdminState,
        user_id: i64,
        status: AccountStatus,
    ) -> Result<()> {
        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(Error::not_found(format!("user {}", user_id)));
        }
        let update = self.store.update_user_status(user_id, status);
        self.commit(state, update, |s| {
            if let Some(user) = s.users.iter_mut().find(|u| u.id == user_id) {
                user.status = status;
            }
        })
        .await?;
        info!(user_id, ?status, "user status changed");
        Ok(())
    }

    /// Decide on a user's verification
    ///
    /// Users without an application on file only change locally.
    pub async fn update_kyc_status(
        &self,
        state: &mut AdminState,
        user_id: i64,
        decision: ReviewDecision,
    ) -> Result<()> {
        let status = VerificationStatus::from(decision);
        let application_id = state
            .kyc_applications
            .iter()
            .find(|a| a.user_id == user_id)
            .map(|a| a.id.clone());
        if application_id.is_none() && !state.users.iter().any(|u| u.id == user_id) {
            return Err(Error::not_found(format!("user {}", user_id)));
        }

        let change = |s: &mut AdminState| {
            if let Some(app) = s.kyc_applications.iter_mut().find(|a| a.user_id == user_id) {
                app.status = status;
            }
            if let Some(user) = s.users.iter_mut().find(|u| u.id == user_id) {
                user.kyc_status = status;
            }
        };

        match application_id {
            Some(id) => {
                let update = self.store.update_kyc_status(&id, decision);
                self.commit(state, update, change).await?;
            }
            None => change(state),
        }
        info!(user_id, ?status, "KYC decision recorded");
        Ok(())
    }

    pub async fn process_finance(
        &self,
        state: &mut AdminState,
        kind: FinanceKind,
        request_id: &str,
        decision: ReviewDecision,
    ) -> Result<()> {
        if !state.finance_queue(kind).iter().any(|r| r.id == request_id) {
            return Err(Error::not_found(format!("{:?} request {}", kind, request_id)));
        }
        let status = RequestStatus::from(decision);
        let update = self.store.update_finance_status(kind, request_id, status);
        self.commit(state, update, |s| {
            if let Some(request) = s.finance_queue(kind).iter_mut().find(|r| r.id == request_id) {
                request.status = status;
            }
        })
        .await?;
        info!(request = request_id, ?kind, ?status, "finance request processed");
        Ok(())
    }

    pub async fn process_card_request(
        &self,
        state: &mut AdminState,
        request_id: &str,
        decision: ReviewDecision,
    ) -> Result<()> {
        if !state.card_requests.iter().any(|r| r.id == request_id) {
            return Err(Error::not_found(format!("card request {}", request_id)));
        }
        let status = RequestStatus::from(decision);
        let update = self.store.update_card_request_status(request_id, status);
        self.commit(state, update, |s| {
            if let Some(request) = s.card_requests.iter_mut().find(|r| r.id == request_id) {
                request.status = status;
            }
        })
        .await?;
        info!(request = request_id, ?status, "card request processed");
        Ok(())
    }

    pub async fn update_card_status(
        &self,
        state: &mut AdminState,
        card_id: &str,
        status: CardStatus,
    ) -> Result<()> {
        if !state.cards.iter().any(|c| c.id == card_id) {
            return Err(Error::not_found(format!("card {}", card_id)));
        }
        let update = self.store.update_card_status(card_id, status);
        self.commit(state, update, |s| {
            if let Some(card) = s.cards.iter_mut().find(|c| c.id == card_id) {
                card.status = status;
            }
        })
        .await?;
        info!(card = card_id, ?status, "card status changed");
        Ok(())
    }

    /// Merge `patch` into the current settings and store the result
    pub async fn update_settings(
        &self,
        state: &mut AdminState,
        patch: &SettingsPatch,
    ) -> Result<SystemSettings> {
        let merged = state
            .settings
            .as_ref()
            .ok_or_else(|| Error::not_found("system settings are not loaded"))?
            .apply(patch);
        let update = self.store.update_settings(&merged);
        let local = merged.clone();
        self.commit(state, update, move |s| s.settings = Some(local))
            .await?;
        info!("system settings updated");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_api::{MockApi, MockConfig};

    async fn loaded(policy: AdminUpdatePolicy) -> (Arc<MockApi>, AdminService, AdminState) {
        let api = Arc::new(MockApi::new(MockConfig::instant()));
        let store: Arc<dyn AdminDataStore> = api.clone();
        let admin = AdminService::new(store, policy);
        let state = admin.load().await.unwrap();
        (api, admin, state)
    }

    #[tokio::test]
    async fn test_load_collects_every_queue() {
        let (_, _, state) = loaded(AdminUpdatePolicy::Confirmed).await;
        assert_eq!(state.users.len(), 4);
        assert_eq!(state.kyc_applications.len(), 2);
        assert_eq!(state.card_requests.len(), 1);
        assert_eq!(state.deposits.len(), 2);
        assert_eq!(state.withdrawals.len(), 1);
        assert!(state.settings.is_some());
    }

    #[tokio::test]
    async fn test_load_fails_as_a_whole() {
        let api = Arc::new(MockApi::new(MockConfig::instant()));
        api.set_fail_reads(true);
        let store: Arc<dyn AdminDataStore> = api.clone();
        let admin = AdminService::new(store, AdminUpdatePolicy::Confirmed);
        assert!(matches!(admin.load().await, Err(Error::Service(_))));
    }

    #[tokio::test]
    async fn test_metrics_from_fixtures() {
        let (_, _, state) = loaded(AdminUpdatePolicy::Confirmed).await;
        let metrics = state.metrics();
        assert_eq!(metrics.pending_kyc, 2);
        assert_eq!(metrics.approved_kyc, 0);
        assert_eq!(metrics.active_cards, 1);
        assert_eq!(metrics.frozen_cards, 1);
        assert_eq!(metrics.pending_deposit_amount, Decimal::new(3_000, 0));
        assert_eq!(metrics.pending_withdrawal_amount, Decimal::new(120, 0));
        assert_eq!(metrics.total_card_float, Decimal::new(154_520, 2));
        assert_eq!(metrics.pending_card_requests, 1);
    }

    #[tokio::test]
    async fn test_filter_users() {
        let (_, _, mut state) = loaded(AdminUpdatePolicy::Confirmed).await;
        assert_eq!(state.filter_users("", StatusFilter::All).len(), 4);
        assert_eq!(state.filter_users("haile", StatusFilter::All).len(), 1);
        assert_eq!(state.filter_users("EXAMPLE.COM", StatusFilter::All).len(), 4);
        assert_eq!(state.filter_users("9902", StatusFilter::All).len(), 1);

        state.users[1].status = AccountStatus::Suspended;
        let suspended = state.filter_users("", StatusFilter::Suspended);
        assert_eq!(suspended.len(), 1);
        assert_eq!(suspended[0].id, 9902);
        assert_eq!(state.filter_users("", StatusFilter::Active).len(), 3);
    }

    #[tokio::test]
    async fn test_confirmed_rejection_keeps_local_state() {
        let (api, admin, mut state) = loaded(AdminUpdatePolicy::Confirmed).await;
        api.set_fail_updates(true);

        let result = admin.update_user_status(&mut state, 9901, AccountStatus::Suspended).await;
        assert!(result.is_err());
        assert_eq!(state.users[0].status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_optimistic_rejection_keeps_change_and_reports() {
        let (api, admin, mut state) = loaded(AdminUpdatePolicy::Optimistic).await;
        api.set_fail_updates(true);

        let result = admin
            .process_finance(&mut state, FinanceKind::Deposit, "dep_1", ReviewDecision::Approved)
            .await;
        assert!(matches!(result, Err(Error::Service(_))));
        assert_eq!(state.deposits[0].status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_kyc_decision_updates_application_and_user() {
        let (api, admin, mut state) = loaded(AdminUpdatePolicy::Confirmed).await;
        admin
            .update_kyc_status(&mut state, 9902, ReviewDecision::Rejected)
            .await
            .unwrap();
        assert_eq!(state.kyc_applications[1].status, VerificationStatus::Rejected);
        assert_eq!(state.users[1].kyc_status, VerificationStatus::Rejected);

        let remote = api.get_users().await.unwrap();
        assert_eq!(remote[1].kyc_status, VerificationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_kyc_decision_without_application_is_local() {
        let (api, admin, mut state) = loaded(AdminUpdatePolicy::Confirmed).await;
        api.set_fail_updates(true);
        admin
            .update_kyc_status(&mut state, 9904, ReviewDecision::Approved)
            .await
            .unwrap();
        assert_eq!(state.users[3].kyc_status, VerificationStatus::Approved);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (_, admin, mut state) = loaded(AdminUpdatePolicy::Optimistic).await;
        let result = admin
            .process_card_request(&mut state, "creq_404", ReviewDecision::Approved)
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(admin.update_card_status(&mut state, "card_404", CardStatus::Closed).await.is_err());
    }

    #[tokio::test]
    async fn test_card_request_and_card_status() {
        let (_, admin, mut state) = loaded(AdminUpdatePolicy::Confirmed).await;
        admin
            .process_card_request(&mut state, "creq_1", ReviewDecision::Approved)
            .await
            .unwrap();
        admin
            .update_card_status(&mut state, "card_2", CardStatus::Active)
            .await
            .unwrap();
        let metrics = state.metrics();
        assert_eq!(metrics.pending_card_requests, 0);
        assert_eq!(metrics.active_cards, 2);
    }

    #[tokio::test]
    async fn test_settings_patch_is_merged() {
        let (api, admin, mut state) = loaded(AdminUpdatePolicy::Confirmed).await;
        let patch = SettingsPatch {
            maintenance_mode: Some(true),
            ..Default::default()
        };
        let merged = admin.update_settings(&mut state, &patch).await.unwrap();
        assert!(merged.maintenance_mode);
        assert!(merged.sandbox_mode);
        assert_eq!(api.get_settings().await.unwrap(), merged);
        assert_eq!(state.settings, Some(merged));
    }
}
