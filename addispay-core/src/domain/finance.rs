//! Deposit / withdrawal review queue and system settings

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::card::RequestStatus;

/// Which queue a finance request lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinanceKind {
    Deposit,
    Withdrawal,
}

/// A pending money movement awaiting admin review
///
/// Deposits and withdrawals share the same shape; `FinanceKind` tells the
/// queues apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRequest {
    pub id: String,
    pub user_id: i64,
    pub user_name: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub status: RequestStatus,
}

impl FinanceRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Platform-wide switches managed from the admin console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub max_deposit: Decimal,
    pub max_withdrawal: Decimal,
    pub sandbox_mode: bool,
    pub issuing_enabled: bool,
    pub maintenance_mode: bool,
}

/// Partial update of [`SystemSettings`]; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub max_deposit: Option<Decimal>,
    pub max_withdrawal: Option<Decimal>,
    pub sandbox_mode: Option<bool>,
    pub issuing_enabled: Option<bool>,
    pub maintenance_mode: Option<bool>,
}

impl SystemSettings {
    pub fn apply(&self, patch: &SettingsPatch) -> SystemSettings {
        SystemSettings {
            max_deposit: patch.max_deposit.unwrap_or(self.max_deposit),
            max_withdrawal: patch.max_withdrawal.unwrap_or(self.max_withdrawal),
            sandbox_mode: patch.sandbox_mode.unwrap_or(self.sandbox_mode),
            issuing_enabled: patch.issuing_enabled.unwrap_or(self.issuing_enabled),
            maintenance_mode: patch.maintenance_mode.unwrap_or(self.maintenance_mode),
        }
    }
}
