//! Virtual card domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::kyc::ReviewDecision;

/// Lifecycle state of a virtual card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardStatus {
    Active,
    Frozen,
    Pending,
    Closed,
}

impl CardStatus {
    /// Target of the freeze/unfreeze toggle. Only active and frozen cards toggle.
    pub fn toggled(self) -> Option<CardStatus> {
        match self {
            CardStatus::Active => Some(CardStatus::Frozen),
            CardStatus::Frozen => Some(CardStatus::Active),
            CardStatus::Pending | CardStatus::Closed => None,
        }
    }
}

/// A virtual card and its balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub last_four: String,
    pub balance: Decimal,
    /// ISO 4217 currency code, uppercase
    pub currency: String,
    pub status: CardStatus,
    /// MM/YY
    pub expiry: String,
    pub email: String,
    pub cvv: String,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
}

impl Card {
    pub fn is_active(&self) -> bool {
        self.status == CardStatus::Active
    }
}

/// Review state shared by card, deposit and withdrawal requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<ReviewDecision> for RequestStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => RequestStatus::Approved,
            ReviewDecision::Rejected => RequestStatus::Rejected,
        }
    }
}

/// A user's request for a new card, reviewed by an admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    pub id: String,
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
    pub date: DateTime<Utc>,
    pub status: RequestStatus,
}
