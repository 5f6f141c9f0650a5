//! Card transaction domain model

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

/// A single movement on a card. `amount` is always positive; `kind` carries the sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub description: String,
    pub date: DateTime<Utc>,
    pub user_id: Option<i64>,
}

impl Transaction {
    /// New completed transaction stamped now
    pub fn completed(kind: TransactionKind, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            id: format!("tx_{}", Uuid::new_v4().simple()),
            amount,
            kind,
            status: TransactionStatus::Completed,
            description: description.into(),
            date: Utc::now(),
            user_id: None,
        }
    }

    /// Effect on the card balance
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Credit => self.amount,
            TransactionKind::Debit => -self.amount,
        }
    }
}

/// Largest amount a single form entry may carry
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Parse a user-entered amount ("25", "10.50", " 7 ")
///
/// Empty input, non-numbers, zero, negatives and anything above
/// [`MAX_AMOUNT`] are rejected.
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Please enter or select an amount."));
    }
    let amount = Decimal::from_str(trimmed)
        .map_err(|_| Error::validation(format!("'{}' is not a valid amount.", trimmed)))?
        .round_dp(2);
    if amount <= Decimal::ZERO {
        return Err(Error::validation("Amount must be greater than zero."));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::validation(format!("Amount cannot exceed {}.", MAX_AMOUNT)));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 25 ").unwrap(), Decimal::new(25, 0));
        assert_eq!(parse_amount("10.499").unwrap(), Decimal::new(1050, 2));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("0.001").is_err());
        assert!(parse_amount("-5").is_err());
        assert_eq!(parse_amount("1000000000").unwrap(), MAX_AMOUNT);
        assert!(parse_amount("1000000000.01").is_err());
        assert!(matches!(
            parse_amount("79228162514264337593543950335"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_signed_amount() {
        let debit = Transaction::completed(TransactionKind::Debit, Decimal::new(550, 2), "Coffee");
        assert_eq!(debit.signed_amount(), Decimal::new(-550, 2));
        assert!(debit.id.starts_with("tx_"));
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let tx = Transaction::completed(TransactionKind::Credit, Decimal::ONE, "Load");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "CREDIT");
        assert_eq!(json["status"], "COMPLETED");
    }
}
