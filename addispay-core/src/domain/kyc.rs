//! Identity verification (KYC) domain model

use std::str::FromStr;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::capture::{CaptureTarget, CapturedImage};
use super::result::{Error, Result};

/// Outcome of the user's identity check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::None => "NONE",
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Approved => "APPROVED",
            VerificationStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_approved(self) -> bool {
        self == VerificationStatus::Approved
    }
}

impl FromStr for VerificationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "NONE" => Ok(VerificationStatus::None),
            "PENDING" => Ok(VerificationStatus::Pending),
            "APPROVED" => Ok(VerificationStatus::Approved),
            "REJECTED" => Ok(VerificationStatus::Rejected),
            other => Err(Error::validation(format!("unknown verification status '{}'", other))),
        }
    }
}

/// Decision an admin can take on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for VerificationStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => VerificationStatus::Approved,
            ReviewDecision::Rejected => VerificationStatus::Rejected,
        }
    }
}

/// Stage of the four-step KYC form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KycStep {
    #[default]
    Details = 1,
    IdFront = 2,
    IdBack = 3,
    Selfie = 4,
}

impl KycStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<KycStep> {
        match self {
            KycStep::Details => Some(KycStep::IdFront),
            KycStep::IdFront => Some(KycStep::IdBack),
            KycStep::IdBack => Some(KycStep::Selfie),
            KycStep::Selfie => None,
        }
    }
}

/// Document images attached to an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycDocuments {
    pub front: String,
    pub back: String,
    pub selfie: String,
}

/// A verification application as seen by the admin console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycApplication {
    pub id: String,
    pub user_id: i64,
    pub full_name: String,
    pub phone: String,
    pub country: String,
    pub email: String,
    pub date: DateTime<Utc>,
    pub status: VerificationStatus,
    pub documents: Option<KycDocuments>,
}

/// What the user has entered so far in the KYC form
#[derive(Debug, Clone, Default)]
pub struct KycDraft {
    pub full_name: String,
    pub email: String,
    pub front: Option<CapturedImage>,
    pub back: Option<CapturedImage>,
    pub selfie: Option<CapturedImage>,
}

impl KycDraft {
    /// Store an image for a document slot. QR captures are not documents.
    pub fn attach(&mut self, image: CapturedImage) {
        match image.target {
            CaptureTarget::IdFront => self.front = Some(image),
            CaptureTarget::IdBack => self.back = Some(image),
            CaptureTarget::Selfie => self.selfie = Some(image),
            CaptureTarget::QrScan => {}
        }
    }

    /// Check that `step` is complete enough to leave it
    pub fn validate_step(&self, step: KycStep) -> Result<()> {
        match step {
            KycStep::Details => {
                if self.full_name.trim().is_empty() {
                    return Err(Error::validation("Please enter your full legal name."));
                }
                if !is_valid_email(&self.email) {
                    return Err(Error::validation("Please enter a valid email address."));
                }
                Ok(())
            }
            KycStep::IdFront if self.front.is_none() => {
                Err(Error::validation("Please capture the front of your ID."))
            }
            KycStep::IdBack if self.back.is_none() => {
                Err(Error::validation("Please capture the back of your ID."))
            }
            KycStep::Selfie if self.selfie.is_none() => {
                Err(Error::validation("Please take a selfie to finish verification."))
            }
            _ => Ok(()),
        }
    }

    /// All three images as data URLs, once every slot is filled
    pub fn documents(&self) -> Option<KycDocuments> {
        Some(KycDocuments {
            front: self.front.as_ref()?.to_data_url(),
            back: self.back.as_ref()?.to_data_url(),
            selfie: self.selfie.as_ref()?.to_data_url(),
        })
    }
}

/// Loose email shape check used by the forms
pub fn is_valid_email(email: &str) -> bool {
    match Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$") {
        Ok(re) => re.is_match(email.trim()),
        Err(_) => false,
    }
}
