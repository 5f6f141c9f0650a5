//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod capture;
mod card;
mod finance;
pub mod kyc;
pub mod result;
mod transaction;
mod user;
mod view;

pub use capture::{CaptureTarget, CapturedImage, FacingMode};
pub use card::{Card, CardRequest, CardStatus, RequestStatus};
pub use finance::{FinanceKind, FinanceRequest, SettingsPatch, SystemSettings};
pub use kyc::{KycApplication, KycDocuments, KycDraft, KycStep, ReviewDecision, VerificationStatus};
pub use transaction::{parse_amount, Transaction, TransactionKind, TransactionStatus};
pub use user::{AccountStatus, UserProfile};
pub use view::{View, ADMIN_TABS, RESTRICTED_VIEWS};
