//! User profile domain model

use serde::{Deserialize, Serialize};

use super::kyc::VerificationStatus;

/// Whether an admin has suspended the account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
}

/// A mini-app user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub linked_card_id: Option<String>,
    pub kyc_status: VerificationStatus,
    pub status: AccountStatus,
    pub phone: Option<String>,
    pub country: Option<String>,
}

impl UserProfile {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
            email: None,
            linked_card_id: None,
            kyc_status: VerificationStatus::None,
            status: AccountStatus::Active,
            phone: None,
            country: None,
        }
    }

    /// "First Last", falling back to the username for the second part
    pub fn display_name(&self) -> String {
        let second = self
            .last_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("");
        format!("{} {}", self.first_name, second).trim().to_string()
    }

    /// Case-insensitive match on name, email or id
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.display_name().to_lowercase().contains(&term)
            || self
                .email
                .as_deref()
                .map(|e| e.to_lowercase().contains(&term))
                .unwrap_or(false)
            || self.id.to_string().contains(&term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let mut user = UserProfile::new(1, "Haile");
        assert_eq!(user.display_name(), "Haile");
        user.username = Some("haile_g".to_string());
        assert_eq!(user.display_name(), "Haile haile_g");
        user.last_name = Some("Gebrselassie".to_string());
        assert_eq!(user.display_name(), "Haile Gebrselassie");
    }

    #[test]
    fn test_search() {
        let mut user = UserProfile::new(9903, "Haile");
        user.email = Some("haile@example.com".to_string());
        assert!(user.matches_search("HAILE"));
        assert!(user.matches_search("example.com"));
        assert!(user.matches_search("990"));
        assert!(!user.matches_search("abebe"));
        assert!(user.matches_search("  "));
    }
}
