//! Screen identifiers and the restricted-view set

use serde::{Deserialize, Serialize};

/// One screen of the mini-app
///
/// Serialized in SCREAMING_SNAKE_CASE so hosts can keep using the view
/// names they already route on (`"FUND_CARD"`, `"ADMIN_KYC"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    Splash,
    Login,
    Signup,
    Dashboard,
    CreateCard,
    FundCard,
    CardDetails,
    Transactions,
    Settings,
    Pay,
    FundSuccess,
    PaySuccess,
    KycForm,
    KycSubmitted,
    AdminLogin,
    AdminDashboard,
    AdminUsers,
    AdminUserDetail,
    AdminKyc,
    AdminCards,
    AdminFinancials,
    AdminLogs,
    AdminSettings,
}

/// Views that need an approved identity check to be entered directly
pub const RESTRICTED_VIEWS: [View; 5] = [
    View::CreateCard,
    View::FundCard,
    View::CardDetails,
    View::Transactions,
    View::Pay,
];

/// Top-level admin console tabs (switched without history)
pub const ADMIN_TABS: [View; 7] = [
    View::AdminDashboard,
    View::AdminUsers,
    View::AdminKyc,
    View::AdminCards,
    View::AdminFinancials,
    View::AdminLogs,
    View::AdminSettings,
];

impl View {
    /// Where `go_back` lands when there is no history
    pub const DEFAULT: View = View::Dashboard;

    pub fn is_restricted(self) -> bool {
        RESTRICTED_VIEWS.contains(&self)
    }

    pub fn is_admin_tab(self) -> bool {
        ADMIN_TABS.contains(&self)
    }

    /// Stable name used in activity log entries
    pub fn as_str(self) -> &'static str {
        match self {
            View::Splash => "SPLASH",
            View::Login => "LOGIN",
            View::Signup => "SIGNUP",
            View::Dashboard => "DASHBOARD",
            View::CreateCard => "CREATE_CARD",
            View::FundCard => "FUND_CARD",
            View::CardDetails => "CARD_DETAILS",
            View::Transactions => "TRANSACTIONS",
            View::Settings => "SETTINGS",
            View::Pay => "PAY",
            View::FundSuccess => "FUND_SUCCESS",
            View::PaySuccess => "PAY_SUCCESS",
            View::KycForm => "KYC_FORM",
            View::KycSubmitted => "KYC_SUBMITTED",
            View::AdminLogin => "ADMIN_LOGIN",
            View::AdminDashboard => "ADMIN_DASHBOARD",
            View::AdminUsers => "ADMIN_USERS",
            View::AdminUserDetail => "ADMIN_USER_DETAIL",
            View::AdminKyc => "ADMIN_KYC",
            View::AdminCards => "ADMIN_CARDS",
            View::AdminFinancials => "ADMIN_FINANCIALS",
            View::AdminLogs => "ADMIN_LOGS",
            View::AdminSettings => "ADMIN_SETTINGS",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
