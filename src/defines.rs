//! Wire keys and endpoint paths shared by every request kind.
//!
//! These names are part of the compatibility surface with the server and
//! with previously persisted request queues. Do not rename them.

// ─── Session keys ────────────────────────────────────────────────────────────

pub const IDENTITY_ID: &str = "identity_id";
pub const DEVICE_FINGERPRINT_ID: &str = "device_fingerprint_id";
pub const SESSION_ID: &str = "session_id";
pub const LINK_CLICK_ID: &str = "link_click_id";

// ─── Request / response keys ─────────────────────────────────────────────────

pub const REFERRAL_CODE: &str = "referral_code";
pub const IDENTITY: &str = "identity";
pub const URL: &str = "url";
pub const LINK: &str = "link";
pub const REFERRING_DATA: &str = "referring_data";
pub const ERROR_MESSAGE: &str = "error_message";
pub const API_KEY: &str = "branch_key";

// ─── RequestPath ─────────────────────────────────────────────────────────────

/// Server endpoint for each request kind, relative to the API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPath {
    ApplyReferralCode,
    GetUrl,
    IdentifyUser,
}

impl RequestPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplyReferralCode => "v1/applycode/",
            Self::GetUrl => "v1/url",
            Self::IdentifyUser => "v1/profile",
        }
    }

    /// Resolve a stored path back to its request kind.
    pub fn from_path(path: &str) -> Option<Self> {
        [Self::ApplyReferralCode, Self::GetUrl, Self::IdentifyUser]
            .into_iter()
            .find(|p| p.as_str() == path)
    }
}

impl std::fmt::Display for RequestPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
