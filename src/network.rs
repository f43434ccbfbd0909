//! Network URL constants for the referral SDK.

/// Default REST API base URL. Request paths are appended verbatim.
pub const DEFAULT_API_URL: &str = "https://api.branch.io/";

/// Default per-request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
