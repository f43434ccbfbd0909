//! Unified SDK error types.

use thiserror::Error;

/// Numeric error codes reported through [`RequestError::code`].
///
/// `-101` to `-105` keep the numbering existing callback consumers already
/// switch on.
pub mod codes {
    pub const NO_SESSION: i32 = -101;
    pub const NO_INTERNET_PERMISSION: i32 = -102;
    pub const INVALID_REFERRAL_CODE: i32 = -103;
    pub const NOT_INITIALIZED: i32 = -104;
    pub const DUPLICATE_URL: i32 = -105;
    pub const APPLY_REFERRAL_CODE_FAILED: i32 = -111;
    pub const SET_IDENTITY_FAILED: i32 = -112;
    pub const NO_CONNECTIVITY: i32 = -113;
    pub const INVALID_REQUEST: i32 = -116;
    pub const MALFORMED_RESPONSE: i32 = -117;
}

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<ConstructionError> for SdkError {
    fn from(err: ConstructionError) -> Self {
        SdkError::Request(RequestError::Construction(err))
    }
}

/// Transport-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout")]
    Timeout,
}

/// Why a request payload could not be assembled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("link params must be a JSON object: {0}")]
    InvalidParams(String),

    #[error("unknown request path `{0}`")]
    UnknownPath(String),

    #[error("persisted request is malformed: {0}")]
    MalformedPersisted(String),
}

/// Coarse classification of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Payload assembly failed; the request was never sent.
    Construction,
    /// A pre-dispatch gate stopped the request.
    Precondition,
    /// Transport succeeded but the body lacked a required marker.
    Semantic,
    /// The SDK had not finished initializing.
    NotInitialized,
    /// Generic failure of one request kind.
    VariantFailure,
    /// The server rejected a resource as a duplicate.
    DuplicateResource,
    /// A success body could not be read.
    Parse,
}

/// The typed error handed to request callbacks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request could not be built: {0}")]
    Construction(#[from] ConstructionError),

    #[error("Trouble creating a URL. Please add the internet permission.")]
    NoInternetPermission,

    #[error("Invalid referral code")]
    InvalidReferralCode,

    #[error("Trouble initializing the SDK. Was a session started before this call?")]
    NotInitialized,

    #[error("Trouble applying the referral code.")]
    ApplyReferralCodeFailed,

    #[error("Trouble setting the user identity.")]
    SetIdentityFailed,

    #[error("Trouble creating a URL. (status {status})")]
    CreateUrlFailed { status: i32 },

    #[error("Trouble creating a URL. The alias is already taken.")]
    DuplicateUrl,

    #[error("Malformed response: {0}")]
    Parse(String),
}

impl RequestError {
    /// Numeric code surfaced to callback consumers.
    pub fn code(&self) -> i32 {
        match self {
            Self::Construction(_) => codes::INVALID_REQUEST,
            Self::NoInternetPermission => codes::NO_INTERNET_PERMISSION,
            Self::InvalidReferralCode => codes::INVALID_REFERRAL_CODE,
            Self::NotInitialized => codes::NOT_INITIALIZED,
            Self::ApplyReferralCodeFailed => codes::APPLY_REFERRAL_CODE_FAILED,
            Self::SetIdentityFailed => codes::SET_IDENTITY_FAILED,
            Self::CreateUrlFailed { status } => *status,
            Self::DuplicateUrl => codes::DUPLICATE_URL,
            Self::Parse(_) => codes::MALFORMED_RESPONSE,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Construction(_) => ErrorKind::Construction,
            Self::NoInternetPermission => ErrorKind::Precondition,
            Self::InvalidReferralCode => ErrorKind::Semantic,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::ApplyReferralCodeFailed
            | Self::SetIdentityFailed
            | Self::CreateUrlFailed { .. } => ErrorKind::VariantFailure,
            Self::DuplicateUrl => ErrorKind::DuplicateResource,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }
}
