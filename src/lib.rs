//! # Referral SDK
//!
//! Request lifecycle core for a referral / deep-link attribution service.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Session state, request kinds and their lifecycle contract,
//!    the reference dispatcher (always available)
//! 2. **HTTP** — `HttpTransport` over `reqwest`
//! 3. **High-Level Client** — `ReferralClient` with a builder
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use referral_sdk::prelude::*;
//!
//! let client = ReferralClient::builder()
//!     .api_key("key_live_xxx")
//!     .session(MemorySession::new().with_session_id("sess"))
//!     .build()?;
//!
//! client
//!     .create_short_url(&LinkData::new().channel("sms"), |url, err| { /* ... */ }, true)
//!     .await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Wire keys and endpoint paths.
pub mod defines;

/// Session identifiers and the store capability.
pub mod session;

/// Outcome listener traits.
pub mod callback;

/// Request kinds and the shared lifecycle contract.
pub mod request;

/// Transport trait and reference dispatcher.
pub mod dispatch;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: HTTP ────────────────────────────────────────────────────────────

/// HTTP transport.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 3: High-Level Client ───────────────────────────────────────────────

/// `ReferralClient` — the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    pub use crate::callback::{LinkCreateListener, ReferralInitListener};
    pub use crate::defines::RequestPath;
    pub use crate::dispatch::{
        DeviceCapabilities, DispatchOutcome, Dispatcher, StaticCapabilities, Transport,
    };
    pub use crate::error::{ErrorKind, HttpError, RequestError, SdkError};
    pub use crate::network::DEFAULT_API_URL;
    pub use crate::request::{
        ApplyReferralCodeRequest, CreateUrlRequest, Failure, IdentifyUserRequest, LinkData,
        Payload, Request, ServerRequest, ServerResponse,
    };
    pub use crate::session::{MemorySession, SessionStore, NO_STRING_VALUE};

    #[cfg(feature = "http")]
    pub use crate::client::{ReferralClient, ReferralClientBuilder};
    #[cfg(feature = "http")]
    pub use crate::http::HttpTransport;
}
