//! High-level client — `ReferralClient` and its builder.
//!
//! Each call builds a request from the current session, dispatches it, and
//! lets the request fire the caller's callback. Calls hold the session lock
//! from payload construction until the request's terminal handler returns,
//! so a request never captures a session that an in-flight identify call is
//! about to rewrite.

use crate::callback::{LinkCreateListener, ReferralInitListener};
use crate::dispatch::{
    DeviceCapabilities, DispatchOutcome, Dispatcher, StaticCapabilities, Transport,
};
use crate::error::SdkError;
use crate::http::HttpTransport;
use crate::request::{
    ApplyReferralCodeRequest, CreateUrlRequest, IdentifyUserRequest, LinkData, Request,
    ServerRequest,
};
use crate::session::{MemorySession, SessionStore};

use async_lock::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub type SharedSession = Arc<RwLock<Box<dyn SessionStore>>>;

/// The primary entry point for the referral SDK.
pub struct ReferralClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
    device: Box<dyn DeviceCapabilities>,
    session: SharedSession,
}

impl ReferralClient {
    pub fn builder() -> ReferralClientBuilder {
        ReferralClientBuilder::default()
    }
}

impl<T: Transport> ReferralClient<T> {
    /// Handle to the session store this client reads and writes.
    ///
    /// The client holds the write lock while a request runs, callbacks
    /// included. A callback must not block on reading the session through
    /// this handle; use `try_read` or read it after the call returns.
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Apply `code` to the current user.
    pub async fn apply_referral_code(
        &self,
        code: &str,
        callback: impl ReferralInitListener + 'static,
    ) -> DispatchOutcome {
        let mut session = self.session.write().await;
        let mut request: Request =
            ApplyReferralCodeRequest::new(&**session, code, Some(Box::new(callback))).into();
        self.dispatcher().execute(&mut request, &mut **session).await
    }

    /// Create a short URL for `link`.
    ///
    /// A synchronous request made before any user identity exists comes back
    /// [`DispatchOutcome::Aborted`] with the callback untouched.
    pub async fn create_short_url(
        &self,
        link: &LinkData,
        callback: impl LinkCreateListener + 'static,
        is_async: bool,
    ) -> DispatchOutcome {
        let mut session = self.session.write().await;
        let mut request: Request =
            CreateUrlRequest::new(&**session, link, Some(Box::new(callback)), is_async).into();
        self.dispatcher().execute(&mut request, &mut **session).await
    }

    /// Identify the current user as `user_id`.
    pub async fn identify_user(
        &self,
        user_id: &str,
        callback: impl ReferralInitListener + 'static,
    ) -> DispatchOutcome {
        let mut session = self.session.write().await;
        let mut request: Request =
            IdentifyUserRequest::new(&**session, user_id, Some(Box::new(callback))).into();
        self.dispatcher().execute(&mut request, &mut **session).await
    }

    /// Dispatch an already-built request.
    pub async fn execute(&self, request: &mut Request) -> DispatchOutcome {
        let mut session = self.session.write().await;
        self.dispatcher().execute(request, &mut **session).await
    }

    /// Restore a request persisted with [`Request::to_json`] and dispatch it.
    pub async fn resume(&self, persisted: &Value) -> Result<DispatchOutcome, SdkError> {
        let mut request = Request::from_json(persisted)?;
        tracing::debug!(path = request.path(), "resuming persisted request");
        Ok(self.execute(&mut request).await)
    }

    fn dispatcher(&self) -> Dispatcher<'_, T> {
        Dispatcher::new(&self.transport, &self.base_url, self.device.as_ref())
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct ReferralClientBuilder {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    session: Option<Box<dyn SessionStore>>,
    device: Box<dyn DeviceCapabilities>,
}

impl Default for ReferralClientBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(crate::network::DEFAULT_TIMEOUT_SECS),
            session: None,
            device: Box::new(StaticCapabilities::default()),
        }
    }
}

impl ReferralClientBuilder {
    /// API base URL. A trailing `/` is added if missing.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Session store to read from and write back to. Defaults to an empty
    /// [`MemorySession`].
    pub fn session(mut self, session: impl SessionStore + 'static) -> Self {
        self.session = Some(Box::new(session));
        self
    }

    pub fn device(mut self, device: impl DeviceCapabilities + 'static) -> Self {
        self.device = Box::new(device);
        self
    }

    pub fn build(self) -> Result<ReferralClient, SdkError> {
        let transport = HttpTransport::new(self.api_key.clone(), self.timeout)?;
        Ok(self.build_with_transport(transport))
    }

    /// Build around a caller-supplied transport; `api_key` and `timeout` are
    /// ignored.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> ReferralClient<T> {
        let mut base_url = self.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let session = self
            .session
            .unwrap_or_else(|| Box::new(MemorySession::new()) as Box<dyn SessionStore>);
        ReferralClient {
            transport,
            base_url,
            device: self.device,
            session: Arc::new(RwLock::new(session)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_normalizes_base_url() {
        let client = ReferralClient::builder()
            .base_url("https://api.example.com")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/");
    }

    #[test]
    fn test_builder_defaults_to_empty_session() {
        let client = ReferralClient::builder().build().unwrap();
        let session = client.session();
        let session = tokio_test::block_on(session.read());
        assert!(!session.has_user());
    }
}
