//! Reference executor — drives one request through its lifecycle.
//!
//! The [`Dispatcher`] knows nothing about concrete request kinds; it only
//! talks to [`ServerRequest`]. Queueing, ordering and retries belong to the
//! caller. A request must be driven to completion before the next one builds
//! its payload from the same session.

use std::future::Future;

use crate::error::{codes, HttpError};
use crate::request::{Failure, Payload, ServerRequest, ServerResponse};
use crate::session::{is_set, SessionStore};

/// What the host device allows.
pub trait DeviceCapabilities: Send + Sync {
    fn has_internet_permission(&self) -> bool;
}

/// Fixed device capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCapabilities {
    pub internet_permission: bool,
}

impl Default for StaticCapabilities {
    fn default() -> Self {
        Self {
            internet_permission: true,
        }
    }
}

impl DeviceCapabilities for StaticCapabilities {
    fn has_internet_permission(&self) -> bool {
        self.internet_permission
    }
}

/// Sends a request over the wire.
///
/// Any HTTP status is a response; only failures to get one are errors.
pub trait Transport: Send + Sync {
    fn post(
        &self,
        url: &str,
        body: &Payload,
    ) -> impl Future<Output = Result<ServerResponse, HttpError>> + Send;

    fn get(&self, url: &str) -> impl Future<Output = Result<ServerResponse, HttpError>> + Send;
}

/// How a dispatch attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Transport succeeded and the request handled the response.
    Succeeded,
    /// The request ran its failure path.
    Failed,
    /// The payload could not be built; the request was failed without sending.
    Rejected,
    /// The pre-dispatch gate stopped the request. It may be retried later.
    Aborted,
}

pub struct Dispatcher<'a, T> {
    transport: &'a T,
    base_url: &'a str,
    device: &'a dyn DeviceCapabilities,
}

impl<'a, T: Transport> Dispatcher<'a, T> {
    pub fn new(transport: &'a T, base_url: &'a str, device: &'a dyn DeviceCapabilities) -> Self {
        Self {
            transport,
            base_url,
            device,
        }
    }

    /// Run `request` to its terminal state against `session`.
    pub async fn execute<R>(
        &self,
        request: &mut R,
        session: &mut dyn SessionStore,
    ) -> DispatchOutcome
    where
        R: ServerRequest + Send,
    {
        let prepared = request
            .payload()
            .cloned()
            .and_then(|payload| Ok((request.request_url(self.base_url)?, payload)));
        let (url, payload) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!(path = request.path(), "rejecting request: {}", e);
                request.handle_failure(Failure::Rejected(e), session);
                return DispatchOutcome::Rejected;
            }
        };

        if request.precheck_errors(self.device, session) {
            tracing::debug!(path = request.path(), "request held back by pre-dispatch check");
            return DispatchOutcome::Aborted;
        }

        if !is_set(&session.session_id()) {
            tracing::debug!(path = request.path(), "no session yet, failing request");
            request.handle_failure(Failure::NotInitialized, session);
            return DispatchOutcome::Failed;
        }

        tracing::debug!(url = %url, "dispatching request");
        let result = if request.is_get_request() {
            self.transport.get(&url).await
        } else {
            self.transport.post(&url, &payload).await
        };

        match result {
            Ok(response) if response.is_success() => {
                request.on_success(&response, session);
                DispatchOutcome::Succeeded
            }
            Ok(response) if response.status() == 409 => {
                request.on_duplicate_resource(session);
                DispatchOutcome::Failed
            }
            Ok(response) => {
                tracing::debug!(url = %url, status = response.status(), "request failed");
                request.handle_failure(Failure::Status(i32::from(response.status())), session);
                DispatchOutcome::Failed
            }
            Err(e) => {
                tracing::warn!(url = %url, "transport error: {}", e);
                request.handle_failure(Failure::Status(codes::NO_CONNECTIVITY), session);
                DispatchOutcome::Failed
            }
        }
    }
}
