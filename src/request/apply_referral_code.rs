//! Apply a referral code to the current user session.

use serde_json::{Map, Value};

use super::{session_fields, Failure, Payload, RequestCore, ServerRequest, ServerResponse};
use crate::callback::InitCallback;
use crate::defines::{self, RequestPath};
use crate::error::RequestError;
use crate::session::SessionStore;

/// `POST v1/applycode/<code>`.
///
/// A 2xx response without a `referral_code` field means the server did not
/// accept the code; the callback receives an `error_message` payload and
/// [`RequestError::InvalidReferralCode`].
pub struct ApplyReferralCodeRequest {
    core: RequestCore,
    callback: Option<InitCallback>,
}

impl ApplyReferralCodeRequest {
    pub fn new(session: &dyn SessionStore, code: &str, callback: Option<InitCallback>) -> Self {
        let mut post = session_fields(session);
        post.insert(defines::REFERRAL_CODE.into(), code.into());
        Self {
            core: RequestCore::new(RequestPath::ApplyReferralCode, Ok(post)),
            callback,
        }
    }

    /// Rebuild from a persisted path and payload.
    pub fn from_parts(path: &str, payload: Payload) -> Self {
        Self {
            core: RequestCore::from_parts(path, payload),
            callback: None,
        }
    }

    fn finish(&mut self, params: Option<Value>, error: Option<RequestError>) {
        if let Some(mut callback) = self.callback.take() {
            callback.on_init_finished(params, error);
        }
    }
}

impl ServerRequest for ApplyReferralCodeRequest {
    fn path(&self) -> &str {
        self.core.path()
    }

    fn payload(&self) -> Result<&Payload, RequestError> {
        self.core.payload()
    }

    /// Base URL, path, then the code itself. A payload without a code yields
    /// an empty suffix; a numeric code is written out as its digits.
    fn request_url(&self, base_url: &str) -> Result<String, RequestError> {
        let code = match self.payload()?.get(defines::REFERRAL_CODE) {
            Some(Value::String(code)) => code.clone(),
            Some(Value::Number(code)) => code.to_string(),
            _ => String::new(),
        };
        Ok(format!("{}{}{}", base_url, self.path(), code))
    }

    fn on_success(&mut self, response: &ServerResponse, _session: &mut dyn SessionStore) {
        if response.has(defines::REFERRAL_CODE) {
            let body = response.body().clone();
            self.finish(Some(body), None);
        } else {
            tracing::debug!("referral code rejected by server");
            let mut body = Map::new();
            body.insert(defines::ERROR_MESSAGE.into(), "Invalid referral code".into());
            self.finish(
                Some(Value::Object(body)),
                Some(RequestError::InvalidReferralCode),
            );
        }
    }

    fn handle_failure(&mut self, failure: Failure, _session: &dyn SessionStore) {
        let error = match failure {
            Failure::NotInitialized => RequestError::NotInitialized,
            Failure::Status(_) => RequestError::ApplyReferralCodeFailed,
            Failure::Rejected(e) => e,
        };
        self.finish(None, Some(error));
    }

    fn clear_callbacks(&mut self) {
        self.callback = None;
    }
}

impl std::fmt::Debug for ApplyReferralCodeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyReferralCodeRequest")
            .field("core", &self.core)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
