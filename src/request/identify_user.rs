//! Identify the current user to the server.

use serde_json::{Map, Value};

use super::{session_fields, Failure, Payload, RequestCore, ServerRequest, ServerResponse};
use crate::callback::InitCallback;
use crate::defines::{self, RequestPath};
use crate::error::RequestError;
use crate::session::SessionStore;

const UNREACHABLE_MESSAGE: &str = "Trouble reaching server. Please try again in a few minutes";

/// `POST v1/profile`.
///
/// On success the returned identity id and user link are written into the
/// session (plus install params when `referring_data` is present) whether or
/// not a callback is still attached. The callback then receives the
/// session's first referring params, not the raw response.
pub struct IdentifyUserRequest {
    core: RequestCore,
    callback: Option<InitCallback>,
}

impl IdentifyUserRequest {
    pub fn new(session: &dyn SessionStore, user_id: &str, callback: Option<InitCallback>) -> Self {
        let mut post = session_fields(session);
        post.insert(defines::IDENTITY.into(), user_id.into());
        Self {
            core: RequestCore::new(RequestPath::IdentifyUser, Ok(post)),
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

impl ServerRequest for IdentifyUserRequest {
    fn path(&self) -> &str {
        self.core.path()
    }

    fn payload(&self) -> Result<&Payload, RequestError> {
        self.core.payload()
    }

    fn on_success(&mut self, response: &ServerResponse, session: &mut dyn SessionStore) {
        let fields = response
            .get_string(defines::IDENTITY_ID)
            .and_then(|id| Ok((id, response.get_string(defines::LINK)?)));
        let (identity_id, link) = match fields {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!("identify response missing identity fields: {}", e);
                self.finish(None, Some(e));
                return;
            }
        };

        session.set_identity_id(identity_id);
        session.set_user_url(link);
        match response.object().and_then(|o| o.get(defines::REFERRING_DATA)) {
            Some(Value::String(params)) => session.set_install_params(params),
            Some(other) => session.set_install_params(&other.to_string()),
            None => {}
        }

        let params = session.first_referring_params();
        self.finish(Some(params), None);
    }

    /// Always attaches a human-readable `error_message` payload.
    fn handle_failure(&mut self, failure: Failure, _session: &dyn SessionStore) {
        let error = match failure {
            Failure::NotInitialized => RequestError::NotInitialized,
            Failure::Status(_) => RequestError::SetIdentityFailed,
            Failure::Rejected(e) => e,
        };
        let mut body = Map::new();
        body.insert(defines::ERROR_MESSAGE.into(), UNREACHABLE_MESSAGE.into());
        self.finish(Some(Value::Object(body)), Some(error));
    }

    fn clear_callbacks(&mut self) {
        self.callback = None;
    }
}

impl std::fmt::Debug for IdentifyUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifyUserRequest")
            .field("core", &self.core)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
