//! Server requests — the per-request lifecycle contract and its variants.
//!
//! Every request kind implements [`ServerRequest`]. An executor only ever
//! works through that trait (usually via the closed [`Request`] enum):
//!
//! 1. check [`ServerRequest::construction_failed`] and reject if set
//! 2. consult [`ServerRequest::precheck_errors`]
//! 3. send [`ServerRequest::payload`] to [`ServerRequest::request_url`]
//! 4. report back through [`ServerRequest::on_success`] or
//!    [`ServerRequest::handle_failure`]
//!
//! Each request invokes its callback at most once. After
//! [`ServerRequest::clear_callbacks`] it invokes it zero times, but still
//! performs its session side effects.

pub mod apply_referral_code;
pub mod create_url;
pub mod identify_user;
pub mod link;
pub mod response;

pub use apply_referral_code::ApplyReferralCodeRequest;
pub use create_url::CreateUrlRequest;
pub use identify_user::IdentifyUserRequest;
pub use link::LinkData;
pub use response::{Failure, ServerResponse};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defines::{self, RequestPath};
use crate::dispatch::DeviceCapabilities;
use crate::error::{ConstructionError, RequestError, SdkError};
use crate::session::{is_set, SessionStore};

/// Ordered request body.
pub type Payload = Map<String, Value>;

// ─── ServerRequest ───────────────────────────────────────────────────────────

/// Contract every request kind satisfies so an executor can treat them
/// uniformly.
pub trait ServerRequest {
    /// Endpoint path relative to the API base URL.
    fn path(&self) -> &str;

    /// The body to send, or the reason it could not be built.
    fn payload(&self) -> Result<&Payload, RequestError>;

    fn construction_failed(&self) -> bool {
        self.payload().is_err()
    }

    /// Full URL to dispatch to.
    fn request_url(&self, base_url: &str) -> Result<String, RequestError> {
        self.payload()?;
        Ok(format!("{}{}", base_url, self.path()))
    }

    fn is_get_request(&self) -> bool {
        false
    }

    /// Whether the request carries errors independent of transport.
    fn has_errors(&self) -> bool {
        false
    }

    /// Pre-dispatch gate. `true` means "do not send".
    fn precheck_errors(
        &mut self,
        _device: &dyn DeviceCapabilities,
        _session: &dyn SessionStore,
    ) -> bool {
        false
    }

    fn on_success(&mut self, response: &ServerResponse, session: &mut dyn SessionStore);

    fn handle_failure(&mut self, failure: Failure, session: &dyn SessionStore);

    /// The server rejected the request as a duplicate (HTTP 409).
    fn on_duplicate_resource(&mut self, session: &dyn SessionStore) {
        self.handle_failure(Failure::Status(409), session);
    }

    /// Detach the callback. Idempotent.
    fn clear_callbacks(&mut self);
}

// ─── RequestCore ─────────────────────────────────────────────────────────────

/// State shared by every request kind: where it goes and what it carries.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RequestCore {
    path: String,
    payload: Result<Payload, ConstructionError>,
}

impl RequestCore {
    pub(crate) fn new(path: RequestPath, payload: Result<Payload, ConstructionError>) -> Self {
        if let Err(e) = &payload {
            tracing::error!(path = path.as_str(), "failed to build request payload: {}", e);
        }
        Self {
            path: path.as_str().to_string(),
            payload,
        }
    }

    /// Rebuild from a path and payload assembled earlier; no validation.
    pub(crate) fn from_parts(path: impl Into<String>, payload: Payload) -> Self {
        Self {
            path: path.into(),
            payload: Ok(payload),
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn payload(&self) -> Result<&Payload, RequestError> {
        self.payload
            .as_ref()
            .map_err(|e| RequestError::Construction(e.clone()))
    }
}

/// Session identifiers every request body starts with.
///
/// `link_click_id` is omitted, not nulled, when unset.
pub(crate) fn session_fields(session: &dyn SessionStore) -> Payload {
    let mut post = Payload::new();
    post.insert(defines::IDENTITY_ID.into(), session.identity_id().into());
    post.insert(
        defines::DEVICE_FINGERPRINT_ID.into(),
        session.device_fingerprint_id().into(),
    );
    post.insert(defines::SESSION_ID.into(), session.session_id().into());
    let link_click_id = session.link_click_id();
    if is_set(&link_click_id) {
        post.insert(defines::LINK_CLICK_ID.into(), link_click_id.into());
    }
    post
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Every request kind the SDK can queue.
#[derive(Debug)]
pub enum Request {
    ApplyReferralCode(ApplyReferralCodeRequest),
    CreateUrl(CreateUrlRequest),
    IdentifyUser(IdentifyUserRequest),
}

macro_rules! each_variant {
    ($self:expr, $req:ident => $body:expr) => {
        match $self {
            Request::ApplyReferralCode($req) => $body,
            Request::CreateUrl($req) => $body,
            Request::IdentifyUser($req) => $body,
        }
    };
}

impl ServerRequest for Request {
    fn path(&self) -> &str {
        each_variant!(self, r => r.path())
    }

    fn payload(&self) -> Result<&Payload, RequestError> {
        each_variant!(self, r => r.payload())
    }

    fn construction_failed(&self) -> bool {
        each_variant!(self, r => r.construction_failed())
    }

    fn request_url(&self, base_url: &str) -> Result<String, RequestError> {
        each_variant!(self, r => r.request_url(base_url))
    }

    fn is_get_request(&self) -> bool {
        each_variant!(self, r => r.is_get_request())
    }

    fn has_errors(&self) -> bool {
        each_variant!(self, r => r.has_errors())
    }

    fn precheck_errors(
        &mut self,
        device: &dyn DeviceCapabilities,
        session: &dyn SessionStore,
    ) -> bool {
        each_variant!(self, r => r.precheck_errors(device, session))
    }

    fn on_success(&mut self, response: &ServerResponse, session: &mut dyn SessionStore) {
        each_variant!(self, r => r.on_success(response, session))
    }

    fn handle_failure(&mut self, failure: Failure, session: &dyn SessionStore) {
        each_variant!(self, r => r.handle_failure(failure, session))
    }

    fn on_duplicate_resource(&mut self, session: &dyn SessionStore) {
        each_variant!(self, r => r.on_duplicate_resource(session))
    }

    fn clear_callbacks(&mut self) {
        each_variant!(self, r => r.clear_callbacks())
    }
}

impl From<ApplyReferralCodeRequest> for Request {
    fn from(r: ApplyReferralCodeRequest) -> Self {
        Request::ApplyReferralCode(r)
    }
}

impl From<CreateUrlRequest> for Request {
    fn from(r: CreateUrlRequest) -> Self {
        Request::CreateUrl(r)
    }
}

impl From<IdentifyUserRequest> for Request {
    fn from(r: IdentifyUserRequest) -> Self {
        Request::IdentifyUser(r)
    }
}

// ─── Persistence ─────────────────────────────────────────────────────────────

impl Request {
    /// Rebuild a request from a stored path and payload. No callback is
    /// attached.
    pub fn from_parts(path: &str, payload: Payload) -> Result<Self, ConstructionError> {
        let kind = RequestPath::from_path(path)
            .ok_or_else(|| ConstructionError::UnknownPath(path.to_string()))?;
        Ok(match kind {
            RequestPath::ApplyReferralCode => {
                ApplyReferralCodeRequest::from_parts(path, payload).into()
            }
            RequestPath::GetUrl => CreateUrlRequest::from_parts(path, payload).into(),
            RequestPath::IdentifyUser => IdentifyUserRequest::from_parts(path, payload).into(),
        })
    }

    /// Serialize for a persisted queue.
    pub fn to_json(&self) -> Result<Value, SdkError> {
        let envelope = PersistedRequest {
            post: PersistedBody::Object(self.payload()?.clone()),
            path: self.path().to_string(),
        };
        Ok(serde_json::to_value(envelope)?)
    }

    /// Inverse of [`Request::to_json`]. Also accepts a body stored as JSON
    /// text.
    pub fn from_json(value: &Value) -> Result<Self, ConstructionError> {
        let malformed =
            |e: serde_json::Error| ConstructionError::MalformedPersisted(e.to_string());

        let envelope = PersistedRequest::deserialize(value).map_err(malformed)?;
        let payload = match envelope.post {
            PersistedBody::Object(post) => post,
            PersistedBody::Encoded(raw) => serde_json::from_str(&raw).map_err(malformed)?,
        };
        Self::from_parts(&envelope.path, payload)
    }
}

/// Stored form of a queued request.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedRequest {
    #[serde(rename = "REQ_POST")]
    post: PersistedBody,
    #[serde(rename = "REQ_POST_PATH")]
    path: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum PersistedBody {
    Object(Payload),
    Encoded(String),
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use serde_json::Value;

    use crate::callback::{InitCallback, LinkCallback};
    use crate::error::RequestError;

    pub(crate) type InitCalls = Arc<Mutex<Vec<(Option<Value>, Option<RequestError>)>>>;
    pub(crate) type LinkCalls = Arc<Mutex<Vec<(Option<String>, Option<RequestError>)>>>;

    /// A listener that records every invocation.
    pub(crate) fn init_recorder() -> (InitCallback, InitCalls) {
        let calls = InitCalls::default();
        let sink = calls.clone();
        let callback = move |params: Option<Value>, error: Option<RequestError>| {
            sink.lock().unwrap().push((params, error));
        };
        (Box::new(callback), calls)
    }

    pub(crate) fn link_recorder() -> (LinkCallback, LinkCalls) {
        let calls = LinkCalls::default();
        let sink = calls.clone();
        let callback = move |url: Option<String>, error: Option<RequestError>| {
            sink.lock().unwrap().push((url, error));
        };
        (Box::new(callback), calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySession;
    use serde_json::json;

    fn session() -> MemorySession {
        MemorySession::new()
            .with_identity_id("id-1")
            .with_device_fingerprint_id("fp-1")
            .with_session_id("sess-1")
    }

    #[test]
    fn test_session_fields_omit_unset_link_click_id() {
        let post = session_fields(&session());
        let keys: Vec<&str> = post.keys().map(String::as_str).collect();
        assert_eq!(keys, ["identity_id", "device_fingerprint_id", "session_id"]);
    }

    #[test]
    fn test_session_fields_include_set_link_click_id() {
        let post = session_fields(&session().with_link_click_id("click-9"));
        assert_eq!(post["link_click_id"], json!("click-9"));
    }

    #[test]
    fn test_persisted_round_trip_selects_variant_by_path() {
        let original: Request =
            IdentifyUserRequest::new(&session(), "user@example.com", None).into();
        let stored = original.to_json().unwrap();
        assert_eq!(stored["REQ_POST_PATH"], json!("v1/profile"));

        let restored = Request::from_json(&stored).unwrap();
        assert!(matches!(restored, Request::IdentifyUser(_)));
        assert_eq!(restored.payload().unwrap(), original.payload().unwrap());
    }

    #[test]
    fn test_from_json_accepts_stringified_body() {
        let stored = json!({
            "REQ_POST": r#"{"identity_id":"id-1","referral_code":"ABC"}"#,
            "REQ_POST_PATH": "v1/applycode/",
        });
        let restored = Request::from_json(&stored).unwrap();
        assert_eq!(
            restored.request_url("https://api.test/").unwrap(),
            "https://api.test/v1/applycode/ABC"
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_path() {
        let stored = json!({"REQ_POST": {}, "REQ_POST_PATH": "v1/nope"});
        let err = Request::from_json(&stored).unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownPath(_)));
    }

    #[test]
    fn test_from_json_malformed_envelopes_are_construction_failures() {
        let cases = [
            json!("not an object"),
            json!({"REQ_POST": {}}),
            json!({"REQ_POST_PATH": "v1/url"}),
            json!({"REQ_POST": 7, "REQ_POST_PATH": "v1/url"}),
            json!({"REQ_POST": "{not json", "REQ_POST_PATH": "v1/url"}),
        ];
        for stored in cases {
            let err = Request::from_json(&stored).unwrap_err();
            assert!(
                matches!(err, ConstructionError::MalformedPersisted(_)),
                "{stored}: {err:?}"
            );
        }
    }

    #[test]
    fn test_to_json_refuses_failed_construction() {
        let link = LinkData::new().params("nope");
        let request: Request = CreateUrlRequest::new(&session(), &link, None, true).into();
        assert!(request.construction_failed());
        assert!(matches!(
            request.to_json(),
            Err(SdkError::Request(RequestError::Construction(_)))
        ));
    }

    #[test]
    fn test_every_variant_is_a_post_without_intrinsic_errors() {
        let s = session();
        let requests: Vec<Request> = vec![
            ApplyReferralCodeRequest::new(&s, "CODE", None).into(),
            CreateUrlRequest::new(&s, &LinkData::new(), None, true).into(),
            IdentifyUserRequest::new(&s, "u", None).into(),
        ];
        for r in &requests {
            assert!(!r.is_get_request());
            assert!(!r.has_errors());
            assert!(!r.construction_failed());
        }
    }
}
