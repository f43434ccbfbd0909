//! Create a short URL, synchronously or asynchronously.

use super::{
    session_fields, Failure, LinkData, Payload, RequestCore, ServerRequest, ServerResponse,
};
use crate::callback::LinkCallback;
use crate::defines::{self, RequestPath};
use crate::dispatch::DeviceCapabilities;
use crate::error::{codes, RequestError};
use crate::session::{is_set, SessionStore};

/// `POST v1/url`.
///
/// The only request kind with a pre-dispatch gate: see
/// [`ServerRequest::precheck_errors`].
pub struct CreateUrlRequest {
    core: RequestCore,
    link: Option<LinkData>,
    is_async: bool,
    callback: Option<LinkCallback>,
}

impl CreateUrlRequest {
    pub fn new(
        session: &dyn SessionStore,
        link: &LinkData,
        callback: Option<LinkCallback>,
        is_async: bool,
    ) -> Self {
        let mut post = session_fields(session);
        let payload = link.write_into(&mut post).map(|()| post);
        Self {
            core: RequestCore::new(RequestPath::GetUrl, payload),
            link: Some(link.clone()),
            is_async,
            callback,
        }
    }

    /// Rebuild from a persisted path and payload. Restored requests are
    /// asynchronous.
    pub fn from_parts(path: &str, payload: Payload) -> Self {
        Self {
            core: RequestCore::from_parts(path, payload),
            link: None,
            is_async: true,
            callback: None,
        }
    }

    /// Link attributes this request was built from; `None` when restored.
    pub fn link_data(&self) -> Option<&LinkData> {
        self.link.as_ref()
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// The server reported the requested alias as taken.
    pub fn handle_duplicate_url_error(&mut self) {
        self.finish(None, Some(RequestError::DuplicateUrl));
    }

    fn finish(&mut self, url: Option<String>, error: Option<RequestError>) {
        if let Some(mut callback) = self.callback.take() {
            callback.on_link_create(url, error);
        }
    }
}

impl ServerRequest for CreateUrlRequest {
    fn path(&self) -> &str {
        self.core.path()
    }

    fn payload(&self) -> Result<&Payload, RequestError> {
        self.core.payload()
    }

    /// No internet permission fails the callback and blocks dispatch. A
    /// synchronous call made before any identity exists blocks dispatch
    /// silently; the executor should defer it rather than fail it.
    fn precheck_errors(
        &mut self,
        device: &dyn DeviceCapabilities,
        session: &dyn SessionStore,
    ) -> bool {
        if !device.has_internet_permission() {
            self.finish(None, Some(RequestError::NoInternetPermission));
            return true;
        }
        !self.is_async && !session.has_user()
    }

    fn on_success(&mut self, response: &ServerResponse, _session: &mut dyn SessionStore) {
        match response.get_string(defines::URL) {
            Ok(url) => {
                let url = url.to_string();
                self.finish(Some(url), None);
            }
            Err(e) => {
                tracing::warn!("create-url response without a url: {}", e);
                self.finish(None, Some(e));
            }
        }
    }

    /// Falls back to the stored user URL unless the failure means there is
    /// no session at all.
    fn handle_failure(&mut self, failure: Failure, session: &dyn SessionStore) {
        let status = match failure {
            Failure::NotInitialized => codes::NO_SESSION,
            Failure::Status(status) => status,
            Failure::Rejected(e) => {
                self.finish(None, Some(e));
                return;
            }
        };
        let error = RequestError::CreateUrlFailed { status };
        if status == codes::NO_SESSION {
            self.finish(None, Some(error));
        } else {
            let user_url = session.user_url();
            let fallback = is_set(&user_url).then_some(user_url);
            self.finish(fallback, Some(error));
        }
    }

    fn on_duplicate_resource(&mut self, _session: &dyn SessionStore) {
        self.handle_duplicate_url_error();
    }

    fn clear_callbacks(&mut self) {
        self.callback = None;
    }
}

impl std::fmt::Debug for CreateUrlRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUrlRequest")
            .field("core", &self.core)
            .field("link", &self.link)
            .field("is_async", &self.is_async)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::StaticCapabilities;
    use crate::error::ErrorKind;
    use crate::request::testing::link_recorder;
    use crate::session::{MemorySession, NO_STRING_VALUE};
    use serde_json::json;

    fn session() -> MemorySession {
        MemorySession::new()
            .with_identity_id("id-1")
            .with_device_fingerprint_id("fp-1")
            .with_session_id("sess-1")
    }

    fn online() -> StaticCapabilities {
        StaticCapabilities::default()
    }

    fn offline() -> StaticCapabilities {
        StaticCapabilities {
            internet_permission: false,
        }
    }

    #[test]
    fn test_payload_has_session_then_link_fields() {
        let link = LinkData::new().channel("email").tags(["promo"]);
        let req = CreateUrlRequest::new(&session(), &link, None, true);
        let payload = req.payload().unwrap();
        let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["identity_id", "device_fingerprint_id", "session_id", "tags", "channel"]
        );
        assert_eq!(req.request_url("https://api.test/").unwrap(), "https://api.test/v1/url");
    }

    #[test]
    fn test_payload_carries_set_link_click_id() {
        let s = session().with_link_click_id("click-5");
        let req = CreateUrlRequest::new(&s, &LinkData::new().alias("a"), None, true);
        let payload = req.payload().unwrap();
        assert_eq!(payload["link_click_id"], json!("click-5"));
        let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        assert_eq!(keys[3..], ["link_click_id", "alias"]);
    }

    #[test]
    fn test_bad_params_fail_construction() {
        let link = LinkData::new().params("not json");
        let req = CreateUrlRequest::new(&session(), &link, None, true);
        assert!(req.construction_failed());
        let err = req.request_url("https://api.test/").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn test_precheck_without_internet_short_circuits() {
        for is_async in [true, false] {
            let (cb, calls) = link_recorder();
            let mut req = CreateUrlRequest::new(&session(), &LinkData::new(), Some(cb), is_async);
            assert!(req.precheck_errors(&offline(), &session()));
            assert_eq!(
                calls.lock().unwrap().as_slice(),
                &[(None, Some(RequestError::NoInternetPermission))]
            );
        }
    }

    #[test]
    fn test_precheck_sync_without_user_defers_silently() {
        let anonymous = session().with_identity_id(NO_STRING_VALUE);
        let (cb, calls) = link_recorder();
        let mut req = CreateUrlRequest::new(&anonymous, &LinkData::new(), Some(cb), false);
        assert!(req.precheck_errors(&online(), &anonymous));
        assert!(calls.lock().unwrap().is_empty());

        let mut async_req = CreateUrlRequest::new(&anonymous, &LinkData::new(), None, true);
        assert!(!async_req.precheck_errors(&online(), &anonymous));
    }

    #[test]
    fn test_precheck_passes_with_user() {
        let mut req = CreateUrlRequest::new(&session(), &LinkData::new(), None, false);
        assert!(!req.precheck_errors(&online(), &session()));
    }

    #[test]
    fn test_success_reports_url() {
        let (cb, calls) = link_recorder();
        let mut s = session();
        let mut req = CreateUrlRequest::new(&s, &LinkData::new(), Some(cb), true);
        req.on_success(&ServerResponse::new(200, json!({"url": "https://l.ink/abc"})), &mut s);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            &[(Some("https://l.ink/abc".to_string()), None)]
        );
    }

    #[test]
    fn test_success_without_url_surfaces_parse_error() {
        let (cb, calls) = link_recorder();
        let mut s = session();
        let mut req = CreateUrlRequest::new(&s, &LinkData::new(), Some(cb), true);
        req.on_success(&ServerResponse::new(200, json!({"nope": true})), &mut s);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, None);
        assert_eq!(calls[0].1.as_ref().map(RequestError::kind), Some(ErrorKind::Parse));
    }

    #[test]
    fn test_no_session_failure_has_no_fallback_url() {
        let s = session().with_user_url("https://l.ink/me");
        let (cb, calls) = link_recorder();
        let mut req = CreateUrlRequest::new(&s, &LinkData::new(), Some(cb), true);
        req.handle_failure(Failure::Status(codes::NO_SESSION), &s);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            &[(None, Some(RequestError::CreateUrlFailed { status: codes::NO_SESSION }))]
        );
    }

    #[test]
    fn test_other_failure_falls_back_to_user_url() {
        let s = session().with_user_url("https://l.ink/me");
        let (cb, calls) = link_recorder();
        let mut req = CreateUrlRequest::new(&s, &LinkData::new(), Some(cb), true);
        req.handle_failure(Failure::Status(500), &s);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            &[(
                Some("https://l.ink/me".to_string()),
                Some(RequestError::CreateUrlFailed { status: 500 })
            )]
        );

        let (cb, calls) = link_recorder();
        let mut req = CreateUrlRequest::new(&session(), &LinkData::new(), Some(cb), true);
        req.handle_failure(Failure::Status(503), &session());
        assert_eq!(calls.lock().unwrap()[0].0, None);
    }

    #[test]
    fn test_not_initialized_behaves_like_no_session() {
        let s = session().with_user_url("https://l.ink/me");
        let (cb, calls) = link_recorder();
        let mut req = CreateUrlRequest::new(&s, &LinkData::new(), Some(cb), true);
        req.handle_failure(Failure::NotInitialized, &s);
        assert_eq!(calls.lock().unwrap()[0].0, None);
    }

    #[test]
    fn test_duplicate_url() {
        let (cb, calls) = link_recorder();
        let s = session();
        let mut req = CreateUrlRequest::new(&s, &LinkData::new().alias("taken"), Some(cb), true);
        req.on_duplicate_resource(&s);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            &[(None, Some(RequestError::DuplicateUrl))]
        );
    }

    #[test]
    fn test_cleared_request_never_calls_back() {
        let (cb, calls) = link_recorder();
        let mut s = session();
        let mut req = CreateUrlRequest::new(&s, &LinkData::new(), Some(cb), true);
        req.clear_callbacks();
        req.clear_callbacks();
        assert!(req.precheck_errors(&offline(), &s));
        req.on_success(&ServerResponse::new(200, json!({"url": "u"})), &mut s);
        req.handle_failure(Failure::Status(500), &s);
        req.handle_duplicate_url_error();
        assert!(calls.lock().unwrap().is_empty());
    }
}
