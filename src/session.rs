//! Session state — identifiers read into payloads and written back by
//! identify-user responses.
//!
//! Every field uses [`NO_STRING_VALUE`] rather than `Option` to mean
//! "not yet established", so values can be compared and persisted as plain
//! strings.

use serde_json::{Map, Value};

/// Sentinel for a session field that has not been set.
pub const NO_STRING_VALUE: &str = "bnc_no_value";

/// Whether a session value holds something other than the UNSET sentinel.
pub fn is_set(value: &str) -> bool {
    value != NO_STRING_VALUE
}

/// Read/write capability over the stored session identifiers.
///
/// Injected into request handlers so tests can substitute a fake.
pub trait SessionStore: Send + Sync {
    fn identity_id(&self) -> String;
    fn device_fingerprint_id(&self) -> String;
    fn session_id(&self) -> String;
    fn link_click_id(&self) -> String;
    fn user_url(&self) -> String;
    fn install_params(&self) -> String;

    fn set_identity_id(&mut self, identity_id: &str);
    fn set_user_url(&mut self, user_url: &str);
    fn set_install_params(&mut self, params: &str);

    /// Whether a user identity has been established.
    fn has_user(&self) -> bool {
        is_set(&self.identity_id())
    }

    /// The referring params captured when the app was first installed.
    ///
    /// Returns an empty object when nothing is stored or the stored string is
    /// not a JSON object.
    fn first_referring_params(&self) -> Value {
        let stored = self.install_params();
        if !is_set(&stored) {
            return Value::Object(Map::new());
        }
        match serde_json::from_str::<Value>(&stored) {
            Ok(value @ Value::Object(_)) => value,
            _ => {
                tracing::debug!("stored install params are not a JSON object");
                Value::Object(Map::new())
            }
        }
    }
}

/// In-memory [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySession {
    identity_id: String,
    device_fingerprint_id: String,
    session_id: String,
    link_click_id: String,
    user_url: String,
    install_params: String,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self {
            identity_id: NO_STRING_VALUE.to_string(),
            device_fingerprint_id: NO_STRING_VALUE.to_string(),
            session_id: NO_STRING_VALUE.to_string(),
            link_click_id: NO_STRING_VALUE.to_string(),
            user_url: NO_STRING_VALUE.to_string(),
            install_params: NO_STRING_VALUE.to_string(),
        }
    }
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity_id(mut self, id: &str) -> Self {
        self.identity_id = id.to_string();
        self
    }

    pub fn with_device_fingerprint_id(mut self, id: &str) -> Self {
        self.device_fingerprint_id = id.to_string();
        self
    }

    pub fn with_session_id(mut self, id: &str) -> Self {
        self.session_id = id.to_string();
        self
    }

    pub fn with_link_click_id(mut self, id: &str) -> Self {
        self.link_click_id = id.to_string();
        self
    }

    pub fn with_user_url(mut self, url: &str) -> Self {
        self.user_url = url.to_string();
        self
    }

    pub fn with_install_params(mut self, params: &str) -> Self {
        self.install_params = params.to_string();
        self
    }
}

impl SessionStore for MemorySession {
    fn identity_id(&self) -> String {
        self.identity_id.clone()
    }

    fn device_fingerprint_id(&self) -> String {
        self.device_fingerprint_id.clone()
    }

    fn session_id(&self) -> String {
        self.session_id.clone()
    }

    fn link_click_id(&self) -> String {
        self.link_click_id.clone()
    }

    fn user_url(&self) -> String {
        self.user_url.clone()
    }

    fn install_params(&self) -> String {
        self.install_params.clone()
    }

    fn set_identity_id(&mut self, identity_id: &str) {
        self.identity_id = identity_id.to_string();
    }

    fn set_user_url(&mut self, user_url: &str) {
        self.user_url = user_url.to_string();
    }

    fn set_install_params(&mut self, params: &str) {
        self.install_params = params.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_session_is_fully_unset() {
        let session = MemorySession::new();
        assert!(!session.has_user());
        assert!(!is_set(&session.session_id()));
        assert!(!is_set(&session.link_click_id()));
        assert!(!is_set(&session.user_url()));
    }

    #[test]
    fn test_first_referring_params_parses_stored_object() {
        let session = MemorySession::new().with_install_params(r#"{"+clicked":true,"ref":"abc"}"#);
        assert_eq!(
            session.first_referring_params(),
            json!({"+clicked": true, "ref": "abc"})
        );
    }

    #[test]
    fn test_first_referring_params_defaults_to_empty_object() {
        assert_eq!(MemorySession::new().first_referring_params(), json!({}));

        let garbage = MemorySession::new().with_install_params("not json");
        assert_eq!(garbage.first_referring_params(), json!({}));

        let array = MemorySession::new().with_install_params("[1,2]");
        assert_eq!(array.first_referring_params(), json!({}));
    }
}
