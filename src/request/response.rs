//! Response envelope and failure signal handed back to requests.

use serde_json::{Map, Value};

use crate::error::RequestError;

/// A server response: HTTP status plus the JSON body (`null` when the body
/// was empty or not JSON).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerResponse {
    status: u16,
    body: Value,
}

impl ServerResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn object(&self) -> Option<&Map<String, Value>> {
        self.body.as_object()
    }

    pub fn has(&self, key: &str) -> bool {
        self.object().is_some_and(|o| o.contains_key(key))
    }

    /// Read a string field, failing when it is missing or not a string.
    pub fn get_string(&self, key: &str) -> Result<&str, RequestError> {
        self.object()
            .and_then(|o| o.get(key))
            .and_then(Value::as_str)
            .ok_or_else(|| RequestError::Parse(format!("missing string field `{key}`")))
    }
}

/// Why a request did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The SDK had not completed initialization when dispatch was attempted.
    NotInitialized,
    /// The server or transport reported this status code.
    Status(i32),
    /// The request was refused before sending, e.g. its payload failed to build.
    Rejected(RequestError),
}
