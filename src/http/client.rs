//! Low-level HTTP transport — `HttpTransport`.
//!
//! Sends request payloads as JSON and hands back status + body untouched.
//! Interpreting the status is the dispatcher's job.

use crate::defines;
use crate::dispatch::Transport;
use crate::error::HttpError;
use crate::request::{Payload, ServerResponse};

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// `reqwest`-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    /// Appended to every posted body. NEVER logged.
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, HttpError> {
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(timeout).pool_max_idle_per_host(10);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;

        Ok(Self {
            client: builder.build()?,
            api_key,
        })
    }

    async fn do_request(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&Payload>,
    ) -> Result<ServerResponse, HttpError> {
        let mut req = self.client.request(method, url);

        if let Some(b) = body {
            match &self.api_key {
                Some(key) => {
                    let mut keyed = b.clone();
                    keyed.insert(defines::API_KEY.into(), key.clone().into());
                    req = req.json(&keyed);
                }
                None => req = req.json(b),
            }
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::Reqwest(e)
            }
        })?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::debug!(status, "response body is not JSON: {}", e);
                Value::Null
            })
        };
        Ok(ServerResponse::new(status, body))
    }
}

impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: &Payload) -> Result<ServerResponse, HttpError> {
        self.do_request(reqwest::Method::POST, url, Some(body)).await
    }

    async fn get(&self, url: &str) -> Result<ServerResponse, HttpError> {
        self.do_request(reqwest::Method::GET, url, None).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
