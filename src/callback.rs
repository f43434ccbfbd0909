//! Outcome callbacks handed to requests by the application.
//!
//! Both listener traits are implemented for closures, so
//! `|params, error| { ... }` works anywhere a listener is expected.

use serde_json::Value;

use crate::error::RequestError;

/// Receives the outcome of apply-referral-code and identify-user requests.
pub trait ReferralInitListener: Send {
    fn on_init_finished(&mut self, params: Option<Value>, error: Option<RequestError>);
}

impl<F> ReferralInitListener for F
where
    F: FnMut(Option<Value>, Option<RequestError>) + Send,
{
    fn on_init_finished(&mut self, params: Option<Value>, error: Option<RequestError>) {
        self(params, error)
    }
}

/// Receives the outcome of create-url requests.
pub trait LinkCreateListener: Send {
    fn on_link_create(&mut self, url: Option<String>, error: Option<RequestError>);
}

impl<F> LinkCreateListener for F
where
    F: FnMut(Option<String>, Option<RequestError>) + Send,
{
    fn on_link_create(&mut self, url: Option<String>, error: Option<RequestError>) {
        self(url, error)
    }
}

pub type InitCallback = Box<dyn ReferralInitListener>;
pub type LinkCallback = Box<dyn LinkCreateListener>;
