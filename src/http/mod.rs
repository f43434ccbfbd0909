//! HTTP transport layer — `HttpTransport` over `reqwest`.

pub mod client;

pub use client::HttpTransport;
