//! HTTP networking module
//!
//! Provides the HTTP client connectors use to reach the search backend.

mod client;

pub use client::HttpClient;
