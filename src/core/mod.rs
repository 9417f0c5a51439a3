//! Core backend access layer.

pub mod cache;
pub mod client;
pub mod dedup;
pub mod http;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod policy;
pub mod request;
pub mod retry;
pub mod throttle;

pub use client::{ApiClient, ClientConfig, Download};
pub use pagination::Page;
pub use policy::{EndpointPolicies, OnUnavailable};
pub use request::RequestOptions;
