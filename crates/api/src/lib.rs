//! HTTP edge for the authorization pipeline: token extraction, per-route
//! policy enforcement, and failure-code → status mapping.

pub mod app;
pub mod middleware;
