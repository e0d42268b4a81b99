//! HTTP middleware for request processing and protection.
//!
//! Provides admin authentication, rate limiting for the public shorten
//! endpoint, and request tracing.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
