//! Client location lookup.
//!
//! [`GeoResolver`] is what the rest of the service talks to: it skips
//! private addresses, bounds every lookup with a timeout, caches results,
//! and never fails. The actual provider sits behind [`GeoLookup`];
//! [`IpApiClient`] speaks the ip-api.com JSON format.

pub mod ip_api;
pub mod resolver;

use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::geo::GeoData;

pub use ip_api::IpApiClient;
pub use resolver::GeoResolver;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geo lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geo lookup returned HTTP {0}")]
    Status(u16),
    #[error("geo lookup failed: {0}")]
    Failed(String),
}

/// A raw location provider. Errors are reported, not swallowed; the
/// resolver decides what a failure means.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, ip: IpAddr) -> Result<GeoData, GeoError>;

    /// Provider name for logs.
    fn name(&self) -> &'static str;
}
