//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Governor layer keyed by `K`.
pub type RateLimitLayer<K> = GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Token bucket settings for `POST /shorten`.
///
/// One token is replenished every `period_seconds`; up to `burst` requests
/// can be made back to back. A `burst` of 0 disables limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortenRateLimit {
    pub period_seconds: u64,
    pub burst: u32,
}

/// Rate limiter keyed by the socket peer address.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// Returns `None` when limiting is disabled.
///
/// # Example
///
/// ```rust,ignore
/// let mut shorten = Router::new().route("/shorten", post(shorten_handler));
/// if let Some(limiter) = rate_limit::layer(settings) {
///     shorten = shorten.layer(limiter);
/// }
/// ```
pub fn layer(settings: ShortenRateLimit) -> Option<RateLimitLayer<PeerIpKeyExtractor>> {
    build(settings, PeerIpKeyExtractor)
}

/// Rate limiter keyed by `X-Forwarded-For` / `X-Real-IP`, falling back to
/// the peer address.
///
/// Use only behind a trusted reverse proxy; clients can forge these headers.
pub fn proxy_layer(settings: ShortenRateLimit) -> Option<RateLimitLayer<SmartIpKeyExtractor>> {
    build(settings, SmartIpKeyExtractor)
}

fn build<K>(settings: ShortenRateLimit, extractor: K) -> Option<RateLimitLayer<K>>
where
    K: KeyExtractor,
{
    if settings.burst == 0 {
        return None;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(settings.period_seconds)
        .burst_size(settings.burst)
        .key_extractor(extractor)
        .finish()?;

    Some(GovernorLayer::new(Arc::new(governor_conf)))
}
