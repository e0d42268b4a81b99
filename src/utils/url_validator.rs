//! Validation of URLs submitted for shortening.

use std::net::IpAddr;

use serde_json::json;
use thiserror::Error;
use url::{Host, Url};

use crate::error::AppError;

pub const MAX_URL_LENGTH: usize = 2048;

const SPAM_KEYWORDS: &[&str] = &[
    "porn",
    "xxx",
    "adult",
    "sex",
    "casino",
    "gambling",
    "poker",
    "viagra",
    "cialis",
    "pharmacy",
    "bitcoin",
    "crypto",
    "lottery",
    "prize",
    "click-here",
    "free-money",
    "earn-money",
];

/// Why a URL was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlRejection {
    #[error("URL must not be empty")]
    Empty,
    #[error("URL must be at most {MAX_URL_LENGTH} characters")]
    TooLong,
    #[error("URL is malformed")]
    Malformed,
    #[error("Only http and https URLs are allowed")]
    UnsupportedScheme,
    #[error("URL must have a host")]
    MissingHost,
    #[error("URLs pointing to internal addresses are not allowed")]
    InternalHost,
    #[error("URL looks like spam")]
    Spam,
}

impl From<UrlRejection> for AppError {
    fn from(rejection: UrlRejection) -> Self {
        let message = match rejection {
            UrlRejection::Spam => "URL is not allowed",
            _ => "Invalid URL",
        };
        AppError::bad_request(message, json!({ "reason": rejection.to_string() }))
    }
}

/// Checks that `raw` is a public http(s) URL and returns it trimmed.
///
/// The URL is stored as submitted (after trimming) rather than re-serialized,
/// so deduplication compares what the user typed.
pub fn validate_url(raw: &str) -> Result<String, UrlRejection> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(UrlRejection::Empty);
    }
    if trimmed.chars().count() > MAX_URL_LENGTH {
        return Err(UrlRejection::TooLong);
    }

    let parsed = Url::parse(trimmed).map_err(|_| UrlRejection::Malformed)?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlRejection::UnsupportedScheme);
    }

    let host = parsed.host().ok_or(UrlRejection::MissingHost)?;
    if is_internal_host(&host) {
        return Err(UrlRejection::InternalHost);
    }

    if is_spam_url(trimmed) {
        return Err(UrlRejection::Spam);
    }

    Ok(trimmed.to_string())
}

fn is_internal_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(ip) => is_internal_ip(IpAddr::V4(*ip)),
        Host::Ipv6(ip) => is_internal_ip(IpAddr::V6(*ip)),
    }
}

fn is_internal_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_unspecified() || v4.is_link_local()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

/// Returns true when the URL contains a blocked keyword, ignoring case.
pub fn is_spam_url(url: &str) -> bool {
    let lowered = url.to_lowercase();
    SPAM_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}
