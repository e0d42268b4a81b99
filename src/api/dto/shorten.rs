//! DTOs for the public shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::Shortened;

/// Request body for `POST /shorten` and `POST /admin/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Optional custom short code; see `validate_alias` for the full rules.
    #[validate(length(min = 3, max = 20, message = "Alias must be 3-20 characters"))]
    pub custom_alias: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_url: String,
    pub short_code: String,
    pub original_url: String,
    /// True when an existing link for the same URL was returned.
    pub existing: bool,
}

impl ShortenResponse {
    pub fn new(result: Shortened, short_url: String) -> Self {
        Self {
            short_url,
            short_code: result.link.code,
            original_url: result.link.original_url,
            existing: result.existing,
        }
    }
}
