//! Handler for the public shortening endpoint.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::extractors::ClientIp;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a URL for an anonymous caller.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/page", "custom_alias": "my-link" }
/// ```
///
/// If an active anonymous link already points at the URL, that link is
/// returned with `"existing": true` and the alias is ignored.
///
/// # Errors
///
/// - `400` invalid URL or alias, or alias already taken
/// - `403` caller IP is blacklisted
/// - `500` no free short code could be generated
pub async fn shorten_handler(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let result = state
        .link_service
        .shorten_public(payload.url, payload.custom_alias, &client_ip)
        .await?;

    let short_url = state.link_service.short_url(&result.link.code);
    Ok(Json(ShortenResponse::new(result, short_url)))
}
