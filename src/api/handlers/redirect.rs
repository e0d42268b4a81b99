//! Handlers for short link redirects and QR images.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::api::extractors::ClientIp;
use crate::api::pages::{link_disabled, link_not_found};
use crate::application::services::{ClickContext, RedirectOutcome};
use crate::error::AppError;
use crate::infrastructure::qr;
use crate::state::AppState;

/// `?size=N` for QR images.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct QrQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub size: Option<u32>,
}

/// Redirects to the original URL of a short link.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// The code is matched case-insensitively. Every redirect records a click.
///
/// # Responses
///
/// - **302 Found**: `Location` set, caching disabled so each visit hits us
/// - **404 Not Found**: HTML page, unknown code
/// - **410 Gone**: HTML page, link deactivated
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    follow(&state, &code, ip, &headers, false).await
}

/// Same as [`redirect_handler`], with the click flagged as a QR scan.
///
/// # Endpoint
///
/// `GET /q/{code}`
pub async fn qr_redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    follow(&state, &code, ip, &headers, true).await
}

/// Renders a PNG QR code pointing at `/q/{code}`.
///
/// # Endpoint
///
/// `GET /qr/{code}?size=300`
///
/// `size` is clamped to 100..=1000 pixels. No click is recorded.
///
/// # Errors
///
/// - `404` / `410` pages as for redirects
/// - `503` when QR rendering is disabled
pub async fn qr_image_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<QrQuery>,
) -> Result<Response, AppError> {
    if !state.qr_enabled {
        return Err(AppError::unavailable(
            "QR code generation is disabled",
            json!({}),
        ));
    }

    let link = match state.redirect_service.resolve(&code).await? {
        RedirectOutcome::NotFound => return Ok(link_not_found(&code)),
        RedirectOutcome::Inactive => return Ok(link_disabled(&code)),
        RedirectOutcome::Found(link) => link,
    };

    let target = state.link_service.qr_target_url(&link.code);
    let size = qr::clamp_size(query.size);

    let png = tokio::task::spawn_blocking(move || qr::render_png(&target, size))
        .await
        .map_err(|e| AppError::internal("QR rendering task failed", json!({ "reason": e.to_string() })))?
        .map_err(|e| AppError::internal("Failed to render QR code", json!({ "reason": e.to_string() })))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn follow(
    state: &AppState,
    code: &str,
    ip_address: String,
    headers: &HeaderMap,
    is_qr: bool,
) -> Result<Response, AppError> {
    let ctx = ClickContext {
        ip_address,
        user_agent: header_str(headers, header::USER_AGENT),
        referer: header_str(headers, header::REFERER),
    };

    let response = match state.redirect_service.follow(code, &ctx, is_qr).await? {
        RedirectOutcome::NotFound => link_not_found(code),
        RedirectOutcome::Inactive => link_disabled(code),
        RedirectOutcome::Found(link) => found(&link.original_url),
    };

    Ok(response)
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// 302 with caching disabled.
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
    )
        .into_response()
}
