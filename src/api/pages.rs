//! HTML page shown by the redirect routes for missing or disabled links.

use askama::Template;
use askama_web::WebTemplate;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Renders `templates/not_found.html`.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub code: String,
}

fn not_found_page(status: StatusCode, code: &str) -> Response {
    (
        status,
        NotFoundPage {
            code: code.to_string(),
        },
    )
        .into_response()
}

/// 404 page for a code that does not exist.
pub fn link_not_found(code: &str) -> Response {
    not_found_page(StatusCode::NOT_FOUND, code)
}

/// The same page as [`link_not_found`], served as 410 for a deactivated link.
pub fn link_disabled(code: &str) -> Response {
    not_found_page(StatusCode::GONE, code)
}
