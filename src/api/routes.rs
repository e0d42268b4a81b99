//! API route configuration.

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::api::handlers::{admin, tenant};
use crate::state::AppState;

/// Admin routes. The caller nests them under `/admin` behind
/// [`crate::api::middleware::auth`].
///
/// # Endpoints
///
/// - `GET    /links`                 - List links (filters, offset paging)
/// - `POST   /links`                 - Create an admin-owned link
/// - `GET    /links/{id}`            - Link details
/// - `PUT    /links/{id}`            - Update URL and/or active flag
/// - `DELETE /links/{id}`            - Delete a link and its clicks
/// - `PATCH  /links/{id}/toggle`     - Flip the active flag
/// - `GET    /links/{id}/clicks`     - Raw click history
/// - `GET    /links/{id}/analytics`  - Aggregated analytics
/// - `GET    /stats/overview`        - Totals and top links
/// - `GET    /tenants`               - Tenants with link counts
/// - `GET    /blacklist`             - Blocked addresses
/// - `POST   /blacklist/{ip}`        - Block an address
/// - `DELETE /blacklist/{ip}`        - Unblock an address
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/links",
            get(admin::list_links_handler).post(admin::create_link_handler),
        )
        .route(
            "/links/{id}",
            get(admin::get_link_handler)
                .put(admin::update_link_handler)
                .delete(admin::delete_link_handler),
        )
        .route("/links/{id}/toggle", patch(admin::toggle_link_handler))
        .route("/links/{id}/clicks", get(admin::link_clicks_handler))
        .route("/links/{id}/analytics", get(admin::link_analytics_handler))
        .route("/stats/overview", get(admin::overview_handler))
        .route("/tenants", get(admin::list_tenants_handler))
        .route("/blacklist", get(admin::list_blacklist_handler))
        .route(
            "/blacklist/{ip}",
            post(admin::block_ip_handler).delete(admin::unblock_ip_handler),
        )
}

/// Tenant cabinet routes, nested under `/tenant/api`.
///
/// # Endpoints
///
/// - `GET    /links`                 - The caller's links (page paging)
/// - `POST   /links`                 - Create a link for the caller
/// - `DELETE /links/{id}`            - Delete one of the caller's links
/// - `GET    /links/{id}/analytics`  - Analytics of one of the caller's links
pub fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/links",
            get(tenant::list_links_handler).post(tenant::create_link_handler),
        )
        .route("/links/{id}", delete(tenant::delete_link_handler))
        .route("/links/{id}/analytics", get(tenant::link_analytics_handler))
}
