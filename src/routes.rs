//! Top-level router combining public, admin and tenant routes.
//!
//! # Route Structure
//!
//! - `POST /shorten`      - Public shortening (rate limited per client IP)
//! - `GET  /health`       - Health check (public)
//! - `GET  /{code}`       - Short link redirect (public)
//! - `GET  /q/{code}`     - Redirect counted as a QR scan (public)
//! - `GET  /qr/{code}`    - QR code PNG (public)
//! - `/admin/*`           - Admin API (Bearer token required)
//! - `/tenant/api/*`      - Tenant cabinet API
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `/shorten`
//! - **Authentication** - Bearer token on `/admin`
//! - **Path normalization** - Trailing slash handling

use axum::routing::{get, post};
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api;
use crate::api::handlers::{
    health_handler, qr_image_handler, qr_redirect_handler, redirect_handler, shorten_handler,
};
use crate::api::middleware::rate_limit::{self, ShortenRateLimit};
use crate::api::middleware::{auth, tracing};
use crate::state::AppState;

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `rate` - token bucket for `POST /shorten`; keyed by proxy headers when
///   `state.behind_proxy` is set, by the peer address otherwise
pub fn app_router(state: AppState, rate: ShortenRateLimit) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, rate))
}

/// [`app_router`] without path normalization.
pub fn router(state: AppState, rate: ShortenRateLimit) -> Router {
    let shorten = Router::new().route("/shorten", post(shorten_handler));
    let shorten = if state.behind_proxy {
        match rate_limit::proxy_layer(rate) {
            Some(limiter) => shorten.layer(limiter),
            None => shorten,
        }
    } else {
        match rate_limit::layer(rate) {
            Some(limiter) => shorten.layer(limiter),
            None => shorten,
        }
    };

    let admin = api::routes::admin_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .merge(shorten)
        .route("/health", get(health_handler))
        .route("/q/{code}", get(qr_redirect_handler))
        .route("/qr/{code}", get(qr_image_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/admin", admin)
        .nest("/tenant/api", api::routes::tenant_routes())
        .with_state(state)
        .layer(tracing::layer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::Utc;
    use mockall::predicate::eq;
    use serde_json::{Value, json};

    use crate::config::{Config, test_config};
    use crate::domain::entities::link::sample_link;
    use crate::domain::entities::{Click, Link, OwnerKind, TenantUser};
    use crate::domain::geo::{GeoData, MockGeoLocator};
    use crate::domain::repositories::{
        MockBlacklistRepository, MockClickRepository, MockLinkRepository, MockTenantRepository,
        MockTokenRepository,
    };
    use crate::error::AppError;
    use crate::state::Repositories;

    #[derive(Default)]
    struct Mocks {
        links: MockLinkRepository,
        clicks: MockClickRepository,
        tenants: MockTenantRepository,
        blacklist: MockBlacklistRepository,
        tokens: MockTokenRepository,
    }

    const NO_LIMIT: ShortenRateLimit = ShortenRateLimit {
        period_seconds: 1,
        burst: 0,
    };

    fn server_with(mocks: Mocks, config: Config) -> TestServer {
        let mut geo = MockGeoLocator::new();
        geo.expect_locate().returning(|_| GeoData::unknown());

        let repos = Repositories {
            links: Arc::new(mocks.links),
            clicks: Arc::new(mocks.clicks),
            tenants: Arc::new(mocks.tenants),
            blacklist: Arc::new(mocks.blacklist),
            tokens: Arc::new(mocks.tokens),
        };
        let state = AppState::new(repos, Arc::new(geo), &config);

        let app = router(state, NO_LIMIT)
            .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 7], 40000))));

        TestServer::new(app).unwrap()
    }

    fn server(mocks: Mocks) -> TestServer {
        server_with(mocks, test_config())
    }

    fn created(link: crate::domain::entities::NewLink) -> Link {
        Link {
            id: 1,
            code: link.code,
            original_url: link.original_url,
            created_at: Utc::now(),
            created_by: link.created_by,
            clicks_count: 0,
            unique_clicks_count: 0,
            is_active: true,
            owner_id: link.owner.owner_id(),
            owner_kind: link.owner.kind(),
        }
    }

    fn recorded(click: crate::domain::entities::NewClick) -> Click {
        Click {
            id: 1,
            link_id: click.link_id,
            clicked_at: click.clicked_at,
            ip_address: click.ip_address,
            user_agent: click.user_agent,
            referer: click.referer,
            country_code: None,
            country_name: None,
            city: None,
            is_unique: click.is_unique,
            is_qr_click: click.is_qr_click,
            device_os: click.device_os,
        }
    }

    #[tokio::test]
    async fn test_shorten_with_alias() {
        let mut mocks = Mocks::default();
        mocks
            .blacklist
            .expect_is_blacklisted()
            .withf(|ip| ip == "203.0.113.7")
            .returning(|_| Ok(false));
        mocks
            .links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        mocks
            .links
            .expect_code_exists()
            .withf(|code| code == "my-link1")
            .returning(|_| Ok(false));
        mocks
            .links
            .expect_create()
            .withf(|l| l.created_by.as_deref() == Some("203.0.113.7"))
            .returning(|l| Ok(created(l)));

        let response = server(mocks)
            .post("/shorten")
            .json(&json!({ "url": "https://example.com/page", "custom_alias": "My-Link1" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["short_code"], "my-link1");
        assert_eq!(body["short_url"], "https://sho.rt/my-link1");
        assert_eq!(body["existing"], false);
    }

    #[tokio::test]
    async fn test_shorten_blacklisted_ip_is_forbidden() {
        let mut mocks = Mocks::default();
        mocks
            .blacklist
            .expect_is_blacklisted()
            .returning(|_| Ok(true));

        let response = server(mocks)
            .post("/shorten")
            .json(&json!({ "url": "https://example.com" }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "forbidden");
    }

    #[tokio::test]
    async fn test_shorten_rejects_invalid_url() {
        let mut mocks = Mocks::default();
        mocks
            .blacklist
            .expect_is_blacklisted()
            .returning(|_| Ok(false));

        let response = server(mocks)
            .post("/shorten")
            .json(&json!({ "url": "http://localhost/admin" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_shorten_taken_alias_is_bad_request() {
        let mut mocks = Mocks::default();
        mocks
            .blacklist
            .expect_is_blacklisted()
            .returning(|_| Ok(false));
        mocks
            .links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        mocks.links.expect_code_exists().returning(|_| Ok(true));

        let response = server(mocks)
            .post("/shorten")
            .json(&json!({ "url": "https://example.com", "custom_alias": "promo" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "Alias 'promo' is already taken");
    }

    #[tokio::test]
    async fn test_redirect_sets_location_and_disables_caching() {
        let mut mocks = Mocks::default();
        mocks
            .links
            .expect_find_by_code()
            .withf(|code| code == "abcde")
            .returning(|code| Ok(Some(sample_link(5, code, "https://example.com/target"))));
        mocks.clicks.expect_visitor_exists().returning(|_| Ok(false));
        mocks
            .clicks
            .expect_record()
            .withf(|click, visitor| {
                !click.is_qr_click
                    && click.ip_address == "203.0.113.7"
                    && click.device_os.as_deref() == Some("Windows 10/11")
                    && visitor.is_some()
            })
            .times(1)
            .returning(|click, _| Ok(recorded(click)));

        let response = server(mocks)
            .get("/ABCDE")
            .add_header("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
            .await;

        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location"), "https://example.com/target");
        assert_eq!(
            response.header("cache-control"),
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(response.header("pragma"), "no-cache");
        assert_eq!(response.header("expires"), "0");
    }

    #[tokio::test]
    async fn test_qr_redirect_flags_click() {
        let mut mocks = Mocks::default();
        mocks
            .links
            .expect_find_by_code()
            .returning(|code| Ok(Some(sample_link(5, code, "https://example.com"))));
        mocks.clicks.expect_visitor_exists().returning(|_| Ok(true));
        mocks
            .clicks
            .expect_record()
            .withf(|click, visitor| click.is_qr_click && !click.is_unique && visitor.is_none())
            .times(1)
            .returning(|click, _| Ok(recorded(click)));

        let response = server(mocks).get("/q/abcde").await;

        response.assert_status(StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_unknown_code_renders_not_found_page() {
        let mut mocks = Mocks::default();
        mocks.links.expect_find_by_code().returning(|_| Ok(None));
        mocks.clicks.expect_record().never();

        let response = server(mocks).get("/nothere").await;

        response.assert_status_not_found();
        let html = response.text();
        assert!(html.contains("Link not found"));
        assert!(html.contains("nothere"));
    }

    #[tokio::test]
    async fn test_inactive_link_renders_gone_page() {
        let mut mocks = Mocks::default();
        mocks.links.expect_find_by_code().returning(|code| {
            let mut link = sample_link(5, code, "https://example.com");
            link.is_active = false;
            Ok(Some(link))
        });
        mocks.clicks.expect_record().never();

        let response = server(mocks).get("/q/sleepy").await;

        response.assert_status(StatusCode::GONE);
        assert!(response.text().contains("Link not found"));
    }

    #[tokio::test]
    async fn test_click_failure_does_not_break_redirect() {
        let mut mocks = Mocks::default();
        mocks
            .links
            .expect_find_by_code()
            .returning(|code| Ok(Some(sample_link(5, code, "https://example.com"))));
        mocks.clicks.expect_visitor_exists().returning(|_| Ok(false));
        mocks
            .clicks
            .expect_record()
            .returning(|_, _| Err(AppError::internal("Database error", json!({}))));

        let response = server(mocks).get("/abcde").await;

        response.assert_status(StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_qr_image_is_png() {
        let mut mocks = Mocks::default();
        mocks
            .links
            .expect_find_by_code()
            .returning(|code| Ok(Some(sample_link(5, code, "https://example.com"))));
        mocks.clicks.expect_record().never();

        let response = server(mocks).get("/qr/abcde").add_query_param("size", "5000").await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "image/png");
        assert!(response.as_bytes().starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_qr_image_disabled() {
        let mut config = test_config();
        config.qr_enabled = false;

        let response = server_with(Mocks::default(), config).get("/qr/abcde").await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_reports_database() {
        let mut mocks = Mocks::default();
        mocks.links.expect_ping().returning(|| Ok(()));

        let response = server(mocks).get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"]["database"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_health_degraded_when_database_fails() {
        let mut mocks = Mocks::default();
        mocks
            .links
            .expect_ping()
            .returning(|| Err(AppError::internal("Database error", json!({}))));

        let response = server(mocks).get("/health").await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json();
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let mut mocks = Mocks::default();
        mocks.links.expect_list().never();

        let response = server(mocks).get("/admin/links").await;

        response.assert_status_unauthorized();
        assert_eq!(response.header("www-authenticate"), "Bearer");
    }

    #[tokio::test]
    async fn test_admin_rejects_unknown_token() {
        let mut mocks = Mocks::default();
        mocks.tokens.expect_validate_token().returning(|_| Ok(false));

        let response = server(mocks)
            .get("/admin/stats/overview")
            .authorization_bearer("nope")
            .await;

        response.assert_status_unauthorized();
    }

    fn authorized(mocks: &mut Mocks) {
        mocks.tokens.expect_validate_token().returning(|_| Ok(true));
        mocks.tokens.expect_update_last_used().returning(|_| Ok(()));
    }

    #[tokio::test]
    async fn test_admin_toggle_link() {
        let mut mocks = Mocks::default();
        authorized(&mut mocks);
        mocks
            .links
            .expect_find_by_id()
            .with(eq(5))
            .returning(|id| Ok(Some(sample_link(id, "abcde", "https://example.com"))));
        mocks
            .links
            .expect_update()
            .withf(|id, patch| *id == 5 && patch.is_active == Some(false))
            .returning(|id, _| {
                let mut link = sample_link(id, "abcde", "https://example.com");
                link.is_active = false;
                Ok(Some(link))
            });

        let response = server(mocks)
            .patch("/admin/links/5/toggle")
            .authorization_bearer("secret-token")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["is_active"], false);
        assert_eq!(body["message"], "Link deactivated");
    }

    #[tokio::test]
    async fn test_admin_analytics_rejects_bad_period() {
        let mut mocks = Mocks::default();
        authorized(&mut mocks);

        let response = server(mocks)
            .get("/admin/links/5/analytics")
            .add_query_param("period", "1y")
            .authorization_bearer("secret-token")
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "Invalid period");
    }

    #[tokio::test]
    async fn test_admin_create_link_is_admin_owned() {
        let mut mocks = Mocks::default();
        authorized(&mut mocks);
        mocks
            .links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        mocks.links.expect_code_exists().returning(|_| Ok(false));
        mocks
            .links
            .expect_create()
            .withf(|l| l.owner.kind() == OwnerKind::Admin)
            .returning(|l| Ok(created(l)));

        let response = server(mocks)
            .post("/admin/links")
            .authorization_bearer("secret-token")
            .json(&json!({ "url": "https://example.com/landing" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["owner_kind"], "admin");
        assert_eq!(body["created_by"], "admin");
    }

    fn tenant(id: i64) -> TenantUser {
        TenantUser {
            id,
            external_user_id: "42".to_string(),
            external_domain: "corp.example.com".to_string(),
            name: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_tenant_cannot_delete_foreign_link() {
        let mut mocks = Mocks::default();
        mocks
            .tenants
            .expect_find()
            .returning(|_, _| Ok(Some(tenant(3))));
        mocks
            .links
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_link(id, "abcde", "https://example.com"))));
        mocks.links.expect_delete().never();

        let response = server(mocks)
            .delete("/tenant/api/links/9")
            .add_query_param("user_id", "42")
            .add_query_param("domain", "corp.example.com")
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_tenant_list_paginates() {
        let mut mocks = Mocks::default();
        mocks
            .tenants
            .expect_get_or_create()
            .returning(|_, _, _| Ok(tenant(3)));
        mocks.links.expect_count().returning(|_| Ok(25));
        mocks
            .links
            .expect_list()
            .withf(|filter, offset, limit| {
                filter.owner_id == Some(3) && *offset == 10 && *limit == 10
            })
            .returning(|_, _, _| Ok(vec![]));

        let response = server(mocks)
            .get("/tenant/api/links")
            .add_query_param("user_id", "42")
            .add_query_param("domain", "corp.example.com")
            .add_query_param("page", "2")
            .add_query_param("per_page", "10")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total"], 25);
        assert_eq!(body["page"], 2);
        assert_eq!(body["per_page"], 10);
    }

    #[tokio::test]
    async fn test_tenant_requests_need_identity() {
        let response = server(Mocks::default()).get("/tenant/api/links").await;

        response.assert_status_bad_request();
    }
}
