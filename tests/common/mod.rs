#![allow(dead_code)]

use axum::extract::ConnectInfo;
use shortlinks::config::{Config, DEFAULT_GEOIP_API_URL};
use shortlinks::domain::entities::{Link, NewLink, Owner};
use shortlinks::domain::repositories::LinkRepository;
use shortlinks::infrastructure::geo::GeoResolver;
use shortlinks::infrastructure::persistence::PgLinkRepository;
use shortlinks::state::{AppState, Repositories};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const SIGNING_SECRET: &str = "test-signing-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/shortlinks_test".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: "https://sho.rt".to_string(),
        log_level: "debug".to_string(),
        log_format: "text".to_string(),
        behind_proxy: false,
        short_code_length: 5,
        geoip_enabled: false,
        geoip_api_url: DEFAULT_GEOIP_API_URL.to_string(),
        geoip_timeout_ms: 2000,
        geoip_cache_capacity: 100,
        geoip_cache_ttl_seconds: 60,
        qr_enabled: true,
        shorten_rate_period_seconds: 1,
        shorten_rate_burst: 0,
        token_signing_secret: SIGNING_SECRET.to_string(),
        db_max_connections: 5,
        db_connect_timeout: 5,
        db_idle_timeout: 60,
        db_max_lifetime: 300,
    }
}

/// State backed by the test database, with geo lookup disabled.
pub fn create_test_state(pool: PgPool) -> AppState {
    let repositories = Repositories::postgres(Arc::new(pool));
    AppState::new(
        repositories,
        Arc::new(GeoResolver::disabled()),
        &test_config(),
    )
}

pub async fn create_test_link(pool: &PgPool, code: &str, url: &str) -> Link {
    PgLinkRepository::new(Arc::new(pool.clone()))
        .create(NewLink {
            code: code.to_string(),
            original_url: url.to_string(),
            created_by: Some("198.51.100.1".to_string()),
            owner: Owner::Anonymous,
        })
        .await
        .unwrap()
}

pub async fn link_counters(pool: &PgPool, id: i64) -> (i64, i64) {
    sqlx::query_as("SELECT clicks_count, unique_clicks_count FROM links WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Inserts a fixed peer address, as `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "198.51.100.20:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
