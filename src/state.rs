//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{
    AnalyticsService, AuthService, BlacklistService, ClickRecorder, LinkService, RedirectService,
    TenantService,
};
use crate::config::Config;
use crate::domain::geo::GeoLocator;
use crate::domain::repositories::{
    BlacklistRepository, ClickRepository, LinkRepository, TenantRepository, TokenRepository,
};
use crate::infrastructure::persistence::{
    PgBlacklistRepository, PgClickRepository, PgLinkRepository, PgTenantRepository,
    PgTokenRepository,
};

/// Repository implementations the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub clicks: Arc<dyn ClickRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub blacklist: Arc<dyn BlacklistRepository>,
    pub tokens: Arc<dyn TokenRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            links: Arc::new(PgLinkRepository::new(pool.clone())),
            clicks: Arc::new(PgClickRepository::new(pool.clone())),
            tenants: Arc::new(PgTenantRepository::new(pool.clone())),
            blacklist: Arc::new(PgBlacklistRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool)),
        }
    }
}

/// Application state shared across handlers. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub redirect_service: Arc<RedirectService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub tenant_service: Arc<TenantService>,
    pub blacklist_service: Arc<BlacklistService>,
    pub auth_service: Arc<AuthService>,
    /// Read the client IP from `X-Forwarded-For` / `X-Real-IP`.
    pub behind_proxy: bool,
    pub qr_enabled: bool,
}

impl AppState {
    /// Wires the services together from repositories and a geo locator.
    pub fn new(repos: Repositories, geo: Arc<dyn GeoLocator>, config: &Config) -> Self {
        let link_service = Arc::new(LinkService::new(
            repos.links.clone(),
            repos.blacklist.clone(),
            config.base_url.clone(),
            config.short_code_length,
        ));
        let recorder = Arc::new(ClickRecorder::new(repos.clicks.clone(), geo));
        let redirect_service = Arc::new(RedirectService::new(repos.links, recorder));
        let analytics_service = Arc::new(AnalyticsService::new(repos.clicks));
        let tenant_service = Arc::new(TenantService::new(
            repos.tenants,
            link_service.clone(),
            analytics_service.clone(),
        ));
        let blacklist_service = Arc::new(BlacklistService::new(repos.blacklist));
        let auth_service = Arc::new(AuthService::new(
            repos.tokens,
            config.token_signing_secret.clone(),
        ));

        Self {
            link_service,
            redirect_service,
            analytics_service,
            tenant_service,
            blacklist_service,
            auth_service,
            behind_proxy: config.behind_proxy,
            qr_enabled: config.qr_enabled,
        }
    }
}
