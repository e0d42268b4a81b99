//! Business logic services for the application layer.

pub mod analytics_service;
pub mod auth_service;
pub mod blacklist_service;
pub mod click_recorder;
pub mod link_service;
pub mod redirect_service;
pub mod tenant_service;

pub use analytics_service::{AnalyticsService, ClickPage};
pub use auth_service::AuthService;
pub use blacklist_service::BlacklistService;
pub use click_recorder::{ClickContext, ClickRecorder};
pub use link_service::{LinkService, ShortenCommand, Shortened};
pub use redirect_service::{RedirectOutcome, RedirectService};
pub use tenant_service::{TenantIdentity, TenantLinkPage, TenantService};
