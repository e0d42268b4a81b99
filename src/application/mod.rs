//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::LinkService`] - Shortening, code generation and link administration
//! - [`services::RedirectService`] - Code resolution for redirects
//! - [`services::ClickRecorder`] - Click persistence with unique-visitor dedup
//! - [`services::AnalyticsService`] - Windowed reports and click history
//! - [`services::TenantService`] - Tenant-scoped link management
//! - [`services::BlacklistService`] - Blocked client addresses
//! - [`services::AuthService`] - Admin token authentication

pub mod services;
