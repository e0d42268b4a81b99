//! PostgreSQL repository implementations.
//!
//! Queries use the runtime `sqlx` API with `FromRow` row structs, mapped into
//! domain entities at the boundary.
//!
//! - [`PgLinkRepository`] - Link storage and retrieval
//! - [`PgClickRepository`] - Transactional click recording and history
//! - [`PgTenantRepository`] - Tenant users
//! - [`PgBlacklistRepository`] - Blocked addresses
//! - [`PgTokenRepository`] - Admin token storage and validation

pub mod pg_click_repository;
pub mod pg_link_repository;
pub mod pg_tenant_repository;
pub mod pg_token_repository;

pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_tenant_repository::{PgBlacklistRepository, PgTenantRepository};
pub use pg_token_repository::PgTokenRepository;
