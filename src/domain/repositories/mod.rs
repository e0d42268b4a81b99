//! Repository trait definitions for the domain layer.
//!
//! Traits define the data access contract; PostgreSQL implementations live in
//! `crate::infrastructure::persistence`, and `mockall` generates mocks for
//! unit tests.
//!
//! - [`LinkRepository`] - Short link CRUD, lookups and totals
//! - [`ClickRepository`] - Click recording, visitor dedup, history
//! - [`TenantRepository`] - Tenant users of the embedded cabinet
//! - [`BlacklistRepository`] - Blocked client addresses
//! - [`TokenRepository`] - Admin API tokens
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod click_repository;
pub mod link_repository;
pub mod tenant_repository;
pub mod token_repository;

pub use click_repository::ClickRepository;
pub use link_repository::{LinkOverview, LinkRepository};
pub use tenant_repository::{BlacklistRepository, TenantRepository};
pub use token_repository::{ApiToken, TokenRepository};

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use tenant_repository::{MockBlacklistRepository, MockTenantRepository};
#[cfg(test)]
pub use token_repository::MockTokenRepository;
