//! Repository traits for tenant users and the IP blacklist.

use crate::domain::entities::{BlacklistEntry, TenantSummary, TenantUser};
use crate::error::AppError;
use async_trait::async_trait;

/// Tenant users of the embedded cabinet.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Returns the tenant for the external identity, creating it if needed.
    ///
    /// A non-empty `name` replaces the stored one; an empty or missing name
    /// keeps it.
    async fn get_or_create(
        &self,
        external_user_id: &str,
        external_domain: &str,
        name: Option<String>,
    ) -> Result<TenantUser, AppError>;

    async fn find(
        &self,
        external_user_id: &str,
        external_domain: &str,
    ) -> Result<Option<TenantUser>, AppError>;

    /// All tenants with their link counts, newest first.
    async fn list_with_counts(&self) -> Result<Vec<TenantSummary>, AppError>;
}

/// Blocked client addresses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlacklistRepository: Send + Sync {
    async fn is_blacklisted(&self, ip: &str) -> Result<bool, AppError>;

    /// Blocks an address.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the address is already blocked.
    async fn add(&self, ip: &str, reason: Option<String>) -> Result<BlacklistEntry, AppError>;

    /// Unblocks an address. Returns `Ok(false)` if it was not blocked.
    async fn remove(&self, ip: &str) -> Result<bool, AppError>;

    async fn list(&self) -> Result<Vec<BlacklistEntry>, AppError>;
}
