//! Repository trait for short link data access.

use crate::domain::entities::{Link, LinkFilter, LinkPatch, LinkWithOwner, NewLink, Owner};
use crate::error::AppError;
use async_trait::async_trait;

/// Service-wide link totals for the admin overview.
#[derive(Debug, Clone, Default)]
pub struct LinkOverview {
    pub total_links: i64,
    pub active_links: i64,
    pub total_clicks: i64,
    pub total_unique_clicks: i64,
    /// Links with the most clicks, highest first.
    pub top_links: Vec<Link>,
}

/// Repository interface for managing short links.
///
/// Codes are compared case-insensitively everywhere; storage keeps them
/// lower-cased and enforces uniqueness on `lower(code)`.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] with `details.constraint = "links_code_key"`
    /// if another link already uses the code.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code, ignoring case.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Returns true when any link uses `code`, ignoring case.
    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Finds an active link for `original_url` within the owner's scope.
    ///
    /// Anonymous and admin scopes match any link of that kind; a tenant scope
    /// matches only that tenant's links.
    async fn find_active_by_url(
        &self,
        original_url: &str,
        owner: Owner,
    ) -> Result<Option<Link>, AppError>;

    /// Lists links newest first, joined with their tenant owner.
    ///
    /// # Arguments
    ///
    /// - `filter` - search and ownership filters
    /// - `offset` - rows to skip
    /// - `limit` - maximum rows returned
    async fn list(
        &self,
        filter: &LinkFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<LinkWithOwner>, AppError>;

    /// Counts links matching `filter`.
    async fn count(&self, filter: &LinkFilter) -> Result<i64, AppError>;

    /// Applies a partial update. Returns `Ok(None)` when no link has `id`.
    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Option<Link>, AppError>;

    /// Deletes a link; clicks and visitor rows go with it.
    ///
    /// Returns `Ok(false)` when no link has `id`.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Aggregated totals plus the `top` most clicked links.
    async fn overview(&self, top: i64) -> Result<LinkOverview, AppError>;

    /// Round-trips to the database.
    async fn ping(&self) -> Result<(), AppError>;
}
