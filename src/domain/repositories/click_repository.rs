//! Repository trait for click recording and unique-visitor state.

use crate::domain::analytics::{ClickSummary, GroupBy};
use crate::domain::entities::{Click, NewClick, VisitorKey};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persists clicks together with their deduplication and counter side effects.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Returns true when the visitor already has a row for that day.
    async fn visitor_exists(&self, key: &VisitorKey) -> Result<bool, AppError>;

    /// Records a click in a single transaction.
    ///
    /// 1. Inserts the click.
    /// 2. When `visitor` is given, inserts the visitor row; if a concurrent
    ///    request already inserted it, the click is stored as not unique.
    /// 3. Increments `clicks_count`, and `unique_clicks_count` only when the
    ///    visitor row was inserted here.
    ///
    /// Returns the stored click with its final `is_unique`.
    async fn record(
        &self,
        click: NewClick,
        visitor: Option<VisitorKey>,
    ) -> Result<Click, AppError>;

    /// Grouped counts of a link's clicks in `[since, until]`.
    async fn summarize(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        group_by: GroupBy,
    ) -> Result<ClickSummary, AppError>;

    /// Click history of a link, newest first.
    async fn list_for_link(
        &self,
        link_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Click>, AppError>;

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError>;
}
