//! Link analytics and click history.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::analytics::{AnalyticsReport, GroupBy, Period, build_report};
use crate::domain::entities::{Click, Link};
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// A page of a link's click history, newest first.
#[derive(Debug, Clone)]
pub struct ClickPage {
    pub total: i64,
    pub clicks: Vec<Click>,
}

/// Builds reports from stored clicks. Callers resolve and authorize the
/// link first; this service never decides who may see what.
pub struct AnalyticsService {
    clicks: Arc<dyn ClickRepository>,
}

impl AnalyticsService {
    pub fn new(clicks: Arc<dyn ClickRepository>) -> Self {
        Self { clicks }
    }

    /// Reports on the clicks of `link` inside the rolling `period` window.
    ///
    /// Counting and grouping happen in storage; only the grouped rows are
    /// loaded.
    pub async fn report(
        &self,
        link: &Link,
        period: Period,
        group_by: GroupBy,
    ) -> Result<AnalyticsReport, AppError> {
        let now = Utc::now();
        let summary = self
            .clicks
            .summarize(link.id, period.since(now), now, group_by)
            .await?;

        Ok(build_report(link, summary, period, group_by))
    }

    pub async fn click_history(
        &self,
        link_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<ClickPage, AppError> {
        let total = self.clicks.count_for_link(link_id).await?;
        let clicks = self.clicks.list_for_link(link_id, limit, offset).await?;

        Ok(ClickPage { total, clicks })
    }
}
