//! Pagination and analytics query parameters.

use serde::Deserialize;
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::analytics::{GroupBy, Period};
use crate::error::AppError;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

pub const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

/// Offset/limit parameters (`?skip=0&limit=100`).
///
/// Uses `serde_with` to parse numbers from query strings.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct OffsetParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, alias = "skip")]
    pub offset: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

impl OffsetParams {
    /// Validates parameters and returns `(offset, limit)`.
    ///
    /// # Defaults
    ///
    /// - `offset`: 0
    /// - `limit`: 100, at most 1000
    pub fn offset_limit(&self) -> Result<(i64, i64), AppError> {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        if offset < 0 {
            return Err(AppError::bad_request(
                "Offset must not be negative",
                json!({ "offset": offset }),
            ));
        }

        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::bad_request(
                format!("Limit must be between 1 and {MAX_LIMIT}"),
                json!({ "limit": limit }),
            ));
        }

        Ok((offset, limit))
    }
}

/// Page-number parameters (`?page=1&per_page=20`).
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl PageParams {
    /// Validates parameters and returns `(page, per_page)`.
    pub fn page_and_size(&self) -> Result<(u32, u32), AppError> {
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);

        if page == 0 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }

        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::bad_request(
                format!("per_page must be between 1 and {MAX_PER_PAGE}"),
                json!({ "per_page": per_page }),
            ));
        }

        Ok((page, per_page))
    }
}

/// `?period=7d&group_by=day`. Parsed by hand so bad values produce the
/// usual JSON error body.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
    pub period: Option<String>,
    pub group_by: Option<String>,
}

impl AnalyticsParams {
    pub fn parse(&self) -> Result<(Period, GroupBy), AppError> {
        let period = match self.period.as_deref() {
            None | Some("") => Period::default(),
            Some(raw) => raw
                .parse()
                .map_err(|reason: String| AppError::bad_request("Invalid period", json!({ "reason": reason })))?,
        };

        let group_by = match self.group_by.as_deref() {
            None | Some("") => GroupBy::default(),
            Some(raw) => raw
                .parse()
                .map_err(|reason: String| AppError::bad_request("Invalid group_by", json!({ "reason": reason })))?,
        };

        Ok((period, group_by))
    }
}
