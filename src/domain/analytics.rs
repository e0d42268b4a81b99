//! Rolling-window click analytics.
//!
//! Storage counts and groups the clicks of a window into a [`ClickSummary`];
//! [`build_report`] turns that into the API report (labels, percentages,
//! ratio, ordering). All timestamps and bucket labels are UTC.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Link;

pub const TOP_COUNTRIES: usize = 20;
pub const TOP_CITIES: usize = 10;
pub const TOP_REFERERS: usize = 10;

/// Length of the analytics window ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "24h")]
    Day,
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl Period {
    pub fn duration(&self) -> Duration {
        match self {
            Period::Day => Duration::hours(24),
            Period::Week => Duration::days(7),
            Period::Month => Duration::days(30),
            Period::Quarter => Duration::days(90),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "24h",
            Period::Week => "7d",
            Period::Month => "30d",
            Period::Quarter => "90d",
        }
    }

    /// Start of the window that ends at `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Period::Day),
            "7d" => Ok(Period::Week),
            "30d" => Ok(Period::Month),
            "90d" => Ok(Period::Quarter),
            other => Err(format!(
                "period must be one of 24h, 7d, 30d, 90d, got '{other}'"
            )),
        }
    }
}

/// Size of the time buckets in [`AnalyticsReport::clicks_by_time`].
///
/// Hourly grouping over a window longer than a day is allowed and yields
/// hourly buckets across the whole window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Hour,
    #[default]
    Day,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Hour => "hour",
            GroupBy::Day => "day",
        }
    }

    /// Label of the bucket starting at `start` (UTC).
    pub fn label(&self, start: NaiveDateTime) -> String {
        match self {
            GroupBy::Hour => start.format("%Y-%m-%d %H:00").to_string(),
            GroupBy::Day => start.format("%Y-%m-%d").to_string(),
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(GroupBy::Hour),
            "day" => Ok(GroupBy::Day),
            other => Err(format!("group_by must be 'hour' or 'day', got '{other}'")),
        }
    }
}

/// One time bucket of clicks, as counted by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketCount {
    /// Bucket start, truncated to the hour or day in UTC.
    pub start: NaiveDateTime,
    pub clicks: i64,
    pub unique_clicks: i64,
}

/// One row of a categorical breakdown.
///
/// `country_code` accompanies country and city rows and is `None` elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCount {
    pub label: String,
    pub country_code: Option<String>,
    pub clicks: i64,
}

/// Grouped counts of one link's clicks inside a window.
///
/// Missing countries and systems are labelled `Unknown`, missing referers
/// `Direct`; clicks without a city are left out of `cities`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickSummary {
    pub total_clicks: i64,
    pub unique_clicks: i64,
    pub qr_clicks: i64,
    pub buckets: Vec<BucketCount>,
    pub countries: Vec<LabelCount>,
    pub cities: Vec<LabelCount>,
    pub systems: Vec<LabelCount>,
    pub referers: Vec<LabelCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    /// `YYYY-MM-DD HH:00` or `YYYY-MM-DD`.
    pub timestamp: String,
    pub clicks: i64,
    pub unique_clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryBreakdown {
    pub country_code: Option<String>,
    pub country_name: String,
    pub clicks: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityBreakdown {
    pub city: String,
    pub country_code: Option<String>,
    pub clicks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsBreakdown {
    pub os: String,
    pub clicks: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefererBreakdown {
    pub referer: String,
    pub clicks: i64,
    pub percentage: f64,
}

/// Aggregated view of one link's clicks inside a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub link_id: i64,
    pub short_code: String,
    pub period: Period,
    pub group_by: GroupBy,
    pub total_clicks: i64,
    pub unique_clicks: i64,
    pub qr_clicks: i64,
    pub unique_ratio: f64,
    pub clicks_by_time: Vec<TimeBucket>,
    pub clicks_by_country: Vec<CountryBreakdown>,
    pub clicks_by_city: Vec<CityBreakdown>,
    pub clicks_by_os: Vec<OsBreakdown>,
    pub top_referers: Vec<RefererBreakdown>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `count / total` as a percentage with one decimal; 0 when `total` is 0.
pub fn percentage(count: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(count as f64 / total as f64 * 100.0, 1)
}

fn by_rank(a: &LabelCount, b: &LabelCount) -> Ordering {
    b.clicks
        .cmp(&a.clicks)
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.country_code.cmp(&b.country_code))
}

/// Orders rows by count descending, then label ascending, keeping at most `cap`.
fn ranked(mut rows: Vec<LabelCount>, cap: Option<usize>) -> Vec<LabelCount> {
    rows.sort_by(by_rank);
    if let Some(cap) = cap {
        rows.truncate(cap);
    }
    rows
}

/// Builds the report for `link` from the counts of its window.
pub fn build_report(
    link: &Link,
    summary: ClickSummary,
    period: Period,
    group_by: GroupBy,
) -> AnalyticsReport {
    let total = summary.total_clicks;

    let mut buckets = summary.buckets;
    buckets.sort_by_key(|b| b.start);

    AnalyticsReport {
        link_id: link.id,
        short_code: link.code.clone(),
        period,
        group_by,
        total_clicks: total,
        unique_clicks: summary.unique_clicks,
        qr_clicks: summary.qr_clicks,
        unique_ratio: if total == 0 {
            0.0
        } else {
            round_to(summary.unique_clicks as f64 / total as f64, 2)
        },
        clicks_by_time: buckets
            .into_iter()
            .map(|b| TimeBucket {
                timestamp: group_by.label(b.start),
                clicks: b.clicks,
                unique_clicks: b.unique_clicks,
            })
            .collect(),
        clicks_by_country: ranked(summary.countries, Some(TOP_COUNTRIES))
            .into_iter()
            .map(|row| CountryBreakdown {
                country_code: row.country_code,
                country_name: row.label,
                clicks: row.clicks,
                percentage: percentage(row.clicks, total),
            })
            .collect(),
        clicks_by_city: ranked(summary.cities, Some(TOP_CITIES))
            .into_iter()
            .map(|row| CityBreakdown {
                city: row.label,
                country_code: row.country_code,
                clicks: row.clicks,
            })
            .collect(),
        clicks_by_os: ranked(summary.systems, None)
            .into_iter()
            .map(|row| OsBreakdown {
                os: row.label,
                clicks: row.clicks,
                percentage: percentage(row.clicks, total),
            })
            .collect(),
        top_referers: ranked(summary.referers, Some(TOP_REFERERS))
            .into_iter()
            .map(|row| RefererBreakdown {
                referer: row.label,
                clicks: row.clicks,
                percentage: percentage(row.clicks, total),
            })
            .collect(),
    }
}
