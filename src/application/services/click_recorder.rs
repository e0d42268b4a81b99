//! Click recording with geo lookup and unique-visitor deduplication.

use std::sync::Arc;

use chrono::Utc;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::domain::entities::{Click, Link, NewClick, VisitorKey};
use crate::domain::geo::GeoLocator;
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;
use crate::utils::user_agent::{clean_header_value, detect_os, truncate_chars};

const RECORD_RETRIES: usize = 3;

/// Widths of the geo columns in `clicks`.
const COUNTRY_CODE_CHARS: usize = 2;
const GEO_NAME_CHARS: usize = 100;

fn fit(value: Option<String>, max_chars: usize) -> Option<String> {
    value.map(|v| truncate_chars(&v, max_chars))
}

/// Request metadata captured for a click.
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// Persists clicks together with their dedup row and link counters.
///
/// Uniqueness is decided per (link, IP, user agent, UTC day). The check
/// here is advisory; the storage transaction downgrades the click when a
/// concurrent request inserts the visitor row first.
pub struct ClickRecorder {
    clicks: Arc<dyn ClickRepository>,
    geo: Arc<dyn GeoLocator>,
}

impl ClickRecorder {
    pub fn new(clicks: Arc<dyn ClickRepository>, geo: Arc<dyn GeoLocator>) -> Self {
        Self { clicks, geo }
    }

    /// Records one visit of `link`.
    ///
    /// Storage failures are retried a few times with backoff before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the click could not be persisted.
    pub async fn record_click(
        &self,
        link: &Link,
        ctx: &ClickContext,
        is_qr: bool,
    ) -> Result<Click, AppError> {
        let now = Utc::now();
        let geo = self.geo.locate(&ctx.ip_address).await;

        let key = VisitorKey::new(link.id, &ctx.ip_address, ctx.user_agent.as_deref(), now);
        let is_unique = !self.clicks.visitor_exists(&key).await?;

        let click = NewClick {
            link_id: link.id,
            clicked_at: now,
            ip_address: ctx.ip_address.clone(),
            user_agent: clean_header_value(ctx.user_agent.as_deref()),
            referer: clean_header_value(ctx.referer.as_deref()),
            country_code: fit(geo.country_code, COUNTRY_CODE_CHARS),
            country_name: fit(geo.country_name, GEO_NAME_CHARS),
            city: fit(geo.city, GEO_NAME_CHARS),
            is_unique,
            is_qr_click: is_qr,
            device_os: Some(detect_os(ctx.user_agent.as_deref())),
        };
        let visitor = is_unique.then_some(key);

        let strategy = ExponentialBackoff::from_millis(10)
            .map(jitter)
            .take(RECORD_RETRIES);

        let recorded = RetryIf::spawn(
            strategy,
            || self.clicks.record(click.clone(), visitor.clone()),
            |e: &AppError| {
                let retry = matches!(e, AppError::Internal { .. });
                if retry {
                    warn!(link_id = link.id, error = %e, "Click insert failed, retrying");
                }
                retry
            },
        )
        .await?;

        metrics::counter!(
            "shortlinks_clicks_total",
            "source" => if is_qr { "qr" } else { "link" },
            "unique" => if recorded.is_unique { "true" } else { "false" }
        )
        .increment(1);

        debug!(
            link_id = link.id,
            click_id = recorded.id,
            is_unique = recorded.is_unique,
            is_qr,
            "Recorded click"
        );

        Ok(recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::link::sample_link;
    use crate::domain::geo::{GeoData, MockGeoLocator};
    use crate::domain::repositories::MockClickRepository;
    use serde_json::json;
    use std::sync::Mutex;

    const CHROME_WINDOWS: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";

    fn ctx(ip: &str) -> ClickContext {
        ClickContext {
            ip_address: ip.to_string(),
            user_agent: Some(CHROME_WINDOWS.to_string()),
            referer: Some("https://news.example.org/".to_string()),
        }
    }

    fn unknown_geo() -> MockGeoLocator {
        let mut geo = MockGeoLocator::new();
        geo.expect_locate().returning(|_| GeoData::unknown());
        geo
    }

    fn stored(click: &NewClick, id: i64) -> Click {
        Click {
            id,
            link_id: click.link_id,
            clicked_at: click.clicked_at,
            ip_address: click.ip_address.clone(),
            user_agent: click.user_agent.clone(),
            referer: click.referer.clone(),
            country_code: click.country_code.clone(),
            country_name: click.country_name.clone(),
            city: click.city.clone(),
            is_unique: click.is_unique,
            is_qr_click: click.is_qr_click,
            device_os: click.device_os.clone(),
        }
    }

    #[tokio::test]
    async fn test_first_visit_is_unique() {
        let mut clicks = MockClickRepository::new();
        let mut geo = MockGeoLocator::new();

        geo.expect_locate()
            .withf(|ip| ip == "8.8.8.8")
            .times(1)
            .returning(|_| GeoData {
                country_code: Some("US".to_string()),
                country_name: Some("United States".to_string()),
                city: Some("Mountain View".to_string()),
            });
        clicks
            .expect_visitor_exists()
            .withf(|key| key.link_id == 1 && key.ip_address == "8.8.8.8")
            .times(1)
            .returning(|_| Ok(false));
        clicks
            .expect_record()
            .withf(|click, visitor| {
                click.is_unique
                    && visitor.is_some()
                    && click.country_code.as_deref() == Some("US")
                    && click.device_os.as_deref() == Some("Windows 10/11")
                    && !click.is_qr_click
            })
            .times(1)
            .returning(|click, _| Ok(stored(&click, 100)));

        let recorder = ClickRecorder::new(Arc::new(clicks), Arc::new(geo));
        let link = sample_link(1, "abcde", "https://example.com");

        let click = recorder.record_click(&link, &ctx("8.8.8.8"), false).await.unwrap();

        assert_eq!(click.id, 100);
        assert!(click.is_unique);
    }

    #[tokio::test]
    async fn test_repeat_visit_is_not_unique() {
        let mut clicks = MockClickRepository::new();

        clicks.expect_visitor_exists().returning(|_| Ok(true));
        clicks
            .expect_record()
            .withf(|click, visitor| !click.is_unique && visitor.is_none())
            .times(1)
            .returning(|click, _| Ok(stored(&click, 101)));

        let recorder = ClickRecorder::new(Arc::new(clicks), Arc::new(unknown_geo()));
        let link = sample_link(1, "abcde", "https://example.com");

        let click = recorder.record_click(&link, &ctx("8.8.8.8"), true).await.unwrap();

        assert!(!click.is_unique);
        assert!(click.is_qr_click);
    }

    #[tokio::test]
    async fn test_long_headers_are_truncated() {
        let mut clicks = MockClickRepository::new();

        clicks.expect_visitor_exists().returning(|_| Ok(false));
        clicks
            .expect_record()
            .withf(|click, _| {
                click.user_agent.as_ref().map(|ua| ua.chars().count()) == Some(512)
                    && click.referer.as_ref().map(|r| r.chars().count()) == Some(512)
            })
            .times(1)
            .returning(|click, _| Ok(stored(&click, 1)));

        let recorder = ClickRecorder::new(Arc::new(clicks), Arc::new(unknown_geo()));
        let link = sample_link(1, "abcde", "https://example.com");
        let ctx = ClickContext {
            ip_address: "8.8.8.8".to_string(),
            user_agent: Some("a".repeat(2000)),
            referer: Some(format!("https://example.org/{}", "r".repeat(1000))),
        };

        recorder.record_click(&link, &ctx, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_long_geo_values_fit_columns() {
        let mut clicks = MockClickRepository::new();
        let mut geo = MockGeoLocator::new();

        geo.expect_locate().returning(|_| GeoData {
            country_code: Some("USA".to_string()),
            country_name: Some("N".repeat(150)),
            city: Some("ü".repeat(120)),
        });
        clicks.expect_visitor_exists().returning(|_| Ok(false));
        clicks
            .expect_record()
            .withf(|click, _| {
                click.country_code.as_deref() == Some("US")
                    && click.country_name.as_ref().map(|n| n.chars().count()) == Some(100)
                    && click.city.as_deref() == Some("ü".repeat(100).as_str())
            })
            .times(1)
            .returning(|click, _| Ok(stored(&click, 1)));

        let recorder = ClickRecorder::new(Arc::new(clicks), Arc::new(geo));
        let link = sample_link(1, "abcde", "https://example.com");

        recorder.record_click(&link, &ctx("8.8.8.8"), false).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_user_agent() {
        let mut clicks = MockClickRepository::new();

        clicks.expect_visitor_exists().returning(|_| Ok(false));
        clicks
            .expect_record()
            .withf(|click, visitor| {
                click.user_agent.is_none()
                    && click.device_os.as_deref() == Some("Unknown")
                    && visitor.as_ref().map(|v| v.user_agent_hash.clone())
                        == Some(crate::domain::entities::hash_user_agent(""))
            })
            .times(1)
            .returning(|click, _| Ok(stored(&click, 1)));

        let recorder = ClickRecorder::new(Arc::new(clicks), Arc::new(unknown_geo()));
        let link = sample_link(1, "abcde", "https://example.com");
        let ctx = ClickContext {
            ip_address: "8.8.8.8".to_string(),
            ..ClickContext::default()
        };

        recorder.record_click(&link, &ctx, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_transient_storage_error_is_retried() {
        let mut clicks = MockClickRepository::new();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();

        clicks.expect_visitor_exists().returning(|_| Ok(false));
        clicks.expect_record().returning(move |click, _| {
            let mut calls = counter.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                Err(AppError::internal("Database error", json!({})))
            } else {
                Ok(stored(&click, 7))
            }
        });

        let recorder = ClickRecorder::new(Arc::new(clicks), Arc::new(unknown_geo()));
        let link = sample_link(1, "abcde", "https://example.com");

        let click = recorder.record_click(&link, &ctx("8.8.8.8"), false).await.unwrap();

        assert_eq!(click.id, 7);
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let mut clicks = MockClickRepository::new();

        clicks.expect_visitor_exists().returning(|_| Ok(false));
        clicks
            .expect_record()
            .times(1)
            .returning(|_, _| Err(AppError::not_found("Link not found", json!({}))));

        let recorder = ClickRecorder::new(Arc::new(clicks), Arc::new(unknown_geo()));
        let link = sample_link(1, "abcde", "https://example.com");

        let err = recorder
            .record_click(&link, &ctx("8.8.8.8"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
