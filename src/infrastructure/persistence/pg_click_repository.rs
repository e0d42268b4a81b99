//! PostgreSQL implementation of click repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;

use crate::domain::analytics::{
    BucketCount, ClickSummary, GroupBy, LabelCount, TOP_CITIES, TOP_COUNTRIES, TOP_REFERERS,
};
use crate::domain::entities::{Click, NewClick, VisitorKey};
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

const CLICK_COLUMNS: &str = "id, link_id, clicked_at, ip_address, user_agent, referer, \
     country_code, country_name, city, is_unique, is_qr_click, device_os";

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    link_id: i64,
    clicked_at: DateTime<Utc>,
    ip_address: String,
    user_agent: Option<String>,
    referer: Option<String>,
    country_code: Option<String>,
    country_name: Option<String>,
    city: Option<String>,
    is_unique: bool,
    is_qr_click: bool,
    device_os: Option<String>,
}

impl From<ClickRow> for Click {
    fn from(r: ClickRow) -> Self {
        Click {
            id: r.id,
            link_id: r.link_id,
            clicked_at: r.clicked_at,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            referer: r.referer,
            country_code: r.country_code,
            country_name: r.country_name,
            city: r.city,
            is_unique: r.is_unique,
            is_qr_click: r.is_qr_click,
            device_os: r.device_os,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BucketRow {
    bucket_start: NaiveDateTime,
    clicks: i64,
    unique_clicks: i64,
}

#[derive(sqlx::FromRow)]
struct LabelRow {
    label: String,
    country_code: Option<String>,
    clicks: i64,
}

impl From<LabelRow> for LabelCount {
    fn from(r: LabelRow) -> Self {
        LabelCount {
            label: r.label,
            country_code: r.country_code,
            clicks: r.clicks,
        }
    }
}

/// One categorical breakdown, counted with `GROUP BY` inside the window.
struct Breakdown {
    label: &'static str,
    country_code: &'static str,
    condition: &'static str,
    limit: Option<usize>,
}

const COUNTRIES: Breakdown = Breakdown {
    label: "COALESCE(country_name, 'Unknown')",
    country_code: "country_code",
    condition: "TRUE",
    limit: Some(TOP_COUNTRIES),
};

const CITIES: Breakdown = Breakdown {
    label: "city",
    country_code: "country_code",
    condition: "city IS NOT NULL AND city <> ''",
    limit: Some(TOP_CITIES),
};

const SYSTEMS: Breakdown = Breakdown {
    label: "COALESCE(device_os, 'Unknown')",
    country_code: "NULL::varchar",
    condition: "TRUE",
    limit: None,
};

const REFERERS: Breakdown = Breakdown {
    label: "COALESCE(NULLIF(referer, ''), 'Direct')",
    country_code: "NULL::varchar",
    condition: "TRUE",
    limit: Some(TOP_REFERERS),
};

async fn breakdown(
    conn: &mut PgConnection,
    spec: &Breakdown,
    link_id: i64,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<LabelCount>, AppError> {
    // Byte-order collation so ties at the LIMIT cut match the in-memory ranking.
    let rows: Vec<LabelRow> = sqlx::query_as(&format!(
        r#"
        SELECT label, country_code, clicks
        FROM (
            SELECT {label}::varchar AS label, {code} AS country_code, COUNT(*) AS clicks
            FROM clicks
            WHERE link_id = $1 AND clicked_at >= $2 AND clicked_at <= $3 AND {condition}
            GROUP BY 1, 2
        ) grouped
        ORDER BY clicks DESC, label COLLATE "C", country_code COLLATE "C" NULLS FIRST
        LIMIT $4
        "#,
        label = spec.label,
        code = spec.country_code,
        condition = spec.condition,
    ))
    .bind(link_id)
    .bind(since)
    .bind(until)
    .bind(spec.limit.map(|n| n as i64))
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(LabelCount::from).collect())
}

pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn visitor_exists(&self, key: &VisitorKey) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM unique_visitors
                WHERE link_id = $1
                  AND ip_address = $2
                  AND user_agent_hash = $3
                  AND visit_date = $4
            )
            "#,
        )
        .bind(key.link_id)
        .bind(&key.ip_address)
        .bind(&key.user_agent_hash)
        .bind(key.visit_date)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn record(
        &self,
        click: NewClick,
        visitor: Option<VisitorKey>,
    ) -> Result<Click, AppError> {
        let mut tx = self.pool.begin().await?;

        let row: ClickRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO clicks (link_id, clicked_at, ip_address, user_agent, referer,
                                country_code, country_name, city, is_unique, is_qr_click, device_os)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CLICK_COLUMNS}
            "#
        ))
        .bind(click.link_id)
        .bind(click.clicked_at)
        .bind(&click.ip_address)
        .bind(&click.user_agent)
        .bind(&click.referer)
        .bind(&click.country_code)
        .bind(&click.country_name)
        .bind(&click.city)
        .bind(click.is_unique)
        .bind(click.is_qr_click)
        .bind(&click.device_os)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored = Click::from(row);

        let mut visitor_inserted = false;
        if let Some(key) = visitor
            && stored.is_unique
        {
            let inserted: Option<i64> = sqlx::query_scalar(
                r#"
                INSERT INTO unique_visitors (link_id, ip_address, user_agent_hash, visit_date, first_click_id)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT ON CONSTRAINT unique_visitors_visit_key DO NOTHING
                RETURNING id
                "#,
            )
            .bind(key.link_id)
            .bind(&key.ip_address)
            .bind(&key.user_agent_hash)
            .bind(key.visit_date)
            .bind(stored.id)
            .fetch_optional(&mut *tx)
            .await?;

            visitor_inserted = inserted.is_some();
        }

        if stored.is_unique && !visitor_inserted {
            sqlx::query("UPDATE clicks SET is_unique = FALSE WHERE id = $1")
                .bind(stored.id)
                .execute(&mut *tx)
                .await?;
            stored.is_unique = false;
            tracing::debug!(link_id = stored.link_id, "Visitor already counted, click stored as repeat");
        }

        sqlx::query(
            r#"
            UPDATE links
            SET clicks_count = clicks_count + 1,
                unique_clicks_count = unique_clicks_count + $2
            WHERE id = $1
            "#,
        )
        .bind(stored.link_id)
        .bind(if visitor_inserted { 1_i64 } else { 0_i64 })
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(stored)
    }

    async fn summarize(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        group_by: GroupBy,
    ) -> Result<ClickSummary, AppError> {
        // One snapshot, so every breakdown adds up to the same total.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let (total_clicks, unique_clicks, qr_clicks): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE is_unique),
                   COUNT(*) FILTER (WHERE is_qr_click)
            FROM clicks
            WHERE link_id = $1 AND clicked_at >= $2 AND clicked_at <= $3
            "#,
        )
        .bind(link_id)
        .bind(since)
        .bind(until)
        .fetch_one(&mut *tx)
        .await?;

        let buckets: Vec<BucketRow> = sqlx::query_as(
            r#"
            SELECT date_trunc($4, clicked_at AT TIME ZONE 'UTC') AS bucket_start,
                   COUNT(*) AS clicks,
                   COUNT(*) FILTER (WHERE is_unique) AS unique_clicks
            FROM clicks
            WHERE link_id = $1 AND clicked_at >= $2 AND clicked_at <= $3
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(link_id)
        .bind(since)
        .bind(until)
        .bind(group_by.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let countries = breakdown(&mut *tx, &COUNTRIES, link_id, since, until).await?;
        let cities = breakdown(&mut *tx, &CITIES, link_id, since, until).await?;
        let systems = breakdown(&mut *tx, &SYSTEMS, link_id, since, until).await?;
        let referers = breakdown(&mut *tx, &REFERERS, link_id, since, until).await?;

        tx.commit().await?;

        Ok(ClickSummary {
            total_clicks,
            unique_clicks,
            qr_clicks,
            buckets: buckets
                .into_iter()
                .map(|b| BucketCount {
                    start: b.bucket_start,
                    clicks: b.clicks,
                    unique_clicks: b.unique_clicks,
                })
                .collect(),
            countries,
            cities,
            systems,
            referers,
        })
    }

    async fn list_for_link(
        &self,
        link_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Click>, AppError> {
        let rows: Vec<ClickRow> = sqlx::query_as(&format!(
            r#"
            SELECT {CLICK_COLUMNS}
            FROM clicks
            WHERE link_id = $1
            ORDER BY clicked_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(link_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Click::from).collect())
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks WHERE link_id = $1")
            .bind(link_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
