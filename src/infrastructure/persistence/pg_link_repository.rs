//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{
    Link, LinkFilter, LinkPatch, LinkWithOwner, NewLink, Owner, OwnerKind,
};
use crate::domain::repositories::{LinkOverview, LinkRepository};
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, code, original_url, created_at, created_by, clicks_count, \
     unique_clicks_count, is_active, owner_id, owner_kind";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    code: String,
    original_url: String,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
    clicks_count: i64,
    unique_clicks_count: i64,
    is_active: bool,
    owner_id: Option<i64>,
    owner_kind: String,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link {
            id: r.id,
            code: r.code,
            original_url: r.original_url,
            created_at: r.created_at,
            created_by: r.created_by,
            clicks_count: r.clicks_count,
            unique_clicks_count: r.unique_clicks_count,
            is_active: r.is_active,
            owner_id: r.owner_id,
            owner_kind: OwnerKind::from_db(&r.owner_kind),
        }
    }
}

#[derive(sqlx::FromRow)]
struct LinkWithOwnerRow {
    #[sqlx(flatten)]
    link: LinkRow,
    owner_name: Option<String>,
    owner_domain: Option<String>,
}

/// PostgreSQL repository for link storage and retrieval.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let row: LinkRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO links (code, original_url, created_by, owner_id, owner_kind)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&new_link.code)
        .bind(&new_link.original_url)
        .bind(&new_link.created_by)
        .bind(new_link.owner.owner_id())
        .bind(new_link.owner.kind().as_str())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE LOWER(code) = LOWER($1)"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM links WHERE LOWER(code) = LOWER($1))")
                .bind(code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> =
            sqlx::query_as(&format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(row.map(Link::from))
    }

    async fn find_active_by_url(
        &self,
        original_url: &str,
        owner: Owner,
    ) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE original_url = $1
              AND is_active
              AND owner_kind = $2
              AND owner_id IS NOT DISTINCT FROM $3
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(original_url)
        .bind(owner.kind().as_str())
        .bind(owner.owner_id())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn list(
        &self,
        filter: &LinkFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<LinkWithOwner>, AppError> {
        let rows: Vec<LinkWithOwnerRow> = sqlx::query_as(
            r#"
            SELECT l.id, l.code, l.original_url, l.created_at, l.created_by,
                   l.clicks_count, l.unique_clicks_count, l.is_active,
                   l.owner_id, l.owner_kind,
                   t.name AS owner_name, t.external_domain AS owner_domain
            FROM links l
            LEFT JOIN tenant_users t ON t.id = l.owner_id
            WHERE ($1::text IS NULL
                   OR l.code ILIKE '%' || $1 || '%'
                   OR l.original_url ILIKE '%' || $1 || '%')
              AND (NOT $2 OR l.is_active)
              AND ($3::text IS NULL OR l.owner_kind = $3)
              AND ($4::bigint IS NULL OR l.owner_id = $4)
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.search.as_deref())
        .bind(filter.active_only)
        .bind(filter.owner_kind.map(|k| k.as_str()))
        .bind(filter.owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LinkWithOwner {
                link: r.link.into(),
                owner_name: r.owner_name,
                owner_domain: r.owner_domain,
            })
            .collect())
    }

    async fn count(&self, filter: &LinkFilter) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM links l
            WHERE ($1::text IS NULL
                   OR l.code ILIKE '%' || $1 || '%'
                   OR l.original_url ILIKE '%' || $1 || '%')
              AND (NOT $2 OR l.is_active)
              AND ($3::text IS NULL OR l.owner_kind = $3)
              AND ($4::bigint IS NULL OR l.owner_id = $4)
            "#,
        )
        .bind(filter.search.as_deref())
        .bind(filter.active_only)
        .bind(filter.owner_kind.map(|k| k.as_str()))
        .bind(filter.owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            r#"
            UPDATE links
            SET original_url = COALESCE($2, original_url),
                is_active    = COALESCE($3, is_active)
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.original_url)
        .bind(patch.is_active)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn overview(&self, top: i64) -> Result<LinkOverview, AppError> {
        let (total_links, active_links, total_clicks, total_unique_clicks): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE is_active),
                       COALESCE(SUM(clicks_count), 0)::BIGINT,
                       COALESCE(SUM(unique_clicks_count), 0)::BIGINT
                FROM links
                "#,
            )
            .fetch_one(self.pool.as_ref())
            .await?;

        let top_links: Vec<LinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM links ORDER BY clicks_count DESC, id ASC LIMIT $1"
        ))
        .bind(top)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(LinkOverview {
            total_links,
            active_links,
            total_clicks,
            total_unique_clicks,
            top_links: top_links.into_iter().map(Link::from).collect(),
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
