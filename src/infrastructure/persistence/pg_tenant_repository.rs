//! PostgreSQL implementations of tenant and blacklist repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{BlacklistEntry, TenantSummary, TenantUser};
use crate::domain::repositories::{BlacklistRepository, TenantRepository};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct TenantRow {
    id: i64,
    external_user_id: String,
    external_domain: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TenantRow> for TenantUser {
    fn from(r: TenantRow) -> Self {
        TenantUser {
            id: r.id,
            external_user_id: r.external_user_id,
            external_domain: r.external_domain,
            name: r.name,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TenantSummaryRow {
    #[sqlx(flatten)]
    tenant: TenantRow,
    links_count: i64,
}

/// PostgreSQL repository for tenant users.
pub struct PgTenantRepository {
    pool: Arc<PgPool>,
}

impl PgTenantRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn get_or_create(
        &self,
        external_user_id: &str,
        external_domain: &str,
        name: Option<String>,
    ) -> Result<TenantUser, AppError> {
        // DO UPDATE rather than DO NOTHING: RETURNING must yield the existing row.
        let row: TenantRow = sqlx::query_as(
            r#"
            INSERT INTO tenant_users (external_user_id, external_domain, name)
            VALUES ($1, $2, NULLIF($3, ''))
            ON CONFLICT ON CONSTRAINT tenant_users_external_key
            DO UPDATE SET name = COALESCE(EXCLUDED.name, tenant_users.name)
            RETURNING id, external_user_id, external_domain, name, created_at
            "#,
        )
        .bind(external_user_id)
        .bind(external_domain)
        .bind(name)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find(
        &self,
        external_user_id: &str,
        external_domain: &str,
    ) -> Result<Option<TenantUser>, AppError> {
        let row: Option<TenantRow> = sqlx::query_as(
            r#"
            SELECT id, external_user_id, external_domain, name, created_at
            FROM tenant_users
            WHERE external_user_id = $1 AND external_domain = $2
            "#,
        )
        .bind(external_user_id)
        .bind(external_domain)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(TenantUser::from))
    }

    async fn list_with_counts(&self) -> Result<Vec<TenantSummary>, AppError> {
        let rows: Vec<TenantSummaryRow> = sqlx::query_as(
            r#"
            SELECT t.id, t.external_user_id, t.external_domain, t.name, t.created_at,
                   COUNT(l.id) AS links_count
            FROM tenant_users t
            LEFT JOIN links l ON l.owner_id = t.id
            GROUP BY t.id
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TenantSummary {
                tenant: r.tenant.into(),
                links_count: r.links_count,
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct BlacklistRow {
    id: i64,
    ip_address: String,
    reason: Option<String>,
    blocked_at: DateTime<Utc>,
}

impl From<BlacklistRow> for BlacklistEntry {
    fn from(r: BlacklistRow) -> Self {
        BlacklistEntry {
            id: r.id,
            ip_address: r.ip_address,
            reason: r.reason,
            blocked_at: r.blocked_at,
        }
    }
}

/// PostgreSQL repository for blocked client addresses.
pub struct PgBlacklistRepository {
    pool: Arc<PgPool>,
}

impl PgBlacklistRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlacklistRepository for PgBlacklistRepository {
    async fn is_blacklisted(&self, ip: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ip_blacklist WHERE ip_address = $1)")
                .bind(ip)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn add(&self, ip: &str, reason: Option<String>) -> Result<BlacklistEntry, AppError> {
        let row: BlacklistRow = sqlx::query_as(
            r#"
            INSERT INTO ip_blacklist (ip_address, reason)
            VALUES ($1, $2)
            RETURNING id, ip_address, reason, blocked_at
            "#,
        )
        .bind(ip)
        .bind(reason)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn remove(&self, ip: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ip_blacklist WHERE ip_address = $1")
            .bind(ip)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<BlacklistEntry>, AppError> {
        let rows: Vec<BlacklistRow> = sqlx::query_as(
            "SELECT id, ip_address, reason, blocked_at FROM ip_blacklist ORDER BY blocked_at DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(BlacklistEntry::from).collect())
    }
}
