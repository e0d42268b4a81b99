//! Tenant-scoped link management for the embedded cabinet.
//!
//! Tenants are identified by (`user_id`, `domain`) as sent by the host
//! portal. Every operation is confined to the caller's own links; links
//! of other owners are reported as not found.

use std::sync::Arc;

use serde_json::json;

use super::analytics_service::AnalyticsService;
use super::link_service::{LinkService, ShortenCommand, Shortened};
use crate::domain::analytics::{AnalyticsReport, GroupBy, Period};
use crate::domain::entities::{Link, LinkFilter, Owner, TenantSummary, TenantUser};
use crate::domain::repositories::TenantRepository;
use crate::error::AppError;

/// Caller identity sent with every tenant request.
#[derive(Debug, Clone)]
pub struct TenantIdentity {
    pub user_id: String,
    pub domain: String,
}

/// One page of a tenant's links.
#[derive(Debug, Clone)]
pub struct TenantLinkPage {
    pub links: Vec<Link>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

pub struct TenantService {
    tenants: Arc<dyn TenantRepository>,
    links: Arc<LinkService>,
    analytics: Arc<AnalyticsService>,
}

impl TenantService {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        links: Arc<LinkService>,
        analytics: Arc<AnalyticsService>,
    ) -> Self {
        Self {
            tenants,
            links,
            analytics,
        }
    }

    /// Lists the caller's links, newest first. Unknown callers are registered.
    pub async fn list_links(
        &self,
        identity: &TenantIdentity,
        page: u32,
        per_page: u32,
    ) -> Result<TenantLinkPage, AppError> {
        let tenant = self
            .tenants
            .get_or_create(&identity.user_id, &identity.domain, None)
            .await?;

        let filter = LinkFilter::for_tenant(tenant.id);
        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);

        let total = self.links.count_links(&filter).await?;
        let links = self
            .links
            .list_links(&filter, offset, i64::from(per_page))
            .await?
            .into_iter()
            .map(|row| row.link)
            .collect();

        Ok(TenantLinkPage {
            links,
            total,
            page,
            per_page,
        })
    }

    /// Shortens a URL for the caller. Deduplication only considers the
    /// caller's own active links. A non-empty `user_name` refreshes the
    /// stored display name.
    pub async fn create_link(
        &self,
        identity: &TenantIdentity,
        user_name: Option<String>,
        url: String,
        custom_alias: Option<String>,
    ) -> Result<Shortened, AppError> {
        let tenant = self
            .tenants
            .get_or_create(&identity.user_id, &identity.domain, user_name)
            .await?;

        self.links
            .shorten(ShortenCommand {
                url,
                custom_alias,
                owner: Owner::Tenant(tenant.id),
                created_by: Some(tenant.created_by()),
            })
            .await
    }

    pub async fn delete_link(&self, identity: &TenantIdentity, link_id: i64) -> Result<(), AppError> {
        let tenant = self.existing_tenant(identity).await?;
        self.links
            .delete_owned_link(link_id, Owner::Tenant(tenant.id))
            .await
    }

    pub async fn link_analytics(
        &self,
        identity: &TenantIdentity,
        link_id: i64,
        period: Period,
        group_by: GroupBy,
    ) -> Result<AnalyticsReport, AppError> {
        let tenant = self.existing_tenant(identity).await?;
        let link = self
            .links
            .get_owned_link(link_id, Owner::Tenant(tenant.id))
            .await?;

        self.analytics.report(&link, period, group_by).await
    }

    /// All tenants with their link counts, for the admin panel.
    pub async fn list_tenants(&self) -> Result<Vec<TenantSummary>, AppError> {
        self.tenants.list_with_counts().await
    }

    async fn existing_tenant(&self, identity: &TenantIdentity) -> Result<TenantUser, AppError> {
        self.tenants
            .find(&identity.user_id, &identity.domain)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "User not found",
                    json!({ "user_id": identity.user_id, "domain": identity.domain }),
                )
            })
    }
}
