//! DTOs for the tenant cabinet API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::api::dto::pagination::{AnalyticsParams, PageParams};
use crate::application::services::TenantIdentity;
use crate::domain::entities::Link;

/// `?user_id=..&domain=..`, carried by every tenant request.
#[derive(Debug, Deserialize, Validate)]
pub struct TenantQuery {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 255))]
    pub domain: String,
}

impl TenantQuery {
    pub fn identity(&self) -> TenantIdentity {
        TenantIdentity {
            user_id: self.user_id.clone(),
            domain: self.domain.clone(),
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct TenantListQuery {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 255))]
    pub domain: String,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl TenantListQuery {
    pub fn identity(&self) -> TenantIdentity {
        TenantIdentity {
            user_id: self.user_id.clone(),
            domain: self.domain.clone(),
        }
    }

    pub fn paging(&self) -> PageParams {
        PageParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TenantAnalyticsQuery {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 255))]
    pub domain: String,
    pub period: Option<String>,
    pub group_by: Option<String>,
}

impl TenantAnalyticsQuery {
    pub fn identity(&self) -> TenantIdentity {
        TenantIdentity {
            user_id: self.user_id.clone(),
            domain: self.domain.clone(),
        }
    }

    pub fn analytics(&self) -> AnalyticsParams {
        AnalyticsParams {
            period: self.period.clone(),
            group_by: self.group_by.clone(),
        }
    }
}

/// Request body for `POST /tenant/api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct TenantCreateLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,
    #[validate(length(min = 3, max = 20, message = "Alias must be 3-20 characters"))]
    pub custom_alias: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 255))]
    pub domain: String,
    /// Display name shown in the admin panel.
    #[validate(length(max = 255))]
    pub user_name: Option<String>,
}

impl TenantCreateLinkRequest {
    pub fn identity(&self) -> TenantIdentity {
        TenantIdentity {
            user_id: self.user_id.clone(),
            domain: self.domain.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TenantShortenResponse {
    pub id: i64,
    pub short_url: String,
    pub short_code: String,
    pub original_url: String,
    pub existing: bool,
}

#[derive(Debug, Serialize)]
pub struct TenantLinkItem {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
    pub created_at: DateTime<Utc>,
    pub clicks_count: i64,
    pub unique_clicks_count: i64,
    pub is_active: bool,
}

impl TenantLinkItem {
    pub fn new(link: Link, short_url: String) -> Self {
        Self {
            id: link.id,
            short_code: link.code,
            original_url: link.original_url,
            short_url,
            created_at: link.created_at,
            clicks_count: link.clicks_count,
            unique_clicks_count: link.unique_clicks_count,
            is_active: link.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TenantLinkListResponse {
    pub items: Vec<TenantLinkItem>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}
