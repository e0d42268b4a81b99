//! DTOs for the admin link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::api::dto::pagination::OffsetParams;
use crate::domain::entities::{Click, Link, LinkFilter, LinkPatch, LinkWithOwner, OwnerKind};

/// Full view of a link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub clicks_count: i64,
    pub unique_clicks_count: i64,
    pub is_active: bool,
    pub owner_kind: OwnerKind,
    pub owner_id: Option<i64>,
}

impl LinkResponse {
    pub fn new(link: Link, short_url: String) -> Self {
        Self {
            id: link.id,
            short_code: link.code,
            original_url: link.original_url,
            short_url,
            created_at: link.created_at,
            created_by: link.created_by,
            clicks_count: link.clicks_count,
            unique_clicks_count: link.unique_clicks_count,
            is_active: link.is_active,
            owner_kind: link.owner_kind,
            owner_id: link.owner_id,
        }
    }
}

/// Row of the admin link list, with the owning tenant's name and domain.
#[derive(Debug, Serialize)]
pub struct AdminLinkItem {
    #[serde(flatten)]
    pub link: LinkResponse,
    pub owner_name: Option<String>,
    pub owner_domain: Option<String>,
}

impl AdminLinkItem {
    pub fn new(row: LinkWithOwner, short_url: String) -> Self {
        Self {
            link: LinkResponse::new(row.link, short_url),
            owner_name: row.owner_name,
            owner_domain: row.owner_domain,
        }
    }
}

/// Query for `GET /admin/links`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct LinkListQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub skip: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,

    pub search: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub active_only: Option<bool>,

    pub owner_kind: Option<OwnerKind>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub owner_id: Option<i64>,
}

impl LinkListQuery {
    pub fn paging(&self) -> OffsetParams {
        OffsetParams {
            offset: self.skip,
            limit: self.limit,
        }
    }

    pub fn filter(&self) -> LinkFilter {
        LinkFilter {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            active_only: self.active_only.unwrap_or(false),
            owner_kind: self.owner_kind,
            owner_id: self.owner_id,
        }
    }
}

/// Request body for `PUT /admin/links/{id}`. Absent fields are unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub original_url: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        LinkPatch {
            original_url: req.original_url,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub message: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One entry of a link's click history.
#[derive(Debug, Serialize)]
pub struct ClickItem {
    pub id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub city: Option<String>,
    pub is_unique: bool,
    pub is_qr_click: bool,
    pub device_os: Option<String>,
}

impl From<Click> for ClickItem {
    fn from(c: Click) -> Self {
        Self {
            id: c.id,
            clicked_at: c.clicked_at,
            ip_address: c.ip_address,
            user_agent: c.user_agent,
            referer: c.referer,
            country_code: c.country_code,
            country_name: c.country_name,
            city: c.city,
            is_unique: c.is_unique,
            is_qr_click: c.is_qr_click,
            device_os: c.device_os,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClickHistoryResponse {
    pub link_id: i64,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub clicks: Vec<ClickItem>,
}

/// Entry of the overview's top-links list.
#[derive(Debug, Serialize)]
pub struct TopLinkItem {
    pub short_code: String,
    pub original_url: String,
    pub clicks_count: i64,
    pub unique_clicks_count: i64,
    pub short_url: String,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub total_links: i64,
    pub active_links: i64,
    pub total_clicks: i64,
    pub total_unique_clicks: i64,
    pub top_links: Vec<TopLinkItem>,
}

#[derive(Debug, Serialize)]
pub struct TenantItem {
    pub id: i64,
    pub external_user_id: String,
    pub external_domain: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub links_count: i64,
}

#[derive(Debug, Serialize)]
pub struct BlacklistItem {
    pub id: i64,
    pub ip_address: String,
    pub reason: Option<String>,
    pub blocked_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlockQuery {
    pub reason: Option<String>,
}
