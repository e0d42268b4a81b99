//! Handlers for the tenant cabinet API (`/tenant/api/*`).
//!
//! The host portal passes the caller as `user_id` + `domain`. Links of
//! other owners are always reported as not found.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::api::dto::tenant::{
    DeleteResponse, TenantAnalyticsQuery, TenantCreateLinkRequest, TenantLinkItem,
    TenantLinkListResponse, TenantListQuery, TenantQuery, TenantShortenResponse,
};
use crate::domain::analytics::AnalyticsReport;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /tenant/api/links?user_id=42&domain=corp.example.com&page=1&per_page=20`
///
/// An unknown caller is registered on first use and gets an empty list.
pub async fn list_links_handler(
    State(state): State<AppState>,
    Query(query): Query<TenantListQuery>,
) -> Result<Json<TenantLinkListResponse>, AppError> {
    query.validate()?;
    let (page, per_page) = query.paging().page_and_size()?;

    let result = state
        .tenant_service
        .list_links(&query.identity(), page, per_page)
        .await?;

    let items = result
        .links
        .into_iter()
        .map(|link| {
            let short_url = state.link_service.short_url(&link.code);
            TenantLinkItem::new(link, short_url)
        })
        .collect();

    Ok(Json(TenantLinkListResponse {
        items,
        total: result.total,
        page: result.page,
        per_page: result.per_page,
    }))
}

/// Creates a link owned by the caller.
///
/// # Endpoint
///
/// `POST /tenant/api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com",
///   "custom_alias": "promo",
///   "user_id": "42",
///   "domain": "corp.example.com",
///   "user_name": "Jane Doe"
/// }
/// ```
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<TenantCreateLinkRequest>,
) -> Result<Json<TenantShortenResponse>, AppError> {
    payload.validate()?;
    let identity = payload.identity();

    let result = state
        .tenant_service
        .create_link(&identity, payload.user_name, payload.url, payload.custom_alias)
        .await?;

    let link = result.link;
    Ok(Json(TenantShortenResponse {
        id: link.id,
        short_url: state.link_service.short_url(&link.code),
        short_code: link.code,
        original_url: link.original_url,
        existing: result.existing,
    }))
}

/// `DELETE /tenant/api/links/{id}?user_id=..&domain=..`
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    query.validate()?;

    state
        .tenant_service
        .delete_link(&query.identity(), id)
        .await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "Link deleted successfully".to_string(),
    }))
}

/// `GET /tenant/api/links/{id}/analytics?user_id=..&domain=..&period=7d&group_by=day`
pub async fn link_analytics_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TenantAnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, AppError> {
    query.validate()?;
    let (period, group_by) = query.analytics().parse()?;

    let report = state
        .tenant_service
        .link_analytics(&query.identity(), id, period, group_by)
        .await?;

    Ok(Json(report))
}
