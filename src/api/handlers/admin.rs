//! Handlers for the admin API (`/admin/*`).
//!
//! All routes sit behind Bearer token authentication, see
//! [`crate::api::middleware::auth`].

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::api::dto::link::{
    AdminLinkItem, BlacklistItem, BlockQuery, ClickHistoryResponse, ClickItem, LinkListQuery,
    LinkResponse, MessageResponse, OverviewResponse, TenantItem, ToggleResponse, TopLinkItem,
    UpdateLinkRequest,
};
use crate::api::dto::pagination::{AnalyticsParams, OffsetParams};
use crate::api::dto::shorten::ShortenRequest;
use crate::application::services::ShortenCommand;
use crate::domain::analytics::AnalyticsReport;
use crate::domain::entities::{Link, Owner};
use crate::error::AppError;
use crate::state::AppState;

fn link_response(state: &AppState, link: Link) -> LinkResponse {
    let short_url = state.link_service.short_url(&link.code);
    LinkResponse::new(link, short_url)
}

/// Lists links with filtering and pagination.
///
/// # Endpoint
///
/// `GET /admin/links?skip=0&limit=100&search=promo&active_only=true&owner_kind=tenant&owner_id=3`
///
/// `search` matches the short code or the original URL case-insensitively.
/// Results are ordered newest first.
pub async fn list_links_handler(
    State(state): State<AppState>,
    Query(query): Query<LinkListQuery>,
) -> Result<Json<Vec<AdminLinkItem>>, AppError> {
    let (offset, limit) = query.paging().offset_limit()?;

    let rows = state
        .link_service
        .list_links(&query.filter(), offset, limit)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| {
            let short_url = state.link_service.short_url(&row.link.code);
            AdminLinkItem::new(row, short_url)
        })
        .collect();

    Ok(Json(items))
}

/// Creates a link owned by the admin.
///
/// # Endpoint
///
/// `POST /admin/links`
///
/// Deduplicates among active admin links only.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let result = state
        .link_service
        .shorten(ShortenCommand {
            url: payload.url,
            custom_alias: payload.custom_alias,
            owner: Owner::Admin,
            created_by: Some("admin".to_string()),
        })
        .await?;

    Ok(Json(link_response(&state, result.link)))
}

/// `GET /admin/links/{id}`
pub async fn get_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(id).await?;
    Ok(Json(link_response(&state, link)))
}

/// Updates the target URL and/or the active flag.
///
/// # Endpoint
///
/// `PUT /admin/links/{id}`
///
/// # Errors
///
/// Returns 400 if the new URL fails validation, 404 if the link is missing.
pub async fn update_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state.link_service.update_link(id, payload.into()).await?;
    Ok(Json(link_response(&state, link)))
}

/// Deletes a link together with its clicks.
///
/// # Endpoint
///
/// `DELETE /admin/links/{id}`
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.link_service.delete_link(id).await?;
    Ok(Json(MessageResponse::new("Link deleted successfully")))
}

/// `PATCH /admin/links/{id}/toggle`
pub async fn toggle_link_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ToggleResponse>, AppError> {
    let link = state.link_service.toggle_link(id).await?;
    let verb = if link.is_active { "activated" } else { "deactivated" };

    Ok(Json(ToggleResponse {
        message: format!("Link {verb}"),
        is_active: link.is_active,
    }))
}

/// Raw click history of a link, newest first.
///
/// # Endpoint
///
/// `GET /admin/links/{id}/clicks?limit=100&offset=0`
pub async fn link_clicks_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<OffsetParams>,
) -> Result<Json<ClickHistoryResponse>, AppError> {
    let (offset, limit) = params.offset_limit()?;
    let link = state.link_service.get_link(id).await?;

    let page = state
        .analytics_service
        .click_history(link.id, limit, offset)
        .await?;

    Ok(Json(ClickHistoryResponse {
        link_id: link.id,
        total: page.total,
        limit,
        offset,
        clicks: page.clicks.into_iter().map(ClickItem::from).collect(),
    }))
}

/// Aggregated analytics of a link.
///
/// # Endpoint
///
/// `GET /admin/links/{id}/analytics?period=7d&group_by=day`
///
/// `period` is one of `24h`, `7d`, `30d`, `90d`, `all`; `group_by` one of
/// `hour`, `day`, `week`, `month`.
pub async fn link_analytics_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let (period, group_by) = params.parse()?;
    let link = state.link_service.get_link(id).await?;

    let report = state
        .analytics_service
        .report(&link, period, group_by)
        .await?;

    Ok(Json(report))
}

/// Totals across all links plus the most clicked ones.
///
/// # Endpoint
///
/// `GET /admin/stats/overview`
pub async fn overview_handler(
    State(state): State<AppState>,
) -> Result<Json<OverviewResponse>, AppError> {
    let overview = state.link_service.overview().await?;

    let top_links = overview
        .top_links
        .into_iter()
        .map(|link| TopLinkItem {
            short_url: state.link_service.short_url(&link.code),
            short_code: link.code,
            original_url: link.original_url,
            clicks_count: link.clicks_count,
            unique_clicks_count: link.unique_clicks_count,
        })
        .collect();

    Ok(Json(OverviewResponse {
        total_links: overview.total_links,
        active_links: overview.active_links,
        total_clicks: overview.total_clicks,
        total_unique_clicks: overview.total_unique_clicks,
        top_links,
    }))
}

/// `GET /admin/tenants`
pub async fn list_tenants_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<TenantItem>>, AppError> {
    let tenants = state.tenant_service.list_tenants().await?;

    let items = tenants
        .into_iter()
        .map(|summary| TenantItem {
            id: summary.tenant.id,
            external_user_id: summary.tenant.external_user_id,
            external_domain: summary.tenant.external_domain,
            name: summary.tenant.name,
            created_at: summary.tenant.created_at,
            links_count: summary.links_count,
        })
        .collect();

    Ok(Json(items))
}

/// Blocks an address from the public shorten endpoint.
///
/// # Endpoint
///
/// `POST /admin/blacklist/{ip}?reason=spam`
///
/// # Errors
///
/// Returns 400 if the address is malformed or already blocked.
pub async fn block_ip_handler(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Query(query): Query<BlockQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let entry = state.blacklist_service.block(&ip, query.reason).await?;
    Ok(Json(MessageResponse::new(format!(
        "IP {} added to blacklist",
        entry.ip_address
    ))))
}

/// `DELETE /admin/blacklist/{ip}`
pub async fn unblock_ip_handler(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.blacklist_service.unblock(&ip).await?;
    Ok(Json(MessageResponse::new(format!(
        "IP {ip} removed from blacklist"
    ))))
}

/// `GET /admin/blacklist`
pub async fn list_blacklist_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlacklistItem>>, AppError> {
    let entries = state.blacklist_service.list().await?;

    let items = entries
        .into_iter()
        .map(|e| BlacklistItem {
            id: e.id,
            ip_address: e.ip_address,
            reason: e.reason,
            blocked_at: e.blocked_at,
        })
        .collect();

    Ok(Json(items))
}
