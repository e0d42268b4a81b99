//! Client address blacklist management.

use std::net::IpAddr;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::entities::BlacklistEntry;
use crate::domain::repositories::BlacklistRepository;
use crate::error::AppError;

pub const DEFAULT_BLOCK_REASON: &str = "Spam/abuse";

pub struct BlacklistService {
    repository: Arc<dyn BlacklistRepository>,
}

impl BlacklistService {
    pub fn new(repository: Arc<dyn BlacklistRepository>) -> Self {
        Self { repository }
    }

    /// Blocks `ip` from creating links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `ip` is not an IP address and
    /// [`AppError::Conflict`] if it is already blocked.
    pub async fn block(&self, ip: &str, reason: Option<String>) -> Result<BlacklistEntry, AppError> {
        let ip = parse_ip(ip)?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_BLOCK_REASON.to_string());

        let entry = self
            .repository
            .add(&ip, Some(reason))
            .await
            .map_err(|e| match e {
                AppError::Conflict { .. } => {
                    AppError::conflict("IP already blacklisted", json!({ "ip": ip }))
                }
                other => other,
            })?;

        info!(ip = %entry.ip_address, reason = ?entry.reason, "Blacklisted address");
        Ok(entry)
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if `ip` is not blocked.
    pub async fn unblock(&self, ip: &str) -> Result<(), AppError> {
        let ip = parse_ip(ip)?;

        if !self.repository.remove(&ip).await? {
            return Err(AppError::not_found(
                "IP not in blacklist",
                json!({ "ip": ip }),
            ));
        }

        info!(ip = %ip, "Removed address from blacklist");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<BlacklistEntry>, AppError> {
        self.repository.list().await
    }
}

/// Canonical text form of an address, so `::FFFF:1.2.3.4`-style variants
/// compare equal to what the request extractor stores.
fn parse_ip(raw: &str) -> Result<String, AppError> {
    raw.trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| AppError::bad_request("Invalid IP address", json!({ "ip": raw })))
}
