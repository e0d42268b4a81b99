//! Tenant users of the embedded cabinet and blacklisted client addresses.

use chrono::{DateTime, Utc};

/// A user of an external portal that owns links through the tenant API.
///
/// Identified by the pair (`external_user_id`, `external_domain`).
#[derive(Debug, Clone, PartialEq)]
pub struct TenantUser {
    pub id: i64,
    pub external_user_id: String,
    pub external_domain: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TenantUser {
    /// Value stored in `links.created_by` for links this tenant creates.
    pub fn created_by(&self) -> String {
        format!("tenant:{}@{}", self.external_user_id, self.external_domain)
    }
}

/// A tenant together with the number of links it owns.
#[derive(Debug, Clone)]
pub struct TenantSummary {
    pub tenant: TenantUser,
    pub links_count: i64,
}

/// A blocked client address.
#[derive(Debug, Clone, PartialEq)]
pub struct BlacklistEntry {
    pub id: i64,
    pub ip_address: String,
    pub reason: Option<String>,
    pub blocked_at: DateTime<Utc>,
}
