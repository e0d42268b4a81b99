//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who a link belongs to.
///
/// Drives URL deduplication: a shorten request only reuses links of the
/// same kind (and, for tenants, the same owner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Anonymous,
    Tenant,
    Admin,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Anonymous => "anonymous",
            OwnerKind::Tenant => "tenant",
            OwnerKind::Admin => "admin",
        }
    }

    /// Parses the stored column value. Unknown values fall back to `Anonymous`;
    /// the table's CHECK constraint keeps them from appearing.
    pub fn from_db(value: &str) -> Self {
        match value {
            "tenant" => OwnerKind::Tenant,
            "admin" => OwnerKind::Admin,
            _ => OwnerKind::Anonymous,
        }
    }
}

/// Ownership scope of a new or deduplicated link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Anonymous,
    Admin,
    Tenant(i64),
}

impl Owner {
    pub fn kind(&self) -> OwnerKind {
        match self {
            Owner::Anonymous => OwnerKind::Anonymous,
            Owner::Admin => OwnerKind::Admin,
            Owner::Tenant(_) => OwnerKind::Tenant,
        }
    }

    pub fn owner_id(&self) -> Option<i64> {
        match self {
            Owner::Tenant(id) => Some(*id),
            _ => None,
        }
    }
}

/// A shortened URL with its click counters.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: i64,
    /// Always stored lower-cased.
    pub code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub clicks_count: i64,
    pub unique_clicks_count: i64,
    pub is_active: bool,
    pub owner_id: Option<i64>,
    pub owner_kind: OwnerKind,
}

impl Link {
    /// Returns true when `owner` may see and manage this link.
    pub fn is_owned_by(&self, owner: Owner) -> bool {
        self.owner_kind == owner.kind() && self.owner_id == owner.owner_id()
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub code: String,
    pub original_url: String,
    pub created_by: Option<String>,
    pub owner: Owner,
}

/// Partial update for an existing link. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub original_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Filters for link listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkFilter {
    /// Case-insensitive substring of the code or the original URL.
    pub search: Option<String>,
    pub active_only: bool,
    pub owner_kind: Option<OwnerKind>,
    pub owner_id: Option<i64>,
}

impl LinkFilter {
    /// Filter matching every link of one tenant.
    pub fn for_tenant(owner_id: i64) -> Self {
        Self {
            owner_kind: Some(OwnerKind::Tenant),
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }
}

/// A link joined with the tenant that owns it, if any.
#[derive(Debug, Clone)]
pub struct LinkWithOwner {
    pub link: Link,
    pub owner_name: Option<String>,
    pub owner_domain: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_link(id: i64, code: &str, url: &str) -> Link {
    Link {
        id,
        code: code.to_string(),
        original_url: url.to_string(),
        created_at: Utc::now(),
        created_by: Some("203.0.113.9".to_string()),
        clicks_count: 0,
        unique_clicks_count: 0,
        is_active: true,
        owner_id: None,
        owner_kind: OwnerKind::Anonymous,
    }
}
