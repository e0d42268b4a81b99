//! Click entity and the unique-visitor key derived from it.

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};

/// A recorded redirect. Immutable once committed.
#[derive(Debug, Clone)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
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

/// Input data for recording a click.
///
/// `is_unique` is the deduplicator's verdict before insertion; storage may
/// still downgrade it when a concurrent request claims the visit first.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub link_id: i64,
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

/// Identity of one visitor of one link on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitorKey {
    pub link_id: i64,
    pub ip_address: String,
    pub user_agent_hash: String,
    pub visit_date: NaiveDate,
}

impl VisitorKey {
    /// Builds the key for a visit at `at`. A missing user agent hashes as
    /// the empty string.
    pub fn new(link_id: i64, ip_address: &str, user_agent: Option<&str>, at: DateTime<Utc>) -> Self {
        Self {
            link_id,
            ip_address: ip_address.to_string(),
            user_agent_hash: hash_user_agent(user_agent.unwrap_or("")),
            visit_date: at.date_naive(),
        }
    }
}

/// Lowercase hex SHA-256 of a user agent string.
pub fn hash_user_agent(user_agent: &str) -> String {
    hex::encode(Sha256::digest(user_agent.as_bytes()))
}
