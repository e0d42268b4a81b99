//! Client location lookup contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Location of a client address. All fields are `None` when the address is
/// private or the lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoData {
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub city: Option<String>,
}

impl GeoData {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.country_code.is_none() && self.country_name.is_none() && self.city.is_none()
    }
}

/// Resolves client addresses to locations. Never fails: errors degrade to
/// [`GeoData::unknown`].
///
/// # Implementations
///
/// - [`crate::infrastructure::geo::GeoResolver`] - cached HTTP lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, ip: &str) -> GeoData;
}
