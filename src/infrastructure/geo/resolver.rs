//! Cached, fail-open location resolver.

use std::net::IpAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use ipnet::IpNet;
use moka::future::Cache;
use tracing::{debug, info};

use super::{GeoError, GeoLookup, IpApiClient};
use crate::config::Config;
use crate::domain::geo::{GeoData, GeoLocator};

/// Ranges that are never sent to the provider.
static PRIVATE_NETWORKS: LazyLock<Vec<IpNet>> = LazyLock::new(|| {
    [
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "169.254.0.0/16",
        "127.0.0.0/8",
        "::1/128",
        "fc00::/7",
        "fe80::/10",
    ]
    .iter()
    .filter_map(|net| net.parse().ok())
    .collect()
});

/// Returns true for loopback, private, link-local and unspecified
/// addresses, including IPv4-mapped IPv6 forms of them.
pub fn is_private_ip(ip: IpAddr) -> bool {
    let ip = match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    };

    ip.is_unspecified() || PRIVATE_NETWORKS.iter().any(|net| net.contains(&ip))
}

/// Resolves client addresses with a bounded per-process cache.
///
/// - private or unparseable addresses resolve to [`GeoData::unknown`] without a lookup
/// - each lookup is cut off after `timeout`
/// - results, including failures, are cached for the TTL; concurrent misses
///   for one address share a single lookup
pub struct GeoResolver {
    lookup: Option<Arc<dyn GeoLookup>>,
    cache: Cache<IpAddr, GeoData>,
    timeout: Duration,
}

impl GeoResolver {
    pub fn new(
        lookup: Arc<dyn GeoLookup>,
        capacity: u64,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self {
            lookup: Some(lookup),
            cache,
            timeout,
        }
    }

    /// A resolver that answers [`GeoData::unknown`] for every address.
    pub fn disabled() -> Self {
        Self {
            lookup: None,
            cache: Cache::new(0),
            timeout: Duration::ZERO,
        }
    }

    /// Builds the resolver described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, GeoError> {
        if !config.geoip_enabled {
            info!("Geo lookup disabled");
            return Ok(Self::disabled());
        }

        let timeout = Duration::from_millis(config.geoip_timeout_ms);
        let client = IpApiClient::new(config.geoip_api_url.clone(), timeout)?;
        info!(provider = client.name(), "Geo lookup enabled");

        Ok(Self::new(
            Arc::new(client),
            config.geoip_cache_capacity,
            Duration::from_secs(config.geoip_cache_ttl_seconds),
            timeout,
        ))
    }

    async fn fetch(&self, lookup: &dyn GeoLookup, ip: IpAddr) -> GeoData {
        match tokio::time::timeout(self.timeout, lookup.lookup(ip)).await {
            Ok(Ok(geo)) => geo,
            Ok(Err(e)) => {
                debug!(%ip, error = %e, "Geo lookup failed");
                GeoData::unknown()
            }
            Err(_) => {
                debug!(%ip, timeout_ms = self.timeout.as_millis() as u64, "Geo lookup timed out");
                GeoData::unknown()
            }
        }
    }
}

#[async_trait]
impl GeoLocator for GeoResolver {
    async fn locate(&self, ip: &str) -> GeoData {
        let Some(lookup) = self.lookup.as_deref() else {
            return GeoData::unknown();
        };

        let Ok(addr) = ip.parse::<IpAddr>() else {
            return GeoData::unknown();
        };

        if is_private_ip(addr) {
            return GeoData::unknown();
        }

        self.cache
            .get_with(addr, self.fetch(lookup, addr))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::geo::MockGeoLookup;

    fn berlin() -> GeoData {
        GeoData {
            country_code: Some("DE".to_string()),
            country_name: Some("Germany".to_string()),
            city: Some("Berlin".to_string()),
        }
    }

    fn resolver(lookup: MockGeoLookup) -> GeoResolver {
        GeoResolver::new(
            Arc::new(lookup),
            100,
            Duration::from_secs(60),
            Duration::from_millis(500),
        )
    }

    #[test]
    fn test_private_ranges() {
        for ip in [
            "10.1.2.3",
            "172.20.0.1",
            "192.168.1.1",
            "169.254.10.10",
            "127.0.0.1",
            "0.0.0.0",
            "::1",
            "fd12:3456::1",
            "fe80::1",
            "::ffff:192.168.1.1",
        ] {
            assert!(is_private_ip(ip.parse().unwrap()), "{ip} should be private");
        }

        for ip in ["8.8.8.8", "172.32.0.1", "2001:4860:4860::8888"] {
            assert!(!is_private_ip(ip.parse().unwrap()), "{ip} should be public");
        }
    }

    #[tokio::test]
    async fn test_private_ip_never_calls_provider() {
        let mut lookup = MockGeoLookup::new();
        lookup.expect_lookup().times(0);

        let resolver = resolver(lookup);

        assert!(resolver.locate("192.168.1.1").await.is_unknown());
        assert!(resolver.locate("10.0.0.7").await.is_unknown());
        assert!(resolver.locate("::1").await.is_unknown());
    }

    #[tokio::test]
    async fn test_unparseable_ip_is_unknown() {
        let mut lookup = MockGeoLookup::new();
        lookup.expect_lookup().times(0);

        let resolver = resolver(lookup);
        assert!(resolver.locate("unknown").await.is_unknown());
    }

    #[tokio::test]
    async fn test_results_are_cached() {
        let mut lookup = MockGeoLookup::new();
        lookup
            .expect_lookup()
            .withf(|ip| *ip == "8.8.8.8".parse::<IpAddr>().unwrap())
            .times(1)
            .returning(|_| Ok(berlin()));

        let resolver = resolver(lookup);

        assert_eq!(resolver.locate("8.8.8.8").await, berlin());
        assert_eq!(resolver.locate("8.8.8.8").await, berlin());
    }

    #[tokio::test]
    async fn test_provider_failure_is_unknown() {
        let mut lookup = MockGeoLookup::new();
        lookup
            .expect_lookup()
            .times(1)
            .returning(|_| Err(GeoError::Status(503)));

        let resolver = resolver(lookup);

        assert!(resolver.locate("1.1.1.1").await.is_unknown());
        // Failure is cached too.
        assert!(resolver.locate("1.1.1.1").await.is_unknown());
    }

    struct SlowLookup;

    #[async_trait]
    impl GeoLookup for SlowLookup {
        async fn lookup(&self, _ip: IpAddr) -> Result<GeoData, GeoError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(berlin())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_timeout_yields_unknown() {
        let resolver = GeoResolver::new(
            Arc::new(SlowLookup),
            100,
            Duration::from_secs(60),
            Duration::from_millis(20),
        );

        let started = std::time::Instant::now();
        assert!(resolver.locate("9.9.9.9").await.is_unknown());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_disabled_resolver() {
        let resolver = GeoResolver::disabled();
        assert!(resolver.locate("8.8.8.8").await.is_unknown());
    }
}
