//! Link creation, lookup and administration.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::domain::entities::{Link, LinkFilter, LinkPatch, LinkWithOwner, NewLink, Owner};
use crate::domain::repositories::{BlacklistRepository, LinkOverview, LinkRepository};
use crate::error::AppError;
use crate::utils::code_generator::{
    MAX_ATTEMPTS_PER_LENGTH, MAX_CODE_LENGTH, random_code, validate_alias,
};
use crate::utils::db_error::is_code_conflict;
use crate::utils::url_validator::validate_url;

/// Inserts retried when a concurrent request takes a generated code between
/// the availability check and the insert.
const INSERT_RACE_RETRIES: usize = 5;

/// Number of links in the admin overview.
const OVERVIEW_TOP_LINKS: i64 = 10;

/// A request to shorten a URL on behalf of some owner.
#[derive(Debug, Clone)]
pub struct ShortenCommand {
    pub url: String,
    pub custom_alias: Option<String>,
    pub owner: Owner,
    /// Stored in `links.created_by`: client IP, tenant tag or `admin`.
    pub created_by: Option<String>,
}

/// Result of a shorten call. `existing` is set when an active link of the
/// same owner already pointed at the URL and was returned instead.
#[derive(Debug, Clone)]
pub struct Shortened {
    pub link: Link,
    pub existing: bool,
}

/// Service for creating, resolving and managing short links.
///
/// Handles URL validation, owner-scoped deduplication, alias checks and
/// collision-free code generation. The unique index on `lower(code)` is the
/// final arbiter; losing an insert race on a generated code retries with a
/// fresh candidate, losing it on an alias reports the alias as taken.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    blacklist: Arc<dyn BlacklistRepository>,
    base_url: String,
    code_length: usize,
}

impl LinkService {
    /// Creates a new link service.
    ///
    /// # Arguments
    ///
    /// - `base_url` - public origin without a trailing slash
    /// - `code_length` - initial length of generated codes
    pub fn new(
        links: Arc<dyn LinkRepository>,
        blacklist: Arc<dyn BlacklistRepository>,
        base_url: impl Into<String>,
        code_length: usize,
    ) -> Self {
        Self {
            links,
            blacklist,
            base_url: base_url.into(),
            code_length,
        }
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    /// URL encoded into QR images; redirects through the QR-tracking path.
    pub fn qr_target_url(&self, code: &str) -> String {
        format!("{}/q/{}", self.base_url, code)
    }

    /// Shortens a URL from the public form.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] if `client_ip` is blacklisted, and
    /// everything [`Self::shorten`] returns.
    pub async fn shorten_public(
        &self,
        url: String,
        custom_alias: Option<String>,
        client_ip: &str,
    ) -> Result<Shortened, AppError> {
        if self.blacklist.is_blacklisted(client_ip).await? {
            info!(ip = client_ip, "Rejected shorten from blacklisted address");
            return Err(AppError::forbidden(
                "Access denied. Your IP has been blocked.",
                json!({ "ip": client_ip }),
            ));
        }

        self.shorten(ShortenCommand {
            url,
            custom_alias,
            owner: Owner::Anonymous,
            created_by: Some(client_ip.to_string()),
        })
        .await
    }

    /// Creates a short link, or returns the owner's existing active link for
    /// the same URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - the URL is invalid, internal or looks like spam
    /// - the alias is invalid
    ///
    /// Returns [`AppError::Conflict`] if the alias is taken.
    ///
    /// Returns [`AppError::Exhausted`] if no free code could be generated.
    pub async fn shorten(&self, cmd: ShortenCommand) -> Result<Shortened, AppError> {
        let original_url = validate_url(&cmd.url)?;

        if let Some(link) = self
            .links
            .find_active_by_url(&original_url, cmd.owner)
            .await?
        {
            debug!(code = %link.code, owner = ?cmd.owner, "Returning existing link");
            return Ok(Shortened {
                link,
                existing: true,
            });
        }

        let template = NewLink {
            code: String::new(),
            original_url,
            created_by: cmd.created_by,
            owner: cmd.owner,
        };

        let link = match cmd.custom_alias.as_deref().filter(|a| !a.is_empty()) {
            Some(alias) => self.create_with_alias(alias, template).await?,
            None => self.create_with_generated_code(template).await?,
        };

        info!(code = %link.code, owner_kind = link.owner_kind.as_str(), "Created short link");

        Ok(Shortened {
            link,
            existing: false,
        })
    }

    async fn create_with_alias(&self, alias: &str, template: NewLink) -> Result<Link, AppError> {
        let code = validate_alias(alias)?;

        if self.links.code_exists(&code).await? {
            return Err(alias_taken(alias));
        }

        self.links
            .create(NewLink { code, ..template })
            .await
            .map_err(|e| if is_code_conflict(&e) { alias_taken(alias) } else { e })
    }

    async fn create_with_generated_code(&self, template: NewLink) -> Result<Link, AppError> {
        for attempt in 1..=INSERT_RACE_RETRIES {
            let code = self.generate_unique_code().await?;

            match self
                .links
                .create(NewLink {
                    code,
                    ..template.clone()
                })
                .await
            {
                Err(e) if is_code_conflict(&e) => {
                    warn!(attempt, "Code collision on insert, retrying");
                }
                other => return other,
            }
        }

        error!(attempts = INSERT_RACE_RETRIES, "Gave up inserting a generated code");
        Err(AppError::exhausted(
            "Failed to generate unique short code",
            json!({ "reason": "Too many collisions on insert" }),
        ))
    }

    /// Finds a free code: [`MAX_ATTEMPTS_PER_LENGTH`] random candidates per
    /// length, growing from the configured length up to [`MAX_CODE_LENGTH`].
    async fn generate_unique_code(&self) -> Result<String, AppError> {
        for length in self.code_length..=MAX_CODE_LENGTH {
            for _ in 0..MAX_ATTEMPTS_PER_LENGTH {
                let code = random_code(length);

                if !self.links.code_exists(&code).await? {
                    return Ok(code);
                }
            }

            debug!(length, "Code space crowded, growing code length");
        }

        error!(max_length = MAX_CODE_LENGTH, "Short code space exhausted");
        Err(AppError::exhausted(
            "Failed to generate unique short code",
            json!({ "max_length": MAX_CODE_LENGTH }),
        ))
    }

    /// Case-insensitive lookup by short code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        self.links.find_by_code(&code.to_lowercase()).await
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    pub async fn get_link(&self, id: i64) -> Result<Link, AppError> {
        self.links
            .find_by_id(id)
            .await?
            .ok_or_else(|| link_not_found(id))
    }

    /// Returns a link only if `owner` owns it; other links read as missing.
    pub async fn get_owned_link(&self, id: i64, owner: Owner) -> Result<Link, AppError> {
        match self.links.find_by_id(id).await? {
            Some(link) if link.is_owned_by(owner) => Ok(link),
            _ => Err(AppError::not_found(
                "Link not found or you don't have permission to access it",
                json!({ "id": id }),
            )),
        }
    }

    pub async fn list_links(
        &self,
        filter: &LinkFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<LinkWithOwner>, AppError> {
        self.links.list(filter, offset, limit).await
    }

    pub async fn count_links(&self, filter: &LinkFilter) -> Result<i64, AppError> {
        self.links.count(filter).await
    }

    /// Applies an admin edit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the new URL is invalid and
    /// [`AppError::NotFound`] if the link does not exist.
    pub async fn update_link(&self, id: i64, mut patch: LinkPatch) -> Result<Link, AppError> {
        if let Some(url) = patch.original_url.take() {
            patch.original_url = Some(validate_url(&url)?);
        }

        let link = self
            .links
            .update(id, patch)
            .await?
            .ok_or_else(|| link_not_found(id))?;

        info!(id, code = %link.code, is_active = link.is_active, "Updated link");
        Ok(link)
    }

    /// Flips `is_active` and returns the updated link.
    pub async fn toggle_link(&self, id: i64) -> Result<Link, AppError> {
        let link = self.get_link(id).await?;

        self.update_link(
            id,
            LinkPatch {
                is_active: Some(!link.is_active),
                ..LinkPatch::default()
            },
        )
        .await
    }

    /// Deletes a link; clicks and visitor rows cascade.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn delete_link(&self, id: i64) -> Result<(), AppError> {
        if !self.links.delete(id).await? {
            return Err(link_not_found(id));
        }

        info!(id, "Deleted link");
        Ok(())
    }

    /// Deletes a link only if `owner` owns it.
    pub async fn delete_owned_link(&self, id: i64, owner: Owner) -> Result<(), AppError> {
        self.get_owned_link(id, owner).await?;
        self.delete_link(id).await
    }

    pub async fn overview(&self) -> Result<LinkOverview, AppError> {
        self.links.overview(OVERVIEW_TOP_LINKS).await
    }

    /// Round-trips to the database for health checks.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.links.ping().await
    }
}

fn alias_taken(alias: &str) -> AppError {
    AppError::conflict(
        format!("Alias '{alias}' is already taken"),
        json!({ "alias": alias }),
    )
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OwnerKind;
    use crate::domain::entities::link::sample_link;
    use crate::domain::repositories::{MockBlacklistRepository, MockLinkRepository};
    use crate::utils::db_error::LINK_CODE_CONSTRAINT;
    use std::sync::Mutex;

    fn service(links: MockLinkRepository) -> LinkService {
        service_with_blacklist(links, MockBlacklistRepository::new())
    }

    fn service_with_blacklist(
        links: MockLinkRepository,
        blacklist: MockBlacklistRepository,
    ) -> LinkService {
        LinkService::new(Arc::new(links), Arc::new(blacklist), "https://sho.rt", 5)
    }

    fn anonymous(url: &str, alias: Option<&str>) -> ShortenCommand {
        ShortenCommand {
            url: url.to_string(),
            custom_alias: alias.map(str::to_string),
            owner: Owner::Anonymous,
            created_by: Some("203.0.113.9".to_string()),
        }
    }

    fn code_conflict() -> AppError {
        AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": LINK_CODE_CONSTRAINT }),
        )
    }

    fn created(new_link: &NewLink) -> Link {
        let mut link = sample_link(10, &new_link.code, &new_link.original_url);
        link.owner_kind = new_link.owner.kind();
        link.owner_id = new_link.owner.owner_id();
        link.created_by = new_link.created_by.clone();
        link
    }

    #[tokio::test]
    async fn test_shorten_generates_code() {
        let mut links = MockLinkRepository::new();

        links
            .expect_find_active_by_url()
            .withf(|url, owner| url == "https://example.com/page" && *owner == Owner::Anonymous)
            .times(1)
            .returning(|_, _| Ok(None));
        links
            .expect_code_exists()
            .times(1)
            .returning(|_| Ok(false));
        links
            .expect_create()
            .withf(|l| {
                l.code.len() == 5
                    && l.code
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                    && l.created_by.as_deref() == Some("203.0.113.9")
            })
            .times(1)
            .returning(|l| Ok(created(&l)));

        let result = service(links)
            .shorten(anonymous("https://example.com/page", None))
            .await
            .unwrap();

        assert!(!result.existing);
        assert_eq!(result.link.original_url, "https://example.com/page");
    }

    #[tokio::test]
    async fn test_shorten_returns_existing_link() {
        let mut links = MockLinkRepository::new();

        links
            .expect_find_active_by_url()
            .times(1)
            .returning(|_, _| Ok(Some(sample_link(3, "abcde", "https://example.com"))));
        links.expect_create().times(0);

        let result = service(links)
            .shorten(anonymous("https://example.com", Some("my-alias")))
            .await
            .unwrap();

        assert!(result.existing);
        assert_eq!(result.link.code, "abcde");
    }

    #[tokio::test]
    async fn test_shorten_dedup_is_scoped_to_tenant() {
        let mut links = MockLinkRepository::new();

        links
            .expect_find_active_by_url()
            .withf(|_, owner| *owner == Owner::Tenant(7))
            .times(1)
            .returning(|_, _| Ok(None));
        links.expect_code_exists().returning(|_| Ok(false));
        links
            .expect_create()
            .withf(|l| l.owner == Owner::Tenant(7))
            .times(1)
            .returning(|l| Ok(created(&l)));

        let result = service(links)
            .shorten(ShortenCommand {
                url: "https://example.com".to_string(),
                custom_alias: None,
                owner: Owner::Tenant(7),
                created_by: Some("tenant:42@corp.example.com".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(result.link.owner_kind, OwnerKind::Tenant);
        assert_eq!(result.link.owner_id, Some(7));
    }

    #[tokio::test]
    async fn test_shorten_rejects_invalid_url() {
        let mut links = MockLinkRepository::new();
        links.expect_find_active_by_url().times(0);

        let err = service(links)
            .shorten(anonymous("ftp://example.com", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_shorten_rejects_internal_host() {
        let links = MockLinkRepository::new();

        let err = service(links)
            .shorten(anonymous("http://localhost:8080/admin", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_shorten_with_alias_stores_lowercase() {
        let mut links = MockLinkRepository::new();

        links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        links
            .expect_code_exists()
            .withf(|code| code == "my-link1")
            .times(1)
            .returning(|_| Ok(false));
        links
            .expect_create()
            .withf(|l| l.code == "my-link1")
            .times(1)
            .returning(|l| Ok(created(&l)));

        let result = service(links)
            .shorten(anonymous("https://example.com", Some("My-Link1")))
            .await
            .unwrap();

        assert_eq!(result.link.code, "my-link1");
    }

    #[tokio::test]
    async fn test_shorten_with_taken_alias() {
        let mut links = MockLinkRepository::new();

        links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        links.expect_code_exists().times(1).returning(|_| Ok(true));
        links.expect_create().times(0);

        let err = service(links)
            .shorten(anonymous("https://example.com", Some("promo")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
        assert!(err.to_string().contains("already taken"));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_alias_race_lost_on_insert_reports_taken() {
        let mut links = MockLinkRepository::new();

        links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        links.expect_code_exists().returning(|_| Ok(false));
        links
            .expect_create()
            .times(1)
            .returning(|_| Err(code_conflict()));

        let err = service(links)
            .shorten(anonymous("https://example.com", Some("promo")))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already taken"));
    }

    #[tokio::test]
    async fn test_reserved_alias_rejected() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        links.expect_code_exists().times(0);

        let err = service(links)
            .shorten(anonymous("https://example.com", Some("admin")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_generated_code_race_retries_with_new_code() {
        let mut links = MockLinkRepository::new();
        let attempts = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = attempts.clone();

        links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        links.expect_code_exists().returning(|_| Ok(false));
        links.expect_create().times(2).returning(move |l| {
            let mut seen = seen.lock().unwrap();
            seen.push(l.code.clone());
            if seen.len() == 1 {
                Err(code_conflict())
            } else {
                Ok(created(&l))
            }
        });

        let result = service(links)
            .shorten(anonymous("https://example.com", None))
            .await
            .unwrap();

        assert_eq!(attempts.lock().unwrap().len(), 2);
        assert!(!result.existing);
    }

    #[tokio::test]
    async fn test_code_length_grows_when_crowded() {
        let mut links = MockLinkRepository::new();
        let checks = Arc::new(Mutex::new(0usize));
        let counter = checks.clone();

        links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        // Every 5-symbol candidate is taken; the first 6-symbol one is free.
        links.expect_code_exists().returning(move |code| {
            *counter.lock().unwrap() += 1;
            Ok(code.len() == 5)
        });
        links
            .expect_create()
            .withf(|l| l.code.len() == 6)
            .times(1)
            .returning(|l| Ok(created(&l)));

        service(links)
            .shorten(anonymous("https://example.com", None))
            .await
            .unwrap();

        assert_eq!(*checks.lock().unwrap(), MAX_ATTEMPTS_PER_LENGTH + 1);
    }

    #[tokio::test]
    async fn test_code_space_exhausted() {
        let mut links = MockLinkRepository::new();

        links
            .expect_find_active_by_url()
            .returning(|_, _| Ok(None));
        links
            .expect_code_exists()
            .times(MAX_ATTEMPTS_PER_LENGTH * 2)
            .returning(|_| Ok(true));
        links.expect_create().times(0);

        let err = service(links)
            .shorten(anonymous("https://example.com", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Exhausted { .. }));
        assert_eq!(
            err.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_shorten_public_blocks_blacklisted_ip() {
        let mut links = MockLinkRepository::new();
        let mut blacklist = MockBlacklistRepository::new();

        blacklist
            .expect_is_blacklisted()
            .withf(|ip| ip == "198.51.100.66")
            .times(1)
            .returning(|_| Ok(true));
        links.expect_find_active_by_url().times(0);

        let err = service_with_blacklist(links, blacklist)
            .shorten_public("https://example.com".to_string(), None, "198.51.100.66")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_find_by_code_is_case_insensitive() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .withf(|code| code == "promo")
            .times(1)
            .returning(|_| Ok(Some(sample_link(1, "promo", "https://example.com"))));

        let link = service(links).find_by_code("PROMO").await.unwrap();
        assert!(link.is_some());
    }

    #[tokio::test]
    async fn test_toggle_flips_active_flag() {
        let mut links = MockLinkRepository::new();

        links
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_link(id, "abcde", "https://example.com"))));
        links
            .expect_update()
            .withf(|id, patch| *id == 4 && patch.is_active == Some(false) && patch.original_url.is_none())
            .times(1)
            .returning(|id, _| {
                let mut link = sample_link(id, "abcde", "https://example.com");
                link.is_active = false;
                Ok(Some(link))
            });

        let link = service(links).toggle_link(4).await.unwrap();
        assert!(!link.is_active);
    }

    #[tokio::test]
    async fn test_update_validates_new_url() {
        let mut links = MockLinkRepository::new();
        links.expect_update().times(0);

        let err = service(links)
            .update_link(
                1,
                LinkPatch {
                    original_url: Some("not a url".to_string()),
                    is_active: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_link() {
        let mut links = MockLinkRepository::new();
        links.expect_update().returning(|_, _| Ok(None));

        let err = service(links)
            .update_link(99, LinkPatch::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_link() {
        let mut links = MockLinkRepository::new();
        links.expect_delete().returning(|_| Ok(false));

        let err = service(links).delete_link(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_owned_link_hides_other_owners() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_id().returning(|id| {
            let mut link = sample_link(id, "abcde", "https://example.com");
            link.owner_kind = OwnerKind::Tenant;
            link.owner_id = Some(8);
            Ok(Some(link))
        });
        links.expect_delete().times(0);

        let service = service(links);

        assert!(service.get_owned_link(1, Owner::Tenant(8)).await.is_ok());

        let err = service
            .delete_owned_link(1, Owner::Tenant(7))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_short_and_qr_urls() {
        let service = service(MockLinkRepository::new());
        assert_eq!(service.short_url("abcde"), "https://sho.rt/abcde");
        assert_eq!(service.qr_target_url("abcde"), "https://sho.rt/q/abcde");
    }
}
