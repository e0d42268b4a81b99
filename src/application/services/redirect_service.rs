//! Short code resolution for the redirect routes.

use std::sync::Arc;

use tracing::error;

use super::click_recorder::{ClickContext, ClickRecorder};
use crate::domain::entities::Link;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// What a short code resolves to.
#[derive(Debug, Clone)]
pub enum RedirectOutcome {
    NotFound,
    /// The link exists but was deactivated.
    Inactive,
    Found(Link),
}

/// Resolves codes and records a click for every successful redirect.
pub struct RedirectService {
    links: Arc<dyn LinkRepository>,
    recorder: Arc<ClickRecorder>,
}

impl RedirectService {
    pub fn new(links: Arc<dyn LinkRepository>, recorder: Arc<ClickRecorder>) -> Self {
        Self { links, recorder }
    }

    /// Case-insensitive code lookup.
    pub async fn resolve(&self, code: &str) -> Result<RedirectOutcome, AppError> {
        let outcome = match self.links.find_by_code(&code.to_lowercase()).await? {
            None => RedirectOutcome::NotFound,
            Some(link) if !link.is_active => RedirectOutcome::Inactive,
            Some(link) => RedirectOutcome::Found(link),
        };

        Ok(outcome)
    }

    /// Resolves `code` and, when the link is active, records the click.
    ///
    /// A failure to record is logged and does not affect the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] only if the lookup itself fails.
    pub async fn follow(
        &self,
        code: &str,
        ctx: &ClickContext,
        is_qr: bool,
    ) -> Result<RedirectOutcome, AppError> {
        let outcome = self.resolve(code).await?;

        if let RedirectOutcome::Found(link) = &outcome
            && let Err(e) = self.recorder.record_click(link, ctx, is_qr).await
        {
            error!(link_id = link.id, code = %link.code, error = %e, "Failed to record click");
        }

        Ok(outcome)
    }
}
