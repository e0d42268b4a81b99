use crate::error::AppError;

/// Unique index on `lower(links.code)`.
pub const LINK_CODE_CONSTRAINT: &str = "links_code_key";

/// Returns true when `e` is a unique violation on the short code index.
///
/// Works on the converted [`AppError`] so services can tell a code collision
/// apart from other conflicts without seeing `sqlx` types.
pub fn is_code_conflict(e: &AppError) -> bool {
    match e {
        AppError::Conflict { details, .. } => {
            details.get("constraint").and_then(|c| c.as_str()) == Some(LINK_CODE_CONSTRAINT)
        }
        _ => false,
    }
}
