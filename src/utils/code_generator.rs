//! Short code generation and alias validation.
//!
//! Generated codes use the 36-symbol alphabet `[a-z0-9]`. Uniqueness is not
//! checked here; see `LinkService::generate_unique_code`.

use crate::error::AppError;
use rand::Rng;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Symbols used for generated codes.
pub const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Candidates tried at one length before growing the code by one symbol.
pub const MAX_ATTEMPTS_PER_LENGTH: usize = 100;

/// Generated codes never grow past this length.
pub const MAX_CODE_LENGTH: usize = 6;

pub const ALIAS_MIN_LENGTH: usize = 3;
pub const ALIAS_MAX_LENGTH: usize = 20;

static ALIAS_CHARSET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// Words that collide with service routes or look official.
pub const RESERVED_ALIASES: &[&str] = &[
    "admin", "api", "static", "www", "app", "docs", "redoc", "openapi", "health", "status",
    "login", "logout", "auth",
];

/// Draws a uniformly random code of `length` symbols from `rng`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// [`generate_code`] with the thread-local generator.
pub fn random_code(length: usize) -> String {
    generate_code(&mut rand::rng(), length)
}

/// Validates a user-chosen alias and returns its stored (lower-cased) form.
///
/// # Rules
///
/// - 3-20 characters
/// - only `a-z`, `0-9` and `-` after lower-casing
/// - no leading or trailing hyphen
/// - not a reserved word
///
/// # Errors
///
/// Returns [`AppError::Validation`] naming the first rule that fails.
pub fn validate_alias(alias: &str) -> Result<String, AppError> {
    let normalized = alias.to_lowercase();

    if normalized.is_empty() {
        return Err(AppError::bad_request(
            "Alias must not be empty",
            json!({ "alias": alias }),
        ));
    }

    let length = normalized.chars().count();
    if !(ALIAS_MIN_LENGTH..=ALIAS_MAX_LENGTH).contains(&length) {
        return Err(AppError::bad_request(
            format!("Alias must be {ALIAS_MIN_LENGTH}-{ALIAS_MAX_LENGTH} characters"),
            json!({ "alias": alias, "provided_length": length }),
        ));
    }

    if !ALIAS_CHARSET.is_match(&normalized) {
        return Err(AppError::bad_request(
            "Alias can only contain latin letters, digits, and hyphens",
            json!({ "alias": alias }),
        ));
    }

    if normalized.starts_with('-') || normalized.ends_with('-') {
        return Err(AppError::bad_request(
            "Alias cannot start or end with a hyphen",
            json!({ "alias": alias }),
        ));
    }

    if RESERVED_ALIASES.contains(&normalized.as_str()) {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(normalized)
}
