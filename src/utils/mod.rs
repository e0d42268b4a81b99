//! Helpers shared across layers.
//!
//! - [`code_generator`] - Short code generation and alias validation
//! - [`url_validator`] - Target URL validation and spam filtering
//! - [`user_agent`] - OS detection and header truncation
//! - [`db_error`] - Recognizing short code collisions

pub mod code_generator;
pub mod db_error;
pub mod url_validator;
pub mod user_agent;
