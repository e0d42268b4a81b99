//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod admin;
pub mod health;
pub mod redirect;
pub mod shorten;
pub mod tenant;

pub use health::health_handler;
pub use redirect::{qr_image_handler, qr_redirect_handler, redirect_handler};
pub use shorten::shorten_handler;
