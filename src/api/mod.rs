//! HTTP layer: request/response handling for public, admin and tenant routes.
//!
//! This layer translates HTTP requests into service calls and formats
//! responses according to API contracts.
//!
//! # Modules
//!
//! - [`dto`] - Data Transfer Objects for request/response serialization
//! - [`extractors`] - Client IP extraction
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Authentication, rate limiting and tracing
//! - [`pages`] - HTML pages for missing and disabled links
//! - [`routes`] - Admin and tenant route tables

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod routes;
