//! Domain layer containing business entities and logic.
//!
//! Nothing in here touches the database or HTTP; infrastructure implements
//! the traits declared here.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`analytics`] - Window bucketing and breakdowns over clicks
//! - [`geo`] - Client location lookup contract

pub mod analytics;
pub mod entities;
pub mod geo;
pub mod repositories;
