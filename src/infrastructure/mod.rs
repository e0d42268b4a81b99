//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and location lookup.
//!
//! # Modules
//!
//! - [`geo`] - Cached client location lookup over HTTP
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`qr`] - QR code PNG rendering

pub mod geo;
pub mod persistence;
pub mod qr;
