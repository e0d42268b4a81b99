//! Core domain entities.
//!
//! Entities are plain data structures without storage concerns. Creation
//! inputs live next to the entity they produce (`NewLink`, `NewClick`).
//!
//! - [`Link`] - A shortened URL and its counters
//! - [`Click`] - One recorded redirect
//! - [`VisitorKey`] - Per-day identity used for unique-visitor deduplication
//! - [`TenantUser`] - Owner of links created through the tenant API
//! - [`BlacklistEntry`] - A blocked client address

pub mod click;
pub mod link;
pub mod tenant;

pub use click::{Click, NewClick, VisitorKey, hash_user_agent};
pub use link::{Link, LinkFilter, LinkPatch, LinkWithOwner, NewLink, Owner, OwnerKind};
pub use tenant::{BlacklistEntry, TenantSummary, TenantUser};
