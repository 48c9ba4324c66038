//! # API Shared
//!
//! Shared definitions for the AgriHealth REST surface.
//!
//! Contains:
//! - Wire DTOs with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - Bearer-token extraction for identity-scoped routes
//!
//! Used by `api-rest`; the core crate never sees these types.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
