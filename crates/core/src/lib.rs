//! # AgriHealth Core
//!
//! Domain logic for the soil-report service.
//!
//! This crate contains the report pipeline and the contracts of every external collaborator:
//! - Rendering report text into display blocks (`markdown`)
//! - Producing report text from soil parameters (`generator`)
//! - Persisting reports per user (`repositories`)
//! - Resolving callers to users (`identity`)
//! - Orchestrating a submission end to end (`lifecycle`)
//!
//! **No API concerns**: HTTP servers, routing and wire DTOs belong in `api-rest` and
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
mod hosted;
pub mod identity;
pub mod lifecycle;
pub mod markdown;
pub mod report;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_support;

pub use agrihealth_types::{NonEmptyText, SoilType, SoilTypeError, TextError};
pub use config::{AppConfig, RawConfig};
pub use error::{ConfigError, GenerationError, IdentityError, StoreError};
pub use generator::{build_generator, build_upstream_generator, ReportGenerator};
pub use identity::{build_identity, AuthenticatedUser, Credentials, IdentityProvider, Session};
pub use lifecycle::{
    LifecycleError, LifecycleState, Notification, PersistMode, ReportLifecycle, SubmissionInput,
    SubmissionOutcome,
};
pub use markdown::{render, DisplayBlock, RenderedReport};
pub use report::{NewSoilReport, ReportId, ReportRequest, SoilReport, UserId};
pub use repositories::{build_store, ReportStore};
