//! Report persistence.
//!
//! [`ReportStore`] is the contract the lifecycle controller and the REST layer see. Every call
//! takes the calling [`AuthenticatedUser`] explicitly; stores scope reads and deletes to that
//! user and refuse to save a report owned by anyone else.

mod memory;
mod postgrest;

pub use memory::MemoryReportStore;
pub use postgrest::PostgrestReportStore;

use crate::config::{AppConfig, BackendKind};
use crate::constants::ENV_SUPABASE_URL;
use crate::error::{ConfigError, ConfigResult, StoreError, StoreResult};
use crate::identity::AuthenticatedUser;
use crate::report::{NewSoilReport, ReportId, SoilReport};
use async_trait::async_trait;
use std::sync::Arc;

/// Persisted collection of soil reports, scoped by owner.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Assigns `id` and `created_at`, persists the report and returns the stored entity.
    async fn save(&self, user: &AuthenticatedUser, report: NewSoilReport)
        -> StoreResult<SoilReport>;

    /// Reports owned by `user`, newest first. No reports is an empty list, not an error.
    async fn list_by_user(&self, user: &AuthenticatedUser) -> StoreResult<Vec<SoilReport>>;

    /// Removes one of `user`'s reports.
    async fn delete_by_id(&self, user: &AuthenticatedUser, id: ReportId) -> StoreResult<()>;
}

/// Rejects reports whose owner is not the caller.
pub(crate) fn ensure_owner(user: &AuthenticatedUser, report: &NewSoilReport) -> StoreResult<()> {
    if report.user_id == user.id {
        Ok(())
    } else {
        tracing::warn!(caller = %user.id, owner = %report.user_id, "refusing to save report for another user");
        Err(StoreError::Forbidden)
    }
}

/// Builds the report store for the configured backend.
///
/// # Errors
///
/// Returns `ConfigError::Missing` when the hosted backend lacks its connection details.
pub fn build_store(cfg: &AppConfig, client: reqwest::Client) -> ConfigResult<Arc<dyn ReportStore>> {
    match cfg.backend() {
        BackendKind::Memory => Ok(Arc::new(MemoryReportStore::new())),
        BackendKind::Hosted => {
            let hosted = cfg.hosted().ok_or(ConfigError::Missing(ENV_SUPABASE_URL))?;
            Ok(Arc::new(PostgrestReportStore::new(
                client,
                &hosted.url,
                hosted.anon_key.clone(),
            )))
        }
    }
}
