//! Report generation.
//!
//! Every generator implements [`ReportGenerator`]: validated parameters in, non-empty report
//! text out, or a [`GenerationError`]. The lifecycle controller and the renderer only ever see
//! this contract, so the implementation is chosen once at composition time:
//!
//! - [`StaticReportGenerator`] looks the text up in a pre-authored table.
//! - [`RemoteReportGenerator`] forwards the parameters to the hosted soil-analysis function.
//! - [`GeminiReportGenerator`] prompts the upstream text-generation API directly.

mod gemini;
mod remote;
mod static_table;

pub use gemini::{build_prompt, GeminiReportGenerator};
pub use remote::{RemoteReportGenerator, SoilAnalysisError, SoilAnalysisRequest, SoilAnalysisResponse};
pub use static_table::{StaticReportGenerator, FALLBACK_REPORT};

use crate::config::{AppConfig, GeneratorKind};
use crate::error::{ConfigError, ConfigResult, GenerationResult};
use crate::report::ReportRequest;
use agrihealth_types::NonEmptyText;
use async_trait::async_trait;
use std::sync::Arc;

/// Capability to produce report text from soil parameters.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Produces report text for `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::GenerationError`] when the text cannot be produced. Empty text
    /// is never returned as success.
    async fn generate(&self, request: &ReportRequest) -> GenerationResult<NonEmptyText>;
}

/// Builds the generator selected by `cfg`.
///
/// # Errors
///
/// Returns `ConfigError::Missing` when the selected generator lacks its endpoint or key.
pub fn build_generator(
    cfg: &AppConfig,
    client: reqwest::Client,
) -> ConfigResult<Arc<dyn ReportGenerator>> {
    match cfg.generator() {
        GeneratorKind::Static => Ok(Arc::new(StaticReportGenerator::new())),
        GeneratorKind::Remote => {
            let url = cfg
                .soil_analysis_function_url()
                .ok_or(ConfigError::Missing(crate::constants::ENV_SOIL_ANALYSIS_FUNCTION_URL))?;
            let anon_key = cfg
                .hosted()
                .map(|h| h.anon_key.clone())
                .ok_or(ConfigError::Missing(crate::constants::ENV_SUPABASE_ANON_KEY))?;
            Ok(Arc::new(RemoteReportGenerator::new(client, url, anon_key)))
        }
        GeneratorKind::Gemini => build_upstream_generator(cfg, client)
            .ok_or(ConfigError::Missing(crate::constants::ENV_GEMINI_API_KEY)),
    }
}

/// Generator backing the soil-analysis function endpoint: the upstream API when a key is
/// configured, otherwise `None`.
pub fn build_upstream_generator(
    cfg: &AppConfig,
    client: reqwest::Client,
) -> Option<Arc<dyn ReportGenerator>> {
    cfg.gemini().map(|settings| {
        Arc::new(GeminiReportGenerator::new(
            client,
            settings.api_url.clone(),
            settings.api_key.clone(),
        )) as Arc<dyn ReportGenerator>
    })
}
