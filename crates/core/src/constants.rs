//! Constants used throughout the AgriHealth core crate.
//!
//! Collects the hosted-backend paths, default upstream endpoints and environment variable
//! names so they stay consistent between configuration, collaborators and tests.

/// Hosted collection holding persisted soil reports.
pub const SOIL_REPORTS_TABLE: &str = "soil_reports";

/// Path of the record-store API relative to the backend URL.
pub const REST_API_PATH: &str = "/rest/v1";

/// Path of the auth API relative to the backend URL.
pub const AUTH_API_PATH: &str = "/auth/v1";

/// Path of the soil-analysis function relative to the backend URL.
pub const SOIL_ANALYSIS_FUNCTION_PATH: &str = "/functions/v1/soil-analysis";

/// Default upstream text-generation endpoint.
pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Default bind address for the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default timeout applied to every outbound HTTP call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const ENV_REST_ADDR: &str = "AGRIHEALTH_REST_ADDR";
pub const ENV_GENERATOR: &str = "AGRIHEALTH_GENERATOR";
pub const ENV_PERSISTENCE: &str = "AGRIHEALTH_PERSISTENCE";
pub const ENV_BACKEND: &str = "AGRIHEALTH_BACKEND";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "AGRIHEALTH_HTTP_TIMEOUT_SECS";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_SOIL_ANALYSIS_FUNCTION_URL: &str = "SOIL_ANALYSIS_FUNCTION_URL";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_API_URL: &str = "GEMINI_API_URL";
