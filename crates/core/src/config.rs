//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services as an
//! `Arc<AppConfig>`. Request handling never reads process-wide environment variables.
//!
//! Raw values are collected into [`RawConfig`] (the only place that touches `std::env`) and
//! validated by [`AppConfig::resolve`], which is a pure function and therefore testable.

use crate::constants::{
    DEFAULT_GEMINI_API_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REST_ADDR, ENV_BACKEND,
    ENV_GEMINI_API_KEY, ENV_GEMINI_API_URL, ENV_GENERATOR, ENV_HTTP_TIMEOUT_SECS, ENV_PERSISTENCE,
    ENV_REST_ADDR, ENV_SOIL_ANALYSIS_FUNCTION_URL, ENV_SUPABASE_ANON_KEY, ENV_SUPABASE_URL,
    SOIL_ANALYSIS_FUNCTION_PATH,
};
use crate::error::{ConfigError, ConfigResult};
use crate::lifecycle::PersistMode;
use std::time::Duration;

/// Which report generator is composed into the lifecycle controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorKind {
    /// Pre-authored lookup table, no I/O.
    Static,
    /// The hosted soil-analysis function.
    Remote,
    /// Direct calls to the upstream text-generation API.
    Gemini,
}

/// Where reports and identities live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process store and identity provider (development, tests).
    Memory,
    /// Hosted record store and auth service.
    Hosted,
}

/// Connection details for the hosted backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostedBackend {
    pub url: String,
    pub anon_key: String,
}

/// Connection details for the upstream text-generation API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeminiSettings {
    pub api_key: String,
    pub api_url: String,
}

/// Unvalidated configuration values, one per environment variable.
#[derive(Clone, Debug, Default)]
pub struct RawConfig {
    pub rest_addr: Option<String>,
    pub generator: Option<String>,
    pub persistence: Option<String>,
    pub backend: Option<String>,
    pub http_timeout_secs: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub soil_analysis_function_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: Option<String>,
}

impl RawConfig {
    /// Reads every recognised variable from the process environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            rest_addr: var(ENV_REST_ADDR),
            generator: var(ENV_GENERATOR),
            persistence: var(ENV_PERSISTENCE),
            backend: var(ENV_BACKEND),
            http_timeout_secs: var(ENV_HTTP_TIMEOUT_SECS),
            supabase_url: var(ENV_SUPABASE_URL),
            supabase_anon_key: var(ENV_SUPABASE_ANON_KEY),
            soil_analysis_function_url: var(ENV_SOIL_ANALYSIS_FUNCTION_URL),
            gemini_api_key: var(ENV_GEMINI_API_KEY),
            gemini_api_url: var(ENV_GEMINI_API_URL),
        }
    }
}

/// Application configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    rest_addr: String,
    generator: GeneratorKind,
    persistence: PersistMode,
    backend: BackendKind,
    http_timeout: Duration,
    hosted: Option<HostedBackend>,
    soil_analysis_function_url: Option<String>,
    gemini: Option<GeminiSettings>,
}

impl AppConfig {
    /// Validates raw values into an `AppConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for unparseable values and `ConfigError::Missing` when the
    /// selected generator or backend lacks the connection details it needs.
    pub fn resolve(raw: RawConfig) -> ConfigResult<Self> {
        let generator = generator_kind_from_env_value(raw.generator)?;
        let persistence = persist_mode_from_env_value(raw.persistence)?;
        let backend = backend_kind_from_env_value(raw.backend)?;
        let http_timeout = http_timeout_from_env_value(raw.http_timeout_secs)?;

        let supabase_url = non_blank(raw.supabase_url).map(|u| u.trim_end_matches('/').to_string());
        let anon_key = non_blank(raw.supabase_anon_key);

        let hosted = match (supabase_url.clone(), anon_key.clone()) {
            (Some(url), Some(anon_key)) => Some(HostedBackend { url, anon_key }),
            _ => None,
        };

        if backend == BackendKind::Hosted {
            if supabase_url.is_none() {
                return Err(ConfigError::Missing(ENV_SUPABASE_URL));
            }
            if anon_key.is_none() {
                return Err(ConfigError::Missing(ENV_SUPABASE_ANON_KEY));
            }
        }

        let soil_analysis_function_url = non_blank(raw.soil_analysis_function_url).or_else(|| {
            supabase_url
                .as_ref()
                .map(|url| format!("{url}{SOIL_ANALYSIS_FUNCTION_PATH}"))
        });

        if generator == GeneratorKind::Remote {
            if soil_analysis_function_url.is_none() {
                return Err(ConfigError::Missing(ENV_SOIL_ANALYSIS_FUNCTION_URL));
            }
            if anon_key.is_none() {
                return Err(ConfigError::Missing(ENV_SUPABASE_ANON_KEY));
            }
        }

        let gemini = non_blank(raw.gemini_api_key).map(|api_key| GeminiSettings {
            api_key,
            api_url: non_blank(raw.gemini_api_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
        });

        if generator == GeneratorKind::Gemini && gemini.is_none() {
            return Err(ConfigError::Missing(ENV_GEMINI_API_KEY));
        }

        Ok(Self {
            rest_addr: non_blank(raw.rest_addr).unwrap_or_else(|| DEFAULT_REST_ADDR.to_string()),
            generator,
            persistence,
            backend,
            http_timeout,
            hosted,
            soil_analysis_function_url,
            gemini,
        })
    }

    pub fn rest_addr(&self) -> &str {
        &self.rest_addr
    }

    pub fn generator(&self) -> GeneratorKind {
        self.generator
    }

    pub fn persistence(&self) -> PersistMode {
        self.persistence
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn hosted(&self) -> Option<&HostedBackend> {
        self.hosted.as_ref()
    }

    pub fn soil_analysis_function_url(&self) -> Option<&str> {
        self.soil_analysis_function_url.as_deref()
    }

    pub fn gemini(&self) -> Option<&GeminiSettings> {
        self.gemini.as_ref()
    }

    /// Builds the HTTP client shared by every hosted collaborator.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the TLS backend cannot be initialised.
    pub fn http_client(&self) -> ConfigResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .map_err(ConfigError::HttpClient)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the generator kind from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`GeneratorKind::Static`].
pub fn generator_kind_from_env_value(value: Option<String>) -> ConfigResult<GeneratorKind> {
    match non_blank(value).map(|v| v.to_ascii_lowercase()) {
        None => Ok(GeneratorKind::Static),
        Some(v) => match v.as_str() {
            "static" => Ok(GeneratorKind::Static),
            "remote" => Ok(GeneratorKind::Remote),
            "gemini" => Ok(GeneratorKind::Gemini),
            _ => Err(ConfigError::Invalid {
                var: ENV_GENERATOR,
                value: v,
            }),
        },
    }
}

/// Parse the persistence mode from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`PersistMode::Persist`].
pub fn persist_mode_from_env_value(value: Option<String>) -> ConfigResult<PersistMode> {
    match non_blank(value).map(|v| v.to_ascii_lowercase()) {
        None => Ok(PersistMode::Persist),
        Some(v) => match v.as_str() {
            "persist" => Ok(PersistMode::Persist),
            "preview" => Ok(PersistMode::PreviewOnly),
            _ => Err(ConfigError::Invalid {
                var: ENV_PERSISTENCE,
                value: v,
            }),
        },
    }
}

/// Parse the backend kind from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`BackendKind::Memory`].
pub fn backend_kind_from_env_value(value: Option<String>) -> ConfigResult<BackendKind> {
    match non_blank(value).map(|v| v.to_ascii_lowercase()) {
        None => Ok(BackendKind::Memory),
        Some(v) => match v.as_str() {
            "memory" => Ok(BackendKind::Memory),
            "hosted" => Ok(BackendKind::Hosted),
            _ => Err(ConfigError::Invalid {
                var: ENV_BACKEND,
                value: v,
            }),
        },
    }
}

/// Parse the outbound HTTP timeout (whole seconds, greater than zero).
pub fn http_timeout_from_env_value(value: Option<String>) -> ConfigResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)),
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::Invalid {
                var: ENV_HTTP_TIMEOUT_SECS,
                value: v,
            }),
        },
    }
}
