//! Direct generation through the upstream text-generation API.

use super::ReportGenerator;
use crate::error::{GenerationError, GenerationResult};
use crate::report::ReportRequest;
use agrihealth_types::NonEmptyText;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Builds the analysis prompt for `request`.
///
/// Location and additional information are only mentioned when supplied.
pub fn build_prompt(request: &ReportRequest) -> String {
    let mut prompt = format!(
        "As an agricultural AI expert, analyze this soil type: \"{}\"",
        request.soil_type.as_str()
    );
    if let Some(location) = &request.location {
        prompt.push_str(&format!(" in location: {location}"));
    }
    prompt.push('.');
    if let Some(info) = &request.additional_info {
        prompt.push_str(&format!(" Additional information: {info}"));
    }
    prompt.push_str(
        "\n\nProvide a comprehensive analysis including:\n\
         1. Detailed soil composition\n\
         2. Key characteristics\n\
         3. Best crops to grow in this soil\n\
         4. Improvement strategies for this soil\n\
         5. Optimal pH range\n\
         6. Recommended fertilizers\n\n\
         Format your response using Markdown with clear sections.",
    );
    prompt
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    message: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Prompts the upstream model for a report.
#[derive(Clone, Debug)]
pub struct GeminiReportGenerator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GeminiReportGenerator {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ReportGenerator for GeminiReportGenerator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &ReportRequest) -> GenerationResult<NonEmptyText> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
            generation_config: GenerationConfig::default(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("text-generation API unreachable: {e}");
                GenerationError::Unreachable(e)
            })?;

        let status = response.status();
        let payload = response.json::<GenerateContentResponse>().await;

        // An error object wins over everything else, whatever the status.
        if let Ok(GenerateContentResponse {
            error: Some(err), ..
        }) = &payload
        {
            let message = err
                .message
                .clone()
                .unwrap_or_else(|| "Error from Gemini API".to_string());
            tracing::warn!("text-generation API error: {message}");
            return Err(GenerationError::Upstream(message));
        }

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        let payload = payload.map_err(|_| GenerationError::MalformedResponse)?;
        NonEmptyText::optional(payload.first_text()).ok_or(GenerationError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use agrihealth_types::SoilType;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Option<(HashMap<String, String>, serde_json::Value)>>>;

    #[test]
    fn test_prompt_mentions_optional_fields_only_when_present() {
        let bare = build_prompt(&ReportRequest::new(SoilType::Chalky));
        assert!(bare.starts_with("As an agricultural AI expert, analyze this soil type: \"chalky\"."));
        assert!(!bare.contains("in location"));
        assert!(!bare.contains("Additional information"));
        assert!(bare.contains("5. Optimal pH range"));
        assert!(bare.ends_with("Format your response using Markdown with clear sections."));

        let full = build_prompt(&ReportRequest {
            soil_type: SoilType::Loam,
            location: NonEmptyText::optional(Some("Kent")),
            additional_info: NonEmptyText::optional(Some("orchard")),
        });
        assert!(full.contains("\"loam\" in location: Kent."));
        assert!(full.contains("Additional information: orchard"));
    }

    #[tokio::test]
    async fn test_sends_prompt_and_returns_first_candidate_text() {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/generate",
                post(
                    |State(captured): State<Captured>,
                     Query(query): Query<HashMap<String, String>>,
                     Json(body): Json<serde_json::Value>| async move {
                        *captured.lock().unwrap() = Some((query, body));
                        Json(serde_json::json!({
                            "candidates": [
                                { "content": { "parts": [{ "text": "## Loam\nrich" }] } }
                            ]
                        }))
                    },
                ),
            )
            .with_state(captured.clone());
        let base = spawn_server(app).await;

        let generator =
            GeminiReportGenerator::new(reqwest::Client::new(), format!("{base}/generate"), "secret");
        let text = generator
            .generate(&ReportRequest::new(SoilType::Loam))
            .await
            .unwrap();
        assert_eq!(text.as_str(), "## Loam\nrich");

        let (query, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(query.get("key").map(String::as_str), Some("secret"));
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("\"loam\""));
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[tokio::test]
    async fn test_error_object_becomes_upstream_error() {
        let app = Router::new().route(
            "/generate",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": { "message": "API key not valid" } })),
                )
            }),
        );
        let base = spawn_server(app).await;
        let generator =
            GeminiReportGenerator::new(reqwest::Client::new(), format!("{base}/generate"), "bad");

        match generator.generate(&ReportRequest::new(SoilType::Clay)).await {
            Err(GenerationError::Upstream(message)) => assert_eq!(message, "API key not valid"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_are_malformed() {
        let app = Router::new().route(
            "/generate",
            post(|| async { Json(serde_json::json!({ "candidates": [] })) }),
        );
        let base = spawn_server(app).await;
        let generator =
            GeminiReportGenerator::new(reqwest::Client::new(), format!("{base}/generate"), "k");

        assert!(matches!(
            generator.generate(&ReportRequest::new(SoilType::Silt)).await,
            Err(GenerationError::MalformedResponse)
        ));
    }

    #[tokio::test]
    async fn test_status_without_error_body() {
        let app = Router::new().route(
            "/generate",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base = spawn_server(app).await;
        let generator =
            GeminiReportGenerator::new(reqwest::Client::new(), format!("{base}/generate"), "k");

        assert!(matches!(
            generator.generate(&ReportRequest::new(SoilType::Peaty)).await,
            Err(GenerationError::Status { status: 503, .. })
        ));
    }
}
