//! Delegated generation through the hosted soil-analysis function.
//!
//! Wire contract: POST `{ soilType, location?, additionalInfo? }`, answered by `{ report }` on
//! success or `{ error }` with a non-success status.

use super::ReportGenerator;
use crate::error::{GenerationError, GenerationResult};
use crate::hosted::with_project_key;
use crate::report::ReportRequest;
use agrihealth_types::NonEmptyText;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request body of the soil-analysis function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilAnalysisRequest {
    pub soil_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl From<&ReportRequest> for SoilAnalysisRequest {
    fn from(request: &ReportRequest) -> Self {
        Self {
            soil_type: request.soil_type.as_str().to_string(),
            location: request.location.as_ref().map(|t| t.as_str().to_string()),
            additional_info: request
                .additional_info
                .as_ref()
                .map(|t| t.as_str().to_string()),
        }
    }
}

/// Success body of the soil-analysis function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoilAnalysisResponse {
    #[serde(default)]
    pub report: Option<String>,
}

/// Error body of the soil-analysis function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilAnalysisError {
    pub error: String,
}

/// Forwards report requests to the hosted soil-analysis function.
#[derive(Clone, Debug)]
pub struct RemoteReportGenerator {
    client: reqwest::Client,
    function_url: String,
    anon_key: String,
}

impl RemoteReportGenerator {
    pub fn new(
        client: reqwest::Client,
        function_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            function_url: function_url.into(),
            anon_key: anon_key.into(),
        }
    }
}

#[async_trait]
impl ReportGenerator for RemoteReportGenerator {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn generate(&self, request: &ReportRequest) -> GenerationResult<NonEmptyText> {
        let body = SoilAnalysisRequest::from(request);

        let response = with_project_key(
            self.client.post(&self.function_url),
            &self.anon_key,
            &self.anon_key,
        )
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!("soil-analysis function unreachable: {e}");
            GenerationError::Unreachable(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<SoilAnalysisError>().await {
                Ok(body) => body.error,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            tracing::warn!("soil-analysis function returned {status}: {message}");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload: SoilAnalysisResponse = response
            .json()
            .await
            .map_err(|_| GenerationError::MalformedResponse)?;

        NonEmptyText::optional(payload.report).ok_or(GenerationError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_server};
    use agrihealth_types::SoilType;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    fn request() -> ReportRequest {
        ReportRequest {
            soil_type: SoilType::Sandy,
            location: NonEmptyText::optional(Some("South slope")),
            additional_info: None,
        }
    }

    #[tokio::test]
    async fn test_forwards_parameters_and_returns_report_verbatim() {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/functions/v1/soil-analysis",
                post(
                    |State(captured): State<Captured>,
                     headers: axum::http::HeaderMap,
                     Json(body): Json<serde_json::Value>| async move {
                        let key = headers
                            .get("apikey")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        captured.lock().unwrap().push((key, body));
                        Json(serde_json::json!({ "report": "## Sandy\n- drains fast" }))
                    },
                ),
            )
            .with_state(captured.clone());
        let base = spawn_server(app).await;

        let generator = RemoteReportGenerator::new(
            reqwest::Client::new(),
            format!("{base}/functions/v1/soil-analysis"),
            "anon-key",
        );
        let text = generator.generate(&request()).await.unwrap();
        assert_eq!(text.as_str(), "## Sandy\n- drains fast");

        let calls = captured.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_deref(), Some("anon-key"));
        assert_eq!(
            calls[0].1,
            serde_json::json!({ "soilType": "sandy", "location": "South slope" })
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported_with_message() {
        let app = Router::new().route(
            "/fn",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "quota exceeded" })),
                )
            }),
        );
        let base = spawn_server(app).await;
        let generator = RemoteReportGenerator::new(reqwest::Client::new(), format!("{base}/fn"), "k");

        match generator.generate(&request()).await {
            Err(GenerationError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_or_blank_report_is_malformed() {
        let app = Router::new()
            .route("/missing", post(|| async { Json(serde_json::json!({})) }))
            .route(
                "/blank",
                post(|| async { Json(serde_json::json!({ "report": "  " })) }),
            );
        let base = spawn_server(app).await;

        for path in ["missing", "blank"] {
            let generator =
                RemoteReportGenerator::new(reqwest::Client::new(), format!("{base}/{path}"), "k");
            assert!(matches!(
                generator.generate(&request()).await,
                Err(GenerationError::MalformedResponse)
            ));
        }
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let url = closed_port_url().await;
        let generator = RemoteReportGenerator::new(reqwest::Client::new(), url, "k");
        assert!(matches!(
            generator.generate(&request()).await,
            Err(GenerationError::Unreachable(_))
        ));
    }
}
