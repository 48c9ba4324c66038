//! # API REST
//!
//! REST API implementation for AgriHealth.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, bearer tokens)
//!
//! Uses `api-shared` for DTOs and `agrihealth-core` for everything else. Each request gets its
//! own [`ReportLifecycle`]; the collaborators behind it are shared through [`AppState`].

#![warn(rust_2018_idioms)]

use agrihealth_core::generator::StaticReportGenerator;
use agrihealth_core::identity::{session_for, Credentials};
use agrihealth_core::{
    build_generator, build_identity, build_store, build_upstream_generator, render, AppConfig,
    ConfigError, IdentityError, IdentityProvider, LifecycleError, PersistMode, ReportGenerator,
    ReportId, ReportLifecycle, ReportRequest, ReportStore, Session, SoilType, SubmissionInput,
};
use agrihealth_core::{NonEmptyText, Notification};
use api_shared::auth::bearer_token;
use api_shared::{
    blocks_res, ErrorRes, HealthRes, HealthService, ListReportsRes, NotificationRes, RenderReq,
    RenderRes, ReportDetailRes, ReportRes, SessionRes, SignInReq, SignUpReq, SignUpRes,
    SoilAnalysisReq, SoilAnalysisRes, SoilTypeRes, SubmitReportReq, SubmitReportRes,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

type ApiError = (StatusCode, Json<ErrorRes>);

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    generator: Arc<dyn ReportGenerator>,
    analysis_generator: Arc<dyn ReportGenerator>,
    store: Arc<dyn ReportStore>,
    identity: Arc<dyn IdentityProvider>,
    persistence: PersistMode,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn ReportGenerator>,
        store: Arc<dyn ReportStore>,
        identity: Arc<dyn IdentityProvider>,
        persistence: PersistMode,
    ) -> Self {
        Self {
            generator,
            analysis_generator: Arc::new(StaticReportGenerator::new()),
            store,
            identity,
            persistence,
        }
    }

    /// Replaces the generator behind `POST /functions/soil-analysis`.
    pub fn with_analysis_generator(mut self, generator: Arc<dyn ReportGenerator>) -> Self {
        self.analysis_generator = generator;
        self
    }

    /// Composes every collaborator from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the selected variants lack their connection details.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ConfigError> {
        let client = cfg.http_client()?;
        let generator = build_generator(cfg, client.clone())?;
        let store = build_store(cfg, client.clone())?;
        let identity = build_identity(cfg, client.clone())?;

        tracing::info!(
            generator = generator.name(),
            backend = ?cfg.backend(),
            persistence = ?cfg.persistence(),
            "collaborators composed"
        );

        let state = Self::new(generator, store, identity, cfg.persistence());
        Ok(match build_upstream_generator(cfg, client) {
            Some(upstream) => state.with_analysis_generator(upstream),
            None => state,
        })
    }

    fn lifecycle(&self) -> ReportLifecycle {
        ReportLifecycle::new(self.generator.clone(), self.store.clone(), self.persistence)
    }

    async fn session(&self, headers: &HeaderMap) -> Result<Session, ApiError> {
        session_for(self.identity.as_ref(), bearer_token(headers))
            .await
            .map_err(identity_error)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        render_report,
        list_soil_types,
        submit_report,
        list_reports,
        get_report,
        delete_report,
        sign_in,
        sign_up,
        sign_out,
        soil_analysis,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        NotificationRes,
        api_shared::DisplayBlockRes,
        RenderReq,
        RenderRes,
        SoilTypeRes,
        SubmitReportReq,
        SubmitReportRes,
        ReportRes,
        ListReportsRes,
        ReportDetailRes,
        SignInReq,
        SignUpReq,
        SessionRes,
        SignUpRes,
        SoilAnalysisReq,
        SoilAnalysisRes,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by identity-scoped routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Builds the REST router with OpenAPI docs and permissive CORS.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/render", post(render_report))
        .route("/soil-types", get(list_soil_types))
        .route("/reports", post(submit_report).get(list_reports))
        .route("/reports/:id", get(get_report).delete(delete_report))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-out", post(sign_out))
        .route("/functions/soil-analysis", post(soil_analysis))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn lifecycle_status(error: &LifecycleError) -> StatusCode {
    match error {
        LifecycleError::MissingField => StatusCode::BAD_REQUEST,
        LifecycleError::AuthRequired => StatusCode::UNAUTHORIZED,
        LifecycleError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
        LifecycleError::DeleteFailed { not_found: true, .. } => StatusCode::NOT_FOUND,
        LifecycleError::PersistFailed(_)
        | LifecycleError::DeleteFailed { .. }
        | LifecycleError::ListFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn lifecycle_error(error: LifecycleError) -> ApiError {
    let status = lifecycle_status(&error);
    if status.is_server_error() {
        tracing::error!("request failed: {error}");
    }
    (
        status,
        Json(ErrorRes::with_notification(
            error.to_string(),
            &error.notification(),
        )),
    )
}

fn identity_error(error: IdentityError) -> ApiError {
    let status = match &error {
        IdentityError::MissingField(_) => StatusCode::BAD_REQUEST,
        IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        IdentityError::AlreadyRegistered(_) => StatusCode::CONFLICT,
        IdentityError::Unreachable(_)
        | IdentityError::Provider { .. }
        | IdentityError::Decode(_) => {
            tracing::error!("identity provider error: {error}");
            StatusCode::BAD_GATEWAY
        }
    };
    (
        status,
        Json(ErrorRes::with_notification(
            error.to_string(),
            &error.notification(),
        )),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/render",
    request_body = RenderReq,
    responses(
        (status = 200, description = "Report text rendered into display blocks", body = RenderRes)
    )
)]
/// Renders arbitrary report text. Pure; never fails.
#[axum::debug_handler]
async fn render_report(
    State(_state): State<AppState>,
    Json(req): Json<RenderReq>,
) -> Json<RenderRes> {
    Json(RenderRes {
        blocks: blocks_res(&render(&req.text)),
    })
}

#[utoipa::path(
    get,
    path = "/soil-types",
    responses(
        (status = 200, description = "Selectable soil types in display order", body = [SoilTypeRes])
    )
)]
#[axum::debug_handler]
async fn list_soil_types(State(_state): State<AppState>) -> Json<Vec<SoilTypeRes>> {
    Json(SoilType::ALL.into_iter().map(SoilTypeRes::from).collect())
}

#[utoipa::path(
    post,
    path = "/reports",
    request_body = SubmitReportReq,
    responses(
        (status = 201, description = "Report generated and saved", body = SubmitReportRes),
        (status = 200, description = "Report generated; not saved (preview mode or save failure)", body = SubmitReportRes),
        (status = 400, description = "Soil type missing or unknown", body = ErrorRes),
        (status = 401, description = "Sign-in required", body = ErrorRes),
        (status = 502, description = "Report generation failed", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Generate a soil report and, in persist mode, save it for the caller.
///
/// A save failure still returns the generated report with its rendered blocks, together with
/// the "Report not saved" notification.
#[axum::debug_handler]
async fn submit_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitReportReq>,
) -> Result<(StatusCode, Json<SubmitReportRes>), ApiError> {
    let input = SubmissionInput {
        soil_type: req.soil_type,
        location: req.location,
        additional_info: req.additional_info,
    };
    // The identity provider is only consulted once the form itself is valid.
    input.validate().map_err(lifecycle_error)?;

    let session = match state.persistence {
        PersistMode::PreviewOnly => Session::anonymous(),
        PersistMode::Persist => state.session(&headers).await?,
    };

    let mut lifecycle = state.lifecycle();
    let outcome = lifecycle.submit(&session, input).await;

    let blocks = outcome
        .displayed
        .as_ref()
        .map(|d| blocks_res(&d.rendered.blocks));
    let body = |error: Option<String>| SubmitReportRes {
        state: outcome.state.name().to_string(),
        report: outcome.saved.as_ref().map(ReportRes::from),
        blocks: blocks.clone(),
        error,
        notification: NotificationRes::from(&outcome.notification),
    };

    match &outcome.error {
        None if outcome.saved.is_some() => Ok((StatusCode::CREATED, Json(body(None)))),
        None => Ok((StatusCode::OK, Json(body(None)))),
        Some(error @ LifecycleError::PersistFailed(_)) => {
            Ok((StatusCode::OK, Json(body(Some(error.to_string())))))
        }
        Some(error) => Err(lifecycle_error(error.clone())),
    }
}

#[utoipa::path(
    get,
    path = "/reports",
    responses(
        (status = 200, description = "Caller's reports, newest first", body = ListReportsRes),
        (status = 401, description = "Sign-in required", body = ErrorRes),
        (status = 503, description = "Report store unavailable", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
async fn list_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListReportsRes>, ApiError> {
    let session = state.session(&headers).await?;
    let reports = state
        .lifecycle()
        .list(&session)
        .await
        .map_err(lifecycle_error)?;
    Ok(Json(ListReportsRes {
        reports: reports.iter().map(ReportRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/reports/{id}",
    params(("id" = String, Path, description = "Report identifier")),
    responses(
        (status = 200, description = "Report with rendered blocks", body = ReportDetailRes),
        (status = 401, description = "Sign-in required", body = ErrorRes),
        (status = 404, description = "No such report for the caller", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
async fn get_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportDetailRes>, ApiError> {
    let session = state.session(&headers).await?;
    let reports = state
        .lifecycle()
        .list(&session)
        .await
        .map_err(lifecycle_error)?;

    let id = ReportId::new(id);
    let report = reports.iter().find(|r| r.id == id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorRes::new(format!("report not found: {id}"))),
        )
    })?;

    Ok(Json(ReportDetailRes {
        report: ReportRes::from(report),
        blocks: blocks_res(&render(report.report_content.as_str())),
    }))
}

#[utoipa::path(
    delete,
    path = "/reports/{id}",
    params(("id" = String, Path, description = "Report identifier")),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 401, description = "Sign-in required", body = ErrorRes),
        (status = 404, description = "No such report for the caller", body = ErrorRes),
        (status = 503, description = "Report store unavailable", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
async fn delete_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state.session(&headers).await?;
    let notification: Notification = state
        .lifecycle()
        .delete(&session, ReportId::new(id))
        .await
        .map_err(lifecycle_error)?;
    tracing::info!(report_id = %id, "{}", notification.description);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/auth/sign-in",
    request_body = SignInReq,
    responses(
        (status = 200, description = "Signed in", body = SessionRes),
        (status = 400, description = "Email or password missing", body = ErrorRes),
        (status = 401, description = "Invalid credentials", body = ErrorRes),
        (status = 502, description = "Identity provider error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInReq>,
) -> Result<Json<SessionRes>, ApiError> {
    let user = state
        .identity
        .sign_in(&Credentials::new(req.email, req.password))
        .await
        .map_err(identity_error)?;
    Ok(Json(SessionRes {
        user_id: user.id.to_string(),
        email: user.email,
        access_token: user.access_token,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/sign-up",
    request_body = SignUpReq,
    responses(
        (status = 201, description = "Account created", body = SignUpRes),
        (status = 400, description = "Required field missing", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes),
        (status = 502, description = "Identity provider error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpReq>,
) -> Result<(StatusCode, Json<SignUpRes>), ApiError> {
    let mut credentials = Credentials::new(req.email, req.password);
    credentials.full_name = req.full_name;

    let outcome = state
        .identity
        .sign_up(&credentials)
        .await
        .map_err(identity_error)?;
    Ok((
        StatusCode::CREATED,
        Json(SignUpRes {
            user_id: outcome.user_id.to_string(),
            confirmation_required: outcome.confirmation_required,
            notification: NotificationRes::from(&outcome.notification()),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/sign-out",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "No signed-in user", body = ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let session = state.session(&headers).await?;
    let user = session
        .user()
        .ok_or_else(|| lifecycle_error(LifecycleError::AuthRequired))?;
    state.identity.sign_out(user).await.map_err(identity_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/functions/soil-analysis",
    request_body = SoilAnalysisReq,
    responses(
        (status = 200, description = "Generated report text", body = SoilAnalysisRes),
        (status = 400, description = "Soil type missing or unknown", body = ErrorRes),
        (status = 500, description = "Generation failed", body = ErrorRes)
    )
)]
/// Soil-analysis function: parameters in, report text out.
///
/// This is the endpoint the delegated generator calls.
#[axum::debug_handler]
async fn soil_analysis(
    State(state): State<AppState>,
    Json(req): Json<SoilAnalysisReq>,
) -> Result<Json<SoilAnalysisRes>, ApiError> {
    let soil_type = req
        .soil_type
        .as_deref()
        .and_then(|raw| raw.parse::<SoilType>().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorRes::new("soilType is missing or not recognised")),
            )
        })?;

    let request = ReportRequest {
        soil_type,
        location: NonEmptyText::optional(req.location),
        additional_info: NonEmptyText::optional(req.additional_info),
    };

    match state.analysis_generator.generate(&request).await {
        Ok(report) => Ok(Json(SoilAnalysisRes {
            report: report.into_string(),
        })),
        Err(e) => {
            tracing::error!(
                generator = state.analysis_generator.name(),
                "soil analysis failed: {e}"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes::new(e.to_string())),
            ))
        }
    }
}
