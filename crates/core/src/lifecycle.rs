//! Report lifecycle controller.
//!
//! One [`ReportLifecycle`] drives a submission through
//! `Idle → Validating → Generating → Rendering → Persisting → Done`, with `Error` reachable from
//! validation, generation and persistence. Collaborators are awaited one after another and
//! nothing is retried.
//!
//! Two outcomes are asymmetric:
//!
//! - a generation failure never replaces or clears the report already on display;
//! - a persistence failure never hides a report that was generated and rendered.

use crate::error::StoreError;
use crate::generator::ReportGenerator;
use crate::identity::{AuthenticatedUser, Session};
use crate::markdown::RenderedReport;
use crate::report::{NewSoilReport, ReportId, ReportRequest, SoilReport};
use crate::repositories::ReportStore;
use agrihealth_types::{NonEmptyText, SoilType};
use serde::Serialize;
use std::sync::Arc;

/// Whether generated reports are saved for the signed-in user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistMode {
    /// Save every generated report; a signed-in user is required.
    Persist,
    /// Generate and display only. Identity and store are never consulted.
    PreviewOnly,
}

/// Terminal failure of one lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("soil type is missing or not recognised")]
    MissingField,
    #[error("a signed-in user is required")]
    AuthRequired,
    #[error("report generation failed: {0}")]
    GenerationFailed(String),
    #[error("report could not be saved: {0}")]
    PersistFailed(String),
    #[error("report could not be deleted: {message}")]
    DeleteFailed { not_found: bool, message: String },
    #[error("reports could not be loaded: {0}")]
    ListFailed(String),
}

impl LifecycleError {
    /// User-facing notification for this failure.
    pub fn notification(&self) -> Notification {
        match self {
            LifecycleError::MissingField => {
                Notification::destructive("Missing information", "Please select a soil type.")
            }
            LifecycleError::AuthRequired => Notification::destructive(
                "Authentication required",
                "Please login to generate, save and view your soil reports.",
            ),
            LifecycleError::GenerationFailed(_) => Notification::destructive(
                "Error",
                "Failed to generate soil report. Please try again.",
            ),
            LifecycleError::PersistFailed(_) => Notification::destructive(
                "Report not saved",
                "Your report was generated but could not be saved. Please try again.",
            ),
            LifecycleError::DeleteFailed { .. } => {
                Notification::destructive("Error", "Failed to delete the soil report.")
            }
            LifecycleError::ListFailed(_) => {
                Notification::destructive("Error", "Failed to load your soil reports.")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Success,
    Destructive,
}

/// Human-readable message surfaced for every outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn success(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Success,
        }
    }

    pub fn destructive(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Destructive,
        }
    }

    pub fn report_generated() -> Self {
        Self::success("Report Generated", "Your soil analysis report is ready.")
    }

    pub fn report_deleted() -> Self {
        Self::success(
            "Report deleted",
            "The soil report has been deleted successfully.",
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Validating,
    Generating,
    Rendering,
    Persisting,
    Done,
    Error(LifecycleError),
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Validating => "validating",
            LifecycleState::Generating => "generating",
            LifecycleState::Rendering => "rendering",
            LifecycleState::Persisting => "persisting",
            LifecycleState::Done => "done",
            LifecycleState::Error(_) => "error",
        }
    }

    fn is_settled(&self) -> bool {
        matches!(self, LifecycleState::Done | LifecycleState::Error(_))
    }
}

/// Raw form values for one submission. Blank optional fields are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionInput {
    pub soil_type: Option<String>,
    pub location: Option<String>,
    pub additional_info: Option<String>,
}

impl SubmissionInput {
    pub fn new(soil_type: impl Into<String>) -> Self {
        Self {
            soil_type: Some(soil_type.into()),
            ..Self::default()
        }
    }

    /// Validates the form into generator parameters.
    ///
    /// # Errors
    ///
    /// `LifecycleError::MissingField` when the soil type is absent, blank or unknown.
    pub fn validate(&self) -> Result<ReportRequest, LifecycleError> {
        let soil_type = self
            .soil_type
            .as_deref()
            .and_then(|raw| raw.parse::<SoilType>().ok())
            .ok_or(LifecycleError::MissingField)?;
        Ok(ReportRequest {
            soil_type,
            location: NonEmptyText::optional(self.location.as_deref()),
            additional_info: NonEmptyText::optional(self.additional_info.as_deref()),
        })
    }
}

/// The report currently on display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedReport {
    pub request: ReportRequest,
    pub text: NonEmptyText,
    pub rendered: RenderedReport,
}

/// Result of one [`ReportLifecycle::submit`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub state: LifecycleState,
    pub displayed: Option<DisplayedReport>,
    pub saved: Option<SoilReport>,
    pub error: Option<LifecycleError>,
    pub notification: Notification,
}

/// Drives submissions, deletions and listings against the composed collaborators.
pub struct ReportLifecycle {
    generator: Arc<dyn ReportGenerator>,
    store: Arc<dyn ReportStore>,
    mode: PersistMode,
    state: LifecycleState,
    history: Vec<LifecycleState>,
    displayed: Option<DisplayedReport>,
}

impl ReportLifecycle {
    pub fn new(
        generator: Arc<dyn ReportGenerator>,
        store: Arc<dyn ReportStore>,
        mode: PersistMode,
    ) -> Self {
        Self {
            generator,
            store,
            mode,
            state: LifecycleState::Idle,
            history: vec![LifecycleState::Idle],
            displayed: None,
        }
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    /// Every state entered so far, starting with the initial `Idle`.
    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    pub fn displayed(&self) -> Option<&DisplayedReport> {
        self.displayed.as_ref()
    }

    pub fn mode(&self) -> PersistMode {
        self.mode
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "lifecycle transition");
        self.state = next.clone();
        self.history.push(next);
    }

    fn outcome(
        &self,
        saved: Option<SoilReport>,
        error: Option<LifecycleError>,
        notification: Notification,
    ) -> SubmissionOutcome {
        SubmissionOutcome {
            state: self.state.clone(),
            displayed: self.displayed.clone(),
            saved,
            error,
            notification,
        }
    }

    fn fail(&mut self, error: LifecycleError) -> SubmissionOutcome {
        self.transition(LifecycleState::Error(error.clone()));
        let notification = error.notification();
        self.outcome(None, Some(error), notification)
    }

    /// Runs one submission to completion or failure.
    pub async fn submit(&mut self, session: &Session, input: SubmissionInput) -> SubmissionOutcome {
        if self.state.is_settled() {
            self.transition(LifecycleState::Idle);
        }
        self.transition(LifecycleState::Validating);

        let request = match input.validate() {
            Ok(request) => request,
            Err(error) => return self.fail(error),
        };

        let owner: Option<AuthenticatedUser> = match self.mode {
            PersistMode::PreviewOnly => None,
            PersistMode::Persist => match session.user() {
                Some(user) => Some(user.clone()),
                None => return self.fail(LifecycleError::AuthRequired),
            },
        };

        self.transition(LifecycleState::Generating);
        let text = match self.generator.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(generator = self.generator.name(), "report generation failed: {e}");
                return self.fail(LifecycleError::GenerationFailed(e.to_string()));
            }
        };

        self.transition(LifecycleState::Rendering);
        self.displayed = Some(DisplayedReport {
            rendered: RenderedReport::from_text(text.as_str()),
            request: request.clone(),
            text: text.clone(),
        });

        let Some(owner) = owner else {
            self.transition(LifecycleState::Done);
            return self.outcome(None, None, Notification::report_generated());
        };

        self.transition(LifecycleState::Persisting);
        let new = NewSoilReport::from_request(owner.id, &request, text);
        match self.store.save(&owner, new).await {
            Ok(saved) => {
                tracing::info!(report_id = %saved.id, soil_type = %saved.soil_type, "soil report generated and saved");
                self.transition(LifecycleState::Done);
                self.outcome(Some(saved), None, Notification::report_generated())
            }
            Err(e) => {
                tracing::error!("failed to save generated report: {e}");
                self.fail(LifecycleError::PersistFailed(e.to_string()))
            }
        }
    }

    /// Deletes one of the session user's reports.
    ///
    /// # Errors
    ///
    /// `AuthRequired` for anonymous sessions, `DeleteFailed` when the store refuses.
    pub async fn delete(&self, session: &Session, id: ReportId) -> Result<Notification, LifecycleError> {
        let user = session.user().ok_or(LifecycleError::AuthRequired)?;
        match self.store.delete_by_id(user, id).await {
            Ok(()) => Ok(Notification::report_deleted()),
            Err(e) => {
                tracing::error!(report_id = %id, "failed to delete report: {e}");
                Err(LifecycleError::DeleteFailed {
                    not_found: matches!(e, StoreError::NotFound(_)),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Lists the session user's reports, newest first.
    ///
    /// # Errors
    ///
    /// `AuthRequired` for anonymous sessions, `ListFailed` when the store is unavailable.
    pub async fn list(&self, session: &Session) -> Result<Vec<SoilReport>, LifecycleError> {
        let user = session.user().ok_or(LifecycleError::AuthRequired)?;
        self.store.list_by_user(user).await.map_err(|e| {
            tracing::error!("failed to list reports: {e}");
            LifecycleError::ListFailed(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, GenerationResult, StoreResult};
    use crate::generator::StaticReportGenerator;
    use crate::markdown::DisplayBlock;
    use crate::report::UserId;
    use crate::repositories::MemoryReportStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Generator returning queued results in order, counting calls.
    #[derive(Default)]
    struct ScriptedGenerator {
        calls: AtomicUsize,
        script: Mutex<Vec<Option<&'static str>>>,
    }

    impl ScriptedGenerator {
        fn returning(results: Vec<Option<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(results.into_iter().rev().collect()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReportGenerator for ScriptedGenerator {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn generate(&self, _request: &ReportRequest) -> GenerationResult<NonEmptyText> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop().flatten() {
                Some(text) => Ok(NonEmptyText::new(text).unwrap()),
                None => Err(GenerationError::Upstream("model overloaded".into())),
            }
        }
    }

    /// Memory store that counts every call.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryReportStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReportStore for CountingStore {
        async fn save(
            &self,
            user: &AuthenticatedUser,
            report: NewSoilReport,
        ) -> StoreResult<SoilReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.save(user, report).await
        }

        async fn list_by_user(&self, user: &AuthenticatedUser) -> StoreResult<Vec<SoilReport>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_by_user(user).await
        }

        async fn delete_by_id(&self, user: &AuthenticatedUser, id: ReportId) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete_by_id(user, id).await
        }
    }

    fn signed_in() -> Session {
        Session::authenticated(AuthenticatedUser {
            id: UserId::new(Uuid::from_u128(7)),
            email: Some("grower@example.com".into()),
            access_token: "token".into(),
        })
    }

    fn lifecycle(
        generator: Arc<ScriptedGenerator>,
        store: Arc<CountingStore>,
        mode: PersistMode,
    ) -> ReportLifecycle {
        ReportLifecycle::new(generator, store, mode)
    }

    #[tokio::test]
    async fn missing_soil_type_contacts_no_collaborator() {
        for soil_type in [None, Some(""), Some("   "), Some("gravel")] {
            let generator = ScriptedGenerator::returning(vec![Some("## Report")]);
            let store = Arc::new(CountingStore::default());
            let mut lc = lifecycle(generator.clone(), store.clone(), PersistMode::Persist);

            let input = SubmissionInput {
                soil_type: soil_type.map(str::to_string),
                ..SubmissionInput::default()
            };
            let outcome = lc.submit(&signed_in(), input).await;

            assert_eq!(outcome.state, LifecycleState::Error(LifecycleError::MissingField));
            assert_eq!(outcome.notification.title, "Missing information");
            assert_eq!(outcome.notification.description, "Please select a soil type.");
            assert_eq!(generator.calls(), 0);
            assert_eq!(store.calls(), 0);
            assert_eq!(
                lc.history(),
                &[
                    LifecycleState::Idle,
                    LifecycleState::Validating,
                    LifecycleState::Error(LifecycleError::MissingField),
                ]
            );
        }
    }

    #[tokio::test]
    async fn anonymous_submission_requires_auth_when_persisting() {
        let generator = ScriptedGenerator::returning(vec![Some("## Report")]);
        let store = Arc::new(CountingStore::default());
        let mut lc = lifecycle(generator.clone(), store.clone(), PersistMode::Persist);

        let outcome = lc.submit(&Session::anonymous(), SubmissionInput::new("clay")).await;

        assert_eq!(outcome.error, Some(LifecycleError::AuthRequired));
        assert_eq!(outcome.notification.title, "Authentication required");
        assert!(outcome.displayed.is_none());
        assert_eq!(generator.calls(), 0);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn successful_submission_displays_and_saves() {
        let generator = ScriptedGenerator::returning(vec![Some("## Clay\n- heavy")]);
        let store = Arc::new(CountingStore::default());
        let mut lc = lifecycle(generator, store.clone(), PersistMode::Persist);
        let session = signed_in();

        let input = SubmissionInput {
            soil_type: Some("Clay".into()),
            location: Some("  North field ".into()),
            additional_info: Some("   ".into()),
        };
        let outcome = lc.submit(&session, input).await;

        assert_eq!(outcome.state, LifecycleState::Done);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.notification, Notification::report_generated());

        let displayed = outcome.displayed.unwrap();
        assert_eq!(
            displayed.rendered.blocks,
            vec![
                DisplayBlock::Heading("Clay".into()),
                DisplayBlock::ListItem("heavy".into())
            ]
        );

        let saved = outcome.saved.unwrap();
        assert_eq!(saved.soil_type, SoilType::Clay);
        assert_eq!(saved.location.as_ref().map(|l| l.as_str()), Some("North field"));
        assert!(saved.additional_info.is_none());
        assert_eq!(saved.report_content.as_str(), "## Clay\n- heavy");

        assert_eq!(
            lc.history(),
            &[
                LifecycleState::Idle,
                LifecycleState::Validating,
                LifecycleState::Generating,
                LifecycleState::Rendering,
                LifecycleState::Persisting,
                LifecycleState::Done,
            ]
        );
        assert_eq!(lc.list(&session).await.unwrap(), vec![saved]);
    }

    #[tokio::test]
    async fn store_failure_keeps_generated_report_visible() {
        let generator = ScriptedGenerator::returning(vec![Some("## Sandy\nDrains quickly.")]);
        let store = Arc::new(CountingStore::default());
        store.inner.set_simulate_unavailable(true);
        let mut lc = lifecycle(generator, store.clone(), PersistMode::Persist);

        let outcome = lc.submit(&signed_in(), SubmissionInput::new("sandy")).await;

        assert!(matches!(
            outcome.state,
            LifecycleState::Error(LifecycleError::PersistFailed(_))
        ));
        assert_eq!(outcome.notification.title, "Report not saved");
        assert!(outcome.saved.is_none());
        let displayed = outcome.displayed.unwrap();
        assert_eq!(displayed.text.as_str(), "## Sandy\nDrains quickly.");
        assert_eq!(displayed.rendered.blocks.len(), 2);
        assert_eq!(lc.displayed(), Some(&displayed));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn generation_failure_leaves_prior_report_untouched() {
        let generator = ScriptedGenerator::returning(vec![Some("## Loam\nBalanced."), None]);
        let store = Arc::new(CountingStore::default());
        let mut lc = lifecycle(generator.clone(), store.clone(), PersistMode::Persist);
        let session = signed_in();

        let first = lc.submit(&session, SubmissionInput::new("loam")).await;
        assert_eq!(first.state, LifecycleState::Done);
        let prior = lc.displayed().cloned();

        let second = lc.submit(&session, SubmissionInput::new("peaty")).await;
        assert!(matches!(
            second.error,
            Some(LifecycleError::GenerationFailed(_))
        ));
        assert_eq!(
            second.notification.description,
            "Failed to generate soil report. Please try again."
        );
        assert_eq!(lc.displayed().cloned(), prior);
        assert_eq!(second.displayed, prior);
        assert_eq!(generator.calls(), 2);
        // Only the first submission reached the store.
        assert_eq!(store.calls(), 1);

        // Done re-arms to Idle at the start of the second submission.
        let tail: Vec<&str> = lc.history()[5..].iter().map(LifecycleState::name).collect();
        assert_eq!(tail, vec!["done", "idle", "validating", "generating", "error"]);
    }

    #[tokio::test]
    async fn preview_only_never_needs_identity_or_store() {
        let store = Arc::new(CountingStore::default());
        let mut lc = ReportLifecycle::new(
            Arc::new(StaticReportGenerator::new()),
            store.clone(),
            PersistMode::PreviewOnly,
        );

        let outcome = lc.submit(&Session::anonymous(), SubmissionInput::new("chalky")).await;

        assert_eq!(outcome.state, LifecycleState::Done);
        assert!(outcome.saved.is_none());
        assert!(!outcome.displayed.unwrap().rendered.is_empty());
        assert_eq!(store.calls(), 0);
        assert!(!lc.history().contains(&LifecycleState::Persisting));
    }

    #[tokio::test]
    async fn delete_then_list_excludes_report() {
        let generator = ScriptedGenerator::returning(vec![Some("one"), Some("two")]);
        let store = Arc::new(CountingStore::default());
        let mut lc = lifecycle(generator, store, PersistMode::Persist);
        let session = signed_in();

        let first = lc.submit(&session, SubmissionInput::new("silt")).await.saved.unwrap();
        let second = lc.submit(&session, SubmissionInput::new("clay")).await.saved.unwrap();

        let notification = lc.delete(&session, first.id).await.unwrap();
        assert_eq!(notification, Notification::report_deleted());

        let listed = lc.list(&session).await.unwrap();
        assert_eq!(listed, vec![second]);

        match lc.delete(&session, first.id).await {
            Err(LifecycleError::DeleteFailed { not_found, .. }) => assert!(not_found),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_and_delete_require_identity_and_surface_store_failures() {
        let store = Arc::new(CountingStore::default());
        let lc = lifecycle(ScriptedGenerator::returning(vec![]), store.clone(), PersistMode::Persist);

        assert_eq!(
            lc.list(&Session::anonymous()).await,
            Err(LifecycleError::AuthRequired)
        );
        assert_eq!(
            lc.delete(&Session::anonymous(), ReportId::generate()).await,
            Err(LifecycleError::AuthRequired)
        );
        assert_eq!(store.calls(), 0);

        assert!(lc.list(&signed_in()).await.unwrap().is_empty());

        store.inner.set_simulate_unavailable(true);
        let err = lc.list(&signed_in()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ListFailed(_)));
        assert_eq!(err.notification().description, "Failed to load your soil reports.");

        let err = lc.delete(&signed_in(), ReportId::generate()).await.unwrap_err();
        assert_eq!(err.notification().description, "Failed to delete the soil report.");
    }
}
