//! Hosted record store client for the `soil_reports` collection.

use super::{ensure_owner, ReportStore};
use crate::constants::{REST_API_PATH, SOIL_REPORTS_TABLE};
use crate::error::{StoreError, StoreResult};
use crate::hosted::{error_message, with_project_key};
use crate::identity::AuthenticatedUser;
use crate::report::{NewSoilReport, ReportId, SoilReport};
use async_trait::async_trait;

const RETURN_REPRESENTATION: &str = "return=representation";

/// Report store backed by the hosted record-store API.
///
/// Requests carry the caller's access token, so row-level security on the backend applies in
/// addition to the explicit `user_id` filters sent here.
#[derive(Clone, Debug)]
pub struct PostgrestReportStore {
    client: reqwest::Client,
    table_url: String,
    anon_key: String,
}

impl PostgrestReportStore {
    pub fn new(client: reqwest::Client, base_url: &str, anon_key: impl Into<String>) -> Self {
        Self {
            client,
            table_url: format!(
                "{}{REST_API_PATH}/{SOIL_REPORTS_TABLE}",
                base_url.trim_end_matches('/')
            ),
            anon_key: anon_key.into(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("record store unreachable: {e}");
            StoreError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = error_message(response).await;
        tracing::warn!("record store returned {status}: {message}");
        Err(StoreError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn rows(response: reqwest::Response) -> StoreResult<Vec<SoilReport>> {
        response
            .json::<Vec<SoilReport>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ReportStore for PostgrestReportStore {
    async fn save(
        &self,
        user: &AuthenticatedUser,
        report: NewSoilReport,
    ) -> StoreResult<SoilReport> {
        ensure_owner(user, &report)?;

        let request = with_project_key(
            self.client.post(&self.table_url),
            &self.anon_key,
            &user.access_token,
        )
        .header("Prefer", RETURN_REPRESENTATION)
        .json(&[&report]);

        let response = self.send(request).await?;
        let stored = Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))?;
        tracing::debug!(report_id = %stored.id, user_id = %user.id, "report saved");
        Ok(stored)
    }

    async fn list_by_user(&self, user: &AuthenticatedUser) -> StoreResult<Vec<SoilReport>> {
        let request = with_project_key(
            self.client.get(&self.table_url),
            &self.anon_key,
            &user.access_token,
        )
        .query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user.id)),
            ("order", "created_at.desc".to_string()),
        ]);

        let response = self.send(request).await?;
        Self::rows(response).await
    }

    async fn delete_by_id(&self, user: &AuthenticatedUser, id: ReportId) -> StoreResult<()> {
        let request = with_project_key(
            self.client.delete(&self.table_url),
            &self.anon_key,
            &user.access_token,
        )
        .query(&[
            ("id", format!("eq.{id}")),
            ("user_id", format!("eq.{}", user.id)),
        ]);

        // Any success from the backend counts, whether or not a row matched.
        self.send(request).await?;
        tracing::debug!(report_id = %id, user_id = %user.id, "report deleted");
        Ok(())
    }
}
