//! Soil report entities.
//!
//! Field names serialise to the column names of the `soil_reports` collection so the same
//! types travel unchanged between the hosted store, the in-memory store and the REST API.

use agrihealth_types::{NonEmptyText, SoilType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a signed-in user, as issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Store-assigned report identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(Uuid);

impl ReportId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Allocates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated parameters handed to a report generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub soil_type: SoilType,
    pub location: Option<NonEmptyText>,
    pub additional_info: Option<NonEmptyText>,
}

impl ReportRequest {
    pub fn new(soil_type: SoilType) -> Self {
        Self {
            soil_type,
            location: None,
            additional_info: None,
        }
    }
}

/// A report ready to be saved; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSoilReport {
    pub user_id: UserId,
    pub soil_type: SoilType,
    pub location: Option<NonEmptyText>,
    pub additional_info: Option<NonEmptyText>,
    pub report_content: NonEmptyText,
}

impl NewSoilReport {
    pub fn from_request(user_id: UserId, request: &ReportRequest, content: NonEmptyText) -> Self {
        Self {
            user_id,
            soil_type: request.soil_type,
            location: request.location.clone(),
            additional_info: request.additional_info.clone(),
            report_content: content,
        }
    }
}

/// A persisted soil report. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilReport {
    pub id: ReportId,
    pub user_id: UserId,
    pub soil_type: SoilType,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub location: Option<NonEmptyText>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub additional_info: Option<NonEmptyText>,
    pub report_content: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

// Hosted rows may carry "" for optional columns.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NonEmptyText>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(NonEmptyText::optional(raw))
}

impl SoilReport {
    /// Builds the stored entity from a new report and its store-assigned fields.
    pub fn from_new(id: ReportId, created_at: DateTime<Utc>, new: NewSoilReport) -> Self {
        Self {
            id,
            user_id: new.user_id,
            soil_type: new.soil_type,
            location: new.location,
            additional_info: new.additional_info,
            report_content: new.report_content,
            created_at,
        }
    }

    /// Display title, e.g. "Clay Soil Report".
    pub fn title(&self) -> String {
        format!("{} Report", self.soil_type.label())
    }

    pub fn location_or_default(&self) -> &str {
        self.location
            .as_ref()
            .map(NonEmptyText::as_str)
            .unwrap_or("Not specified")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SoilReport {
        SoilReport::from_new(
            ReportId::new(Uuid::nil()),
            DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            NewSoilReport {
                user_id: UserId::new(Uuid::nil()),
                soil_type: SoilType::Peaty,
                location: None,
                additional_info: NonEmptyText::optional(Some("waterlogged in winter")),
                report_content: NonEmptyText::new("## Peaty Soil Analysis Report").unwrap(),
            },
        )
    }

    #[test]
    fn serialises_with_collection_column_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["soil_type"], "peaty");
        assert_eq!(value["additional_info"], "waterlogged in winter");
        assert!(value["location"].is_null());
        assert_eq!(value["report_content"], "## Peaty Soil Analysis Report");
        assert!(value["created_at"].as_str().unwrap().starts_with("2025-03-01"));
    }

    #[test]
    fn deserialises_rows_without_optional_columns() {
        let row = serde_json::json!({
            "id": "7f1d3f2e-8a6b-4c1e-9d7a-2b3c4d5e6f70",
            "user_id": "00000000-0000-0000-0000-000000000001",
            "soil_type": "clay",
            "report_content": "text",
            "created_at": "2025-03-01T09:00:00+00:00"
        });
        let report: SoilReport = serde_json::from_value(row).unwrap();
        assert_eq!(report.soil_type, SoilType::Clay);
        assert!(report.location.is_none());
    }

    #[test]
    fn blank_optional_columns_read_as_absent() {
        let row = serde_json::json!({
            "id": "7f1d3f2e-8a6b-4c1e-9d7a-2b3c4d5e6f70",
            "user_id": "00000000-0000-0000-0000-000000000001",
            "soil_type": "loam",
            "location": "",
            "additional_info": null,
            "report_content": "text",
            "created_at": "2025-03-01T09:00:00+00:00"
        });
        let report: SoilReport = serde_json::from_value(row).unwrap();
        assert!(report.location.is_none());
        assert!(report.additional_info.is_none());
    }

    #[test]
    fn title_and_location_fallback() {
        let report = sample();
        assert_eq!(report.title(), "Peaty Soil Report");
        assert_eq!(report.location_or_default(), "Not specified");
    }
}
