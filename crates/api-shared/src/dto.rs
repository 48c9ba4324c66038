//! Request and response bodies of the REST API.
//!
//! Field names are camelCase on the wire. Conversions from core types live next to each DTO.

use agrihealth_core::lifecycle::{Notification, NotificationVariant};
use agrihealth_core::{DisplayBlock, SoilReport, SoilType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body. `error` is always present; lifecycle failures also carry their notification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationRes>,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            notification: None,
        }
    }

    pub fn with_notification(error: impl Into<String>, notification: &Notification) -> Self {
        Self {
            error: error.into(),
            notification: Some(notification.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationRes {
    pub title: String,
    pub description: String,
    /// `success` or `destructive`.
    pub variant: String,
}

impl From<&Notification> for NotificationRes {
    fn from(n: &Notification) -> Self {
        Self {
            title: n.title.clone(),
            description: n.description.clone(),
            variant: match n.variant {
                NotificationVariant::Success => "success".into(),
                NotificationVariant::Destructive => "destructive".into(),
            },
        }
    }
}

/// One rendered report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DisplayBlockRes {
    /// `heading`, `sub_heading`, `list_item`, `numbered_item`, `line_break` or `paragraph`.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<&DisplayBlock> for DisplayBlockRes {
    fn from(block: &DisplayBlock) -> Self {
        Self {
            kind: block.kind().to_string(),
            text: block.text().map(str::to_string),
        }
    }
}

pub fn blocks_res(blocks: &[DisplayBlock]) -> Vec<DisplayBlockRes> {
    blocks.iter().map(DisplayBlockRes::from).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderReq {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderRes {
    pub blocks: Vec<DisplayBlockRes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SoilTypeRes {
    pub id: String,
    pub label: String,
}

impl From<SoilType> for SoilTypeRes {
    fn from(soil_type: SoilType) -> Self {
        Self {
            id: soil_type.as_str().to_string(),
            label: soil_type.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportReq {
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRes {
    pub id: String,
    pub user_id: String,
    pub soil_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub report_content: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<&SoilReport> for ReportRes {
    fn from(report: &SoilReport) -> Self {
        Self {
            id: report.id.to_string(),
            user_id: report.user_id.to_string(),
            soil_type: report.soil_type.as_str().to_string(),
            title: report.title(),
            location: report.location.as_ref().map(|l| l.as_str().to_string()),
            additional_info: report
                .additional_info
                .as_ref()
                .map(|i| i.as_str().to_string()),
            report_content: report.report_content.as_str().to_string(),
            created_at: report.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitReportRes {
    /// Final lifecycle state: `done` or `error`.
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportRes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<DisplayBlockRes>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub notification: NotificationRes,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListReportsRes {
    pub reports: Vec<ReportRes>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDetailRes {
    pub report: ReportRes,
    pub blocks: Vec<DisplayBlockRes>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpReq {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRes {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRes {
    pub user_id: String,
    pub confirmation_required: bool,
    pub notification: NotificationRes,
}

/// Body of the soil-analysis function.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SoilAnalysisReq {
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SoilAnalysisRes {
    pub report: String,
}
