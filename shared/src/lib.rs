use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyzeRequest {
    pub image_data: String,
}

impl AnalyzeRequest {
    /// Base64 payload with any data-URL prefix (`data:image/png;base64,`) removed.
    pub fn payload(&self) -> &str {
        match self.image_data.split_once("base64,") {
            Some((_, payload)) => payload,
            None => &self.image_data,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Dimension heuristics for a single upload. `error` is set instead of the
/// dimensions when they could not be read.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct ReportShapeInfo {
    pub is_ecg_report: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportShapeInfo {
    pub fn measured(is_ecg_report: bool, width: u32, height: u32) -> Self {
        Self {
            is_ecg_report,
            image_width: Some(width),
            image_height: Some(height),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            is_ecg_report: false,
            image_width: None,
            image_height: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Diagnosis {
    pub prediction: String,
    pub confidence: u8,
    pub risk: RiskLevel,
    pub details: Vec<String>,
    pub ecg_type: ReportShapeInfo,
}

/// Outcome of one analysis: either a full diagnosis or a single `error` field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum ClassificationResult {
    Success(Diagnosis),
    Failure { error: String },
}

impl ClassificationResult {
    pub fn failure(error: impl Into<String>) -> Self {
        ClassificationResult::Failure {
            error: error.into(),
        }
    }

    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        match self {
            ClassificationResult::Success(diagnosis) => Some(diagnosis),
            ClassificationResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ClassificationResult::Success(_) => None,
            ClassificationResult::Failure { error } => Some(error),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SaveHistoryRequest {
    pub prediction: String,
    pub confidence: u8,
    pub risk: RiskLevel,
    pub thumbnail_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub date: String,
    pub prediction: String,
    pub confidence: u8,
    pub risk: RiskLevel,
    pub thumbnail_url: String,
}
