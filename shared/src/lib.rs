use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};

pub const ANALYZE_ENDPOINT: &str = "/api/analyze";
pub const IMAGE_FIELD: &str = "image";

/// Outcome class of an interpreted classification.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Finding {
    /// The label matched `nondemented`.
    Negative,
    /// Any other label.
    Positive,
    /// The classifier response could not be interpreted.
    Undetermined,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InterpretedResult {
    pub label: String,
    pub confidence: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub finding: Finding,
}

/// Everything the page shows for one submitted image.
///
/// `result` and `explanation` are only set when the classifier answered with
/// a success status; `error` is only set when it did not.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalysisReport {
    pub request_id: String,
    pub file_name: String,
    pub image_sha256: String,
    pub status_code: u16,
    pub raw_response: Value,
    pub result: Option<InterpretedResult>,
    pub explanation: Option<String>,
    pub error: Option<String>,
}

impl AnalysisReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status_code)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
