use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::exercise::style::PresentationStyle;
use crate::session::result::{BatchSubmission, TestSubmission};

/// A single-result payload exactly as received. Fields stay loosely typed
/// until the store validates them, so a wrong type is a validation error
/// rather than a decode failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    #[serde(default)]
    pub test_id: Option<Value>,
    #[serde(default)]
    pub style: Option<Value>,
    #[serde(default)]
    pub is_simplified: Option<Value>,
    #[serde(default)]
    pub correct_words: Option<Value>,
    #[serde(default)]
    pub total_words: Option<Value>,
    #[serde(default)]
    pub score: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBatch {
    #[serde(default)]
    pub participant_id: Option<Value>,
    #[serde(default)]
    pub results: Option<Vec<RawSubmission>>,
}

impl From<&TestSubmission> for RawSubmission {
    fn from(sub: &TestSubmission) -> Self {
        Self {
            test_id: Some(Value::from(sub.test_id.as_str())),
            style: Some(Value::from(sub.style.as_str())),
            is_simplified: Some(Value::from(sub.is_simplified)),
            correct_words: Some(Value::from(sub.correct_words)),
            total_words: Some(Value::from(sub.total_words)),
            // non-finite scores become null
            score: Some(Value::from(sub.score)),
        }
    }
}

impl From<&BatchSubmission> for RawBatch {
    fn from(batch: &BatchSubmission) -> Self {
        Self {
            participant_id: Some(Value::from(batch.participant_id.as_str())),
            results: Some(batch.results.iter().map(RawSubmission::from).collect()),
        }
    }
}

/// One per-result file on disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    pub test_id: String,
    pub style: PresentationStyle,
    pub is_simplified: bool,
    pub correct_words: u32,
    pub total_words: u32,
    pub score: Option<f64>,
    pub timestamp: String,
}

impl StoredResult {
    pub fn new(
        id: String,
        participant_id: Option<String>,
        sub: &TestSubmission,
        timestamp: &str,
    ) -> Self {
        Self {
            id,
            participant_id,
            test_id: sub.test_id.clone(),
            style: sub.style,
            is_simplified: sub.is_simplified,
            correct_words: sub.correct_words,
            total_words: sub.total_words,
            score: sub.score.is_finite().then_some(sub.score),
            timestamp: timestamp.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAllResponse {
    pub success: bool,
    pub participant_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub results: Vec<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
