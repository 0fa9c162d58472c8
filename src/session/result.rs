use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::exercise::scoring::ScoreSummary;
use crate::exercise::style::PresentationStyle;

/// Outcome of one completed c-test, as sent to the result endpoints.
///
/// A test without target words scores NaN, which travels as JSON `null`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSubmission {
    pub test_id: String,
    pub style: PresentationStyle,
    pub is_simplified: bool,
    pub correct_words: u32,
    pub total_words: u32,
    #[serde(default = "nan", deserialize_with = "score_or_nan")]
    pub score: f64,
}

impl TestSubmission {
    pub fn from_summary(
        test_id: &str,
        style: PresentationStyle,
        is_simplified: bool,
        summary: &ScoreSummary,
    ) -> Self {
        Self {
            test_id: test_id.to_string(),
            style,
            is_simplified,
            correct_words: summary.correct_words,
            total_words: summary.total_words,
            score: summary.score,
        }
    }
}

/// Every result of one participant's session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmission {
    pub participant_id: String,
    pub results: Vec<TestSubmission>,
    pub timestamp: String,
}

fn nan() -> f64 {
    f64::NAN
}

fn score_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// ISO-8601 UTC timestamp with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission(correct: u32, total: u32) -> TestSubmission {
        TestSubmission {
            test_id: "biology-1-standard".to_string(),
            style: PresentationStyle::Span,
            is_simplified: false,
            correct_words: correct,
            total_words: total,
            score: crate::exercise::scoring::compute_score(correct, total),
        }
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let json = serde_json::to_value(submission(8, 10)).unwrap();
        assert_eq!(json["testId"], "biology-1-standard");
        assert_eq!(json["style"], "span");
        assert_eq!(json["isSimplified"], false);
        assert_eq!(json["correctWords"], 8);
        assert_eq!(json["totalWords"], 10);
        assert_eq!(json["score"], 80.0);
    }

    #[test]
    fn test_nan_score_travels_as_null() {
        let json = serde_json::to_string(&submission(0, 0)).unwrap();
        assert!(json.contains("\"score\":null"));
        let back: TestSubmission = serde_json::from_str(&json).unwrap();
        assert!(back.score.is_nan());
    }

    #[test]
    fn test_iso_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(iso_timestamp(at), "2026-03-01T09:05:07.000Z");
    }
}
