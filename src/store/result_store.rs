use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::exercise::scoring::compute_score;
use crate::exercise::style::PresentationStyle;
use crate::session::result::{BatchSubmission, TestSubmission, iso_timestamp};
use crate::store::schema::{RawBatch, RawSubmission, StoredResult};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("invalid submission: {0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_invalid(&self) -> bool {
        matches!(self, StoreError::Invalid(_))
    }
}

/// Flat-file result storage: one JSON document per result plus one
/// aggregate document per participant batch.
#[derive(Clone, Debug)]
pub struct ResultStore {
    base_dir: PathBuf,
}

impl ResultStore {
    /// The directory is created on first write, not here.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn submit(&self, raw: &RawSubmission) -> Result<String, StoreError> {
        self.submit_at(raw, Utc::now())
    }

    /// Validate and persist one result. Returns the generated id.
    pub fn submit_at(&self, raw: &RawSubmission, now: DateTime<Utc>) -> Result<String, StoreError> {
        let sub = validate_submission(raw)?;
        let timestamp = iso_timestamp(now);
        let id = format!("{}-{}", sub.test_id, timestamp);
        let record = StoredResult::new(id.clone(), None, &sub, &timestamp);
        self.write_json(&file_name(&id), &record)?;
        log::info!(
            "saved result {id} ({}/{} correct, {})",
            sub.correct_words,
            sub.total_words,
            sub.style
        );
        Ok(id)
    }

    pub fn submit_batch(&self, raw: &RawBatch) -> Result<String, StoreError> {
        self.submit_batch_at(raw, Utc::now())
    }

    /// Validate every entry, then write the aggregate file followed by one
    /// file per entry. Returns the participant id.
    pub fn submit_batch_at(&self, raw: &RawBatch, now: DateTime<Utc>) -> Result<String, StoreError> {
        let participant_id = raw
            .participant_id
            .as_ref()
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .ok_or(StoreError::Invalid("participantId is required"))?
            .to_string();
        let entries = match raw.results.as_deref() {
            Some(entries) if !entries.is_empty() => entries,
            _ => return Err(StoreError::Invalid("results must be a non-empty list")),
        };
        let results = entries
            .iter()
            .map(validate_submission)
            .collect::<Result<Vec<_>, _>>()?;

        let timestamp = iso_timestamp(now);
        let batch = BatchSubmission {
            participant_id: participant_id.clone(),
            results,
            timestamp: timestamp.clone(),
        };
        self.write_json(
            &file_name(&format!("participant-{participant_id}-{timestamp}")),
            &batch,
        )?;

        for (index, sub) in batch.results.iter().enumerate() {
            let id = format!("{}-{}-{}", sub.test_id, timestamp, index);
            let record = StoredResult::new(id.clone(), Some(participant_id.clone()), sub, &timestamp);
            self.write_json(&file_name(&id), &record)?;
        }
        log::info!(
            "saved batch for participant {participant_id} ({} results)",
            batch.results.len()
        );
        Ok(participant_id)
    }

    /// Parsed contents of every `*.json` file, in directory order.
    pub fn list(&self) -> Result<Vec<Value>, StoreError> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut results = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            results.push(serde_json::from_str(&content)?);
        }
        Ok(results)
    }

    fn write_json<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.base_dir.join(name);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// Check the required fields of a raw payload. The score is always
/// recomputed from the counts.
pub fn validate_submission(raw: &RawSubmission) -> Result<TestSubmission, StoreError> {
    let test_id = raw
        .test_id
        .as_ref()
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or(StoreError::Invalid("testId is required"))?;
    let style = raw
        .style
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<PresentationStyle>().ok())
        .ok_or(StoreError::Invalid("style must be box, underline or span"))?;
    let correct_words = count_field(raw.correct_words.as_ref())
        .ok_or(StoreError::Invalid("correctWords must be a whole number"))?;
    let total_words = count_field(raw.total_words.as_ref())
        .ok_or(StoreError::Invalid("totalWords must be a whole number"))?;
    let is_simplified = raw
        .is_simplified
        .as_ref()
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(TestSubmission {
        test_id: test_id.to_string(),
        style,
        is_simplified,
        correct_words,
        total_words,
        score: compute_score(correct_words, total_words),
    })
}

/// Any JSON number with no fractional part, so `8` and `8.0` both count.
fn count_field(value: Option<&Value>) -> Option<u32> {
    value?
        .as_f64()
        .filter(|n| n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(n))
        .map(|n| n as u32)
}

/// `:` becomes `-`; anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn file_name(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| match c {
            ':' => '-',
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => c,
            _ => '_',
        })
        .collect();
    format!("{safe}.json")
}
