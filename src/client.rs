use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;

use thiserror::Error;

use crate::session::result::{BatchSubmission, TestSubmission};
use crate::store::result_store::{ResultStore, StoreError};
use crate::store::schema::{RawBatch, RawSubmission};

pub const SUBMIT_FAILED_NOTICE: &str =
    "There was a problem submitting your results. Please try again.";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[cfg(feature = "network")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("server answered with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("submission worker stopped before reporting back")]
    WorkerLost,
}

/// Where finished results go. Implementations block; callers run them off
/// the UI thread through [`SubmissionTracker`].
pub trait Submitter: Send + Sync {
    /// Returns the id the result was stored under.
    fn submit(&self, result: &TestSubmission) -> Result<String, SubmitError>;

    /// Returns the participant id the batch was stored under.
    fn submit_batch(&self, batch: &BatchSubmission) -> Result<String, SubmitError>;
}

/// Writes straight into a result directory on this machine.
pub struct LocalSubmitter {
    store: ResultStore,
}

impl LocalSubmitter {
    pub fn new(store: ResultStore) -> Self {
        Self { store }
    }
}

impl Submitter for LocalSubmitter {
    fn submit(&self, result: &TestSubmission) -> Result<String, SubmitError> {
        Ok(self.store.submit(&RawSubmission::from(result))?)
    }

    fn submit_batch(&self, batch: &BatchSubmission) -> Result<String, SubmitError> {
        Ok(self.store.submit_batch(&RawBatch::from(batch))?)
    }
}

/// Posts results to a running `ctest serve` instance.
#[cfg(feature = "network")]
pub struct HttpSubmitter {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "network")]
impl HttpSubmitter {
    pub fn new(base_url: &str) -> Result<Self, SubmitError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn post<B, R>(&self, path: &str, body: &B) -> Result<R, SubmitError>
    where
        B: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<crate::store::schema::ErrorResponse>()
                .map(|e| e.error)
                .unwrap_or_default();
            return Err(SubmitError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json()?)
    }
}

#[cfg(feature = "network")]
impl Submitter for HttpSubmitter {
    fn submit(&self, result: &TestSubmission) -> Result<String, SubmitError> {
        let response: crate::store::schema::SubmitResponse = self.post("/api/submit", result)?;
        Ok(response.id)
    }

    fn submit_batch(&self, batch: &BatchSubmission) -> Result<String, SubmitError> {
        let response: crate::store::schema::SubmitAllResponse =
            self.post("/api/submit-all", batch)?;
        Ok(response.participant_id)
    }
}

#[derive(Clone, Debug)]
pub enum SubmitRequest {
    Single(TestSubmission),
    Batch(BatchSubmission),
}

pub struct SubmitOutcome {
    pub request: SubmitRequest,
    pub result: Result<String, SubmitError>,
}

/// Runs one submission at a time on a worker thread. Poll it on every tick.
pub struct SubmissionTracker {
    submitter: Arc<dyn Submitter>,
    in_flight: Option<(SubmitRequest, mpsc::Receiver<Result<String, SubmitError>>)>,
}

impl SubmissionTracker {
    pub fn new(submitter: Arc<dyn Submitter>) -> Self {
        Self {
            submitter,
            in_flight: None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a submission. Returns false, without starting anything, while
    /// another one is still running.
    pub fn start(&mut self, request: SubmitRequest) -> bool {
        if self.in_flight.is_some() {
            log::debug!("submission already in flight; ignoring request");
            return false;
        }
        let (tx, rx) = mpsc::channel();
        let submitter = Arc::clone(&self.submitter);
        let job = request.clone();
        thread::spawn(move || {
            let result = match &job {
                SubmitRequest::Single(result) => submitter.submit(result),
                SubmitRequest::Batch(batch) => submitter.submit_batch(batch),
            };
            let _ = tx.send(result);
        });
        self.in_flight = Some((request, rx));
        true
    }

    /// The finished submission, if the worker has reported back.
    pub fn poll(&mut self) -> Option<SubmitOutcome> {
        let (_, rx) = self.in_flight.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(SubmitError::WorkerLost),
        };
        let (request, _) = self.in_flight.take()?;
        match &result {
            Ok(id) => log::info!("submission stored as {id}"),
            Err(e) => log::error!("submission failed: {e}"),
        }
        Some(SubmitOutcome { request, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::exercise::style::PresentationStyle;
    use tempfile::TempDir;

    fn result(test_id: &str) -> TestSubmission {
        TestSubmission {
            test_id: test_id.to_string(),
            style: PresentationStyle::Box,
            is_simplified: false,
            correct_words: 8,
            total_words: 10,
            score: 80.0,
        }
    }

    fn wait_for(tracker: &mut SubmissionTracker) -> SubmitOutcome {
        for _ in 0..500 {
            if let Some(outcome) = tracker.poll() {
                return outcome;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("submission never finished");
    }

    struct FailingSubmitter {
        calls: AtomicUsize,
    }

    impl Submitter for FailingSubmitter {
        fn submit(&self, _result: &TestSubmission) -> Result<String, SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SubmitError::Status {
                status: 500,
                message: "Failed to save test result".to_string(),
            })
        }

        fn submit_batch(&self, _batch: &BatchSubmission) -> Result<String, SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SubmitError::WorkerLost)
        }
    }

    #[test]
    fn test_local_submitter_writes_results() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path());
        let submitter = LocalSubmitter::new(store.clone());
        let id = submitter.submit(&result("bio")).unwrap();
        assert!(id.starts_with("bio-"));

        let batch = BatchSubmission {
            participant_id: "abcd1234".to_string(),
            results: vec![result("bio"), result("hist")],
            timestamp: String::new(),
        };
        assert_eq!(submitter.submit_batch(&batch).unwrap(), "abcd1234");
        // 1 single + 1 aggregate + 2 entries
        assert_eq!(store.list().unwrap().len(), 4);
    }

    #[test]
    fn test_tracker_reports_success() {
        let dir = TempDir::new().unwrap();
        let submitter = Arc::new(LocalSubmitter::new(ResultStore::new(dir.path())));
        let mut tracker = SubmissionTracker::new(submitter);
        assert!(tracker.start(SubmitRequest::Single(result("bio"))));
        assert!(tracker.is_in_flight());
        let outcome = wait_for(&mut tracker);
        assert!(outcome.result.is_ok());
        assert!(!tracker.is_in_flight());
    }

    #[test]
    fn test_tracker_rejects_duplicate_start() {
        let submitter = Arc::new(FailingSubmitter {
            calls: AtomicUsize::new(0),
        });
        let mut tracker = SubmissionTracker::new(submitter.clone());
        assert!(tracker.start(SubmitRequest::Single(result("bio"))));
        assert!(!tracker.start(SubmitRequest::Single(result("bio"))));
        let outcome = wait_for(&mut tracker);
        assert!(outcome.result.is_err());
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_request_can_be_retried() {
        let submitter = Arc::new(FailingSubmitter {
            calls: AtomicUsize::new(0),
        });
        let mut tracker = SubmissionTracker::new(submitter.clone());
        tracker.start(SubmitRequest::Single(result("bio")));
        let outcome = wait_for(&mut tracker);
        assert!(tracker.start(outcome.request));
        wait_for(&mut tracker);
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 2);
    }
}
