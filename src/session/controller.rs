use chrono::Utc;

use crate::exercise::style::PresentationStyle;
use crate::session::result::{BatchSubmission, TestSubmission, iso_timestamp};

/// Results collected for one participant, keyed by test id.
#[derive(Clone, Debug)]
pub struct Session {
    participant_id: String,
    results: Vec<TestSubmission>,
}

impl Session {
    pub fn new(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            results: Vec::new(),
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn results(&self) -> &[TestSubmission] {
        &self.results
    }

    /// Store a result, replacing an earlier one for the same test.
    pub fn record(&mut self, result: TestSubmission) {
        match self
            .results
            .iter_mut()
            .find(|r| r.test_id == result.test_id)
        {
            Some(existing) => *existing = result,
            None => self.results.push(result),
        }
    }

    pub fn contains(&self, test_id: &str) -> bool {
        self.results.iter().any(|r| r.test_id == test_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn to_batch(&self) -> BatchSubmission {
        BatchSubmission {
            participant_id: self.participant_id.clone(),
            results: self.results.clone(),
            timestamp: iso_timestamp(Utc::now()),
        }
    }
}

#[derive(Clone, Debug)]
pub enum SequentialStep {
    /// Index of the next test to show.
    Next(usize),
    /// Every test is done; the batch is ready to submit.
    Finished(BatchSubmission),
}

/// Tests one after another in a single style chosen from the participant id.
pub struct SequentialSession {
    session: Session,
    test_ids: Vec<String>,
    style: PresentationStyle,
    position: usize,
}

impl SequentialSession {
    pub fn new(participant_id: impl Into<String>, test_ids: Vec<String>) -> Self {
        let session = Session::new(participant_id);
        let style = PresentationStyle::for_participant(session.participant_id());
        Self {
            session,
            test_ids,
            style,
            position: 0,
        }
    }

    pub fn style(&self) -> PresentationStyle {
        self.style
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.test_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_ids.is_empty()
    }

    pub fn current(&self) -> Option<&str> {
        self.test_ids.get(self.position).map(String::as_str)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.test_ids.len()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn complete(&mut self, result: TestSubmission) -> SequentialStep {
        self.session.record(result);
        self.position = (self.position + 1).min(self.test_ids.len());
        if self.is_finished() {
            SequentialStep::Finished(self.session.to_batch())
        } else {
            SequentialStep::Next(self.position)
        }
    }
}

/// Every test live at once, each with its own style from a fixed rotation.
pub struct AllAtOnceSession {
    session: Session,
    test_ids: Vec<String>,
    styles: Vec<PresentationStyle>,
}

impl AllAtOnceSession {
    pub fn new(
        participant_id: impl Into<String>,
        test_ids: Vec<String>,
        rotation: &[PresentationStyle],
    ) -> Self {
        let styles = (0..test_ids.len())
            .map(|pos| PresentationStyle::for_position(pos, rotation))
            .collect();
        Self {
            session: Session::new(participant_id),
            test_ids,
            styles,
        }
    }

    pub fn test_ids(&self) -> &[String] {
        &self.test_ids
    }

    pub fn style_for(&self, position: usize) -> PresentationStyle {
        self.styles
            .get(position)
            .copied()
            .unwrap_or(PresentationStyle::Box)
    }

    pub fn len(&self) -> usize {
        self.test_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_ids.is_empty()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_completed(&self, test_id: &str) -> bool {
        self.session.contains(test_id)
    }

    pub fn completed_count(&self) -> usize {
        self.session.len()
    }

    /// Record a result and report whether submit is now available.
    /// Results for tests outside this session are ignored.
    pub fn complete(&mut self, result: TestSubmission) -> bool {
        if self.test_ids.contains(&result.test_id) {
            self.session.record(result);
        }
        self.can_submit()
    }

    pub fn can_submit(&self) -> bool {
        !self.test_ids.is_empty() && self.completed_count() == self.test_ids.len()
    }

    pub fn batch(&self) -> Option<BatchSubmission> {
        self.can_submit().then(|| self.session.to_batch())
    }
}
