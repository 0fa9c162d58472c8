use std::time::{Duration, Instant};

use crate::exercise::input::{self, WidgetKey};
use crate::exercise::navigation::FieldOrder;
use crate::exercise::scoring::{self, ScoreSummary};
use crate::exercise::style::PresentationStyle;
use crate::exercise::word::{TargetWord, WordStatus};
use crate::session::result::TestSubmission;
use crate::text::catalog::TextSummary;
use crate::text::passage::Passage;

pub const DEFAULT_CONTINUE_DELAY: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestPhase {
    /// Fields are editable; waiting for "check answers".
    Initial,
    /// Answers are marked; Continue unlocks once the delay has passed.
    ShowingAnswers { since: Instant },
    ShowingContinue,
}

/// One c-test: the rendered passage, its target words and their input state.
pub struct CTest {
    pub test_id: String,
    pub title: String,
    pub simplified: bool,
    pub style: PresentationStyle,
    pub passage: Passage,
    pub words: Vec<TargetWord>,
    pub fields: FieldOrder,
    pub phase: TestPhase,
    pub summary: Option<ScoreSummary>,
    continue_delay: Duration,
}

impl CTest {
    pub fn new(summary: &TextSummary, style: PresentationStyle, continue_delay: Duration) -> Self {
        let mut test = Self::from_paragraphs(
            &summary.id,
            &summary.paragraphs(),
            summary.simplified,
            style,
            continue_delay,
        );
        test.title = summary.title.clone();
        test
    }

    pub fn from_paragraphs(
        test_id: &str,
        paragraphs: &[String],
        simplified: bool,
        style: PresentationStyle,
        continue_delay: Duration,
    ) -> Self {
        let passage = Passage::build(paragraphs);
        let words: Vec<TargetWord> = passage.targets.iter().map(|w| TargetWord::new(w)).collect();
        let fields = FieldOrder::new(&words, style);
        Self {
            test_id: test_id.to_string(),
            title: test_id.to_string(),
            simplified,
            style,
            passage,
            words,
            fields,
            phase: TestPhase::Initial,
            summary: None,
            continue_delay,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.phase != TestPhase::Initial
    }

    /// Route a key to the focused field. Ignored once answers are checked.
    pub fn handle_key(&mut self, key: WidgetKey) -> bool {
        if self.is_read_only() {
            return false;
        }
        input::process_key(&mut self.words, &mut self.fields, self.style, key)
    }

    /// Score all words, lock the inputs and reveal the answers of incorrect words.
    /// Checking again returns the first summary unchanged.
    pub fn check_answers(&mut self, now: Instant) -> &ScoreSummary {
        let summary = match self.summary.take() {
            Some(summary) => summary,
            None => self.score_and_reveal(now),
        };
        self.summary.insert(summary)
    }

    fn score_and_reveal(&mut self, now: Instant) -> ScoreSummary {
        let summary = scoring::score_words(&self.words);
        for word in &mut self.words {
            if word.is_correct() {
                word.status = WordStatus::Correct;
            } else {
                word.status = WordStatus::Incorrect;
                word.fill_expected();
            }
        }
        log::debug!(
            "checked {}: {}/{} words correct",
            self.test_id,
            summary.correct_words,
            summary.total_words
        );
        self.phase = TestPhase::ShowingAnswers { since: now };
        summary
    }

    /// Advance the reveal timer. Returns true when Continue just became available.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let TestPhase::ShowingAnswers { since } = self.phase
            && now.saturating_duration_since(since) >= self.continue_delay
        {
            self.phase = TestPhase::ShowingContinue;
            return true;
        }
        false
    }

    pub fn remaining_delay(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            TestPhase::ShowingAnswers { since } => Some(
                self.continue_delay
                    .saturating_sub(now.saturating_duration_since(since)),
            ),
            _ => None,
        }
    }

    pub fn can_continue(&self) -> bool {
        self.phase == TestPhase::ShowingContinue
    }

    /// The result record, available once Continue is.
    pub fn submission(&self) -> Option<TestSubmission> {
        if !self.can_continue() {
            return None;
        }
        let summary = self.summary.as_ref()?;
        Some(TestSubmission::from_summary(
            &self.test_id,
            self.style,
            self.simplified,
            summary,
        ))
    }

    /// Share of hidden letters that hold a character.
    pub fn fill_ratio(&self) -> f64 {
        let total: usize = self.words.iter().map(|w| w.hidden_len()).sum();
        if total == 0 {
            return 0.0;
        }
        let filled: usize = self.words.iter().map(|w| w.filled_count()).sum();
        filled as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test(style: PresentationStyle) -> CTest {
        CTest::from_paragraphs(
            "fox",
            &["Intro sentence.".to_string(), "The quick brown fox jumps over the lazy dog.".to_string()],
            false,
            style,
            DEFAULT_CONTINUE_DELAY,
        )
    }

    fn type_str(test: &mut CTest, s: &str) {
        for ch in s.chars() {
            test.handle_key(WidgetKey::Char(ch));
        }
    }

    #[test]
    fn test_new_test_targets() {
        let test = make_test(PresentationStyle::Box);
        let sources: Vec<String> = test.words.iter().map(|w| w.source_text()).collect();
        assert_eq!(sources, vec!["brown", "over"]);
        assert_eq!(test.phase, TestPhase::Initial);
        assert_eq!(test.fields.len(), 4);
    }

    #[test]
    fn test_check_answers_scores_and_locks() {
        let mut test = make_test(PresentationStyle::Box);
        type_str(&mut test, "WNxx");
        let now = Instant::now();
        let summary = test.check_answers(now).clone();
        assert_eq!(summary.correct_words, 1);
        assert_eq!(summary.total_words, 2);
        assert!((summary.score - 50.0).abs() < f64::EPSILON);

        assert!(test.is_read_only());
        assert!(!test.handle_key(WidgetKey::Char('e')));
        assert_eq!(test.words[0].status, WordStatus::Correct);
        assert_eq!(test.words[1].status, WordStatus::Incorrect);
        // incorrect word revealed
        assert_eq!(test.words[1].slots, vec![Some('e'), Some('r')]);
        // correct word keeps what was typed
        assert_eq!(test.words[0].slots, vec![Some('W'), Some('N')]);
    }

    #[test]
    fn test_check_twice_keeps_first_summary() {
        let mut test = make_test(PresentationStyle::Underline);
        let now = Instant::now();
        let first = test.check_answers(now).clone();
        // answers were filled in; a second check must not rescore them
        let second = test.check_answers(now + Duration::from_secs(1)).clone();
        assert_eq!(first, second);
        assert_eq!(second.correct_words, 0);
        assert_eq!(test.summary.as_ref(), Some(&first));
        // the reveal timer keeps its first start
        assert!(matches!(test.phase, TestPhase::ShowingAnswers { since } if since == now));
    }

    #[test]
    fn test_continue_unlocks_after_delay() {
        let mut test = make_test(PresentationStyle::Span);
        let start = Instant::now();
        assert!(!test.tick(start));
        test.check_answers(start);
        assert!(!test.can_continue());
        assert!(test.submission().is_none());
        assert!(!test.tick(start + Duration::from_millis(2999)));
        assert_eq!(
            test.remaining_delay(start + Duration::from_millis(1000)),
            Some(Duration::from_millis(2000))
        );
        assert!(test.tick(start + Duration::from_millis(3000)));
        assert!(test.can_continue());
        assert!(!test.tick(start + Duration::from_millis(4000)));

        let submission = test.submission().unwrap();
        assert_eq!(submission.test_id, "fox");
        assert_eq!(submission.style, PresentationStyle::Span);
        assert_eq!(submission.total_words, 2);
    }

    #[test]
    fn test_test_without_targets_scores_nan() {
        let mut test = CTest::from_paragraphs(
            "tiny",
            &["Only one sentence here.".to_string()],
            true,
            PresentationStyle::Box,
            Duration::ZERO,
        );
        let now = Instant::now();
        assert!(test.check_answers(now).score.is_nan());
        test.tick(now);
        let submission = test.submission().unwrap();
        assert_eq!(submission.total_words, 0);
        assert!(submission.score.is_nan());
    }

    #[test]
    fn test_fill_ratio() {
        let mut test = make_test(PresentationStyle::Box);
        assert_eq!(test.fill_ratio(), 0.0);
        type_str(&mut test, "wn");
        assert!((test.fill_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
