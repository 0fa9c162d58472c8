use crate::exercise::word::TargetWord;

#[derive(Clone, Debug, PartialEq)]
pub struct WordAnswer {
    pub word: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreSummary {
    pub answers: Vec<WordAnswer>,
    pub correct_words: u32,
    pub total_words: u32,
    pub score: f64,
}

/// Percentage of fully correct words. NaN when there are no words.
pub fn compute_score(correct_words: u32, total_words: u32) -> f64 {
    correct_words as f64 / total_words as f64 * 100.0
}

/// Score every target word in document order.
pub fn score_words(words: &[TargetWord]) -> ScoreSummary {
    let answers: Vec<WordAnswer> = words
        .iter()
        .map(|w| WordAnswer {
            word: w.source_text(),
            is_correct: w.is_correct(),
        })
        .collect();
    let correct_words = answers.iter().filter(|a| a.is_correct).count() as u32;
    let total_words = answers.len() as u32;

    ScoreSummary {
        answers,
        correct_words,
        total_words,
        score: compute_score(correct_words, total_words),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_of_ten_is_eighty() {
        assert!((compute_score(8, 10) - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_total_is_not_finite() {
        assert!(compute_score(0, 0).is_nan());
        assert!(!compute_score(0, 0).is_finite());
    }

    #[test]
    fn test_score_words_counts_fully_correct_only() {
        let mut over = TargetWord::new("over");
        over.set(0, 'e');
        over.set(1, 'r');
        let mut lazy = TargetWord::new("lazy");
        lazy.set(0, 'z');
        let summary = score_words(&[over, lazy]);
        assert_eq!(summary.correct_words, 1);
        assert_eq!(summary.total_words, 2);
        assert!((summary.score - 50.0).abs() < f64::EPSILON);
        assert_eq!(
            summary.answers,
            vec![
                WordAnswer { word: "over".to_string(), is_correct: true },
                WordAnswer { word: "lazy".to_string(), is_correct: false },
            ]
        );
    }

    #[test]
    fn test_score_words_empty() {
        let summary = score_words(&[]);
        assert_eq!(summary.total_words, 0);
        assert!(summary.score.is_nan());
    }
}
