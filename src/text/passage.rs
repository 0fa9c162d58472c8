use crate::text::tokenizer::{self, Token};

/// A piece of a rendered paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Text shown as-is (the untouched first sentence, whitespace, punctuation, plain words).
    Plain(String),
    /// Index into the passage's target word list.
    Target(usize),
}

/// The tokenized form of a summary: paragraphs of segments plus the target words
/// in document order.
#[derive(Clone, Debug, Default)]
pub struct Passage {
    pub paragraphs: Vec<Vec<Segment>>,
    pub targets: Vec<String>,
}

impl Passage {
    /// Build a passage from paragraphs. The first sentence of the first paragraph is
    /// never targeted; the remainder and all later paragraphs are tokenized separately.
    pub fn build(paragraphs: &[String]) -> Self {
        let mut passage = Passage::default();

        for (p_idx, paragraph) in paragraphs.iter().enumerate() {
            let mut segments = Vec::new();
            let body = if p_idx == 0 {
                let (first, rest) = tokenizer::split_first_sentence(paragraph);
                segments.push(Segment::Plain(first.to_string()));
                rest
            } else {
                paragraph.as_str()
            };

            for token in tokenizer::tokenize(body) {
                segments.push(passage.segment_for(token));
            }
            passage.paragraphs.push(segments);
        }

        passage
    }

    fn segment_for(&mut self, token: Token) -> Segment {
        if token.is_target() {
            self.targets.push(token.text);
            Segment::Target(self.targets.len() - 1)
        } else {
            Segment::Plain(token.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paras(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_sentence_never_targeted() {
        let passage = Passage::build(&paras(&[
            "Psychology studies minds carefully and behaviour thoroughly. Numerous popular psychology books exist.",
        ]));
        assert_eq!(
            passage.paragraphs[0][0],
            Segment::Plain(
                "Psychology studies minds carefully and behaviour thoroughly. ".to_string()
            )
        );
        // rest: Numerous(0) popular(1) psychology(2) books(3) exist(4)
        assert_eq!(passage.targets, vec!["popular", "books"]);
    }

    #[test]
    fn test_single_sentence_passage_has_no_targets() {
        let passage = Passage::build(&paras(&["The quick brown fox jumps over the lazy dog."]));
        assert!(passage.targets.is_empty());
        assert_eq!(passage.paragraphs[0].len(), 1);
    }

    #[test]
    fn test_later_paragraphs_fully_tokenized() {
        let passage = Passage::build(&paras(&[
            "Intro sentence only.",
            "The quick brown fox jumps over the lazy dog.",
        ]));
        assert_eq!(passage.targets, vec!["brown", "over"]);
        let target_segments = passage.paragraphs[1]
            .iter()
            .filter(|s| matches!(s, Segment::Target(_)))
            .count();
        assert_eq!(target_segments, 2);
    }

    #[test]
    fn test_target_indices_follow_document_order() {
        let passage = Passage::build(&paras(&[
            "Intro. alpha bravo charlie delta",
            "echo foxtrot golf hotel",
        ]));
        assert_eq!(passage.targets, vec!["bravo", "delta", "foxtrot", "hotel"]);
        let indices: Vec<usize> = passage
            .paragraphs
            .iter()
            .flatten()
            .filter_map(|s| match s {
                Segment::Target(i) => Some(*i),
                Segment::Plain(_) => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
