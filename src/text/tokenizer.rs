/// Punctuation marks that split words and stay in the output as their own token.
const SPLIT_PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':'];

/// Sentence terminators used to find the end of the first sentence.
const SENTENCE_END: &[char] = &['.', '!', '?'];

const MIN_CONTENT_WORD_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Punctuation,
    Word,
    /// A word whose second half gets blanked out.
    Target,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    fn new(text: &str, kind: TokenKind) -> Self {
        Self {
            text: text.to_string(),
            kind,
        }
    }

    pub fn is_target(&self) -> bool {
        self.kind == TokenKind::Target
    }
}

/// Alphabetic ASCII, at least four letters long.
pub fn is_content_word(word: &str) -> bool {
    word.len() >= MIN_CONTENT_WORD_LEN && word.chars().all(|ch| ch.is_ascii_alphabetic())
}

/// Split a paragraph into whitespace runs, single punctuation marks and words.
///
/// Every other content word, starting with the second one, becomes a target.
/// The counter only advances on content words and restarts on each call.
pub fn tokenize(paragraph: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut content_index = 0usize;

    let mut push_word = |tokens: &mut Vec<Token>, word: &str| {
        let kind = if is_content_word(word) {
            let kind = if content_index % 2 == 1 {
                TokenKind::Target
            } else {
                TokenKind::Word
            };
            content_index += 1;
            kind
        } else {
            TokenKind::Word
        };
        tokens.push(Token::new(word, kind));
    };

    let mut word_start: Option<usize> = None;
    let mut space_start: Option<usize> = None;

    for (i, ch) in paragraph.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                push_word(&mut tokens, &paragraph[start..i]);
            }
            space_start.get_or_insert(i);
            continue;
        }

        if let Some(start) = space_start.take() {
            tokens.push(Token::new(&paragraph[start..i], TokenKind::Whitespace));
        }

        if SPLIT_PUNCTUATION.contains(&ch) {
            if let Some(start) = word_start.take() {
                push_word(&mut tokens, &paragraph[start..i]);
            }
            tokens.push(Token::new(
                &paragraph[i..i + ch.len_utf8()],
                TokenKind::Punctuation,
            ));
        } else {
            word_start.get_or_insert(i);
        }
    }

    if let Some(start) = word_start {
        push_word(&mut tokens, &paragraph[start..]);
    }
    if let Some(start) = space_start {
        tokens.push(Token::new(&paragraph[start..], TokenKind::Whitespace));
    }

    tokens
}

/// Split `text` after its first sentence terminator and the whitespace that follows it.
///
/// The first sentence needs at least one character before the terminator. Text
/// without such a sentence is returned whole as the first sentence.
pub fn split_first_sentence(text: &str) -> (&str, &str) {
    let Some(end) = text.find(SENTENCE_END) else {
        return (text, "");
    };
    if end == 0 {
        return (text, "");
    }

    let after_terminator = end + 1;
    let rest = &text[after_terminator..];
    let trimmed = rest.trim_start();
    let split_at = after_terminator + (rest.len() - trimmed.len());
    (&text[..split_at], &text[split_at..])
}

/// Break a text into paragraphs on blank lines, dropping empty ones.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(tokens: &[Token]) -> Vec<&str> {
        tokens
            .iter()
            .filter(|t| t.is_target())
            .map(|t| t.text.as_str())
            .collect()
    }

    #[test]
    fn test_alternating_targets_among_content_words() {
        let tokens = tokenize("The quick brown fox jumps over the lazy dog.");
        // content words: quick(0) brown(1) jumps(2) over(3) lazy(4)
        assert_eq!(targets(&tokens), vec!["brown", "over"]);
    }

    #[test]
    fn test_short_and_non_alphabetic_words_never_target() {
        let tokens = tokenize("cat dog 1500s readers' well-known fish");
        assert!(targets(&tokens).is_empty());
    }

    #[test]
    fn test_punctuation_and_whitespace_preserved() {
        let tokens = tokenize("Hello, world!  Again");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", ",", " ", "world", "!", "  ", "Again"]);
        assert_eq!(tokens[1].kind, TokenKind::Punctuation);
        assert_eq!(tokens[2].kind, TokenKind::Whitespace);
        assert_eq!(tokens[5].kind, TokenKind::Whitespace);
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let input = "Biology is the science: living things; \"organisms,\" too!";
        let joined: String = tokenize(input).into_iter().map(|t| t.text).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let text = "Science attempts to describe and understand the nature of the universe.";
        assert_eq!(tokenize(text), tokenize(text));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_split_first_sentence() {
        let (first, rest) = split_first_sentence("One two. Three four! Five");
        assert_eq!(first, "One two. ");
        assert_eq!(rest, "Three four! Five");
    }

    #[test]
    fn test_split_first_sentence_without_terminator() {
        let (first, rest) = split_first_sentence("no terminator here");
        assert_eq!(first, "no terminator here");
        assert_eq!(rest, "");
    }

    #[test]
    fn test_split_first_sentence_leading_terminator() {
        let (first, rest) = split_first_sentence(".starts with a dot. Then more");
        assert_eq!(first, ".starts with a dot. Then more");
        assert_eq!(rest, "");
    }

    #[test]
    fn test_split_paragraphs_on_blank_lines() {
        let paragraphs = split_paragraphs("First para\nstill first\n\n   \nSecond\n\n");
        assert_eq!(paragraphs, vec!["First para\nstill first", "Second"]);
    }
}
