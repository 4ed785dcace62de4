use std::fmt;

pub const MAX_WORD_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordError {
    Empty,
    TooLong { chars: usize },
    InvalidCharacter(char),
}

impl fmt::Display for WordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordError::Empty => write!(f, "word is empty"),
            WordError::TooLong { chars } => {
                write!(f, "word is {chars} characters long (max {MAX_WORD_CHARS})")
            }
            WordError::InvalidCharacter(ch) => write!(f, "word contains invalid character {ch:?}"),
        }
    }
}

impl std::error::Error for WordError {}

/// Accepts letters, digits, whitespace and hyphens, up to
/// [`MAX_WORD_CHARS`] characters, with at least one non-space character.
pub fn validate_word(word: &str) -> Result<(), WordError> {
    if word.trim().is_empty() {
        return Err(WordError::Empty);
    }
    let chars = word.chars().count();
    if chars > MAX_WORD_CHARS {
        return Err(WordError::TooLong { chars });
    }
    match word
        .chars()
        .find(|ch| !(ch.is_alphanumeric() || ch.is_whitespace() || *ch == '-'))
    {
        Some(ch) => Err(WordError::InvalidCharacter(ch)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_words_and_phrases() {
        assert!(validate_word("ephemeral").is_ok());
        assert!(validate_word("well-being").is_ok());
        assert!(validate_word("ad hoc").is_ok());
        assert!(validate_word("Weltschmerz").is_ok());
        assert!(validate_word("café").is_ok());
        assert!(validate_word("3d").is_ok());
    }

    #[test]
    fn rejects_markup_and_punctuation() {
        assert_eq!(
            validate_word("<script>"),
            Err(WordError::InvalidCharacter('<'))
        );
        assert_eq!(validate_word("don't"), Err(WordError::InvalidCharacter('\'')));
    }

    #[test]
    fn rejects_blank_and_oversized() {
        assert_eq!(validate_word("   "), Err(WordError::Empty));
        let long = "a".repeat(101);
        assert_eq!(validate_word(&long), Err(WordError::TooLong { chars: 101 }));
        assert!(validate_word(&"a".repeat(100)).is_ok());
    }
}
