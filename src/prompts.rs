use serde::{Deserialize, Serialize};
use std::fmt;

/// A piece of information fetched for a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// One- or two-sentence etymology shown in the popup.
    BriefEtymology,
    Etymology,
    Usage,
    Synonyms,
}

impl Field {
    /// Side-panel fields in delivery order.
    pub const PANEL: [Field; 3] = [Field::Etymology, Field::Usage, Field::Synonyms];

    pub fn primary_prompt(self, word: &str) -> String {
        match self {
            Field::BriefEtymology => {
                format!("Give a very brief etymology of \"{word}\" in 1-2 sentences.")
            }
            Field::Etymology => format!(
                "Provide a detailed etymology of \"{word}\" in English, including its historical development and original language roots. If the word comes from a non-English origin, please describe it in English."
            ),
            Field::Usage => format!(
                "Provide 3 clear and concise example sentences in English using the word \"{word}\"."
            ),
            Field::Synonyms => format!(
                "List 5 synonyms and 5 antonyms in English for the word \"{word}\". Format as two separate lists."
            ),
        }
    }

    /// Simplified English-only restatement used when the primary prompt is
    /// rejected as unsupported.
    pub fn fallback_prompt(self, word: &str) -> String {
        match self {
            Field::BriefEtymology => format!(
                "Explain in simple English what the word \"{word}\" means and where it comes from. Use one short sentence."
            ),
            Field::Etymology => format!(
                "Explain in simple English: What is the origin and history of the word \"{word}\"? Focus only on basic English explanation."
            ),
            Field::Usage => format!(
                "Write 3 very simple English sentences using the word \"{word}\". Use basic vocabulary only."
            ),
            Field::Synonyms => format!(
                "Give me the most basic English words that mean the same as \"{word}\" and their opposites. Keep it simple."
            ),
        }
    }

    /// Text shown when the model answers with nothing.
    pub fn empty_reply(self) -> &'static str {
        match self {
            Field::BriefEtymology | Field::Etymology => "No etymology found.",
            Field::Usage => "No examples found.",
            Field::Synonyms => "No synonyms/antonyms found.",
        }
    }

    /// Human-readable message substituted for a failed fetch.
    pub fn failure_message(self) -> &'static str {
        match self {
            Field::BriefEtymology => "Error fetching etymology. Please try again.",
            Field::Etymology => "Error getting etymology.",
            Field::Usage => "Error getting usage examples.",
            Field::Synonyms => "Error getting synonyms/antonyms.",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::BriefEtymology => write!(f, "brief etymology"),
            Field::Etymology => write!(f, "etymology"),
            Field::Usage => write!(f, "usage"),
            Field::Synonyms => write!(f, "synonyms"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_quote_the_word() {
        for field in [Field::BriefEtymology, Field::Etymology, Field::Usage, Field::Synonyms] {
            assert!(field.primary_prompt("quixotic").contains("\"quixotic\""));
            assert!(field.fallback_prompt("quixotic").contains("\"quixotic\""));
            assert_ne!(field.primary_prompt("quixotic"), field.fallback_prompt("quixotic"));
        }
    }

    #[test]
    fn fallbacks_ask_for_simple_english() {
        for field in Field::PANEL {
            assert!(field.fallback_prompt("Weltschmerz").to_lowercase().contains("simple"));
        }
    }

    #[test]
    fn panel_order_is_fixed() {
        assert_eq!(Field::PANEL, [Field::Etymology, Field::Usage, Field::Synonyms]);
    }
}
