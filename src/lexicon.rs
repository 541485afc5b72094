//! Static keyword lexicons used by the message analyzer.
//!
//! All entries are lowercase; callers lowercase the message before matching.

use crate::models::Category;

/// Phrases that flag a message as a crisis regardless of anything else in it.
pub const CRISIS_PHRASES: [&str; 7] = [
    "suicide",
    "kill myself",
    "end it all",
    "can't go on",
    "want to die",
    "relapse",
    "using again",
];

/// Words that count toward positive sentiment.
pub const POSITIVE_WORDS: [&str; 8] = [
    "good",
    "great",
    "happy",
    "better",
    "strong",
    "confident",
    "grateful",
    "hopeful",
];

/// Words that count toward negative sentiment.
pub const NEGATIVE_WORDS: [&str; 8] = [
    "bad",
    "terrible",
    "sad",
    "worse",
    "weak",
    "anxious",
    "depressed",
    "hopeless",
];

/// A topic and the substrings that trigger it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryGroup {
    /// Category assigned when the group matches
    pub category: Category,
    /// Trigger substrings
    pub keywords: &'static [&'static str],
}

/// Category groups in evaluation order.
///
/// The analyzer walks this list front to back and keeps the last group that
/// matched, so a later group overrides an earlier one.
pub const CATEGORY_GROUPS: [CategoryGroup; 5] = [
    CategoryGroup {
        category: Category::Mood,
        keywords: &["mood", "feeling"],
    },
    CategoryGroup {
        category: Category::Cravings,
        keywords: &["craving", "urge"],
    },
    CategoryGroup {
        category: Category::Stress,
        keywords: &["stress", "anxiety"],
    },
    CategoryGroup {
        category: Category::Sleep,
        keywords: &["sleep", "tired"],
    },
    CategoryGroup {
        category: Category::Treatment,
        keywords: &["meeting", "group"],
    },
];

/// Count how many distinct words of `words` occur in `text`.
///
/// Each word counts once no matter how often it appears.
#[must_use]
pub fn count_present(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|word| text.contains(*word)).count()
}

/// True when any entry of `phrases` occurs in `text`.
#[must_use]
pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| text.contains(phrase))
}
