use unicode_normalization::UnicodeNormalization;

use crate::lexicon::{
    contains_any, count_present, CATEGORY_GROUPS, CRISIS_PHRASES, NEGATIVE_WORDS, POSITIVE_WORDS,
};
use crate::models::{AnalysisResult, Category};

/// Sentiment when positive and negative counts tie
pub const NEUTRAL_SENTIMENT: f64 = 0.5;

/// Keyword-based message analyzer
///
/// Stateless: every call depends only on the text and the static lexicons.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageAnalyzer;

impl MessageAnalyzer {
    /// Create a new analyzer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Analyze a message and return its sentiment, crisis flag and category
    #[must_use]
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let normalized = self.normalize(text);

        let crisis_flag = self.detect_crisis(&normalized);
        let sentiment = self.score_sentiment(&normalized);
        let category = self.categorize(&normalized);

        tracing::trace!(
            crisis_flag,
            sentiment,
            category = category.as_str(),
            "Message analyzed"
        );

        AnalysisResult {
            sentiment,
            crisis_flag,
            category,
        }
    }

    /// NFC-normalize, fold typographic apostrophes and lowercase
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        text.nfc()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' | '\u{02BC}' => '\'',
                other => other,
            })
            .collect::<String>()
            .to_lowercase()
    }

    /// True when the normalized text contains any crisis phrase
    #[must_use]
    pub fn detect_crisis(&self, normalized: &str) -> bool {
        contains_any(normalized, &CRISIS_PHRASES)
    }

    /// Sentiment in [0, 1] from positive and negative word presence
    #[must_use]
    pub fn score_sentiment(&self, normalized: &str) -> f64 {
        let positive = count_present(normalized, &POSITIVE_WORDS);
        let negative = count_present(normalized, &NEGATIVE_WORDS);
        sentiment_from_counts(positive, negative)
    }

    /// Category of the normalized text; the last matching group wins
    #[must_use]
    pub fn categorize(&self, normalized: &str) -> Category {
        let mut category = Category::General;
        for group in &CATEGORY_GROUPS {
            if contains_any(normalized, group.keywords) {
                category = group.category;
            }
        }
        category
    }
}

/// Map positive/negative keyword counts to a sentiment score
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sentiment_from_counts(positive: usize, negative: usize) -> f64 {
    let sentiment = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => 0.1f64.mul_add(positive as f64, 0.7).min(1.0),
        std::cmp::Ordering::Less => 0.1f64.mul_add(-(negative as f64), 0.3).max(0.0),
        std::cmp::Ordering::Equal => NEUTRAL_SENTIMENT,
    };
    sentiment.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_crisis_detection_is_case_insensitive() {
        let analyzer = MessageAnalyzer::new();
        assert!(analyzer.analyze("Sometimes I WANT TO DIE").crisis_flag);
        assert!(analyzer.analyze("thinking about suicide").crisis_flag);
        assert!(!analyzer.analyze("today was fine").crisis_flag);
    }

    #[test]
    fn test_curly_apostrophe_matches_crisis_phrase() {
        let analyzer = MessageAnalyzer::new();
        assert!(analyzer.analyze("I can\u{2019}t go on like this").crisis_flag);
    }

    #[test]
    fn test_sentiment_positive_formula() {
        let analyzer = MessageAnalyzer::new();
        let result = analyzer.analyze("I'm feeling great and confident today");
        assert!(approx(result.sentiment, 0.9));
    }

    #[test]
    fn test_sentiment_negative_formula() {
        let analyzer = MessageAnalyzer::new();
        let result = analyzer.analyze("I feel sad and weak");
        assert!(approx(result.sentiment, 0.1));
    }

    #[test]
    fn test_sentiment_clamps() {
        assert!(approx(sentiment_from_counts(5, 0), 1.0));
        assert!(approx(sentiment_from_counts(0, 4), 0.0));
        assert!(approx(sentiment_from_counts(2, 2), NEUTRAL_SENTIMENT));
        assert!(approx(sentiment_from_counts(0, 0), NEUTRAL_SENTIMENT));
    }

    #[test]
    fn test_last_matching_group_wins() {
        let analyzer = MessageAnalyzer::new();
        assert_eq!(
            analyzer.analyze("feeling a craving").category,
            Category::Cravings
        );
        assert_eq!(
            analyzer.analyze("my mood is off and the group meeting is tonight").category,
            Category::Treatment
        );
        assert_eq!(analyzer.analyze("hello there").category, Category::General);
    }

    #[test]
    fn test_substring_matching() {
        let analyzer = MessageAnalyzer::new();
        // "sleepless" contains "sleep"
        assert_eq!(analyzer.analyze("another sleepless night").category, Category::Sleep);
    }
}
