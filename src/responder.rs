//! Canned companion responses keyed by analysis outcome.
//!
//! Selection order: crisis first, then low and high sentiment, then the
//! message category. Random picks go through an injected [`Rng`] so callers
//! can seed or replace the source.

use std::time::Duration;

use rand::Rng;

use crate::error::{RecoveryError, Result};
use crate::models::{AnalysisResult, Category};

/// Sentiment strictly below this selects the low-mood pool
pub const LOW_SENTIMENT: f64 = 0.3;
/// Sentiment strictly above this selects the high-mood pool
pub const HIGH_SENTIMENT: f64 = 0.7;

/// Longest thinking delay accepted, in seconds
pub const MAX_THINKING_DELAY_SECS: f64 = 60.0;

/// Returned verbatim whenever a crisis phrase is detected
pub const CRISIS_RESPONSE: &str = "I'm concerned about what you're sharing. Your safety is important. Please reach out to your counselor or call the crisis hotline immediately. You don't have to go through this alone. 💙";

/// Templates for clearly negative messages
pub const LOW_MOOD_RESPONSES: [&str; 3] = [
    "I hear that you're going through a tough time. Remember that difficult feelings are temporary. What's one small thing that might help you feel a bit better right now?",
    "It sounds like you're struggling today. That's okay - recovery has ups and downs. What coping strategies have helped you before?",
    "I'm sorry you're feeling this way. You've shown strength by reaching out. What support do you need right now?",
];

/// Templates for clearly positive messages
pub const HIGH_MOOD_RESPONSES: [&str; 3] = [
    "That's wonderful to hear! 🌟 It sounds like you're doing really well. What's been helping you feel so positive?",
    "I'm so glad you're feeling good! These positive moments are important to celebrate. Keep up the great work! 💪",
    "Your positive energy is inspiring! What would you like to focus on to maintain this momentum?",
];

/// Reply for the cravings category
pub const CRAVINGS_RESPONSE: &str = "Cravings can be challenging. Remember the HALT technique - are you Hungry, Angry, Lonely, or Tired? Try some deep breathing or call your sponsor. You've got this! 💪";
/// Reply for the stress category
pub const STRESS_RESPONSE: &str = "Stress is tough, but you have tools to handle it. Try the 4-7-8 breathing technique: breathe in for 4, hold for 7, out for 8. What usually helps you manage stress?";
/// Reply for the sleep category
pub const SLEEP_RESPONSE: &str = "Good sleep is so important for recovery. Try to maintain a consistent bedtime routine. How has your sleep been affecting your mood and energy?";
/// Reply for the treatment category
pub const TREATMENT_RESPONSE: &str = "Staying connected with your treatment program is great! How are you finding the meetings? Remember, every day you show up is a victory. 🎯";

/// Templates when nothing more specific applies
pub const GENERAL_RESPONSES: [&str; 4] = [
    "Thanks for sharing that with me. How can I support you today?",
    "I appreciate you checking in. What's on your mind?",
    "How are you taking care of yourself today?",
    "What's one thing you're grateful for right now?",
];

/// Which rule produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseBranch {
    /// Crisis phrase detected
    Crisis,
    /// Sentiment below the low threshold
    LowMood,
    /// Sentiment above the high threshold
    HighMood,
    /// Fixed reply for a specific category
    CategorySpecific(Category),
    /// Generic pool
    General,
}

impl ResponseBranch {
    /// Resolve the branch for an analysis
    #[must_use]
    pub fn resolve(analysis: &AnalysisResult) -> Self {
        if analysis.crisis_flag {
            return Self::Crisis;
        }
        if analysis.sentiment < LOW_SENTIMENT {
            return Self::LowMood;
        }
        if analysis.sentiment > HIGH_SENTIMENT {
            return Self::HighMood;
        }
        match analysis.category {
            Category::Cravings | Category::Stress | Category::Sleep | Category::Treatment => {
                Self::CategorySpecific(analysis.category)
            },
            _ => Self::General,
        }
    }

    /// Label used for metrics and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Crisis => "crisis",
            Self::LowMood => "low_mood",
            Self::HighMood => "high_mood",
            Self::CategorySpecific(_) => "category",
            Self::General => "general",
        }
    }

    /// Every response this branch can produce
    #[must_use]
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Crisis => &[CRISIS_RESPONSE],
            Self::LowMood => &LOW_MOOD_RESPONSES,
            Self::HighMood => &HIGH_MOOD_RESPONSES,
            Self::CategorySpecific(Category::Cravings) => &[CRAVINGS_RESPONSE],
            Self::CategorySpecific(Category::Stress) => &[STRESS_RESPONSE],
            Self::CategorySpecific(Category::Sleep) => &[SLEEP_RESPONSE],
            Self::CategorySpecific(Category::Treatment) => &[TREATMENT_RESPONSE],
            Self::CategorySpecific(_) | Self::General => &GENERAL_RESPONSES,
        }
    }
}

/// Picks a companion response for an analyzed message
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseSelector;

impl ResponseSelector {
    /// Create a new selector
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Candidate set for the branch this analysis resolves to
    #[must_use]
    pub fn candidates(&self, analysis: &AnalysisResult) -> &'static [&'static str] {
        ResponseBranch::resolve(analysis).candidates()
    }

    /// Choose a response; pools with several templates are sampled uniformly
    ///
    /// The message text is accepted but none of the current replies use it.
    pub fn select_response<R: Rng + ?Sized>(
        &self,
        analysis: &AnalysisResult,
        _original_text: &str,
        rng: &mut R,
    ) -> &'static str {
        let pool = self.candidates(analysis);
        if pool.len() == 1 {
            return pool[0];
        }
        pool[rng.gen_range(0..pool.len())]
    }
}

/// Cosmetic pause before the companion reply is shown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinkingDelay {
    min_secs: f64,
    max_secs: f64,
}

impl Default for ThinkingDelay {
    fn default() -> Self {
        Self {
            min_secs: 1.0,
            max_secs: 3.0,
        }
    }
}

impl ThinkingDelay {
    /// Create a delay range in seconds; `min` may equal `max`
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self> {
        if !min_secs.is_finite() || !max_secs.is_finite() || min_secs < 0.0 {
            return Err(RecoveryError::InvalidConfig(format!(
                "Thinking delay bounds must be finite and non-negative: {min_secs}..{max_secs}"
            )));
        }
        if min_secs > max_secs {
            return Err(RecoveryError::InvalidConfig(format!(
                "Thinking delay minimum {min_secs} exceeds maximum {max_secs}"
            )));
        }
        if max_secs > MAX_THINKING_DELAY_SECS {
            return Err(RecoveryError::InvalidConfig(format!(
                "Thinking delay maximum {max_secs} exceeds {MAX_THINKING_DELAY_SECS} seconds"
            )));
        }
        Ok(Self { min_secs, max_secs })
    }

    /// No delay at all
    #[must_use]
    pub const fn none() -> Self {
        Self {
            min_secs: 0.0,
            max_secs: 0.0,
        }
    }

    /// Lower bound in seconds
    #[must_use]
    pub const fn min_secs(&self) -> f64 {
        self.min_secs
    }

    /// Upper bound in seconds
    #[must_use]
    pub const fn max_secs(&self) -> f64 {
        self.max_secs
    }

    /// Draw a duration uniformly from the range
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rng.gen_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs)
    }
}
