//! The patient-facing recovery companion.
//!
//! One [`Companion`] drives one conversation: it analyzes each user message,
//! records it, waits a short "thinking" delay and records a reply.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::analyzer::MessageAnalyzer;
use crate::config::CompanionConfig;
use crate::conversation::{ConversationLog, ConversationStore};
use crate::error::{RecoveryError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{Category, Message};
use crate::responder::{ResponseBranch, ResponseSelector, ThinkingDelay};
use crate::validation::InputValidator;

/// Opening message seeded into an empty conversation
pub const GREETING: &str = "Hi! I'm Julia, your AI recovery companion. I'm here to support you on your journey. How are you feeling today?";

/// Canned messages offered as one-tap replies
pub const QUICK_REPLIES: [&str; 3] = ["I'm feeling good today!", "I'm having cravings", "I need support"];

/// Title of the crisis prompt
pub const CRISIS_TITLE: &str = "Crisis Support";

/// Body of the crisis prompt
pub const CRISIS_NOTICE: &str = "Your message indicates you may need immediate support. Please consider reaching out to your counselor or calling the crisis hotline.";

/// Actions offered with the crisis prompt, in display order
pub const CRISIS_ACTIONS: [&str; 3] = ["Call Crisis Hotline", "Contact Counselor", "I'm OK"];

/// Prompt raised when a message trips crisis detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrisisNotice {
    /// Heading shown above the prompt
    pub title: &'static str,
    /// Body text
    pub message: &'static str,
    /// Action labels in display order
    pub actions: [&'static str; 3],
}

impl Default for CrisisNotice {
    fn default() -> Self {
        Self {
            title: CRISIS_TITLE,
            message: CRISIS_NOTICE,
            actions: CRISIS_ACTIONS,
        }
    }
}

/// Outcome of one user message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    /// The stored user message with its analysis
    pub user_message: Message,
    /// The companion's reply
    pub reply: Message,
    /// Present when the user message was flagged
    pub crisis_notice: Option<CrisisNotice>,
    /// Which response pool the reply came from
    pub branch: &'static str,
    /// False if either history write was not confirmed
    pub persisted: bool,
}

/// Conversation driver
pub struct Companion<S: ConversationStore, R: Rng> {
    log: ConversationLog<S>,
    analyzer: MessageAnalyzer,
    selector: ResponseSelector,
    delay: ThinkingDelay,
    rng: R,
    metrics: Arc<MetricsCollector>,
    max_message_length: usize,
}

impl<S: ConversationStore, R: Rng> Companion<S, R> {
    /// Build a companion over an opened log
    ///
    /// An empty log is seeded with the greeting.
    pub fn new(log: ConversationLog<S>, config: &CompanionConfig, rng: R, metrics: Arc<MetricsCollector>) -> Result<Self> {
        let delay = ThinkingDelay::new(config.min_delay_secs, config.max_delay_secs)?;
        let mut companion = Self {
            log,
            analyzer: MessageAnalyzer::new(),
            selector: ResponseSelector::new(),
            delay,
            rng,
            metrics,
            max_message_length: config.max_message_length,
        };
        companion.seed_greeting();
        Ok(companion)
    }

    /// Replace the thinking delay
    #[must_use]
    pub fn with_delay(mut self, delay: ThinkingDelay) -> Self {
        self.delay = delay;
        self
    }

    fn seed_greeting(&mut self) {
        if self.log.is_empty() {
            self.log.append(Message::from_companion(GREETING, Category::Greeting));
            if !self.log.persist() {
                self.metrics.record_persist_failure("conversation");
            }
            debug!("Seeded greeting");
        }
    }

    /// Handle one user message
    ///
    /// Input is sanitized and rejected when empty or too long. The user
    /// message is stored before the delay; dropping the returned future
    /// during the delay leaves it stored without a reply.
    #[instrument(skip_all)]
    pub async fn respond(&mut self, text: &str) -> Result<Turn> {
        let text = InputValidator::validate_message_text(text, self.max_message_length)
            .map_err(|e| RecoveryError::InvalidInput(e.to_string()))?;

        let analysis = self.analyzer.analyze(&text);
        self.metrics.record_analysis(&analysis);

        let user_message = Message::from_user(&text, &analysis);
        self.log.append(user_message.clone());
        let mut persisted = self.persist();

        let crisis_notice = if analysis.crisis_flag {
            warn!(category = %analysis.category, "Crisis language detected");
            Some(CrisisNotice::default())
        } else {
            None
        };

        let pause = self.delay.sample(&mut self.rng);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let branch = ResponseBranch::resolve(&analysis);
        let reply_text = self.selector.select_response(&analysis, &text, &mut self.rng);
        self.metrics.record_response(branch);

        let reply = Message::from_companion(reply_text, Category::Response);
        self.log.append(reply.clone());
        persisted &= self.persist();

        info!(
            sentiment = analysis.sentiment,
            category = %analysis.category,
            branch = branch.as_str(),
            persisted,
            "Reply sent"
        );

        Ok(Turn {
            user_message,
            reply,
            crisis_notice,
            branch: branch.as_str(),
            persisted,
        })
    }

    /// Send one of the [`QUICK_REPLIES`]
    pub async fn quick_reply(&mut self, index: usize) -> Result<Turn> {
        let text = QUICK_REPLIES.get(index).ok_or_else(|| {
            RecoveryError::InvalidInput(format!(
                "quick reply {index} does not exist (choose 0-{})",
                QUICK_REPLIES.len() - 1
            ))
        })?;
        self.respond(text).await
    }

    fn persist(&self) -> bool {
        let ok = self.log.persist();
        if !ok {
            self.metrics.record_persist_failure("conversation");
        }
        ok
    }

    /// Messages so far, oldest first
    #[must_use]
    pub fn history(&self) -> &[Message] {
        self.log.messages()
    }

    /// Wipe the conversation; returns whether the empty log was stored
    pub fn clear_history(&mut self) -> bool {
        let ok = self.log.clear();
        if !ok {
            self.metrics.record_persist_failure("conversation");
        }
        ok
    }
}
