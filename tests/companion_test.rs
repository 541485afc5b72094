//! Conversation flow tests against the on-disk store

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use recovery_companion::companion::{Companion, GREETING, QUICK_REPLIES};
use recovery_companion::config::AppConfig;
use recovery_companion::conversation::{ConversationLog, ConversationStore, SledConversationStore, DEFAULT_STORAGE_KEY};
use recovery_companion::metrics::MetricsCollector;
use recovery_companion::models::{Category, SenderRole};
use recovery_companion::responder::{ThinkingDelay, HIGH_MOOD_RESPONSES, LOW_MOOD_RESPONSES};

fn open_companion(dir: &TempDir, seed: u64) -> Companion<SledConversationStore, StdRng> {
    let store = SledConversationStore::open(dir.path(), DEFAULT_STORAGE_KEY).expect("open store");
    Companion::new(
        ConversationLog::open(store),
        &AppConfig::default().companion,
        StdRng::seed_from_u64(seed),
        Arc::new(MetricsCollector::default()),
    )
    .expect("companion")
    .with_delay(ThinkingDelay::none())
}

#[tokio::test]
async fn test_history_survives_reopen() {
    let dir = TempDir::new().expect("tempdir");
    {
        let mut companion = open_companion(&dir, 1);
        let turn = companion.respond("I'm feeling great and confident today").await.expect("turn");
        assert!(turn.persisted);
        assert!(HIGH_MOOD_RESPONSES.contains(&turn.reply.text.as_str()));
    }

    let companion = open_companion(&dir, 2);
    let history = companion.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].text, GREETING);
    assert_eq!(history[1].sender, SenderRole::User);
    assert!((history[1].sentiment - 0.9).abs() < 1e-9);
    assert_eq!(history[1].category, Category::Mood);
    assert_eq!(history[2].category, Category::Response);
}

#[tokio::test]
async fn test_stored_messages_match_history_exactly() {
    let dir = TempDir::new().expect("tempdir");
    let expected = {
        let mut companion = open_companion(&dir, 4);
        for text in ["I can't sleep", "Feeling hopeful after group", "I want to die"] {
            companion.respond(text).await.expect("turn");
        }
        companion.history().to_vec()
    };
    assert_eq!(expected.len(), 7);

    let store = SledConversationStore::open(dir.path(), DEFAULT_STORAGE_KEY).expect("reopen");
    assert_eq!(store.load().expect("load"), expected);
}

#[tokio::test]
async fn test_low_mood_turn() {
    let dir = TempDir::new().expect("tempdir");
    let mut companion = open_companion(&dir, 3);
    let turn = companion.respond("Today was terrible and I feel hopeless").await.expect("turn");
    assert!(turn.user_message.sentiment < 0.3);
    assert!(turn.crisis_notice.is_none());
    assert!(LOW_MOOD_RESPONSES.contains(&turn.reply.text.as_str()));
}

#[tokio::test]
async fn test_same_seed_same_replies() {
    let first = TempDir::new().expect("tempdir");
    let second = TempDir::new().expect("tempdir");
    let mut a = open_companion(&first, 42);
    let mut b = open_companion(&second, 42);

    for text in ["hello", "I feel good", "just a normal day"] {
        let left = a.respond(text).await.expect("turn");
        let right = b.respond(text).await.expect("turn");
        assert_eq!(left.reply.text, right.reply.text);
    }
}

#[tokio::test]
async fn test_quick_replies_are_analyzed() {
    let dir = TempDir::new().expect("tempdir");
    let mut companion = open_companion(&dir, 5);
    let turn = companion.quick_reply(1).await.expect("turn");
    assert_eq!(turn.user_message.text, QUICK_REPLIES[1]);
    assert_eq!(turn.user_message.category, Category::Cravings);
}

#[tokio::test]
async fn test_clear_history_then_reopen_greets_again() {
    let dir = TempDir::new().expect("tempdir");
    {
        let mut companion = open_companion(&dir, 6);
        companion.respond("hello").await.expect("turn");
        assert!(companion.clear_history());
        assert!(companion.history().is_empty());
    }
    let companion = open_companion(&dir, 6);
    assert_eq!(companion.history().len(), 1);
    assert_eq!(companion.history()[0].text, GREETING);
}

#[tokio::test]
async fn test_abandoned_reply_keeps_user_message() {
    let dir = TempDir::new().expect("tempdir");
    {
        let store = SledConversationStore::open(dir.path(), DEFAULT_STORAGE_KEY).expect("open store");
        let mut companion = Companion::new(
            ConversationLog::open(store),
            &AppConfig::default().companion,
            StdRng::seed_from_u64(9),
            Arc::new(MetricsCollector::default()),
        )
        .expect("companion")
        .with_delay(ThinkingDelay::new(5.0, 5.0).expect("delay"));

        let pending = companion.respond("I need support");
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(50), pending).await;
        assert!(timed_out.is_err());
    }

    let store = SledConversationStore::open(dir.path(), DEFAULT_STORAGE_KEY).expect("reopen");
    let stored = store.load().expect("load");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].text, "I need support");
}
