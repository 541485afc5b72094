//! Append-only conversation log and its on-device storage.
//!
//! The whole log is stored as one serialized list under a fixed key and is
//! always read and written wholesale.

use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{RecoveryError, Result};
use crate::models::Message;

/// Default key the log is stored under
pub const DEFAULT_STORAGE_KEY: &str = "chatHistory";

/// Wholesale storage for a conversation log
#[cfg_attr(test, mockall::automock)]
pub trait ConversationStore {
    /// Read the full log; an absent log is an empty list
    fn load(&self) -> Result<Vec<Message>>;

    /// Replace the stored log with `log`
    fn save(&self, log: &[Message]) -> Result<()>;
}

/// Conversation storage backed by an embedded sled database
pub struct SledConversationStore {
    db: sled::Db,
    key: String,
}

impl SledConversationStore {
    /// Open (or create) the store at `path`, keeping the log under `key`
    pub fn open(path: &Path, key: &str) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Ok(Self {
            db,
            key: key.to_string(),
        })
    }

    /// Open a throwaway store that lives only as long as this value
    pub fn temporary(key: &str) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db,
            key: key.to_string(),
        })
    }

}

impl ConversationStore for SledConversationStore {
    fn load(&self) -> Result<Vec<Message>> {
        match self.db.get(self.key.as_bytes())? {
            Some(data) => Ok(bincode::deserialize(&data)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, log: &[Message]) -> Result<()> {
        let data = bincode::serialize(log)?;
        self.db.insert(self.key.as_bytes(), data)?;
        self.db.flush()?;
        Ok(())
    }
}

/// In-process conversation storage
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    log: Mutex<Vec<Message>>,
}

impl MemoryConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryConversationStore {
    fn load(&self) -> Result<Vec<Message>> {
        let log = self
            .log
            .lock()
            .map_err(|e| RecoveryError::Storage(format!("Conversation store poisoned: {e}")))?;
        Ok(log.clone())
    }

    fn save(&self, log: &[Message]) -> Result<()> {
        let mut stored = self
            .log
            .lock()
            .map_err(|e| RecoveryError::Storage(format!("Conversation store poisoned: {e}")))?;
        *stored = log.to_vec();
        Ok(())
    }
}

impl<T: ConversationStore + ?Sized> ConversationStore for Box<T> {
    fn load(&self) -> Result<Vec<Message>> {
        (**self).load()
    }

    fn save(&self, log: &[Message]) -> Result<()> {
        (**self).save(log)
    }
}

/// Ordered, append-only log of one conversation
pub struct ConversationLog<S: ConversationStore> {
    store: S,
    messages: Vec<Message>,
}

impl<S: ConversationStore> ConversationLog<S> {
    /// Open the log, loading whatever the store holds
    ///
    /// A failed read is logged and the log starts empty.
    pub fn open(store: S) -> Self {
        let messages = match store.load() {
            Ok(messages) => {
                debug!(count = messages.len(), "Loaded conversation history");
                messages
            },
            Err(e) => {
                warn!(error = %e, "Error loading chat history, starting empty");
                Vec::new()
            },
        };
        Self { store, messages }
    }

    /// Append a message to the in-memory log
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Messages in insertion order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the log
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when the log holds no messages
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Reload the full log from storage, replacing the in-memory copy
    ///
    /// On a failed read the in-memory copy is kept.
    pub fn load_all(&mut self) -> Vec<Message> {
        match self.store.load() {
            Ok(messages) => self.messages = messages,
            Err(e) => warn!(error = %e, "Error reloading chat history"),
        }
        self.messages.clone()
    }

    /// Write the log to storage; returns whether the write was confirmed
    pub fn persist(&self) -> bool {
        match self.store.save(&self.messages) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, count = self.messages.len(), "Error saving chat history");
                false
            },
        }
    }

    /// Drop every message and persist the empty log
    pub fn clear(&mut self) -> bool {
        self.messages.clear();
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, Category};

    fn sample_message(text: &str) -> Message {
        let analysis = AnalysisResult {
            sentiment: 0.5,
            crisis_flag: false,
            category: Category::General,
        };
        Message::from_user(text, &analysis)
    }

    #[test]
    fn test_failed_load_starts_empty() {
        let mut store = MockConversationStore::new();
        store
            .expect_load()
            .returning(|| Err(RecoveryError::Storage("disk gone".to_string())));
        let log = ConversationLog::open(store);
        assert!(log.is_empty());
    }

    #[test]
    fn test_failed_save_is_not_fatal() {
        let mut store = MockConversationStore::new();
        store.expect_load().returning(|| Ok(Vec::new()));
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(RecoveryError::Storage("read-only".to_string())));

        let mut log = ConversationLog::open(store);
        log.append(sample_message("still here"));
        assert!(!log.persist());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut log = ConversationLog::open(MemoryConversationStore::new());
        log.append(sample_message("one"));
        log.append(sample_message("two"));
        assert!(log.persist());

        let reloaded = log.load_all();
        let texts: Vec<&str> = reloaded.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_sled_store_missing_key_is_empty() {
        let store = SledConversationStore::temporary(DEFAULT_STORAGE_KEY).expect("open");
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn test_clear_persists_empty_log() {
        let mut log = ConversationLog::open(MemoryConversationStore::new());
        log.append(sample_message("gone soon"));
        assert!(log.persist());
        assert!(log.clear());
        assert!(log.load_all().is_empty());
    }
}
