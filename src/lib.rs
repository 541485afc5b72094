//! Recovery Companion - Chat Support and Clinician Dashboard
//!
//! A Rust library for a recovery-support companion: rule-based analysis of
//! patient chat messages, canned supportive replies, an on-device
//! conversation log, and clinician dashboards over wearable, screening and
//! sobriety telemetry.
//!
//! # Features
//!
//! - Crisis detection, sentiment scoring and topic categorization
//! - Seedable response selection with a cosmetic thinking delay
//! - Conversation history persisted to an embedded sled store
//! - Overview, patient roster and risk analysis views over SQLite
//! - Wearable health-data boundary with a deterministic sample provider
//! - Patient health dashboard, mood diary and daily quick mood log

/// Message analysis
pub mod analyzer;
/// Conversation driver
pub mod companion;
/// Configuration management
pub mod config;
/// Conversation log storage
pub mod conversation;
/// Clinician dashboard aggregation
pub mod dashboard;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Wearable health-data boundary
pub mod health;
/// Keyword tables used by the analyzer
pub mod lexicon;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Patient-side records and mood logging
pub mod patient;
/// Read access to telemetry
pub mod repository;
/// Companion reply selection
pub mod responder;
/// Database schema definitions
pub mod schema;
/// Session context for clinician views
pub mod session;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use analyzer::MessageAnalyzer;
pub use companion::{Companion, Turn};
pub use conversation::{ConversationLog, ConversationStore, MemoryConversationStore, SledConversationStore};
pub use dashboard::DashboardAggregator;
pub use db::Database;
pub use error::{RecoveryError, Result};
pub use health::HealthProvider;
pub use models::{AnalysisResult, Category, Message};
pub use patient::{PatientStore, PatientTracker, SledPatientStore};
pub use repository::TelemetryStore;
pub use responder::{ResponseSelector, ThinkingDelay};
pub use session::SessionContext;
