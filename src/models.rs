//! Data models for conversation handling and telemetry storage
//!
//! This module contains all data structures used throughout the application,
//! including chat messages, analysis results, telemetry records and the
//! dashboard view models folded from them.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    /// The patient using the app
    User,
    /// The recovery companion
    Companion,
}

/// Coarse topic label attached to every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Mood or feelings
    Mood,
    /// Cravings or urges
    Cravings,
    /// Stress or anxiety
    Stress,
    /// Sleep or tiredness
    Sleep,
    /// Meetings and group treatment
    Treatment,
    /// Nothing more specific matched
    General,
    /// Companion opening message
    Greeting,
    /// Companion reply
    Response,
}

impl Category {
    /// Lowercase label used in logs and serialized output
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mood => "mood",
            Self::Cravings => "cravings",
            Self::Stress => "stress",
            Self::Sleep => "sleep",
            Self::Treatment => "treatment",
            Self::General => "general",
            Self::Greeting => "greeting",
            Self::Response => "response",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of analyzing one message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Positivity in [0, 1], 0.5 is neutral
    pub sentiment: f64,
    /// True when the text contains a crisis phrase
    pub crisis_flag: bool,
    /// Topic label
    pub category: Category,
}

/// A single chat message with its analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: Uuid,
    /// Message text content
    pub text: String,
    /// Timestamp when the message was created
    pub timestamp: DateTime<Local>,
    /// Author of the message
    pub sender: SenderRole,
    /// Sentiment in [0, 1]
    pub sentiment: f64,
    /// Crisis indicator
    pub crisis_flag: bool,
    /// Topic label
    pub category: Category,
}

impl Message {
    /// Build a user message from its text and analysis
    #[must_use]
    pub fn from_user(text: &str, analysis: &AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            timestamp: Local::now(),
            sender: SenderRole::User,
            sentiment: analysis.sentiment,
            crisis_flag: analysis.crisis_flag,
            category: analysis.category,
        }
    }

    /// Build a companion-authored message
    #[must_use]
    pub fn from_companion(text: &str, category: Category) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            timestamp: Local::now(),
            sender: SenderRole::Companion,
            sentiment: 0.8,
            crisis_flag: false,
            category,
        }
    }
}

/// A synthetic patient identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Database primary key
    pub id: i64,
    /// Display name
    pub name: String,
    /// Risk archetype used to generate the series
    pub persona_type: String,
}

/// Daily wearable biometrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableRecord {
    /// Database primary key
    pub id: i64,
    /// Foreign key to personas
    pub persona_id: i64,
    /// Record date
    pub date: NaiveDate,
    /// Average heart rate (bpm)
    pub heart_rate_avg: f64,
    /// Resting heart rate (bpm)
    pub heart_rate_resting: f64,
    /// Heart rate variability (ms)
    pub heart_rate_variability: f64,
    /// Total sleep (hours)
    pub sleep_duration_hours: f64,
    /// Sleep efficiency (percent)
    pub sleep_efficiency: f64,
    /// Deep sleep (hours)
    pub deep_sleep_hours: f64,
    /// REM sleep (hours)
    pub rem_sleep_hours: f64,
    /// Step count
    pub steps: i64,
    /// Active calories
    pub active_calories: i64,
    /// Exercise minutes
    pub exercise_minutes: i64,
    /// Stand hours
    pub stand_hours: i64,
    /// Derived stress score
    pub stress_score: f64,
}

/// PHQ-5 questionnaire response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phq5Response {
    /// Database primary key
    pub id: i64,
    /// Foreign key to personas
    pub persona_id: i64,
    /// Response date
    pub date: NaiveDate,
    /// Little interest or pleasure (0-3)
    pub little_interest: i64,
    /// Feeling down (0-3)
    pub feeling_down: i64,
    /// Trouble sleeping (0-3)
    pub sleep_trouble: i64,
    /// Tired or low energy (0-3)
    pub tired_energy: i64,
    /// Appetite changes (0-3)
    pub appetite: i64,
    /// Summed score
    pub total_score: i64,
}

/// Mood diary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodDiaryEntry {
    /// Database primary key
    pub id: i64,
    /// Foreign key to personas
    pub persona_id: i64,
    /// Entry date
    pub date: NaiveDate,
    /// Mood rating
    pub mood_rating: f64,
    /// Anxiety level
    pub anxiety_level: f64,
    /// Craving intensity
    pub craving_intensity: f64,
    /// Energy level
    pub energy_level: f64,
    /// Sleep quality
    pub sleep_quality: f64,
    /// Pain level
    pub pain_level: f64,
    /// Reported triggers
    pub triggers: Vec<String>,
    /// Coping strategies used
    pub coping_strategies: Vec<String>,
    /// Free-text notes
    pub notes: String,
    /// Word count of the notes
    pub word_count: i64,
}

/// Aggregated chat activity for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInteraction {
    /// Database primary key
    pub id: i64,
    /// Foreign key to personas
    pub persona_id: i64,
    /// Interaction date
    pub date: NaiveDate,
    /// Time of day (HH:MM)
    pub time: String,
    /// Messages exchanged
    pub message_count: i64,
    /// Average response time (hours)
    pub avg_response_time_hours: f64,
    /// Mean sentiment
    pub sentiment_score: f64,
    /// Topics discussed
    pub topics: Vec<String>,
    /// Whether crisis language appeared
    pub crisis_indicators: bool,
    /// Engagement level
    pub engagement_level: f64,
}

/// Sobriety tracking record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobrietyRecord {
    /// Database primary key
    pub id: i64,
    /// Foreign key to personas
    pub persona_id: i64,
    /// Record date
    pub date: NaiveDate,
    /// Consecutive sober days
    pub days_sober: i64,
    /// Relapse risk in [0, 1]
    pub relapse_risk_score: f64,
    /// Currently in a treatment program
    pub in_treatment: bool,
    /// Medication adherence ratio
    pub medication_adherence: f64,
    /// Meetings attended
    pub meeting_attendance: i64,
    /// Relapse happened on this date
    pub relapse_occurred: bool,
}

/// Data for creating a new persona
#[derive(Debug, Clone)]
pub struct NewPersona {
    /// Display name
    pub name: String,
    /// Risk archetype
    pub persona_type: String,
}

/// PHQ-5 severity band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phq5Severity {
    /// Score 0-4
    Minimal,
    /// Score 5-9
    Mild,
    /// Score 10-14
    Moderate,
    /// Score 15 and above
    Severe,
}

impl Phq5Severity {
    /// Band for a summed PHQ-5 score
    #[must_use]
    pub const fn from_score(score: i64) -> Self {
        match score {
            i64::MIN..=4 => Self::Minimal,
            5..=9 => Self::Mild,
            10..=14 => Self::Moderate,
            _ => Self::Severe,
        }
    }
}

/// Relapse risk band shown next to a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below 0.4
    Stable,
    /// 0.4 to below 0.6
    Moderate,
    /// 0.6 to below 0.8
    Elevated,
    /// 0.8 and above
    Critical,
}

impl RiskLevel {
    /// Band for a relapse risk score
    #[must_use]
    pub fn from_score(risk: f64) -> Self {
        if risk >= 0.8 {
            Self::Critical
        } else if risk >= 0.6 {
            Self::Elevated
        } else if risk >= 0.4 {
            Self::Moderate
        } else {
            Self::Stable
        }
    }
}

/// One point on a risk trend chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPoint {
    /// Record date
    pub date: NaiveDate,
    /// Relapse risk on that date
    pub risk_score: f64,
    /// Days sober on that date
    pub days_sober: i64,
    /// Relapse happened on that date
    pub relapse_occurred: bool,
}

impl From<&SobrietyRecord> for RiskPoint {
    fn from(record: &SobrietyRecord) -> Self {
        Self {
            date: record.date,
            risk_score: record.relapse_risk_score,
            days_sober: record.days_sober,
            relapse_occurred: record.relapse_occurred,
        }
    }
}

/// A sobriety record joined with its persona name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    /// Foreign key to personas
    pub persona_id: i64,
    /// Persona display name
    pub name: String,
    /// Record date
    pub date: NaiveDate,
    /// Relapse risk on that date
    pub risk_score: f64,
    /// Days sober on that date
    pub days_sober: i64,
}

/// A mood entry joined with its persona name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodTrendPoint {
    /// Foreign key to personas
    pub persona_id: i64,
    /// Persona display name
    pub name: String,
    /// Entry date
    pub date: NaiveDate,
    /// Mood rating
    pub mood_rating: f64,
    /// Anxiety level
    pub anxiety_level: f64,
    /// Craving intensity
    pub craving_intensity: f64,
}

/// Per-patient projection over the latest record of every series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    /// Persona identity
    pub persona: Persona,

    /// Latest relapse risk, 0 when unknown
    pub current_risk: f64,
    /// Band for `current_risk`
    pub risk_level: RiskLevel,
    /// Latest days sober
    pub days_sober: i64,
    /// Date of the latest sobriety record
    pub last_update: Option<NaiveDate>,
    /// Latest treatment flag
    pub in_treatment: bool,
    /// Latest medication adherence
    pub medication_adherence: f64,
    /// Latest meeting attendance
    pub meeting_attendance: i64,

    /// Chats counted in the metrics below
    pub total_chats: usize,
    /// Mean chat sentiment
    pub avg_sentiment: f64,
    /// Chats flagged with crisis indicators
    pub crisis_indicators: usize,
    /// Date of the latest chat
    pub last_chat_date: Option<NaiveDate>,

    /// Latest stress score
    pub current_stress: f64,
    /// Latest resting heart rate
    pub resting_hr: f64,
    /// Latest heart rate variability
    pub hrv: f64,
    /// Latest sleep duration
    pub sleep_hours: f64,
    /// Latest sleep efficiency
    pub sleep_efficiency: f64,

    /// Latest mood rating
    pub current_mood: f64,
    /// Latest anxiety level
    pub current_anxiety: f64,
    /// Latest craving intensity
    pub current_cravings: f64,
    /// Date of the latest mood entry
    pub last_mood_entry: Option<NaiveDate>,

    /// Latest PHQ-5 total
    pub phq5_score: Option<i64>,
    /// Severity band for `phq5_score`
    pub phq5_severity: Option<Phq5Severity>,
    /// Date of the latest PHQ-5 response
    pub phq5_date: Option<NaiveDate>,

    /// Risk history, oldest first
    pub risk_trend: Vec<RiskPoint>,
}

/// Chat engagement for one persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStats {
    /// Persona display name
    pub name: String,
    /// All chat interactions on record
    pub total_chats: usize,
    /// Mean sentiment over those chats
    pub avg_sentiment: f64,
    /// Chats flagged with crisis indicators
    pub crisis_indicators: usize,
}

/// Headline numbers of the overview page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewSummary {
    /// Personas on record
    pub total_patients: usize,
    /// Patients whose current risk is above the high-risk threshold
    pub high_risk_count: usize,
    /// Mean current risk, rounded to three decimals
    pub avg_risk: f64,
    /// Relapses among the recent relapse events
    pub total_relapses: usize,
}

/// Overview dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    /// Headline numbers
    pub summary: OverviewSummary,
    /// Patient rows, highest risk first
    pub patients: Vec<PatientSummary>,
    /// Highest-risk sobriety records
    pub high_risk_patients: Vec<RiskEvent>,
    /// Most recent relapse events
    pub recent_relapses: Vec<RiskEvent>,
    /// Chat engagement per persona
    pub chat_stats: Vec<ChatStats>,
    /// Most recent mood entries
    pub recent_mood_data: Vec<MoodTrendPoint>,
}

/// Risk trend of one persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRiskTrend {
    /// Persona identity
    pub persona: Persona,
    /// Risk history, oldest first
    pub risk_trend: Vec<RiskPoint>,
}

/// Cohort statistics over the full sobriety series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskStats {
    /// Personas on record
    pub total_patients: usize,
    /// Mean risk over every sobriety record, rounded to three decimals
    pub avg_risk: f64,
    /// Records at or above the high-risk threshold
    pub high_risk_count: usize,
    /// Records at or above the critical threshold
    pub critical_risk_count: usize,
}

/// Risk analysis dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// Per-persona trends
    pub risk_trends: Vec<PersonaRiskTrend>,
    /// High-risk records, newest first
    pub high_risk_patients: Vec<RiskEvent>,
    /// Every relapse event, newest first
    pub relapse_events: Vec<RiskEvent>,
    /// Cohort statistics
    pub risk_stats: RiskStats,
}

/// Result of probing the telemetry store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseHealth {
    /// "healthy" or "error"
    pub status: String,
    /// "connected" or "disconnected"
    pub database: String,
    /// Error text when the check failed
    pub error: Option<String>,
    /// RFC 3339 check time
    pub timestamp: String,
}

impl DatabaseHealth {
    /// The store answered, stamped now
    #[must_use]
    pub fn connected() -> Self {
        Self {
            status: "healthy".to_string(),
            database: "connected".to_string(),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// The store could not be reached, stamped now
    #[must_use]
    pub fn disconnected(error: impl ToString) -> Self {
        Self {
            status: "error".to_string(),
            database: "disconnected".to_string(),
            error: Some(error.to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// True when the store answered
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
