//! Database schema definitions
//!
//! Constants for the table and column names of the telemetry store, used to
//! build rusqlite queries.

/// Personas table schema
pub mod personas {
    /// Table name
    pub const TABLE: &str = "personas";
    /// Primary key column
    pub const ID: &str = "id";
    /// Display name column
    pub const NAME: &str = "name";
    /// Risk archetype column
    pub const PERSONA_TYPE: &str = "persona_type";
}

/// Wearable biometrics table schema
pub mod apple_watch_data {
    /// Table name
    pub const TABLE: &str = "apple_watch_data";
    /// Primary key column
    pub const ID: &str = "id";
    /// Owning persona column
    pub const PERSONA_ID: &str = "persona_id";
    /// Record date column (YYYY-MM-DD)
    pub const DATE: &str = "date";
    /// Heart rate avg column
    pub const HEART_RATE_AVG: &str = "heart_rate_avg";
    /// Heart rate resting column
    pub const HEART_RATE_RESTING: &str = "heart_rate_resting";
    /// Heart rate variability column
    pub const HEART_RATE_VARIABILITY: &str = "heart_rate_variability";
    /// Sleep duration hours column
    pub const SLEEP_DURATION_HOURS: &str = "sleep_duration_hours";
    /// Sleep efficiency column
    pub const SLEEP_EFFICIENCY: &str = "sleep_efficiency";
    /// Deep sleep hours column
    pub const DEEP_SLEEP_HOURS: &str = "deep_sleep_hours";
    /// Rem sleep hours column
    pub const REM_SLEEP_HOURS: &str = "rem_sleep_hours";
    /// Steps column
    pub const STEPS: &str = "steps";
    /// Active calories column
    pub const ACTIVE_CALORIES: &str = "active_calories";
    /// Exercise minutes column
    pub const EXERCISE_MINUTES: &str = "exercise_minutes";
    /// Stand hours column
    pub const STAND_HOURS: &str = "stand_hours";
    /// Stress score column
    pub const STRESS_SCORE: &str = "stress_score";
}

/// PHQ-5 screening table schema
pub mod phq5_responses {
    /// Table name
    pub const TABLE: &str = "phq5_responses";
    /// Primary key column
    pub const ID: &str = "id";
    /// Owning persona column
    pub const PERSONA_ID: &str = "persona_id";
    /// Record date column (YYYY-MM-DD)
    pub const DATE: &str = "date";
    /// Little interest column
    pub const LITTLE_INTEREST: &str = "little_interest";
    /// Feeling down column
    pub const FEELING_DOWN: &str = "feeling_down";
    /// Sleep trouble column
    pub const SLEEP_TROUBLE: &str = "sleep_trouble";
    /// Tired energy column
    pub const TIRED_ENERGY: &str = "tired_energy";
    /// Appetite column
    pub const APPETITE: &str = "appetite";
    /// Total score column
    pub const TOTAL_SCORE: &str = "total_score";
}

/// Mood diary table schema
pub mod mood_diary_entries {
    /// Table name
    pub const TABLE: &str = "mood_diary_entries";
    /// Primary key column
    pub const ID: &str = "id";
    /// Owning persona column
    pub const PERSONA_ID: &str = "persona_id";
    /// Record date column (YYYY-MM-DD)
    pub const DATE: &str = "date";
    /// Mood rating column
    pub const MOOD_RATING: &str = "mood_rating";
    /// Anxiety level column
    pub const ANXIETY_LEVEL: &str = "anxiety_level";
    /// Craving intensity column
    pub const CRAVING_INTENSITY: &str = "craving_intensity";
    /// Energy level column
    pub const ENERGY_LEVEL: &str = "energy_level";
    /// Sleep quality column
    pub const SLEEP_QUALITY: &str = "sleep_quality";
    /// Pain level column
    pub const PAIN_LEVEL: &str = "pain_level";
    /// JSON array stored as text
    pub const TRIGGERS: &str = "triggers";
    /// JSON array stored as text
    pub const COPING_STRATEGIES: &str = "coping_strategies";
    /// Notes column
    pub const NOTES: &str = "notes";
    /// Word count column
    pub const WORD_COUNT: &str = "word_count";
}

/// Chat interactions table schema
pub mod chat_interactions {
    /// Table name
    pub const TABLE: &str = "chat_interactions";
    /// Primary key column
    pub const ID: &str = "id";
    /// Owning persona column
    pub const PERSONA_ID: &str = "persona_id";
    /// Record date column (YYYY-MM-DD)
    pub const DATE: &str = "date";
    /// Time column
    pub const TIME: &str = "time";
    /// Message count column
    pub const MESSAGE_COUNT: &str = "message_count";
    /// Avg response time hours column
    pub const AVG_RESPONSE_TIME_HOURS: &str = "avg_response_time_hours";
    /// Sentiment score column
    pub const SENTIMENT_SCORE: &str = "sentiment_score";
    /// JSON array stored as text
    pub const TOPICS: &str = "topics";
    /// Crisis indicators column
    pub const CRISIS_INDICATORS: &str = "crisis_indicators";
    /// Engagement level column
    pub const ENGAGEMENT_LEVEL: &str = "engagement_level";
}

/// Sobriety tracking table schema
pub mod sobriety_data {
    /// Table name
    pub const TABLE: &str = "sobriety_data";
    /// Primary key column
    pub const ID: &str = "id";
    /// Owning persona column
    pub const PERSONA_ID: &str = "persona_id";
    /// Record date column (YYYY-MM-DD)
    pub const DATE: &str = "date";
    /// Days sober column
    pub const DAYS_SOBER: &str = "days_sober";
    /// Relapse risk score column
    pub const RELAPSE_RISK_SCORE: &str = "relapse_risk_score";
    /// In treatment column
    pub const IN_TREATMENT: &str = "in_treatment";
    /// Medication adherence column
    pub const MEDICATION_ADHERENCE: &str = "medication_adherence";
    /// Meeting attendance column
    pub const MEETING_ATTENDANCE: &str = "meeting_attendance";
    /// Relapse occurred column
    pub const RELAPSE_OCCURRED: &str = "relapse_occurred";
}
