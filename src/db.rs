use std::fs;
use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{RecoveryError, Result};
use crate::models::{
    ChatInteraction, MoodDiaryEntry, MoodTrendPoint, NewPersona, Persona, Phq5Response, RiskEvent, SobrietyRecord,
    WearableRecord,
};
use crate::schema::{apple_watch_data, chat_interactions, mood_diary_entries, personas, phq5_responses, sobriety_data};
use crate::validation::InputValidator;

// Type alias for the database connection pool
/// Pool of SQLite connections
pub type DbPool = Pool<SqliteConnectionManager>;
/// A connection checked out of [`DbPool`]
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Telemetry database with pooled SQLite connections
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the telemetry database at `path`
    pub fn new(path: &str) -> Result<Self> {
        Self::with_pool_settings(path, 10, Duration::from_secs(30))
    }

    /// Open the database using the pool settings from configuration
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::with_pool_settings(
            &config.path,
            config.max_connections,
            Duration::from_secs(config.connection_timeout_secs),
        )
    }

    fn with_pool_settings(path: &str, max_connections: u32, timeout: Duration) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(max_connections)
            .connection_timeout(timeout)
            .build(manager)?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;
        info!(path, max_connections, "Telemetry database ready");

        Ok(Self { pool })
    }

    /// Create the telemetry tables if they don't exist
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/2025-06-01-000000_create_telemetry/up.sql"))?;
        debug!("Telemetry schema verified");
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Add a persona and return it with its assigned id
    pub fn add_persona(&self, new_persona: &NewPersona) -> Result<Persona> {
        InputValidator::validate_persona_name(&new_persona.name)
            .map_err(|e| RecoveryError::InvalidInput(e.to_string()))?;
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}) VALUES (?, ?)",
                personas::TABLE,
                personas::NAME,
                personas::PERSONA_TYPE
            ),
            params![new_persona.name, new_persona.persona_type],
        )?;

        Ok(Persona {
            id: conn.last_insert_rowid(),
            name: new_persona.name.clone(),
            persona_type: new_persona.persona_type.clone(),
        })
    }

    /// Add a wearable record; the record's `id` is ignored
    pub fn add_wearable(&self, record: &WearableRecord) -> Result<i64> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                apple_watch_data::TABLE,
                apple_watch_data::PERSONA_ID,
                apple_watch_data::DATE,
                apple_watch_data::HEART_RATE_AVG,
                apple_watch_data::HEART_RATE_RESTING,
                apple_watch_data::HEART_RATE_VARIABILITY,
                apple_watch_data::SLEEP_DURATION_HOURS,
                apple_watch_data::SLEEP_EFFICIENCY,
                apple_watch_data::DEEP_SLEEP_HOURS,
                apple_watch_data::REM_SLEEP_HOURS,
                apple_watch_data::STEPS,
                apple_watch_data::ACTIVE_CALORIES,
                apple_watch_data::EXERCISE_MINUTES,
                apple_watch_data::STAND_HOURS,
                apple_watch_data::STRESS_SCORE
            ),
            params![
                record.persona_id,
                record.date,
                record.heart_rate_avg,
                record.heart_rate_resting,
                record.heart_rate_variability,
                record.sleep_duration_hours,
                record.sleep_efficiency,
                record.deep_sleep_hours,
                record.rem_sleep_hours,
                record.steps,
                record.active_calories,
                record.exercise_minutes,
                record.stand_hours,
                record.stress_score
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Add a PHQ-5 response; the record's `id` is ignored
    pub fn add_screening(&self, response: &Phq5Response) -> Result<i64> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                phq5_responses::TABLE,
                phq5_responses::PERSONA_ID,
                phq5_responses::DATE,
                phq5_responses::LITTLE_INTEREST,
                phq5_responses::FEELING_DOWN,
                phq5_responses::SLEEP_TROUBLE,
                phq5_responses::TIRED_ENERGY,
                phq5_responses::APPETITE,
                phq5_responses::TOTAL_SCORE
            ),
            params![
                response.persona_id,
                response.date,
                response.little_interest,
                response.feeling_down,
                response.sleep_trouble,
                response.tired_energy,
                response.appetite,
                response.total_score
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Add a mood diary entry; the entry's `id` is ignored
    pub fn add_mood_entry(&self, entry: &MoodDiaryEntry) -> Result<i64> {
        let conn = self.get_connection()?;
        let triggers = serde_json::to_string(&entry.triggers)?;
        let coping_strategies = serde_json::to_string(&entry.coping_strategies)?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                mood_diary_entries::TABLE,
                mood_diary_entries::PERSONA_ID,
                mood_diary_entries::DATE,
                mood_diary_entries::MOOD_RATING,
                mood_diary_entries::ANXIETY_LEVEL,
                mood_diary_entries::CRAVING_INTENSITY,
                mood_diary_entries::ENERGY_LEVEL,
                mood_diary_entries::SLEEP_QUALITY,
                mood_diary_entries::PAIN_LEVEL,
                mood_diary_entries::TRIGGERS,
                mood_diary_entries::COPING_STRATEGIES,
                mood_diary_entries::NOTES,
                mood_diary_entries::WORD_COUNT
            ),
            params![
                entry.persona_id,
                entry.date,
                entry.mood_rating,
                entry.anxiety_level,
                entry.craving_intensity,
                entry.energy_level,
                entry.sleep_quality,
                entry.pain_level,
                triggers,
                coping_strategies,
                entry.notes,
                entry.word_count
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Add a chat interaction; the record's `id` is ignored
    pub fn add_chat(&self, chat: &ChatInteraction) -> Result<i64> {
        let conn = self.get_connection()?;
        let topics = serde_json::to_string(&chat.topics)?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                chat_interactions::TABLE,
                chat_interactions::PERSONA_ID,
                chat_interactions::DATE,
                chat_interactions::TIME,
                chat_interactions::MESSAGE_COUNT,
                chat_interactions::AVG_RESPONSE_TIME_HOURS,
                chat_interactions::SENTIMENT_SCORE,
                chat_interactions::TOPICS,
                chat_interactions::CRISIS_INDICATORS,
                chat_interactions::ENGAGEMENT_LEVEL
            ),
            params![
                chat.persona_id,
                chat.date,
                chat.time,
                chat.message_count,
                chat.avg_response_time_hours,
                chat.sentiment_score,
                topics,
                chat.crisis_indicators,
                chat.engagement_level
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Add a sobriety record; the record's `id` is ignored
    pub fn add_sobriety(&self, record: &SobrietyRecord) -> Result<i64> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                sobriety_data::TABLE,
                sobriety_data::PERSONA_ID,
                sobriety_data::DATE,
                sobriety_data::DAYS_SOBER,
                sobriety_data::RELAPSE_RISK_SCORE,
                sobriety_data::IN_TREATMENT,
                sobriety_data::MEDICATION_ADHERENCE,
                sobriety_data::MEETING_ATTENDANCE,
                sobriety_data::RELAPSE_OCCURRED
            ),
            params![
                record.persona_id,
                record.date,
                record.days_sober,
                record.relapse_risk_score,
                record.in_treatment,
                record.medication_adherence,
                record.meeting_attendance,
                record.relapse_occurred
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Map a database row to a Persona
    pub(crate) fn map_persona(row: &Row) -> rusqlite::Result<Persona> {
        Ok(Persona {
            id: row.get(personas::ID)?,
            name: row.get(personas::NAME)?,
            persona_type: row.get(personas::PERSONA_TYPE)?,
        })
    }

    /// Map a database row to a WearableRecord
    pub(crate) fn map_wearable(row: &Row) -> rusqlite::Result<WearableRecord> {
        Ok(WearableRecord {
            id: row.get(apple_watch_data::ID)?,
            persona_id: row.get(apple_watch_data::PERSONA_ID)?,
            date: row.get(apple_watch_data::DATE)?,
            heart_rate_avg: row.get(apple_watch_data::HEART_RATE_AVG)?,
            heart_rate_resting: row.get(apple_watch_data::HEART_RATE_RESTING)?,
            heart_rate_variability: row.get(apple_watch_data::HEART_RATE_VARIABILITY)?,
            sleep_duration_hours: row.get(apple_watch_data::SLEEP_DURATION_HOURS)?,
            sleep_efficiency: row.get(apple_watch_data::SLEEP_EFFICIENCY)?,
            deep_sleep_hours: row.get(apple_watch_data::DEEP_SLEEP_HOURS)?,
            rem_sleep_hours: row.get(apple_watch_data::REM_SLEEP_HOURS)?,
            steps: row.get(apple_watch_data::STEPS)?,
            active_calories: row.get(apple_watch_data::ACTIVE_CALORIES)?,
            exercise_minutes: row.get(apple_watch_data::EXERCISE_MINUTES)?,
            stand_hours: row.get(apple_watch_data::STAND_HOURS)?,
            stress_score: row.get(apple_watch_data::STRESS_SCORE)?,
        })
    }

    /// Map a database row to a Phq5Response
    pub(crate) fn map_screening(row: &Row) -> rusqlite::Result<Phq5Response> {
        Ok(Phq5Response {
            id: row.get(phq5_responses::ID)?,
            persona_id: row.get(phq5_responses::PERSONA_ID)?,
            date: row.get(phq5_responses::DATE)?,
            little_interest: row.get(phq5_responses::LITTLE_INTEREST)?,
            feeling_down: row.get(phq5_responses::FEELING_DOWN)?,
            sleep_trouble: row.get(phq5_responses::SLEEP_TROUBLE)?,
            tired_energy: row.get(phq5_responses::TIRED_ENERGY)?,
            appetite: row.get(phq5_responses::APPETITE)?,
            total_score: row.get(phq5_responses::TOTAL_SCORE)?,
        })
    }

    /// Map a database row to a MoodDiaryEntry
    pub(crate) fn map_mood_entry(row: &Row) -> rusqlite::Result<MoodDiaryEntry> {
        let triggers: String = row.get(mood_diary_entries::TRIGGERS)?;
        let coping_strategies: String = row.get(mood_diary_entries::COPING_STRATEGIES)?;
        Ok(MoodDiaryEntry {
            id: row.get(mood_diary_entries::ID)?,
            persona_id: row.get(mood_diary_entries::PERSONA_ID)?,
            date: row.get(mood_diary_entries::DATE)?,
            mood_rating: row.get(mood_diary_entries::MOOD_RATING)?,
            anxiety_level: row.get(mood_diary_entries::ANXIETY_LEVEL)?,
            craving_intensity: row.get(mood_diary_entries::CRAVING_INTENSITY)?,
            energy_level: row.get(mood_diary_entries::ENERGY_LEVEL)?,
            sleep_quality: row.get(mood_diary_entries::SLEEP_QUALITY)?,
            pain_level: row.get(mood_diary_entries::PAIN_LEVEL)?,
            triggers: parse_text_list(&triggers),
            coping_strategies: parse_text_list(&coping_strategies),
            notes: row.get(mood_diary_entries::NOTES)?,
            word_count: row.get(mood_diary_entries::WORD_COUNT)?,
        })
    }

    /// Map a database row to a ChatInteraction
    pub(crate) fn map_chat(row: &Row) -> rusqlite::Result<ChatInteraction> {
        let topics: String = row.get(chat_interactions::TOPICS)?;
        Ok(ChatInteraction {
            id: row.get(chat_interactions::ID)?,
            persona_id: row.get(chat_interactions::PERSONA_ID)?,
            date: row.get(chat_interactions::DATE)?,
            time: row.get(chat_interactions::TIME)?,
            message_count: row.get(chat_interactions::MESSAGE_COUNT)?,
            avg_response_time_hours: row.get(chat_interactions::AVG_RESPONSE_TIME_HOURS)?,
            sentiment_score: row.get(chat_interactions::SENTIMENT_SCORE)?,
            topics: parse_text_list(&topics),
            crisis_indicators: row.get(chat_interactions::CRISIS_INDICATORS)?,
            engagement_level: row.get(chat_interactions::ENGAGEMENT_LEVEL)?,
        })
    }

    /// Map a database row to a SobrietyRecord
    pub(crate) fn map_sobriety(row: &Row) -> rusqlite::Result<SobrietyRecord> {
        Ok(SobrietyRecord {
            id: row.get(sobriety_data::ID)?,
            persona_id: row.get(sobriety_data::PERSONA_ID)?,
            date: row.get(sobriety_data::DATE)?,
            days_sober: row.get(sobriety_data::DAYS_SOBER)?,
            relapse_risk_score: row.get(sobriety_data::RELAPSE_RISK_SCORE)?,
            in_treatment: row.get(sobriety_data::IN_TREATMENT)?,
            medication_adherence: row.get(sobriety_data::MEDICATION_ADHERENCE)?,
            meeting_attendance: row.get(sobriety_data::MEETING_ATTENDANCE)?,
            relapse_occurred: row.get(sobriety_data::RELAPSE_OCCURRED)?,
        })
    }

    /// Map a sobriety row joined with `personas.name AS name`
    pub(crate) fn map_risk_event(row: &Row) -> rusqlite::Result<RiskEvent> {
        Ok(RiskEvent {
            persona_id: row.get(sobriety_data::PERSONA_ID)?,
            name: row.get("name")?,
            date: row.get(sobriety_data::DATE)?,
            risk_score: row.get(sobriety_data::RELAPSE_RISK_SCORE)?,
            days_sober: row.get(sobriety_data::DAYS_SOBER)?,
        })
    }

    /// Map a mood row joined with `personas.name AS name`
    pub(crate) fn map_mood_point(row: &Row) -> rusqlite::Result<MoodTrendPoint> {
        Ok(MoodTrendPoint {
            persona_id: row.get(mood_diary_entries::PERSONA_ID)?,
            name: row.get("name")?,
            date: row.get(mood_diary_entries::DATE)?,
            mood_rating: row.get(mood_diary_entries::MOOD_RATING)?,
            anxiety_level: row.get(mood_diary_entries::ANXIETY_LEVEL)?,
            craving_intensity: row.get(mood_diary_entries::CRAVING_INTENSITY)?,
        })
    }
}

/// Decode a JSON array stored as TEXT; anything unparseable reads as empty
fn parse_text_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested/telemetry.db");
        let db = Database::new(path.to_str().expect("utf8 path")).expect("open");
        assert!(path.exists());
        assert!(db.get_connection().is_ok());
    }

    #[test]
    fn test_text_lists_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let db = Database::new(dir.path().join("t.db").to_str().expect("utf8 path")).expect("open");
        let persona = db
            .add_persona(&NewPersona {
                name: "Sarah".to_string(),
                persona_type: "high_risk".to_string(),
            })
            .expect("persona");

        let entry = MoodDiaryEntry {
            id: 0,
            persona_id: persona.id,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).expect("date"),
            mood_rating: 4.0,
            anxiety_level: 6.0,
            craving_intensity: 7.0,
            energy_level: 3.0,
            sleep_quality: 5.0,
            pain_level: 1.0,
            triggers: vec!["work".to_string(), "loneliness".to_string()],
            coping_strategies: vec!["called sponsor".to_string()],
            notes: "Rough day".to_string(),
            word_count: 2,
        };
        db.add_mood_entry(&entry).expect("insert");

        let conn = db.get_connection().expect("conn");
        let stored = conn
            .query_row(
                &format!("SELECT * FROM {}", mood_diary_entries::TABLE),
                [],
                Database::map_mood_entry,
            )
            .expect("row");
        assert_eq!(stored.triggers, entry.triggers);
        assert_eq!(stored.coping_strategies, entry.coping_strategies);
    }

    #[test]
    fn test_blank_persona_name_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let db = Database::new(dir.path().join("t.db").to_str().expect("utf8 path")).expect("open");
        let result = db.add_persona(&NewPersona {
            name: "  ".to_string(),
            persona_type: "stable".to_string(),
        });
        assert!(matches!(result, Err(RecoveryError::InvalidInput(_))));
    }

    #[test]
    fn test_malformed_text_list_reads_empty() {
        assert!(parse_text_list("not json").is_empty());
    }
}
