//! Read access to the clinician telemetry store.
//!
//! Every query checks out its own pooled connection; nothing here spans a
//! transaction, so a view built from several reads may observe writes made
//! between them.

use rusqlite::{params, OptionalExtension};

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    ChatInteraction, MoodDiaryEntry, MoodTrendPoint, Persona, Phq5Response, RiskEvent, RiskPoint, SobrietyRecord,
    WearableRecord,
};
use crate::schema::{apple_watch_data, chat_interactions, mood_diary_entries, personas, phq5_responses, sobriety_data};

/// Sort order for high-risk record listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskOrder {
    /// Highest risk first
    ByRisk,
    /// Newest date first
    ByDate,
}

/// Queries the dashboard is built from
#[cfg_attr(test, mockall::automock)]
pub trait TelemetryStore {
    /// Every persona on record
    fn personas(&self) -> Result<Vec<Persona>>;

    /// Newest sobriety record of a persona
    fn latest_sobriety(&self, persona_id: i64) -> Result<Option<SobrietyRecord>>;

    /// Newest wearable record of a persona
    fn latest_wearable(&self, persona_id: i64) -> Result<Option<WearableRecord>>;

    /// Newest PHQ-5 response of a persona
    fn latest_screening(&self, persona_id: i64) -> Result<Option<Phq5Response>>;

    /// Mood entries of a persona, newest first
    fn recent_moods(&self, persona_id: i64, limit: usize) -> Result<Vec<MoodDiaryEntry>>;

    /// Chat interactions of a persona, newest first; `None` returns all
    fn chats(&self, persona_id: i64, limit: Option<usize>) -> Result<Vec<ChatInteraction>>;

    /// The last `points` sobriety records of a persona, oldest first
    fn risk_trend(&self, persona_id: i64, points: usize) -> Result<Vec<RiskPoint>>;

    /// Sobriety records with risk at or above `threshold`
    fn high_risk_records(&self, threshold: f64, order: RiskOrder, limit: usize) -> Result<Vec<RiskEvent>>;

    /// Relapse events, newest first; `None` returns all
    fn relapse_events(&self, limit: Option<usize>) -> Result<Vec<RiskEvent>>;

    /// Mood entries across every persona, newest first
    fn recent_mood_points(&self, limit: usize) -> Result<Vec<MoodTrendPoint>>;

    /// Risk score of every sobriety record
    fn risk_scores(&self) -> Result<Vec<f64>>;

    /// Cheap read proving the store answers
    fn ping(&self) -> Result<()>;
}

/// SQLite treats a negative LIMIT as unbounded
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX))
}

impl TelemetryStore for Database {
    fn personas(&self) -> Result<Vec<Persona>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY {} ASC", personas::TABLE, personas::ID))?;
        let rows = stmt.query_map([], Self::map_persona)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn latest_sobriety(&self, persona_id: i64) -> Result<Option<SobrietyRecord>> {
        let conn = self.get_connection()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC LIMIT 1",
                    sobriety_data::TABLE,
                    sobriety_data::PERSONA_ID,
                    sobriety_data::DATE
                ),
                params![persona_id],
                Self::map_sobriety,
            )
            .optional()?;
        Ok(record)
    }

    fn latest_wearable(&self, persona_id: i64) -> Result<Option<WearableRecord>> {
        let conn = self.get_connection()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC LIMIT 1",
                    apple_watch_data::TABLE,
                    apple_watch_data::PERSONA_ID,
                    apple_watch_data::DATE
                ),
                params![persona_id],
                Self::map_wearable,
            )
            .optional()?;
        Ok(record)
    }

    fn latest_screening(&self, persona_id: i64) -> Result<Option<Phq5Response>> {
        let conn = self.get_connection()?;
        let response = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC LIMIT 1",
                    phq5_responses::TABLE,
                    phq5_responses::PERSONA_ID,
                    phq5_responses::DATE
                ),
                params![persona_id],
                Self::map_screening,
            )
            .optional()?;
        Ok(response)
    }

    fn recent_moods(&self, persona_id: i64, limit: usize) -> Result<Vec<MoodDiaryEntry>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC LIMIT ?",
            mood_diary_entries::TABLE,
            mood_diary_entries::PERSONA_ID,
            mood_diary_entries::DATE
        ))?;
        let rows = stmt.query_map(params![persona_id, sql_limit(Some(limit))], Self::map_mood_entry)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn chats(&self, persona_id: i64, limit: Option<usize>) -> Result<Vec<ChatInteraction>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC LIMIT ?",
            chat_interactions::TABLE,
            chat_interactions::PERSONA_ID,
            chat_interactions::DATE
        ))?;
        let rows = stmt.query_map(params![persona_id, sql_limit(limit)], Self::map_chat)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn risk_trend(&self, persona_id: i64, points: usize) -> Result<Vec<RiskPoint>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC LIMIT ?",
            sobriety_data::TABLE,
            sobriety_data::PERSONA_ID,
            sobriety_data::DATE
        ))?;
        let rows = stmt.query_map(params![persona_id, sql_limit(Some(points))], Self::map_sobriety)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        // Newest-first from the query; charts want oldest first
        Ok(records.iter().rev().map(RiskPoint::from).collect())
    }

    fn high_risk_records(&self, threshold: f64, order: RiskOrder, limit: usize) -> Result<Vec<RiskEvent>> {
        let order_column = match order {
            RiskOrder::ByRisk => sobriety_data::RELAPSE_RISK_SCORE,
            RiskOrder::ByDate => sobriety_data::DATE,
        };
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT s.*, p.{name} AS name FROM {sobriety} s \
             INNER JOIN {personas} p ON s.{pid} = p.{id} \
             WHERE s.{risk} >= ? ORDER BY s.{order_column} DESC LIMIT ?",
            name = personas::NAME,
            sobriety = sobriety_data::TABLE,
            personas = personas::TABLE,
            pid = sobriety_data::PERSONA_ID,
            id = personas::ID,
            risk = sobriety_data::RELAPSE_RISK_SCORE,
        ))?;
        let rows = stmt.query_map(params![threshold, sql_limit(Some(limit))], Self::map_risk_event)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn relapse_events(&self, limit: Option<usize>) -> Result<Vec<RiskEvent>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT s.*, p.{name} AS name FROM {sobriety} s \
             INNER JOIN {personas} p ON s.{pid} = p.{id} \
             WHERE s.{relapse} = 1 ORDER BY s.{date} DESC LIMIT ?",
            name = personas::NAME,
            sobriety = sobriety_data::TABLE,
            personas = personas::TABLE,
            pid = sobriety_data::PERSONA_ID,
            id = personas::ID,
            relapse = sobriety_data::RELAPSE_OCCURRED,
            date = sobriety_data::DATE,
        ))?;
        let rows = stmt.query_map(params![sql_limit(limit)], Self::map_risk_event)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn recent_mood_points(&self, limit: usize) -> Result<Vec<MoodTrendPoint>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT m.*, p.{name} AS name FROM {moods} m \
             INNER JOIN {personas} p ON m.{pid} = p.{id} \
             ORDER BY m.{date} DESC LIMIT ?",
            name = personas::NAME,
            moods = mood_diary_entries::TABLE,
            personas = personas::TABLE,
            pid = mood_diary_entries::PERSONA_ID,
            id = personas::ID,
            date = mood_diary_entries::DATE,
        ))?;
        let rows = stmt.query_map(params![sql_limit(Some(limit))], Self::map_mood_point)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn risk_scores(&self) -> Result<Vec<f64>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {}",
            sobriety_data::RELAPSE_RISK_SCORE,
            sobriety_data::TABLE
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, f64>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn ping(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row(&format!("SELECT COUNT(*) FROM (SELECT 1 FROM {} LIMIT 1)", personas::TABLE), [], |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPersona;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn open() -> (TempDir, Database) {
        let dir = TempDir::new().expect("tempdir");
        let db = Database::new(dir.path().join("telemetry.db").to_str().expect("utf8 path")).expect("open");
        (dir, db)
    }

    fn sobriety(persona_id: i64, day: u32, risk: f64, relapse: bool) -> SobrietyRecord {
        SobrietyRecord {
            id: 0,
            persona_id,
            date: NaiveDate::from_ymd_opt(2024, 1, day).expect("date"),
            days_sober: i64::from(day),
            relapse_risk_score: risk,
            in_treatment: true,
            medication_adherence: 0.9,
            meeting_attendance: 3,
            relapse_occurred: relapse,
        }
    }

    #[test]
    fn test_latest_sobriety_orders_by_date_not_insertion() {
        let (_dir, db) = open();
        let persona = db
            .add_persona(&NewPersona {
                name: "Marcus".to_string(),
                persona_type: "moderate".to_string(),
            })
            .expect("persona");
        db.add_sobriety(&sobriety(persona.id, 5, 0.7, false)).expect("insert");
        db.add_sobriety(&sobriety(persona.id, 1, 0.5, false)).expect("insert");

        let latest = db.latest_sobriety(persona.id).expect("query").expect("record");
        assert!((latest.relapse_risk_score - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_risk_trend_is_oldest_first_and_bounded() {
        let (_dir, db) = open();
        let persona = db
            .add_persona(&NewPersona {
                name: "Jessica".to_string(),
                persona_type: "stable".to_string(),
            })
            .expect("persona");
        for day in 1..=5 {
            db.add_sobriety(&sobriety(persona.id, day, 0.1 * f64::from(day), false))
                .expect("insert");
        }

        let trend = db.risk_trend(persona.id, 3).expect("trend");
        let days: Vec<u32> = trend.iter().map(|p| chrono::Datelike::day(&p.date)).collect();
        assert_eq!(days, vec![3, 4, 5]);
    }

    #[test]
    fn test_relapse_events_unbounded_and_joined() {
        let (_dir, db) = open();
        let persona = db
            .add_persona(&NewPersona {
                name: "Robert".to_string(),
                persona_type: "high_risk".to_string(),
            })
            .expect("persona");
        for day in 1..=7 {
            db.add_sobriety(&sobriety(persona.id, day, 0.9, true)).expect("insert");
        }

        let all = db.relapse_events(None).expect("relapses");
        assert_eq!(all.len(), 7);
        assert_eq!(all[0].name, "Robert");
        assert_eq!(db.relapse_events(Some(5)).expect("relapses").len(), 5);
    }

    #[test]
    fn test_high_risk_threshold_is_inclusive() {
        let (_dir, db) = open();
        let persona = db
            .add_persona(&NewPersona {
                name: "Sarah".to_string(),
                persona_type: "high_risk".to_string(),
            })
            .expect("persona");
        db.add_sobriety(&sobriety(persona.id, 1, 0.6, false)).expect("insert");
        db.add_sobriety(&sobriety(persona.id, 2, 0.59, false)).expect("insert");

        let records = db.high_risk_records(0.6, RiskOrder::ByRisk, 10).expect("query");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_ping_on_empty_store() {
        let (_dir, db) = open();
        assert!(db.ping().is_ok());
    }
}
