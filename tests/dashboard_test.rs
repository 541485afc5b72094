//! Dashboard views over a real SQLite telemetry store

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use recovery_companion::config::AppConfig;
use recovery_companion::dashboard::DashboardAggregator;
use recovery_companion::db::Database;
use recovery_companion::error::RecoveryError;
use recovery_companion::metrics::MetricsCollector;
use recovery_companion::models::{
    ChatInteraction, MoodDiaryEntry, NewPersona, Phq5Response, Phq5Severity, RiskLevel, SobrietyRecord, WearableRecord,
};
use recovery_companion::session::SessionContext;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).expect("date")
}

fn sobriety(persona_id: i64, day: u32, risk: f64, relapse: bool) -> SobrietyRecord {
    SobrietyRecord {
        id: 0,
        persona_id,
        date: date(day),
        days_sober: i64::from(day),
        relapse_risk_score: risk,
        in_treatment: true,
        medication_adherence: 0.85,
        meeting_attendance: 2,
        relapse_occurred: relapse,
    }
}

fn setup() -> (TempDir, DashboardAggregator<Database>, Arc<MetricsCollector>) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("telemetry.db");
    let db = Database::new(path.to_str().expect("utf8 path")).expect("open");

    let sarah = db
        .add_persona(&NewPersona {
            name: "Sarah".to_string(),
            persona_type: "high_risk".to_string(),
        })
        .expect("persona");
    let jessica = db
        .add_persona(&NewPersona {
            name: "Jessica".to_string(),
            persona_type: "stable".to_string(),
        })
        .expect("persona");

    db.add_sobriety(&sobriety(sarah.id, 1, 0.5, false)).expect("insert");
    db.add_sobriety(&sobriety(sarah.id, 5, 0.7, false)).expect("insert");
    db.add_sobriety(&sobriety(sarah.id, 6, 0.85, true)).expect("insert");
    db.add_sobriety(&sobriety(jessica.id, 5, 0.2, false)).expect("insert");

    db.add_wearable(&WearableRecord {
        id: 0,
        persona_id: sarah.id,
        date: date(6),
        heart_rate_avg: 80.0,
        heart_rate_resting: 66.0,
        heart_rate_variability: 38.0,
        sleep_duration_hours: 5.5,
        sleep_efficiency: 78.0,
        deep_sleep_hours: 1.0,
        rem_sleep_hours: 0.8,
        steps: 4000,
        active_calories: 250,
        exercise_minutes: 10,
        stand_hours: 6,
        stress_score: 4.2,
    })
    .expect("insert");

    db.add_screening(&Phq5Response {
        id: 0,
        persona_id: jessica.id,
        date: date(4),
        little_interest: 0,
        feeling_down: 0,
        sleep_trouble: 0,
        tired_energy: 0,
        appetite: 0,
        total_score: 0,
    })
    .expect("insert");

    db.add_mood_entry(&MoodDiaryEntry {
        id: 0,
        persona_id: sarah.id,
        date: date(6),
        mood_rating: 3.0,
        anxiety_level: 7.0,
        craving_intensity: 8.0,
        energy_level: 3.0,
        sleep_quality: 4.0,
        pain_level: 2.0,
        triggers: vec!["conflict".to_string()],
        coping_strategies: vec![],
        notes: "hard day".to_string(),
        word_count: 2,
    })
    .expect("insert");

    for (day, sentiment, crisis) in [(4, 0.4, false), (6, 0.2, true)] {
        db.add_chat(&ChatInteraction {
            id: 0,
            persona_id: sarah.id,
            date: date(day),
            time: "21:30".to_string(),
            message_count: 6,
            avg_response_time_hours: 0.3,
            sentiment_score: sentiment,
            topics: vec!["cravings".to_string()],
            crisis_indicators: crisis,
            engagement_level: 0.6,
        })
        .expect("insert");
    }

    let metrics = Arc::new(MetricsCollector::default());
    let dashboard = DashboardAggregator::new(db, AppConfig::default().dashboard, Arc::clone(&metrics));
    (dir, dashboard, metrics)
}

#[test]
fn test_current_risk_comes_from_latest_date() {
    let (_dir, dashboard, _) = setup();
    let patients = dashboard
        .patient_summaries(&SessionContext::local_operator())
        .expect("authorized");

    assert_eq!(patients[0].persona.name, "Sarah");
    assert!((patients[0].current_risk - 0.85).abs() < 1e-9);
    assert_eq!(patients[0].risk_level, RiskLevel::Critical);
    assert_eq!(patients[0].last_update, Some(date(6)));

    let risks: Vec<f64> = patients[0].risk_trend.iter().map(|p| p.risk_score).collect();
    assert_eq!(risks, vec![0.5, 0.7, 0.85]);
}

#[test]
fn test_patient_series_fields() {
    let (_dir, dashboard, _) = setup();
    let patients = dashboard
        .patient_summaries(&SessionContext::local_operator())
        .expect("authorized");

    let sarah = &patients[0];
    assert_eq!(sarah.total_chats, 2);
    assert_eq!(sarah.crisis_indicators, 1);
    assert_eq!(sarah.last_chat_date, Some(date(6)));
    assert!((sarah.current_stress - 4.2).abs() < 1e-9);
    assert!((sarah.current_cravings - 8.0).abs() < 1e-9);
    assert!(sarah.phq5_score.is_none());

    // A PHQ-5 total of zero is a real score, not a missing one
    let jessica = &patients[1];
    assert_eq!(jessica.phq5_score, Some(0));
    assert_eq!(jessica.phq5_severity, Some(Phq5Severity::Minimal));
    assert!(jessica.resting_hr.abs() < f64::EPSILON);
}

#[test]
fn test_overview_summary() {
    let (_dir, dashboard, _) = setup();
    let overview = dashboard.overview(&SessionContext::local_operator()).expect("authorized");

    assert_eq!(overview.summary.total_patients, 2);
    assert_eq!(overview.summary.high_risk_count, 1);
    assert!((overview.summary.avg_risk - 0.525).abs() < 1e-9);
    assert_eq!(overview.summary.total_relapses, 1);

    let top: Vec<f64> = overview.high_risk_patients.iter().map(|r| r.risk_score).collect();
    assert_eq!(top, vec![0.85, 0.7]);
    assert_eq!(overview.recent_relapses[0].name, "Sarah");
    assert_eq!(overview.chat_stats.len(), 2);
    assert_eq!(overview.recent_mood_data.len(), 1);
}

#[test]
fn test_risk_analysis() {
    let (_dir, dashboard, _) = setup();
    let risk = dashboard.risk_analysis(&SessionContext::local_operator()).expect("authorized");

    assert_eq!(risk.risk_trends.len(), 2);
    let dates: Vec<NaiveDate> = risk.high_risk_patients.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date(6), date(5)]);
    assert_eq!(risk.relapse_events.len(), 1);
    assert_eq!(risk.risk_stats.high_risk_count, 2);
    assert_eq!(risk.risk_stats.critical_risk_count, 1);
    assert!((risk.risk_stats.avg_risk - 0.563).abs() < 1e-9);
}

#[test]
fn test_database_health_connected() {
    let (_dir, dashboard, metrics) = setup();
    let health = dashboard
        .database_health(&SessionContext::local_operator())
        .expect("authorized");
    assert_eq!(health.status, "healthy");
    assert_eq!(health.database, "connected");
    assert!(health.error.is_none());
    assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
    assert_eq!(metrics.errors(), 0);
}

#[test]
fn test_patient_session_is_rejected() {
    let (_dir, dashboard, metrics) = setup();
    let session = SessionContext::patient("p-7", "p7@example.org", "Robert");
    assert!(matches!(dashboard.overview(&session), Err(RecoveryError::Unauthorized(_))));
    assert_eq!(metrics.dashboard_loads(), 0);
}

#[test]
fn test_empty_store_gives_empty_views() {
    let dir = TempDir::new().expect("tempdir");
    let db = Database::new(dir.path().join("empty.db").to_str().expect("utf8 path")).expect("open");
    let dashboard = DashboardAggregator::new(db, AppConfig::default().dashboard, Arc::new(MetricsCollector::default()));

    let overview = dashboard.overview(&SessionContext::local_operator()).expect("authorized");
    assert_eq!(overview.summary.total_patients, 0);
    assert!(overview.summary.avg_risk.abs() < f64::EPSILON);

    let risk = dashboard.risk_analysis(&SessionContext::local_operator()).expect("authorized");
    assert!(risk.risk_stats.avg_risk.abs() < f64::EPSILON);
}
