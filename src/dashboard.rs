//! Clinician dashboard views folded from telemetry reads.
//!
//! Every view re-reads the store. A failed read never reaches the caller:
//! it is logged and the view comes back empty. The only error a view
//! returns is `Unauthorized`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument};

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{
    ChatStats, DashboardOverview, DatabaseHealth, OverviewSummary, PatientSummary, Persona, PersonaRiskTrend,
    Phq5Severity, RiskAnalysis, RiskLevel, RiskStats,
};
use crate::repository::{RiskOrder, TelemetryStore};
use crate::session::SessionContext;

/// Builds dashboard views over a telemetry store
pub struct DashboardAggregator<S: TelemetryStore> {
    store: S,
    config: DashboardConfig,
    metrics: Arc<MetricsCollector>,
}

impl<S: TelemetryStore> DashboardAggregator<S> {
    /// Build an aggregator over `store`
    pub fn new(store: S, config: DashboardConfig, metrics: Arc<MetricsCollector>) -> Self {
        Self { store, config, metrics }
    }

    /// Per-patient roster, highest current risk first
    #[instrument(skip_all, fields(user = %session.user_id))]
    pub fn patient_summaries(&self, session: &SessionContext) -> Result<Vec<PatientSummary>> {
        session.require_clinician()?;
        Ok(self.load_view("patients", || self.load_patient_summaries()))
    }

    /// Overview page
    #[instrument(skip_all, fields(user = %session.user_id))]
    pub fn overview(&self, session: &SessionContext) -> Result<DashboardOverview> {
        session.require_clinician()?;
        Ok(self.load_view("overview", || self.load_overview()))
    }

    /// Risk analysis page
    #[instrument(skip_all, fields(user = %session.user_id))]
    pub fn risk_analysis(&self, session: &SessionContext) -> Result<RiskAnalysis> {
        session.require_clinician()?;
        Ok(self.load_view("risk", || self.load_risk_analysis()))
    }

    /// Check that the store answers
    #[instrument(skip_all, fields(user = %session.user_id))]
    pub fn database_health(&self, session: &SessionContext) -> Result<DatabaseHealth> {
        session.require_clinician()?;
        let health = match self.store.ping() {
            Ok(()) => DatabaseHealth::connected(),
            Err(e) => {
                error!(error = %e, "Health check failed");
                self.metrics.record_error("database", "health_check");
                DatabaseHealth::disconnected(e)
            },
        };
        Ok(health)
    }

    /// Run a view loader, replacing any failure with the empty view
    fn load_view<T: Default>(&self, view: &'static str, load: impl FnOnce() -> Result<T>) -> T {
        let timer = OperationTimer::new(view);
        let started = Instant::now();
        let result = load();
        self.metrics.record_dashboard_load(view, started.elapsed(), result.is_ok());
        match result {
            Ok(data) => {
                timer.finish();
                data
            },
            Err(e) => {
                error!(view, error = %e, "Dashboard data loading error");
                T::default()
            },
        }
    }

    fn load_patient_summaries(&self) -> Result<Vec<PatientSummary>> {
        let personas = self.store.personas()?;
        let mut summaries = personas
            .into_iter()
            .map(|persona| self.summarize(persona))
            .collect::<Result<Vec<_>>>()?;
        sort_by_risk(&mut summaries);
        Ok(summaries)
    }

    fn summarize(&self, persona: Persona) -> Result<PatientSummary> {
        let sobriety = self.store.latest_sobriety(persona.id)?;
        let chats = self.store.chats(persona.id, Some(self.config.recent_chat_limit))?;
        let wearable = self.store.latest_wearable(persona.id)?;
        let mood = self.store.recent_moods(persona.id, 1)?.into_iter().next();
        let screening = self.store.latest_screening(persona.id)?;
        let risk_trend = self.store.risk_trend(persona.id, self.config.trend_points)?;

        let current_risk = sobriety.as_ref().map_or(0.0, |s| s.relapse_risk_score);
        let phq5_score = screening.as_ref().map(|p| p.total_score);

        Ok(PatientSummary {
            persona,
            current_risk,
            risk_level: RiskLevel::from_score(current_risk),
            days_sober: sobriety.as_ref().map_or(0, |s| s.days_sober),
            last_update: sobriety.as_ref().map(|s| s.date),
            in_treatment: sobriety.as_ref().is_some_and(|s| s.in_treatment),
            medication_adherence: sobriety.as_ref().map_or(0.0, |s| s.medication_adherence),
            meeting_attendance: sobriety.as_ref().map_or(0, |s| s.meeting_attendance),

            total_chats: chats.len(),
            avg_sentiment: mean(chats.iter().map(|c| c.sentiment_score)),
            crisis_indicators: chats.iter().filter(|c| c.crisis_indicators).count(),
            last_chat_date: chats.first().map(|c| c.date),

            current_stress: wearable.as_ref().map_or(0.0, |w| w.stress_score),
            resting_hr: wearable.as_ref().map_or(0.0, |w| w.heart_rate_resting),
            hrv: wearable.as_ref().map_or(0.0, |w| w.heart_rate_variability),
            sleep_hours: wearable.as_ref().map_or(0.0, |w| w.sleep_duration_hours),
            sleep_efficiency: wearable.as_ref().map_or(0.0, |w| w.sleep_efficiency),

            current_mood: mood.as_ref().map_or(0.0, |m| m.mood_rating),
            current_anxiety: mood.as_ref().map_or(0.0, |m| m.anxiety_level),
            current_cravings: mood.as_ref().map_or(0.0, |m| m.craving_intensity),
            last_mood_entry: mood.as_ref().map(|m| m.date),

            phq5_score,
            phq5_severity: phq5_score.map(Phq5Severity::from_score),
            phq5_date: screening.as_ref().map(|p| p.date),

            risk_trend,
        })
    }

    fn load_overview(&self) -> Result<DashboardOverview> {
        let patients = self.load_patient_summaries()?;

        let high_risk_patients = self.store.high_risk_records(
            self.config.high_risk_threshold,
            RiskOrder::ByRisk,
            self.config.overview_high_risk_limit,
        )?;
        let recent_relapses = self.store.relapse_events(Some(self.config.overview_relapse_limit))?;

        let chat_stats = patients
            .iter()
            .map(|patient| {
                let chats = self.store.chats(patient.persona.id, None)?;
                Ok(ChatStats {
                    name: patient.persona.name.clone(),
                    total_chats: chats.len(),
                    avg_sentiment: mean(chats.iter().map(|c| c.sentiment_score)),
                    crisis_indicators: chats.iter().filter(|c| c.crisis_indicators).count(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let recent_mood_data = self.store.recent_mood_points(self.config.recent_mood_limit)?;

        let summary = OverviewSummary {
            total_patients: patients.len(),
            // Strictly above the threshold here; the record listings include it
            high_risk_count: patients
                .iter()
                .filter(|p| p.current_risk > self.config.high_risk_threshold)
                .count(),
            avg_risk: round3(mean(patients.iter().map(|p| p.current_risk))),
            total_relapses: recent_relapses.len(),
        };
        info!(
            patients = summary.total_patients,
            high_risk = summary.high_risk_count,
            "Overview loaded"
        );

        Ok(DashboardOverview {
            summary,
            patients,
            high_risk_patients,
            recent_relapses,
            chat_stats,
            recent_mood_data,
        })
    }

    fn load_risk_analysis(&self) -> Result<RiskAnalysis> {
        let personas = self.store.personas()?;
        let total_patients = personas.len();

        let risk_trends = personas
            .into_iter()
            .map(|persona| {
                let risk_trend = self.store.risk_trend(persona.id, self.config.trend_points)?;
                Ok(PersonaRiskTrend { persona, risk_trend })
            })
            .collect::<Result<Vec<_>>>()?;

        let high_risk_patients = self.store.high_risk_records(
            self.config.high_risk_threshold,
            RiskOrder::ByDate,
            self.config.risk_high_risk_limit,
        )?;
        let relapse_events = self.store.relapse_events(None)?;

        let scores = self.store.risk_scores()?;
        let risk_stats = RiskStats {
            total_patients,
            avg_risk: round3(mean(scores.iter().copied())),
            high_risk_count: scores.iter().filter(|&&r| r >= self.config.high_risk_threshold).count(),
            critical_risk_count: scores
                .iter()
                .filter(|&&r| r >= self.config.critical_risk_threshold)
                .count(),
        };

        Ok(RiskAnalysis {
            risk_trends,
            high_risk_patients,
            relapse_events,
            risk_stats,
        })
    }
}

/// Highest risk first; ties keep store order
fn sort_by_risk(patients: &mut [PatientSummary]) {
    patients.sort_by(|a, b| b.current_risk.total_cmp(&a.current_risk));
}

/// Arithmetic mean, 0 for an empty series
#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::RecoveryError;
    use crate::models::{ChatInteraction, RiskEvent, SobrietyRecord};
    use crate::repository::MockTelemetryStore;
    use chrono::NaiveDate;

    fn aggregator(store: MockTelemetryStore) -> DashboardAggregator<MockTelemetryStore> {
        DashboardAggregator::new(store, AppConfig::default().dashboard, Arc::new(MetricsCollector::default()))
    }

    fn persona(id: i64, name: &str) -> Persona {
        Persona {
            id,
            name: name.to_string(),
            persona_type: "test".to_string(),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).expect("date")
    }

    fn chat(persona_id: i64, day: u32, sentiment: f64, crisis: bool) -> ChatInteraction {
        ChatInteraction {
            id: 0,
            persona_id,
            date: date(day),
            time: "09:00".to_string(),
            message_count: 4,
            avg_response_time_hours: 0.5,
            sentiment_score: sentiment,
            topics: vec![],
            crisis_indicators: crisis,
            engagement_level: 0.7,
        }
    }

    /// A store with personas and no other records except the given chats
    fn sparse_store(personas: Vec<Persona>, chats: Vec<ChatInteraction>) -> MockTelemetryStore {
        let mut store = MockTelemetryStore::new();
        store.expect_personas().returning(move || Ok(personas.clone()));
        store.expect_latest_sobriety().returning(|_| Ok(None));
        store.expect_latest_wearable().returning(|_| Ok(None));
        store.expect_latest_screening().returning(|_| Ok(None));
        store.expect_recent_moods().returning(|_, _| Ok(vec![]));
        store
            .expect_chats()
            .withf(|_, limit| *limit == Some(10))
            .returning(move |_, _| Ok(chats.clone()));
        store.expect_risk_trend().returning(|_, _| Ok(vec![]));
        store
    }

    #[test]
    fn test_patient_session_rejected_before_reads() {
        let store = MockTelemetryStore::new();
        let dashboard = aggregator(store);
        let session = SessionContext::patient("p-1", "p@example.org", "Pat");
        assert!(matches!(dashboard.overview(&session), Err(RecoveryError::Unauthorized(_))));
        assert!(matches!(dashboard.patient_summaries(&session), Err(RecoveryError::Unauthorized(_))));
        assert!(matches!(dashboard.risk_analysis(&session), Err(RecoveryError::Unauthorized(_))));
        assert!(matches!(dashboard.database_health(&session), Err(RecoveryError::Unauthorized(_))));
    }

    #[test]
    fn test_missing_series_default_to_zero_and_none() {
        let dashboard = aggregator(sparse_store(vec![persona(1, "Sarah")], vec![]));
        let summaries = dashboard
            .patient_summaries(&SessionContext::local_operator())
            .expect("authorized");

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert!(summary.current_risk.abs() < f64::EPSILON);
        assert_eq!(summary.days_sober, 0);
        assert!(summary.last_update.is_none());
        assert!(summary.phq5_score.is_none());
        assert!(summary.phq5_severity.is_none());
        assert!(summary.avg_sentiment.abs() < f64::EPSILON);
    }

    #[test]
    fn test_chat_metrics_over_recent_chats() {
        let store = sparse_store(
            vec![persona(1, "Sarah")],
            vec![chat(1, 9, 0.8, false), chat(1, 8, 0.4, true)],
        );

        let dashboard = aggregator(store);
        let summaries = dashboard
            .patient_summaries(&SessionContext::local_operator())
            .expect("authorized");
        let summary = &summaries[0];
        assert_eq!(summary.total_chats, 2);
        assert!((summary.avg_sentiment - 0.6).abs() < 1e-9);
        assert_eq!(summary.crisis_indicators, 1);
        assert_eq!(summary.last_chat_date, Some(date(9)));
    }

    #[test]
    fn test_summaries_sorted_by_risk() {
        let mut store = MockTelemetryStore::new();
        store
            .expect_personas()
            .returning(|| Ok(vec![persona(1, "Low"), persona(2, "High")]));
        store.expect_latest_sobriety().returning(|pid| {
            Ok(Some(SobrietyRecord {
                id: pid,
                persona_id: pid,
                date: date(1),
                days_sober: 10,
                relapse_risk_score: if pid == 2 { 0.9 } else { 0.2 },
                in_treatment: true,
                medication_adherence: 0.8,
                meeting_attendance: 2,
                relapse_occurred: false,
            }))
        });
        store.expect_latest_wearable().returning(|_| Ok(None));
        store.expect_latest_screening().returning(|_| Ok(None));
        store.expect_recent_moods().returning(|_, _| Ok(vec![]));
        store.expect_chats().returning(|_, _| Ok(vec![]));
        store.expect_risk_trend().returning(|_, _| Ok(vec![]));

        let dashboard = aggregator(store);
        let names: Vec<String> = dashboard
            .patient_summaries(&SessionContext::local_operator())
            .expect("authorized")
            .into_iter()
            .map(|p| p.persona.name)
            .collect();
        assert_eq!(names, vec!["High", "Low"]);
    }

    #[test]
    fn test_store_failure_yields_empty_overview() {
        let mut store = MockTelemetryStore::new();
        store
            .expect_personas()
            .returning(|| Err(RecoveryError::Other("connection refused".to_string())));

        let metrics = Arc::new(MetricsCollector::default());
        let dashboard = DashboardAggregator::new(store, AppConfig::default().dashboard, Arc::clone(&metrics));
        let overview = dashboard.overview(&SessionContext::local_operator()).expect("authorized");

        assert_eq!(overview, DashboardOverview::default());
        assert_eq!(metrics.errors(), 1);
    }

    #[test]
    fn test_empty_cohort_risk_stats_are_zero() {
        let mut store = MockTelemetryStore::new();
        store.expect_personas().returning(|| Ok(vec![]));
        store.expect_high_risk_records().returning(|_, _, _| Ok(vec![]));
        store.expect_relapse_events().returning(|_| Ok(vec![]));
        store.expect_risk_scores().returning(|| Ok(vec![]));

        let dashboard = aggregator(store);
        let risk = dashboard.risk_analysis(&SessionContext::local_operator()).expect("authorized");
        assert_eq!(risk.risk_stats, RiskStats::default());
    }

    #[test]
    fn test_risk_stats_thresholds_inclusive() {
        let mut store = MockTelemetryStore::new();
        store.expect_personas().returning(|| Ok(vec![persona(1, "Sarah")]));
        store.expect_risk_trend().returning(|_, _| Ok(vec![]));
        store
            .expect_high_risk_records()
            .withf(|threshold, order, limit| {
                (*threshold - 0.6).abs() < f64::EPSILON && *order == RiskOrder::ByDate && *limit == 50
            })
            .returning(|_, _, _| {
                Ok(vec![RiskEvent {
                    persona_id: 1,
                    name: "Sarah".to_string(),
                    date: date(3),
                    risk_score: 0.8,
                    days_sober: 3,
                }])
            });
        store.expect_relapse_events().withf(|limit| limit.is_none()).returning(|_| Ok(vec![]));
        store.expect_risk_scores().returning(|| Ok(vec![0.2, 0.6, 0.8, 0.7]));

        let dashboard = aggregator(store);
        let risk = dashboard.risk_analysis(&SessionContext::local_operator()).expect("authorized");
        assert_eq!(risk.risk_stats.total_patients, 1);
        assert_eq!(risk.risk_stats.high_risk_count, 3);
        assert_eq!(risk.risk_stats.critical_risk_count, 1);
        assert!((risk.risk_stats.avg_risk - 0.575).abs() < 1e-9);
        assert_eq!(risk.high_risk_patients.len(), 1);
    }

    #[test]
    fn test_health_reports_disconnected() {
        let mut store = MockTelemetryStore::new();
        store
            .expect_ping()
            .returning(|| Err(RecoveryError::Other("database is locked".to_string())));

        let dashboard = aggregator(store);
        let health = dashboard.database_health(&SessionContext::local_operator()).expect("authorized");
        assert_eq!(health.status, "error");
        assert_eq!(health.database, "disconnected");
        assert_eq!(health.error.as_deref(), Some("database is locked"));
    }

    #[test]
    fn test_mean_and_rounding() {
        assert!(mean(std::iter::empty()).abs() < f64::EPSILON);
        assert!((round3(0.123_456) - 0.123).abs() < f64::EPSILON);
    }
}
