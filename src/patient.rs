//! The patient's own records: the home-screen summary, the health
//! dashboard record with its mood diary, and the once-a-day quick mood log.
//!
//! Each record lives under a fixed key in an embedded sled store and is
//! read and written wholesale, like the conversation log. Writes that fail
//! are logged and reported as unconfirmed; the in-memory copy still changes.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{RecoveryError, Result};
use crate::health::{HealthProvider, HealthSnapshot};
use crate::metrics::MetricsCollector;
use crate::models::{Phq5Severity, RiskLevel};
use crate::validation::InputValidator;

/// Key of the home-screen summary
pub const PATIENT_KEY: &str = "patientData";
/// Key of the health dashboard record
pub const HEALTH_KEY: &str = "healthData";
/// Key of the date the quick mood was last logged
pub const MOOD_LOG_KEY: &str = "lastMoodLog";

/// Home-screen summary of the patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Full name
    pub name: String,
    /// Consecutive days sober
    pub days_sober: i64,
    /// Relapse risk in [0,1]
    pub current_risk: f64,
    /// Latest mood, 1-10
    pub current_mood: f64,
    /// Latest anxiety, 1-10
    pub current_anxiety: f64,
    /// Latest craving intensity, 1-10
    pub current_cravings: f64,
    /// Last night's sleep
    pub sleep_hours: f64,
    /// Latest stress score
    pub stress_level: f64,
    /// Resting heart rate
    pub heart_rate: f64,
    /// Day of the last change
    pub last_update: NaiveDate,
}

impl PatientRecord {
    /// Record shown before anything has been stored
    #[must_use]
    pub fn sample(today: NaiveDate) -> Self {
        Self {
            name: "Sarah Chen".to_string(),
            days_sober: 127,
            current_risk: 0.35,
            current_mood: 7.2,
            current_anxiety: 4.1,
            current_cravings: 2.8,
            sleep_hours: 7.5,
            stress_level: 3.2,
            heart_rate: 68.0,
            last_update: today,
        }
    }

    /// First word of the name, for greetings
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or_default()
    }

    /// Risk band of `current_risk`
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.current_risk)
    }
}

/// Latest PHQ-5 answers, each 0-4
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phq5Answers {
    /// Little interest or pleasure
    pub little_interest: u8,
    /// Feeling down or hopeless
    pub feeling_down: u8,
    /// Trouble sleeping
    pub sleep_trouble: u8,
    /// Tired or low energy
    pub tired_energy: u8,
    /// Poor appetite or overeating
    pub appetite: u8,
    /// Sum of the answers
    pub total_score: u8,
}

impl Phq5Answers {
    /// Severity band of the total
    #[must_use]
    pub fn severity(&self) -> Phq5Severity {
        Phq5Severity::from_score(i64::from(self.total_score))
    }
}

/// Everything the patient's health dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Mean heart rate
    pub heart_rate_avg: f64,
    /// Resting heart rate
    pub heart_rate_resting: f64,
    /// Heart rate variability, ms
    pub heart_rate_variability: f64,
    /// Time asleep
    pub sleep_duration_hours: f64,
    /// Percent of time in bed spent asleep
    pub sleep_efficiency: f64,
    /// Deep sleep
    pub deep_sleep_hours: f64,
    /// REM sleep
    pub rem_sleep_hours: f64,
    /// Step count
    pub steps: i64,
    /// Active energy, kcal
    pub active_calories: i64,
    /// Exercise time
    pub exercise_minutes: i64,
    /// Hours with standing activity
    pub stand_hours: i64,
    /// Stress score, 0-10
    pub stress_score: f64,

    /// Mood, 1-10
    pub mood_rating: f64,
    /// Anxiety, 1-10
    pub anxiety_level: f64,
    /// Craving intensity, 1-10
    pub craving_intensity: f64,
    /// Energy, 1-10
    pub energy_level: f64,
    /// Sleep quality, 1-10
    pub sleep_quality: f64,
    /// Pain, 1-10
    pub pain_level: f64,
    /// Known triggers
    pub triggers: Vec<String>,
    /// Coping strategies in use
    pub coping_strategies: Vec<String>,
    /// Free-text diary notes
    pub notes: String,

    /// Latest PHQ-5 screening
    pub phq5: Phq5Answers,

    /// Day of the last change
    pub last_update: NaiveDate,
}

impl HealthRecord {
    /// Record shown before anything has been stored
    #[must_use]
    pub fn sample(today: NaiveDate) -> Self {
        Self {
            heart_rate_avg: 75.0,
            heart_rate_resting: 68.0,
            heart_rate_variability: 42.0,
            sleep_duration_hours: 7.5,
            sleep_efficiency: 85.0,
            deep_sleep_hours: 1.8,
            rem_sleep_hours: 1.2,
            steps: 8500,
            active_calories: 420,
            exercise_minutes: 35,
            stand_hours: 10,
            stress_score: 3.2,

            mood_rating: 7.2,
            anxiety_level: 4.1,
            craving_intensity: 2.8,
            energy_level: 6.5,
            sleep_quality: 7.8,
            pain_level: 1.5,
            triggers: vec!["work stress".to_string(), "social situations".to_string()],
            coping_strategies: vec![
                "deep breathing".to_string(),
                "meditation".to_string(),
                "exercise".to_string(),
            ],
            notes: "Feeling good today, managed stress well with breathing exercises.".to_string(),

            phq5: Phq5Answers {
                little_interest: 1,
                feeling_down: 2,
                sleep_trouble: 1,
                tired_energy: 2,
                appetite: 1,
                total_score: 7,
            },

            last_update: today,
        }
    }

    /// Overall wellbeing score out of 100
    ///
    /// Mean of six 0-1 terms: mood, inverted anxiety, inverted cravings,
    /// energy, sleep quality and inverted stress, each on a 10-point scale.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn health_score(&self) -> i64 {
        let terms = [
            self.mood_rating / 10.0,
            (10.0 - self.anxiety_level) / 10.0,
            (10.0 - self.craving_intensity) / 10.0,
            self.energy_level / 10.0,
            self.sleep_quality / 10.0,
            (10.0 - self.stress_score) / 10.0,
        ];
        let mean = terms.iter().sum::<f64>() / 6.0;
        (mean * 100.0).round() as i64
    }

    fn apply_diary(&mut self, entry: &MoodDiarySubmission, notes: String, today: NaiveDate) {
        self.mood_rating = f64::from(entry.mood);
        self.anxiety_level = f64::from(entry.anxiety);
        self.craving_intensity = f64::from(entry.cravings);
        self.energy_level = f64::from(entry.energy);
        self.sleep_quality = f64::from(entry.sleep_quality);
        self.pain_level = f64::from(entry.pain);
        self.notes = notes;
        self.last_update = today;
    }

    fn apply_snapshot(&mut self, snapshot: &HealthSnapshot, today: NaiveDate) {
        if let Some(avg) = snapshot.heart_rate_avg {
            self.heart_rate_avg = avg;
        }
        if let Some(resting) = snapshot.heart_rate_resting {
            self.heart_rate_resting = resting;
        }
        if let Some(hrv) = snapshot.heart_rate_variability {
            self.heart_rate_variability = hrv;
        }
        if let Some(sleep) = &snapshot.sleep {
            self.sleep_duration_hours = sleep.sleep_duration_hours;
            self.sleep_efficiency = sleep.sleep_efficiency;
            self.deep_sleep_hours = sleep.deep_sleep_hours;
            self.rem_sleep_hours = sleep.rem_sleep_hours;
        }
        self.steps = snapshot.activity.steps;
        self.active_calories = snapshot.activity.active_calories;
        self.exercise_minutes = snapshot.activity.exercise_minutes;
        self.stand_hours = snapshot.activity.stand_hours;
        self.stress_score = snapshot.stress_score;
        self.last_update = today;
    }
}

/// One mood diary form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodDiarySubmission {
    /// Mood, 1-10
    pub mood: u8,
    /// Anxiety, 1-10
    pub anxiety: u8,
    /// Craving intensity, 1-10
    pub cravings: u8,
    /// Energy, 1-10
    pub energy: u8,
    /// Sleep quality, 1-10
    pub sleep_quality: u8,
    /// Pain, 1-10
    pub pain: u8,
    /// Free-text notes
    pub notes: String,
}

impl Default for MoodDiarySubmission {
    fn default() -> Self {
        Self {
            mood: 5,
            anxiety: 5,
            cravings: 5,
            energy: 5,
            sleep_quality: 5,
            pain: 1,
            notes: String::new(),
        }
    }
}

impl MoodDiarySubmission {
    /// Check every rating and return the sanitized notes
    pub fn validate(&self) -> Result<String> {
        let ratings = [
            ("Mood", self.mood),
            ("Anxiety", self.anxiety),
            ("Cravings", self.cravings),
            ("Energy", self.energy),
            ("Sleep quality", self.sleep_quality),
            ("Pain", self.pain),
        ];
        for (label, value) in ratings {
            InputValidator::validate_rating(label, value).map_err(|e| RecoveryError::InvalidInput(e.to_string()))?;
        }
        InputValidator::validate_notes(&self.notes).map_err(|e| RecoveryError::InvalidInput(e.to_string()))
    }
}

/// One-tap answers to "How are you feeling right now?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickMood {
    /// Logged as 8
    Great,
    /// Logged as 7
    Good,
    /// Logged as 5
    Okay,
    /// Logged as 3
    NotGreat,
}

impl QuickMood {
    /// Mood rating stored for this answer
    #[must_use]
    pub const fn rating(self) -> u8 {
        match self {
            Self::Great => 8,
            Self::Good => 7,
            Self::Okay => 5,
            Self::NotGreat => 3,
        }
    }
}

/// Result of a quick mood log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodLogOutcome {
    /// Mood recorded; `persisted` is false if a write was not confirmed
    Logged {
        /// Both writes were confirmed
        persisted: bool,
    },
    /// A mood was already logged today; nothing changed
    AlreadyLogged,
}

/// Result of merging wearable data into the patient's records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Provider disconnected or had no data; nothing changed
    Unavailable,
    /// Records updated; `persisted` is false if a write was not confirmed
    Synced {
        /// Both writes were confirmed
        persisted: bool,
    },
}

/// The health dashboard as shown to the patient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthDashboard {
    /// Stored health record
    pub record: HealthRecord,
    /// Overall wellbeing score out of 100
    pub health_score: i64,
    /// Band of the latest PHQ-5 total
    pub phq5_severity: Phq5Severity,
}

/// Wholesale storage for the patient's records
#[cfg_attr(test, mockall::automock)]
pub trait PatientStore {
    /// Stored home-screen summary, if any
    fn load_patient(&self) -> Result<Option<PatientRecord>>;

    /// Replace the home-screen summary
    fn save_patient(&self, record: &PatientRecord) -> Result<()>;

    /// Stored health record, if any
    fn load_health(&self) -> Result<Option<HealthRecord>>;

    /// Replace the health record
    fn save_health(&self, record: &HealthRecord) -> Result<()>;

    /// Day the quick mood was last logged
    fn last_mood_log(&self) -> Result<Option<NaiveDate>>;

    /// Remember the day the quick mood was logged
    fn set_last_mood_log(&self, day: NaiveDate) -> Result<()>;
}

/// Patient records in an embedded sled database
pub struct SledPatientStore {
    db: sled::Db,
}

impl SledPatientStore {
    /// Open (or create) the store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        Ok(Self { db: sled::open(path)? })
    }

    /// Open a throwaway store that lives only as long as this value
    pub fn temporary() -> Result<Self> {
        Ok(Self {
            db: sled::Config::new().temporary(true).open()?,
        })
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let data = bincode::serialize(value)?;
        self.db.insert(key.as_bytes(), data)?;
        self.db.flush()?;
        Ok(())
    }
}

impl PatientStore for SledPatientStore {
    fn load_patient(&self) -> Result<Option<PatientRecord>> {
        self.get(PATIENT_KEY)
    }

    fn save_patient(&self, record: &PatientRecord) -> Result<()> {
        self.put(PATIENT_KEY, record)
    }

    fn load_health(&self) -> Result<Option<HealthRecord>> {
        self.get(HEALTH_KEY)
    }

    fn save_health(&self, record: &HealthRecord) -> Result<()> {
        self.put(HEALTH_KEY, record)
    }

    fn last_mood_log(&self) -> Result<Option<NaiveDate>> {
        self.get(MOOD_LOG_KEY)
    }

    fn set_last_mood_log(&self, day: NaiveDate) -> Result<()> {
        self.put(MOOD_LOG_KEY, &day)
    }
}

/// Loads, updates and stores the patient's records
pub struct PatientTracker<S: PatientStore> {
    store: S,
    patient: PatientRecord,
    health: HealthRecord,
    last_mood_log: Option<NaiveDate>,
    metrics: Arc<MetricsCollector>,
}

impl<S: PatientStore> PatientTracker<S> {
    /// Load every record; missing or unreadable ones start from the sample
    pub fn open(store: S, today: NaiveDate, metrics: Arc<MetricsCollector>) -> Self {
        let patient = load_or(store.load_patient(), "patient data", || PatientRecord::sample(today));
        let health = load_or(store.load_health(), "health data", || HealthRecord::sample(today));
        let last_mood_log = load_or(store.last_mood_log().map(Some), "mood log", || None);
        debug!(?last_mood_log, "Loaded patient records");
        Self {
            store,
            patient,
            health,
            last_mood_log,
            metrics,
        }
    }

    /// Home-screen summary
    #[must_use]
    pub const fn patient(&self) -> &PatientRecord {
        &self.patient
    }

    /// Health dashboard record
    #[must_use]
    pub const fn health(&self) -> &HealthRecord {
        &self.health
    }

    /// Health record with its score and PHQ-5 band
    #[must_use]
    pub fn health_dashboard(&self) -> HealthDashboard {
        HealthDashboard {
            record: self.health.clone(),
            health_score: self.health.health_score(),
            phq5_severity: self.health.phq5.severity(),
        }
    }

    /// Whether the quick mood was already logged on `today`
    #[must_use]
    pub fn logged_on(&self, today: NaiveDate) -> bool {
        self.last_mood_log == Some(today)
    }

    /// Record a quick mood, at most once per day
    #[instrument(skip(self))]
    pub fn log_mood(&mut self, mood: QuickMood, today: NaiveDate) -> MoodLogOutcome {
        if self.logged_on(today) {
            debug!("Mood already logged today");
            return MoodLogOutcome::AlreadyLogged;
        }

        self.last_mood_log = Some(today);
        let mut persisted = self.confirm(self.store.set_last_mood_log(today), "mood log");

        self.patient.current_mood = f64::from(mood.rating());
        self.patient.last_update = today;
        persisted &= self.confirm(self.store.save_patient(&self.patient), "patient data");

        self.metrics.record_patient_update("quick_mood");
        info!(rating = mood.rating(), persisted, "Mood logged");
        MoodLogOutcome::Logged { persisted }
    }

    /// Replace the diary fields of the health record
    ///
    /// Out-of-range ratings are rejected before anything changes. Returns
    /// whether the write was confirmed.
    #[instrument(skip_all)]
    pub fn submit_mood_diary(&mut self, entry: &MoodDiarySubmission, today: NaiveDate) -> Result<bool> {
        let notes = entry.validate()?;
        self.health.apply_diary(entry, notes, today);
        let persisted = self.confirm(self.store.save_health(&self.health), "health data");

        self.metrics.record_patient_update("mood_diary");
        info!(score = self.health.health_score(), persisted, "Mood diary updated");
        Ok(persisted)
    }

    /// Merge the provider's latest snapshot into both records
    ///
    /// On the summary, a missing or zero resting heart rate, sleep duration
    /// or stress score keeps the previous value.
    #[instrument(skip_all, fields(provider = provider.name()))]
    pub async fn sync_health(&mut self, provider: &dyn HealthProvider, today: NaiveDate) -> SyncOutcome {
        if !provider.is_connected() {
            return SyncOutcome::Unavailable;
        }
        let Some(snapshot) = provider.comprehensive_snapshot().await else {
            return SyncOutcome::Unavailable;
        };

        let nonzero = |value: Option<f64>| value.filter(|v| *v != 0.0);
        if let Some(resting) = nonzero(snapshot.heart_rate_resting) {
            self.patient.heart_rate = resting;
        }
        if let Some(hours) = nonzero(snapshot.sleep.as_ref().map(|s| s.sleep_duration_hours)) {
            self.patient.sleep_hours = hours;
        }
        if let Some(stress) = nonzero(Some(snapshot.stress_score)) {
            self.patient.stress_level = stress;
        }
        self.patient.last_update = today;
        self.health.apply_snapshot(&snapshot, today);

        let mut persisted = self.confirm(self.store.save_patient(&self.patient), "patient data");
        persisted &= self.confirm(self.store.save_health(&self.health), "health data");

        self.metrics.record_patient_update("health_sync");
        info!(persisted, "Health data synced");
        SyncOutcome::Synced { persisted }
    }

    fn confirm(&self, result: Result<()>, what: &'static str) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Error saving {what}");
                self.metrics.record_persist_failure("patient");
                false
            },
        }
    }
}

fn load_or<T>(result: Result<Option<T>>, what: &str, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(Some(value)) => value,
        Ok(None) => fallback(),
        Err(e) => {
            warn!(error = %e, "Error loading {what}, using defaults");
            fallback()
        },
    }
}
