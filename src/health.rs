//! Wearable health-data boundary.
//!
//! Providers never fail past this module: reads come back as `None` and
//! writes as `false`, with the cause logged.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::HealthConfig;
use crate::error::{RecoveryError, Result};

/// Sleep efficiency used when the source does not report one
pub const DEFAULT_SLEEP_EFFICIENCY: f64 = 90.0;
/// Stress score used when the source does not report one
pub const DEFAULT_STRESS_SCORE: f64 = 3.0;

/// Shown to the user after `disconnect`
pub const DISCONNECT_NOTICE: &str =
    "Your app is no longer syncing health data. You can reconnect anytime in Settings.";

/// Sleep-stage label of a sleep sample counted as sleep
const ASLEEP: &str = "ASLEEP";

/// One timestamped numeric sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Measured value
    pub value: f64,
    /// When the sample was taken
    pub start_date: DateTime<Utc>,
}

/// One sleep-analysis interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSample {
    /// Stage label, e.g. `ASLEEP` or `INBED`
    pub value: String,
    /// Interval start
    pub start_date: DateTime<Utc>,
    /// Interval end
    pub end_date: DateTime<Utc>,
}

/// Raw health data as exported from the wearable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthExport {
    /// Heart rate samples, bpm
    pub heart_rate: Vec<Sample>,
    /// Resting heart rate samples, oldest first
    pub resting_heart_rate: Vec<Sample>,
    /// HRV samples in ms, oldest first
    pub heart_rate_variability: Vec<Sample>,
    /// Sleep-analysis intervals
    pub sleep: Vec<SleepSample>,
    /// Step count for the day
    pub steps: f64,
    /// Active energy, kcal
    pub active_calories: f64,
    /// Exercise time
    pub exercise_minutes: f64,
    /// Stand time
    pub stand_minutes: f64,
    /// Sleep efficiency percent, when the device reports it
    pub sleep_efficiency: Option<f64>,
    /// Stress score, when the device reports it
    pub stress_score: Option<f64>,
}

/// Last night's sleep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    /// Time asleep
    pub sleep_duration_hours: f64,
    /// Percent of time in bed spent asleep
    pub sleep_efficiency: f64,
    /// Estimated deep sleep
    pub deep_sleep_hours: f64,
    /// Estimated REM sleep
    pub rem_sleep_hours: f64,
}

/// Daily activity totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Step count
    pub steps: i64,
    /// Active energy, kcal
    pub active_calories: i64,
    /// Exercise time
    pub exercise_minutes: i64,
    /// Hours with standing activity
    pub stand_hours: i64,
}

/// Summary of one sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Mean heart rate over the samples, rounded
    pub heart_rate_avg: Option<f64>,
    /// Latest resting heart rate, rounded
    pub heart_rate_resting: Option<f64>,
    /// Latest heart rate variability, rounded
    pub heart_rate_variability: Option<f64>,
    /// Stress score
    pub stress_score: f64,
    /// Most recent night, if any
    pub sleep: Option<SleepSummary>,
    /// Activity totals
    pub activity: ActivitySummary,
    /// When the snapshot was taken
    pub last_sync: DateTime<Utc>,
}

/// A mindfulness session written back to the health store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindfulnessSession {
    /// Session start
    pub start_date: DateTime<Utc>,
    /// Session end
    pub end_date: DateTime<Utc>,
    /// Length in minutes
    pub minutes: u32,
}

impl MindfulnessSession {
    /// A session of `minutes` starting at `start_date`
    #[must_use]
    pub fn starting_at(start_date: DateTime<Utc>, minutes: u32) -> Self {
        Self {
            start_date,
            end_date: start_date + Duration::minutes(i64::from(minutes)),
            minutes,
        }
    }
}

/// Capability interface over a wearable health store
#[async_trait]
pub trait HealthProvider: Send + Sync {
    /// Short label for logs and CLI output
    fn name(&self) -> &'static str;

    /// Connect; returns whether the provider is now usable
    async fn initialize(&self) -> bool;

    /// Whether `initialize` succeeded and `disconnect` has not been called
    fn is_connected(&self) -> bool;

    /// Summarize the latest data, `None` when disconnected or unreadable
    async fn comprehensive_snapshot(&self) -> Option<HealthSnapshot>;

    /// Record a mindfulness session; returns whether it was written
    async fn write_mindfulness_session(&self, minutes: u32) -> bool;

    /// Stop syncing
    async fn disconnect(&self);
}

/// Fold a raw export into a snapshot
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn summarize(export: &HealthExport, synced_at: DateTime<Utc>) -> HealthSnapshot {
    let heart_rate_avg = if export.heart_rate.is_empty() {
        None
    } else {
        let total: f64 = export.heart_rate.iter().map(|s| s.value).sum();
        Some((total / export.heart_rate.len() as f64).round())
    };

    HealthSnapshot {
        heart_rate_avg,
        heart_rate_resting: export.resting_heart_rate.last().map(|s| s.value.round()),
        heart_rate_variability: export.heart_rate_variability.last().map(|s| s.value.round()),
        stress_score: export.stress_score.unwrap_or(DEFAULT_STRESS_SCORE),
        sleep: summarize_sleep(&export.sleep, export.sleep_efficiency.unwrap_or(DEFAULT_SLEEP_EFFICIENCY)),
        activity: ActivitySummary {
            steps: export.steps.round() as i64,
            active_calories: export.active_calories.round() as i64,
            exercise_minutes: export.exercise_minutes.round() as i64,
            stand_hours: (export.stand_minutes / 60.0).round() as i64,
        },
        last_sync: synced_at,
    }
}

/// Most recent `ASLEEP` interval, split into estimated stages
#[allow(clippy::cast_precision_loss)]
fn summarize_sleep(samples: &[SleepSample], efficiency: f64) -> Option<SleepSummary> {
    let recent = samples
        .iter()
        .filter(|s| s.value == ASLEEP)
        .max_by_key(|s| s.end_date)?;

    let hours = (recent.end_date - recent.start_date).num_seconds() as f64 / 3600.0;
    Some(SleepSummary {
        sleep_duration_hours: round1(hours),
        sleep_efficiency: efficiency.round(),
        deep_sleep_hours: round1(hours * 0.2),
        rem_sleep_hours: round1(hours * 0.15),
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The fixed dataset served by [`SampleHealthProvider`]
#[must_use]
pub fn sample_export(now: DateTime<Utc>) -> HealthExport {
    let sample = |value| Sample { value, start_date: now };
    HealthExport {
        heart_rate: vec![sample(72.0), sample(68.0), sample(75.0)],
        resting_heart_rate: vec![sample(68.0)],
        heart_rate_variability: vec![sample(42.0)],
        sleep: vec![SleepSample {
            value: ASLEEP.to_string(),
            start_date: now - Duration::hours(8),
            end_date: now,
        }],
        steps: 8500.0,
        active_calories: 420.0,
        exercise_minutes: 35.0,
        stand_minutes: 600.0,
        sleep_efficiency: Some(DEFAULT_SLEEP_EFFICIENCY),
        stress_score: Some(DEFAULT_STRESS_SCORE),
    }
}

/// Deterministic provider for demos and tests
#[derive(Debug, Default)]
pub struct SampleHealthProvider {
    connected: AtomicBool,
    sessions: Mutex<Vec<MindfulnessSession>>,
}

impl SampleHealthProvider {
    /// A disconnected provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions written so far
    #[must_use]
    pub fn sessions(&self) -> Vec<MindfulnessSession> {
        self.sessions.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HealthProvider for SampleHealthProvider {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn initialize(&self) -> bool {
        self.connected.store(true, Ordering::SeqCst);
        info!("Sample health provider initialized");
        true
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn comprehensive_snapshot(&self) -> Option<HealthSnapshot> {
        if !self.is_connected() {
            return None;
        }
        let now = Utc::now();
        Some(summarize(&sample_export(now), now))
    }

    async fn write_mindfulness_session(&self, minutes: u32) -> bool {
        if !self.is_connected() || minutes == 0 {
            return false;
        }
        match self.sessions.lock() {
            Ok(mut sessions) => {
                sessions.push(MindfulnessSession::starting_at(Utc::now(), minutes));
                true
            },
            Err(e) => {
                warn!(error = %e, "Error saving mindfulness session");
                false
            },
        }
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!("{DISCONNECT_NOTICE}");
    }
}

/// Provider reading a JSON export file and journaling sessions as JSON lines
#[derive(Debug)]
pub struct ExportedHealthProvider {
    export_path: PathBuf,
    journal_path: PathBuf,
    connected: AtomicBool,
}

impl ExportedHealthProvider {
    /// A disconnected provider over the given files
    pub fn new(export_path: impl Into<PathBuf>, journal_path: impl Into<PathBuf>) -> Self {
        Self {
            export_path: export_path.into(),
            journal_path: journal_path.into(),
            connected: AtomicBool::new(false),
        }
    }

    async fn read_export(&self) -> Result<HealthExport> {
        let raw = tokio::fs::read_to_string(&self.export_path)
            .await
            .map_err(|e| RecoveryError::HealthUnavailable(format!("{}: {e}", self.export_path.display())))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn append_session(&self, session: &MindfulnessSession) -> Result<()> {
        if let Some(parent) = self.journal_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut line = serde_json::to_string(session)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.journal_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl HealthProvider for ExportedHealthProvider {
    fn name(&self) -> &'static str {
        "export"
    }

    async fn initialize(&self) -> bool {
        match self.read_export().await {
            Ok(_) => {
                self.connected.store(true, Ordering::SeqCst);
                info!(path = %self.export_path.display(), "Health export connected");
                true
            },
            Err(e) => {
                warn!(error = %e, "Health export initialization error");
                self.connected.store(false, Ordering::SeqCst);
                false
            },
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn comprehensive_snapshot(&self) -> Option<HealthSnapshot> {
        if !self.is_connected() {
            return None;
        }
        match self.read_export().await {
            Ok(export) => Some(summarize(&export, Utc::now())),
            Err(e) => {
                warn!(error = %e, "Error getting comprehensive health data");
                None
            },
        }
    }

    async fn write_mindfulness_session(&self, minutes: u32) -> bool {
        if !self.is_connected() || minutes == 0 {
            return false;
        }
        let session = MindfulnessSession::starting_at(Utc::now(), minutes);
        match self.append_session(&session).await {
            Ok(()) => {
                info!(minutes, "Mindfulness session saved");
                true
            },
            Err(e) => {
                warn!(error = %e, "Error saving mindfulness session");
                false
            },
        }
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!("{DISCONNECT_NOTICE}");
    }
}

/// Connect to the configured export, falling back to sample data
pub async fn connect(config: &HealthConfig) -> Box<dyn HealthProvider> {
    if let Some(export_path) = &config.export_path {
        let provider = ExportedHealthProvider::new(export_path, &config.journal_path);
        if provider.initialize().await {
            return Box::new(provider);
        }
        warn!(path = %export_path, "Health export unavailable, using sample data");
    }

    let provider = SampleHealthProvider::new();
    provider.initialize().await;
    Box::new(provider)
}
