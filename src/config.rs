use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::responder::ThinkingDelay;
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telemetry database settings
    pub database: DatabaseConfig,
    /// Log level, file and format
    pub logging: LoggingConfig,
    /// Chat companion settings
    pub companion: CompanionConfig,
    /// Clinician dashboard thresholds and limits
    pub dashboard: DashboardConfig,
    /// Wearable export and journal locations
    pub health: HealthConfig,
    /// Patient record storage
    pub patient: PatientConfig,
}

/// SQLite telemetry store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite file
    pub path: String,
    /// Pool size
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Daily-rolling JSON log file, if any
    pub file_path: Option<String>,
    /// Console format, `json` or `text`
    pub format: String,
}

/// Chat companion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionConfig {
    /// Directory of the conversation store
    pub storage_path: String,
    /// Key the conversation log is stored under
    pub storage_key: String,
    /// Shortest thinking delay
    pub min_delay_secs: f64,
    /// Longest thinking delay
    pub max_delay_secs: f64,
    /// Longest accepted message, in characters
    pub max_message_length: usize,
}

/// Clinician dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Risk at which a record counts as high
    pub high_risk_threshold: f64,
    /// Risk at which a record counts as critical
    pub critical_risk_threshold: f64,
    /// Sobriety records per risk trend
    pub trend_points: usize,
    /// Chats folded into a patient summary
    pub recent_chat_limit: usize,
    /// Mood entries on the overview
    pub recent_mood_limit: usize,
    /// High-risk records on the overview
    pub overview_high_risk_limit: usize,
    /// Relapse events on the overview
    pub overview_relapse_limit: usize,
    /// High-risk records on the risk view
    pub risk_high_risk_limit: usize,
}

/// Patient record settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientConfig {
    /// Directory of the patient record store
    pub storage_path: String,
}

/// Wearable data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// JSON health export to read; sample data when unset
    pub export_path: Option<String>,
    /// JSON-lines file mindfulness sessions are appended to
    pub journal_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: "data/telemetry.db".to_string(),
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            companion: CompanionConfig {
                storage_path: "data/conversation".to_string(),
                storage_key: crate::conversation::DEFAULT_STORAGE_KEY.to_string(),
                min_delay_secs: 1.0,
                max_delay_secs: 3.0,
                max_message_length: 5000,
            },
            dashboard: DashboardConfig {
                high_risk_threshold: 0.6,
                critical_risk_threshold: 0.8,
                trend_points: 30,
                recent_chat_limit: 10,
                recent_mood_limit: 20,
                overview_high_risk_limit: 10,
                overview_relapse_limit: 5,
                risk_high_risk_limit: 50,
            },
            health: HealthConfig {
                export_path: None,
                journal_path: "data/mindfulness.jsonl".to_string(),
            },
            patient: PatientConfig {
                storage_path: "data/patient".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {e}"))?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix, e.g. RECOVERY__LOGGING__LEVEL
            .add_source(Environment::with_prefix("RECOVERY").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {e}"))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        if self.database.path.trim().is_empty() {
            return Err(anyhow::anyhow!("database path cannot be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate companion config
        if self.companion.storage_key.trim().is_empty() {
            return Err(anyhow::anyhow!("storage_key cannot be empty"));
        }
        self.thinking_delay()?;
        if self.companion.max_message_length == 0 {
            return Err(anyhow::anyhow!("max_message_length must be greater than 0"));
        }

        if self.patient.storage_path.trim().is_empty() {
            return Err(anyhow::anyhow!("patient storage_path cannot be empty"));
        }
        if self.patient.storage_path == self.companion.storage_path {
            return Err(anyhow::anyhow!(
                "patient and companion stores must use different directories"
            ));
        }

        // Validate dashboard config
        InputValidator::validate_risk_threshold(self.dashboard.high_risk_threshold)?;
        InputValidator::validate_risk_threshold(self.dashboard.critical_risk_threshold)?;
        if self.dashboard.critical_risk_threshold < self.dashboard.high_risk_threshold {
            return Err(anyhow::anyhow!(
                "critical_risk_threshold must not be below high_risk_threshold"
            ));
        }
        if self.dashboard.trend_points == 0 || self.dashboard.recent_chat_limit == 0 {
            return Err(anyhow::anyhow!("dashboard limits must be greater than 0"));
        }

        Ok(())
    }

    /// Thinking delay range for companion replies
    pub fn thinking_delay(&self) -> Result<ThinkingDelay> {
        ThinkingDelay::new(self.companion.min_delay_secs, self.companion.max_delay_secs)
            .map_err(|e| anyhow::anyhow!("{e}"))
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| anyhow::anyhow!("Failed to render configuration: {e}"))
    }
}
