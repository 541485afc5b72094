//! Command-line entry point for the recovery companion.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use recovery_companion::companion::{Companion, Turn, QUICK_REPLIES};
use recovery_companion::config::AppConfig;
use recovery_companion::conversation::{ConversationLog, SledConversationStore};
use recovery_companion::dashboard::DashboardAggregator;
use recovery_companion::db::Database;
use recovery_companion::health;
use recovery_companion::logging::{init_logging, OperationTimer};
use recovery_companion::metrics::MetricsCollector;
use recovery_companion::models::{DatabaseHealth, RiskLevel, SenderRole};
use recovery_companion::patient::{
    MoodDiarySubmission, MoodLogOutcome, PatientRecord, PatientTracker, QuickMood, SledPatientStore, SyncOutcome,
};
use recovery_companion::responder::ThinkingDelay;
use recovery_companion::session::SessionContext;
use recovery_companion::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed for response selection (random when omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Skip the thinking delay before replies
    #[arg(long, global = true)]
    no_delay: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the companion; reads lines from stdin unless --message is given
    Chat {
        /// Send a single message and exit
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Send one of the quick replies
    Quick {
        /// Which quick reply (0: feeling good, 1: cravings, 2: need support)
        #[arg(short, long)]
        index: usize,
    },
    /// Show the stored conversation
    History {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the stored conversation
    ClearHistory,
    /// Clinician overview dashboard
    Overview,
    /// Clinician patient roster
    Patients,
    /// Clinician risk analysis
    Risk,
    /// Check the telemetry database connection; exits non-zero when unhealthy
    DbHealth,
    /// Summarize current wearable data
    HealthSnapshot,
    /// Record a mindfulness session
    Mindfulness {
        /// Session length in minutes
        #[arg(short, long)]
        minutes: u32,
    },
    /// Show the patient's home-screen summary
    Status,
    /// Log how you feel right now (once per day)
    LogMood {
        /// How you are feeling
        #[arg(value_enum)]
        mood: MoodChoice,
    },
    /// Fill in the mood diary; every rating is 1-10
    Diary {
        /// Overall mood
        #[arg(long, default_value_t = MoodDiarySubmission::default().mood)]
        mood: u8,
        /// Anxiety level
        #[arg(long, default_value_t = MoodDiarySubmission::default().anxiety)]
        anxiety: u8,
        /// Craving intensity
        #[arg(long, default_value_t = MoodDiarySubmission::default().cravings)]
        cravings: u8,
        /// Energy level
        #[arg(long, default_value_t = MoodDiarySubmission::default().energy)]
        energy: u8,
        /// Sleep quality
        #[arg(long, default_value_t = MoodDiarySubmission::default().sleep_quality)]
        sleep_quality: u8,
        /// Pain level
        #[arg(long, default_value_t = MoodDiarySubmission::default().pain)]
        pain: u8,
        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Show the patient's health dashboard with its overall score
    HealthDashboard,
    /// Pull wearable data into the patient's records
    Sync,
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum MoodChoice {
    /// Feeling great
    Great,
    /// Feeling good
    Good,
    /// Feeling okay
    Okay,
    /// Not feeling great
    NotGreat,
}

impl From<MoodChoice> for QuickMood {
    fn from(choice: MoodChoice) -> Self {
        match choice {
            MoodChoice::Great => Self::Great,
            MoodChoice::Good => Self::Good,
            MoodChoice::Okay => Self::Okay,
            MoodChoice::NotGreat => Self::NotGreat,
        }
    }
}

#[derive(Serialize)]
struct StatusView<'a> {
    greeting: String,
    #[serde(flatten)]
    patient: &'a PatientRecord,
    risk_level: RiskLevel,
    mood_logged_today: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let log_file = config.logging.file_path.as_deref().map(Path::new);
    let _log_guard = init_logging(Some(&config.get_log_level()), log_file, config.logging.format == "json")?;

    if let Err(e) = MetricsCollector::init() {
        warn!(error = %e, "Metrics recorder not installed");
    }
    let metrics = Arc::new(MetricsCollector::default());

    info!("Starting recovery-companion");

    // Parse command line arguments
    let cli = Cli::parse();

    match &cli.command {
        Commands::Chat { message } => {
            let mut companion = open_companion(&config, &cli, &metrics)?;
            match message {
                Some(text) => {
                    let turn = companion.respond(text).await?;
                    print_turn(&turn);
                },
                None => chat_loop(&mut companion).await?,
            }
        },
        Commands::Quick { index } => {
            let mut companion = open_companion(&config, &cli, &metrics)?;
            let turn = companion.quick_reply(*index).await?;
            print_turn(&turn);
        },
        Commands::History { json } => {
            let companion = open_companion(&config, &cli, &metrics)?;
            if *json {
                print_json(&companion.history())?;
            } else {
                for message in companion.history() {
                    let who = match message.sender {
                        SenderRole::User => "You",
                        SenderRole::Companion => "Julia",
                    };
                    println!(
                        "[{}] {who}: {} ({}, sentiment {:.2})",
                        message.timestamp.format("%Y-%m-%d %H:%M"),
                        message.text,
                        message.category,
                        message.sentiment
                    );
                }
            }
        },
        Commands::ClearHistory => {
            let mut companion = open_companion(&config, &cli, &metrics)?;
            if companion.clear_history() {
                println!("Conversation history cleared");
            } else {
                println!("Conversation history cleared, but the change could not be saved");
            }
        },
        Commands::Overview => {
            let dashboard = open_dashboard(&config, &metrics)?;
            print_json(&dashboard.overview(&SessionContext::local_operator())?)?;
        },
        Commands::Patients => {
            let dashboard = open_dashboard(&config, &metrics)?;
            print_json(&dashboard.patient_summaries(&SessionContext::local_operator())?)?;
        },
        Commands::Risk => {
            let dashboard = open_dashboard(&config, &metrics)?;
            print_json(&dashboard.risk_analysis(&SessionContext::local_operator())?)?;
        },
        Commands::DbHealth => return db_health(&config, &metrics),
        Commands::HealthSnapshot => {
            let provider = health::connect(&config.health).await;
            info!(provider = provider.name(), "Health provider connected");
            match provider.comprehensive_snapshot().await {
                Some(snapshot) => print_json(&snapshot)?,
                None => println!("Health data is not available right now."),
            }
        },
        Commands::Mindfulness { minutes } => {
            InputValidator::validate_mindfulness_minutes(*minutes)?;
            let provider = health::connect(&config.health).await;
            if provider.write_mindfulness_session(*minutes).await {
                println!("Saved a {minutes}-minute mindfulness session ({})", provider.name());
            } else {
                println!("Could not save the mindfulness session. Please try again later.");
            }
        },
        Commands::Status => {
            let today = today();
            let tracker = open_tracker(&config, today, &metrics)?;
            let patient = tracker.patient();
            print_json(&StatusView {
                greeting: format!("Hello, {}", patient.first_name()),
                patient,
                risk_level: patient.risk_level(),
                mood_logged_today: tracker.logged_on(today),
            })?;
        },
        Commands::LogMood { mood } => {
            let today = today();
            let mut tracker = open_tracker(&config, today, &metrics)?;
            match tracker.log_mood((*mood).into(), today) {
                MoodLogOutcome::AlreadyLogged => println!("You've already logged your mood today."),
                MoodLogOutcome::Logged { persisted } => {
                    println!("Mood logged. Thank you for checking in.");
                    if !persisted {
                        println!("(your mood could not be saved)");
                    }
                },
            }
        },
        Commands::Diary {
            mood,
            anxiety,
            cravings,
            energy,
            sleep_quality,
            pain,
            notes,
        } => {
            let today = today();
            let mut tracker = open_tracker(&config, today, &metrics)?;
            let entry = MoodDiarySubmission {
                mood: *mood,
                anxiety: *anxiety,
                cravings: *cravings,
                energy: *energy,
                sleep_quality: *sleep_quality,
                pain: *pain,
                notes: notes.clone(),
            };
            if tracker.submit_mood_diary(&entry, today)? {
                println!("Mood diary updated. Overall health score: {}", tracker.health().health_score());
            } else {
                println!("Mood diary updated, but it could not be saved. Please try again.");
            }
        },
        Commands::HealthDashboard => {
            let tracker = open_tracker(&config, today(), &metrics)?;
            print_json(&tracker.health_dashboard())?;
        },
        Commands::Sync => {
            let today = today();
            let mut tracker = open_tracker(&config, today, &metrics)?;
            let provider = health::connect(&config.health).await;
            match tracker.sync_health(provider.as_ref(), today).await {
                SyncOutcome::Unavailable => println!("Health data is not available right now."),
                SyncOutcome::Synced { persisted } => {
                    println!("Health data synced from {}", provider.name());
                    if !persisted {
                        println!("(the synced data could not be saved)");
                    }
                },
            }
        },
        Commands::Config => print!("{}", config.to_yaml()?),
    }

    Ok(ExitCode::SUCCESS)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn open_conversation_store(config: &AppConfig) -> Result<SledConversationStore> {
    let path = PathBuf::from(&config.companion.storage_path);
    InputValidator::validate_file_path(&path)?;
    SledConversationStore::open(&path, &config.companion.storage_key)
        .with_context(|| format!("Failed to open conversation store at {}", path.display()))
}

fn open_companion(
    config: &AppConfig, cli: &Cli, metrics: &Arc<MetricsCollector>,
) -> Result<Companion<SledConversationStore, StdRng>> {
    let store = open_conversation_store(config)?;
    let rng = cli.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let companion = Companion::new(ConversationLog::open(store), &config.companion, rng, Arc::clone(metrics))?;
    Ok(if cli.no_delay {
        companion.with_delay(ThinkingDelay::none())
    } else {
        companion
    })
}

fn open_tracker(
    config: &AppConfig, today: NaiveDate, metrics: &Arc<MetricsCollector>,
) -> Result<PatientTracker<SledPatientStore>> {
    let path = PathBuf::from(&config.patient.storage_path);
    InputValidator::validate_file_path(&path)?;
    let store = SledPatientStore::open(&path)
        .with_context(|| format!("Failed to open patient store at {}", path.display()))?;
    Ok(PatientTracker::open(store, today, Arc::clone(metrics)))
}

fn open_dashboard(config: &AppConfig, metrics: &Arc<MetricsCollector>) -> Result<DashboardAggregator<Database>> {
    let db = Database::from_config(&config.database)
        .with_context(|| format!("Failed to open telemetry database at {}", config.database.path))?;
    Ok(DashboardAggregator::new(db, config.dashboard.clone(), Arc::clone(metrics)))
}

fn db_health(config: &AppConfig, metrics: &Arc<MetricsCollector>) -> Result<ExitCode> {
    let timer = OperationTimer::new("db_health");
    let health = match open_dashboard(config, metrics) {
        Ok(dashboard) => dashboard.database_health(&SessionContext::local_operator())?,
        Err(e) => {
            error!(error = %e, "Health check failed");
            DatabaseHealth::disconnected(&e)
        },
    };
    print_json(&health)?;
    timer.finish();
    Ok(if health.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn chat_loop(companion: &mut Companion<SledConversationStore, StdRng>) -> Result<()> {
    if let Some(last) = companion.history().last() {
        if last.sender == SenderRole::Companion {
            println!("Julia: {}", last.text);
        }
    }
    println!("(type a message, or 'exit' to leave; quick replies: {})", QUICK_REPLIES.join(" | "));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        if line.is_empty() {
            continue;
        }
        println!("Julia is typing...");
        match companion.respond(line).await {
            Ok(turn) => print_turn(&turn),
            Err(e) => println!("{e}"),
        }
    }
    Ok(())
}

fn print_turn(turn: &Turn) {
    if let Some(notice) = &turn.crisis_notice {
        println!();
        println!("*** {} ***", notice.title);
        println!("{}", notice.message);
        println!("[{}]", notice.actions.join("] ["));
        println!();
    }
    println!("Julia: {}", turn.reply.text);
    if !turn.persisted {
        println!("(this conversation could not be saved)");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
