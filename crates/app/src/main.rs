use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use quiz_core::model::{QuestionBank, SessionToken};
use services::{Clock, QuestionView, QuizServices, Route};
use tracing::debug;

mod play;
mod render;

const SAMPLE_BANK: &[u8] = include_bytes!("../data/sample_questions.json");

#[derive(Parser)]
#[command(name = "quiz", version, about = "Multiple-choice quiz sessions in the terminal")]
struct Cli {
    /// SQLite database URL or file path
    #[arg(long, env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3", global = true)]
    db: String,

    /// Question bank JSON file (defaults to the bundled sample bank)
    #[arg(long, env = "QUIZ_BANK", global = true)]
    bank: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Begin a new session and print its first route
    Start {
        /// Start at a random question instead of question 1
        #[arg(long)]
        random: bool,
    },

    /// Answer questions interactively from stdin
    Play {
        /// Route to open, e.g. /qa/<session>/3 (default: a new session)
        route: Option<String>,
    },

    /// Show per-domain and per-service statistics for a session
    Summary { session: String },

    /// Write a session to a transfer file
    Export {
        session: String,

        /// Directory for the exported file
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Load a transfer file into the answer store
    Import { file: PathBuf },

    /// Render whatever page a route points at
    Open { route: String },
}

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
    InvalidSession { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSession { raw } => write!(f, "invalid session token: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn parse_session(raw: &str) -> Result<SessionToken, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidSession {
        raw: raw.to_string(),
    })
}

fn load_bank(path: Option<&Path>) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    let bank = match path {
        Some(path) => QuestionBank::from_json_slice(&std::fs::read(path)?)?,
        None => QuestionBank::from_json_slice(SAMPLE_BANK)?,
    };
    debug!(questions = bank.len(), "loaded question bank");
    Ok(bank)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn open_services(cli: &Cli) -> Result<QuizServices, Box<dyn std::error::Error>> {
    if cli.db.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: cli.db.clone(),
        }
        .into());
    }
    let bank = Arc::new(load_bank(cli.bank.as_deref())?);
    let db_url = normalize_sqlite_url(cli.db.clone());

    // Open + migrate SQLite here so core/services stay free of file-system concerns.
    prepare_sqlite_file(&db_url)?;
    debug!(db = %db_url, "opening answer store");
    Ok(QuizServices::new_sqlite(&db_url, Clock::system(), bank).await?)
}

async fn open_route(services: &QuizServices, route: Route) -> Result<(), Box<dyn std::error::Error>> {
    match route {
        Route::Entry => println!("{}", render::entry()),
        Route::Summary(session) => {
            let report = services.summary().report(&session).await?;
            println!("{}", render::summary(&report));
        }
        Route::Question(session, number) => {
            let navigator = services.navigator();
            match navigator.load_question(&session, number).await? {
                QuestionView::NotFound => println!("Question {number} not found"),
                QuestionView::Question(attempt) => {
                    if let Some(question) = navigator.question(number) {
                        let progress = navigator.progress(number);
                        println!("{}", render::question(question, &attempt, &progress));
                    }
                }
            }
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let services = open_services(&cli).await?;

    match cli.command {
        Commands::Start { random } => {
            let navigator = services.navigator();
            let route = if random {
                navigator.start_random()
            } else {
                navigator.start_session()
            };
            println!("{route}");
        }
        Commands::Play { route } => {
            let start = match route {
                Some(raw) => raw.parse::<Route>()?,
                None => Route::Entry,
            };
            play::run(&services, start).await?;
        }
        Commands::Summary { session } => {
            let session = parse_session(&session)?;
            open_route(&services, Route::summary(&session)).await?;
            let back = services.summary().back_to_questions(&session).await?;
            println!("Back to questions: {back}");
        }
        Commands::Export { session, out } => {
            let session = parse_session(&session)?;
            let transfer = services.transfer();
            let record = transfer.export(&session).await?;
            std::fs::create_dir_all(&out)?;
            let path = out.join(transfer.file_name(&session));
            std::fs::write(&path, record.to_pretty_json()?)?;
            println!(
                "Exported {} answers to {}",
                record.answers.len(),
                path.display()
            );
        }
        Commands::Import { file } => {
            let bytes = std::fs::read(&file)?;
            let outcome = services.transfer().import(&bytes).await?;
            println!("Imported {} answers", outcome.imported);
            println!("{}", outcome.redirect);
        }
        Commands::Open { route } => {
            open_route(&services, route.parse::<Route>()?).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,quiz=info,services=info")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
