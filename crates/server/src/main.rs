use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::Clock;
use services::{CatalogService, ProgressService};
use server::AppState;
use storage::catalog::load_catalog_file;
use storage::repository::Storage;
use storage::sqlite::{normalize_sqlite_url, prepare_sqlite_file};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidBind { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBind { raw } => write!(f, "invalid --bind value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p server -- [--bind <addr>] [--questions <path>] [--db <sqlite_url>] [--log-level <filter>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bind 127.0.0.1:3000");
    eprintln!("  --questions data/questions.json");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --log-level info");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BIND (or PORT), QUIZ_QUESTIONS, QUIZ_DB_URL, RUST_LOG");
}

struct Args {
    bind: SocketAddr,
    questions: PathBuf,
    db_url: String,
    log_level: String,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut bind = default_bind()?;
        let mut questions = std::env::var("QUIZ_QUESTIONS")
            .map_or_else(|_| PathBuf::from("data/questions.json"), PathBuf::from);
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3"), |raw| {
                normalize_sqlite_url(&raw)
            });
        let mut log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bind" => {
                    let value = require_value(args, "--bind")?;
                    bind = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidBind { raw: value.clone() })?;
                }
                "--questions" => {
                    questions = PathBuf::from(require_value(args, "--questions")?);
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(&value);
                }
                "--log-level" => {
                    log_level = require_value(args, "--log-level")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bind,
            questions,
            db_url,
            log_level,
        })
    }
}

/// `QUIZ_BIND` wins; a bare `PORT` listens on all interfaces.
fn default_bind() -> Result<SocketAddr, ArgsError> {
    if let Ok(raw) = std::env::var("QUIZ_BIND") {
        return raw.parse().map_err(|_| ArgsError::InvalidBind { raw });
    }
    if let Ok(port) = std::env::var("PORT") {
        let raw = format!("0.0.0.0:{port}");
        return raw.parse().map_err(|_| ArgsError::InvalidBind { raw });
    }
    Ok(SocketAddr::from(([127, 0, 0, 1], 3000)))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    init_logging(&args.log_level);

    let entries = load_catalog_file(&args.questions)?;
    info!(
        questions = entries.len(),
        path = %args.questions.display(),
        "question bank loaded"
    );

    // Open + migrate SQLite at startup so handlers only ever see a ready store.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let progress = ProgressService::new(Clock::system(), Arc::clone(&storage.progress));
    let state = AppState::new(CatalogService::new(entries), progress);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(addr = %listener.local_addr()?, "quiz server listening");
    server::serve(listener, state, shutdown_signal()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
