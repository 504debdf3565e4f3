use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{ClientServices, HttpBackendConfig, QuizLoopService};
use storage::sqlite::{normalize_sqlite_url, prepare_sqlite_file};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidServerUrl { raw: String },
    InvalidDbUrl { raw: String },
    InvalidSource { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidServerUrl { raw } => write!(f, "invalid --server-url value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --cache-db value: {raw}"),
            ArgsError::InvalidSource { raw } => write!(f, "invalid --source value: {raw:?}"),
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

struct DesktopApp {
    source_tag: Option<String>,
    quiz_loop: Arc<QuizLoopService>,
}

impl UiApp for DesktopApp {
    fn source_tag(&self) -> Option<String> {
        self.source_tag.clone()
    }

    fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--server-url <url>] [--cache-db <sqlite_url>] [--source <tag>] [--log-level <filter>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --server-url http://127.0.0.1:3000");
    eprintln!("  --cache-db sqlite:quiz-client.sqlite3");
    eprintln!("  --log-level info");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_SERVER_URL, QUIZ_CACHE_DB, QUIZ_SOURCE, RUST_LOG");
}

struct Args {
    backend: HttpBackendConfig,
    cache_db_url: String,
    /// Attribution tag from the inbound link, e.g. `--source newsletter`.
    source_tag: Option<String>,
    log_level: String,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut backend = HttpBackendConfig::from_env();
        let mut cache_db_url = std::env::var("QUIZ_CACHE_DB")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(
                || normalize_sqlite_url("sqlite:quiz-client.sqlite3"),
                |raw| normalize_sqlite_url(&raw),
            );
        let mut source_tag = std::env::var("QUIZ_SOURCE")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|tag| !tag.is_empty());
        let mut log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--server-url" => {
                    let value = require_value(args, "--server-url")?;
                    if !value.starts_with("http://") && !value.starts_with("https://") {
                        return Err(ArgsError::InvalidServerUrl { raw: value });
                    }
                    backend.base_url = value;
                }
                "--cache-db" => {
                    let value = require_value(args, "--cache-db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    cache_db_url = normalize_sqlite_url(&value);
                }
                "--source" => {
                    let value = require_value(args, "--source")?;
                    let tag = value.trim();
                    if tag.is_empty() {
                        return Err(ArgsError::InvalidSource { raw: value });
                    }
                    source_tag = Some(tag.to_string());
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
            backend,
            cache_db_url,
            source_tag,
            log_level,
        })
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    init_logging(&args.log_level);

    // Open + migrate the device cache before the window exists.
    prepare_sqlite_file(&args.cache_db_url)?;
    let services = ClientServices::new_sqlite(&args.cache_db_url, &args.backend).await?;
    info!(server = %args.backend.base_url, cache = %args.cache_db_url, "client services ready");

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        source_tag: args.source_tag,
        quiz_loop: services.quiz_loop(),
    });
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("ML Quiz")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
