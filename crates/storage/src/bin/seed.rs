use std::fmt;

use chrono::{DateTime, Utc};
use storage::repository::Storage;
use tracker_core::model::{User, UserId, gate_ece_syllabus};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    username: String,
    password: String,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("TRACKER_DB_URL").unwrap_or_else(|_| "sqlite:tracker.sqlite3".into());
        let mut username = std::env::var("TRACKER_USERNAME").unwrap_or_else(|_| "demo".into());
        let mut password = std::env::var("TRACKER_PASSWORD").unwrap_or_else(|_| "demo123".into());
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--username" => {
                    username = require_value(&mut args, "--username")?;
                }
                "--password" => {
                    password = require_value(&mut args, "--password")?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            username,
            password,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:tracker.sqlite3)");
    eprintln!("  --username <name>         Demo account username (default: demo)");
    eprintln!("  --password <text>         Demo account password (default: demo123)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TRACKER_DB_URL, TRACKER_USERNAME, TRACKER_PASSWORD");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let existing = storage.subjects.list_subjects().await?;
    let mut seeded = 0_usize;
    if existing.is_empty() {
        for subject in gate_ece_syllabus() {
            storage.subjects.upsert_subject(&subject).await?;
            seeded += 1;
        }
        tracing::info!(subjects = seeded, "seeded subject catalog");
    } else {
        tracing::info!(subjects = existing.len(), "catalog already present, skipping");
    }

    let demo_id = UserId::new(1);
    if storage.users.get_user(demo_id).await?.is_none() {
        let user = User::new(demo_id, args.username.clone(), args.password.clone(), now)?;
        storage.users.upsert_user(&user).await?;
        tracing::info!(username = %args.username, "created demo user");
    }

    println!(
        "Seeded {} subjects and ensured user {:?} in {}",
        seeded, args.username, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
