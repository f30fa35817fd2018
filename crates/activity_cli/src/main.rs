//! Developer CLI for the activity tracker core.
//!
//! # Responsibility
//! - Drive the activity store against a local database file without the
//!   Flutter/FFI runtime.
//! - Exercise the weather and hotel lookups from a terminal.
//!
//! # Invariants
//! - Failing to open the database at startup exits with status 1.

use activity_core::db::{close_db, open_db};
use activity_core::{
    default_log_level, init_logging, parse_date, parse_time, ActivityKey, ActivityPatch,
    ActivityRecord, ActivityStore, ActivityType, Coordinates, HotelClient, HotelLookup,
    LookupConfig, NewActivity, SqliteActivityRepository, StoreOutcome, WeatherClient,
    WeatherLookup,
};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use log::error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "activity", version, about = "Log activities and look up city info")]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = "activity_tracker.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when omitted.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an activity; fails when date + start time already exist.
    Add(AddArgs),
    /// Change fields of an existing activity.
    Update(UpdateArgs),
    /// Delete one activity.
    Delete(KeyArgs),
    /// Delete every activity.
    Clear,
    /// List activities, optionally for one day.
    List {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Show one activity.
    Show(KeyArgs),
    /// Current weather for a city.
    Weather { city: String },
    /// Rating details for a hotel near a coordinate.
    Hotel {
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Activity date, YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    date: NaiveDate,
    /// Start time, HH:MM.
    #[arg(long, value_parser = parse_time)]
    start: NaiveTime,
}

impl KeyArgs {
    fn key(&self) -> ActivityKey {
        ActivityKey::new(self.date, self.start)
    }
}

#[derive(Args, Debug)]
struct AddArgs {
    #[command(flatten)]
    key: KeyArgs,
    #[arg(long, value_parser = parse_time)]
    end: NaiveTime,
    #[arg(long)]
    city: String,
    #[arg(long)]
    place: String,
    #[arg(long)]
    info: String,
    /// indoor|outdoor
    #[arg(long = "type")]
    kind: ActivityType,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    #[command(flatten)]
    key: KeyArgs,
    #[arg(long, value_parser = parse_time)]
    end: Option<NaiveTime>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    place: Option<String>,
    #[arg(long)]
    info: Option<String>,
    #[arg(long = "type")]
    kind: Option<ActivityType>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match cli.command {
        Command::Weather { city } => lookup_weather(&city).await,
        Command::Hotel { name, lat, lon } => {
            lookup_hotel(
                &name,
                Coordinates {
                    latitude: lat,
                    longitude: lon,
                },
            )
            .await
        }
        command => run_store_command(&cli.db, command),
    }
}

fn run_store_command(db: &Path, command: Command) -> ExitCode {
    let conn = match open_db(db) {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=cli_start module=cli status=error error_code=db_open_failed error={err}");
            eprintln!("cannot open activity database `{}`: {err}", db.display());
            return ExitCode::FAILURE;
        }
    };

    let outcome = {
        let repo = match SqliteActivityRepository::try_new(&conn) {
            Ok(repo) => repo,
            Err(err) => {
                eprintln!("activity database is not usable: {err}");
                return ExitCode::FAILURE;
            }
        };
        let mut store = match ActivityStore::open(repo) {
            Ok(store) => store,
            Err(err) => {
                eprintln!("cannot load activities: {err}");
                return ExitCode::FAILURE;
            }
        };
        execute(&mut store, command)
    };

    if let Err(err) = close_db(conn) {
        eprintln!("warning: closing database failed: {err}");
    }

    match outcome {
        Ok(outcome) if outcome.is_applied() => ExitCode::SUCCESS,
        Ok(outcome) => {
            eprintln!("{}", outcome.message());
            ExitCode::FAILURE
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one store command; `Err` carries an input rejection message.
fn execute(
    store: &mut ActivityStore<SqliteActivityRepository<'_>>,
    command: Command,
) -> Result<StoreOutcome, String> {
    let outcome = match command {
        Command::Add(args) => {
            let request = NewActivity {
                activity_date: args.key.date,
                start_time: args.key.start,
                end_time: args.end,
                city: args.city,
                important_place: args.place,
                activity_info: args.info,
                activity_type: args.kind,
            };
            if !request.has_required_fields() {
                return Err(
                    "City, important place and activity info must all be filled.".to_string(),
                );
            }
            report(store.create(request), store.snapshot())
        }
        Command::Update(args) => {
            let patch = ActivityPatch {
                end_time: args.end,
                city: args.city,
                important_place: args.place,
                activity_info: args.info,
                activity_type: args.kind,
            };
            report(store.update(args.key.key(), &patch), store.snapshot())
        }
        Command::Delete(args) => report(store.delete(args.key()), store.snapshot()),
        Command::Clear => report(store.delete_all(), store.snapshot()),
        Command::List { date } => {
            let loaded = match date {
                Some(day) => store.load_day(day),
                None => StoreOutcome::Applied,
            };
            report(loaded, store.snapshot())
        }
        Command::Show(args) => match store.get(args.key()) {
            Some(record) => {
                print_detail(&record);
                StoreOutcome::Applied
            }
            None => StoreOutcome::NotFound,
        },
        // Lookups never reach the store.
        Command::Weather { .. } | Command::Hotel { .. } => StoreOutcome::Applied,
    };
    Ok(outcome)
}

fn report(outcome: StoreOutcome, records: &[ActivityRecord]) -> StoreOutcome {
    if outcome.is_applied() {
        print_records(records);
    }
    outcome
}

fn print_records(records: &[ActivityRecord]) {
    if records.is_empty() {
        println!("(no activities)");
        return;
    }
    for record in records {
        println!(
            "{} {} to {}  {} Activity  {}",
            record.activity_date,
            record.start_time.format("%H:%M"),
            record.end_time.format("%H:%M"),
            record.activity_type,
            record.city
        );
    }
}

fn print_detail(record: &ActivityRecord) {
    println!("Date of the activity: {}", record.activity_date);
    println!("Start time: {}", record.start_time.format("%H:%M"));
    println!("End time: {}", record.end_time.format("%H:%M"));
    println!("City: {}", record.city);
    println!("Important place: {}", record.important_place);
    println!("Activity info: {}", record.activity_info);
    println!("Activity type: {}", record.activity_type);
}

async fn lookup_weather(city: &str) -> ExitCode {
    let client = match WeatherClient::new(&LookupConfig::from_env()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("cannot build weather client: {err}");
            return ExitCode::FAILURE;
        }
    };

    match client.current_weather(city).await {
        Some(weather) => {
            println!("{:.1}°C  {}", weather.temperature, weather.description);
            println!("icon: {}", weather.icon_url());
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("weather unavailable");
            ExitCode::FAILURE
        }
    }
}

async fn lookup_hotel(name: &str, at: Coordinates) -> ExitCode {
    let client = match HotelClient::new(&LookupConfig::from_env()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("cannot build hotel client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let info = client.hotel_info(name, at).await;
    println!("Rating: {:.1}", info.rating);
    println!("Reviews: {}", info.review_count);
    println!("Phone: {}", info.phone);
    println!("Website: {}", info.url);
    if info.is_unavailable() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
