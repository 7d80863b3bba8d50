//! fliix-helpers - command-line access to the Fliix helper library
//!
//! Formats durations and timestamps, validates identifiers, reshapes
//! form JSON, and talks to the configured push, geocoding and settings
//! backends.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use fliix_helpers::config::{Config, GEOCODING_SECRET_KEY};
use fliix_helpers::geocoding::{get_gps_from_address, GoogleGeocoder};
use fliix_helpers::notify::{Notifier, PushOptions, PushoverClient};
use fliix_helpers::utils::formatting::{
    format_last_communication, format_uptime, seconds_to_human_time, UnitFilter,
};
use fliix_helpers::utils::geo::{distance_between_gps_points, GpsPoint};
use fliix_helpers::utils::guid::guid_v4;
use fliix_helpers::utils::reshape::reshape_json;
use fliix_helpers::utils::validation::{check_email, check_sv_number, check_tax_id};
use fliix_helpers::{
    ConfigStore, CredentialStore, KeyringCredentialStore, StdFileStore, YamlConfigStore,
};

/// Command-line arguments
#[derive(Parser)]
#[command(name = "fliix-helpers", version, about)]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Format seconds as a duration, e.g. "1 h 1 min 1 s"
    Duration {
        seconds: u64,
        /// Restrict output to these units (year, month, week, day, hour, minute, second)
        #[arg(long = "only")]
        only: Vec<String>,
    },
    /// Format seconds as an uptime, e.g. "2 Tage 03:04:05"
    Uptime { seconds: u64 },
    /// Describe how long ago a timestamp was
    Ago { timestamp: String },
    /// Validate an identifier
    Validate {
        #[command(subcommand)]
        kind: ValidateKind,
    },
    /// Reshape a JSON object of parallel arrays into rows (stdin if no file)
    Reshape { file: Option<PathBuf> },
    /// Distance in km between two coordinates
    #[command(allow_negative_numbers = true)]
    Distance {
        lat1: f64,
        lng1: f64,
        lat2: f64,
        lng2: f64,
    },
    /// Print a random v4 GUID
    Guid,
    /// Send a push notification through a configured profile
    Push {
        #[arg(long)]
        profile: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        url: String,
        message: String,
    },
    /// Look up the coordinates of an address
    Geocode { address: String },
    /// Read and write key/value settings
    Setting {
        #[command(subcommand)]
        action: SettingAction,
    },
    /// Manage secrets (SMTP passwords, push tokens, API keys) in the keyring
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(Subcommand)]
enum SecretAction {
    Set {
        /// Keyring key, e.g. "mail:office", "push:ops" or "geocoding"
        key: String,
        value: String,
    },
}

#[derive(Subcommand)]
enum ValidateKind {
    Email { address: String },
    Sv { number: String, birthday: String },
    Tax { id: String },
}

#[derive(Subcommand)]
enum SettingAction {
    Get { name: String },
    Add { name: String, content: String },
    Update { name: String, content: String },
}

fn init_logging() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn report_validation<E: std::fmt::Display>(result: Result<(), E>) -> ExitCode {
    match result {
        Ok(()) => {
            println!("valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("invalid: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging()?;
    let args = Args::parse();

    match args.command {
        Command::Duration { seconds, only } => {
            println!("{}", seconds_to_human_time(seconds, &UnitFilter::from_names(only)));
        }
        Command::Uptime { seconds } => println!("{}", format_uptime(seconds)),
        Command::Ago { timestamp } => println!("{}", format_last_communication(&timestamp)),
        Command::Validate { kind } => {
            let result = match kind {
                ValidateKind::Email { address } => check_email(&address),
                ValidateKind::Sv { number, birthday } => check_sv_number(&number, &birthday),
                ValidateKind::Tax { id } => check_tax_id(&id),
            };
            return Ok(report_validation(result));
        }
        Command::Reshape { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {:?}", path))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            println!("{}", serde_json::to_string_pretty(&reshape_json(&text))?);
        }
        Command::Distance {
            lat1,
            lng1,
            lat2,
            lng2,
        } => {
            let km =
                distance_between_gps_points(GpsPoint::new(lat1, lng1), GpsPoint::new(lat2, lng2));
            println!("{:.3} km", km);
        }
        Command::Guid => println!("{}", guid_v4()),
        Command::Push {
            profile,
            title,
            url,
            message,
        } => {
            let config = load_config(args.config.as_ref())?;
            let sender = Arc::new(PushoverClient::new(config.pushover_url.clone())?);
            let notifier = Notifier::from_config(&config, Arc::new(KeyringCredentialStore), sender);

            let options = PushOptions {
                title,
                url,
                ..PushOptions::default()
            };
            let outcome = notifier.send_push(&profile, &message, options).await;
            println!("{}", outcome);
            if !outcome.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Geocode { address } => {
            let config = load_config(args.config.as_ref())?;
            let api_key = KeyringCredentialStore
                .get_secret(GEOCODING_SECRET_KEY)
                .context("No geocoding API key stored; run `fliix-helpers secret set geocoding <key>`")?;
            let geocoder = GoogleGeocoder::new(config.geocoding.base_url.clone(), api_key)?;

            match get_gps_from_address(&geocoder, &address).await {
                Some(point) => println!("{} {}", point.lat, point.lng),
                None => {
                    println!("not found");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Setting { action } => {
            let store = YamlConfigStore::new(
                Config::settings_path_for(args.config.as_deref())?,
                Arc::new(StdFileStore),
            );
            match action {
                SettingAction::Get { name } => match store.get(&name)? {
                    Some(content) => println!("{}", content),
                    None => {
                        tracing::info!("Setting '{}' is not set", name);
                        return Ok(ExitCode::FAILURE);
                    }
                },
                SettingAction::Add { name, content } => store.add(&name, &content)?,
                SettingAction::Update { name, content } => store.update(&name, &content)?,
            }
        }
        Command::Secret {
            action: SecretAction::Set { key, value },
        } => {
            KeyringCredentialStore.save_secret(&key, &value)?;
            tracing::info!("Stored secret '{}'", key);
        }
    }

    Ok(ExitCode::SUCCESS)
}
