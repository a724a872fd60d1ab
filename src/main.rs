#![forbid(unsafe_code)]

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use stylesync::api::{ApiClient, SettingsApi};
use stylesync::config::ClientConfig;
use stylesync::{Session, SettingValue};

#[derive(Parser)]
#[command(name = "stylesync", about = "Admin theme settings client", version)]
struct Cli {
    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every setting and its current server-side value
    Show,
    /// Print one setting
    Get { key: String },
    /// Change one setting and save it
    Set { key: String, value: String },
    /// Reset all settings to defaults and save
    Reset,
    /// Print the generated admin stylesheet
    Css,
    /// List available color palettes
    Palettes,
    /// List available templates
    Templates,
    /// Apply a color palette
    ApplyPalette { palette_id: String },
    /// Apply a settings template
    ApplyTemplate { template_id: String },
}

/// "true"/"false" parse as toggles, numbers as numbers, the rest as text
fn parse_value(raw: &str) -> SettingValue {
    match raw {
        "true" => SettingValue::Toggle(true),
        "false" => SettingValue::Toggle(false),
        _ => match raw.parse::<f64>() {
            Ok(n) => SettingValue::Number(n),
            Err(_) => SettingValue::text(raw),
        },
    }
}

fn build_session(config: &ClientConfig) -> Result<Session> {
    let api = ApiClient::new(&config.base_url, &config.nonce, config.timeout_secs)
        .context("Failed to build HTTP client")?;
    Ok(Session::with_debounce(
        Rc::new(api) as Rc<dyn SettingsApi>,
        Some(Duration::from_millis(config.debounce_ms)),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };

    // LOG_LEVEL env overrides the config file
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| config.log_level.clone())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut session = build_session(&config)?;

    match cli.command {
        Command::Show => {
            session.load_from_server()?;
            for (key, value) in session.state().snapshot().iter() {
                println!("{key} = {value}");
            }
        }
        Command::Get { key } => {
            session.load_from_server()?;
            match session.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown setting '{key}'").into()),
            }
        }
        Command::Set { key, value } => {
            session.load_from_server()?;
            session.set(&key, parse_value(&value))?;
            let receipt = session.save()?;
            info!(key = %key, saved_at = %receipt.saved_at, "setting saved");
        }
        Command::Reset => {
            session.load_from_server()?;
            session.reset();
            let receipt = session.save()?;
            info!(saved_at = %receipt.saved_at, "settings reset");
        }
        Command::Css => {
            session.load_from_server()?;
            session.force_regenerate();
            println!("{}", session.stylesheet());
        }
        Command::Palettes => {
            session.load_from_server()?;
            let current = session
                .palettes
                .current_id(session.state())
                .unwrap_or("")
                .to_string();
            for palette in session.palettes.all() {
                let marker = if palette.id == current { "*" } else { " " };
                println!("{marker} {:<20} {}", palette.id, palette.name);
            }
        }
        Command::Templates => {
            session.load_from_server()?;
            let current = session
                .templates
                .current_id(session.state())
                .unwrap_or("")
                .to_string();
            for tpl in session.templates.all() {
                let marker = if tpl.id == current { "*" } else { " " };
                println!("{marker} {:<14} [{}] {}", tpl.id, tpl.category, tpl.description);
            }
        }
        Command::ApplyPalette { palette_id } => {
            session.load_from_server()?;
            session.apply_palette(&palette_id)?;
            info!(palette_id = %palette_id, "palette applied");
        }
        Command::ApplyTemplate { template_id } => {
            session.load_from_server()?;
            session.apply_template(&template_id)?;
            info!(template_id = %template_id, "template applied");
        }
    }

    Ok(())
}
