//! casetrail: merged Notes and Emails timeline for a CRM record.
//!
//! Main entry point for the casetrail CLI.

use std::path::Path;

use clap::Parser;
use tracing::{error, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use casetrail_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use casetrail_core::parse_date;

mod cli;
mod cmd_generate;

use cli::{Cli, Commands};
use cmd_generate::handle_generate;

/// Initialize tracing with console output and, when enabled, a daily
/// rotating log file under the configured log directory.
///
/// `RUST_LOG` overrides the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = if logging.file {
        std::fs::create_dir_all(&logging.log_dir)?;
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("casetrail")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&logging.log_dir)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keeps the writer flushing until the process exits.
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Fail on validation errors; log warnings.
fn validate_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let warnings = ConfigValidator::validate(config).into_result()?;
    for warning in warnings {
        warn!("Configuration {}: {}", warning.path, warning.message);
    }
    Ok(())
}

/// Render the parse result the way report data carries it.
fn format_parsed_date(text: &str) -> String {
    match parse_date(text) {
        Some(instant) => instant.to_rfc3339(),
        None => "null".to_string(),
    }
}

fn check_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_or_default(path)?;
    let result = ConfigValidator::validate(&config);

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if result.is_valid() {
        println!("{}: OK", path.display());
        Ok(())
    } else {
        Err(format!("{}: {} error(s)", path.display(), result.errors.len()).into())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ParseDate { text } => {
            println!("{}", format_parsed_date(&text));
            Ok(())
        }
        Commands::CheckConfig => check_config(&cli.config),
        Commands::Generate {
            record_url,
            output,
            no_open,
        } => {
            let config = ConfigLoader::load_or_default(&cli.config)?;
            init_tracing(&config.logging)?;
            validate_config(&config)?;

            handle_generate(&config, &record_url, output, no_open)
                .await
                .inspect_err(|e| error!("Report generation failed: {}", e))
        }
    }
}
