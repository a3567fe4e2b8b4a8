use chrono::Local;
use log::{error, info, warn, LevelFilter};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use thiserror::Error;
use vmaf_cli::cli;
use vmaf_cli::settings::Settings;

const LOG_ENV: &str = "VMAF_CLI_LOG";

/// Failures of the front end after the arguments were accepted.
#[derive(Error, Debug)]
enum RunError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path \"{}\" is not valid UTF-8 and cannot be written as JSON", .0.display())]
    NonUnicodePath(PathBuf),
}

fn main() -> ExitCode {
    // Logging first so argument diagnostics are traced too
    if let Err(e) = setup_logging() {
        eprintln!("Error setting up logging: {}", e);
        return ExitCode::FAILURE;
    }

    // Exits with status 1 on invalid arguments
    let settings = cli::parse_args();
    info!("Parsed settings: {:?}", settings);

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to emit settings: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up logging to stderr; stdout is reserved for the settings document.
fn setup_logging() -> Result<(), log::SetLoggerError> {
    let requested = env::var(LOG_ENV).ok();
    let parsed = requested.as_deref().map(LevelFilter::from_str);
    let level = match &parsed {
        Some(Ok(level)) => *level,
        _ => LevelFilter::Warn,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()?;

    if let Some(Err(_)) = parsed {
        warn!(
            "Ignoring invalid {} value {:?}, logging at warn",
            LOG_ENV,
            requested.unwrap_or_default()
        );
    }
    Ok(())
}

/// Prints the version, or the settings as JSON with the thread count resolved.
fn run(settings: &Settings) -> Result<(), RunError> {
    if settings.version {
        println!("{} {}", env!("CARGO_BIN_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // JSON strings cannot carry these bytes, and a lossy copy would name another file
    let paths = [&settings.reference, &settings.distorted];
    if let Some(path) = paths
        .into_iter()
        .chain(&settings.models)
        .find(|path| path.to_str().is_none())
    {
        return Err(RunError::NonUnicodePath(path.clone()));
    }

    let resolved = Settings {
        threads: settings.effective_threads(),
        ..settings.clone()
    };
    info!(
        "Reference: {}, distorted: {}, {} model(s), {} feature(s), {} thread(s)",
        resolved.reference.display(),
        resolved.distorted.display(),
        resolved.models.len(),
        resolved.features.len(),
        resolved.threads
    );

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &resolved)?;
    writeln!(stdout)?;
    Ok(())
}
