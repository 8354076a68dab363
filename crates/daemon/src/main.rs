// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tempo daemon (tempod)
//!
//! Loads the job config, restores saved job state, and runs the single
//! event loop that fires timers and handles action results. SIGHUP
//! reloads the job config.

use std::path::PathBuf;

use tempo_daemon::env::VERSION;
use tempo_daemon::{check_config, lifecycle, Config, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {}
        Some("--version" | "-V" | "-v") => {
            println!("tempod {VERSION}");
            return Ok(());
        }
        Some("--help" | "-h" | "help") => {
            print_help();
            return Ok(());
        }
        Some("--check") => {
            let Some(path) = args.get(1) else {
                eprintln!("error: --check requires a config path");
                std::process::exit(2);
            };
            std::process::exit(run_check(PathBuf::from(path)));
        }
        Some(arg) => {
            eprintln!("error: unexpected argument '{arg}'");
            eprintln!("Usage: tempod [--check <config> | --help | --version]");
            std::process::exit(2);
        }
    }

    let config = Config::load()?;
    let log_guard = setup_logging(&config)?;

    info!(state_dir = %config.state_dir.display(), "starting daemon");

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path).unwrap_or_default();
            eprintln!("tempod is already running");
            if !pid.trim().is_empty() {
                eprintln!("  pid: {}", pid.trim());
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "failed to start daemon");
            eprintln!("error: {e}");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;

    // NOTE: Must be created outside the loop; select! re-evaluates its
    // branches every iteration, and a fresh sleep would never fire while
    // events keep arriving.
    let mut timer_check = tokio::time::interval(config.timer_check);

    info!("daemon ready");
    println!("READY");

    loop {
        tokio::select! {
            Some(event) = daemon.event_rx.recv() => {
                if let Err(e) = daemon.process_event(event).await {
                    error!(error = %e, "error processing event");
                }
            }

            _ = timer_check.tick() => {
                daemon.fire_timers().await;
            }

            _ = sighup.recv() => {
                info!("received SIGHUP, reloading configuration");
                if let Err(e) = daemon.reload_config().await {
                    error!(error = %e, "reload failed, keeping current configuration");
                }
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    daemon.shutdown().await?;
    info!("daemon stopped");
    Ok(())
}

/// Validate a config document and print the outcome. Returns the exit code.
fn run_check(path: PathBuf) -> i32 {
    let default_tz = match tempo_daemon::env::time_zone().map(|name| tempo_config::parse_time_zone(&name)).transpose() {
        Ok(tz) => tz,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    match check_config(&path, default_tz) {
        Ok(report) => {
            for (job, error) in &report.errors {
                eprintln!("job '{job}': {error}");
            }
            if report.is_ok() {
                println!("ok: {} jobs", report.jobs.len());
                0
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

fn print_help() {
    println!("tempod {VERSION}");
    println!("Job scheduler daemon - runs jobs on schedules and dependencies");
    println!();
    println!("USAGE:");
    println!("    tempod [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("        --check <config>    Validate a job config file and exit");
    println!("    -h, --help              Print help information");
    println!("    -v, --version           Print version information");
    println!();
    println!("SIGNALS:");
    println!("    SIGHUP                  Reload the job config");
    println!("    SIGTERM, SIGINT         Shut down");
    println!();
    println!("ENVIRONMENT:");
    println!("    TEMPO_STATE_DIR         State directory (default ~/.local/state/tempo)");
    println!("    TEMPO_CONFIG            Job config file (default <state dir>/jobs.toml)");
    println!("    TEMPO_TIMER_CHECK_MS    Timer resolution in milliseconds (default 1000)");
    println!("    TEMPO_TIME_ZONE         Default zone for calendar schedules");
    println!("    RUST_LOG                Log filter (default info)");
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
