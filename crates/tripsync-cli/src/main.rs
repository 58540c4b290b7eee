//! tripsync entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use tripsync_cli::cli::{Cli, Command, ConfigAction};
use tripsync_cli::config::{FileConfig, Settings};
use tripsync_cli::error::{ClientError, ClientResult};
use tripsync_cli::commands;
use tripsync_core::{TracingConfig, init_tracing};
use tripsync_daemon::{DaemonConfig, Scheduler, SchedulerConfig, SignalHandler, SyncPass};
use tripsync_providers::google::{GoogleCalendarTarget, GoogleConfig, ServiceAccountKey};
use tripsync_providers::tripit::{TripItConfig, TripItSource};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let file = if let Some(ref path) = cli.config {
        FileConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        FileConfig::load().map_err(ClientError::Config)?
    };

    match cli.command {
        Some(Command::Config { ref action }) => match action {
            ConfigAction::Dump => commands::config_dump(&file),
            ConfigAction::Validate => commands::config_validate(&cli, &file),
            ConfigAction::Path => commands::config_path(),
        },
        None => sync(&cli, &file).await,
    }
}

async fn sync(cli: &Cli, file: &FileConfig) -> ClientResult<()> {
    let settings = Settings::resolve(cli, file)?;

    let source = TripItSource::new(TripItConfig::new(
        settings.tripit_username.as_str(),
        settings.tripit_token.as_str(),
    ))?;

    let key = ServiceAccountKey::from_file(&settings.google_keyfile)?;
    let target = GoogleCalendarTarget::new(GoogleConfig::new(key))?;

    let daemon_config = DaemonConfig::new(settings.calendar_id.as_str())
        .with_poll_interval(settings.poll_interval)
        .with_run_once(settings.run_once)
        .with_include_past(settings.include_past)
        .with_apply_concurrency(settings.apply_concurrency);
    daemon_config.validate()?;

    let pass = Arc::new(SyncPass::new(
        Arc::new(source),
        Arc::new(target),
        daemon_config,
    ));

    if settings.run_once {
        let report = pass.run().await?;
        println!("{}", report);
        return Ok(());
    }

    let signals = SignalHandler::new();
    signals.spawn_listener();

    let scheduler = Scheduler::new(SchedulerConfig::new(settings.poll_interval));
    let handle = scheduler.handle();

    let shutdown = signals.shutdown();
    tokio::spawn(async move {
        shutdown.wait().await;
        let _ = handle.stop().await;
    });

    info!(
        calendar = %settings.calendar_id,
        interval_secs = settings.poll_interval.as_secs(),
        "starting itinerary sync daemon"
    );

    scheduler
        .run(move || {
            let pass = pass.clone();
            async move { pass.run().await }
        })
        .await;

    Ok(())
}
