//! OpenSignals Relay - Main Entry Point
//!
//! Streams OpenSignals recordings to an OSC server, one isolated playback per
//! file, until every recording ends or Ctrl-C is pressed.

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use opensignals_relay::{
    cli::{self, Cli, Command, InfoArgs, PlayArgs},
    config::LoggingSettings,
    playback::{play_file, StopSignal},
    recording::{parse_file, RecordingMetadata},
    sink::OscSink,
    RelayConfig,
};

const SUCCESS: i32 = 0;
const EXECUTION_ERROR: i32 = 1;
const CONFIG_ERROR: i32 = 2;
const INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.command {
        Command::Play(args) => match load_config(args) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(CONFIG_ERROR);
            }
        },
        Command::Info(_) => RelayConfig::default(),
    };

    // Buffered file logs are flushed when the guard drops
    let guard = match init_logging(cli.verbose, &config.logging, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(CONFIG_ERROR);
        }
    };

    if let Command::Play(args) = &cli.command {
        match RelayConfig::resolve_path(args.config.as_deref()) {
            Some(path) => tracing::debug!("Loaded config from {:?}", path),
            None => tracing::debug!("No config file found, using defaults"),
        }
    }

    let result = match cli.command {
        Command::Play(_) => play(config).await,
        Command::Info(args) => info(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            EXECUTION_ERROR
        }
    };
    drop(guard);
    std::process::exit(exit_code);
}

fn load_config(args: &PlayArgs) -> anyhow::Result<RelayConfig> {
    let mut config = RelayConfig::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn init_logging(
    verbose: u8,
    settings: &LoggingSettings,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let directive = match (&settings.filter, verbose) {
        (Some(filter), 0) => filter.as_str(),
        _ => cli::log_filter(verbose),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let (file_layer, guard) = match log_file.or(settings.file.as_deref()) {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log file {:?} has no file name", path))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {:?}", dir))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn play(config: RelayConfig) -> anyhow::Result<i32> {
    if config.recordings.is_empty() {
        bail!("no recordings to play: pass files or set `recordings` in the config file");
    }

    tracing::info!(
        "Relaying {} recording(s) to {}{} at {} Hz",
        config.recordings.len(),
        config.sink.socket_addr(),
        config.sink.address,
        config.playback.frequency_hz
    );

    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if stop.stop() {
                    tracing::warn!("Second Ctrl-C received, exiting");
                    std::process::exit(INTERRUPTED);
                }
                tracing::info!("Ctrl-C received, stopping playback (press again to exit)");
            }
        });
    }

    let mut handles = Vec::new();
    for path in &config.recordings {
        let path = path.clone();
        let sink_settings = config.sink.clone();
        let playback = config.playback.clone();
        let stop = stop.clone();
        let handle = tokio::task::spawn_blocking({
            let path = path.clone();
            move || -> opensignals_relay::Result<_> {
                let sink = OscSink::connect(sink_settings.socket_addr(), sink_settings.address)?;
                play_file(&path, &playback, sink, stop)
            }
        });
        handles.push((path, handle));
    }

    let mut failures = 0;
    for (path, handle) in handles {
        match handle.await {
            Ok(Ok(stats)) => tracing::info!(
                "{:?}: {} ticks, {:.1}% delivered, {} loops, {:.2} Hz effective",
                path,
                stats.ticks,
                stats.success_rate(),
                stats.loops,
                stats.effective_rate()
            ),
            Ok(Err(e)) => {
                failures += 1;
                tracing::error!("{}", e);
            }
            Err(e) => {
                failures += 1;
                tracing::error!("Playback task for {:?} failed: {}", path, e);
            }
        }
    }

    Ok(if failures == 0 { SUCCESS } else { EXECUTION_ERROR })
}

#[derive(Serialize)]
struct InfoOutput {
    path: PathBuf,
    rows: usize,
    duration_secs: f64,
    value_limits: Vec<i64>,
    #[serde(flatten)]
    metadata: RecordingMetadata,
}

fn info(args: InfoArgs) -> anyhow::Result<i32> {
    let (metadata, series) = parse_file(&args.file)?;
    let output = InfoOutput {
        path: args.file,
        rows: series.len(),
        duration_secs: series.len() as f64 / metadata.sampling_rate,
        value_limits: metadata.value_limits(),
        metadata,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(SUCCESS);
    }

    let meta = &output.metadata;
    println!("File: {}", output.path.display());
    match &meta.device_name {
        Some(name) if name != &meta.device_id => println!("Device: {} ({})", meta.device_id, name),
        _ => println!("Device: {}", meta.device_id),
    }
    if let Some(started) = meta.started_at {
        println!("Started: {}", started);
    }
    println!("Sampling rate: {} Hz", meta.sampling_rate);
    println!("Rows: {} ({:.2}s)", output.rows, output.duration_secs);
    println!();
    println!("Channels:");
    for (i, name) in meta.channel_names.iter().enumerate() {
        let marker = if i == meta.primary_channel() { " *" } else { "" };
        println!(
            "  {:<16} {:>2} bits  limit {}{}",
            name, meta.resolution_bits[i], output.value_limits[i], marker
        );
    }
    if !meta.extra_devices.is_empty() {
        println!();
        println!("Ignored devices: {}", meta.extra_devices.join(", "));
    }
    Ok(SUCCESS)
}
