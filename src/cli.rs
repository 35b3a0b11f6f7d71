//! Command line interface
//!
//! Flags given on the command line override the loaded [`RelayConfig`].

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RelayConfig;
use crate::recording::GapPolicy;
use crate::types::ChannelSelection;

#[derive(Parser, Debug)]
#[command(
    name = "opensignals-relay",
    version,
    about = "Replay OpenSignals recordings to an OSC server",
    long_about = "Replay OpenSignals (r)evolution text recordings as normalized OSC samples.\n\
                  Recordings are resampled to the playback frequency and streamed over UDP."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one or more recordings to the OSC server
    Play(PlayArgs),
    /// Show the header of a recording
    Info(InfoArgs),
}

#[derive(Args, Debug, Default)]
pub struct PlayArgs {
    /// Recording files; defaults to `recordings` from the config file
    pub files: Vec<PathBuf>,

    /// Config file (default: platform config directory)
    #[arg(short, long, env = "OPENSIGNALS_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// OSC server host
    #[arg(long)]
    pub host: Option<String>,

    /// OSC server port
    #[arg(long)]
    pub port: Option<u16>,

    /// OSC address for single-channel samples
    #[arg(long)]
    pub address: Option<String>,

    /// Playback frequency in Hz
    #[arg(short, long)]
    pub frequency: Option<f64>,

    /// Play each recording once instead of looping
    #[arg(long, default_value_t = false)]
    pub no_loop: bool,

    /// Channel to forward: `primary`, `all`, or a channel name
    #[arg(long)]
    pub channel: Option<String>,

    /// Empty window handling when upsampling: `carry-forward` or `omit`
    #[arg(long, value_parser = parse_gap_policy)]
    pub gap_policy: Option<GapPolicy>,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Recording file
    pub file: PathBuf,

    /// JSON output
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

fn parse_gap_policy(value: &str) -> std::result::Result<GapPolicy, String> {
    match value {
        "carry-forward" => Ok(GapPolicy::CarryForward),
        "omit" => Ok(GapPolicy::Omit),
        other => Err(format!(
            "unknown gap policy {:?}, expected carry-forward or omit",
            other
        )),
    }
}

impl PlayArgs {
    /// Apply these flags on top of `config`
    pub fn apply(&self, config: &mut RelayConfig) {
        if !self.files.is_empty() {
            config.recordings = self.files.clone();
        }
        if let Some(host) = &self.host {
            config.sink.host = host.clone();
        }
        if let Some(port) = self.port {
            config.sink.port = port;
        }
        if let Some(address) = &self.address {
            config.sink.address = address.clone();
        }
        if let Some(frequency) = self.frequency {
            config.playback.frequency_hz = frequency;
        }
        if self.no_loop {
            config.playback.loop_enabled = false;
        }
        if let Some(channel) = &self.channel {
            config.playback.channels = ChannelSelection::parse(channel);
        }
        if let Some(policy) = self.gap_policy {
            config.playback.gap_policy = policy;
        }
    }
}

/// Log filter for a `-v` count
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info,opensignals_relay=debug",
        1 => "debug",
        _ => "trace",
    }
}
