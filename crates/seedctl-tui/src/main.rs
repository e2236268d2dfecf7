//! `seedctl-tui`: live terminal interface for Transmission daemons.
//!
//! Every listing opens as a tab that follows the daemon through the
//! shared entity cache; the `:` prompt accepts the same command lines as
//! `seedctl` and rc scripts.
//!
//! Logs go to a file (default in the user cache directory) so they never
//! corrupt the terminal.

mod action;
mod app;
mod data_bridge;
mod event;
mod outcome;
mod prompt;
mod tabs;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use seedctl_config::Config;
use seedctl_core::{RemoteClient, Session, Settings};

use crate::app::{App, Startup};

/// Watch and drive a Transmission daemon from the terminal.
#[derive(Parser, Debug)]
#[command(name = "seedctl-tui", version, about)]
struct Cli {
    /// Profile from the config file
    #[arg(short, long, env = "SEEDCTL_PROFILE")]
    profile: Option<String>,

    /// RPC URL, overriding the profile
    #[arg(short, long, env = "SEEDCTL_URL")]
    url: Option<String>,

    /// RPC username, overriding the profile
    #[arg(long, env = "SEEDCTL_USERNAME")]
    username: Option<String>,

    /// RPC password, overriding the profile
    #[arg(long, env = "SEEDCTL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Config file path
    #[arg(long, env = "SEEDCTL_CONFIG")]
    config: Option<PathBuf>,

    /// rc script to run at startup instead of the default one
    #[arg(long, conflicts_with = "no_rc")]
    rc: Option<PathBuf>,

    /// Skip the rc script
    #[arg(long)]
    no_rc: bool,

    /// Log file path
    #[arg(long, default_value_os_t = seedctl_config::log_path())]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Command line to run first; defaults to listing torrents
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// File-based tracing. Nothing may log to stdout or stderr while the
/// terminal is in raw mode. The guard must live until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "seedctl_tui={log_level},seedctl_core={log_level},seedctl_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .map_or_else(std::env::temp_dir, std::path::Path::to_path_buf);
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("seedctl-tui.log"));
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the profile, apply flag overrides, and build the session.
fn build_session(cli: &Cli) -> Result<Session> {
    let config: Config = match &cli.config {
        Some(path) => seedctl_config::load_config_from(path)?,
        None => seedctl_config::load_config()?,
    };
    let name = config.active_profile_name(cli.profile.as_deref());
    let mut profile = config.profile(&name)?;

    if let Some(ref url) = cli.url {
        profile.url.clone_from(url);
    }
    if let Some(ref username) = cli.username {
        profile.username = Some(username.clone());
    }
    if let Some(ref password) = cli.password {
        profile.password = Some(password.clone());
        profile.password_env = None;
    }

    let remote = seedctl_config::profile_to_remote(&profile, &config.defaults)?;
    let settings = Arc::new(Settings::new());
    for err in seedctl_config::seed_settings(&config, &profile, &settings) {
        warn!(error = %err, "config setting ignored");
    }
    info!(profile = %name, url = %profile.url, "starting seedctl-tui");

    let client: Arc<dyn RemoteClient> = Arc::new(remote);
    Ok(Session::new(client, settings))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks before the terminal changes mode
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let session = build_session(&cli)?;
    let rc = if cli.no_rc {
        None
    } else {
        Some(match cli.rc {
            Some(path) => (path, false),
            None => (seedctl_config::rc_path(), true),
        })
    };

    let mut app = App::new(
        session,
        Startup {
            rc,
            command: cli.command,
        },
    );
    app.run().await
}
