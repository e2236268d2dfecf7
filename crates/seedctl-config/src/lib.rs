//! Shared configuration for the seedctl CLI and TUI.
//!
//! TOML profiles, password resolution (env + plaintext), the `[settings]`
//! table that seeds core `Settings`, and translation of a profile into a
//! connected `TransmissionRemote`. Both binaries depend on this crate; the
//! CLI layers its global flags on top.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use seedctl_api::{Credentials, RpcClient, TlsMode, TransportConfig};
use seedctl_core::{CoreError, Settings, TransmissionRemote};

/// Environment variable prefix for config overrides and the password.
pub const ENV_PREFIX: &str = "SEEDCTL_";

/// Daemon URL used when a profile names none.
pub const DEFAULT_URL: &str = "http://localhost:9091/transmission/rpc";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("could not build RPC client: {0}")]
    Client(#[from] seedctl_api::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named daemon profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Initial values for core settings (`"poll.interval" = 2`).
    #[serde(default)]
    pub settings: BTreeMap<String, toml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
            settings: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up `name`. The implicit "default" profile resolves to a
    /// localhost profile when the file does not define it.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }

    /// The `[settings]` table as `(name, raw value)` pairs.
    pub fn setting_pairs(&self) -> Vec<(String, String)> {
        self.settings
            .iter()
            .map(|(name, value)| (name.clone(), setting_text(value)))
            .collect()
    }
}

/// Render a TOML value the way the settings parser expects it. Arrays
/// become comma-separated lists.
fn setting_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items
            .iter()
            .map(setting_text)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}

/// A named daemon profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Daemon RPC URL (a bare `http://host:9091` gets the RPC path appended).
    #[serde(default = "default_url")]
    pub url: String,

    /// Username for RPC basic auth.
    pub username: Option<String>,

    /// Password (plaintext, prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout, in seconds.
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_url() -> String {
    DEFAULT_URL.into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "seedctl", "seedctl")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("seedctl");
    p
}

fn config_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.config_dir().to_path_buf())
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default rc script, run at startup unless disabled.
pub fn rc_path() -> PathBuf {
    config_dir().join("rc")
}

/// Default TUI log file.
pub fn log_path() -> PathBuf {
    project_dirs().map_or_else(
        || std::env::temp_dir().join("seedctl-tui.log"),
        |dirs| dirs.cache_dir().join("seedctl-tui.log"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + `SEEDCTL_` environment. Nested keys use `__`
/// (`SEEDCTL_DEFAULTS__OUTPUT=json`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the RPC password: `password_env`, then `SEEDCTL_PASSWORD`,
/// then plaintext in the profile. `None` when nothing is configured.
pub fn resolve_password(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}PASSWORD")) {
        return Some(SecretString::from(val));
    }

    profile.password.clone().map(SecretString::from)
}

/// Basic-auth credentials, when the profile names a user.
pub fn resolve_credentials(profile: &Profile) -> Option<Credentials> {
    let username = profile.username.clone()?;
    Some(Credentials {
        username,
        password: resolve_password(profile),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse and check a daemon URL.
pub fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("unsupported scheme '{other}' (expected http or https)"),
        }),
    }
}

/// Transport settings for a profile, with `defaults` filling the gaps.
pub fn profile_transport(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        credentials: resolve_credentials(profile),
    }
}

/// Build a `TransmissionRemote` from a profile, no CLI overrides.
pub fn profile_to_remote(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<TransmissionRemote, ConfigError> {
    let url = parse_url(&profile.url)?;
    let rpc = RpcClient::new(url, &profile_transport(profile, defaults))?;
    Ok(TransmissionRemote::new(rpc))
}

/// Seed `settings` from the profile and the `[settings]` table. Invalid
/// entries are skipped and returned.
pub fn seed_settings(config: &Config, profile: &Profile, settings: &Settings) -> Vec<CoreError> {
    let mut errors = Vec::new();
    if let Err(e) = settings.set("connect.url", &profile.url) {
        errors.push(e);
    }
    if let Some(timeout) = profile.timeout {
        if let Err(e) = settings.set("connect.timeout", &timeout.to_string()) {
            errors.push(e);
        }
    }
    for (name, raw) in config.setting_pairs() {
        if let Err(e) = settings.set(&name, &raw) {
            tracing::warn!(setting = %name, error = %e, "ignoring invalid [settings] entry");
            errors.push(e);
        }
    }
    errors
}
