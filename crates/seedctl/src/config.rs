//! CLI configuration: thin wrapper around `seedctl_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --username, --password, ...).

use std::sync::Arc;

use seedctl_config::{Config, Profile};
use seedctl_core::{RemoteClient, Session, Settings};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file named by `--config`, or the default one.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = match &global.config {
        Some(path) => seedctl_config::load_config_from(path)?,
        None => seedctl_config::load_config()?,
    };
    Ok(config)
}

/// Resolve the active profile and layer CLI flag overrides on top.
pub fn resolve_profile(config: &Config, global: &GlobalOpts) -> Result<Profile, CliError> {
    let name = config.active_profile_name(global.profile.as_deref());
    let mut profile = config.profile(&name).map_err(|_| {
        let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        CliError::ProfileNotFound {
            name: name.clone(),
            available: if names.is_empty() {
                "(none)".into()
            } else {
                names.join(", ")
            },
            path: global
                .config
                .clone()
                .unwrap_or_else(seedctl_config::config_path)
                .display()
                .to_string(),
        }
    })?;

    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(ref password) = global.password {
        profile.password = Some(password.clone());
        profile.password_env = None;
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    Ok(profile)
}

/// Build a session against the resolved profile. Settings come from the
/// profile and the `[settings]` table; invalid entries only warn.
pub fn build_session(config: &Config, profile: &Profile) -> Result<Session, CliError> {
    let remote = seedctl_config::profile_to_remote(profile, &config.defaults)?;
    tracing::debug!(url = %profile.url, "connecting");

    let settings = Arc::new(Settings::new());
    for err in seedctl_config::seed_settings(config, profile, &settings) {
        tracing::warn!(error = %err, "config setting ignored");
    }

    let client: Arc<dyn RemoteClient> = Arc::new(remote);
    Ok(Session::new(client, settings))
}
