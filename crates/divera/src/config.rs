//! Bridges the shared `divera-config` crate and CLI flag overrides.
//!
//! Core never sees CLI types; it receives a finished `AccountConfig`.

use secrecy::SecretString;

use divera_config::{Config, Profile};
use divera_core::AccountConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use divera_config::{config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Build an `AccountConfig` from the config file, profile, and CLI overrides.
///
/// Flags win over the profile; without a profile the access key must come
/// from `--accesskey` / `DIVERA_ACCESSKEY`.
pub fn build_account_config(global: &GlobalOpts) -> Result<AccountConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let stored = cfg.profiles.get(&profile_name);
    if stored.is_none() {
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        if global.accesskey.is_none() {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    }

    let profile = apply_overrides(stored.cloned().unwrap_or_default(), global);
    let access_key = match global.accesskey {
        Some(ref key) => SecretString::from(key.clone()),
        None => divera_config::resolve_access_key(&profile, &profile_name)?,
    };

    Ok(divera_config::build_account_config(
        &profile,
        &cfg.defaults,
        access_key,
    )?)
}

fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref url) = global.base_url {
        profile.base_url.clone_from(url);
    }
    if !global.ucrs.is_empty() {
        profile.ucrs.clone_from(&global.ucrs);
    }
    if global.scan_interval.is_some() {
        profile.scan_interval = global.scan_interval;
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    profile
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}
