//! Shared configuration for divera tools.
//!
//! TOML profiles, access-key resolution (env + keyring + plaintext), and
//! translation to `divera_core::AccountConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
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
use tracing::debug;

use divera_core::{AccountConfig, CoreError, PollInterval, TlsMode, VehicleNameMode};

/// Keyring service name for stored access keys.
pub const KEYRING_SERVICE: &str = "divera";

/// Prefix of environment overrides, e.g. `DIVERA_DEFAULT_PROFILE`.
pub const ENV_PREFIX: &str = "DIVERA_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no access key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<CoreError> for ConfigError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, reason } => Self::Validation {
                field: field.into(),
                reason,
            },
            other => Self::Validation {
                field: "config".into(),
                reason: other.to_string(),
            },
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn active_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Poll interval in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            scan_interval: default_scan_interval(),
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
    30
}
fn default_scan_interval() -> u64 {
    PollInterval::DEFAULT_SECS
}
fn default_base_url() -> String {
    divera_core::DEFAULT_BASE_URL.into()
}

/// A named account profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Service base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Access key (plaintext, prefer keyring or env var).
    pub accesskey: Option<String>,

    /// Environment variable name containing the access key.
    pub accesskey_env: Option<String>,

    /// Cluster relations to poll. Empty polls the account default.
    #[serde(default)]
    pub ucrs: Vec<i64>,

    /// Override poll interval (seconds, 10..=300).
    pub scan_interval: Option<u64>,

    /// `auto`, `shortname`, `name` or `fullname`.
    pub vehicle_name_mode: Option<String>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Path to a custom CA certificate (self-hosted instances).
    pub ca_cert: Option<PathBuf>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            accesskey: None,
            accesskey_env: None,
            ucrs: Vec::new(),
            scan_interval: None,
            vehicle_name_mode: None,
            timeout: None,
            ca_cert: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "divera", "divera").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("divera");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

fn file_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
}

/// Load the full Config from the default file + `DIVERA_*` environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();
    debug!(path = %path.display(), "loading config");
    let figment = file_figment(&path).merge(Env::prefixed(ENV_PREFIX).split("__"));
    Ok(figment.extract()?)
}

/// Load a Config from an explicit file, without environment overrides.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(file_figment(path).extract()?)
}

/// Load config, returning a default if the file doesn't exist or is broken.
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

// ── Access-key resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/accesskey"),
    )?)
}

/// Store an access key in the system keyring for `profile_name`.
pub fn store_access_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(key)?;
    Ok(())
}

/// Resolve the access key: profile's `accesskey_env` → keyring → plaintext.
pub fn resolve_access_key(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_access_key_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        || keyring_entry(profile_name).ok()?.get_password().ok(),
    )
}

fn resolve_access_key_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's accesskey_env → env var lookup
    if let Some(value) = profile.accesskey_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(value));
    }

    // 2. System keyring
    if let Some(secret) = keyring() {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.accesskey {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to runtime config ───────────────────────────────────

/// Build an `AccountConfig` from a profile, applying defaults for unset
/// fields and validating every value.
pub fn profile_to_account_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<AccountConfig, ConfigError> {
    let access_key = resolve_access_key(profile, profile_name)?;
    build_account_config(profile, defaults, access_key)
}

/// Validate a profile and combine it with an already-resolved access key.
pub fn build_account_config(
    profile: &Profile,
    defaults: &Defaults,
    access_key: SecretString,
) -> Result<AccountConfig, ConfigError> {
    let base_url = divera_core::config::validate_base_url(&profile.base_url)?;
    let poll_interval =
        PollInterval::from_secs(profile.scan_interval.unwrap_or(defaults.scan_interval))?;
    let vehicle_name_mode = profile
        .vehicle_name_mode
        .as_deref()
        .map(VehicleNameMode::parse)
        .transpose()?
        .unwrap_or_default();
    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    Ok(AccountConfig {
        access_key,
        base_url,
        ucr_ids: profile.ucrs.clone(),
        poll_interval,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        tls,
        vehicle_name_mode,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile() -> Profile {
        Profile {
            accesskey: Some("plain".into()),
            ucrs: vec![1, 2],
            ..Profile::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.active_profile_name(), "default");
        assert_eq!(cfg.defaults.scan_interval, 60);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("wache".into(), profile());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let wache = loaded.profile("wache").unwrap();
        assert_eq!(wache.ucrs, vec![1, 2]);
        assert_eq!(wache.base_url, divera_core::DEFAULT_BASE_URL);
    }

    #[test]
    fn toml_profile_fields_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "home"

[defaults]
scan_interval = 120

[profiles.home]
base_url = "https://divera.example.org"
accesskey_env = "HOME_DIVERA_KEY"
ucrs = [42]
vehicle_name_mode = "fullname"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.active_profile_name(), "home");
        let home = cfg.profile("home").unwrap();
        assert_eq!(home.vehicle_name_mode.as_deref(), Some("fullname"));

        let account =
            build_account_config(home, &cfg.defaults, SecretString::from("k".to_string())).unwrap();
        assert_eq!(account.poll_interval.as_secs(), 120);
        assert_eq!(account.vehicle_name_mode, VehicleNameMode::Fullname);
        assert_eq!(account.ucr_ids, vec![42]);
    }

    #[test]
    fn unknown_profile_is_reported() {
        let err = Config::default().profile("nope").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(name) if name == "nope"));
    }

    #[test]
    fn out_of_range_scan_interval_is_rejected() {
        let p = Profile {
            scan_interval: Some(5),
            ..profile()
        };
        let err = build_account_config(&p, &Defaults::default(), SecretString::from("k".to_string()))
            .unwrap_err();
        assert!(
            matches!(&err, ConfigError::Validation { field, .. } if field == "scan_interval"),
            "got {err:?}"
        );
    }

    #[test]
    fn plain_http_base_url_is_rejected() {
        let p = Profile {
            base_url: "http://divera.example.org".into(),
            ..profile()
        };
        let err = build_account_config(&p, &Defaults::default(), SecretString::from("k".to_string()))
            .unwrap_err();
        assert!(matches!(&err, ConfigError::Validation { field, .. } if field == "base_url"));
    }

    #[test]
    fn bad_vehicle_name_mode_is_rejected() {
        let p = Profile {
            vehicle_name_mode: Some("nickname".into()),
            ..profile()
        };
        assert!(
            build_account_config(&p, &Defaults::default(), SecretString::from("k".to_string()))
                .is_err()
        );
    }

    #[test]
    fn access_key_chain_prefers_env_then_keyring_then_plaintext() {
        let p = Profile {
            accesskey_env: Some("KEY_VAR".into()),
            ..profile()
        };

        let from_env =
            resolve_access_key_with(&p, "x", |_| Some("env".into()), || Some("ring".into()))
                .unwrap();
        assert_eq!(from_env.expose_secret(), "env");

        let from_ring =
            resolve_access_key_with(&p, "x", |_| None, || Some("ring".into())).unwrap();
        assert_eq!(from_ring.expose_secret(), "ring");

        let from_plain = resolve_access_key_with(&p, "x", |_| None, || None).unwrap();
        assert_eq!(from_plain.expose_secret(), "plain");

        let none = Profile::default();
        let err = resolve_access_key_with(&none, "x", |_| None, || None).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }
}
