//! Config subcommand handlers.

use std::fmt::Write as _;
use std::io::IsTerminal;

use serde::Serialize;
use tabled::Tabled;

use divera_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Format config for display, masking the access key.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "scan_interval = {}", cfg.defaults.scan_interval);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "base_url = \"{}\"", p.base_url);
        if p.accesskey.is_some() {
            let _ = writeln!(out, "accesskey = \"****\"");
        }
        if let Some(ref env) = p.accesskey_env {
            let _ = writeln!(out, "accesskey_env = \"{env}\"");
        }
        if !p.ucrs.is_empty() {
            let ucrs: Vec<String> = p.ucrs.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "ucrs = [{}]", ucrs.join(", "));
        }
        if let Some(secs) = p.scan_interval {
            let _ = writeln!(out, "scan_interval = {secs}");
        }
        if let Some(ref mode) = p.vehicle_name_mode {
            let _ = writeln!(out, "vehicle_name_mode = \"{mode}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
    }

    out.trim_end().to_owned()
}

#[derive(Debug, Serialize)]
struct ProfileSummary {
    name: String,
    default: bool,
    base_url: String,
    ucrs: Vec<i64>,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Base URL")]
    base_url: String,
    #[tabled(rename = "UCRs")]
    ucrs: String,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let active = cfg.active_profile_name().to_owned();
            let profiles: Vec<ProfileSummary> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileSummary {
                    name: name.clone(),
                    default: *name == active,
                    base_url: p.base_url.clone(),
                    ucrs: p.ucrs.clone(),
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &profiles,
                |p| ProfileRow {
                    marker: if p.default { "*" } else { "" },
                    name: p.name.clone(),
                    base_url: p.base_url.clone(),
                    ucrs: if p.ucrs.is_empty() {
                        "default".into()
                    } else {
                        p.ucrs.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
                    },
                },
                |p| p.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetKey { name } => {
            let cfg = config::load_config_or_default();
            let profile_name = name.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            let key = match global.accesskey {
                Some(ref key) => key.clone(),
                None if std::io::stdin().is_terminal() => {
                    rpassword::prompt_password("Access key: ")?
                }
                None => {
                    return Err(CliError::NoCredentials {
                        profile: profile_name,
                    });
                }
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "accesskey".into(),
                    reason: "access key cannot be empty".into(),
                });
            }

            divera_config::store_access_key(&profile_name, key)?;
            if !global.quiet {
                eprintln!("Access key for '{profile_name}' stored in system keyring");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use divera_config::Profile;

    use super::*;

    #[test]
    fn redacted_config_hides_access_key() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "wache".into(),
            Profile {
                accesskey: Some("super-secret".into()),
                ucrs: vec![12, 34],
                ..Profile::default()
            },
        );
        let text = format_config_redacted(&cfg);
        assert!(!text.contains("super-secret"));
        assert!(text.contains("accesskey = \"****\""));
        assert!(text.contains("ucrs = [12, 34]"));
    }
}
