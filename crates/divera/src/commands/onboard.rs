//! Interactive onboarding: verify an access key, choose cluster relations,
//! and write a profile.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::MultiSelect;
use secrecy::SecretString;

use divera_config::Profile;
use divera_core::{AccountOverview, PollInterval, TlsMode, TransportConfig, onboarding};

use crate::cli::{GlobalOpts, OnboardArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn read_access_key(global: &GlobalOpts, profile_name: &str) -> Result<String, CliError> {
    if let Some(ref key) = global.accesskey {
        return Ok(key.clone());
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    }
    let key = rpassword::prompt_password("Access key: ").map_err(prompt_err)?;
    let key = key.trim().to_owned();
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "accesskey".into(),
            reason: "access key cannot be empty".into(),
        });
    }
    Ok(key)
}

/// Cluster names from the flags, or picked interactively when the account
/// has more than one relation.
fn choose_clusters(args: &OnboardArgs, overview: &AccountOverview) -> Result<Vec<String>, CliError> {
    if !args.clusters.is_empty()
        || !overview.has_multiple_clusters()
        || !std::io::stdin().is_terminal()
    {
        return Ok(args.clusters.clone());
    }

    let names = overview.cluster_names();
    let defaults: Vec<bool> = overview
        .clusters
        .iter()
        .map(|c| Some(c.ucr_id) == overview.default_ucr)
        .collect();
    let picked = MultiSelect::new()
        .with_prompt("Clusters to subscribe to")
        .items(&names)
        .defaults(&defaults)
        .interact()
        .map_err(prompt_err)?;
    Ok(picked
        .into_iter()
        .filter_map(|i| names.get(i).map(|n| (*n).to_owned()))
        .collect())
}

fn describe(overview: &AccountOverview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "User:     {}", overview.full_name);
    if let Some(ref email) = overview.email {
        let _ = writeln!(out, "E-mail:   {email}");
    }
    let _ = writeln!(out, "Version:  {}", overview.cluster_version);
    let _ = writeln!(out, "Clusters:");
    for cluster in &overview.clusters {
        let marker = if Some(cluster.ucr_id) == overview.default_ucr {
            " (default)"
        } else {
            ""
        };
        let _ = writeln!(out, "  {:>8}  {}{marker}", cluster.ucr_id, cluster.name);
    }
    out.trim_end().to_owned()
}

pub async fn handle(args: OnboardArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile_name = args
        .name
        .clone()
        .or_else(|| global.profile.clone())
        .unwrap_or_else(|| "default".into());

    let base_url_str = global
        .base_url
        .clone()
        .unwrap_or_else(|| divera_core::DEFAULT_BASE_URL.into());
    let base_url = divera_core::config::validate_base_url(&base_url_str)?;
    if let Some(secs) = global.scan_interval {
        PollInterval::from_secs(secs)?;
    }
    let access_key = read_access_key(global, &profile_name)?;
    let transport = TransportConfig {
        tls: TlsMode::System,
        timeout: Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout)),
    };

    let bar = util::spinner("Checking access key...", global.quiet);
    let probed = onboarding::probe_account(
        SecretString::from(access_key.clone()),
        base_url,
        &transport,
    )
    .await;
    bar.finish_and_clear();
    let overview = probed?;

    if !overview.supported {
        return Err(CliError::UnsupportedAccount);
    }

    let out = output::render_single(&global.output, &overview, describe, |o| {
        o.full_name.clone()
    })?;
    output::print_output(&out, global.quiet);

    let names = choose_clusters(&args, &overview)?;
    let ucrs = overview.select_clusters(&names)?;

    if args.dry_run {
        return Ok(());
    }

    let accesskey = if args.plaintext {
        Some(access_key)
    } else {
        divera_config::store_access_key(&profile_name, &access_key).map_err(|e| {
            CliError::Config {
                message: format!("{e} (use --plaintext to store the key in the config file)"),
            }
        })?;
        None
    };

    let profile = Profile {
        base_url: base_url_str,
        accesskey,
        ucrs,
        scan_interval: global.scan_interval,
        ..Profile::default()
    };
    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(profile_name.clone());
    }
    cfg.profiles.insert(profile_name.clone(), profile);
    config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!(
            "Profile '{profile_name}' saved to {}",
            config::config_path().display()
        );
    }
    Ok(())
}
