//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use divera_core::{AccountConfig, Client, SubscriptionGroup};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, refuses instead of hanging.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Spinner on stderr while a network call runs. Hidden in quiet mode.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Start one coordinator per configured subscription and wait for every
/// first refresh.
pub async fn start_group(
    account: &AccountConfig,
    global: &GlobalOpts,
) -> Result<SubscriptionGroup, CliError> {
    let bar = spinner("Pulling from DIVERA...", global.quiet);
    let result = SubscriptionGroup::setup(account).await;
    bar.finish_and_clear();
    Ok(result?)
}

/// A client for the first configured subscription, with its first pull done.
pub async fn pulled_client(
    account: &AccountConfig,
    global: &GlobalOpts,
) -> Result<Client, CliError> {
    let subscription = account
        .subscriptions()
        .into_iter()
        .next()
        .ok_or_else(|| CliError::Internal {
            message: "no subscription configured".into(),
        })?;
    let client = Client::from_config(&subscription)?;

    let bar = spinner("Pulling from DIVERA...", global.quiet);
    let result = client.pull().await;
    bar.finish_and_clear();
    result?;
    Ok(client)
}

/// `"<ucr>"`, or `"default"` for the account's default relation.
pub fn ucr_label(ucr_id: Option<i64>) -> String {
    ucr_id.map_or_else(|| "default".to_owned(), |id| id.to_string())
}
