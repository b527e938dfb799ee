//! Probe (test) alarm.

use divera_core::{AccountConfig, Client, actions};

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::util;

pub async fn handle(account: &AccountConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(subscription) = account.subscriptions().into_iter().next() else {
        return Ok(());
    };
    let target = util::ucr_label(subscription.ucr_id);

    if !util::confirm(
        &format!("Send a probe alarm to cluster relation {target}? Members will be notified."),
        "probe-alarm",
        global.yes,
    )? {
        return Ok(());
    }

    let client = Client::from_config(&subscription)?;
    actions::trigger_probe_alarm(&client).await?;
    if !global.quiet {
        eprintln!("Probe alarm sent ({target})");
    }
    Ok(())
}
