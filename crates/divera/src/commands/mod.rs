//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod entities;
pub mod onboard;
pub mod probe_alarm;
pub mod show;
pub mod status;
pub mod util;
pub mod watch;

use divera_core::AccountConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an account-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    account: &AccountConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Show => show::handle(account, global).await,
        Command::Entities(args) => entities::handle(account, args, global).await,
        Command::Watch(args) => watch::handle(account, args, global).await,
        Command::Status(args) => status::handle(account, args, global).await,
        Command::ProbeAlarm => probe_alarm::handle(account, global).await,
        Command::Onboard(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Internal {
                message: "command does not need an account and is handled before dispatch".into(),
            })
        }
    }
}
