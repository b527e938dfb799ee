//! Personnel status of the account owner.

use serde::Serialize;
use tabled::Tabled;

use divera_core::{AccountConfig, actions};

use crate::cli::{GlobalOpts, StatusArgs, StatusCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct StatusEntry {
    id: i64,
    name: String,
    current: bool,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Status")]
    name: String,
    #[tabled(rename = "Current")]
    current: &'static str,
}

pub async fn handle(
    account: &AccountConfig,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = util::pulled_client(account, global).await?;

    match args.command {
        StatusCommand::List => {
            let current = client.current_user_status_name()?;
            let entries: Vec<StatusEntry> = client
                .status_names()?
                .into_iter()
                .map(|(id, name)| StatusEntry {
                    id,
                    current: current.as_deref() == Some(name.as_str()),
                    name,
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &entries,
                |e| StatusRow {
                    id: e.id,
                    name: e.name.clone(),
                    current: if e.current { "*" } else { "" },
                },
                |e| e.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StatusCommand::Set { name } => {
            let status_id = actions::set_user_state_by_name(&client, &name).await?;
            if !global.quiet {
                eprintln!("Status set to '{name}' (id {status_id})");
            }
            Ok(())
        }
    }
}
