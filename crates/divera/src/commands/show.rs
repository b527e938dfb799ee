//! Account summary: one row per polled subscription.

use serde::Serialize;
use tabled::Tabled;

use divera_core::{AccountConfig, Coordinator, Snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct SubscriptionSummary {
    ucr_id: Option<i64>,
    cluster: String,
    version: String,
    user: String,
    user_status: Option<String>,
    helpers: usize,
    vehicles: usize,
    open_alarm: bool,
    last_alarm: Option<String>,
    status_counts: Vec<(String, usize)>,
    refresh_state: String,
}

impl SubscriptionSummary {
    fn new(coordinator: &Coordinator, snapshot: &Snapshot) -> Self {
        let cluster = coordinator
            .ucr_id()
            .and_then(|id| snapshot.cluster_name(id))
            .map(str::to_owned)
            .or_else(|| snapshot.active_cluster.name.clone())
            .unwrap_or_default();
        Self {
            ucr_id: coordinator.ucr_id(),
            cluster,
            version: snapshot.cluster_version().to_string(),
            user: snapshot.full_name(),
            user_status: snapshot.current_user_status_name().map(str::to_owned),
            helpers: snapshot.helpers.len(),
            vehicles: snapshot.vehicles.len(),
            open_alarm: snapshot.has_open_alarms(),
            last_alarm: snapshot.last_alarm().map(|a| a.title.clone()),
            status_counts: snapshot.status_counts().into_iter().collect(),
            refresh_state: coordinator.state().to_string(),
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "UCR")]
    ucr: String,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Helpers")]
    helpers: usize,
    #[tabled(rename = "Vehicles")]
    vehicles: usize,
    #[tabled(rename = "Alarm")]
    alarm: String,
}

impl From<&SubscriptionSummary> for SummaryRow {
    fn from(s: &SubscriptionSummary) -> Self {
        Self {
            ucr: util::ucr_label(s.ucr_id),
            cluster: s.cluster.clone(),
            version: s.version.clone(),
            user: s.user.clone(),
            status: s.user_status.clone().unwrap_or_default(),
            helpers: s.helpers,
            vehicles: s.vehicles,
            alarm: match (&s.last_alarm, s.open_alarm) {
                (Some(title), true) => format!("OPEN: {title}"),
                (Some(title), false) => title.clone(),
                (None, _) => "-".into(),
            },
        }
    }
}

pub async fn handle(account: &AccountConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let group = util::start_group(account, global).await?;

    let summaries: Vec<SubscriptionSummary> = group
        .coordinators()
        .iter()
        .filter_map(|c| {
            let snapshot = c.client().snapshot().ok()?;
            Some(SubscriptionSummary::new(c, &snapshot))
        })
        .collect();
    group.shutdown().await;

    let out = output::render_list(
        &global.output,
        &summaries,
        |s| SummaryRow::from(s),
        |s| format!("{}\t{}", util::ucr_label(s.ucr_id), s.cluster),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
