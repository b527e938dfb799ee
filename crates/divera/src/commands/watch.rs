//! Long-running mode: keep every coordinator polling and print entity
//! changes until Ctrl-C.

use std::collections::BTreeMap;

use chrono::Local;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use divera_core::{AccountConfig, Coordinator, EntitySet, StateValue};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::entities::EntityView;
use super::util;

#[derive(Debug, Serialize)]
struct Change<'a> {
    unique_id: &'a str,
    name: &'a str,
    old: &'a StateValue,
    new: &'a StateValue,
    available: bool,
    at: String,
}

/// Current views of `set`, keyed by unique id.
fn snapshot_views(set: &EntitySet) -> BTreeMap<String, EntityView> {
    set.current()
        .iter()
        .filter(|(entity, _)| entity.has_state())
        .map(|(entity, state)| (entity.unique_id.clone(), EntityView::new(entity, state)))
        .collect()
}

fn print_change(before: &EntityView, after: &EntityView, global: &GlobalOpts, color: bool) {
    let at = Local::now().format("%H:%M:%S").to_string();
    match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            let change = Change {
                unique_id: &after.unique_id,
                name: &after.name,
                old: &before.value,
                new: &after.value,
                available: after.available,
                at,
            };
            if let Ok(line) = serde_json::to_string(&change) {
                output::print_output(&line, global.quiet);
            }
        }
        _ => output::print_output(
            &format!(
                "[{at}] {}: {} -> {}",
                after.name,
                before.state_text(color),
                after.state_text(color)
            ),
            global.quiet,
        ),
    }
}

/// Log coordinators whose data is stale or whose last refresh failed.
fn report_health(coordinators: &[Coordinator], color: bool) {
    for coordinator in coordinators {
        let failures = coordinator.consecutive_failures();
        if failures == 0 && !coordinator.is_stale() {
            continue;
        }
        let reason = coordinator
            .last_failure()
            .map(|f| format!("{}: {}", f.class, f.message))
            .unwrap_or_default();
        eprintln!(
            "ucr {}: {} (data {}, {failures} failed refreshes) {reason}",
            util::ucr_label(coordinator.ucr_id()),
            output::paint_refresh_state(coordinator.state(), color),
            output::format_age(coordinator.data_age()),
        );
    }
}

pub async fn handle(
    account: &AccountConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let group = util::start_group(account, global).await?;
    let color = output::should_color(&global.color);

    let sets: Vec<EntitySet> = group
        .coordinators()
        .iter()
        .map(|c| EntitySet::for_coordinator(c, account.vehicle_name_mode))
        .collect();
    let mut last: Vec<BTreeMap<String, EntityView>> = sets.iter().map(snapshot_views).collect();

    if !global.quiet {
        let total: usize = last.iter().map(BTreeMap::len).sum();
        eprintln!(
            "Watching {total} entities in {} subscription(s), every {}s. Ctrl-C to stop.",
            sets.len(),
            account.poll_interval.as_secs()
        );
    }

    // Snapshot streams fire after listeners ran, so the sets are current
    // by the time a notification arrives.
    let (tx, mut rx) = mpsc::unbounded_channel::<usize>();
    let forwarders: Vec<_> = group
        .coordinators()
        .iter()
        .enumerate()
        .map(|(index, coordinator)| {
            let mut snapshots = coordinator.snapshots();
            let tx = tx.clone();
            tokio::spawn(async move {
                while snapshots.changed().await.is_some() {
                    if tx.send(index).is_err() {
                        break;
                    }
                }
            })
        })
        .collect();
    drop(tx);

    let mut health = tokio::time::interval(account.poll_interval.as_duration());
    health.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    health.tick().await;

    let mut refreshes = 0_u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            _ = health.tick() => report_health(group.coordinators(), color),
            received = rx.recv() => {
                let Some(index) = received else {
                    warn!("all coordinators stopped");
                    break;
                };
                let (Some(set), Some(previous)) = (sets.get(index), last.get_mut(index)) else {
                    continue;
                };
                let current = snapshot_views(set);
                for (id, after) in &current {
                    let changed = previous
                        .get(id)
                        .filter(|b| b.value != after.value || b.available != after.available);
                    if let Some(before) = changed {
                        print_change(before, after, global, color);
                    }
                }
                *previous = current;

                refreshes += 1;
                if args.count.is_some_and(|n| refreshes >= n) {
                    break;
                }
            }
        }
    }

    for set in &sets {
        set.detach();
    }
    group.shutdown().await;
    for forwarder in forwarders {
        forwarder.abort();
    }
    Ok(())
}
