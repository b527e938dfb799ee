// ── Host actions ──
//
// Write operations a host exposes to its users. The client is passed in
// explicitly; there is no process-wide registry of clients.

use tracing::info;

use crate::client::Client;
use crate::error::CoreError;

/// Set the account owner's status by display name (case-insensitive).
///
/// Fails with [`CoreError::StatusNotFound`] before any request is sent when
/// the name is not one of the cluster's statuses. Returns the status id
/// that was set.
pub async fn set_user_state_by_name(client: &Client, name: &str) -> Result<i64, CoreError> {
    let snapshot = client.snapshot()?;
    let Some(status_id) = snapshot.status_id_by_name(name) else {
        return Err(CoreError::StatusNotFound {
            name: name.to_owned(),
            available: snapshot.status_names.values().cloned().collect(),
        });
    };

    client.set_user_status(status_id).await?;
    info!(ucr = ?client.ucr_id(), status = name, status_id, "status change requested");
    Ok(status_id)
}

/// Send a probe (test) alarm to the subscription's cluster.
pub async fn trigger_probe_alarm(client: &Client) -> Result<(), CoreError> {
    client.trigger_probe_alarm().await
}
