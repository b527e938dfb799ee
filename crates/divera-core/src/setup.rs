// ── Multi-subscription setup ──
//
// Brings up every cluster relation of one account together: one shared HTTP
// client, one coordinator per relation, all first refreshes concurrently.
// Any failure tears the whole group down again.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{info, warn};

use divera_api::DiveraClient;

use crate::client::Client;
use crate::config::AccountConfig;
use crate::coordinator::Coordinator;
use crate::error::CoreError;

/// Running coordinators for one account, in configuration order.
#[derive(Debug)]
pub struct SubscriptionGroup {
    coordinators: Vec<Coordinator>,
}

impl SubscriptionGroup {
    /// Create coordinators for every configured relation and run their
    /// first refreshes concurrently.
    ///
    /// All-or-nothing: the first failing relation aborts the setup, every
    /// coordinator is shut down, and that error is returned.
    pub async fn setup(account: &AccountConfig) -> Result<Self, CoreError> {
        let api = Arc::new(DiveraClient::new(
            account.base_url.clone(),
            account.access_key.clone(),
            &account.transport(),
        )?);

        let coordinators: Vec<Coordinator> = account
            .subscriptions()
            .into_iter()
            .map(|sub| {
                let client = Client::new(Arc::clone(&api), sub.ucr_id);
                Coordinator::new(Arc::new(client), sub.poll_interval)
            })
            .collect();

        let group = Self { coordinators };
        group.start().await?;
        Ok(group)
    }

    /// Run the first refresh of already-built coordinators.
    pub async fn from_coordinators(coordinators: Vec<Coordinator>) -> Result<Self, CoreError> {
        let group = Self { coordinators };
        group.start().await?;
        Ok(group)
    }

    async fn start(&self) -> Result<(), CoreError> {
        let first = self.coordinators.iter().map(|c| c.first_refresh());
        if let Err(e) = try_join_all(first).await {
            warn!(class = %e.class(), error = %e, "setup failed, tearing down all subscriptions");
            self.shutdown().await;
            return Err(e);
        }
        info!(subscriptions = self.coordinators.len(), "all subscriptions ready");
        Ok(())
    }

    pub fn coordinators(&self) -> &[Coordinator] {
        &self.coordinators
    }

    /// Coordinator for a relation. `None` matches the default-relation
    /// subscription.
    pub fn get(&self, ucr_id: Option<i64>) -> Option<&Coordinator> {
        self.coordinators.iter().find(|c| c.ucr_id() == ucr_id)
    }

    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinators.is_empty()
    }

    /// Stop every scheduler and wait for them.
    pub async fn shutdown(&self) {
        futures_util::future::join_all(self.coordinators.iter().map(|c| c.shutdown())).await;
    }
}
