//! Change feed over Postgres `LISTEN/NOTIFY`
//!
//! The migrations in `migrations/` install an insert trigger on the watched tables that
//! publishes `{"table", "type", "record"}` on [`CHANGE_CHANNEL`]. A feed holds exactly
//! one listener connection; its task decodes notifications into a broadcast channel and
//! every subscription filters that stream locally, so open subscriptions never take
//! connections from the pool.

use async_trait::async_trait;
use sqlx::postgres::{PgListener, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::{ChangeEvent, ChangeFeed, FeedFilter, Subscription, BROADCAST_CAPACITY};
use crate::db::pool::close_pool;
use crate::error::DeskResult;

/// Notification channel the trigger publishes on
pub const CHANGE_CHANNEL: &str = "projectdesk_changes";

/// Pause before polling again after the listener connection errored
const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Feed backed by the platform's Postgres
///
/// Clones share the listener. It stops on [`ChangeFeed::shutdown`] or when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct PgChangeFeed {
    pool: PgPool,
    sender: broadcast::Sender<ChangeEvent>,
    stop: CancellationToken,
    _guard: Arc<DropGuard>,
}

impl PgChangeFeed {
    /// Opens the listener connection and starts fanning out notifications
    pub async fn start(pool: PgPool) -> DeskResult<Self> {
        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        let stop = CancellationToken::new();
        tokio::spawn(run_listener(listener, sender.clone(), stop.clone()));

        tracing::info!(channel = CHANGE_CHANNEL, "Listening for change notifications");

        Ok(Self {
            pool,
            sender,
            _guard: Arc::new(stop.clone().drop_guard()),
            stop,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn is_listening(&self) -> bool {
        !self.stop.is_cancelled()
    }
}

/// Decodes a trigger payload
pub fn parse_notification(payload: &str) -> Option<ChangeEvent> {
    match serde_json::from_str::<ChangeEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!(error = %e, payload = %payload, "Failed to parse change notification");
            None
        }
    }
}

async fn run_listener(
    mut listener: PgListener,
    sender: broadcast::Sender<ChangeEvent>,
    stop: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            received = listener.try_recv() => match received {
                Ok(Some(notification)) => {
                    if let Some(event) = parse_notification(notification.payload()) {
                        // no subscribers is fine
                        let _ = sender.send(event);
                    }
                }
                // connection dropped; the next call reconnects, anything sent in
                // between is lost
                Ok(None) => {
                    tracing::warn!(channel = CHANGE_CHANNEL, "Change listener reconnecting");
                    let _ = sender.send(ChangeEvent::resync_all());
                }
                Err(e) => {
                    tracing::error!(error = %e, channel = CHANGE_CHANNEL, "Change listener failed");
                    let _ = sender.send(ChangeEvent::resync_all());
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        _ = tokio::time::sleep(LISTENER_RETRY_DELAY) => {}
                    }
                }
            }
        }
    }

    if let Err(e) = listener.unlisten_all().await {
        tracing::debug!(error = %e, "Failed to unlisten");
    }
    tracing::debug!(channel = CHANGE_CHANNEL, "Change listener stopped");
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self, filter: FeedFilter) -> DeskResult<Subscription> {
        tracing::debug!(table = %filter.table, column = ?filter.column_eq, "Subscribed to change feed");
        Ok(Subscription::forward(self.sender.subscribe(), filter))
    }

    async fn shutdown(&self) {
        self.stop.cancel();
        close_pool(&self.pool).await;
    }
}
