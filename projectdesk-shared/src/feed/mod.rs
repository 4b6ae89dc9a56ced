//! Change feeds
//!
//! A change feed pushes a notification for every row inserted into a table, optionally
//! narrowed to rows whose foreign-key column equals a given id. Delivery is
//! at-least-once and payloads are advisory: consumers re-derive their state from the
//! store instead of trusting the record carried by an event.
//!
//! ```text
//! MemoryFeed: MemoryStore writes ──┐
//!                                  ├──> broadcast ──> forwarding task per subscription
//! PgChangeFeed: one LISTEN task ───┘       (filters, stops when cancelled)
//!                                                   │
//!                                                   └──mpsc──> Subscription
//! ```
//!
//! Dropping a [`Subscription`] cancels its forwarding task and releases the listener.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::error::DeskResult;

pub use memory::MemoryFeed;
pub use pg::PgChangeFeed;

/// Events buffered per subscription before the forwarder waits on the consumer
pub const SUBSCRIPTION_BUFFER: usize = 64;

/// Events a feed's broadcast channel holds for its slowest subscriber
pub const BROADCAST_CAPACITY: usize = 256;

/// Table name of a resync marker that applies to every table
pub const ALL_TABLES: &str = "*";

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,

    /// Events may have been lost; consumers should re-derive their state
    Resync,
}

/// A row change pushed by a feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,

    #[serde(rename = "type")]
    pub kind: ChangeKind,

    #[serde(default)]
    pub record: serde_json::Value,
}

impl ChangeEvent {
    pub fn insert(table: impl Into<String>, record: serde_json::Value) -> Self {
        Self {
            table: table.into(),
            kind: ChangeKind::Insert,
            record,
        }
    }

    /// Marker sent after a gap in delivery (lagged receiver, reconnect)
    pub fn resync(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind: ChangeKind::Resync,
            record: serde_json::Value::Null,
        }
    }

    /// Resync marker for every subscription, whatever its table
    pub fn resync_all() -> Self {
        Self::resync(ALL_TABLES)
    }

    /// Id-valued column of the carried record
    pub fn record_uuid(&self, column: &str) -> Option<Uuid> {
        self.record
            .get(column)
            .and_then(|value| value.as_str())
            .and_then(|value| Uuid::parse_str(value).ok())
    }
}

/// Which inserts a subscription receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    pub table: String,

    /// Only rows where `column = id`
    pub column_eq: Option<(String, Uuid)>,
}

impl FeedFilter {
    /// Every insert on `table`
    pub fn inserts(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column_eq: None,
        }
    }

    pub fn where_eq(mut self, column: impl Into<String>, id: Uuid) -> Self {
        self.column_eq = Some((column.into(), id));
        self
    }

    /// Inserts on `table`, narrowed to `column = id` when an id is given
    pub fn inserts_scoped(table: impl Into<String>, column: &str, id: Option<Uuid>) -> Self {
        let filter = Self::inserts(table);
        match id {
            Some(id) => filter.where_eq(column, id),
            None => filter,
        }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.kind == ChangeKind::Resync && event.table == ALL_TABLES {
            return true;
        }
        if event.table != self.table {
            return false;
        }

        match event.kind {
            ChangeKind::Resync => true,
            ChangeKind::Insert => match &self.column_eq {
                Some((column, id)) => event.record_uuid(column) == Some(*id),
                None => true,
            },
            ChangeKind::Update | ChangeKind::Delete => false,
        }
    }
}

/// Live subscription handle
///
/// Events arrive through [`Subscription::next`]. Dropping the handle (or calling
/// [`Subscription::close`]) stops the forwarding task behind it.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::Receiver<ChangeEvent>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl Subscription {
    /// Creates a handle plus the sender and token its forwarding task should use
    pub fn channel() -> (mpsc::Sender<ChangeEvent>, CancellationToken, Subscription) {
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let token = CancellationToken::new();
        let subscription = Subscription {
            receiver,
            token: token.clone(),
            _guard: token.clone().drop_guard(),
        };
        (sender, token, subscription)
    }

    /// Next event, `None` once the feed has stopped
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Releases the subscription
    pub fn close(self) {}

    /// Spawns a task forwarding the broadcast events that match `filter`
    ///
    /// A lagging receiver turns into a resync marker. The task ends when the handle is
    /// dropped or the broadcast sender goes away.
    pub fn forward(mut events: broadcast::Receiver<ChangeEvent>, filter: FeedFilter) -> Subscription {
        let (sender, token, subscription) = Subscription::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    received = events.recv() => {
                        let event = match received {
                            Ok(event) if filter.matches(&event) => event,
                            Ok(_) => continue,
                            Err(RecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, table = %filter.table, "Change feed lagged");
                                ChangeEvent::resync(filter.table.clone())
                            }
                            Err(RecvError::Closed) => break,
                        };

                        if sender.send(event).await.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!(table = %filter.table, "Feed subscription closed");
        });

        subscription
    }
}

/// Push notifications for inserted rows
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, filter: FeedFilter) -> DeskResult<Subscription>;

    /// Releases shared resources (connections) held by the feed
    async fn shutdown(&self) {}
}
