/// Unread comment badge
///
/// A comment is unread for user U when U did not write it and there is no
/// `comment_read_status` row for (U, comment). The count is always recomputed from the
/// store rather than maintained incrementally, so writes from other sessions are picked
/// up on the next refresh.
///
/// # Lifecycle
///
/// ```text
/// NotificationReconciler::new(store, user, project?)
///     │
///     ├── refresh()            full recount: comments in scope not by U, minus receipts
///     ├── mark_as_read(id)     upsert receipt, then count - 1 (floored at 0)
///     ├── watch(feed)          refresh, then spawn: refresh on every comment insert in
///     │                        scope and every read receipt of U
///     │       └── WatchHandle  drop/cancel stops the loop and releases the subscription
///     └── dispose()            later refresh results are ignored
/// ```
///
/// Refreshes are not serialized; the last one to finish wins. Between a `mark_as_read`
/// and the next refresh the count can undershoot when the same comment was marked twice.
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::feed::MemoryFeed;
/// use projectdesk_shared::notifications::NotificationReconciler;
/// use projectdesk_shared::store::MemoryStore;
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let feed = store.feed();
/// let reconciler = NotificationReconciler::new(Arc::new(store), Uuid::new_v4(), None);
///
/// let handle = reconciler.watch(&feed).await?;
/// let mut badge = reconciler.subscribe_count();
/// badge.changed().await?;
/// println!("unread: {}", *badge.borrow());
///
/// drop(handle);
/// reconciler.dispose();
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::error::DeskResult;
use crate::feed::{ChangeFeed, FeedFilter};
use crate::models::{CommentQuery, CommentScope, ReadReceipt};
use crate::store::DataStore;

struct Inner {
    store: Arc<dyn DataStore>,
    user_id: Uuid,
    project_id: Option<Uuid>,
    count: watch::Sender<usize>,
    disposed: CancellationToken,
}

/// Live unread-comment count for one user, optionally scoped to one project
///
/// Clones share the same count.
#[derive(Clone)]
pub struct NotificationReconciler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for NotificationReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationReconciler")
            .field("user_id", &self.inner.user_id)
            .field("project_id", &self.inner.project_id)
            .field("unread", &self.unread_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl NotificationReconciler {
    pub fn new(store: Arc<dyn DataStore>, user_id: Uuid, project_id: Option<Uuid>) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                store,
                user_id,
                project_id,
                count,
                disposed: CancellationToken::new(),
            }),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.inner.user_id
    }

    pub fn project_id(&self) -> Option<Uuid> {
        self.inner.project_id
    }

    /// Comments the count is taken over
    pub fn scope(&self) -> CommentScope {
        CommentScope::for_project(self.inner.project_id)
    }

    /// Last computed count
    pub fn unread_count(&self) -> usize {
        *self.inner.count.borrow()
    }

    /// Receiver notified on every count update
    pub fn subscribe_count(&self) -> watch::Receiver<usize> {
        self.inner.count.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.is_cancelled()
    }

    /// Counts unread comments in scope without touching the stored count
    pub async fn compute_unread(&self) -> DeskResult<usize> {
        let user_id = self.inner.user_id;
        let query = CommentQuery::new(self.scope()).excluding_author(user_id);

        let (comments, read) = tokio::try_join!(
            self.inner.store.list_comments(query),
            self.inner.store.read_comment_ids(user_id),
        )?;

        Ok(comments
            .iter()
            .filter(|comment| !comment.is_authored_by(user_id) && !read.contains(&comment.id))
            .count())
    }

    /// Recomputes the count from the store
    ///
    /// On failure the error is logged and the previous count is kept. Results arriving
    /// after [`dispose`](Self::dispose) are dropped.
    pub async fn refresh(&self) -> DeskResult<usize> {
        match self.compute_unread().await {
            Ok(unread) => {
                if self.is_disposed() {
                    tracing::debug!(user_id = %self.inner.user_id, "Dropping refresh after dispose");
                    return Ok(self.unread_count());
                }
                self.inner.count.send_replace(unread);
                tracing::debug!(
                    user_id = %self.inner.user_id,
                    project_id = ?self.inner.project_id,
                    unread,
                    "Refreshed unread count"
                );
                Ok(unread)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = %self.inner.user_id,
                    project_id = ?self.inner.project_id,
                    "Failed to refresh unread count"
                );
                Err(e)
            }
        }
    }

    /// Records a read receipt and decrements the count
    pub async fn mark_as_read(&self, comment_id: Uuid) -> DeskResult<()> {
        let receipt = ReadReceipt::new(self.inner.user_id, comment_id);
        if let Err(e) = self.inner.store.upsert_read_receipt(receipt).await {
            tracing::error!(
                error = %e,
                user_id = %self.inner.user_id,
                comment_id = %comment_id,
                "Failed to mark comment as read"
            );
            return Err(e);
        }

        if !self.is_disposed() {
            self.inner
                .count
                .send_modify(|count| *count = count.saturating_sub(1));
        }
        Ok(())
    }

    /// Keeps the count live from comment inserts in scope and the user's read receipts
    ///
    /// Subscribes first, then refreshes once before returning so the count is current
    /// when the handle comes back. The spawned loop refreshes again on every event
    /// (including resync markers) and ends when the handle is dropped or cancelled,
    /// the reconciler is disposed, or the feed closes.
    pub async fn watch(&self, feed: &dyn ChangeFeed) -> DeskResult<WatchHandle> {
        let user_id = self.inner.user_id;
        let mut comments = feed
            .subscribe(FeedFilter::inserts_scoped("comments", "project_id", self.inner.project_id))
            .await?;
        let mut receipts = feed
            .subscribe(FeedFilter::inserts("comment_read_status").where_eq("user_id", user_id))
            .await?;

        // a failed first count is logged; the loop retries on the next event
        let _ = self.refresh().await;

        let token = CancellationToken::new();
        let stop = token.clone();
        let reconciler = self.clone();

        let task = tokio::spawn(async move {
            let disposed = reconciler.inner.disposed.clone();

            loop {
                let event = tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = disposed.cancelled() => break,
                    event = comments.next() => event,
                    event = receipts.next() => event,
                };

                if event.is_none() {
                    tracing::warn!(user_id = %user_id, "Comment feed closed");
                    break;
                }
                let _ = reconciler.refresh().await;
            }

            tracing::debug!(user_id = %user_id, "Stopped watching comments");
        });

        Ok(WatchHandle {
            token: token.clone(),
            _guard: token.drop_guard(),
            task,
        })
    }

    /// Ends the reconciler: watch loops stop and in-flight refreshes are ignored
    pub fn dispose(&self) {
        self.inner.disposed.cancel();
    }
}

/// Running watch loop; dropping it stops the loop
#[derive(Debug)]
pub struct WatchHandle {
    token: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the loop and waits for it to exit
    pub async fn stop(self) {
        self.token.cancel();
        let WatchHandle { task, .. } = self;
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Watch loop panicked");
        }
    }
}
