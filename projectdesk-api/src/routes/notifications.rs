/// Unread comment notifications
///
/// - `GET /v1/notifications/unread?project_id=` - Current unread count
/// - `POST /v1/comments/:id/read` - Record a read receipt
/// - `GET /v1/notifications/stream?project_id=` - Live count over Server-Sent Events
///
/// Without `project_id` the count covers every visible project.
///
/// # SSE Event Format
///
/// ```text
/// event: unread
/// data: {"unread":3}
/// ```
///
/// A new event is sent whenever a comment lands in scope or the caller reads one, from
/// any session. A comment keep-alive is sent every 25 seconds. The stream owns the
/// reconciler's watch loop, so the change feed subscriptions are released as soon as
/// the client disconnects.
///
/// # Example
///
/// ```bash
/// curl -N -H "Authorization: Bearer <token>" \
///   "http://localhost:8080/v1/notifications/stream?project_id={id}"
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::stream::Stream;
use projectdesk_shared::auth::middleware::AuthContext;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::{wrappers::WatchStream, StreamExt as _};
use uuid::Uuid;

/// Interval between SSE keep-alive comments
pub const KEEP_ALIVE_SECS: u64 = 25;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    /// Limit the count to one project
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread: usize,
}

impl UnreadCount {
    fn event(self) -> Event {
        Event::default()
            .event("unread")
            .data(format!("{{\"unread\":{}}}", self.unread))
    }
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<UnreadCount>> {
    let session = state.session(&auth);
    let reconciler = session.notifications(query.project_id)?;

    Ok(Json(UnreadCount {
        unread: reconciler.refresh().await?,
    }))
}

/// Records that the caller has read a comment; repeating it is harmless
pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let session = state.session(&auth);
    session.notifications(None)?.mark_as_read(comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Streams the unread count, starting with the current value
pub async fn stream_unread(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let session = state.session(&auth);
    let reconciler = session.notifications(query.project_id)?;

    // watch subscribes, then counts once before returning
    let handle = reconciler.watch(session.feed()).await?;

    tracing::info!(
        user_id = %auth.identity.id,
        project_id = ?query.project_id,
        unread = reconciler.unread_count(),
        "Client subscribed to unread count"
    );

    let stream = WatchStream::new(reconciler.subscribe_count()).map(move |unread| {
        // the watch loop lives as long as the response stream
        let _watching = &handle;
        Ok(UnreadCount { unread }.event())
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    ))
}
