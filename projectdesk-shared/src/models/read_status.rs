/// Comment read receipts
///
/// One row per (user, comment) the user has seen. Rows are created the first time the
/// user views a list containing the comment and are never deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comment_read_status (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES auth.users(id) ON DELETE CASCADE,
///     comment_id UUID NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
///     read_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (user_id, comment_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read receipt row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentReadStatus {
    pub id: Uuid,
    pub user_id: Uuid,
    pub comment_id: Uuid,
    pub read_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Upsert payload; conflicts on (user_id, comment_id) are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub user_id: Uuid,
    pub comment_id: Uuid,
}

impl ReadReceipt {
    pub fn new(user_id: Uuid, comment_id: Uuid) -> Self {
        Self {
            user_id,
            comment_id,
        }
    }
}
