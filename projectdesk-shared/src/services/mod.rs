/// Form-driven workflows
///
/// Every workflow takes a [`Session`], requires a signed-in identity, validates its
/// input before any write, and records an activity-log entry after a successful write.
/// A failed activity-log insert is logged and does not fail the write it describes.
///
/// # Modules
///
/// - `projects`: create, list, details, status changes
/// - `tasks`: create (with optional attachment), ranked lists, status changes
/// - `comments`: project and task comments; listing records read receipts
/// - `invitations`: invite, cancel, accept, member lists
/// - `activity`: activity feed joined with project titles
/// - `dashboard`: status counts and recent projects
/// - `settings`: profile and authored-row counts

pub mod activity;
pub mod comments;
pub mod dashboard;
pub mod invitations;
pub mod projects;
pub mod settings;
pub mod tasks;

use uuid::Uuid;

use crate::auth::identity::Identity;
use crate::models::{ActivityAction, ActivityLog, NewActivityLog};
use crate::session::Session;

/// Appends an activity-log entry, logging instead of failing
pub(crate) async fn record_activity(
    session: &Session,
    identity: &Identity,
    project_id: Uuid,
    action: ActivityAction,
    details: String,
) -> Option<ActivityLog> {
    let entry = NewActivityLog {
        project_id,
        user_id: identity.id,
        user_name: identity.display_name(),
        action,
        details,
    };

    match session.store().insert_activity(entry).await {
        Ok(log) => Some(log),
        Err(e) => {
            tracing::error!(
                error = %e,
                user_id = %identity.id,
                project_id = %project_id,
                "Failed to record activity"
            );
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::auth::identity::Identity;
    use crate::blob::{MemoryBlobStorage, DEFAULT_BUCKET};
    use crate::session::Session;
    use crate::store::MemoryStore;
    use uuid::Uuid;

    pub struct Fixture {
        pub store: MemoryStore,
        pub blobs: MemoryBlobStorage,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                store: MemoryStore::new(),
                blobs: MemoryBlobStorage::new("http://localhost:8080", DEFAULT_BUCKET),
            }
        }

        pub fn session(&self, identity: &Identity) -> Session {
            Session::new(
                Some(identity.clone()),
                Arc::new(self.store.clone()),
                Arc::new(self.blobs.clone()),
                Arc::new(self.store.feed()),
            )
        }

        pub fn anonymous(&self) -> Session {
            Session::anonymous(
                Arc::new(self.store.clone()),
                Arc::new(self.blobs.clone()),
                Arc::new(self.store.feed()),
            )
        }
    }

    pub fn identity(name: &str) -> Identity {
        Identity::new(
            Uuid::new_v4(),
            Some(format!("{}@example.com", name.to_lowercase())),
            Some(name.to_string()),
        )
    }
}
