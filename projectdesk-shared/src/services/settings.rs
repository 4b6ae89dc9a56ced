//! Settings page: profile and contribution counts

use serde::Serialize;
use validator::Validate;

use crate::error::DeskResult;
use crate::models::validation::non_blank;
use crate::models::{Profile, ProfileUpdate};
use crate::session::Session;
use crate::store::AuthoredTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub projects: u64,
    pub tasks: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSettings {
    pub profile: Option<Profile>,
    pub stats: UserStats,
}

/// Profile and the number of projects, tasks and comments the identity wrote
pub async fn user_settings(session: &Session) -> DeskResult<UserSettings> {
    let identity = session.require_identity()?;
    let store = session.store();

    let (profile, projects, tasks, comments) = tokio::try_join!(
        store.get_profile(identity.id),
        store.count_authored(AuthoredTable::Projects, identity.id),
        store.count_authored(AuthoredTable::Tasks, identity.id),
        store.count_authored(AuthoredTable::Comments, identity.id),
    )?;

    Ok(UserSettings {
        profile,
        stats: UserStats {
            projects,
            tasks,
            comments,
        },
    })
}

pub async fn update_profile(session: &Session, update: ProfileUpdate) -> DeskResult<Profile> {
    let identity = session.require_identity()?;
    update.validate()?;

    let profile = session
        .store()
        .update_profile(identity.id, non_blank(update.full_name))
        .await?;

    tracing::info!(user_id = %identity.id, "Updated profile");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeskError;
    use crate::models::{CommentForm, TaskForm};
    use crate::services::comments::add_project_comment;
    use crate::services::tasks::create_task;
    use crate::services::testing::{identity, Fixture};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_stats_count_only_own_rows() {
        let fixture = Fixture::new();
        let ada = identity("Ada");
        let grace = identity("Grace");
        let project = Uuid::new_v4();

        let task = TaskForm {
            title: "Draft".to_string(),
            ..Default::default()
        };
        create_task(&fixture.session(&ada), project, task.clone(), None).await.unwrap();
        create_task(&fixture.session(&grace), project, task, None).await.unwrap();
        add_project_comment(
            &fixture.session(&ada),
            project,
            CommentForm {
                content: "hi".to_string(),
            },
        )
        .await
        .unwrap();

        let settings = user_settings(&fixture.session(&ada)).await.unwrap();
        assert!(settings.profile.is_none());
        assert_eq!(
            settings.stats,
            UserStats {
                projects: 0,
                tasks: 1,
                comments: 1
            }
        );
    }

    #[tokio::test]
    async fn test_update_profile() {
        let fixture = Fixture::new();
        let ada = identity("Ada");
        fixture
            .store
            .put_profile(Profile {
                id: ada.id,
                email: "ada@example.com".to_string(),
                full_name: None,
                avatar_url: None,
                created_at: None,
                updated_at: None,
            })
            .await;

        let profile = update_profile(
            &fixture.session(&ada),
            ProfileUpdate {
                full_name: Some(" Ada Lovelace ".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));

        let missing = update_profile(
            &fixture.session(&identity("Grace")),
            ProfileUpdate { full_name: None },
        )
        .await;
        assert!(matches!(missing, Err(DeskError::NotFound(_))));
    }
}
