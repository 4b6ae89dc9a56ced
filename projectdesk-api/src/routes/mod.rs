/// API route handlers
///
/// This module contains all route handlers organized by page:
///
/// - `health`: Health check endpoint
/// - `auth`: Sign-in, token refresh, OAuth redirect and sign-out
/// - `settings`: Current user's profile and contribution counts
/// - `dashboard`: Status summary across projects and tasks
/// - `projects`: Project list, details and status
/// - `tasks`: Ranked task list, task creation with attachments, status
/// - `comments`: Project-level and task comments
/// - `activity`: Activity log, per project and across projects
/// - `members`: Members and invitations
/// - `notifications`: Unread comment count, read receipts and the live stream

pub mod activity;
pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod notifications;
pub mod projects;
pub mod settings;
pub mod tasks;
