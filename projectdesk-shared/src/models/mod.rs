/// Domain models for ProjectDesk
///
/// Row types mirror the hosted platform's tables; `New*` types are insert payloads and
/// `*Form` types are validated user input.
///
/// # Models
///
/// - `status`: workflow status and priority shared by projects and tasks
/// - `project`: projects and the project list filter
/// - `task`: tasks, deadlines and attachments
/// - `comment`: comments on projects and tasks
/// - `read_status`: per-user comment read receipts
/// - `activity_log`: append-only audit trail
/// - `member`: project memberships and roles
/// - `invitation`: email invitations to a project
/// - `profile`: public user profiles

pub mod activity_log;
pub mod comment;
pub mod invitation;
pub mod member;
pub mod profile;
pub mod project;
pub mod read_status;
pub mod status;
pub mod task;
pub mod validation;

pub use activity_log::{ActivityAction, ActivityCategory, ActivityFilter, ActivityLog, NewActivityLog};
pub use comment::{Comment, CommentForm, CommentQuery, CommentScope, CommentTarget, NewComment};
pub use invitation::{InvitationForm, InvitationStatus, NewInvitation, ProjectInvitation};
pub use member::{MemberRole, MemberWithProfile, NewMember, ProjectMember};
pub use profile::{Profile, ProfileUpdate};
pub use project::{NewProject, Project, ProjectFilter, ProjectForm};
pub use read_status::{CommentReadStatus, ReadReceipt};
pub use status::{Priority, WorkStatus};
pub use task::{DeadlineStatus, NewTask, Task, TaskAttachment, TaskForm};
