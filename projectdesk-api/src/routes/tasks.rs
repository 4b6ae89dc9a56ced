/// Task endpoints
///
/// - `GET /v1/projects/:id/tasks` - Tasks ranked by deadline, then priority
/// - `POST /v1/projects/:id/tasks` - Create a task (multipart)
/// - `PATCH /v1/tasks/:id/status` - Move a task to another status
///
/// # Creating a task
///
/// ```text
/// POST /v1/projects/{id}/tasks
/// Content-Type: multipart/form-data
///
/// title=Draft the brief
/// description=...            (optional)
/// deadline=2024-05-01         (optional, YYYY-MM-DD)
/// priority=high               (optional: urgent, high, medium, low)
/// file=@brief.pdf             (optional)
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::projects::StatusUpdate,
};
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use projectdesk_shared::auth::middleware::AuthContext;
use projectdesk_shared::error::FieldError;
use projectdesk_shared::models::{Priority, Task, TaskAttachment, TaskForm};
use projectdesk_shared::services::tasks;
use uuid::Uuid;

async fn text(field: Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart field: {}", e)))
}

/// Reads the multipart body into a form and an optional attachment
///
/// Unparsable deadline or priority values are reported together as field errors.
async fn read_task_form(mut multipart: Multipart) -> ApiResult<(TaskForm, Option<TaskAttachment>)> {
    let mut form = TaskForm::default();
    let mut attachment = None;
    let mut errors = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = text(field).await?,
            "description" => {
                let value = text(field).await?;
                form.description = Some(value).filter(|v| !v.trim().is_empty());
            }
            "deadline" => {
                let value = text(field).await?;
                if !value.trim().is_empty() {
                    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
                        Ok(date) => form.deadline = Some(date),
                        Err(_) => errors.push(FieldError::new("deadline", "Deadline must be YYYY-MM-DD")),
                    }
                }
            }
            "priority" => {
                let value = text(field).await?;
                if !value.trim().is_empty() {
                    match value.trim().parse::<Priority>() {
                        Ok(priority) => form.priority = Some(priority),
                        Err(_) => errors.push(FieldError::new(
                            "priority",
                            "Priority must be urgent, high, medium or low",
                        )),
                    }
                }
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

                // browsers send an empty part when no file was picked
                if !file_name.is_empty() && !data.is_empty() {
                    attachment = Some(TaskAttachment {
                        file_name,
                        content_type,
                        data,
                    });
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    Ok((form, attachment))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    let session = state.session(&auth);
    Ok(Json(tasks::list_ranked_tasks(&session, project_id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let (form, attachment) = read_task_form(multipart).await?;

    let session = state.session(&auth);
    let task = tasks::create_task(&session, project_id, form, attachment).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<Task>> {
    let session = state.session(&auth);
    Ok(Json(
        tasks::update_task_status(&session, task_id, update.status).await?,
    ))
}
