//! Integration tests for the ProjectDesk API
//!
//! These drive the full router in-process against the in-memory backend:
//! - Authentication and sign-in flows
//! - Projects, ranked tasks and multipart uploads
//! - Comments, read receipts and the unread count
//! - Invitations
//! - The unread-count event stream

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{multipart_body, TestContext, TestUser, PASSWORD};
use futures::StreamExt;
use serde_json::{json, Value};
use std::time::Duration;

async fn create_task(ctx: &TestContext, user: &TestUser, project_id: &str, fields: &[(&str, &str)]) -> (StatusCode, Value) {
    let (content_type, body) = multipart_body(fields, None);
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/v1/projects/{}/tasks", project_id))
        .header(header::AUTHORIZATION, user.auth_header())
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    ctx.call(request).await
}

/// Reads the next `unread` event off an SSE body
async fn next_unread<S>(body: &mut S) -> u64
where
    S: futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    let frame = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("no event within 2s")
        .expect("stream ended")
        .unwrap();
    let text = String::from_utf8_lossy(&frame).into_owned();
    assert!(text.contains("event: unread"), "{}", text);

    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .expect("event without data");
    serde_json::from_str::<Value>(data).unwrap()["unread"]
        .as_u64()
        .unwrap()
}

fn titles(tasks: &Value) -> Vec<&str> {
    tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(Method::GET, "/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let request = Request::builder()
        .uri("/v1/dashboard")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = ctx.call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_refresh_and_logout() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": "ada@example.com", "password": PASSWORD, "full_name": "Ada" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, session) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["token_type"], "bearer");

    let user = TestUser {
        identity: serde_json::from_value(session["user"].clone()).unwrap(),
        token: session["access_token"].as_str().unwrap().to_string(),
    };
    let (status, me) = ctx.get("/v1/me", &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["display_name"], "Ada");
    assert_eq!(me["stats"]["projects"], 0);

    let (status, refreshed) = ctx
        .send(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": session["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(refreshed["refresh_token"], session["refresh_token"]);

    let (status, _) = ctx
        .send(Method::POST, "/v1/auth/logout", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": refreshed["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oauth_is_rejected_for_local_accounts() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(Method::GET, "/v1/auth/authorize?provider=google", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_tasks_are_ranked_and_attachments_stored() {
    let ctx = TestContext::new().await;
    let ada = ctx.user("Ada").await;
    let project_id = ctx.create_project(&ada, "Launch").await;

    for fields in [
        vec![("title", "undated"), ("priority", "urgent")],
        vec![("title", "late"), ("deadline", "2024-06-01"), ("priority", "urgent")],
        vec![("title", "early"), ("deadline", "2024-05-01"), ("priority", "low")],
    ] {
        let (status, body) = create_task(&ctx, &ada, &project_id, &fields).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (content_type, body) = multipart_body(
        &[("title", "brief"), ("deadline", "2024-05-01"), ("priority", "high")],
        Some(("brief.pdf", "application/pdf", b"%PDF-1.4")),
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/v1/projects/{}/tasks", project_id))
        .header(header::AUTHORIZATION, ada.auth_header())
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let (status, task) = ctx.call(request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["file_name"], "brief.pdf");
    let file_url = task["file_url"].as_str().unwrap();
    assert!(file_url.starts_with("http://localhost:8080/"));
    assert!(file_url.ends_with(".pdf"));

    let (status, tasks) = ctx
        .get(&format!("/v1/projects/{}/tasks", project_id), &ada)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&tasks), vec!["brief", "early", "late", "undated"]);

    let (status, details) = ctx.get(&format!("/v1/projects/{}", project_id), &ada).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["is_owner"], true);
    assert_eq!(titles(&details["tasks"]), titles(&tasks));
}

#[tokio::test]
async fn test_invalid_task_forms_are_rejected() {
    let ctx = TestContext::new().await;
    let ada = ctx.user("Ada").await;
    let project_id = ctx.create_project(&ada, "Launch").await;

    let (status, body) = create_task(&ctx, &ada, &project_id, &[("title", "  ")]).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "title");

    let (status, body) = create_task(
        &ctx,
        &ada,
        &project_id,
        &[("title", "Draft"), ("priority", "someday"), ("deadline", "soon")],
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    let (_, tasks) = ctx
        .get(&format!("/v1/projects/{}/tasks", project_id), &ada)
        .await;
    assert!(tasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_update_is_logged() {
    let ctx = TestContext::new().await;
    let ada = ctx.user("Ada").await;
    let project_id = ctx.create_project(&ada, "Launch").await;

    let (status, project) = ctx
        .patch(
            &format!("/v1/projects/{}/status", project_id),
            &ada,
            json!({ "status": "in_progress" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["status"], "in_progress");

    let (status, entries) = ctx
        .get(&format!("/v1/projects/{}/activity", project_id), &ada)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries[0]["details"], "Updated project status to in progress");
    assert_eq!(entries[0]["action"], "status_updated");
    assert_eq!(entries[0]["project_title"], "Launch");

    let (status, dashboard) = ctx.get("/v1/dashboard", &ada).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["projects"]["in_progress"], 1);
}

#[tokio::test]
async fn test_unread_count_and_read_receipts() {
    let ctx = TestContext::new().await;
    let ada = ctx.user("Ada").await;
    let grace = ctx.user("Grace").await;
    let project_id = ctx.create_project(&ada, "Launch").await;
    let comments_uri = format!("/v1/projects/{}/comments", project_id);
    let unread_uri = format!("/v1/notifications/unread?project_id={}", project_id);

    let mut from_grace = Vec::new();
    for i in 0..3 {
        let (status, comment) = ctx
            .post(&comments_uri, &grace, json!({ "content": format!("note {}", i) }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        from_grace.push(comment["id"].as_str().unwrap().to_string());
    }
    for content in ["mine", "also mine"] {
        ctx.post(&comments_uri, &ada, json!({ "content": content })).await;
    }

    let (_, unread) = ctx.get(&unread_uri, &ada).await;
    assert_eq!(unread["unread"], 3);

    for _ in 0..2 {
        let (status, _) = ctx
            .send(
                Method::POST,
                &format!("/v1/comments/{}/read", from_grace[0]),
                Some(&ada),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    let (_, unread) = ctx.get(&unread_uri, &ada).await;
    assert_eq!(unread["unread"], 2);

    let (status, _) = ctx.get(&comments_uri, &ada).await;
    assert_eq!(status, StatusCode::OK);
    let (_, unread) = ctx.get(&unread_uri, &ada).await;
    assert_eq!(unread["unread"], 0);
}

#[tokio::test]
async fn test_blank_comment_is_rejected() {
    let ctx = TestContext::new().await;
    let ada = ctx.user("Ada").await;
    let project_id = ctx.create_project(&ada, "Launch").await;

    let (status, body) = ctx
        .post(
            &format!("/v1/projects/{}/comments", project_id),
            &ada,
            json!({ "content": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "content");
}

#[tokio::test]
async fn test_invitation_flow() {
    let ctx = TestContext::new().await;
    let ada = ctx.user("Ada").await;
    let grace = ctx.user("Grace").await;
    let mallory = ctx.user("Mallory").await;
    let project_id = ctx.create_project(&ada, "Launch").await;
    let invitations_uri = format!("/v1/projects/{}/invitations", project_id);

    let (status, _) = ctx
        .post(
            &invitations_uri,
            &mallory,
            json!({ "email": "eve@example.com", "role": "member" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, invitation) = ctx
        .post(
            &invitations_uri,
            &ada,
            json!({ "email": "grace@example.com", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invitation["status"], "pending");
    let invitation_id = invitation["id"].as_str().unwrap();

    let (status, _) = ctx
        .post(
            &invitations_uri,
            &ada,
            json!({ "email": "grace@example.com", "role": "member" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let accept_uri = format!("/v1/invitations/{}/accept", invitation_id);
    let (status, _) = ctx.send(Method::POST, &accept_uri, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, member) = ctx.send(Method::POST, &accept_uri, Some(&grace), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["role"], "admin");

    let (status, members) = ctx
        .get(&format!("/v1/projects/{}/members", project_id), &ada)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 2);

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/v1/invitations/{}/cancel", invitation_id),
            Some(&ada),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unread_stream_sends_count_and_releases_feed() {
    let ctx = TestContext::new().await;
    let ada = ctx.user("Ada").await;
    let grace = ctx.user("Grace").await;
    let project_id = ctx.create_project(&ada, "Launch").await;
    ctx.post(
        &format!("/v1/projects/{}/comments", project_id),
        &grace,
        json!({ "content": "hello" }),
    )
    .await;

    let request = Request::builder()
        .uri(format!("/v1/notifications/stream?project_id={}", project_id))
        .header(header::AUTHORIZATION, ada.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let feed = ctx.state.backend.memory_store().unwrap().feed();
    // comment inserts and read receipts
    assert_eq!(feed.subscriber_count(), 2);

    let mut body = response.into_body().into_data_stream();
    let frame = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("no event within 2s")
        .expect("stream ended")
        .unwrap();
    let text = String::from_utf8_lossy(&frame);
    assert!(text.contains("event: unread"), "{}", text);
    assert!(text.contains(r#"data: {"unread":1}"#), "{}", text);

    drop(body);
    tokio::time::timeout(Duration::from_secs(2), async {
        while feed.subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("feed subscription was not released");
}

#[tokio::test]
async fn test_unread_stream_follows_read_receipts() {
    let ctx = TestContext::new().await;
    let ada = ctx.user("Ada").await;
    let grace = ctx.user("Grace").await;
    let project_id = ctx.create_project(&ada, "Launch").await;
    let comments_uri = format!("/v1/projects/{}/comments", project_id);

    let (_, comment) = ctx
        .post(&comments_uri, &grace, json!({ "content": "hello" }))
        .await;
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri(format!("/v1/notifications/stream?project_id={}", project_id))
        .header(header::AUTHORIZATION, ada.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();
    let mut body = response.into_body().into_data_stream();
    assert_eq!(next_unread(&mut body).await, 1);

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/v1/comments/{}/read", comment_id),
            Some(&ada),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(next_unread(&mut body).await, 0);

    ctx.post(&comments_uri, &grace, json!({ "content": "again" }))
        .await;
    assert_eq!(next_unread(&mut body).await, 1);

    // viewing the comments marks them read too
    let (status, _) = ctx.get(&comments_uri, &ada).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next_unread(&mut body).await, 0);
}
