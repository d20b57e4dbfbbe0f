//! Integration tests for the WorkBuddy API
//!
//! Drive the full router (session middleware included) against a real
//! database. Skipped when `DATABASE_URL` is unset.

mod common;

use axum::http::StatusCode;
use common::{unique, TestContext, DEMO_PASSWORD, FOREMAN_EMAIL, OWNER_EMAIL, WORKER_EMAIL};
use serde_json::json;
use tokio::sync::mpsc;
use workbuddy_shared::models::message::Message;
use workbuddy_shared::models::project_member::ProjectMember;
use workbuddy_shared::realtime::ServerEvent;

macro_rules! context {
    () => {
        match TestContext::new().await {
            Some(ctx) => ctx,
            None => return,
        }
    };
}

async fn create_user_via_api(ctx: &TestContext, owner: &str, role: &str) -> (String, String) {
    let email = format!("{}@test.workbuddy.pro", unique("user"));
    let (status, body) = ctx
        .post(
            "/api/v1/users",
            owner,
            json!({ "email": email, "name": "Test Person", "password": DEMO_PASSWORD, "role": role }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (body["id"].as_str().unwrap().to_string(), email)
}

#[tokio::test]
async fn test_health() {
    let ctx = context!();

    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let ctx = context!();

    let (status, body) = ctx.send("GET", "/api/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx
        .send(
            "GET",
            "/api/v1/projects",
            Some("workbuddy_session=not-a-real-token"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_returns_stable_public_fields() {
    let ctx = context!();

    let mut users = Vec::new();
    for _ in 0..2 {
        let (status, body) = ctx
            .send(
                "POST",
                "/api/v1/login",
                None,
                Some(json!({ "email": OWNER_EMAIL, "password": DEMO_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        users.push(body["user"].clone());
    }

    assert_eq!(users[0], users[1]);
    assert_eq!(users[0]["id"], "owner01");
    assert_eq!(users[0]["role"], "Owner");

    let fields = users[0].as_object().unwrap();
    assert_eq!(fields.len(), 4);
    assert!(!fields.contains_key("password_hash"));
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = context!();

    let (status, wrong_password) = ctx
        .send(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "email": OWNER_EMAIL, "password": "not-the-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_email) = ctx
        .send(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "email": "nobody@workbuddy.pro", "password": DEMO_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["message"], unknown_email["message"]);

    let (status, _) = ctx
        .send("POST", "/api/v1/login", None, Some(json!({ "email": OWNER_EMAIL })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let ctx = context!();
    let cookie = ctx.login_owner().await;

    let (status, body) = ctx.get("/api/v1/session", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], "owner01");

    let (status, body) = ctx.send("POST", "/api/v1/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = ctx.get("/api/v1/session", &cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging out again is harmless
    let (status, _) = ctx.send("POST", "/api/v1/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_select_project_is_remembered() {
    let ctx = context!();
    let cookie = ctx.login(WORKER_EMAIL, DEMO_PASSWORD).await;

    let (status, body) = ctx.post("/api/v1/select-project/proj_beta", &cookie, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["id"], "proj_beta");

    let (_, session) = ctx.get("/api/v1/session", &cookie).await;
    assert_eq!(session["current_project"]["id"], "proj_beta");

    let (status, _) = ctx
        .post("/api/v1/select-project/proj_missing", &cookie, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let ctx = context!();
    let owner = ctx.login_owner().await;

    let (_, email) = create_user_via_api(&ctx, &owner, "Worker").await;

    let (status, body) = ctx
        .post(
            "/api/v1/users",
            &owner,
            json!({
                "email": email.to_uppercase(),
                "name": "Someone Else",
                "password": DEMO_PASSWORD,
                "role": "Worker"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_create_user_validation() {
    let ctx = context!();
    let owner = ctx.login_owner().await;

    let (status, body) = ctx
        .post(
            "/api/v1/users",
            &owner,
            json!({ "email": "not-an-email", "name": "  ", "password": "short", "role": "Worker" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 3);

    let worker = ctx.login(WORKER_EMAIL, DEMO_PASSWORD).await;
    let (status, _) = ctx
        .post(
            "/api/v1/users",
            &worker,
            json!({
                "email": format!("{}@test.workbuddy.pro", unique("user")),
                "name": "Nope",
                "password": DEMO_PASSWORD,
                "role": "Worker"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_user_trims_email() {
    let ctx = context!();
    let owner = ctx.login_owner().await;
    let email = format!("{}@test.workbuddy.pro", unique("user"));

    let (status, body) = ctx
        .post(
            "/api/v1/users",
            &owner,
            json!({
                "email": format!("  {}  ", email),
                "name": "Padded Person",
                "password": DEMO_PASSWORD,
                "role": "Worker"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["email"], email.as_str());

    ctx.login(&email, DEMO_PASSWORD).await;
}

#[tokio::test]
async fn test_malformed_path_is_json_bad_request() {
    let ctx = context!();
    let cookie = ctx.login(WORKER_EMAIL, DEMO_PASSWORD).await;

    let (status, body) = ctx.get("/api/v1/tasks/abc", &cookie).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = ctx
        .put("/api/v1/tasks/12x", &cookie, json!({ "title": "Renamed" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_create_task_enrolls_assignee() {
    let ctx = context!();
    let owner = ctx.login_owner().await;
    let (assignee_id, _) = create_user_via_api(&ctx, &owner, "Worker").await;

    assert!(!ProjectMember::is_member(&ctx.state.db, "proj_beta", &assignee_id)
        .await
        .unwrap());

    let (status, task) = ctx
        .post(
            "/api/v1/projects/proj_beta/tasks",
            &owner,
            json!({ "title": "  Order drywall  ", "assignee_id": assignee_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", task);
    assert_eq!(task["title"], "Order drywall");
    assert_eq!(task["assignee_id"], assignee_id.as_str());
    assert_eq!(task["priority"], "Medium");

    assert!(ProjectMember::is_member(&ctx.state.db, "proj_beta", &assignee_id)
        .await
        .unwrap());

    let (_, members) = ctx.get("/api/v1/projects/proj_beta/members", &owner).await;
    assert!(members
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m["id"] == assignee_id.as_str()));
}

#[tokio::test]
async fn test_create_task_errors() {
    let ctx = context!();
    let owner = ctx.login_owner().await;

    let (status, _) = ctx
        .post("/api/v1/projects/proj_alpha/tasks", &owner, json!({ "title": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post("/api/v1/projects/proj_missing/tasks", &owner, json!({ "title": "Dig" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .post(
            "/api/v1/projects/proj_alpha/tasks",
            &owner,
            json!({ "title": "Dig", "assignee_id": "ghost" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/api/v1/tasks/999999999", &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_update_and_empty_body() {
    let ctx = context!();
    let owner = ctx.login_owner().await;

    let (_, task) = ctx
        .post(
            "/api/v1/projects/proj_alpha/tasks",
            &owner,
            json!({
                "title": "Frame walls",
                "description": "Second floor",
                "due_date": "2025-06-01",
                "priority": "High"
            }),
        )
        .await;
    let uri = format!("/api/v1/tasks/{}", task["id"]);

    let (status, unchanged) = ctx.put(&uri, &owner, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged, task);

    let (status, updated) = ctx
        .put(&uri, &owner, json!({ "status": "In Progress", "due_date": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "In Progress");
    assert_eq!(updated["due_date"], serde_json::Value::Null);
    assert_eq!(updated["title"], "Frame walls");
    assert_eq!(updated["description"], "Second floor");
    assert_eq!(updated["priority"], "High");
    assert_eq!(updated["assignee_id"], "owner01");

    let (status, _) = ctx.put(&uri, &owner, json!({ "title": " " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .put("/api/v1/tasks/999999999", &owner, json!({ "status": "Done" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inspect_site_end_to_end() {
    let ctx = context!();
    let owner = ctx.login_owner().await;

    let (status, created) = ctx
        .post(
            "/api/v1/projects/proj_alpha/tasks",
            &owner,
            json!({ "title": "Inspect site" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = created["id"].clone();

    let find = |tasks: &serde_json::Value| {
        tasks
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["id"] == task_id)
            .cloned()
            .unwrap()
    };

    let (status, tasks) = ctx.get("/api/v1/projects/proj_alpha/tasks", &owner).await;
    assert_eq!(status, StatusCode::OK);
    let listed = find(&tasks);
    assert_eq!(listed["title"], "Inspect site");
    assert_eq!(listed["is_completed"], false);
    assert_eq!(listed["assignee_name"], "Owner User");

    let (status, _) = ctx
        .put(
            &format!("/api/v1/tasks/{}", task_id),
            &owner,
            json!({ "status": "Done" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, tasks) = ctx.get("/api/v1/projects/proj_alpha/tasks", &owner).await;
    assert_eq!(find(&tasks)["is_completed"], true);
}

#[tokio::test]
async fn test_comments_on_task() {
    let ctx = context!();
    let foreman = ctx.login(FOREMAN_EMAIL, DEMO_PASSWORD).await;

    let (_, task) = ctx
        .post("/api/v1/projects/proj_alpha/tasks", &foreman, json!({ "title": "Check rebar" }))
        .await;
    let uri = format!("/api/v1/tasks/{}/comments", task["id"]);

    let (status, _) = ctx.post(&uri, &foreman, json!({ "comment_text": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, first) = ctx
        .post(&uri, &foreman, json!({ "comment_text": " Rebar delivered " }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["comment_text"], "Rebar delivered");
    assert_eq!(first["is_alert"], false);
    assert_eq!(first["user_id"], "foremanA");

    ctx.post(&uri, &foreman, json!({ "comment_text": "Spacing is off", "is_alert": true }))
        .await;

    let (status, comments) = ctx.get(&uri, &foreman).await;
    assert_eq!(status, StatusCode::OK);
    let comments = comments.as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["comment_text"], "Rebar delivered");
    assert_eq!(comments[1]["is_alert"], true);

    let (status, _) = ctx.get("/api/v1/tasks/999999999/comments", &foreman).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_task_removes_comments() {
    let ctx = context!();
    let owner = ctx.login_owner().await;

    let (_, task) = ctx
        .post("/api/v1/projects/proj_alpha/tasks", &owner, json!({ "title": "Temporary" }))
        .await;
    let uri = format!("/api/v1/tasks/{}", task["id"]);
    ctx.post(&format!("{}/comments", uri), &owner, json!({ "comment_text": "soon gone" }))
        .await;

    let (status, body) = ctx.delete(&uri, &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = ctx.get(&format!("{}/comments", uri), &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&uri, &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_requires_owner() {
    let ctx = context!();
    let owner = ctx.login_owner().await;
    let (user_id, _) = create_user_via_api(&ctx, &owner, "Worker").await;

    let foreman = ctx.login(FOREMAN_EMAIL, DEMO_PASSWORD).await;
    let (status, body) = ctx.delete(&format!("/api/v1/users/{}", user_id), &foreman).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx.delete("/api/v1/users/owner01", &owner).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.delete("/api/v1/users/ghost", &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_user_leaves_authored_rows() {
    let ctx = context!();
    let owner = ctx.login_owner().await;
    let (user_id, email) = create_user_via_api(&ctx, &owner, "Foreman").await;
    let user = ctx.login(&email, DEMO_PASSWORD).await;

    let (_, task) = ctx
        .post("/api/v1/projects/proj_alpha/tasks", &user, json!({ "title": "Pour footing" }))
        .await;
    let task_uri = format!("/api/v1/tasks/{}", task["id"]);
    ctx.post(&format!("{}/comments", task_uri), &user, json!({ "comment_text": "Poured" }))
        .await;

    let (status, body) = ctx.delete(&format!("/api/v1/users/{}", user_id), &owner).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);

    let (status, task) = ctx.get(&task_uri, &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["creator_id"], serde_json::Value::Null);
    assert_eq!(task["assignee_id"], serde_json::Value::Null);
    assert_eq!(task["assignee_name"], serde_json::Value::Null);

    let (_, comments) = ctx.get(&format!("{}/comments", task_uri), &owner).await;
    assert_eq!(comments[0]["comment_text"], "Poured");
    assert_eq!(comments[0]["user_id"], serde_json::Value::Null);

    // The deleted user's session is gone with them
    let (status, _) = ctx.get("/api/v1/session", &user).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_project_owner_is_conflict() {
    let ctx = context!();
    let owner = ctx.login_owner().await;
    let (user_id, email) = create_user_via_api(&ctx, &owner, "Foreman").await;
    let user = ctx.login(&email, DEMO_PASSWORD).await;

    let (status, _) = ctx
        .post("/api/v1/projects", &user, json!({ "name": "Side Job" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx.delete(&format!("/api/v1/users/{}", user_id), &owner).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_project_enrolls_owner() {
    let ctx = context!();
    let owner = ctx.login_owner().await;
    let project_id = unique("proj");

    let (status, project) = ctx
        .post(
            "/api/v1/projects",
            &owner,
            json!({ "id": project_id, "name": "Warehouse Retrofit" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["owner_id"], "owner01");

    let (_, members) = ctx
        .get(&format!("/api/v1/projects/{}/members", project_id), &owner)
        .await;
    assert_eq!(members.as_array().unwrap().len(), 1);
    assert_eq!(members[0]["id"], "owner01");

    let (status, _) = ctx
        .post("/api/v1/projects", &owner, json!({ "id": project_id, "name": "Again" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, projects) = ctx.get("/api/v1/projects", &owner).await;
    assert!(projects
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["id"] == project_id.as_str()));
}

#[tokio::test]
async fn test_add_member() {
    let ctx = context!();
    let owner = ctx.login_owner().await;
    let (user_id, _) = create_user_via_api(&ctx, &owner, "Worker").await;
    let uri = format!("/api/v1/projects/proj_beta/members/{}", user_id);

    let worker = ctx.login(WORKER_EMAIL, DEMO_PASSWORD).await;
    let (status, _) = ctx.put(&uri, &worker, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let foreman = ctx.login(FOREMAN_EMAIL, DEMO_PASSWORD).await;
    let (status, body) = ctx.put(&uri, &foreman, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["added"], true);

    let (status, body) = ctx.put(&uri, &foreman, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], false);

    let (status, _) = ctx
        .put("/api/v1/projects/proj_beta/members/ghost", &foreman, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invitations() {
    let ctx = context!();
    let owner = ctx.login_owner().await;
    let uri = "/api/v1/projects/proj_alpha/invitations";
    let email = format!("{}@invitee.workbuddy.pro", unique("invitee"));

    let foreman = ctx.login(FOREMAN_EMAIL, DEMO_PASSWORD).await;
    let (status, _) = ctx
        .post(uri, &foreman, json!({ "email": email, "role": "Worker" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .post(uri, &owner, json!({ "email": email, "role": "Owner" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post(uri, &owner, json!({ "email": WORKER_EMAIL, "role": "Worker" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .post(
            "/api/v1/projects/proj_missing/invitations",
            &owner,
            json!({ "email": email, "role": "Worker" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .post(uri, &owner, json!({ "email": email, "role": "Foreman" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["role"], "Foreman");
    let token = body["token"].as_str().unwrap();
    assert_eq!(
        body["invite_link"],
        format!("https://app.workbuddy.test/register?token={}", token)
    );

    let (status, _) = ctx
        .post(uri, &owner, json!({ "email": email.to_uppercase(), "role": "Worker" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_chat_message_fans_out_once() {
    let ctx = context!();
    let cookie = ctx.login(WORKER_EMAIL, DEMO_PASSWORD).await;
    let conversation_id = unique("site");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection_id = ctx.state.hub.next_connection_id();
    ctx.state.hub.join(&conversation_id, connection_id, tx.clone()).await;
    // A repeated join must not duplicate delivery
    ctx.state.hub.join(&conversation_id, connection_id, tx).await;

    let uri = format!("/api/v1/chat/{}/messages", conversation_id);

    let (status, _) = ctx.post(&uri, &cookie, json!({ "message_text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, posted) = ctx
        .post(&uri, &cookie, json!({ "message_text": "Crane arrives at 9" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["user_id"], "workerY");

    assert_eq!(
        Message::count_for_conversation(&ctx.state.db, &conversation_id)
            .await
            .unwrap(),
        1
    );

    match rx.try_recv() {
        Ok(ServerEvent::NewMessage(message)) => {
            assert_eq!(serde_json::json!(message.id), posted["id"]);
            assert_eq!(message.message_text, "Crane arrives at 9");
        }
        other => panic!("expected new_message, got {:?}", other),
    }
    assert!(rx.try_recv().is_err());

    let (status, history) = ctx.get(&uri, &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["user_name"], "Worker Carol");
}

#[tokio::test]
async fn test_chat_post_without_subscribers() {
    let ctx = context!();
    let cookie = ctx.login_owner().await;
    let uri = format!("/api/v1/chat/{}/messages", unique("empty"));

    let (status, posted) = ctx.post(&uri, &cookie, json!({ "message_text": "anyone?" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["message_text"], "anyone?");
}
