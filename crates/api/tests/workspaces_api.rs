//! Integration tests for workspaces and their clients, domains and inboxes.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{admin_token, body_json, get_auth, post_json_auth, user_token, FakeGateway};
use mailroom_core::types::DbId;
use mailroom_db::repositories::{UserRepo, WorkspaceRepo};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn new_user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::upsert_by_email(pool, email, None).await.unwrap().id
}

async fn create_workspace(pool: &PgPool, token: &str, name: &str) -> (StatusCode, Value) {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/workspaces",
        json!({ "name": name }),
        token,
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

// ---------------------------------------------------------------------------
// Workspaces
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_derives_slug_and_rejects_collisions(pool: PgPool) {
    let owner = user_token(new_user(&pool, "owner@acme.io").await);

    let (status, json) = create_workspace(&pool, &owner, "My Co!").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["slug"], "my-co");
    assert_eq!(json["data"]["name"], "My Co!");

    let (status, json) = create_workspace(&pool, &owner, "  my--co  ").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");

    let (status, _) = create_workspace(&pool, &owner, "!!!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let all = WorkspaceRepo::list(&pool, 50, 0).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn workspaces_are_visible_to_members_and_admins_only(pool: PgPool) {
    let owner_id = new_user(&pool, "owner@acme.io").await;
    let stranger_id = new_user(&pool, "stranger@acme.io").await;
    let owner = user_token(owner_id);
    let stranger = user_token(stranger_id);

    let (_, json) = create_workspace(&pool, &owner, "Acme").await;
    let uri = format!("/api/v1/workspaces/{}", json["data"]["id"]);

    let response = get_auth(common::build_test_app(pool.clone()), &uri, &owner).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(common::build_test_app(pool.clone()), &uri, &stranger).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &uri,
        &admin_token(stranger_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/workspaces",
        &stranger,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"], json!([]));

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/workspaces/999999",
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Clients, domains and inboxes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn tenant_resources_are_scoped_to_the_workspace(pool: PgPool) {
    let owner = user_token(new_user(&pool, "owner@acme.io").await);
    let (_, acme) = create_workspace(&pool, &owner, "Acme").await;
    let (_, other) = create_workspace(&pool, &owner, "Other").await;
    let base = format!("/api/v1/workspaces/{}", acme["data"]["id"]);
    let other_base = format!("/api/v1/workspaces/{}", other["data"]["id"]);

    // Clients: unique per workspace by email.
    let client = json!({ "name": "Wile E.", "email": "Wile@Acme.io", "products": ["email_inboxes"] });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{base}/clients"),
        client.clone(),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["email"], "wile@acme.io");

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{base}/clients"),
        client,
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Domains: names are validated and normalized.
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{base}/domains"),
        json!({ "name": "not a domain" }),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{base}/domains"),
        json!({ "name": "Mail.Acme.io" }),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let domain = body_json(response).await["data"].clone();
    assert_eq!(domain["name"], "mail.acme.io");
    assert_eq!(domain["status"], "PENDING");

    // Inboxes: the domain must belong to the same workspace.
    let inbox = json!({
        "domainId": domain["id"],
        "localPart": "Ana",
        "firstName": "Ana",
        "lastName": "Trujillo"
    });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{other_base}/inboxes"),
        inbox.clone(),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{base}/inboxes"),
        inbox,
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await["data"]["emailAddress"],
        "ana@mail.acme.io"
    );

    for (path, expected) in [("clients", 1), ("domains", 1), ("inboxes", 1)] {
        let response = get_auth(
            common::build_test_app(pool.clone()),
            &format!("{base}/{path}"),
            &owner,
        )
        .await;
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), expected, "{path}");
    }
}

// ---------------------------------------------------------------------------
// Billing portal
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn billing_portal_requires_a_billing_customer(pool: PgPool) {
    let owner_id = new_user(&pool, "owner@acme.io").await;
    let owner = user_token(owner_id);
    let (_, json) = create_workspace(&pool, &owner, "Acme").await;
    let workspace_id: DbId = json["data"]["id"].as_i64().unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let app = || {
        common::build_test_app_with(pool.clone(), common::test_config(), gateway.clone())
    };

    let response = post_json_auth(
        app(),
        "/api/v1/billing/portal",
        json!({ "workspaceId": workspace_id }),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    WorkspaceRepo::set_billing_customer(&pool, workspace_id, "cus_42")
        .await
        .unwrap();

    let response = post_json_auth(
        app(),
        "/api/v1/billing/portal",
        json!({ "workspaceId": workspace_id }),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["url"],
        "https://billing.example/session/cus_42"
    );

    let calls = gateway.portal_requests.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "cus_42");
    assert!(calls[0].1.ends_with(&format!("/workspaces/{workspace_id}")));
}
