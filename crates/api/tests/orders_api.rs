//! Integration tests for the `/orders` endpoints and order simulation.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, get_auth, patch_json_auth, post_json, user_token, FakeGateway,
};
use mailroom_core::types::DbId;
use mailroom_db::repositories::UserRepo;
use serde_json::{json, Value};
use sqlx::PgPool;

async fn simulate(pool: &PgPool, session_id: &str, email: &str, workspace: &str) -> Value {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/dev/simulate-order",
        json!({
            "sessionId": session_id,
            "customerEmail": email,
            "customerName": "Test Buyer",
            "quantity": 2,
            "workspaceName": workspace
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["order"].clone()
}

async fn user_id(pool: &PgPool, email: &str) -> DbId {
    UserRepo::find_by_email(pool, email).await.unwrap().unwrap().id
}

fn order_uri(order: &Value) -> String {
    format!("/api/v1/orders/{}", order["id"])
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn simulation_is_idempotent_and_generates_session_ids(pool: PgPool) {
    let first = simulate(&pool, "cs_test_same", "a@acme.io", "Acme").await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/dev/simulate-order",
        json!({ "sessionId": "cs_test_same", "customerEmail": "a@acme.io", "quantity": 9 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["created"], false);
    assert_eq!(json["data"]["order"]["id"], first["id"]);
    assert_eq!(json["data"]["order"]["quantity"], 2);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/dev/simulate-order",
        json!({ "customerEmail": "a@acme.io", "quantity": 1 }),
    )
    .await;
    let json = body_json(response).await;
    let generated = json["data"]["order"]["sessionId"].as_str().unwrap();
    assert!(generated.starts_with("cs_test_"));
    assert!(json["data"]["order"]["orderNumber"]
        .as_str()
        .unwrap()
        .starts_with("ORD-"));
}

#[tokio::test]
async fn simulation_is_hidden_unless_enabled() {
    let mut config = common::test_config();
    config.allow_order_simulation = false;
    let app = common::build_test_app_with(
        common::lazy_pool(),
        config,
        Arc::new(FakeGateway::default()),
    );

    let response = post_json(
        app,
        "/api/v1/dev/simulate-order",
        json!({ "customerEmail": "a@acme.io", "quantity": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Administrative status transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delivered_stamps_fulfillment_and_terminal_moves_conflict(pool: PgPool) {
    let order = simulate(&pool, "cs_test_admin", "b@acme.io", "Bravo").await;
    let admin = admin_token(user_id(&pool, "b@acme.io").await);

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&order),
        json!({ "status": "PENDING" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "PENDING");
    assert!(json["data"]["fulfilledAt"].is_null());

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&order),
        json!({ "status": "DELIVERED" }),
        &admin,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "DELIVERED");
    assert!(json["data"]["fulfilledAt"].is_string());

    // Same status again is a no-op.
    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&order),
        json!({ "status": "DELIVERED" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Delivered orders cannot go back to pending.
    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&order),
        json!({ "status": "PENDING" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&order),
        json!({ "status": "CANCELLED" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Cancelled is terminal.
    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&order),
        json!({ "status": "DELIVERED" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_order_returns_404(pool: PgPool) {
    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/orders/999999",
        json!({ "status": "PENDING" }),
        &admin_token(1),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/orders/999999",
        &admin_token(1),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_detail_includes_related_records(pool: PgPool) {
    let order = simulate(&pool, "cs_test_detail", "c@acme.io", "Charlie").await;
    let owner = user_token(user_id(&pool, "c@acme.io").await);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&order),
        &owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["id"], order["id"]);
    assert_eq!(data["workspace"]["slug"], "charlie");
    assert_eq!(data["client"]["email"], "c@acme.io");
    assert_eq!(data["client"]["products"], json!(["email_inboxes"]));
    assert!(data["onboardingData"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn users_only_see_orders_of_their_workspaces(pool: PgPool) {
    let mine = simulate(&pool, "cs_test_mine", "d@acme.io", "Delta").await;
    let theirs = simulate(&pool, "cs_test_theirs", "e@acme.io", "Echo").await;
    let me = user_token(user_id(&pool, "d@acme.io").await);

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/orders", &me).await;
    let json = body_json(response).await;
    let ids: Vec<&Value> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| &o["id"])
        .collect();
    assert_eq!(ids, vec![&mine["id"]]);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&theirs),
        &me,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/orders?workspaceId={}", theirs["workspaceId"]);
    let response = get_auth(common::build_test_app(pool.clone()), &uri, &me).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = admin_token(user_id(&pool, "e@acme.io").await);
    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/orders", &admin).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/orders?status=PLACED&limit=1",
        &admin,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/orders?status=bogus",
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrongly_typed_status_returns_json_400(pool: PgPool) {
    let order = simulate(&pool, "cs_test_typed", "t@acme.io", "Tango").await;
    let admin = admin_token(user_id(&pool, "t@acme.io").await);

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &order_uri(&order),
        json!({ "status": 5 }),
        &admin,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].is_string());
}

// ---------------------------------------------------------------------------
// Tenant isolation at purchase time
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn lookalike_workspace_name_does_not_grant_access(pool: PgPool) {
    let victim = simulate(&pool, "cs_test_victim", "ceo@victim.io", "Victim Corp").await;
    let attacker = simulate(&pool, "cs_test_attacker", "eve@evil.io", "Victim Corp!!").await;
    assert_ne!(attacker["workspaceId"], victim["workspaceId"]);

    let eve = user_token(user_id(&pool, "eve@evil.io").await);

    let response = get_auth(common::build_test_app(pool.clone()), &order_uri(&victim), &eve).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/workspaces/{}", victim["workspaceId"]);
    let response = get_auth(common::build_test_app(pool.clone()), &uri, &eve).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/dev/simulate-order",
        json!({
            "sessionId": "cs_test_by_id",
            "customerEmail": "eve@evil.io",
            "quantity": 1,
            "workspaceId": victim["workspaceId"].to_string()
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_ne!(json["data"]["order"]["workspaceId"], victim["workspaceId"]);

    let response = get_auth(common::build_test_app(pool), "/api/v1/orders", &eve).await;
    let json = body_json(response).await;
    let workspaces: Vec<&Value> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| &o["workspaceId"])
        .collect();
    assert!(!workspaces.contains(&&victim["workspaceId"]));
}
