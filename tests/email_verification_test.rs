use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

mod common;
use common::{test_email, test_password, EmailKind, TestContext};

use gatehouse::modules::auth::interface::TokenStore;
use gatehouse::modules::auth::model::TokenRecord;
use gatehouse::modules::auth::tokens::TokenKind;

#[tokio::test]
async fn consuming_the_token_verifies_the_account() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({
            "email": &email,
            "name": "Test User",
            "password": test_password()
        }))
        .await;

    let sent = ctx.outbox.last(EmailKind::Verification).await.unwrap();

    let response = ctx
        .server
        .post("/auth/new-verification")
        .json(&json!({ "token": sent.token }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], "Email verified!");

    let user = ctx.store.user_by_email(&email).await.unwrap();
    assert!(user.email_verified.is_some());
}

#[tokio::test]
async fn a_token_can_only_be_consumed_once() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({
            "email": &email,
            "name": "Test User",
            "password": test_password()
        }))
        .await;

    let sent = ctx.outbox.last(EmailKind::Verification).await.unwrap();

    ctx.server
        .post("/auth/new-verification")
        .json(&json!({ "token": sent.token }))
        .await
        .assert_status(StatusCode::OK);

    // The consuming transaction deleted the token; replaying fails.
    let replay = ctx
        .server
        .post("/auth/new-verification")
        .json(&json!({ "token": sent.token }))
        .await;
    replay.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = replay.json();
    assert_eq!(body["error"], "Invalid token!");

    assert_eq!(ctx.store.token_count(TokenKind::Verification).await, 0);
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/new-verification")
        .json(&json!({ "token": "no-such-token" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid token!");
}

#[tokio::test]
async fn expired_token_is_rejected_and_leaves_the_user_unverified() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({
            "email": &email,
            "name": "Test User",
            "password": test_password()
        }))
        .await;

    // Replace the live token with one already past its TTL.
    let expired = TokenRecord::new(
        &email,
        "expired-token".to_string(),
        Utc::now() - Duration::minutes(1),
    );
    ctx.store
        .verification_tokens()
        .replace(&expired)
        .await
        .unwrap();

    let response = ctx
        .server
        .post("/auth/new-verification")
        .json(&json!({ "token": "expired-token" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Token has expired!");

    let user = ctx.store.user_by_email(&email).await.unwrap();
    assert!(user.email_verified.is_none());
}
