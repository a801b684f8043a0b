use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

mod common;
use common::{test_email, test_password, EmailKind, TestContext};

use gatehouse::modules::auth::model::{LinkedAccount, User, UserRole};
use gatehouse::modules::auth::tokens::TokenKind;

#[tokio::test]
async fn settings_requires_a_session() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/settings")
        .json(&json!({ "name": "New Name" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn name_change_shows_up_on_the_next_session_read() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.create_verified_user(&email).await;
    let token = ctx.login_token(&email).await;

    let response = ctx
        .server
        .post("/auth/settings")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Renamed User" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], "Settings updated!");

    // Same token, refreshed projection.
    let me = ctx
        .server
        .get("/auth/me")
        .authorization_bearer(&token)
        .await;
    let body: serde_json::Value = me.json();
    assert_eq!(body["name"], "Renamed User");
}

#[tokio::test]
async fn email_change_only_sends_verification_for_the_new_address() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let new_email = test_email();
    ctx.create_verified_user(&email).await;
    let token = ctx.login_token(&email).await;

    let response = ctx
        .server
        .post("/auth/settings")
        .authorization_bearer(&token)
        .json(&json!({ "email": &new_email }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], "Verification email sent!");

    // Nothing changed yet; the token went to the DESTINATION address.
    let user = ctx.store.user_by_email(&email).await.unwrap();
    assert_eq!(user.email, email);
    let sent = ctx.outbox.last(EmailKind::Verification).await.unwrap();
    assert_eq!(sent.to, new_email);
    assert_eq!(
        ctx.store
            .tokens_for_email(TokenKind::Verification, &new_email)
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn email_change_to_a_taken_address_conflicts() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let other = test_email();
    ctx.create_verified_user(&email).await;
    ctx.create_verified_user(&other).await;
    let token = ctx.login_token(&email).await;

    let response = ctx
        .server
        .post("/auth/settings")
        .authorization_bearer(&token)
        .json(&json!({ "email": &other }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Email already in use!");
}

#[tokio::test]
async fn password_change_requires_the_current_password() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.create_verified_user(&email).await;
    let token = ctx.login_token(&email).await;

    let wrong = ctx
        .server
        .post("/auth/settings")
        .authorization_bearer(&token)
        .json(&json!({
            "password": "NotMyPassword1!",
            "new_password": "FreshPassword1!"
        }))
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = wrong.json();
    assert_eq!(body["error"], "Incorrect password!");

    let right = ctx
        .server
        .post("/auth/settings")
        .authorization_bearer(&token)
        .json(&json!({
            "password": test_password(),
            "new_password": "FreshPassword1!"
        }))
        .await;
    right.assert_status(StatusCode::OK);

    ctx.server
        .post("/auth/login")
        .json(&json!({ "email": &email, "password": "FreshPassword1!" }))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn oauth_accounts_cannot_touch_credentials_settings() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let now = Utc::now();
    let user_id = uuid::Uuid::new_v4().to_string();

    ctx.store
        .insert_user(User {
            id: user_id.clone(),
            name: Some("OAuth User".to_string()),
            email: email.clone(),
            password_hash: None,
            email_verified: Some(now),
            role: UserRole::User,
            two_factor_enabled: false,
            created_at: now,
            updated_at: now,
        })
        .await;
    ctx.store
        .insert_account(LinkedAccount {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.clone(),
            provider: "github".to_string(),
            provider_account_id: "gh-1".to_string(),
            created_at: now,
        })
        .await;

    // Forge a session the way the issuer would after an OAuth sign-in.
    let jwt = gatehouse::services::jwt::JwtService::new(
        "test-secret-key-for-testing-only".to_string(),
        900,
    );
    let token = jwt
        .create_session_token(&user_id, &email, Some("OAuth User"), UserRole::User, true, false)
        .unwrap();

    let attempted_email = test_email();
    let response = ctx
        .server
        .post("/auth/settings")
        .authorization_bearer(&token)
        .json(&json!({
            "email": &attempted_email,
            "is_two_factor_enabled": true,
            "name": "Still Allowed"
        }))
        .await;

    // The provider-owned fields are ignored, the rest applies.
    response.assert_status(StatusCode::OK);
    let user = ctx.store.user_by_email(&email).await.unwrap();
    assert_eq!(user.email, email);
    assert!(!user.two_factor_enabled);
    assert_eq!(user.name.as_deref(), Some("Still Allowed"));
    assert_eq!(ctx.store.token_count(TokenKind::Verification).await, 0);
}

#[tokio::test]
async fn stale_session_for_a_deleted_user_is_unauthorized() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.create_verified_user(&email).await;
    let token = ctx.login_token(&email).await;

    let user = ctx.store.user_by_email(&email).await.unwrap();
    ctx.store.remove_user(&user.id).await;

    let response = ctx
        .server
        .post("/auth/settings")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Ghost" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}
