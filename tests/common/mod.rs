use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::json;
use tokio::sync::Mutex;

use gatehouse::config::TokenTtls;
use gatehouse::modules::auth::guard::RouteTable;
use gatehouse::modules::auth::interface::{Mailer, Result};
use gatehouse::modules::auth::memory::MemoryStore;
use gatehouse::modules::auth::session::SessionService;
use gatehouse::modules::auth::tokens::TokenService;
use gatehouse::services::jwt::JwtService;
use gatehouse::{create_app, AppState};

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Verification,
    PasswordReset,
    TwoFactor,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub kind: EmailKind,
    pub to: String,
    pub token: String,
}

/// Mailer that records instead of delivering, so tests can read the
/// tokens a real user would receive out-of-band.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }

    pub async fn last(&self, kind: EmailKind) -> Option<SentEmail> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|e| e.kind == kind)
            .cloned()
    }

    async fn record(&self, kind: EmailKind, to: &str, token: &str) {
        self.sent.lock().await.push(SentEmail {
            kind,
            to: to.to_string(),
            token: token.to_string(),
        });
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<()> {
        self.record(EmailKind::Verification, email, token).await;
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<()> {
        self.record(EmailKind::PasswordReset, email, token).await;
        Ok(())
    }

    async fn send_two_factor_email(&self, email: &str, code: &str) -> Result<()> {
        self.record(EmailKind::TwoFactor, email, code).await;
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub outbox: Arc<RecordingMailer>,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        let store = MemoryStore::shared();
        let outbox = Arc::new(RecordingMailer::default());

        let jwt_service =
            JwtService::new("test-secret-key-for-testing-only".to_string(), 900);

        let tokens = TokenService::new(
            store.verification_tokens(),
            store.password_reset_tokens(),
            store.two_factor_tokens(),
            TokenTtls::default(),
        );

        let sessions = SessionService::new(
            jwt_service,
            store.users(),
            store.accounts(),
            store.confirmations(),
        );

        let state = AppState {
            users: store.users(),
            accounts: store.accounts(),
            confirmations: store.confirmations(),
            tokens,
            mailer: outbox.clone(),
            sessions,
            routes: RouteTable::for_api_server(),
        };

        let server = TestServer::new(create_app(state).await).expect("Failed to create test server");

        Self {
            server,
            store,
            outbox,
        }
    }

    /// Register an account and consume its verification email, leaving a
    /// user that can actually log in.
    pub async fn create_verified_user(&self, email: &str) {
        self.server
            .post("/auth/register")
            .json(&json!({
                "email": email,
                "name": "Test User",
                "password": test_password()
            }))
            .await;

        let sent = self
            .outbox
            .last(EmailKind::Verification)
            .await
            .expect("registration did not send a verification email");

        self.server
            .post("/auth/new-verification")
            .json(&json!({ "token": sent.token }))
            .await;
    }

    /// Log in and return the bearer token.
    pub async fn login_token(&self, email: &str) -> String {
        let response = self
            .server
            .post("/auth/login")
            .json(&json!({
                "email": email,
                "password": test_password()
            }))
            .await;

        let body: serde_json::Value = response.json();
        body["access_token"]
            .as_str()
            .expect("login did not return an access token")
            .to_string()
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}

// Helper to generate test password
#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}
