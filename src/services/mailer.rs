use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::modules::auth::interface::{AuthError, Mailer, Result};

/// Mailer backed by an HTTP email API (Resend-style `POST /emails` with a
/// bearer key). Delivery failure is fatal to the operation that requested
/// it; flows never report success for a message that was not accepted.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
    base_url: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            from,
            base_url,
        }
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| AuthError::Mail(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Mail(format!(
                "mail API returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<()> {
        let link = format!("{}/auth/new-verification?token={token}", self.base_url);
        self.send(
            email,
            "Confirm your email",
            format!(r#"<p>Click <a href="{link}">here</a> to confirm your email.</p>"#),
        )
        .await
    }

    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<()> {
        let link = format!("{}/auth/new-password?token={token}", self.base_url);
        self.send(
            email,
            "Reset your password",
            format!(r#"<p>Click <a href="{link}">here</a> to reset your password.</p>"#),
        )
        .await
    }

    async fn send_two_factor_email(&self, email: &str, code: &str) -> Result<()> {
        self.send(
            email,
            "Your two-factor code",
            format!("<p>Your two-factor code: {code}</p>"),
        )
        .await
    }
}

/// Local dev sender that logs instead of delivering.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<()> {
        tracing::info!(%email, %token, "verification email (log only)");
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<()> {
        tracing::info!(%email, %token, "password reset email (log only)");
        Ok(())
    }

    async fn send_two_factor_email(&self, email: &str, code: &str) -> Result<()> {
        tracing::info!(%email, %code, "two-factor email (log only)");
        Ok(())
    }
}
