use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::DbPool;

use super::interface::{
    AccountStore, Result, TokenStore, TwoFactorConfirmationStore, UserChanges, UserStore,
};
use super::model::{LinkedAccount, TokenRecord, TwoFactorConfirmation, User};

/// MySQL-backed stores. One pool is shared by every trait impl so the
/// cross-table atomic units can run inside a single transaction.
pub struct MySqlAuthStore {
    pool: DbPool,
}

impl MySqlAuthStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for MySqlAuthStore {
    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, email_verified, role, two_factor_enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.email_verified)
        .bind(user.role)
        .bind(user.two_factor_enabled)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update(&self, user_id: &str, changes: &UserChanges) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(name) = &changes.name {
            sqlx::query("UPDATE users SET name = ? WHERE id = ?")
                .bind(name)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(hash) = &changes.password_hash {
            sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
                .bind(hash)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(role) = changes.role {
            sqlx::query("UPDATE users SET role = ? WHERE id = ?")
                .bind(role)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(enabled) = changes.two_factor_enabled {
            sqlx::query("UPDATE users SET two_factor_enabled = ? WHERE id = ?")
                .bind(enabled)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE users SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn apply_email_verification(
        &self,
        user_id: &str,
        email: &str,
        verified_at: DateTime<Utc>,
        token_id: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE users SET email = ?, email_verified = ?, updated_at = ? WHERE id = ?",
        )
        .bind(email)
        .bind(verified_at)
        .bind(verified_at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM verification_tokens WHERE id = ?")
            .bind(token_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn apply_password_reset(
        &self,
        user_id: &str,
        password_hash: &str,
        token_id: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE id = ?")
            .bind(token_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MySqlAuthStore {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<LinkedAccount>> {
        let account =
            sqlx::query_as::<_, LinkedAccount>("SELECT * FROM linked_accounts WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(account)
    }
}

#[async_trait]
impl TwoFactorConfirmationStore for MySqlAuthStore {
    async fn record_challenge(
        &self,
        confirmation: &TwoFactorConfirmation,
        token_id: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM two_factor_tokens WHERE id = ?")
            .bind(token_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM two_factor_confirmations WHERE user_id = ?")
            .bind(&confirmation.user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO two_factor_confirmations (id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&confirmation.id)
        .bind(&confirmation.user_id)
        .bind(confirmation.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn take_for_user(&self, user_id: &str) -> Result<Option<TwoFactorConfirmation>> {
        let mut tx = self.pool.begin().await?;

        let confirmation = sqlx::query_as::<_, TwoFactorConfirmation>(
            "SELECT * FROM two_factor_confirmations WHERE user_id = ? FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(found) = &confirmation {
            sqlx::query("DELETE FROM two_factor_confirmations WHERE id = ?")
                .bind(&found.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(confirmation)
    }
}

/// Token store over one of the three token tables. The tables share a
/// schema; only the name differs.
pub struct MySqlTokenStore {
    pool: DbPool,
    table: &'static str,
}

impl MySqlTokenStore {
    pub fn verification(pool: DbPool) -> Self {
        Self {
            pool,
            table: "verification_tokens",
        }
    }

    pub fn password_reset(pool: DbPool) -> Self {
        Self {
            pool,
            table: "password_reset_tokens",
        }
    }

    pub fn two_factor(pool: DbPool) -> Self {
        Self {
            pool,
            table: "two_factor_tokens",
        }
    }
}

#[async_trait]
impl TokenStore for MySqlTokenStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(&format!(
            "SELECT * FROM {} WHERE token = ?",
            self.table
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(&format!(
            "SELECT * FROM {} WHERE email = ?",
            self.table
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn replace(&self, record: &TokenRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {} WHERE email = ?", self.table))
            .bind(&record.email)
            .execute(&mut *tx)
            .await?;

        sqlx::query(&format!(
            "INSERT INTO {} (id, email, token, expires_at) VALUES (?, ?, ?, ?)",
            self.table
        ))
        .bind(&record.id)
        .bind(&record.email)
        .bind(&record.token)
        .bind(record.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", self.table))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
