use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::auth::model::UserRole;

/// Session claims. Everything beyond the registered claims is stamped by
/// session enrichment at issuance; `GET /auth/me` re-resolves the user
/// instead of trusting these, so role changes land on the next read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub is_oauth: bool,
    pub is_two_factor_enabled: bool,
    pub exp: i64, // expiration time
    pub iat: i64, // issued at
    pub jti: String, // unique token id
}

pub struct JwtService {
    secret: String,
    session_duration: Duration,
}

impl JwtService {
    pub fn new(secret: String, session_ttl_secs: i64) -> Self {
        Self {
            secret,
            session_duration: Duration::seconds(session_ttl_secs),
        }
    }

    pub fn create_session_token(
        &self,
        user_id: &str,
        email: &str,
        name: Option<&str>,
        role: UserRole,
        is_oauth: bool,
        is_two_factor_enabled: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + self.session_duration;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
            role,
            is_oauth,
            is_two_factor_enabled,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn verify_session_token(
        &self,
        token: &str,
    ) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
    }

    pub fn session_duration_secs(&self) -> i64 {
        self.session_duration.num_seconds()
    }
}
