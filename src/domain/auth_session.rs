use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

const CSRF_TOKEN_SIZE: usize = 32;

/// A logged-in browser session.
///
/// Created at login, destroyed at logout or once `expires_at` has passed.
/// Every request handler receives it explicitly from the auth guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub id: String,
    pub user_id: i64,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn start(user_id: i64, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            csrf_token: generate_csrf_token(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn verify_csrf(&self, submitted: &str) -> bool {
        let expected = self.csrf_token.as_bytes();
        let submitted = submitted.as_bytes();
        expected.len() == submitted.len() && bool::from(expected.ct_eq(submitted))
    }
}

/// URL-safe base64 of 32 random bytes.
pub fn generate_csrf_token() -> String {
    let mut token = [0u8; CSRF_TOKEN_SIZE];
    OsRng.fill_bytes(&mut token);
    general_purpose::URL_SAFE_NO_PAD.encode(token)
}
