//! Backend auth session.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in user, persisted locally under `supabase_session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Password grant response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: TokenUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_into_session() {
        let body = serde_json::json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r1",
            "user": {"id": "u-1", "email": "a@b.c"}
        });
        let now = Utc::now();
        let token: TokenResponse = serde_json::from_value(body).unwrap();
        let session = token.into_session(now);
        assert_eq!(session.user_id, "u-1");
        assert_eq!(session.expires_at, Some(now + Duration::seconds(3600)));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::seconds(3601)));
    }
}
