//! HS256 session and password-reset tokens

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Regular signed-in session
    Access,
    /// Token mailed for a password reset, spent by the change it allows
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
    /// Reset tokens only: stamp of the password hash they may replace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<String>,
}

/// Signed token plus its expiry
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, reset_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            reset_ttl,
        }
    }

    pub fn issue_access(&self, user_id: Uuid, email: &str) -> Result<IssuedToken, AuthError> {
        self.issue(user_id, email, TokenPurpose::Access, self.access_ttl, None)
    }

    /// Reset token bound to `stamp`; it stops working once the password
    /// behind the stamp is replaced.
    pub fn issue_reset(
        &self,
        user_id: Uuid,
        email: &str,
        stamp: &str,
    ) -> Result<IssuedToken, AuthError> {
        self.issue(user_id, email, TokenPurpose::Reset, self.reset_ttl, Some(stamp))
    }

    fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        purpose: TokenPurpose,
        ttl: Duration,
        stamp: Option<&str>,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            purpose,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            stamp: stamp.map(str::to_string),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and expiry, and that the purpose is one of `accepted`.
    pub fn verify(&self, token: &str, accepted: &[TokenPurpose]) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

        if !accepted.contains(&data.claims.purpose) {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "test-secret-that-is-at-least-32-bytes!",
            Duration::hours(1),
            Duration::minutes(10),
        )
    }

    #[test]
    fn access_token_roundtrip() {
        let user = Uuid::new_v4();
        let issued = issuer().issue_access(user, "noa@example.com").unwrap();

        let claims = issuer()
            .verify(&issued.token, &[TokenPurpose::Access])
            .unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.email, "noa@example.com");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn reset_token_is_not_a_session() {
        let issued = issuer()
            .issue_reset(Uuid::new_v4(), "noa@example.com", "c2FsdHNhbHQ")
            .unwrap();

        assert!(matches!(
            issuer().verify(&issued.token, &[TokenPurpose::Access]),
            Err(AuthError::InvalidToken)
        ));
        let claims = issuer()
            .verify(&issued.token, &[TokenPurpose::Access, TokenPurpose::Reset])
            .unwrap();
        assert_eq!(claims.stamp.as_deref(), Some("c2FsdHNhbHQ"));
    }

    #[test]
    fn access_token_has_no_stamp() {
        let issued = issuer().issue_access(Uuid::new_v4(), "a@b.co").unwrap();
        let claims = issuer().verify(&issued.token, &[TokenPurpose::Access]).unwrap();
        assert!(claims.stamp.is_none());
    }

    #[test]
    fn rejects_other_secret() {
        let issued = issuer().issue_access(Uuid::new_v4(), "a@b.co").unwrap();
        let other = TokenIssuer::new(
            "another-secret-that-is-32-bytes-long",
            Duration::hours(1),
            Duration::minutes(10),
        );
        assert!(other.verify(&issued.token, &[TokenPurpose::Access]).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        // Far enough in the past to clear the default 60s leeway
        let expired = TokenIssuer::new(
            "test-secret-that-is-at-least-32-bytes!",
            Duration::hours(-2),
            Duration::minutes(10),
        );
        let issued = expired.issue_access(Uuid::new_v4(), "a@b.co").unwrap();
        assert!(issuer().verify(&issued.token, &[TokenPurpose::Access]).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(issuer().verify("not.a.jwt", &[TokenPurpose::Access]).is_err());
    }
}
