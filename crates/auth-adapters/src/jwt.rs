//! # JwtTokenDecoder
//!
//! Reads the claims of a session token without checking its signature.
//! The client has no key; it only needs `sub`, `id`, `email` and `exp` to
//! decide whether a session is worth restoring.

use chrono::DateTime;
use domains::{Result, TokenDecoder, TokenIdentity};
use jsonwebtoken::dangerous::insecure_decode;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::TokenError;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    /// Numeric on some deployments; only UUID strings are used.
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    email: Option<String>,
    exp: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JwtTokenDecoder;

impl JwtTokenDecoder {
    pub fn new() -> Self {
        Self
    }

    /// No claim is validated here; expiry is judged by the session store
    /// against its own clock.
    pub fn decode_identity(&self, token: &str) -> std::result::Result<TokenIdentity, TokenError> {
        let data = insecure_decode::<Claims>(token)?;
        let claims = data.claims;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::InvalidExpiry(claims.exp))?;
        let user_id = claims
            .id
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());
        Ok(TokenIdentity {
            subject: claims.sub,
            user_id,
            email: claims.email,
            expires_at,
        })
    }
}

impl TokenDecoder for JwtTokenDecoder {
    fn decode(&self, token: &str) -> Result<TokenIdentity> {
        Ok(self.decode_identity(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn sign(claims: Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server-only-secret"),
        )
        .unwrap()
    }

    #[test]
    fn reads_claims_without_the_signing_key() {
        let id = Uuid::new_v4();
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign(json!({ "sub": "violet", "id": id.to_string(), "email": "violet@cho.example", "exp": exp }));

        let identity = JwtTokenDecoder::new().decode_identity(&token).unwrap();

        assert_eq!(identity.subject, "violet");
        assert_eq!(identity.user_id, Some(id));
        assert_eq!(identity.email.as_deref(), Some("violet@cho.example"));
        assert_eq!(identity.expires_at.timestamp(), exp);
    }

    #[test]
    fn expired_token_still_decodes() {
        let exp = (Utc::now() - Duration::days(1)).timestamp();
        let token = sign(json!({ "sub": "gilbert", "id": 7, "exp": exp }));

        let identity = JwtTokenDecoder::new().decode_identity(&token).unwrap();
        assert!(identity.is_expired_at(Utc::now()));
        assert_eq!(identity.user_id, None);
    }

    #[test]
    fn garbage_is_rejected() {
        let err = JwtTokenDecoder::new().decode("not-a-token").unwrap_err();
        assert!(matches!(err, domains::AppError::Storage(_)));
    }
}
