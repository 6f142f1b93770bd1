//! Session restore through the real token adapters.

use std::sync::Arc;

use auth_adapters::{JwtTokenDecoder, MemoryTokenStorage};
use chrono::{Duration, Utc};
use domains::TokenStorage;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use services::{SessionStatus, SessionStore};
use uuid::Uuid;

fn token(exp_offset: Duration, id: Uuid) -> String {
    let claims = json!({
        "sub": "kaguya",
        "id": id.to_string(),
        "email": "kaguya@shuchiin.example",
        "exp": (Utc::now() + exp_offset).timestamp(),
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend")).unwrap()
}

#[test]
fn expired_token_reverts_to_signed_out_and_is_forgotten() {
    let storage = Arc::new(MemoryTokenStorage::with_token(token(
        -Duration::minutes(5),
        Uuid::new_v4(),
    )));
    let session = SessionStore::new(storage.clone(), Arc::new(JwtTokenDecoder::new()));

    assert_eq!(session.load(), SessionStatus::Expired);
    assert!(storage.get_token().is_none());
    assert!(session.viewer().is_none());
}

#[test]
fn fresh_token_survives_a_restart() {
    let id = Uuid::new_v4();
    let storage = Arc::new(MemoryTokenStorage::new());
    let decoder = Arc::new(JwtTokenDecoder::new());

    let first = SessionStore::new(storage.clone(), decoder.clone());
    first.sign_in(&token(Duration::hours(1), id)).unwrap();

    let second = SessionStore::new(storage, decoder);
    assert_eq!(second.load(), SessionStatus::Authenticated);
    assert_eq!(second.user_id(), Some(id));

    second.sign_out().unwrap();
    assert_eq!(second.load(), SessionStatus::Anonymous);
}
