//! # Session Store
//!
//! Who the viewer is, derived from the persisted token. The token is only
//! decoded here, never verified; the server stays the authority.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{AppError, BlogApi, Result, Role, TokenDecoder, TokenIdentity, TokenStorage, User};
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::comments::Viewer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Authenticated,
    /// A token was found but its expiry had passed; it has been cleared.
    Expired,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub identity: Option<TokenIdentity>,
    /// Full profile, once `refresh_profile` ran.
    pub user: Option<User>,
}

impl SessionState {
    pub fn user_id(&self) -> Option<Uuid> {
        let identity = self.identity.as_ref()?;
        identity
            .user_id
            .or_else(|| Uuid::parse_str(&identity.subject).ok())
    }
}

pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    decoder: Arc<dyn TokenDecoder>,
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>, decoder: Arc<dyn TokenDecoder>) -> Self {
        Self {
            storage,
            decoder,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.lock().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.state.lock().user_id()
    }

    /// The acting viewer for ownership checks. Role defaults to `User`
    /// until the profile has been fetched.
    pub fn viewer(&self) -> Option<Viewer> {
        let state = self.state.lock();
        if state.status != SessionStatus::Authenticated {
            return None;
        }
        let id = state.user_id()?;
        let role = state.user.as_ref().map(|u| u.role).unwrap_or(Role::User);
        Some(Viewer { id, role })
    }

    /// Restores the session from storage.
    pub fn load(&self) -> SessionStatus {
        self.load_at(Utc::now())
    }

    pub fn load_at(&self, now: DateTime<Utc>) -> SessionStatus {
        let Some(token) = self.storage.get_token() else {
            *self.state.lock() = SessionState::default();
            return SessionStatus::Anonymous;
        };

        let identity = match self.decoder.decode(token.expose_secret()) {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "stored token unreadable; signing out");
                self.discard_token();
                *self.state.lock() = SessionState::default();
                return SessionStatus::Anonymous;
            }
        };

        if identity.is_expired_at(now) {
            info!(expired_at = %identity.expires_at, "session expired");
            self.discard_token();
            *self.state.lock() = SessionState {
                status: SessionStatus::Expired,
                ..Default::default()
            };
            return SessionStatus::Expired;
        }

        info!(subject = %identity.subject, "session restored");
        *self.state.lock() = SessionState {
            status: SessionStatus::Authenticated,
            identity: Some(identity),
            user: None,
        };
        SessionStatus::Authenticated
    }

    /// Adopts a freshly issued token. An already expired token is refused.
    pub fn sign_in(&self, token: &str) -> Result<TokenIdentity> {
        let identity = self.decoder.decode(token)?;
        if identity.is_expired_at(Utc::now()) {
            return Err(AppError::AuthExpired);
        }
        self.storage.set_token(token)?;
        info!(subject = %identity.subject, "signed in");
        *self.state.lock() = SessionState {
            status: SessionStatus::Authenticated,
            identity: Some(identity.clone()),
            user: None,
        };
        Ok(identity)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.storage.clear_token()?;
        *self.state.lock() = SessionState::default();
        info!("signed out");
        Ok(())
    }

    /// Fetches the full profile of the signed-in user.
    #[instrument(skip(self, api))]
    pub async fn refresh_profile(&self, api: &dyn BlogApi) -> Result<User> {
        let user_id = self
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("no active session".into()))?;
        let user = api.get_user(user_id).await?;
        self.state.lock().user = Some(user.clone());
        Ok(user)
    }

    fn discard_token(&self) {
        if let Err(err) = self.storage.clear_token() {
            warn!(error = %err, "could not clear stored token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domains::{MockTokenDecoder, MockTokenStorage};
    use secrecy::SecretString;

    fn identity(expires_at: DateTime<Utc>) -> TokenIdentity {
        TokenIdentity {
            subject: "maomao".into(),
            user_id: Some(Uuid::new_v4()),
            email: Some("maomao@example.com".into()),
            expires_at,
        }
    }

    fn storage_with_token() -> MockTokenStorage {
        let mut storage = MockTokenStorage::new();
        storage
            .expect_get_token()
            .returning(|| Some(SecretString::from("header.payload.sig")));
        storage
    }

    #[test]
    fn expired_token_is_cleared_and_session_reverts() {
        let now = Utc::now();
        let mut storage = storage_with_token();
        storage.expect_clear_token().times(1).returning(|| Ok(()));
        let mut decoder = MockTokenDecoder::new();
        decoder
            .expect_decode()
            .returning(move |_| Ok(identity(now - Duration::minutes(1))));

        let session = SessionStore::new(Arc::new(storage), Arc::new(decoder));

        assert_eq!(session.load_at(now), SessionStatus::Expired);
        assert!(session.viewer().is_none());
        assert!(session.snapshot().identity.is_none());
    }

    #[test]
    fn valid_token_authenticates() {
        let now = Utc::now();
        let storage = storage_with_token();
        let mut decoder = MockTokenDecoder::new();
        let id = identity(now + Duration::hours(1));
        let user_id = id.user_id;
        decoder.expect_decode().returning(move |_| Ok(id.clone()));

        let session = SessionStore::new(Arc::new(storage), Arc::new(decoder));

        assert_eq!(session.load_at(now), SessionStatus::Authenticated);
        assert_eq!(session.user_id(), user_id);
        assert_eq!(session.viewer().map(|v| v.role), Some(Role::User));
    }

    #[test]
    fn missing_token_is_anonymous() {
        let mut storage = MockTokenStorage::new();
        storage.expect_get_token().returning(|| None);
        let session = SessionStore::new(Arc::new(storage), Arc::new(MockTokenDecoder::new()));
        assert_eq!(session.load(), SessionStatus::Anonymous);
    }

    #[test]
    fn sign_in_refuses_expired_token_without_persisting() {
        let mut decoder = MockTokenDecoder::new();
        decoder
            .expect_decode()
            .returning(|_| Ok(identity(Utc::now() - Duration::hours(2))));
        let mut storage = MockTokenStorage::new();
        storage.expect_set_token().never();

        let session = SessionStore::new(Arc::new(storage), Arc::new(decoder));
        assert_eq!(session.sign_in("stale"), Err(AppError::AuthExpired));
    }
}
