//! Session manager: owns the token and cached profile in durable storage.
//!
//! # Design
//! The manager is an explicit context object, handed to whoever needs the
//! session, rather than ambient global state. It is the only writer of the
//! `projectpro_token` and `projectpro_user` entries by convention; nothing
//! locks them, so callers that fire `login` and `logout` concurrently must
//! serialize those calls themselves.
//!
//! `is_authenticated` is a local check and can be stale. `validate_token`
//! is the one operation that reconciles it with the server: a rejected
//! token clears the session instead of surfacing an error.
//!
//! `login` stores the token before fetching the profile. If the profile
//! fetch fails, the error propagates and the token stays stored.

use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{SessionError, StorageError};
use crate::resource::ResourceClient;
use crate::storage::{FileStore, SessionStore, TOKEN_KEY, USER_KEY};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Credential, RegisterUser, UserProfile};

pub struct SessionManager<T, S> {
    client: ResourceClient<T>,
    store: S,
}

impl SessionManager<UreqTransport, FileStore> {
    /// Production wiring: blocking HTTP against `config.api_url`, session
    /// file under `config.storage_dir` or the platform data directory.
    pub fn from_config(config: &ClientConfig) -> Result<Self, StorageError> {
        let dir = match &config.storage_dir {
            Some(dir) => dir.clone(),
            None => FileStore::default_dir()?,
        };
        Ok(Self::new(
            ResourceClient::new(&config.api_url, UreqTransport::new()),
            FileStore::new(dir),
        ))
    }
}

impl<T: Transport, S: SessionStore> SessionManager<T, S> {
    pub fn new(client: ResourceClient<T>, store: S) -> Self {
        Self { client, store }
    }

    /// The resource client, for callers that go on to fetch projects and
    /// tasks with `token()`.
    pub fn client(&self) -> &ResourceClient<T> {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored bearer token, if any. Storage failures read as absent.
    pub fn token(&self) -> Option<Credential> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.map(Credential::new),
            Err(e) => {
                warn!(error = %e, "could not read stored token");
                None
            }
        }
    }

    /// Cached profile of the signed-in user. Display only, never a source
    /// of authority.
    pub fn user(&self) -> Option<UserProfile> {
        let raw = match self.store.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "could not read stored user");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "stored user profile is malformed");
                None
            }
        }
    }

    /// True iff a token is stored. No network call.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<UserProfile, SessionError> {
        let credential = self.client.login(username, password)?;
        self.store.set(TOKEN_KEY, credential.expose())?;

        let user = self.client.current_user(&credential)?;
        self.store_user(&user)?;
        debug!(user_id = user.id, "session established");
        Ok(user)
    }

    /// Register, then sign in with the same username and password.
    #[instrument(skip_all, fields(username = %input.username))]
    pub fn register(&self, input: &RegisterUser) -> Result<UserProfile, SessionError> {
        let created = self.client.register(input)?;
        debug!(user_id = created.id, "account created");
        self.login(&input.username, &input.password)
    }

    /// Clear the token and profile. Never fails.
    pub fn logout(&self) {
        self.clear();
    }

    /// Check the stored token against the server.
    ///
    /// Returns false without a network call when no token is stored. On
    /// success the cached profile is refreshed; on any failure the session
    /// is cleared.
    #[instrument(skip(self))]
    pub fn validate_token(&self) -> bool {
        let Some(credential) = self.token() else {
            return false;
        };
        match self.client.current_user(&credential) {
            Ok(user) => {
                if let Err(e) = self.store_user(&user) {
                    warn!(error = %e, "could not refresh stored user");
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "stored token no longer valid, clearing session");
                self.clear();
                false
            }
        }
    }

    fn store_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(user)?;
        self.store.set(USER_KEY, &encoded)
    }

    fn clear(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "could not clear session entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::error::ApiError;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::storage::{MemoryStore, NullStore};

    const PROFILE: &str =
        r#"{"id":1,"email":"a@b.com","username":"alice","full_name":"Alice A","is_active":true}"#;
    const TOKEN: &str = r#"{"access_token":"tok-1","token_type":"bearer"}"#;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn with(responses: &[(u16, &str)]) -> Self {
            let responses = responses
                .iter()
                .map(|(status, body)| HttpResponse {
                    status: *status,
                    headers: Vec::new(),
                    body: body.to_string(),
                })
                .collect();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn paths(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.path.trim_start_matches("http://api.test").to_string())
                .collect()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::transport("no scripted response left"))
        }
    }

    fn manager(responses: &[(u16, &str)]) -> SessionManager<ScriptedTransport, MemoryStore> {
        SessionManager::new(
            ResourceClient::new("http://api.test", ScriptedTransport::with(responses)),
            MemoryStore::new(),
        )
    }

    fn alice() -> RegisterUser {
        RegisterUser {
            email: "a@b.com".to_string(),
            username: "alice".to_string(),
            full_name: "Alice A".to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn login_stores_token_and_profile() {
        let session = manager(&[(200, TOKEN), (200, PROFILE)]);
        let user = session.login("alice", "pw").unwrap();

        assert_eq!(user.username, "alice");
        assert!(session.is_authenticated());
        assert_eq!(session.token().unwrap().expose(), "tok-1");
        assert_eq!(session.user(), Some(user));
        assert_eq!(
            session.client().transport().paths(),
            vec!["/api/auth/token", "/api/auth/me"]
        );
    }

    #[test]
    fn rejected_login_leaves_storage_untouched() {
        let session = manager(&[(401, r#"{"detail":"Incorrect username or password"}"#)]);
        let err = session.login("alice", "wrong").unwrap_err();

        match err {
            SessionError::Api(ApiError::Auth(message)) => assert!(!message.is_empty()),
            other => panic!("expected auth error, got {other:?}"),
        }
        assert!(session.store().get(TOKEN_KEY).unwrap().is_none());
        assert!(session.store().get(USER_KEY).unwrap().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn profile_failure_after_login_keeps_token() {
        let session = manager(&[(200, TOKEN), (500, "")]);
        let err = session.login("alice", "pw").unwrap_err();

        assert!(matches!(err, SessionError::Api(ApiError::Auth(_))));
        assert!(session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn logout_always_clears() {
        let session = manager(&[(200, TOKEN), (200, PROFILE)]);
        session.logout();
        assert!(!session.is_authenticated());

        session.login("alice", "pw").unwrap();
        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(session.store().is_empty());
    }

    #[test]
    fn corrupt_session_file_recovers_on_logout_and_login() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionManager::new(
            ResourceClient::new(
                "http://api.test",
                ScriptedTransport::with(&[(200, TOKEN), (200, PROFILE)]),
            ),
            FileStore::new(dir.path()),
        );
        std::fs::write(session.store().path(), "{garbage").unwrap();
        assert!(!session.is_authenticated());

        session.logout();
        assert_eq!(session.store().get(TOKEN_KEY).unwrap(), None);

        let user = session.login("alice", "pw").unwrap();
        assert_eq!(user.username, "alice");
        assert!(session.is_authenticated());
        assert_eq!(session.user(), Some(user));
    }

    #[test]
    fn validate_without_token_makes_no_request() {
        let session = manager(&[]);
        assert!(!session.validate_token());
        assert!(session.client().transport().paths().is_empty());
    }

    #[test]
    fn validate_with_rejected_token_clears_session() {
        let session = manager(&[(401, "")]);
        session.store().set(TOKEN_KEY, "stale").unwrap();
        session.store().set(USER_KEY, PROFILE).unwrap();

        assert!(session.is_authenticated());
        assert!(!session.validate_token());
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn validate_with_unreachable_server_clears_session() {
        let session = manager(&[]);
        session.store().set(TOKEN_KEY, "tok-1").unwrap();
        assert!(!session.validate_token());
        assert!(session.store().is_empty());
    }

    #[test]
    fn validate_refreshes_profile() {
        let renamed = PROFILE.replace("Alice A", "Alice Anderson");
        let session = manager(&[(200, renamed.as_str())]);
        session.store().set(TOKEN_KEY, "tok-1").unwrap();
        session.store().set(USER_KEY, PROFILE).unwrap();

        assert!(session.validate_token());
        assert_eq!(session.user().unwrap().full_name, "Alice Anderson");
        assert_eq!(session.token().unwrap().expose(), "tok-1");
    }

    #[test]
    fn register_then_logs_in() {
        let session = manager(&[(200, PROFILE), (200, TOKEN), (200, PROFILE)]);
        let user = session.register(&alice()).unwrap();

        assert_eq!(user.username, "alice");
        assert!(session.is_authenticated());
        assert_eq!(
            session.client().transport().paths(),
            vec!["/api/auth/register", "/api/auth/token", "/api/auth/me"]
        );
    }

    #[test]
    fn rejected_registration_skips_login() {
        let session = manager(&[(400, r#"{"detail":"Username already registered"}"#)]);
        let err = session.register(&alice()).unwrap_err();

        assert!(matches!(err, SessionError::Api(ApiError::Validation(_))));
        assert_eq!(session.client().transport().paths().len(), 1);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn register_surfaces_login_failure() {
        let session = manager(&[(200, PROFILE), (401, "")]);
        let err = session.register(&alice()).unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::Auth(_))));
    }

    #[test]
    fn malformed_stored_profile_reads_as_absent() {
        let session = manager(&[]);
        session.store().set(USER_KEY, "{not json").unwrap();
        assert!(session.user().is_none());
    }

    #[test]
    fn without_storage_nothing_persists() {
        let session = SessionManager::new(
            ResourceClient::new(
                "http://api.test",
                ScriptedTransport::with(&[(200, TOKEN), (200, PROFILE)]),
            ),
            NullStore,
        );
        assert!(session.token().is_none());
        let user = session.login("alice", "pw").unwrap();
        assert_eq!(user.username, "alice");
        assert!(!session.is_authenticated());
    }
}
