//! Session state machine for the presentation layer.
//!
//! The session manager only exposes primitives. `AuthGuard` is what a UI
//! drives at boot and on sign-in/sign-out to decide whether to show the
//! dashboard or the login form.
//!
//! ```text
//! Unknown          --resolve-->           Authenticated | Unauthenticated
//! Authenticated    --sign_out/resolve-->  Unauthenticated
//! Unauthenticated  --signed_in-->         Authenticated
//! ```

use crate::session::SessionManager;
use crate::storage::SessionStore;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Boot check has not run yet.
    #[default]
    Unknown,
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Default)]
pub struct AuthGuard {
    state: SessionState,
}

impl AuthGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Boot check: a stored token is only trusted once the server accepts it.
    pub fn resolve<T: Transport, S: SessionStore>(
        &mut self,
        session: &SessionManager<T, S>,
    ) -> SessionState {
        self.state = if session.is_authenticated() && session.validate_token() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        };
        self.state
    }

    /// Call after `login` or `register` succeeded.
    pub fn signed_in(&mut self) {
        self.state = SessionState::Authenticated;
    }

    pub fn sign_out<T: Transport, S: SessionStore>(&mut self, session: &SessionManager<T, S>) {
        session.logout();
        self.state = SessionState::Unauthenticated;
    }
}
