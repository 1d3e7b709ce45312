//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`SessionContext`] is the single shared cell holding the user and bearer
//! token, mirrored into durable storage. It is constructed once and handed to
//! the HTTP wrapper (which clears it on 401), the [`SessionStore`] (which
//! performs login/registration/logout/refresh against the backend) and the
//! router guard (which reads it before every navigation).
//!
//! DESIGN
//! ======
//! Authentication is derived, never stored: a session is authenticated iff it
//! holds both a user and a token. Observers subscribe to [`SessionEvent`]s
//! instead of polling.

pub mod context;
pub mod store;

pub use context::SessionContext;
pub use store::SessionStore;

use crate::net::types::User;

/// Snapshot of the in-memory session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub(crate) user: Option<User>,
    pub(crate) token: Option<String>,
}

impl Session {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    fn is_empty(&self) -> bool {
        self.user.is_none() && self.token.is_none()
    }
}

/// Why a session was torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearReason {
    /// Explicit logout.
    Logout,
    /// The backend rejected the token (HTTP 401).
    Unauthorized,
    /// The stored user record could not be decoded at restore.
    CorruptStorage,
    /// Re-fetching the current user failed.
    RefreshFailed,
}

/// Session change broadcast to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Login, registration or restore produced an authenticated session.
    Authenticated { user: User },
    /// The current user record was re-fetched.
    UserRefreshed { user: User },
    /// The session and its durable mirror were cleared.
    Cleared { reason: ClearReason },
}
