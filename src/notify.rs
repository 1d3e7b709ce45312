//! User-facing notices raised outside of a caller's error path.
//!
//! Access-denied responses and failed admin checks are reported to the user
//! in addition to (or instead of) returning an error. Embedders decide how to
//! surface them; the CLI prints them to stderr.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The backend answered 403 for a request.
    AccessDenied { message: String },
    /// A non-admin user tried to open an admin-only route.
    AdminRequired,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied { message } => write!(f, "access denied: {message}"),
            Self::AdminRequired => f.write_str("admin privileges required"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only emits a `tracing` warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(%notice, "user notice");
    }
}
