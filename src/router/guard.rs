//! Access decision run before every navigation.
//!
//! Checks apply in order and the first that fires wins:
//! 1. auth-only route, anonymous session: `/login`;
//! 2. guest-only route, authenticated session: `/`;
//! 3. admin route: load the user if missing, non-admins go to `/` with a
//!    notice, a failed load goes to `/login`;
//! 4. otherwise allow.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use tracing::{debug, warn};

use super::RouteMeta;
use crate::navigation::{HOME_PATH, LOGIN_PATH};
use crate::net::types::User;
use crate::notify::{Notice, Notifier};
use crate::session::SessionStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
}

/// Checks that need only the authentication flag. `None` means undecided.
#[must_use]
pub fn precheck(meta: RouteMeta, authenticated: bool) -> Option<Decision> {
    if meta.requires_auth && !authenticated {
        return Some(Decision::Redirect(LOGIN_PATH));
    }
    if meta.guest && authenticated {
        return Some(Decision::Redirect(HOME_PATH));
    }
    if meta.requires_admin {
        return None;
    }
    Some(Decision::Allow)
}

/// Outcome of the admin check for a loaded user.
#[must_use]
pub fn admin_decision(user: &User) -> Decision {
    if user.is_admin() { Decision::Allow } else { Decision::Redirect(HOME_PATH) }
}

/// Full guard evaluation for a target with `meta`.
pub async fn check(session: &SessionStore, notifier: &dyn Notifier, meta: RouteMeta) -> Decision {
    if let Some(decision) = precheck(meta, session.is_authenticated().await) {
        return decision;
    }

    let user = match session.user().await {
        Some(user) => user,
        None => {
            debug!("admin route without loaded user; refreshing");
            match session.refresh_current_user().await {
                Ok(user) => user,
                Err(e) => {
                    warn!(error = %e, "admin check failed");
                    return Decision::Redirect(LOGIN_PATH);
                }
            }
        }
    };

    let decision = admin_decision(&user);
    if decision != Decision::Allow {
        debug!(username = %user.username, role = ?user.role, "admin route denied");
        notifier.notify(Notice::AdminRequired);
    }
    decision
}
