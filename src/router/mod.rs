//! Route table and guarded navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views are opaque to this crate; the table only carries each route's
//! access metadata. [`Router::navigate`] resolves a path, runs the
//! [`guard`] and moves the shared [`Navigator`] to wherever the guard sends
//! the user.


pub mod guard;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::navigation::{Navigator, strip_query};
use crate::notify::Notifier;
use crate::session::SessionStore;
use guard::Decision;

/// Screen a route renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    PostList,
    PostDetail,
    PostCreate,
    Login,
    Register,
    Profile,
    Admin,
}

/// Access flags attached to a route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    /// Only reachable while signed out.
    pub guest: bool,
    pub requires_admin: bool,
}

impl RouteMeta {
    const OPEN: Self = Self { requires_auth: false, guest: false, requires_admin: false };
    const AUTH: Self = Self { requires_auth: true, guest: false, requires_admin: false };
    const GUEST: Self = Self { requires_auth: false, guest: true, requires_admin: false };
    const ADMIN: Self = Self { requires_auth: true, guest: false, requires_admin: true };
}

#[derive(Debug, PartialEq, Eq)]
pub struct Route {
    /// Pattern; `:name` segments capture a parameter.
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
    pub meta: RouteMeta,
}

pub static ROUTES: &[Route] = &[
    Route { path: "/", name: "PostList", view: View::PostList, meta: RouteMeta::OPEN },
    Route { path: "/post/:id", name: "PostDetail", view: View::PostDetail, meta: RouteMeta::OPEN },
    Route { path: "/create", name: "PostCreate", view: View::PostCreate, meta: RouteMeta::AUTH },
    Route { path: "/login", name: "Login", view: View::Login, meta: RouteMeta::GUEST },
    Route { path: "/register", name: "Register", view: View::Register, meta: RouteMeta::GUEST },
    Route { path: "/profile", name: "Profile", view: View::Profile, meta: RouteMeta::AUTH },
    Route { path: "/admin", name: "Admin", view: View::Admin, meta: RouteMeta::ADMIN },
];

/// A path matched against [`ROUTES`].
#[derive(Debug, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static Route,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Find the route for `path`. Query strings, fragments and a trailing slash
/// are ignored.
#[must_use]
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = strip_query(path.trim());
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    ROUTES.iter().find_map(|route| {
        match_pattern(route.path, path).map(|params| RouteMatch { route, params })
    })
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    let mut params = BTreeMap::new();
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(expected), Some(actual)) => {
                if let Some(name) = expected.strip_prefix(':') {
                    if actual.is_empty() {
                        return None;
                    }
                    params.insert(name.to_owned(), actual.to_owned());
                } else if expected != actual {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

/// Result of one navigation attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Navigation {
    /// The target was entered.
    Allow(RouteMatch),
    /// The guard sent the user elsewhere; the target was never entered.
    Redirect(&'static str),
    /// No route matches; history is unchanged.
    NotFound,
}

#[derive(Clone)]
pub struct Router {
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl Router {
    #[must_use]
    pub fn new(session: SessionStore, navigator: Arc<dyn Navigator>, notifier: Arc<dyn Notifier>) -> Self {
        Self { session, navigator, notifier }
    }

    /// Resolve `path`, run the guard and move history to the outcome.
    pub async fn navigate(&self, path: &str) -> Navigation {
        let Some(matched) = resolve(path) else {
            debug!(%path, "no route");
            return Navigation::NotFound;
        };

        match guard::check(&self.session, self.notifier.as_ref(), matched.route.meta).await {
            Decision::Allow => {
                debug!(%path, route = matched.route.name, "navigate");
                self.navigator.push(path);
                Navigation::Allow(matched)
            }
            Decision::Redirect(target) => {
                info!(%path, %target, "navigation redirected");
                if self.navigator.current_path() != target {
                    self.navigator.push(target);
                }
                Navigation::Redirect(target)
            }
        }
    }
}
