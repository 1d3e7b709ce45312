//! Navigation history shared by the router and the HTTP wrapper.
//!
//! SYSTEM CONTEXT
//! ==============
//! The router pushes every accepted navigation and guard redirect; the HTTP
//! wrapper pushes `/login` when the backend rejects the session. Both read the
//! current location through [`Navigator`], so embedders can back it with the
//! browser history instead of [`History`].

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

pub trait Navigator: Send + Sync {
    /// Path of the current location, without query string.
    fn current_path(&self) -> String;

    /// Move to `path`.
    fn push(&self, path: &str);
}

/// In-memory history stack. Starts at [`HOME_PATH`].
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl Default for History {
    fn default() -> Self {
        Self::starting_at(HOME_PATH)
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn starting_at(path: &str) -> Self {
        Self { entries: Mutex::new(vec![path.to_owned()]) }
    }

    /// Every visited location, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// How many times `path` was pushed after the starting location.
    #[must_use]
    pub fn visits(&self, path: &str) -> usize {
        self.lock().iter().skip(1).filter(|entry| strip_query(entry) == path).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for History {
    fn current_path(&self) -> String {
        self.lock()
            .last()
            .map_or(HOME_PATH, |entry| strip_query(entry))
            .to_owned()
    }

    fn push(&self, path: &str) {
        self.lock().push(path.to_owned());
    }
}

/// Drop any `?query` or `#fragment` suffix.
pub(crate) fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}
