//! Shared session cell synchronized with durable storage.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use super::{ClearReason, Session, SessionEvent};
use crate::net::types::User;
use crate::storage::{KeyValueStore, StorageError, TOKEN_KEY, USER_KEY};

const EVENT_CAPACITY: usize = 16;

pub struct SessionContext {
    state: RwLock<Session>,
    storage: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    /// Create an empty, unauthenticated context over `storage`.
    /// Call [`SessionContext::restore`] to pick up a persisted session.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { state: RwLock::new(Session::default()), storage, events }
    }

    /// Load the persisted session.
    ///
    /// Returns `true` when both entries were present and the user decoded.
    /// A user entry that fails to decode, or a backing store whose contents
    /// are not valid JSON, clears memory and storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read, or cannot be cleared after a
    /// decode failure.
    pub async fn restore(&self) -> Result<bool, StorageError> {
        let entries = self.storage.get(TOKEN_KEY).and_then(|token| Ok((token, self.storage.get(USER_KEY)?)));
        let (token, raw_user) = match entries {
            Ok(entries) => entries,
            Err(StorageError::Corrupt(e)) => {
                warn!(error = %e, "session storage is unreadable; clearing session");
                self.clear(ClearReason::CorruptStorage).await?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        let (Some(token), Some(raw_user)) = (token, raw_user) else {
            return Ok(false);
        };

        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => {
                {
                    let mut state = self.state.write().await;
                    state.user = Some(user.clone());
                    state.token = Some(token);
                }
                info!(username = %user.username, "session restored");
                self.publish(SessionEvent::Authenticated { user });
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "stored user is unreadable; clearing session");
                self.clear(ClearReason::CorruptStorage).await?;
                Ok(false)
            }
        }
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// Token as currently persisted. The HTTP wrapper reads this on every
    /// request so a token written by another handle to the same storage is
    /// honored.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn stored_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.storage.get(TOKEN_KEY)?.filter(|token| !token.is_empty()))
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Install a freshly issued token and user.
    ///
    /// Storage is written before memory so a storage failure leaves the
    /// in-memory session untouched.
    pub(crate) async fn establish(&self, token: String, user: User) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&user)?;
        self.storage.set(TOKEN_KEY, &token)?;
        self.storage.set(USER_KEY, &encoded)?;
        {
            let mut state = self.state.write().await;
            state.token = Some(token);
            state.user = Some(user.clone());
        }
        self.publish(SessionEvent::Authenticated { user });
        Ok(())
    }

    /// Replace the current user record. The durable copy is only rewritten
    /// while a token is held, so a refresh never creates a half session on disk.
    pub(crate) async fn replace_user(&self, user: User) -> Result<(), StorageError> {
        let has_token = self.state.read().await.token.is_some();
        if has_token {
            self.storage.set(USER_KEY, &serde_json::to_string(&user)?)?;
        }
        self.state.write().await.user = Some(user.clone());
        self.publish(SessionEvent::UserRefreshed { user });
        Ok(())
    }

    /// Drop the in-memory session and both storage entries.
    ///
    /// Returns `true` if anything was cleared; clearing an empty session is a
    /// no-op that publishes no event.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written. Memory is cleared
    /// regardless.
    pub async fn clear(&self, reason: ClearReason) -> Result<bool, StorageError> {
        let had_memory = {
            let mut state = self.state.write().await;
            let had = !state.is_empty();
            *state = Session::default();
            had
        };

        // An unreadable entry counts as present so it is reported and removed.
        let had_storage = self.has_entry(TOKEN_KEY) || self.has_entry(USER_KEY);
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;

        if !(had_memory || had_storage) {
            return Ok(false);
        }
        info!(?reason, "session cleared");
        self.publish(SessionEvent::Cleared { reason });
        Ok(true)
    }

    fn has_entry(&self, key: &str) -> bool {
        !matches!(self.storage.get(key), Ok(None))
    }

    fn publish(&self, event: SessionEvent) {
        // Send only fails when nobody is subscribed.
        let _ = self.events.send(event);
    }
}
