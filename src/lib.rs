//! Session-aware client for the board forum REST API.
//!
//! ARCHITECTURE
//! ============
//! - [`net`]: HTTP wrapper with bearer attachment and 401/403 recovery, wire
//!   types and one service module per backend resource.
//! - [`session`]: shared session cell mirrored into durable storage, plus the
//!   login/register/logout/refresh operations.
//! - [`router`]: route table and the access guard run before navigation.
//! - [`storage`]: durable key-value backends (file, memory, browser).
//!
//! [`BoardClient`] wires one instance of each around a shared session.

pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
pub mod navigation;
pub mod net;
pub mod notify;
pub mod router;
pub mod session;
pub mod storage;

use std::sync::Arc;

use config::ClientConfig;
use navigation::{History, Navigator};
use net::{ApiClient, ApiError};
use notify::Notifier;
use router::Router;
use session::{SessionContext, SessionStore};
use storage::KeyValueStore;

/// Fully wired client: one session shared by the HTTP wrapper, the session
/// store and the router.
#[derive(Clone)]
pub struct BoardClient {
    pub api: ApiClient,
    pub session: SessionStore,
    pub router: Router,
    pub history: Arc<History>,
}

impl BoardClient {
    /// Wire a client over `storage`. The persisted session is not loaded;
    /// call `session.restore()` once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(
        config: &ClientConfig,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let context = Arc::new(SessionContext::new(storage));
        let history = Arc::new(History::new());
        let navigator: Arc<dyn Navigator> = history.clone();
        let api = ApiClient::new(config, context, navigator.clone(), notifier.clone())?;
        let session = SessionStore::new(api.clone());
        let router = Router::new(session.clone(), navigator, notifier);
        Ok(Self { api, session, router, history })
    }
}
