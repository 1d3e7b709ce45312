//! REST service functions, one per backend endpoint.
//!
//! Every function takes the shared [`ApiClient`](super::ApiClient) so bearer
//! attachment and 401/403 recovery apply uniformly. Paths are relative to the
//! configured API base URL.

pub mod admin;
pub mod auth;
pub mod comments;
pub mod files;
pub mod posts;
