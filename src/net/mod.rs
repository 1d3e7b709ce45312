//! Backend networking: the HTTP wrapper, wire types and one service module
//! per backend resource.

pub mod api;
pub mod error;
pub mod http;
pub mod types;

pub use error::ApiError;
pub use http::ApiClient;
