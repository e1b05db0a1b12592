//! sessionkeep core: client-side session management for a REST login
//! backend.
//!
//! The `auth` module holds the session store and gateway; `api` talks to the
//! remote authority; `validation` checks the login and signup forms before
//! anything goes over the network.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod validation;

pub use api::{ApiClient, ApiError, Authority};
pub use auth::{AuthError, SessionGateway, SessionStatus, SessionStore};
pub use config::Config;
