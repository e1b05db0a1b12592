//! Data models for the remote authority's request and response shapes.
//!
//! The user profile is kept as an opaque `serde_json::Value`; `ProfileView`
//! reads the handful of display attributes the header needs.

pub mod auth;
pub mod profile;

pub use auth::{Credentials, LoginData, LoginEnvelope, RegisterResponse, Registration};
pub use profile::ProfileView;
