//! REST client for the remote authority.
//!
//! This module provides the `ApiClient` for the login, logout, register and
//! current-user endpoints, and the `Authority` trait the session gateway is
//! written against.
//!
//! Authenticated calls carry an `Authorization: Bearer <token>` header.

pub mod client;
pub mod error;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{Credentials, LoginData, RegisterResponse, Registration};

pub use client::ApiClient;
pub use error::ApiError;

/// The remote service that issues and revokes sessions.
#[async_trait]
pub trait Authority: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginData, ApiError>;

    async fn logout(&self, token: &str) -> Result<(), ApiError>;

    async fn register(&self, registration: &Registration) -> Result<RegisterResponse, ApiError>;

    async fn current_user(&self, token: &str) -> Result<Value, ApiError>;
}
