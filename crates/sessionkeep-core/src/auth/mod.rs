//! Session state and lifecycle.
//!
//! This module provides:
//! - `SessionStore`: the current user profile and bearer token, persisted to
//!   durable storage and observable through a watch channel
//! - `SessionGateway`: login, logout and registration against the remote
//!   authority, keeping the store in step
//! - `AuthError`: the error classes shown to the user
//!
//! The session has two states, anonymous and authenticated. A 401 from any
//! authenticated call moves it back to anonymous.

pub mod error;
pub mod gateway;
pub mod storage;
pub mod store;

pub use error::AuthError;
pub use gateway::SessionGateway;
pub use storage::{DurableStorage, FileStorage, MemoryStorage};
pub use store::{spawn_storage_watcher, Session, SessionStatus, SessionStore};
