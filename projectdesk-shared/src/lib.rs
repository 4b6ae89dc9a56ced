//! # ProjectDesk Shared Library
//!
//! Domain types, collaborator seams and workflows used by the ProjectDesk API server.
//!
//! ## Module Organization
//!
//! - `models`: table rows, insert payloads, form inputs and typed enums
//! - `ranking`: task ordering by deadline, then priority
//! - `notifications`: the live unread-comment reconciler
//! - `services`: form-driven CRUD workflows with activity-log side effects
//! - `session`: backend construction and per-identity sessions
//! - `store`, `feed`, `blob`, `auth`: collaborator traits with platform and in-memory
//!   implementations
//! - `platform`: HTTP client for the hosted backend
//! - `db`: Postgres pool and migrations backing the change feed
//! - `config`: platform configuration
//! - `error`: common error type

pub mod auth;
pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod models;
pub mod notifications;
pub mod platform;
pub mod ranking;
pub mod services;
pub mod session;
pub mod store;

pub use error::{DeskError, DeskResult};
pub use session::{Backend, Session};

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
