//! # ProjectDesk API Server Library
//!
//! JSON endpoints for every page of the ProjectDesk application, plus a
//! Server-Sent-Events stream for the unread-comment badge.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
