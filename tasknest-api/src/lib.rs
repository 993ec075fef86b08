//! # TaskNest API Server Library
//!
//! Router, configuration, and handlers for the TaskNest HTTP service. The
//! binary in `main.rs` wires these to a database pool and a listener; tests
//! build the same router against their own state.
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
