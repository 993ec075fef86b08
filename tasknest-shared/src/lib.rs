//! # TaskNest Shared Library
//!
//! This crate contains the data layer and infrastructure used by the
//! TaskNest API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `db`: Connection pool and migrations
//! - `auth`: Password hashing, JWT tokens, request auth context
//! - `storage`: Object storage for task image attachments
//! - `ai`: Label and description suggestions from a completion API

pub mod ai;
pub mod auth;
pub mod db;
pub mod models;
pub mod storage;

/// Current version of the TaskNest shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
