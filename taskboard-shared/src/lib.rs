//! # Taskboard Shared Library
//!
//! Domain types, persistence, authentication and the task update protocol
//! used by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: users, projects, tasks and their write payloads
//! - `auth`: password hashing, access tokens, request authentication, RBAC
//! - `store`: the `Store` trait with PostgreSQL and in-memory backends
//! - `concurrency`: optimistic-locking task updates
//! - `db`: connection pool and schema bootstrap

pub mod auth;
pub mod concurrency;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
