/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Password login
/// - `projects`: Project listing, search and creation
/// - `tasks`: Task listing, creation and versioned updates

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
