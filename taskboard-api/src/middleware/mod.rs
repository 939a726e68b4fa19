/// Middleware modules for the API server
///
/// - `security`: security response headers
///
/// Authentication middleware lives in `app.rs` next to the router it guards.

pub mod security;
