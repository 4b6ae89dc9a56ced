/// Middleware modules for the API server
///
/// - `security`: security headers on every response
///
/// Bearer-token authentication lives in `projectdesk_shared::auth::middleware`.

pub mod security;
