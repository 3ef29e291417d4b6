use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Token Router Module
///
/// Lifecycle of session tokens: issuance against credentials, lookup,
/// expiry extension, and revocation. None of these carry a `token` header:
/// possession of the id (plus credentials, for issuance) is the credential.
pub fn token_routes() -> Router<AppState> {
    Router::new()
        // POST   /token         issue against phone + password
        // GET    /token?id=     read (404 when absent; preserved surface)
        // PUT    /token         extend an unexpired token
        // DELETE /token?id=     revoke
        .route(
            "/token",
            post(handlers::create_token)
                .get(handlers::read_token)
                .put(handlers::extend_token)
                .delete(handlers::delete_token),
        )
}
