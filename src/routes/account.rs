use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Account Router Module
///
/// CRUD over the account resource, keyed by phone number.
///
/// Access control: creation is public (registration); read, update, and
/// delete require a `token` header that verifies against the phone being
/// operated on. Delete additionally cascades over the account's media links.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        // POST   /account           create (public)
        // GET    /account?phone=    read, token-scoped, strips the hash
        // PUT    /account           partial update, token-scoped
        // DELETE /account?phone=    cascade delete, token-scoped
        .route(
            "/account",
            post(handlers::create_account)
                .get(handlers::read_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
}
