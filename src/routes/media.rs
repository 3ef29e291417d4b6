use crate::{AppState, handlers};
use axum::{Router, routing::get, routing::post};

/// Media Router Module
///
/// CRUD over user-owned media links. Mutations are owner-scoped through the
/// `token` header; the listing is deliberately unfiltered (every owner's
/// records): existing behavior of the access model, preserved as-is.
pub fn media_routes() -> Router<AppState> {
    Router::new()
        // POST   /media        create, owner resolved from the token
        // GET    /media        list everything (no ownership filter)
        // PUT    /media        partial update, owner-scoped
        // DELETE /media?id=    delete + detach from the owner's list
        .route(
            "/media",
            post(handlers::create_media)
                .get(handlers::list_media)
                .put(handlers::update_media)
                .delete(handlers::delete_media),
        )
        // GET /ping: liveness, kept beside the public listing route.
        .route("/ping", get(handlers::ping))
}
