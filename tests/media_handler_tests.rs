use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use linkstash::{
    AppConfig, AppState, MemoryStore, MockDnsResolver, create_router,
    dns::ResolverState,
    store::StoreState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

const PHONE: &str = "1234567890";

/// Assembles the router over a fresh in-memory store, with a resolver that
/// either answers every lookup or fails every lookup.
fn app_with_resolver(resolver: MockDnsResolver) -> (Router, StoreState) {
    let store = Arc::new(MemoryStore::new()) as StoreState;
    let state = AppState::build(
        store.clone(),
        Arc::new(resolver) as ResolverState,
        AppConfig::default(),
    );
    (create_router(state), store)
}

fn app() -> (Router, StoreState) {
    app_with_resolver(MockDnsResolver::new())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Registers the standard account and issues a token for it.
async fn seeded_token(app: &Router) -> String {
    let (status, _) = send(
        app,
        post_json(
            "/account",
            None,
            json!({
                "phone": PHONE,
                "firstName": "A",
                "lastName": "B",
                "password": "pw",
                "tosAgreement": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        post_json("/token", None, json!({"phone": PHONE, "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

async fn create_media(app: &Router, token: &str, url: &str, description: &str) -> (StatusCode, Value) {
    send(
        app,
        post_json(
            "/media",
            Some(token),
            json!({"url": url, "description": description}),
        ),
    )
    .await
}

// --- POST /media ---

#[tokio::test]
async fn create_media_links_the_record_to_its_owner_exactly_once() {
    let (app, store) = app();
    let token = seeded_token(&app).await;

    let (status, body) = create_media(&app, &token, "https://example.com/a", "first link").await;
    assert_eq!(status, StatusCode::OK);

    let id = body["id"].as_str().unwrap();
    assert_eq!(id.len(), 20);
    assert_eq!(body["phone"], PHONE);
    assert_eq!(body["description"], "first link");
    assert_eq!(body["ownerName"], "A");

    // The owning account's list contains the id exactly once.
    let account = store.read("accounts", PHONE).await.unwrap();
    let links = account["mediaLinks"].as_array().unwrap();
    assert_eq!(links.iter().filter(|link| *link == id).count(), 1);

    // The media record itself is persisted.
    assert!(store.read("media", id).await.is_ok());
}

#[tokio::test]
async fn create_media_preserves_link_insertion_order() {
    let (app, store) = app();
    let token = seeded_token(&app).await;

    let (_, first) = create_media(&app, &token, "https://example.com/1", "one").await;
    let (_, second) = create_media(&app, &token, "https://example.com/2", "two").await;

    let account = store.read("accounts", PHONE).await.unwrap();
    let links = account["mediaLinks"].as_array().unwrap();
    assert_eq!(links[0], first["id"]);
    assert_eq!(links[1], second["id"]);
}

#[tokio::test]
async fn create_media_rejects_an_unresolvable_host_without_side_effects() {
    let (app, store) = app_with_resolver(MockDnsResolver::new_failing());
    let token = seeded_token(&app).await;

    let (status, body) =
        create_media(&app, &token, "https://no-such-host.invalid/x", "dangling").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("DNS"));

    // No media record was written and the account was not mutated.
    assert!(store.list("media").await.unwrap().is_empty());
    let account = store.read("accounts", PHONE).await.unwrap();
    assert_eq!(account["mediaLinks"], json!([]));
}

#[tokio::test]
async fn create_media_rejects_a_hostless_url() {
    let (app, _store) = app();
    let token = seeded_token(&app).await;

    // No scheme, so no absolute URL, so no host to resolve.
    let (status, _) = create_media(&app, &token, "not a url", "bad").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_media_requires_a_live_token() {
    let (app, _store) = app();
    seeded_token(&app).await;

    let (status, _) = send(
        &app,
        post_json(
            "/media",
            None,
            json!({"url": "https://example.com", "description": "d"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        post_json(
            "/media",
            Some("aaaaaaaaaaaaaaaaaaaa"),
            json!({"url": "https://example.com", "description": "d"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_media_with_a_dangling_token_is_forbidden() {
    // The owning account disappears between issuance and use: the surface
    // reports 403 here, indistinguishable from a bad token.
    let (app, store) = app();
    let token = seeded_token(&app).await;
    store.delete("accounts", PHONE).await.unwrap();

    let (status, _) = create_media(&app, &token, "https://example.com", "orphan").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_media_validates_inputs() {
    let (app, _store) = app();
    let token = seeded_token(&app).await;

    for payload in [
        json!({}),
        json!({"url": "https://example.com"}),
        json!({"description": "no url"}),
        json!({"url": "  ", "description": "blank url"}),
    ] {
        let (status, _) = send(&app, post_json("/media", Some(&token), payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

// --- GET /media ---

#[tokio::test]
async fn list_media_reports_an_empty_store_as_400() {
    let (app, _store) = app();
    let request = Request::builder().uri("/media").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No media available");
}

#[tokio::test]
async fn list_media_returns_every_record_without_an_ownership_filter() {
    let (app, _store) = app();
    let token = seeded_token(&app).await;
    let (_, first) = create_media(&app, &token, "https://example.com/1", "one").await;

    // A second owner with their own record.
    send(
        &app,
        post_json(
            "/account",
            None,
            json!({
                "phone": "0987654321",
                "firstName": "C",
                "lastName": "D",
                "password": "pw2",
                "tosAgreement": true
            }),
        ),
    )
    .await;
    let (_, other_token) = send(
        &app,
        post_json(
            "/token",
            None,
            json!({"phone": "0987654321", "password": "pw2"}),
        ),
    )
    .await;
    let other_token = other_token["id"].as_str().unwrap().to_string();
    let (_, second) = create_media(&app, &other_token, "https://example.com/2", "two").await;

    // The listing is public and spans both owners.
    let request = Request::builder().uri("/media").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let listing = body.as_object().unwrap();
    assert_eq!(listing.len(), 2);
    assert!(listing.contains_key(first["id"].as_str().unwrap()));
    assert!(listing.contains_key(second["id"].as_str().unwrap()));
}

// --- PUT /media ---

#[tokio::test]
async fn update_media_is_owner_scoped() {
    let (app, _store) = app();
    let token = seeded_token(&app).await;
    let (_, media) = create_media(&app, &token, "https://example.com", "original").await;
    let id = media["id"].as_str().unwrap();

    // A different account's token must not pass the ownership gate.
    send(
        &app,
        post_json(
            "/account",
            None,
            json!({
                "phone": "0987654321",
                "firstName": "C",
                "lastName": "D",
                "password": "pw2",
                "tosAgreement": true
            }),
        ),
    )
    .await;
    let (_, stranger) = send(
        &app,
        post_json(
            "/token",
            None,
            json!({"phone": "0987654321", "password": "pw2"}),
        ),
    )
    .await;
    let stranger = stranger["id"].as_str().unwrap();

    let request = Request::builder()
        .method("PUT")
        .uri("/media")
        .header("Content-Type", "application/json")
        .header("token", stranger)
        .body(Body::from(
            json!({"id": id, "description": "hijacked"}).to_string(),
        ))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner's token succeeds and only touches the supplied field.
    let request = Request::builder()
        .method("PUT")
        .uri("/media")
        .header("Content-Type", "application/json")
        .header("token", &token)
        .body(Body::from(
            json!({"id": id, "description": "edited"}).to_string(),
        ))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder().uri("/media").body(Body::empty()).unwrap();
    let (_, body) = send(&app, request).await;
    assert_eq!(body[id]["description"], "edited");
    assert_eq!(body[id]["url"], "https://example.com");
}

#[tokio::test]
async fn update_media_rejects_unknown_ids_and_empty_updates() {
    let (app, _store) = app();
    let token = seeded_token(&app).await;

    // Unknown id of the right shape: 400 on this path (preserved surface).
    let request = Request::builder()
        .method("PUT")
        .uri("/media")
        .header("Content-Type", "application/json")
        .header("token", &token)
        .body(Body::from(
            json!({"id": "aaaaaaaaaaaaaaaaaaaa", "description": "x"}).to_string(),
        ))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No updatable fields.
    let (_, media) = create_media(&app, &token, "https://example.com", "d").await;
    let request = Request::builder()
        .method("PUT")
        .uri("/media")
        .header("Content-Type", "application/json")
        .header("token", &token)
        .body(Body::from(json!({"id": media["id"]}).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- DELETE /media ---

#[tokio::test]
async fn delete_media_detaches_the_record_from_its_owner() {
    let (app, store) = app();
    let token = seeded_token(&app).await;
    let (_, media) = create_media(&app, &token, "https://example.com", "doomed").await;
    let id = media["id"].as_str().unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/media?id={}", id))
        .header("token", &token)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    assert!(store.read("media", id).await.is_err());
    let account = store.read("accounts", PHONE).await.unwrap();
    assert_eq!(account["mediaLinks"], json!([]));
}

#[tokio::test]
async fn delete_media_rejects_a_malformed_or_unknown_id() {
    let (app, _store) = app();
    let token = seeded_token(&app).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/media?id=short")
        .header("token", &token)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("DELETE")
        .uri("/media?id=aaaaaaaaaaaaaaaaaaaa")
        .header("token", &token)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_media_surfaces_an_already_broken_relation_as_500() {
    // Seed a media record whose id is NOT in the owner's list: the invariant
    // was broken before the call, and the delete must say so instead of
    // pretending the detach worked.
    let (app, store) = app();
    let token = seeded_token(&app).await;

    let id = "orphanmediaid0123456";
    store
        .create(
            "media",
            id,
            json!({
                "id": id,
                "phone": PHONE,
                "url": "https://example.com",
                "description": "never linked",
                "ownerName": "A"
            }),
        )
        .await
        .unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/media?id={}", id))
        .header("token", &token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Could not find"));

    // The media record itself is gone; only the detach failed.
    assert!(store.read("media", id).await.is_err());
}
