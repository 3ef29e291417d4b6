use crate::{
    AppState,
    accounts::valid_phone,
    auth::TokenHeader,
    error::{ApiError, ErrorBody},
    media::valid_id,
    models::{
        AccountPublic, CreateAccountRequest, CreateMediaRequest, CredentialsRequest,
        ExtendTokenRequest, Media, Token, UpdateAccountRequest, UpdateMediaRequest,
    },
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::collections::BTreeMap;

// --- Query Structs ---

/// PhoneQuery
///
/// Accepted query parameters for the owner-keyed account endpoints
/// (GET/DELETE /account?phone=...). Optional at the extractor level so a
/// missing parameter produces our 400 message, not an extractor rejection.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PhoneQuery {
    pub phone: Option<String>,
}

/// IdQuery
///
/// Accepted query parameters for the id-keyed endpoints
/// (GET/DELETE /token?id=..., DELETE /media?id=...).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct IdQuery {
    pub id: Option<String>,
}

// --- Status-code remaps ---
//
// The preserved surface is inconsistent about "not found": 404 on account/token
// GET, 400 everywhere else, and 403 on the media-create owner lookup. The
// managers report one NotFound kind; these helpers apply the per-operation code
// at the transport edge.

fn not_found_as_bad_request(err: ApiError) -> Response {
    match err {
        ApiError::NotFound(message) => {
            (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
        }
        other => other.into_response(),
    }
}

fn not_found_as_forbidden(err: ApiError) -> Response {
    match err {
        ApiError::NotFound(_) => ApiError::Forbidden.into_response(),
        other => other.into_response(),
    }
}

// --- Account Handlers ---

/// create_account
///
/// [Public, POST /account] Registers a new account. The terms-of-service flag
/// must be accepted; the key (phone) must not already exist.
#[utoipa::path(
    post,
    path = "/account",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Missing fields or duplicate key", body = ErrorBody)
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<StatusCode, ApiError> {
    state.accounts.create(payload).await?;
    Ok(StatusCode::OK)
}

/// read_account
///
/// [Token-scoped, GET /account?phone=...] Returns the account minus its hashed
/// credential. The token must verify against the requested phone.
#[utoipa::path(
    get,
    path = "/account",
    params(PhoneQuery),
    responses(
        (status = 200, description = "Account", body = AccountPublic),
        (status = 403, description = "Token missing or invalid", body = ErrorBody),
        (status = 404, description = "No such account")
    )
)]
pub async fn read_account(
    TokenHeader(token): TokenHeader,
    State(state): State<AppState>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<AccountPublic>, ApiError> {
    let Some(phone) = valid_phone(query.phone.as_ref()) else {
        return Err(ApiError::Validation("Missing required field".to_string()));
    };
    let account = state.accounts.read(&phone, token.as_deref()).await?;
    Ok(Json(account))
}

/// update_account
///
/// [Token-scoped, PUT /account] Partial update of name fields and/or password.
/// A missing account reports 400 on this path (preserved surface).
#[utoipa::path(
    put,
    path = "/account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation failure or unknown account", body = ErrorBody),
        (status = 403, description = "Token missing or invalid", body = ErrorBody)
    )
)]
pub async fn update_account(
    TokenHeader(token): TokenHeader,
    State(state): State<AppState>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<StatusCode, Response> {
    state
        .accounts
        .update(token.as_deref(), payload)
        .await
        .map_err(not_found_as_bad_request)?;
    Ok(StatusCode::OK)
}

/// delete_account
///
/// [Token-scoped, DELETE /account?phone=...] Deletes the account, cascading
/// over every owned media record first. If some cascade deletions fail the
/// account row is still removed and the caller receives the aggregate failure
/// as a 500 (PartialFailure) instead of a false success.
#[utoipa::path(
    delete,
    path = "/account",
    params(PhoneQuery),
    responses(
        (status = 200, description = "Deleted, cascade complete"),
        (status = 400, description = "Bad phone or unknown account", body = ErrorBody),
        (status = 403, description = "Token missing or invalid", body = ErrorBody),
        (status = 500, description = "Cascade partially failed", body = ErrorBody)
    )
)]
pub async fn delete_account(
    TokenHeader(token): TokenHeader,
    State(state): State<AppState>,
    Query(query): Query<PhoneQuery>,
) -> Result<StatusCode, Response> {
    let Some(phone) = valid_phone(query.phone.as_ref()) else {
        return Err(ApiError::Validation("Missing required field".to_string()).into_response());
    };
    state
        .accounts
        .delete(&phone, token.as_deref())
        .await
        .map_err(not_found_as_bad_request)?;
    Ok(StatusCode::OK)
}

// --- Token Handlers ---

/// create_token
///
/// [Public, POST /token] Issues a fresh session token after a credential
/// check. An unknown account and a wrong password both report 400.
#[utoipa::path(
    post,
    path = "/token",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Token issued", body = Token),
        (status = 400, description = "Bad credentials or unknown account", body = ErrorBody)
    )
)]
pub async fn create_token(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<Token>, Response> {
    let (Some(phone), Some(password)) = (
        valid_phone(payload.phone.as_ref()),
        payload
            .password
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty()),
    ) else {
        return Err(
            ApiError::Validation("Missing required field(s)".to_string()).into_response(),
        );
    };

    let token = state
        .tokens
        .issue(&phone, password)
        .await
        .map_err(not_found_as_bad_request)?;
    Ok(Json(token))
}

/// read_token
///
/// [Public, GET /token?id=...] Looks up a token record by id. This is one of
/// the two endpoints where "not found" is a 404 (preserved surface).
#[utoipa::path(
    get,
    path = "/token",
    params(IdQuery),
    responses(
        (status = 200, description = "Token", body = Token),
        (status = 400, description = "Missing or malformed id", body = ErrorBody),
        (status = 404, description = "No such token")
    )
)]
pub async fn read_token(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Token>, ApiError> {
    let Some(id) = valid_id(query.id.as_ref()) else {
        return Err(ApiError::Validation(
            "Missing required field, or field invalid".to_string(),
        ));
    };
    let token = state.tokens.read(&id).await?;
    Ok(Json(token))
}

/// extend_token
///
/// [Public, PUT /token] Re-issues the expiry of an unexpired token. The
/// `extend` flag must be present and true; an expired token is rejected
/// without being mutated.
#[utoipa::path(
    put,
    path = "/token",
    request_body = ExtendTokenRequest,
    responses(
        (status = 200, description = "Extended"),
        (status = 400, description = "Validation failure, unknown token, or already expired", body = ErrorBody)
    )
)]
pub async fn extend_token(
    State(state): State<AppState>,
    Json(payload): Json<ExtendTokenRequest>,
) -> Result<StatusCode, Response> {
    let (Some(id), Some(true)) = (valid_id(payload.id.as_ref()), payload.extend) else {
        return Err(ApiError::Validation(
            "Missing required field(s) or field(s) are invalid".to_string(),
        )
        .into_response());
    };
    state
        .tokens
        .extend(&id)
        .await
        .map_err(not_found_as_bad_request)?;
    Ok(StatusCode::OK)
}

/// delete_token
///
/// [Public, DELETE /token?id=...] Revokes a token. Deleting an unknown token
/// reports 400 (preserved surface).
#[utoipa::path(
    delete,
    path = "/token",
    params(IdQuery),
    responses(
        (status = 200, description = "Revoked"),
        (status = 400, description = "Missing id or unknown token", body = ErrorBody)
    )
)]
pub async fn delete_token(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<StatusCode, Response> {
    let Some(id) = valid_id(query.id.as_ref()) else {
        return Err(ApiError::Validation("Missing required field".to_string()).into_response());
    };
    state
        .tokens
        .revoke(&id)
        .await
        .map_err(not_found_as_bad_request)?;
    Ok(StatusCode::OK)
}

// --- Media Handlers ---

/// create_media
///
/// [Token-scoped, POST /media] Creates a media record owned by the token's
/// account. The URL's host must have live DNS records. A dangling token (one
/// whose account no longer exists) reports 403, indistinguishable from a bad
/// token (preserved surface).
#[utoipa::path(
    post,
    path = "/media",
    request_body = CreateMediaRequest,
    responses(
        (status = 200, description = "Created", body = Media),
        (status = 400, description = "Validation failure or unresolvable host", body = ErrorBody),
        (status = 403, description = "Token missing, invalid, or dangling", body = ErrorBody)
    )
)]
pub async fn create_media(
    TokenHeader(token): TokenHeader,
    State(state): State<AppState>,
    Json(payload): Json<CreateMediaRequest>,
) -> Result<Json<Media>, Response> {
    let media = state
        .media
        .create(token.as_deref(), payload)
        .await
        .map_err(not_found_as_forbidden)?;
    Ok(Json(media))
}

/// list_media
///
/// [Public, GET /media] Returns every media record across all owners, keyed
/// by id. No ownership filter: preserved existing behavior of the access
/// model. An empty store reports 400.
#[utoipa::path(
    get,
    path = "/media",
    responses(
        (status = 200, description = "All media records", body = BTreeMap<String, Media>),
        (status = 400, description = "No media available", body = ErrorBody)
    )
)]
pub async fn list_media(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Media>>, ApiError> {
    let listing = state.media.list().await?;
    Ok(Json(listing))
}

/// update_media
///
/// [Owner-scoped, PUT /media] Partial update of url/description. The record is
/// loaded first to discover its owner, then the token is verified against that
/// owner.
#[utoipa::path(
    put,
    path = "/media",
    request_body = UpdateMediaRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation failure or unknown id", body = ErrorBody),
        (status = 403, description = "Token does not belong to the owner", body = ErrorBody)
    )
)]
pub async fn update_media(
    TokenHeader(token): TokenHeader,
    State(state): State<AppState>,
    Json(payload): Json<UpdateMediaRequest>,
) -> Result<StatusCode, Response> {
    state
        .media
        .update(token.as_deref(), payload)
        .await
        .map_err(not_found_as_bad_request)?;
    Ok(StatusCode::OK)
}

/// delete_media
///
/// [Owner-scoped, DELETE /media?id=...] Deletes the record and detaches it
/// from the owning account's media list. An id missing from that list means
/// the relation invariant was already broken and reports 500 (Inconsistent).
#[utoipa::path(
    delete,
    path = "/media",
    params(IdQuery),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Missing id or unknown record", body = ErrorBody),
        (status = 403, description = "Token does not belong to the owner", body = ErrorBody),
        (status = 500, description = "Relation invariant already broken", body = ErrorBody)
    )
)]
pub async fn delete_media(
    TokenHeader(token): TokenHeader,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<StatusCode, Response> {
    let Some(id) = valid_id(query.id.as_ref()) else {
        return Err(ApiError::Validation("Missing valid id".to_string()).into_response());
    };
    state
        .media
        .delete(&id, token.as_deref())
        .await
        .map_err(not_found_as_bad_request)?;
    Ok(StatusCode::OK)
}

// --- Liveness ---

/// ping
///
/// [Public, GET /ping] Liveness probe for monitoring and load balancer checks.
#[utoipa::path(get, path = "/ping", responses((status = 200, description = "Alive")))]
pub async fn ping() -> StatusCode {
    StatusCode::OK
}
