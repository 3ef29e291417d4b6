use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Stored Records) ---

/// Account
///
/// The canonical account record stored in the `accounts` collection, keyed by
/// phone number. This is the storage shape; `hashed_password` must never leave
/// the process; responses use `AccountPublic` instead.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Account {
    /// Primary key: exactly 10 characters after trimming. Immutable.
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    /// HMAC-SHA256 of the password under the server hashing secret, hex-encoded.
    pub hashed_password: String,
    /// Stored as true; creation is rejected unless the flag was accepted.
    pub tos_agreement: bool,
    /// Ids of every Media record owned by this account, in creation order,
    /// no duplicates. Maintained best-effort on media create/delete.
    #[serde(default)]
    pub media_links: Vec<String>,
}

/// AccountPublic
///
/// The account shape returned to callers: identical to `Account` minus the
/// hashed credential.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccountPublic {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub tos_agreement: bool,
    #[serde(default)]
    pub media_links: Vec<String>,
}

impl From<Account> for AccountPublic {
    fn from(account: Account) -> Self {
        Self {
            phone: account.phone,
            first_name: account.first_name,
            last_name: account.last_name,
            tos_agreement: account.tos_agreement,
            media_links: account.media_links,
        }
    }
}

/// Token
///
/// A session token record in the `tokens` collection, keyed by its own
/// 20-character random id. Expiry is lazy: nothing sweeps expired tokens,
/// they simply stop verifying.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Token {
    pub id: String,
    /// Owner key (FK to Account).
    pub phone: String,
    /// Absolute expiry, epoch milliseconds. Only ever moves forward, and only
    /// while the token is still unexpired.
    pub expires: i64,
    /// Display copy of the owner's first name at issuance time. Not kept in
    /// sync with later account updates.
    pub first_name: String,
}

/// Media
///
/// A user-submitted link record in the `media` collection, keyed by a
/// 20-character random id. `phone` is set once at creation and immutable;
/// the owning account's `media_links` must contain `id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Media {
    pub id: String,
    /// Owner key (FK to Account).
    pub phone: String,
    /// Submitted URL; its host resolved via DNS at creation time.
    pub url: String,
    pub description: String,
    /// Display copy of the owner's first name at creation time.
    pub owner_name: String,
}

// --- Request Payloads (Input Schemas) ---
//
// Every field is optional at the serde level so that a missing field produces
// our 400 validation message instead of a deserializer rejection; the managers
// do the actual presence/shape checks.

/// CreateAccountRequest
///
/// Input payload for POST /account.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateAccountRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub tos_agreement: Option<bool>,
}

/// UpdateAccountRequest
///
/// Partial update payload for PUT /account. `phone` identifies the record;
/// at least one of the other fields must be supplied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAccountRequest {
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// CredentialsRequest
///
/// Input payload for POST /token: the account key plus the plaintext password
/// to be checked against the stored hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CredentialsRequest {
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// ExtendTokenRequest
///
/// Input payload for PUT /token. `extend` must be present and true; re-issuing
/// expiry is the only mutation a token supports.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExtendTokenRequest {
    pub id: Option<String>,
    pub extend: Option<bool>,
}

/// CreateMediaRequest
///
/// Input payload for POST /media. The owner is resolved from the token header,
/// never from the body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateMediaRequest {
    pub url: Option<String>,
    pub description: Option<String>,
}

/// UpdateMediaRequest
///
/// Partial update payload for PUT /media; at least one of url/description.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateMediaRequest {
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
