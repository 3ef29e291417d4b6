use crate::{
    accounts::ACCOUNTS,
    auth::{RECORD_ID_LEN, hash_secret, new_record_id},
    error::ApiError,
    models::{Account, Token},
    store::{StoreError, StoreState},
};
use chrono::Utc;

/// Collection name for token records.
pub const TOKENS: &str = "tokens";

/// How long a freshly issued or extended token stays valid.
const TOKEN_TTL_MS: i64 = 60 * 60 * 1000;

/// TokenAuthority
///
/// The sole authentication primitive in the system. It issues tokens against
/// stored credentials, reads/extends/revokes them, and exposes `verify`, the
/// single authorization gate every owner-scoped operation in the other
/// managers must pass before trusting a caller-supplied owner identity.
///
/// Expiry is lazy: no background sweep exists, an expired token simply fails
/// verification (and extension) the next time it is presented.
pub struct TokenAuthority {
    store: StoreState,
    hashing_secret: String,
}

impl TokenAuthority {
    pub fn new(store: StoreState, hashing_secret: String) -> Self {
        Self {
            store,
            hashing_secret,
        }
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// issue
    ///
    /// Creates a new token for `phone` after a credential check: the supplied
    /// password is hashed the same way account creation hashed it, and must
    /// equal the stored hash exactly.
    pub async fn issue(&self, phone: &str, password: &str) -> Result<Token, ApiError> {
        let account: Account = match self.store.read(ACCOUNTS, phone).await {
            Ok(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Persistence(format!("corrupt account record: {}", e)))?,
            Err(StoreError::NotFound) => {
                return Err(ApiError::NotFound(
                    "Could not find the specified account".to_string(),
                ));
            }
            Err(e) => return Err(ApiError::Persistence(e.to_string())),
        };

        if hash_secret(&self.hashing_secret, password) != account.hashed_password {
            return Err(ApiError::InvalidCredentials);
        }

        let token = Token {
            id: new_record_id(),
            phone: phone.to_string(),
            expires: Self::now_ms() + TOKEN_TTL_MS,
            first_name: account.first_name,
        };

        let record = serde_json::to_value(&token)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;
        self.store
            .create(TOKENS, &token.id, record)
            .await
            .map_err(|_| ApiError::Persistence("Could not create the new token".to_string()))?;

        Ok(token)
    }

    /// read
    ///
    /// Looks up a token by id. Expired tokens are still readable; expiry only
    /// gates verification and extension.
    pub async fn read(&self, id: &str) -> Result<Token, ApiError> {
        match self.store.read(TOKENS, id).await {
            Ok(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Persistence(format!("corrupt token record: {}", e))),
            Err(StoreError::NotFound) => Err(ApiError::NotFound(
                "Could not find the specified token".to_string(),
            )),
            Err(e) => Err(ApiError::Persistence(e.to_string())),
        }
    }

    /// extend
    ///
    /// Pushes an unexpired token's expiry out by the TTL. An already-expired
    /// token is rejected and left untouched: `expires` only ever moves
    /// forward, and only while the token is still live.
    pub async fn extend(&self, id: &str) -> Result<Token, ApiError> {
        let mut token = self.read(id).await?;

        if token.expires <= Self::now_ms() {
            return Err(ApiError::Expired);
        }

        token.expires = Self::now_ms() + TOKEN_TTL_MS;
        let record = serde_json::to_value(&token)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;
        self.store.update(TOKENS, id, record).await.map_err(|_| {
            ApiError::Persistence("Could not update the token's expiration".to_string())
        })?;

        Ok(token)
    }

    /// revoke
    ///
    /// Deletes a token record.
    pub async fn revoke(&self, id: &str) -> Result<(), ApiError> {
        // Read first so a missing token reports NotFound with the caller-facing
        // message rather than leaking the store's own wording.
        self.read(id).await?;
        self.store
            .delete(TOKENS, id)
            .await
            .map_err(|_| ApiError::Persistence("Could not delete the specified token".to_string()))
    }

    /// verify
    ///
    /// The authorization gate: true only if the token exists, belongs to
    /// `phone`, and has not expired. Never errors: any failure, including a
    /// missing header (None), an id of the wrong shape, or a store fault, is
    /// simply "not verified".
    pub async fn verify(&self, id: Option<&str>, phone: &str) -> bool {
        let Some(id) = id else {
            return false;
        };
        if id.len() != RECORD_ID_LEN {
            return false;
        }
        match self.read(id).await {
            Ok(token) => token.phone == phone && token.expires > Self::now_ms(),
            Err(_) => false,
        }
    }
}
