use crate::{
    auth::hash_secret,
    cascade,
    error::ApiError,
    media::MEDIA,
    models::{Account, AccountPublic, CreateAccountRequest, UpdateAccountRequest},
    store::{StoreError, StoreState},
    tokens::TokenAuthority,
};
use std::sync::Arc;

/// Collection name for account records.
pub const ACCOUNTS: &str = "accounts";

/// Exact length of an account key (phone number) after trimming.
const PHONE_LEN: usize = 10;

/// AccountManager
///
/// Validates and CRUDs account records, and owns the `mediaLinks` relation:
/// deleting an account cascade-deletes every media record it references
/// before the account row itself goes away.
///
/// Constructed once at startup and shared by reference: all collaborators
/// (store, token authority) are injected, never looked up globally.
pub struct AccountManager {
    store: StoreState,
    tokens: Arc<TokenAuthority>,
    hashing_secret: String,
}

/// trimmed
///
/// The validation primitive shared by every string field check: Some(trimmed)
/// when the value is present and non-empty after trimming, None otherwise.
fn trimmed(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// valid_phone
///
/// Account keys are phone numbers: exactly PHONE_LEN characters after trim.
pub fn valid_phone(value: Option<&String>) -> Option<String> {
    trimmed(value).filter(|v| v.len() == PHONE_LEN)
}

impl AccountManager {
    pub fn new(store: StoreState, tokens: Arc<TokenAuthority>, hashing_secret: String) -> Self {
        Self {
            store,
            tokens,
            hashing_secret,
        }
    }

    /// create
    ///
    /// Validates every required field, rejects duplicate keys, hashes the
    /// password, and persists a new record with an empty media list.
    pub async fn create(&self, req: CreateAccountRequest) -> Result<(), ApiError> {
        let (Some(first_name), Some(last_name), Some(phone), Some(password), Some(true)) = (
            trimmed(req.first_name.as_ref()),
            trimmed(req.last_name.as_ref()),
            valid_phone(req.phone.as_ref()),
            trimmed(req.password.as_ref()),
            req.tos_agreement,
        ) else {
            return Err(ApiError::Validation("Missing required fields".to_string()));
        };

        let account = Account {
            phone: phone.clone(),
            first_name,
            last_name,
            hashed_password: hash_secret(&self.hashing_secret, &password),
            tos_agreement: true,
            media_links: Vec::new(),
        };

        let record = serde_json::to_value(&account)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;
        match self.store.create(ACCOUNTS, &phone, record).await {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict) => Err(ApiError::Conflict(
                "An account with that phone number already exists".to_string(),
            )),
            Err(_) => Err(ApiError::Persistence(
                "Could not create the new account".to_string(),
            )),
        }
    }

    /// read
    ///
    /// Owner-scoped lookup. The token must verify against the requested key;
    /// the hashed credential is stripped before the record leaves the manager.
    pub async fn read(
        &self,
        phone: &str,
        token: Option<&str>,
    ) -> Result<AccountPublic, ApiError> {
        if !self.tokens.verify(token, phone).await {
            return Err(ApiError::Forbidden);
        }

        let account = self.load(phone).await?;
        Ok(AccountPublic::from(account))
    }

    /// update
    ///
    /// Applies only the supplied fields; a fresh password is re-hashed. At
    /// least one updatable field must be present.
    pub async fn update(
        &self,
        token: Option<&str>,
        req: UpdateAccountRequest,
    ) -> Result<(), ApiError> {
        let Some(phone) = valid_phone(req.phone.as_ref()) else {
            return Err(ApiError::Validation("Missing required field".to_string()));
        };

        let first_name = trimmed(req.first_name.as_ref());
        let last_name = trimmed(req.last_name.as_ref());
        let password = trimmed(req.password.as_ref());
        if first_name.is_none() && last_name.is_none() && password.is_none() {
            return Err(ApiError::Validation("Missing fields to update".to_string()));
        }

        if !self.tokens.verify(token, &phone).await {
            return Err(ApiError::Forbidden);
        }

        let mut account = self.load(&phone).await?;
        if let Some(first_name) = first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            account.last_name = last_name;
        }
        if let Some(password) = password {
            account.hashed_password = hash_secret(&self.hashing_secret, &password);
        }

        let record = serde_json::to_value(&account)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;
        self.store
            .update(ACCOUNTS, &phone, record)
            .await
            .map_err(|_| ApiError::Persistence("Could not update the account".to_string()))
    }

    /// delete
    ///
    /// The cascade path: every media record named in the account's
    /// `media_links` is deleted first (concurrently, best-effort), then the
    /// account row itself. A cascade that partially failed does not resurrect
    /// the account; the row is removed regardless, and the caller is told
    /// about the leftovers via `PartialFailure` instead of a false success.
    pub async fn delete(&self, phone: &str, token: Option<&str>) -> Result<(), ApiError> {
        if !self.tokens.verify(token, phone).await {
            return Err(ApiError::Forbidden);
        }

        let account = self.load(phone).await?;

        let report = cascade::delete_all(&self.store, MEDIA, &account.media_links).await;

        self.store
            .delete(ACCOUNTS, phone)
            .await
            .map_err(|_| ApiError::Persistence("Could not delete the specified account".to_string()))?;

        if report.fully_succeeded() {
            Ok(())
        } else {
            Err(ApiError::PartialFailure {
                succeeded: report.succeeded,
                failed: report.failed,
            })
        }
    }

    /// Internal typed read with NotFound carrying the caller-facing message.
    async fn load(&self, phone: &str) -> Result<Account, ApiError> {
        match self.store.read(ACCOUNTS, phone).await {
            Ok(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Persistence(format!("corrupt account record: {}", e))),
            Err(StoreError::NotFound) => Err(ApiError::NotFound(
                "Could not find the specified account".to_string(),
            )),
            Err(e) => Err(ApiError::Persistence(e.to_string())),
        }
    }
}
