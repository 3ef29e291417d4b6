use crate::{
    accounts::ACCOUNTS,
    auth::{RECORD_ID_LEN, new_record_id},
    dns::ResolverState,
    error::ApiError,
    models::{Account, CreateMediaRequest, Media, UpdateMediaRequest},
    store::{StoreError, StoreState},
    tokens::TokenAuthority,
};
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

/// Collection name for media records.
pub const MEDIA: &str = "media";

/// MediaManager
///
/// Validates and CRUDs media-link records. Creation is the interesting path:
/// the owner comes from the caller's token, the submitted URL's host must
/// resolve via DNS, and the new record's id is appended to the owning
/// account's `media_links` in a second, non-atomic write.
pub struct MediaManager {
    store: StoreState,
    tokens: Arc<TokenAuthority>,
    resolver: ResolverState,
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// valid_id
///
/// Media and token ids share the same opaque 20-character shape; anything else
/// is rejected before a store lookup is attempted.
pub fn valid_id(value: Option<&String>) -> Option<String> {
    trimmed(value).filter(|v| v.len() == RECORD_ID_LEN)
}

/// hostname_of
///
/// Extracts the host from a submitted URL string. A value that does not parse
/// as an absolute URL, or parses without a host, yields None.
fn hostname_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_string()))
}

impl MediaManager {
    pub fn new(store: StoreState, tokens: Arc<TokenAuthority>, resolver: ResolverState) -> Self {
        Self {
            store,
            tokens,
            resolver,
        }
    }

    /// create
    ///
    /// Resolves the caller's token to an owner, DNS-checks the URL's host,
    /// persists the media record, then appends its id to the owner's
    /// `media_links` and re-persists the account.
    ///
    /// The append is NOT atomic with the media create. If the account update
    /// fails after the media record was written, the record is orphaned and
    /// the caller sees a persistence failure. The orphan is a known
    /// consistency gap of the per-record store contract, not something this
    /// layer can roll back.
    pub async fn create(
        &self,
        token: Option<&str>,
        req: CreateMediaRequest,
    ) -> Result<Media, ApiError> {
        let (Some(url), Some(description)) = (
            trimmed(req.url.as_ref()),
            trimmed(req.description.as_ref()),
        ) else {
            return Err(ApiError::Validation(
                "Missing required inputs, or inputs are invalid".to_string(),
            ));
        };

        // Resolve the owner through the token. A missing, unknown, or expired
        // token is an authorization failure, not a lookup failure.
        let Some(token_id) = token else {
            return Err(ApiError::Forbidden);
        };
        let token = match self.tokens.read(token_id).await {
            Ok(token) if token.expires > Utc::now().timestamp_millis() => token,
            _ => return Err(ApiError::Forbidden),
        };

        let mut account: Account = match self.store.read(ACCOUNTS, &token.phone).await {
            Ok(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Persistence(format!("corrupt account record: {}", e)))?,
            Err(StoreError::NotFound) => {
                return Err(ApiError::NotFound(
                    "Could not find the account that owns this token".to_string(),
                ));
            }
            Err(e) => return Err(ApiError::Persistence(e.to_string())),
        };

        // The URL must carry a host with live DNS records.
        let Some(hostname) = hostname_of(&url) else {
            return Err(ApiError::Invalid(
                "The host name of the url entered did not resolve to any DNS entries".to_string(),
            ));
        };
        if self.resolver.resolve(&hostname).await.is_err() {
            return Err(ApiError::Invalid(
                "The host name of the url entered did not resolve to any DNS entries".to_string(),
            ));
        }

        let media = Media {
            id: new_record_id(),
            phone: token.phone.clone(),
            url,
            description,
            owner_name: token.first_name.clone(),
        };

        let record = serde_json::to_value(&media)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;
        self.store
            .create(MEDIA, &media.id, record)
            .await
            .map_err(|_| ApiError::Persistence("Could not create the new media record".to_string()))?;

        // Second write: maintain the owning side of the relation.
        account.media_links.push(media.id.clone());
        let record = serde_json::to_value(&account)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;
        self.store
            .update(ACCOUNTS, &token.phone, record)
            .await
            .map_err(|_| {
                ApiError::Persistence(
                    "Could not update the account with the new media record".to_string(),
                )
            })?;

        Ok(media)
    }

    /// list
    ///
    /// Every media record across all owners, keyed by id. There is no
    /// ownership filter here; this mirrors the existing access model, where
    /// listing is the one media operation that is not owner-scoped.
    pub async fn list(&self) -> Result<BTreeMap<String, Media>, ApiError> {
        let ids = self
            .store
            .list(MEDIA)
            .await
            .map_err(|e| ApiError::Persistence(e.to_string()))?;

        if ids.is_empty() {
            return Err(ApiError::Empty);
        }

        // One concurrent read per id; join_all waits for all of them before
        // the aggregate is assembled, regardless of completion order.
        let reads = ids.iter().map(|id| {
            let store = self.store.clone();
            let id = id.clone();
            async move { (id.clone(), store.read(MEDIA, &id).await) }
        });

        let mut listing = BTreeMap::new();
        for (id, result) in join_all(reads).await {
            match result {
                Ok(value) => {
                    let media: Media = serde_json::from_value(value).map_err(|e| {
                        ApiError::Persistence(format!("corrupt media record: {}", e))
                    })?;
                    listing.insert(id, media);
                }
                Err(_) => {
                    return Err(ApiError::Persistence(format!(
                        "Not able to read media record {}",
                        id
                    )));
                }
            }
        }
        Ok(listing)
    }

    /// update
    ///
    /// Owner-scoped partial update. The record is loaded first to discover its
    /// owner; only then is the caller's token verified against that owner.
    pub async fn update(
        &self,
        token: Option<&str>,
        req: UpdateMediaRequest,
    ) -> Result<(), ApiError> {
        let Some(id) = valid_id(req.id.as_ref()) else {
            return Err(ApiError::Validation("Missing required field".to_string()));
        };

        let url = trimmed(req.url.as_ref());
        let description = trimmed(req.description.as_ref());
        if url.is_none() && description.is_none() {
            return Err(ApiError::Validation("Missing fields to update".to_string()));
        }

        let mut media = self.load(&id).await?;

        if !self.tokens.verify(token, &media.phone).await {
            return Err(ApiError::Forbidden);
        }

        if let Some(url) = url {
            media.url = url;
        }
        if let Some(description) = description {
            media.description = description;
        }

        let record = serde_json::to_value(&media)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;
        self.store
            .update(MEDIA, &id, record)
            .await
            .map_err(|_| ApiError::Persistence("Could not update the media record".to_string()))
    }

    /// delete
    ///
    /// Owner-scoped delete with relation maintenance: the media record goes
    /// first, then its id is removed from the owning account's `media_links`.
    /// An id missing from that list means the invariant was already broken
    /// before this call, which is surfaced as `Inconsistent` rather than
    /// papered over.
    pub async fn delete(&self, id: &str, token: Option<&str>) -> Result<(), ApiError> {
        let media = self.load(id).await?;

        if !self.tokens.verify(token, &media.phone).await {
            return Err(ApiError::Forbidden);
        }

        self.store
            .delete(MEDIA, id)
            .await
            .map_err(|_| ApiError::Persistence("Could not delete the media record".to_string()))?;

        let mut account: Account = match self.store.read(ACCOUNTS, &media.phone).await {
            Ok(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Persistence(format!("corrupt account record: {}", e)))?,
            Err(_) => {
                return Err(ApiError::Inconsistent(
                    "Could not find the account that owns the media record, so could not remove it from their list".to_string(),
                ));
            }
        };

        let Some(position) = account.media_links.iter().position(|link| link == id) else {
            return Err(ApiError::Inconsistent(
                "Could not find the media record on the owning account, so could not remove it"
                    .to_string(),
            ));
        };
        account.media_links.remove(position);

        let record = serde_json::to_value(&account)
            .map_err(|e| ApiError::Persistence(e.to_string()))?;
        self.store
            .update(ACCOUNTS, &media.phone, record)
            .await
            .map_err(|_| ApiError::Persistence("Could not update the owning account".to_string()))
    }

    /// Internal typed read with NotFound carrying the caller-facing message.
    async fn load(&self, id: &str) -> Result<Media, ApiError> {
        match self.store.read(MEDIA, id).await {
            Ok(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Persistence(format!("corrupt media record: {}", e))),
            Err(StoreError::NotFound) => Err(ApiError::NotFound(
                "The media id specified could not be found".to_string(),
            )),
            Err(e) => Err(ApiError::Persistence(e.to_string())),
        }
    }
}
