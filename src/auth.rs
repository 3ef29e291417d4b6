use axum::{extract::FromRequestParts, http::request::Parts};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::convert::Infallible;

/// Length of every opaque record identifier (tokens and media records).
/// Collision probability over a 36-symbol alphabet at this length is treated
/// as negligible.
pub const RECORD_ID_LEN: usize = 20;

type HmacSha256 = Hmac<Sha256>;

/// hash_secret
///
/// The one-way hash applied to account passwords before storage: HMAC-SHA256
/// keyed by the server-side hashing secret, hex-encoded. Deterministic, so
/// credential checks are a straight string comparison against the stored hash.
pub fn hash_secret(hashing_secret: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so this construction cannot fail.
    let mut mac = HmacSha256::new_from_slice(hashing_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(secret.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// new_record_id
///
/// Generates a fresh opaque identifier: RECORD_ID_LEN characters drawn from
/// lowercase letters and digits.
pub fn new_record_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..RECORD_ID_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// TokenHeader
///
/// Extractor for the `token` request header carrying the caller's session
/// token id. It never rejects: absence is represented as `None`, and the
/// managers' `verify` call is the single place the value is judged. This keeps
/// authentication decisions out of the transport layer.
#[derive(Debug, Clone)]
pub struct TokenHeader(pub Option<String>);

impl<S> FromRequestParts<S> for TokenHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("token")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        Ok(TokenHeader(token))
    }
}
