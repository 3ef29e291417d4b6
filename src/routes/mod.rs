/// Router Module Index
///
/// One router per resource, mirroring the dispatch-by-resource model: every
/// inbound request is routed by resource name, and each resource's
/// MethodRouter enumerates exactly the verbs it supports; anything else gets
/// a 405 from axum without touching a handler.
///
/// Authorization is not a routing concern here: the `token` header is pulled
/// by the `TokenHeader` extractor and judged inside the managers, because the
/// owner identity it must verify against arrives in the query/body, not the
/// path.

/// The account resource (POST public; GET/PUT/DELETE token-scoped).
pub mod account;

/// The token resource (all methods public; tokens are self-authenticating).
pub mod token;

/// The media resource (GET public; POST/PUT/DELETE owner-scoped).
pub mod media;
