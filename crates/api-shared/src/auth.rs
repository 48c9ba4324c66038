//! Bearer-token extraction.
//!
//! Identity-scoped routes read the caller's access token from the `Authorization` header. The
//! token is only extracted here; resolving it to a user is the identity provider's job.

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Returns the bearer token carried by `headers`, if any.
///
/// The scheme is matched case-insensitively; a blank token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
