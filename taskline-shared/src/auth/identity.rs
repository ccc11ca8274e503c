/// Authenticated request identity
///
/// After the bearer token is validated, the API middleware inserts a
/// [`CurrentUser`] into the request extensions so handlers can see who
/// is calling without re-decoding the token.

use axum::http::{header, HeaderMap};

use crate::models::user::Role;

/// Identity decoded from a valid access token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Subject of the token (user email)
    pub email: String,

    /// Role held when the token was issued
    pub role: Role,
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent or not a bearer credential;
/// the request is then simply unauthenticated and the policy layer
/// decides whether that is acceptable for the route.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_present() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_absent_or_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);
    }
}
