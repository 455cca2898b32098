//! Shared-secret HTTP authentication.
//!
//! Simpler than the platform's JWT/API-key combo in
//! `api-gateway/src/middleware/auth.rs` — this service accepts a single
//! shared secret via either `X-API-Key` or a `Bearer` token, per spec §6.

/// Extract the bearer token from an `Authorization` header value, mirroring
/// `AuthMiddleware::extract_token`.
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Accept either `X-API-Key: <key>` or `Authorization: Bearer <key>`.
pub fn check_api_key(expected: &str, x_api_key: Option<&str>, authorization: Option<&str>) -> bool {
    if let Some(key) = x_api_key {
        if key == expected {
            return true;
        }
    }
    if let Some(auth) = authorization {
        if let Some(token) = extract_bearer(auth) {
            return token == expected;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_api_key_header() {
        assert!(check_api_key("secret", Some("secret"), None));
    }

    #[test]
    fn accepts_matching_bearer_token() {
        assert!(check_api_key("secret", None, Some("Bearer secret")));
    }

    #[test]
    fn rejects_mismatched_credentials() {
        assert!(!check_api_key("secret", Some("wrong"), None));
        assert!(!check_api_key("secret", None, Some("Bearer wrong")));
    }

    #[test]
    fn rejects_missing_credentials() {
        assert!(!check_api_key("secret", None, None));
    }
}
