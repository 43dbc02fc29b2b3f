//! Continuation token encoding.
//!
//! A token is opaque to callers: a versioned base64 payload wrapping
//! the backend's own cursor together with the fingerprint of the query
//! that produced it and the running record count. Decoding validates
//! version, shape, and fingerprint, so a token handed to a different
//! query is rejected instead of silently continuing the wrong feed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::errors::{CatalogError, CatalogResult};

const TOKEN_VERSION: &str = "v1";
const MAX_TOKEN_LEN: usize = 1024;

/// Opaque resumption handle for a paginated catalog query.
///
/// Valid only for continuing the exact query that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenPayload {
    pub query_fingerprint: String,
    pub backend_cursor: String,
    /// Records already handed out across the pages walked so far
    pub fetched: usize,
}

pub(crate) fn encode(payload: &TokenPayload) -> CatalogResult<ContinuationToken> {
    let bytes = serde_json::to_vec(payload)
        .map_err(|e| CatalogError::invalid_token(format!("token encode failed: {e}")))?;
    Ok(ContinuationToken(format!(
        "{TOKEN_VERSION}.{}",
        URL_SAFE_NO_PAD.encode(bytes)
    )))
}

pub(crate) fn decode(
    token: &ContinuationToken,
    expected_fingerprint: &str,
) -> CatalogResult<TokenPayload> {
    if token.0.len() > MAX_TOKEN_LEN {
        return Err(CatalogError::invalid_token("token exceeds max length"));
    }
    let (version, payload_part) = token
        .0
        .split_once('.')
        .ok_or_else(|| CatalogError::invalid_token("malformed token"))?;
    if version != TOKEN_VERSION {
        return Err(CatalogError::invalid_token(format!(
            "unsupported token version: {version}"
        )));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|e| CatalogError::invalid_token(e.to_string()))?;
    let payload: TokenPayload = serde_json::from_slice(&bytes)
        .map_err(|e| CatalogError::invalid_token(e.to_string()))?;

    if payload.query_fingerprint != expected_fingerprint {
        return Err(CatalogError::invalid_token(
            "token does not belong to the active query",
        ));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TokenPayload {
        TokenPayload {
            query_fingerprint: "abc123".to_string(),
            backend_cursor: "20".to_string(),
            fetched: 20,
        }
    }

    #[test]
    fn test_round_trip() {
        let token = encode(&payload()).unwrap();
        let decoded = decode(&token, "abc123").unwrap();
        assert_eq!(decoded.backend_cursor, "20");
        assert_eq!(decoded.fetched, 20);
    }

    #[test]
    fn test_foreign_query_is_rejected() {
        let token = encode(&payload()).unwrap();
        let err = decode(&token, "other-query").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidToken { .. }));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let garbage = ContinuationToken("v1.!!not-base64!!".to_string());
        assert!(matches!(
            decode(&garbage, "abc123"),
            Err(CatalogError::InvalidToken { .. })
        ));

        let unversioned = ContinuationToken("no-dot-here".to_string());
        assert!(matches!(
            decode(&unversioned, "abc123"),
            Err(CatalogError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let token = encode(&payload()).unwrap();
        let bumped = ContinuationToken(token.as_str().replacen("v1.", "v9.", 1));
        assert!(matches!(
            decode(&bumped, "abc123"),
            Err(CatalogError::InvalidToken { .. })
        ));
    }
}
