use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::errors::GatewayError;

/// Seconds of clock skew tolerated when the fallback decode checks `exp`.
const EXPIRY_GRACE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity provider base URL, e.g. `https://xyz.supabase.co/auth/v1`.
    pub verify_url: String,
    /// Project API key sent alongside the user token on verification calls.
    pub api_key: String,
    /// Allow the unverified structural decode when strict verification
    /// fails. SECURITY TRADE-OFF: the fallback checks token structure and
    /// expiry only, not the signature. It exists to ride out windows where
    /// the verifier's key material lags the token issuer; disable it once
    /// that mismatch is fixed.
    pub allow_decode_fallback: bool,
}

/// Resolves an authenticated principal from an inbound bearer token.
pub struct CredentialResolver {
    client: Client,
    config: AuthConfig,
}

impl CredentialResolver {
    pub fn new(config: AuthConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self { client, config })
    }

    /// Authenticate a request. The override header takes precedence over
    /// the standard bearer header; at least one must be present and
    /// non-empty.
    pub async fn resolve(
        &self,
        bearer: Option<&str>,
        override_token: Option<&str>,
    ) -> Result<String, GatewayError> {
        let token = override_token
            .filter(|t| !t.is_empty())
            .or(bearer.filter(|t| !t.is_empty()))
            .ok_or(GatewayError::MissingCredential)?;

        if let Some(principal) = self.verify_remote(token).await {
            return Ok(principal);
        }

        if self.config.allow_decode_fallback {
            if let Some(principal) = decode_unverified(token, Utc::now().timestamp()) {
                return Ok(principal);
            }
        }

        Err(GatewayError::InvalidOrExpiredCredential)
    }

    /// Strict path: ask the identity provider to validate the token.
    /// Any failure (network, non-2xx, malformed body) yields None so the
    /// caller can decide whether to fall back.
    async fn verify_remote(&self, token: &str) -> Option<String> {
        let url = format!("{}/user", self.config.verify_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("apikey", &self.config.api_key)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let body: Value = response.json().await.ok()?;
        body.get("id").and_then(|v| v.as_str()).map(String::from)
    }
}

/// Structural decode of the token payload, without signature
/// verification. Accepts a well-formed token whose `exp` is no more
/// than [`EXPIRY_GRACE_SECS`] in the past and returns its `sub`.
fn decode_unverified(token: &str, now: i64) -> Option<String> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }

    let payload = URL_SAFE_NO_PAD.decode(segments[1]).ok()?;
    let claims: Value = serde_json::from_slice(&payload).ok()?;

    let sub = claims.get("sub")?.as_str()?;
    let exp = claims.get("exp")?.as_i64()?;
    if exp < now - EXPIRY_GRACE_SECS {
        return None;
    }

    Some(sub.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_token(claims: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\",\"typ\":\"JWT\"}");
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{}.{}.signature", header, payload)
    }

    fn resolver_for(verify_url: &str, allow_fallback: bool) -> CredentialResolver {
        CredentialResolver::new(AuthConfig {
            verify_url: verify_url.to_string(),
            api_key: "test-key".to_string(),
            allow_decode_fallback: allow_fallback,
        })
        .unwrap()
    }

    #[test]
    fn test_fallback_accepts_within_grace_window() {
        let now = Utc::now().timestamp();
        let token = make_token(json!({"sub": "user-1", "exp": now - 299}));
        assert_eq!(decode_unverified(&token, now).as_deref(), Some("user-1"));
    }

    #[test]
    fn test_fallback_rejects_past_grace_window() {
        let now = Utc::now().timestamp();
        let token = make_token(json!({"sub": "user-1", "exp": now - 301}));
        assert!(decode_unverified(&token, now).is_none());
    }

    #[test]
    fn test_fallback_requires_sub_and_three_segments() {
        let now = Utc::now().timestamp();
        let no_sub = make_token(json!({"exp": now + 3600}));
        assert!(decode_unverified(&no_sub, now).is_none());
        assert!(decode_unverified("not-a-jwt", now).is_none());
        assert!(decode_unverified("a.b", now).is_none());
    }

    #[tokio::test]
    async fn test_strict_verification_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "verified-user"})))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server.uri(), true);
        let principal = resolver
            .resolve(Some("whatever-token"), None)
            .await
            .unwrap();
        assert_eq!(principal, "verified-user");
    }

    #[tokio::test]
    async fn test_falls_back_when_verification_rejects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let now = Utc::now().timestamp();
        let token = make_token(json!({"sub": "fallback-user", "exp": now + 3600}));

        let resolver = resolver_for(&server.uri(), true);
        let principal = resolver.resolve(Some(&token), None).await.unwrap();
        assert_eq!(principal, "fallback-user");
    }

    #[tokio::test]
    async fn test_fallback_disabled_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let now = Utc::now().timestamp();
        let token = make_token(json!({"sub": "fallback-user", "exp": now + 3600}));

        let resolver = resolver_for(&server.uri(), false);
        let err = resolver.resolve(Some(&token), None).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidOrExpiredCredential));
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let resolver = resolver_for("http://127.0.0.1:9", true);
        let err = resolver.resolve(None, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingCredential));

        let err = resolver.resolve(Some(""), Some("")).await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingCredential));
    }

    #[tokio::test]
    async fn test_override_header_takes_precedence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "Bearer override-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "override-user"})))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server.uri(), false);
        let principal = resolver
            .resolve(Some("bearer-token"), Some("override-token"))
            .await
            .unwrap();
        assert_eq!(principal, "override-user");
    }
}
