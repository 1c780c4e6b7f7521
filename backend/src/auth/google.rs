//! Verification of Google-issued ID tokens.
//!
//! Tokens are RS256 JWTs signed with keys published at Google's JWKS
//! endpoint. Keys are cached for an hour and refetched early when a token
//! names a key id the cache does not know, at most once per minute.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::errors::AuthError;
use super::models::FederatedIdentity;

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
const JWKS_TTL: Duration = Duration::from_secs(60 * 60);
/// Minimum age of the cache before an unknown key id triggers a refetch.
const JWKS_REFETCH_COOLDOWN: Duration = Duration::from_secs(60);

/// Verifies an externally issued identity token.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<Value>,
    #[serde(default)]
    name: Option<String>,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

pub struct GoogleIdTokenVerifier {
    client_id: String,
    jwks_url: String,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl GoogleIdTokenVerifier {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self::with_jwks_url(client_id, GOOGLE_JWKS_URL)
    }

    pub fn with_jwks_url(client_id: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            jwks_url: jwks_url.into(),
            http: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        {
            let cached = self.keys.read().await;
            if let Some(cached) = cached.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < JWKS_TTL {
                    if let Some(jwk) = cached.set.find(kid) {
                        return Ok(jwk.clone());
                    }
                    if age < JWKS_REFETCH_COOLDOWN {
                        return Err(unknown_kid(kid));
                    }
                }
            }
        }

        let set = self.fetch_keys().await?;
        let jwk = set.find(kid).cloned();
        *self.keys.write().await = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });
        jwk.ok_or_else(|| unknown_kid(kid))
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(url = %self.jwks_url, "Fetching Google signing keys");
        self.http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| AuthError::InvalidIdToken(format!("cannot fetch signing keys: {err}")))?
            .json::<JwkSet>()
            .await
            .map_err(|err| AuthError::InvalidIdToken(format!("malformed signing keys: {err}")))
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, AuthError> {
        let header =
            decode_header(id_token).map_err(|err| AuthError::InvalidIdToken(err.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidIdToken("token header has no key id".into()))?;
        let jwk = self.key_for(&kid).await?;
        let key =
            DecodingKey::from_jwk(&jwk).map_err(|err| AuthError::InvalidIdToken(err.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|err| AuthError::InvalidIdToken(err.to_string()))?;
        identity_from_claims(data.claims)
    }
}

fn unknown_kid(kid: &str) -> AuthError {
    AuthError::InvalidIdToken(format!("unknown key id '{kid}'"))
}

fn identity_from_claims(claims: GoogleClaims) -> Result<FederatedIdentity, AuthError> {
    let email = claims
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::InvalidIdToken("token has no email claim".into()))?;

    // Google sends a boolean; some older tokens carry the string "true".
    let verified = match claims.email_verified {
        Some(Value::Bool(v)) => v,
        Some(Value::String(s)) => s == "true",
        _ => false,
    };
    if !verified {
        return Err(AuthError::InvalidIdToken(format!("email '{email}' is not verified")));
    }

    Ok(FederatedIdentity {
        email,
        name: claims.name.filter(|n| !n.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> GoogleClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn verified_email_becomes_identity() {
        let identity = identity_from_claims(claims(json!({
            "email": "tecnico@gmail.com",
            "email_verified": true,
            "name": "Técnico"
        })))
        .unwrap();
        assert_eq!(identity.email, "tecnico@gmail.com");
        assert_eq!(identity.name.as_deref(), Some("Técnico"));
    }

    #[test]
    fn string_verified_flag_is_accepted() {
        let identity = identity_from_claims(claims(json!({
            "email": "a@b.com",
            "email_verified": "true"
        })))
        .unwrap();
        assert_eq!(identity.name, None);
    }

    #[test]
    fn unverified_or_missing_email_is_rejected() {
        let err = identity_from_claims(claims(json!({
            "email": "a@b.com",
            "email_verified": false
        })))
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidIdToken(_)));

        let err = identity_from_claims(claims(json!({"email_verified": true}))).unwrap_err();
        assert!(matches!(err, AuthError::InvalidIdToken(_)));
    }

    async fn with_cached_keys(verifier: &GoogleIdTokenVerifier, age: Duration) {
        let fetched_at = Instant::now()
            .checked_sub(age)
            .unwrap_or_else(Instant::now);
        *verifier.keys.write().await = Some(CachedKeys {
            set: JwkSet { keys: Vec::new() },
            fetched_at,
        });
    }

    #[tokio::test]
    async fn unknown_kid_within_cooldown_does_not_refetch() {
        let verifier = GoogleIdTokenVerifier::with_jwks_url("client", "http://127.0.0.1:9/never");
        with_cached_keys(&verifier, Duration::ZERO).await;
        match verifier.key_for("rotated").await {
            Err(AuthError::InvalidIdToken(msg)) => assert!(msg.contains("unknown key id")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_kid_after_cooldown_refetches() {
        let verifier = GoogleIdTokenVerifier::with_jwks_url("client", "http://127.0.0.1:9/never");
        with_cached_keys(&verifier, JWKS_REFETCH_COOLDOWN + Duration::from_secs(1)).await;
        match verifier.key_for("rotated").await {
            Err(AuthError::InvalidIdToken(msg)) => {
                assert!(msg.contains("cannot fetch signing keys"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_token_fails_before_any_key_fetch() {
        let verifier = GoogleIdTokenVerifier::with_jwks_url("client", "http://127.0.0.1:9/never");
        let err = verifier.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidIdToken(_)));
    }
}
