//! Service-account token acquisition.
//!
//! Implements the two-legged OAuth flow for Google service accounts: a
//! short-lived RS256 JWT signed with the keyfile's private key is exchanged
//! at the token endpoint for a bearer access token. Tokens are cached until
//! shortly before expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::google::config::ServiceAccountKey;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Refresh this many seconds before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Acquires and caches access tokens for a service account.
#[derive(Debug)]
pub struct TokenProvider {
    http_client: reqwest::Client,
    key: ServiceAccountKey,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Creates a token provider for the given key and scope.
    pub fn new(http_client: reqwest::Client, key: ServiceAccountKey, scope: impl Into<String>) -> Self {
        Self {
            http_client,
            key,
            scope: scope.into(),
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid access token, fetching a fresh one if needed.
    pub async fn access_token(&self) -> ProviderResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(ref token) = *cached {
            if token.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> ProviderResult<CachedToken> {
        let assertion = self.sign_assertion(Utc::now())?;

        let response = self
            .http_client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                ProviderError::target_unavailable(format!("token request failed: {}", e))
                    .with_provider("google")
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_client_error() {
            return Err(ProviderError::target_rejected(format!(
                "token request rejected ({}): {}",
                status, body
            ))
            .with_provider("google"));
        }
        if !status.is_success() {
            return Err(ProviderError::target_unavailable(format!(
                "token endpoint error ({}): {}",
                status, body
            ))
            .with_provider("google"));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::target_unavailable(format!("unexpected token response: {}", e))
                .with_provider("google")
        })?;

        debug!(expires_in = token.expires_in, "obtained access token");
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> ProviderResult<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| {
                ProviderError::configuration("private key is not valid RSA PEM")
                    .with_provider("google")
                    .with_source(e)
            })?;

        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key).map_err(|e| {
            ProviderError::configuration("failed to sign token assertion")
                .with_provider("google")
                .with_source(e)
        })
    }
}
