//! Linode personal access token rotation.
//!
//! Create-then-revoke: a new token is created with the requested label,
//! scopes, and expiry, then the old one is found by its truncated prefix in
//! the token listing and revoked. Active tokens are momentarily doubled
//! between the two calls.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use super::{AutoRotation, RotationResult};
use crate::error::{ProviderErrorKind, Result, ToknError};
use crate::registry::Token;

const API_BASE: &str = "https://api.linode.com/v4";
const EXPIRY_DAYS: i64 = 90;
// The listing endpoint only ever reveals this many leading characters of
// a token's value; matching the old token uses the same prefix length.
const TOKEN_PREFIX_LEN: usize = 16;

pub struct LinodeProvider {
    base: String,
    client: reqwest::Client,
}

impl LinodeProvider {
    pub fn new() -> Self {
        Self::with_base(API_BASE.to_string())
    }

    /// Point the provider at a different API base (used by tests).
    pub fn with_base(base: String) -> Self {
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    async fn create_token(
        &self,
        current: &str,
        label: &str,
        scopes: &str,
        expiry: chrono::DateTime<Utc>,
    ) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/profile/tokens", self.base))
            .bearer_auth(current)
            .json(&json!({
                "label": label,
                "scopes": scopes,
                "expiry": expiry.format("%Y-%m-%dT%H:%M:%S").to_string(),
            }))
            .send()
            .await
            .map_err(|e| ToknError::from_http("linode", e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "linode",
                status,
                format!("token create returned status {}", status),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToknError::from_http("linode", e))?;
        body["token"].as_str().map(str::to_string).ok_or_else(|| {
            ToknError::provider(
                "linode",
                ProviderErrorKind::Api,
                "create response carried no token value",
            )
        })
    }

    /// Find the old token's id by its truncated prefix in the listing.
    async fn find_token_id(&self, current: &str) -> Result<Option<u64>> {
        let response = self
            .client
            .get(format!("{}/profile/tokens", self.base))
            .bearer_auth(current)
            .send()
            .await
            .map_err(|e| ToknError::from_http("linode", e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "linode",
                status,
                format!("token list returned status {}", status),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToknError::from_http("linode", e))?;
        let prefix: String = current.chars().take(TOKEN_PREFIX_LEN).collect();

        let id = body["data"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|t| t["token"].as_str() == Some(prefix.as_str()))
            .and_then(|t| t["id"].as_u64());
        Ok(id)
    }

    async fn revoke_token(&self, current: &str, token_id: u64) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/profile/tokens/{}", self.base, token_id))
            .bearer_auth(current)
            .send()
            .await
            .map_err(|e| ToknError::from_http("linode", e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "linode",
                status,
                format!("token revoke returned status {}", status),
            ));
        }
        Ok(())
    }
}

impl Default for LinodeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutoRotation for LinodeProvider {
    fn service(&self) -> &'static str {
        "linode"
    }

    async fn rotate(&self, current_value: &str, token: &Token) -> Result<RotationResult> {
        let date = Utc::now().format("%Y%m%d");
        let default_label = format!("tokn-rotated-{}", date);
        let label = token.extra.get("label").map(String::as_str).unwrap_or(&default_label);
        let scopes = token.extra.get("scopes").map(String::as_str).unwrap_or("*");
        let expiry = Utc::now() + Duration::days(EXPIRY_DAYS);

        let new_value = self
            .create_token(current_value, label, scopes, expiry)
            .await?;

        // Revoke the old token only after the new one exists. A token that
        // cannot be found in the listing is left to expire on its own.
        if let Some(old_id) = self.find_token_id(current_value).await? {
            self.revoke_token(current_value, old_id).await?;
        }

        let mut result = RotationResult::new(new_value);
        result.new_expiry = Some(expiry);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LocationSpec, RotationType};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OLD: &str = "linode-old-token-value-0123456789";

    fn sample_token() -> Token {
        Token {
            service: "linode".to_string(),
            rotation_type: RotationType::Auto,
            locations: vec![LocationSpec::new("linode-cli", "~/.config/linode-cli")],
            expires_at: Utc::now() + Duration::days(10),
            last_rotated_at: None,
            notes: String::new(),
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn creates_then_revokes_the_old_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/profile/tokens"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "token": "linode-new" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profile/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": 11, "token": "unrelated-prefix" },
                    { "id": 42, "token": &OLD[..16] }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/profile/tokens/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = LinodeProvider::with_base(server.uri());
        let result = provider.rotate(OLD, &sample_token()).await.unwrap();
        assert_eq!(result.new_value, "linode-new");
        assert!(result.new_expiry.is_some());
    }

    #[tokio::test]
    async fn unlisted_old_token_is_left_to_expire() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/profile/tokens"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "token": "linode-new" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profile/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let provider = LinodeProvider::with_base(server.uri());
        let result = provider.rotate(OLD, &sample_token()).await.unwrap();
        assert_eq!(result.new_value, "linode-new");
    }

    #[tokio::test]
    async fn rate_limit_surfaces_as_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/profile/tokens"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = LinodeProvider::with_base(server.uri());
        let err = provider.rotate(OLD, &sample_token()).await.unwrap_err();
        assert!(matches!(
            err,
            ToknError::Provider {
                kind: ProviderErrorKind::RateLimited,
                ..
            }
        ));
    }
}
