//! Cloudflare API token rotation.
//!
//! Regenerate-in-place: rolling the token value via
//! `PUT /user/tokens/{id}/value` keeps the token's policies attached, where
//! a create/delete cycle would silently lose them. A second call resets the
//! token's expiry to the standard horizon.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use super::{AutoRotation, RotationResult};
use crate::error::{ProviderErrorKind, Result, ToknError};
use crate::registry::Token;

const API_BASE: &str = "https://api.cloudflare.com/client/v4";
const EXPIRY_DAYS: i64 = 90;

pub struct CloudflareProvider {
    base: String,
    client: reqwest::Client,
}

impl CloudflareProvider {
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

    async fn get_json(&self, url: String, bearer: &str, what: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| ToknError::from_http("cloudflare", e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "cloudflare",
                status,
                format!("{} returned status {}", what, status),
            ));
        }
        response
            .json()
            .await
            .map_err(|e| ToknError::from_http("cloudflare", e))
    }

    /// Verify the current token and return its id.
    async fn token_id(&self, current: &str) -> Result<String> {
        let body = self
            .get_json(format!("{}/user/tokens/verify", self.base), current, "token verify")
            .await?;
        body["result"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ToknError::provider(
                    "cloudflare",
                    ProviderErrorKind::Api,
                    "verify response has no token id",
                )
            })
    }

    /// Confirm the token carries policies that a roll will preserve.
    async fn check_policies(&self, current: &str, token_id: &str) -> Result<()> {
        let body = self
            .get_json(
                format!("{}/user/tokens/{}", self.base, token_id),
                current,
                "token details",
            )
            .await?;

        let policies = body["result"]["policies"].as_array().cloned().unwrap_or_default();
        if policies.is_empty() {
            return Err(ToknError::provider(
                "cloudflare",
                ProviderErrorKind::Permission,
                "current token has no policies to carry forward",
            ));
        }
        Ok(())
    }

    /// Roll the token's secret value in place.
    async fn roll_value(&self, current: &str, token_id: &str) -> Result<String> {
        let response = self
            .client
            .put(format!("{}/user/tokens/{}/value", self.base, token_id))
            .bearer_auth(current)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| ToknError::from_http("cloudflare", e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "cloudflare",
                status,
                format!("token roll returned status {}", status),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToknError::from_http("cloudflare", e))?;
        body["result"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ToknError::provider(
                    "cloudflare",
                    ProviderErrorKind::Api,
                    "roll response carried no token value",
                )
            })
    }

    /// Reset the rolled token's expiry. Authenticated with the new value -
    /// the old one died with the roll.
    async fn reset_expiry(
        &self,
        new_value: &str,
        token_id: &str,
        expires_on: chrono::DateTime<Utc>,
    ) -> Result<()> {
        let response = self
            .client
            .put(format!("{}/user/tokens/{}", self.base, token_id))
            .bearer_auth(new_value)
            .json(&json!({
                "expires_on": expires_on.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            }))
            .send()
            .await
            .map_err(|e| ToknError::from_http("cloudflare", e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ToknError::from_status(
                "cloudflare",
                status,
                format!("expiry reset returned status {}", status),
            ));
        }
        Ok(())
    }
}

impl Default for CloudflareProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutoRotation for CloudflareProvider {
    fn service(&self) -> &'static str {
        "cloudflare"
    }

    async fn rotate(&self, current_value: &str, _token: &Token) -> Result<RotationResult> {
        let token_id = self.token_id(current_value).await?;
        self.check_policies(current_value, &token_id).await?;

        let new_value = self.roll_value(current_value, &token_id).await?;

        let expires_on = Utc::now() + Duration::days(EXPIRY_DAYS);
        self.reset_expiry(&new_value, &token_id, expires_on).await?;

        let mut result = RotationResult::new(new_value);
        result.new_expiry = Some(expires_on);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LocationSpec, RotationType};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_token() -> Token {
        Token {
            service: "cloudflare".to_string(),
            rotation_type: RotationType::Auto,
            locations: vec![LocationSpec::new("doppler", "CF_TOKEN")],
            expires_at: Utc::now() + Duration::days(10),
            last_rotated_at: None,
            notes: String::new(),
            extra: Default::default(),
        }
    }

    async fn mount_verify_and_details(server: &MockServer, policies: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/user/tokens/verify"))
            .and(header("Authorization", "Bearer cf-old"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": { "id": "tok-1", "status": "active" } })),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/tokens/tok-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": { "id": "tok-1", "policies": policies } })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn rolls_in_place_and_resets_expiry() {
        let server = MockServer::start().await;
        mount_verify_and_details(&server, json!([{ "id": "p1" }])).await;

        Mock::given(method("PUT"))
            .and(path("/user/tokens/tok-1/value"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "cf-new" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/user/tokens/tok-1"))
            .and(header("Authorization", "Bearer cf-new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = CloudflareProvider::with_base(server.uri());
        let result = provider.rotate("cf-old", &sample_token()).await.unwrap();
        assert_eq!(result.new_value, "cf-new");
        assert!(result.new_expiry.is_some());
    }

    #[tokio::test]
    async fn refuses_to_roll_a_policyless_token() {
        let server = MockServer::start().await;
        mount_verify_and_details(&server, json!([])).await;

        let provider = CloudflareProvider::with_base(server.uri());
        let err = provider.rotate("cf-old", &sample_token()).await.unwrap_err();
        assert!(matches!(
            err,
            ToknError::Provider {
                kind: ProviderErrorKind::Permission,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_token_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/tokens/verify"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = CloudflareProvider::with_base(server.uri());
        let err = provider.rotate("cf-bad", &sample_token()).await.unwrap_err();
        assert!(matches!(
            err,
            ToknError::Provider {
                kind: ProviderErrorKind::Auth,
                ..
            }
        ));
    }
}
